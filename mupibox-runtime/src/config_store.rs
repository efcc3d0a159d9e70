use anyhow::Context;
use mupibox_core::config::{DeviceConfig, MUPIHAT_SECTION};
use mupibox_engine::traits::ConfigRepository;
use serde::Deserialize;
use serde_json::Value;
use serde_json::value::RawValue;
use sha2::Digest;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config document is not a JSON object: {}", .0.display())]
    NotAnObject(PathBuf),
    #[error("config document has no `mupihat` section: {}", .0.display())]
    MissingSection(PathBuf),
    #[error("config must be loaded before it can be staged")]
    NotLoaded,
    #[error("{} changed since it was loaded; refusing to overwrite", .0.display())]
    Conflict(PathBuf),
    #[error("nothing staged at {}", .0.display())]
    NothingStaged(PathBuf),
}

// What `load` saw: the raw document text plus a fingerprint of its bytes.
#[derive(Debug, Clone)]
struct Snapshot {
    text: String,
    fingerprint: Vec<u8>,
}

// Borrowed view of the one top-level section we rewrite.
#[derive(Deserialize)]
struct Sections<'a> {
    #[serde(borrow)]
    mupihat: Option<&'a RawValue>,
}

/// The shared `mupiboxconfig.json`.
///
/// Only the `mupihat.hat_active` and `mupihat.selected_battery` keys are ever
/// written. Everything outside the `mupihat` section is carried over byte for
/// byte.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    staging_path: PathBuf,
    snapshot: Mutex<Option<Snapshot>>,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let staging_path = default_staging_path(&path);
        Self {
            path,
            staging_path,
            snapshot: Mutex::new(None),
        }
    }

    /// The staging file must live on the same filesystem as `path` for the
    /// final rename to be atomic.
    pub fn with_staging_path(mut self, staging_path: impl Into<PathBuf>) -> Self {
        self.staging_path = staging_path.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    pub fn load_blocking(&self) -> anyhow::Result<DeviceConfig> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let document: Value = serde_json::from_str(&text)
            .with_context(|| format!("decode config JSON: {}", self.path.display()))?;
        if !document.is_object() {
            return Err(StoreError::NotAnObject(self.path.clone()).into());
        }
        let section = document
            .get(MUPIHAT_SECTION)
            .ok_or_else(|| StoreError::MissingSection(self.path.clone()))?;
        let cfg: DeviceConfig = serde_json::from_value(section.clone())
            .with_context(|| format!("decode `{MUPIHAT_SECTION}` section"))?;

        *self.lock_snapshot() = Some(Snapshot::of(text));
        Ok(cfg)
    }

    pub fn stage_blocking(&self, cfg: &DeviceConfig) -> anyhow::Result<()> {
        let text = self
            .lock_snapshot()
            .as_ref()
            .map(|s| s.text.clone())
            .ok_or(StoreError::NotLoaded)?;
        let json = splice_device_config(&text, cfg)?;

        let mut file = fs::File::create(&self.staging_path)
            .with_context(|| format!("create staging file: {}", self.staging_path.display()))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .with_context(|| format!("write staging file: {}", self.staging_path.display()))?;
        Ok(())
    }

    pub fn fix_permissions_blocking(&self) -> anyhow::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o755))
                .with_context(|| format!("chmod 755 {}", self.path.display()))?;
        }
        Ok(())
    }

    pub fn commit_blocking(&self) -> anyhow::Result<()> {
        let staged = match fs::read_to_string(&self.staging_path) {
            Ok(staged) => staged,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NothingStaged(self.staging_path.clone()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("read staging file: {}", self.staging_path.display())
                });
            }
        };

        // Compare-and-swap: only replace the document we actually read.
        let expected = self
            .lock_snapshot()
            .as_ref()
            .map(|s| s.fingerprint.clone())
            .ok_or(StoreError::NotLoaded)?;
        let current = fs::read(&self.path)
            .with_context(|| format!("re-read config: {}", self.path.display()))?;
        if fingerprint(&current) != expected {
            log::error!("{} was replaced concurrently; discarding staged config", self.path.display());
            let _ = fs::remove_file(&self.staging_path);
            return Err(StoreError::Conflict(self.path.clone()).into());
        }

        fs::rename(&self.staging_path, &self.path).with_context(|| {
            format!(
                "move {} -> {}",
                self.staging_path.display(),
                self.path.display()
            )
        })?;

        // Later commits in the same request compare against what we just wrote.
        *self.lock_snapshot() = Some(Snapshot::of(staged));
        log::info!("committed config to {}", self.path.display());
        Ok(())
    }

    fn lock_snapshot(&self) -> std::sync::MutexGuard<'_, Option<Snapshot>> {
        // A poisoned snapshot is still a consistent value; keep using it.
        self.snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Snapshot {
    fn of(text: String) -> Self {
        let fingerprint = fingerprint(text.as_bytes());
        Self { text, fingerprint }
    }
}

#[async_trait::async_trait]
impl ConfigRepository for ConfigStore {
    async fn load(&self) -> anyhow::Result<DeviceConfig> {
        self.load_blocking()
    }

    async fn stage(&self, cfg: &DeviceConfig) -> anyhow::Result<()> {
        self.stage_blocking(cfg)
    }

    async fn fix_permissions(&self) -> anyhow::Result<()> {
        self.fix_permissions_blocking()
    }

    async fn commit(&self) -> anyhow::Result<()> {
        self.commit_blocking()
    }
}

/// Replace the `mupihat` section of `text` with one carrying `cfg`'s two
/// mutable keys. The bytes before and after the section are left as they are.
pub fn splice_device_config(text: &str, cfg: &DeviceConfig) -> anyhow::Result<String> {
    let sections: Sections<'_> =
        serde_json::from_str(text).context("decode config JSON sections")?;
    let raw = sections
        .mupihat
        .ok_or_else(|| anyhow::anyhow!("config document has no `{MUPIHAT_SECTION}` object"))?;

    let mut section: Value =
        serde_json::from_str(raw.get()).context("decode `mupihat` section")?;
    let fields = section
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("config document has no `{MUPIHAT_SECTION}` object"))?;
    fields.insert("hat_active".into(), Value::Bool(cfg.hat_active));
    fields.insert(
        "selected_battery".into(),
        Value::String(cfg.selected_battery.clone()),
    );
    let encoded = serde_json::to_string(&section).context("encode `mupihat` section")?;

    // `raw` borrows from `text`, so its position is a plain pointer offset.
    let start = raw.get().as_ptr() as usize - text.as_ptr() as usize;
    let end = start + raw.get().len();
    let mut out = String::with_capacity(text.len() + encoded.len());
    out.push_str(&text[..start]);
    out.push_str(&encoded);
    out.push_str(&text[end..]);
    Ok(out)
}

/// Hidden sibling of the canonical file, e.g. `/etc/mupibox/.mupiboxconfig.json.tmp`.
pub fn default_staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config.json".into());
    path.with_file_name(format!(".{name}.tmp"))
}

fn fingerprint(bytes: &[u8]) -> Vec<u8> {
    sha2::Sha256::digest(bytes).to_vec()
}
