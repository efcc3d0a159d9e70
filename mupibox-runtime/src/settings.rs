use anyhow::Context;
use mupibox_core::types::ControlAction;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config_store::default_staging_path;
use crate::defaults::{
    DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_TELEMETRY_INTERVAL_SECS, DEFAULT_TELEMETRY_PAGE_URL,
    DEFAULT_TELEMETRY_URL,
    default_command_table, default_config_path,
};

/// argv per control action. An empty argv disables the action (it then fails).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTable {
    pub enable_hat: Vec<String>,
    pub disable_hat: Vec<String>,
    pub settings_sync: Vec<String>,
    pub kiosk_restart: Vec<String>,
    pub player_service_restart: Vec<String>,
    pub hat_service_restart: Vec<String>,
}

impl Default for CommandTable {
    fn default() -> Self {
        default_command_table()
    }
}

impl CommandTable {
    pub fn get(&self, action: ControlAction) -> &[String] {
        match action {
            ControlAction::EnableHat => &self.enable_hat,
            ControlAction::DisableHat => &self.disable_hat,
            ControlAction::SettingsSync => &self.settings_sync,
            ControlAction::KioskRestart => &self.kiosk_restart,
            ControlAction::PlayerServiceRestart => &self.player_service_restart,
            ControlAction::HatServiceRestart => &self.hat_service_restart,
        }
    }
}

/// Settings of the admin tool itself (not the box config it edits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub config_path: PathBuf,

    // Defaults to a hidden sibling of `config_path`.
    pub staging_path: Option<PathBuf>,

    pub action_timeout_secs: u64,
    // Fetched by this process.
    pub telemetry_url: String,

    // Fetched by the browser showing the rendered page.
    pub telemetry_page_url: String,
    pub telemetry_interval_secs: u64,
    pub commands: CommandTable,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            staging_path: None,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            telemetry_url: DEFAULT_TELEMETRY_URL.into(),
            telemetry_page_url: DEFAULT_TELEMETRY_PAGE_URL.into(),
            telemetry_interval_secs: DEFAULT_TELEMETRY_INTERVAL_SECS,
            commands: CommandTable::default(),
        }
    }
}

impl AdminSettings {
    /// Read settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::info!("no admin settings at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?;
        let settings: AdminSettings = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        Ok(settings)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.staging_path
            .clone()
            .unwrap_or_else(|| default_staging_path(&self.config_path))
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs.max(1))
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry_interval_secs.max(1))
    }
}
