use async_trait::async_trait;
use mupibox_core::config::DeviceConfig;
use mupibox_core::types::ControlAction;

/// Access to the shared config document.
///
/// One repository value serves one request: `load` remembers what it read so
/// `stage` can merge into that document and `commit` can detect that someone
/// else replaced the file in between.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    async fn load(&self) -> anyhow::Result<DeviceConfig>;

    /// Write the merged document to the staging path. Never touches the canonical path.
    async fn stage(&self, cfg: &DeviceConfig) -> anyhow::Result<()>;

    async fn fix_permissions(&self) -> anyhow::Result<()>;

    /// Atomically move the staged document onto the canonical path.
    async fn commit(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ControlActions: Send + Sync {
    async fn run(&self, action: ControlAction) -> anyhow::Result<()>;
}
