use crate::report::ChangeReport;
use crate::runner::ChangeEffectRunner;
use crate::traits::ConfigRepository;
use mupibox_core::config::DeviceConfig;
use mupibox_core::mutator::apply_intents;
use mupibox_core::request::Intent;
use mupibox_core::types::ChangeLevel;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("could not load device config: {0:#}")]
    ConfigLoad(anyhow::Error),
}

/// Load → mutate → fire → persist for one admin request.
pub struct ReconcileWorkflow {
    repo: Arc<dyn ConfigRepository>,
    runner: ChangeEffectRunner,

    // Single writer across the whole read-modify-write cycle.
    write_lock: Mutex<()>,
}

impl ReconcileWorkflow {
    pub fn new(repo: Arc<dyn ConfigRepository>, runner: ChangeEffectRunner) -> Self {
        Self {
            repo,
            runner,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the config, waiting for any in-flight request to finish first.
    pub async fn current(&self) -> Result<DeviceConfig, WorkflowError> {
        let _guard = self.write_lock.lock().await;
        self.load().await
    }

    // Callers must hold `write_lock`: loading resets the repository's snapshot.
    async fn load(&self) -> Result<DeviceConfig, WorkflowError> {
        self.repo.load().await.map_err(WorkflowError::ConfigLoad)
    }

    pub async fn submit(&self, intents: &[Intent]) -> Result<ChangeReport, WorkflowError> {
        let _guard = self.write_lock.lock().await;
        let cfg = self.load().await?;

        let mutation = match apply_intents(&cfg, intents) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("rejected admin request: {e}");
                return Ok(ChangeReport::rejected(cfg, e.to_string()));
            }
        };

        let Some(level) = mutation.level else {
            return Ok(ChangeReport::unchanged(cfg));
        };
        log::info!("admin request: {} intent(s), level {level}", intents.len());

        let mut steps = Vec::new();
        for action in &mutation.immediate {
            steps.push(self.runner.fire(*action).await);
        }
        steps.extend(self.runner.run(level, &mutation.config).await);

        Ok(ChangeReport {
            config: mutation.config,
            level: Some(level),
            messages: mutation.messages,
            steps,
            rejection: None,
        })
    }

    /// Re-persist the current config and run a level's effects directly.
    ///
    /// Entry point for admin pages whose changes are not expressed as form intents.
    pub async fn apply_level(&self, level: ChangeLevel) -> Result<ChangeReport, WorkflowError> {
        let _guard = self.write_lock.lock().await;
        let cfg = self.load().await?;
        let steps = self.runner.run(level, &cfg).await;
        Ok(ChangeReport {
            config: cfg,
            level: Some(level),
            messages: vec![],
            steps,
            rejection: None,
        })
    }
}
