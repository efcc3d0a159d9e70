use crate::effects::{Step, plan};
use crate::report::StepOutcome;
use crate::traits::{ConfigRepository, ControlActions};
use mupibox_core::config::DeviceConfig;
use mupibox_core::types::{ChangeLevel, ControlAction};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes the step sequence of a change level.
///
/// Steps never abort the sequence. A failure is recorded and the next step
/// runs, except `Commit`, which is skipped when nothing was staged.
pub struct ChangeEffectRunner {
    repo: Arc<dyn ConfigRepository>,
    actions: Arc<dyn ControlActions>,
    action_timeout: Duration,
}

impl ChangeEffectRunner {
    pub fn new(repo: Arc<dyn ConfigRepository>, actions: Arc<dyn ControlActions>) -> Self {
        Self {
            repo,
            actions,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }

    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Run a control action outside any level, e.g. the hat enable/disable
    /// that precedes persistence.
    pub async fn fire(&self, action: ControlAction) -> StepOutcome {
        let outcome = self.control(action).await;
        log_outcome(&outcome);
        outcome
    }

    pub async fn run(&self, level: ChangeLevel, cfg: &DeviceConfig) -> Vec<StepOutcome> {
        log::info!("running change level {level}");
        let mut outcomes = Vec::new();
        let mut staged = false;

        for step in plan(level) {
            let outcome = match step {
                Step::Stage => {
                    let outcome = self.persist_step(step, self.repo.stage(cfg)).await;
                    staged = outcome.is_ok();
                    outcome
                }
                Step::FixPermissions => self.persist_step(step, self.repo.fix_permissions()).await,
                Step::Commit if !staged => {
                    StepOutcome::skipped(step, "staged config was not written")
                }
                Step::Commit => self.persist_step(step, self.repo.commit()).await,
                Step::Control(action) => self.control(action).await,
            };
            log_outcome(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn persist_step<F>(&self, step: Step, fut: F) -> StepOutcome
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let t0 = Instant::now();
        match fut.await {
            Ok(()) => StepOutcome::succeeded(step, t0.elapsed()),
            Err(e) => StepOutcome::failed(step, format!("{e:#}"), t0.elapsed()),
        }
    }

    async fn control(&self, action: ControlAction) -> StepOutcome {
        let step = Step::Control(action);
        let t0 = Instant::now();
        match tokio::time::timeout(self.action_timeout, self.actions.run(action)).await {
            Ok(Ok(())) => StepOutcome::succeeded(step, t0.elapsed()),
            Ok(Err(e)) => StepOutcome::failed(step, format!("{e:#}"), t0.elapsed()),
            Err(_) => {
                log::error!("{action} timed out after {:?}", self.action_timeout);
                StepOutcome::failed(
                    step,
                    format!("timed out after {}s", self.action_timeout.as_secs_f32()),
                    t0.elapsed(),
                )
            }
        }
    }
}

fn log_outcome(outcome: &StepOutcome) {
    if outcome.is_ok() {
        log::info!("{} ok ({}ms)", outcome.step, outcome.elapsed_ms);
    } else {
        log::warn!("{}: {:?}", outcome.step, outcome.status);
    }
}
