use crate::effects::Step;
use mupibox_core::config::DeviceConfig;
use mupibox_core::types::ChangeLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Succeeded,
    Failed { error: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    pub elapsed_ms: u64,
}

impl StepOutcome {
    pub fn succeeded(step: Step, elapsed: Duration) -> Self {
        Self {
            step,
            status: StepStatus::Succeeded,
            elapsed_ms: ms(elapsed),
        }
    }

    pub fn failed(step: Step, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            step,
            status: StepStatus::Failed {
                error: error.into(),
            },
            elapsed_ms: ms(elapsed),
        }
    }

    pub fn skipped(step: Step, reason: impl Into<String>) -> Self {
        Self {
            step,
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
            elapsed_ms: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StepStatus::Succeeded
    }
}

/// Everything one admin request did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    // Config as it stands after the request (the prior config when nothing changed).
    pub config: DeviceConfig,
    pub level: Option<ChangeLevel>,
    pub messages: Vec<String>,
    pub steps: Vec<StepOutcome>,

    // Set when the request was refused before any mutation.
    pub rejection: Option<String>,
}

impl ChangeReport {
    pub fn unchanged(config: DeviceConfig) -> Self {
        Self {
            config,
            level: None,
            messages: vec![],
            steps: vec![],
            rejection: None,
        }
    }

    pub fn rejected(config: DeviceConfig, reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            ..Self::unchanged(config)
        }
    }

    pub fn is_success(&self) -> bool {
        self.rejection.is_none() && self.steps.iter().all(StepOutcome::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.is_ok())
    }

    /// Human-readable lines for the change summary: what changed, then what went wrong.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(reason) = &self.rejection {
            lines.push(format!("Not saved: {reason}"));
            return lines;
        }
        lines.extend(self.messages.iter().cloned());
        for outcome in self.failures() {
            match &outcome.status {
                StepStatus::Failed { error } => {
                    lines.push(format!("Step {} failed: {error}", outcome.step));
                }
                StepStatus::Skipped { reason } => {
                    lines.push(format!("Step {} skipped: {reason}", outcome.step));
                }
                StepStatus::Succeeded => {}
            }
        }
        lines
    }
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
