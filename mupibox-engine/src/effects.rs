use mupibox_core::types::{ChangeLevel, ControlAction};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Stage,
    FixPermissions,
    Commit,
    Control(ControlAction),
}

impl Step {
    pub fn label(self) -> &'static str {
        match self {
            Step::Stage => "stage-config",
            Step::FixPermissions => "fix-permissions",
            Step::Commit => "commit-config",
            Step::Control(action) => action.label(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered steps for a change level. Every level persists first; the
/// services that must observe the new state are restarted afterwards.
pub fn plan(level: ChangeLevel) -> Vec<Step> {
    match level {
        ChangeLevel::FullReset => vec![
            Step::Stage,
            Step::FixPermissions,
            Step::Commit,
            Step::Control(ControlAction::SettingsSync),
            Step::Control(ControlAction::KioskRestart),
        ],
        ChangeLevel::SyncOnly => vec![
            Step::Stage,
            Step::Commit,
            Step::Control(ControlAction::SettingsSync),
        ],
        ChangeLevel::ServiceRestart => vec![
            Step::Stage,
            Step::Commit,
            Step::Control(ControlAction::PlayerServiceRestart),
        ],
        ChangeLevel::PersistAndSync => vec![Step::Stage, Step::Commit],
        ChangeLevel::PersistAndRestartHatService => vec![
            Step::Stage,
            Step::Commit,
            Step::Control(ControlAction::HatServiceRestart),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_fix_only_on_full_reset() {
        for code in 1..=5 {
            let level = ChangeLevel::from_code(code).unwrap();
            let steps = plan(level);
            assert_eq!(steps[0], Step::Stage);
            assert_eq!(
                steps.contains(&Step::FixPermissions),
                level == ChangeLevel::FullReset
            );
        }
    }

    #[test]
    fn full_reset_order() {
        let labels: Vec<_> = plan(ChangeLevel::FullReset)
            .into_iter()
            .map(Step::label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "stage-config",
                "fix-permissions",
                "commit-config",
                "settings-sync",
                "kiosk-restart"
            ]
        );
    }

    #[test]
    fn persist_only_restarts_nothing() {
        assert_eq!(
            plan(ChangeLevel::PersistAndSync),
            vec![Step::Stage, Step::Commit]
        );
    }
}
