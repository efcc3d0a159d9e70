use serde::{Deserialize, Serialize};
use std::fmt;

/// External operations the admin workflow can trigger on the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    EnableHat,
    DisableHat,
    SettingsSync,
    KioskRestart,
    PlayerServiceRestart,
    HatServiceRestart,
}

impl ControlAction {
    pub const ALL: [ControlAction; 6] = [
        ControlAction::EnableHat,
        ControlAction::DisableHat,
        ControlAction::SettingsSync,
        ControlAction::KioskRestart,
        ControlAction::PlayerServiceRestart,
        ControlAction::HatServiceRestart,
    ];

    // Stable label used in logs and the change summary.
    pub fn label(self) -> &'static str {
        match self {
            ControlAction::EnableHat => "enable-hardware",
            ControlAction::DisableHat => "disable-hardware",
            ControlAction::SettingsSync => "settings-sync",
            ControlAction::KioskRestart => "kiosk-restart",
            ControlAction::PlayerServiceRestart => "player-service-restart",
            ControlAction::HatServiceRestart => "hat-service-restart",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side effects a configuration change requires.
///
/// The numeric codes match the levels the admin pages have always used, so
/// other entry points can keep addressing them by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeLevel {
    /// Permission fix, persist, settings sync and kiosk restart.
    FullReset,
    /// Persist and settings sync.
    SyncOnly,
    /// Persist and restart the spotify-control player service.
    ServiceRestart,
    /// Persist only.
    PersistAndSync,
    /// Persist and restart the mupi_hat monitor service.
    PersistAndRestartHatService,
}

impl ChangeLevel {
    pub fn code(self) -> u8 {
        match self {
            ChangeLevel::FullReset => 1,
            ChangeLevel::SyncOnly => 2,
            ChangeLevel::ServiceRestart => 3,
            ChangeLevel::PersistAndSync => 4,
            ChangeLevel::PersistAndRestartHatService => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ChangeLevel::FullReset),
            2 => Some(ChangeLevel::SyncOnly),
            3 => Some(ChangeLevel::ServiceRestart),
            4 => Some(ChangeLevel::PersistAndSync),
            5 => Some(ChangeLevel::PersistAndRestartHatService),
            _ => None,
        }
    }

    /// Merge the level of a later intent in the same request.
    ///
    /// Every level persists, so `PersistAndSync` never displaces a level with
    /// extra steps. Otherwise the later intent wins.
    pub fn combine(self, later: ChangeLevel) -> ChangeLevel {
        if later == ChangeLevel::PersistAndSync {
            self
        } else {
            later
        }
    }
}

impl fmt::Display for ChangeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeLevel::FullReset => "full-reset",
            ChangeLevel::SyncOnly => "sync-only",
            ChangeLevel::ServiceRestart => "service-restart",
            ChangeLevel::PersistAndSync => "persist",
            ChangeLevel::PersistAndRestartHatService => "persist-and-restart-hat-service",
        };
        write!(f, "{name} ({})", self.code())
    }
}
