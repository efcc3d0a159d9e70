//! Turns user intents into an updated config plus the change level that
//! decides which side effects have to follow.

use crate::config::DeviceConfig;
use crate::request::Intent;
use crate::types::{ChangeLevel, ControlAction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const HAT_ENABLED_MESSAGE: &str =
    "MuPiHAT is active now - sound card set to MAX98357A bcm2835-i2s-HiFi HiFi-0";
pub const HAT_DISABLED_MESSAGE: &str =
    "MuPiHAT is deactivated - sound card set to Onboard 3.5mm output";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("unknown battery type {name:?} (available: {})", .available.join(", "))]
    UnknownBattery { name: String, available: Vec<String> },
}

/// Result of a single intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub level: ChangeLevel,
    pub message: String,

    // Fired before persistence and regardless of its outcome.
    pub immediate: Option<ControlAction>,
}

/// Result of all intents of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub config: DeviceConfig,

    // None when the request carried no intent.
    pub level: Option<ChangeLevel>,
    pub messages: Vec<String>,
    pub immediate: Vec<ControlAction>,
}

pub fn set_hat_active(cfg: &mut DeviceConfig, enabled: bool) -> Change {
    cfg.hat_active = enabled;
    let (action, message) = if enabled {
        (ControlAction::EnableHat, HAT_ENABLED_MESSAGE)
    } else {
        (ControlAction::DisableHat, HAT_DISABLED_MESSAGE)
    };
    Change {
        level: ChangeLevel::PersistAndSync,
        message: message.into(),
        immediate: Some(action),
    }
}

pub fn set_selected_battery(cfg: &mut DeviceConfig, name: &str) -> Result<Change, MutationError> {
    validate_battery(cfg, name)?;
    cfg.selected_battery = name.to_string();

    // The monitor service only picks up battery parameters while the hat is live.
    let change = if cfg.hat_active {
        Change {
            level: ChangeLevel::PersistAndRestartHatService,
            message: format!("New battery {name} settings are active"),
            immediate: None,
        }
    } else {
        Change {
            level: ChangeLevel::PersistAndSync,
            message: format!("New battery {name} settings are saved"),
            immediate: None,
        }
    };
    Ok(change)
}

/// Apply every intent in order.
///
/// All battery selections are validated up front, so a rejected request
/// leaves `cfg` untouched and produces no side effects.
pub fn apply_intents(cfg: &DeviceConfig, intents: &[Intent]) -> Result<Mutation, MutationError> {
    for intent in intents {
        if let Intent::SetSelectedBattery(name) = intent {
            validate_battery(cfg, name)?;
        }
    }

    let mut next = cfg.clone();
    let mut level: Option<ChangeLevel> = None;
    let mut messages = Vec::new();
    let mut immediate = Vec::new();

    for intent in intents {
        let change = match intent {
            Intent::SetHatActive(enabled) => set_hat_active(&mut next, *enabled),
            Intent::SetSelectedBattery(name) => set_selected_battery(&mut next, name)?,
        };
        level = Some(match level {
            Some(prev) => prev.combine(change.level),
            None => change.level,
        });
        messages.push(change.message);
        immediate.extend(change.immediate);
    }

    Ok(Mutation {
        config: next,
        level,
        messages,
        immediate,
    })
}

fn validate_battery(cfg: &DeviceConfig, name: &str) -> Result<(), MutationError> {
    if cfg.has_battery(name) {
        return Ok(());
    }
    Err(MutationError::UnknownBattery {
        name: name.to_string(),
        available: cfg.battery_names().into_iter().map(String::from).collect(),
    })
}
