use serde::{Deserialize, Serialize};

/// Name of the section that holds the hat settings in the shared config document.
pub const MUPIHAT_SECTION: &str = "mupihat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryProfile {
    pub name: String,

    // Charging/monitoring parameters owned by the hat driver; carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BatteryProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Typed view of the `mupihat` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub hat_active: bool,

    #[serde(default)]
    pub selected_battery: String,

    // Read-only catalog; this workflow never writes it back.
    #[serde(default)]
    pub battery_types: Vec<BatteryProfile>,
}

impl DeviceConfig {
    pub fn has_battery(&self, name: &str) -> bool {
        self.battery_types.iter().any(|b| b.name == name)
    }

    pub fn battery_names(&self) -> Vec<&str> {
        self.battery_types.iter().map(|b| b.name.as_str()).collect()
    }
}
