use serde::{Deserialize, Serialize};
use std::fmt;

/// A single reading from the hat status endpoint. The driver reports some
/// values as numbers and others as preformatted strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(serde_json::Number),
    Text(String),
}

impl Default for Reading {
    fn default() -> Self {
        Reading::Text(String::new())
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Number(n) => write!(f, "{n}"),
            Reading::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryTelemetry {
    #[serde(rename = "Charger_Status", default)]
    pub charger_status: Reading,
    #[serde(rename = "Vbat", default)]
    pub vbat: Reading,
    #[serde(rename = "Vbus", default)]
    pub vbus: Reading,
    #[serde(rename = "Ibat", default)]
    pub ibat: Reading,
    #[serde(rename = "IBus", default)]
    pub ibus: Reading,
    #[serde(rename = "Temp", default)]
    pub temp: Reading,
    #[serde(rename = "REG14", default)]
    pub reg14: Reading,
    #[serde(rename = "Bat_SOC", default)]
    pub bat_soc: Reading,
    #[serde(rename = "Bat_Stat", default)]
    pub bat_stat: Reading,
    #[serde(rename = "Bat_Type", default)]
    pub bat_type: Reading,
}

/// One row of the status table: element id, label and the value with its unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRow {
    pub id: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// Element ids and labels of the status table, in display order.
pub const TELEMETRY_FIELDS: [(&str, &str); 10] = [
    ("Charger_Status", "Charger status:"),
    ("Vbat", "Vbat (battery mV):"),
    ("Vbus", "Vbus (charger mV):"),
    ("Ibat", "Ibat (dis- / charge mA):"),
    ("IBus", "IBus (charger mA):"),
    ("Temp", "Temperature:"),
    ("REG14", "REG14:"),
    ("Bat_SOC", "Bat_SOC (battery level):"),
    ("Bat_Stat", "Bat_Stat (battery status):"),
    ("Bat_Type", "Bat_Type (battery type):"),
];

impl BatteryTelemetry {
    pub fn rows(&self) -> Vec<TelemetryRow> {
        let values: [(&Reading, &str); 10] = [
            (&self.charger_status, ""),
            (&self.vbat, "mV"),
            (&self.vbus, "mV"),
            (&self.ibat, "mA"),
            (&self.ibus, "mA"),
            (&self.temp, "°C"),
            (&self.reg14, ""),
            (&self.bat_soc, ""),
            (&self.bat_stat, ""),
            (&self.bat_type, ""),
        ];
        TELEMETRY_FIELDS
            .iter()
            .zip(values)
            .map(|(&(id, label), (reading, unit))| TelemetryRow {
                id,
                label,
                value: format!("{reading}{unit}"),
            })
            .collect()
    }
}
