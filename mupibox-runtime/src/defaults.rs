use crate::settings::CommandTable;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/mupibox/mupiboxconfig.json";
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/mupibox/mupibox-admin.json";
pub const DEFAULT_TELEMETRY_URL: &str = "http://127.0.0.1/update_mupihattable.php";
// Relative to the admin page, so browsers on other hosts poll the box.
pub const DEFAULT_TELEMETRY_PAGE_URL: &str = "update_mupihattable.php";
pub const DEFAULT_TELEMETRY_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

const SCRIPT_DIR: &str = "/usr/local/bin/mupibox";

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn script(name: &str) -> String {
    format!("{SCRIPT_DIR}/{name}")
}

/// The commands the box ships with. Each runs with elevated privileges via sudo.
pub fn default_command_table() -> CommandTable {
    CommandTable {
        enable_hat: argv(&["sudo", &script("enable_mupihat.sh")]),
        disable_hat: argv(&["sudo", &script("disable_mupihat.sh")]),
        settings_sync: argv(&["sudo", &script("setting_update.sh")]),
        kiosk_restart: argv(&["sudo", "-i", "-u", "dietpi", &script("restart_kiosk.sh")]),
        player_service_restart: argv(&[
            "sudo",
            "su",
            "dietpi",
            "-c",
            "pm2 restart spotify-control",
        ]),
        hat_service_restart: argv(&["sudo", "service", "mupi_hat", "restart"]),
    }
}
