use mupibox_core::request::AdminForm;
use mupibox_core::types::ChangeLevel;
use mupibox_engine::report::ChangeReport;
use mupibox_engine::workflow::{ReconcileWorkflow, WorkflowError};
use mupibox_runtime::build_workflow;
use mupibox_runtime::settings::AdminSettings;
use mupibox_runtime::telemetry::TelemetryClient;
use serde::{Deserialize, Serialize};

use crate::form::parse_form;
use crate::render::{self, TelemetryPanel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminResponse {
    pub html: String,
    pub report: Option<ChangeReport>,

    // Fatal request error (config could not be loaded).
    pub error: Option<String>,
}

impl AdminResponse {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.report.as_ref().is_none_or(ChangeReport::is_success)
    }

    pub fn summary_lines(&self) -> Vec<String> {
        match (&self.error, &self.report) {
            (Some(e), _) => vec![e.clone()],
            (None, Some(report)) => report.summary_lines(),
            (None, None) => vec![],
        }
    }
}

pub struct AdminService {
    settings: AdminSettings,
    workflow: ReconcileWorkflow,
}

impl AdminService {
    pub fn new(settings: AdminSettings) -> Self {
        let workflow = build_workflow(&settings);
        Self { settings, workflow }
    }

    pub fn with_workflow(settings: AdminSettings, workflow: ReconcileWorkflow) -> Self {
        Self { settings, workflow }
    }

    pub fn settings(&self) -> &AdminSettings {
        &self.settings
    }

    pub fn telemetry_client(&self) -> anyhow::Result<TelemetryClient> {
        TelemetryClient::new(self.settings.telemetry_url.clone())
    }

    pub async fn submit_body(&self, body: &str) -> AdminResponse {
        self.submit(parse_form(body)).await
    }

    pub async fn submit(&self, form: AdminForm) -> AdminResponse {
        let intents = form.into_intents();
        let res = self.workflow.submit(&intents).await;
        self.respond(res)
    }

    /// Render the current config without changing anything.
    pub async fn show(&self) -> AdminResponse {
        self.submit(AdminForm::default()).await
    }

    pub async fn apply_level(&self, level: ChangeLevel) -> AdminResponse {
        let res = self.workflow.apply_level(level).await;
        self.respond(res)
    }

    fn respond(&self, res: Result<ChangeReport, WorkflowError>) -> AdminResponse {
        match res {
            Ok(report) => {
                let panel = self.telemetry_panel();
                let html = render::page(&report.config, &report.summary_lines(), Some(&panel));
                AdminResponse {
                    html,
                    report: Some(report),
                    error: None,
                }
            }
            Err(e) => {
                log::error!("admin request failed: {e}");
                let message = e.to_string();
                AdminResponse {
                    html: render::error_page(&message),
                    report: None,
                    error: Some(message),
                }
            }
        }
    }

    fn telemetry_panel(&self) -> TelemetryPanel {
        TelemetryPanel {
            url: self.settings.telemetry_page_url.clone(),
            interval: self.settings.telemetry_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mupibox_runtime::settings::CommandTable;
    use std::path::Path;
    use std::time::Duration;

    const DOC: &str = r#"{
  "mupibox": {"version": "4.0.0"},
  "mupihat": {"hat_active": false, "selected_battery": "A",
              "battery_types": [{"name": "A"}, {"name": "B"}]},
  "mqtt": {"active": false}
}"#;

    // Every action appends its label to a marker file so tests can see what ran.
    fn recording_commands(marker: &Path) -> CommandTable {
        let cmd = |label: &str| {
            vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("echo {label} >> {}", marker.display()),
            ]
        };
        CommandTable {
            enable_hat: cmd("enable-hardware"),
            disable_hat: cmd("disable-hardware"),
            settings_sync: cmd("settings-sync"),
            kiosk_restart: cmd("kiosk-restart"),
            player_service_restart: cmd("player-service-restart"),
            hat_service_restart: vec!["false".into()],
        }
    }

    fn service(dir: &Path) -> AdminService {
        let config_path = dir.join("mupiboxconfig.json");
        std::fs::write(&config_path, DOC).unwrap();
        let settings = AdminSettings {
            config_path,
            commands: recording_commands(&dir.join("actions.log")),
            action_timeout_secs: 5,
            ..AdminSettings::default()
        };
        AdminService::new(settings)
    }

    fn ran(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("actions.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    fn persisted(dir: &Path) -> serde_json::Value {
        let raw = std::fs::read(dir.join("mupiboxconfig.json")).unwrap();
        serde_json::from_slice(&raw).unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn enabling_hat_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let resp = svc
            .submit_body("mupihat_active=on&activate_the_hat=Save")
            .await;

        assert!(resp.is_success(), "{:?}", resp.summary_lines());
        assert!(resp.html.contains("MAX98357A"));
        assert!(resp.html.contains("name=\"mupihat_active\" checked"));
        assert!(resp.html.contains(r#"fetch("update_mupihattable.php")"#));
        assert_eq!(ran(dir.path()), vec!["enable-hardware"]);

        let doc = persisted(dir.path());
        assert_eq!(doc["mupihat"]["hat_active"], true);
        assert_eq!(doc["mupihat"]["selected_battery"], "A");
        assert_eq!(doc["mqtt"]["active"], false);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_restart_is_surfaced_in_page() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        svc.submit_body("mupihat_active=on&activate_the_hat=Save")
            .await;

        let resp = svc.submit_body("battery=B&save_battery=Save").await;

        assert!(!resp.is_success());
        assert!(resp.html.contains("New battery B settings are active"));
        assert!(resp.html.contains("Step hat-service-restart failed"));
        assert_eq!(persisted(dir.path())["mupihat"]["selected_battery"], "B");
    }

    #[tokio::test]
    async fn unknown_battery_shows_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let before = std::fs::read(dir.path().join("mupiboxconfig.json")).unwrap();

        let resp = svc.submit_body("battery=Z&save_battery=Save").await;

        assert!(!resp.is_success());
        assert!(resp.html.contains("Not saved: unknown battery type"));
        assert_eq!(
            std::fs::read(dir.path().join("mupiboxconfig.json")).unwrap(),
            before
        );
        assert!(ran(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn show_renders_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let resp = svc.show().await;

        assert!(resp.is_success());
        assert!(resp.html.contains("<option value=\"A\" selected=\"selected\">"));
        assert!(!dir.path().join(".mupiboxconfig.json.tmp").exists());
        assert!(ran(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn missing_config_renders_error_page() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AdminSettings {
            config_path: dir.path().join("absent.json"),
            ..AdminSettings::default()
        };
        let svc = AdminService::new(settings);

        let resp = svc.show().await;

        assert!(!resp.is_success());
        assert!(resp.html.contains("Configuration unavailable"));
        assert!(resp.error.unwrap().contains("could not load device config"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sync_level_runs_settings_update() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let resp = svc.apply_level(ChangeLevel::SyncOnly).await;

        assert!(resp.is_success(), "{:?}", resp.summary_lines());
        assert_eq!(ran(dir.path()), vec!["settings-sync"]);
    }

    #[test]
    fn telemetry_panel_uses_settings() {
        let svc = AdminService::new(AdminSettings {
            telemetry_interval_secs: 7,
            ..AdminSettings::default()
        });
        assert_eq!(svc.telemetry_panel().interval, Duration::from_secs(7));
        assert_eq!(svc.telemetry_panel().url, "update_mupihattable.php");
        assert!(svc.telemetry_client().is_ok());
    }
}
