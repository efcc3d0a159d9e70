use mupibox_core::config::DeviceConfig;
use mupibox_core::telemetry::TELEMETRY_FIELDS;
use std::time::Duration;

/// Where the status table gets its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPanel {
    pub url: String,
    pub interval: Duration,
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

// A JS string literal that is also safe inside a `<script>` element.
fn js_string(raw: &str) -> String {
    serde_json::to_string(raw)
        .unwrap_or_else(|_| "\"\"".into())
        .replace("</", "<\\/")
}

pub fn change_summary(lines: &[String]) -> String {
    let mut html = String::from("<div id='lbinfo'><ul id='lbinfo'>");
    for line in lines {
        html.push_str(&format!("<li>{}</li>", escape(line)));
    }
    html.push_str("</ul></div>");
    html
}

fn status_panel(panel: &TelemetryPanel) -> String {
    let mut html = String::from(
        "<details open><summary>Status</summary><ul><li><h2>Battery Status</h2>\n",
    );
    html.push_str(&format!(
        "<p>Will be refreshed in {} second interval...</p>\n",
        panel.interval.as_secs()
    ));
    html.push_str("<table class=\"version\">\n");
    for (id, label) in TELEMETRY_FIELDS {
        html.push_str(&format!("<tr><td>{label}</td><td id=\"{id}\"></td></tr>\n"));
    }
    html.push_str("</table></li></ul></details>\n");

    let units = [("Vbat", "mV"), ("Vbus", "mV"), ("Ibat", "mA"), ("IBus", "mA"), ("Temp", "°C")];
    html.push_str("<script>\nfunction updateTable() {\n");
    html.push_str(&format!(
        "  fetch({}).then(r => r.json()).then(d => {{\n",
        js_string(&panel.url)
    ));
    for (id, _) in TELEMETRY_FIELDS {
        let unit = units
            .iter()
            .find(|(u_id, _)| *u_id == id)
            .map(|(_, u)| *u)
            .unwrap_or("");
        html.push_str(&format!(
            "    document.getElementById(\"{id}\").innerText = d.{id} + \"{unit}\";\n"
        ));
    }
    html.push_str("  }).catch(() => {});\n}\nupdateTable();\n");
    html.push_str(&format!(
        "setInterval(updateTable, {});\n",
        panel.interval.as_millis()
    ));
    html.push_str("</script>\n");
    html
}

fn config_form(cfg: &DeviceConfig) -> String {
    let mut html = String::from("<form class=\"appnitro\" name=\"mupi\" method=\"post\" id=\"form\">\n");
    html.push_str("<details open><summary>Configuration</summary><ul>\n");

    html.push_str("<li><h2>MuPiHAT activation</h2>\n");
    html.push_str(&format!(
        "<label for=\"mupihat_active\">MuPiHAT activation state: <input type=\"checkbox\" id=\"mupihat_active\" name=\"mupihat_active\"{} /></label>\n",
        if cfg.hat_active { " checked" } else { "" }
    ));
    html.push_str(
        "<input class=\"button_text\" type=\"submit\" name=\"activate_the_hat\" value=\"Save\" /></li>\n",
    );

    html.push_str("<li><h2>Battery selection</h2>\n<select id=\"battery\" name=\"battery\">\n");
    for battery in &cfg.battery_types {
        let name = escape(&battery.name);
        let selected = if battery.name == cfg.selected_battery {
            " selected=\"selected\""
        } else {
            ""
        };
        html.push_str(&format!("<option value=\"{name}\"{selected}>{name}</option>\n"));
    }
    html.push_str("</select>\n");
    html.push_str(
        "<input class=\"button_text\" type=\"submit\" name=\"save_battery\" value=\"Save\" /></li>\n",
    );

    html.push_str("</ul></details>\n</form>\n");
    html
}

/// The admin page: change summary, optional live status and the config form.
pub fn page(cfg: &DeviceConfig, summary: &[String], telemetry: Option<&TelemetryPanel>) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>MuPiHAT</title></head><body>\n");
    html.push_str(&change_summary(summary));
    html.push_str("\n<div class=\"description\"><h2>MuPiHAT</h2></div>\n");
    // Status only makes sense while the hat drives the battery monitor.
    if cfg.hat_active {
        if let Some(panel) = telemetry {
            html.push_str(&status_panel(panel));
        }
    }
    html.push_str(&config_form(cfg));
    html.push_str("</body></html>\n");
    html
}

pub fn error_page(message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>MuPiHAT</title></head><body>\n<div class=\"error\"><h2>Configuration unavailable</h2><p>{}</p></div>\n</body></html>\n",
        escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mupibox_core::config::BatteryProfile;

    fn cfg(hat_active: bool) -> DeviceConfig {
        DeviceConfig {
            hat_active,
            selected_battery: "B <2S>".into(),
            battery_types: vec![BatteryProfile::named("A"), BatteryProfile::named("B <2S>")],
        }
    }

    fn panel() -> TelemetryPanel {
        TelemetryPanel {
            url: "update_mupihattable.php".into(),
            interval: Duration::from_secs(5),
        }
    }

    #[test]
    fn summary_is_escaped_list() {
        let html = change_summary(&["a & b".into(), "<c>".into()]);
        assert_eq!(
            html,
            "<div id='lbinfo'><ul id='lbinfo'><li>a &amp; b</li><li>&lt;c&gt;</li></ul></div>"
        );
    }

    #[test]
    fn form_reflects_state() {
        let html = page(&cfg(true), &[], Some(&panel()));
        assert!(html.contains("name=\"mupihat_active\" checked"));
        assert!(html.contains("<option value=\"B &lt;2S&gt;\" selected=\"selected\">"));
        assert!(html.contains("<option value=\"A\">"));
        assert!(html.contains("id=\"Bat_SOC\""));
        assert!(html.contains("setInterval(updateTable, 5000);"));
    }

    #[test]
    fn poll_url_is_a_js_literal() {
        let panel = TelemetryPanel {
            url: "status.php?a=1&b=\"2\"</script>".into(),
            interval: Duration::from_secs(5),
        };
        let html = page(&cfg(true), &[], Some(&panel));
        assert!(html.contains(r#"fetch("status.php?a=1&b=\"2\"<\/script>")"#));
        assert!(!html.contains("&amp;b"));
    }

    #[test]
    fn inactive_hat_has_no_status_panel() {
        let html = page(&cfg(false), &[], Some(&panel()));
        assert!(!html.contains(" checked"));
        assert!(!html.contains("Battery Status"));
    }

    #[test]
    fn error_page_escapes() {
        assert!(error_page("read <x>").contains("read &lt;x&gt;"));
    }
}
