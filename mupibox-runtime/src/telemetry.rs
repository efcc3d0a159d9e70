use anyhow::{Context, anyhow};
use mupibox_core::telemetry::BatteryTelemetry;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Read-only client for the hat status endpoint.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    client: reqwest::Client,
    url: String,
}

impl TelemetryClient {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        // The endpoint is local; anything slower than this is a stuck driver.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(4))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> anyhow::Result<BatteryTelemetry> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {} returned {status}", self.url));
        }
        resp.json::<BatteryTelemetry>()
            .await
            .context("decode telemetry JSON")
    }

    /// Fetch on a fixed interval until `on_sample` breaks.
    ///
    /// A failed tick is logged and skipped; there is no retry or backoff.
    pub async fn poll<F>(&self, interval: Duration, mut on_sample: F)
    where
        F: FnMut(BatteryTelemetry) -> ControlFlow<()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.fetch().await {
                Ok(sample) => {
                    if on_sample(sample).is_break() {
                        return;
                    }
                }
                Err(e) => log::warn!("telemetry poll failed: {e:#}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = r#"{"Charger_Status": "Not Charging", "Vbat": 7800, "Vbus": 0,
        "Ibat": -250, "IBus": 0, "Temp": 29, "REG14": "0x02", "Bat_SOC": "75%",
        "Bat_Stat": "OK", "Bat_Type": "A"}"#;

    #[tokio::test]
    async fn fetches_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/update_mupihattable.php"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SAMPLE, "application/json"))
            .mount(&server)
            .await;

        let client = TelemetryClient::new(format!("{}/update_mupihattable.php", server.uri()))
            .unwrap();
        let t = client.fetch().await.unwrap();
        assert_eq!(t.rows()[1].value, "7800mV");
        assert_eq!(t.bat_type.to_string(), "A");
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = TelemetryClient::new(server.uri()).unwrap();
        let err = client.fetch().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn poll_stops_when_callback_breaks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SAMPLE, "application/json"))
            .expect(3)
            .mount(&server)
            .await;

        let client = TelemetryClient::new(server.uri()).unwrap();
        let mut seen = 0;
        client
            .poll(Duration::from_millis(10), |_sample| {
                seen += 1;
                if seen == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        assert_eq!(seen, 3);
    }
}
