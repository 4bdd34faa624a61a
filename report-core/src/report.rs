use anyhow::{Context, Result, bail};
use reqwest::Client;
use tracing::info;

use crate::{
    clock::ReportDates,
    config::{Config, Credentials},
    delivery::Messenger,
    format::Formatter,
    model::{City, CityReport, Window},
    provider::{Chains, FetchQuery},
    resolver::resolve,
};

/// HTTP client shared by every provider, with the per-request timeout applied.
pub fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")
}

/// Resolve both windows for every city, one request at a time.
pub async fn collect(cities: &[City], chains: &Chains, dates: ReportDates) -> Vec<CityReport> {
    let mut reports = Vec::with_capacity(cities.len());

    for city in cities {
        let query = FetchQuery::new(city, dates);
        let yesterday = resolve(city, Window::Yesterday, &chains.yesterday, &query).await;
        let forecast = resolve(city, Window::Forecast, &chains.forecast, &query).await;

        reports.push(CityReport::new(city.clone(), yesterday, forecast));
    }

    reports
}

/// Fetch everything and render the message text.
pub async fn compose(
    config: &Config,
    chains: &Chains,
    formatter: &Formatter,
    dates: ReportDates,
) -> Result<String> {
    info!(yesterday = %dates.yesterday, today = %dates.today, tomorrow = %dates.tomorrow, "Fetching weather");

    let reports = collect(&config.cities, chains, dates).await;
    let text = formatter.render(dates.now, &reports);

    if text.trim().is_empty() {
        bail!("Message empty, aborting");
    }

    Ok(text)
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub text: String,
    pub delivered: bool,
}

/// Compose the report and deliver it through `messenger`. Without a messenger
/// the text is only composed, which is what a dry run wants.
pub async fn run(
    config: &Config,
    credentials: &Credentials,
    messenger: Option<&dyn Messenger>,
    dates: ReportDates,
) -> Result<RunOutcome> {
    let http = http_client(config)?;
    let chains = Chains::from_config(config, &credentials.weather_api_key, &http)
        .context("Invalid provider chain configuration")?;

    let text = compose(config, &chains, &Formatter::default(), dates).await?;

    let Some(messenger) = messenger else {
        info!("Dry run, message not delivered");
        return Ok(RunOutcome { text, delivered: false });
    };

    messenger
        .send(&credentials.chat_id, &text)
        .await
        .context("Failed to deliver the weather report")?;

    Ok(RunOutcome { text, delivered: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Endpoints,
        error::DeliveryError,
        model::Resolution,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::{sync::Mutex, time::Duration};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Messenger for Recording {
        async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Rejected("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn dates() -> ReportDates {
        ReportDates::at(Utc.with_ymd_and_hms(2026, 10, 19, 17, 0, 0).unwrap(), 3)
    }

    fn credentials() -> Credentials {
        Credentials {
            weather_api_key: "KEY".into(),
            bot_token: "123:ABC".into(),
            chat_id: "-100200".into(),
        }
    }

    async fn offline_config() -> (MockServer, Config) {
        // Nothing is mounted: every provider gets a 404.
        let server = MockServer::start().await;
        let config = Config { endpoints: Endpoints::all_at(&server.uri()), ..Config::default() };
        (server, config)
    }

    #[tokio::test]
    async fn every_window_unavailable_still_composes() {
        let (_server, config) = offline_config().await;
        let chains = Chains::from_config(&config, "KEY", &Client::new()).unwrap();

        let reports = collect(&config.cities, &chains, dates()).await;

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert_eq!(report.yesterday, Resolution::Unavailable);
            assert_eq!(report.today, Resolution::Unavailable);
            assert_eq!(report.tomorrow, Resolution::Unavailable);
        }

        let text = compose(&config, &chains, &Formatter::default(), dates()).await.unwrap();
        assert_eq!(text.matches("Veri alınamadı").count(), 6);
    }

    #[tokio::test]
    async fn run_sends_once_to_configured_chat() {
        let (_server, config) = offline_config().await;
        let messenger = Recording::default();

        let outcome = run(&config, &credentials(), Some(&messenger), dates()).await.unwrap();

        assert!(outcome.delivered);
        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "-100200");
        assert_eq!(sent[0].1, outcome.text);
    }

    #[tokio::test]
    async fn run_without_messenger_only_composes() {
        let (_server, config) = offline_config().await;

        let outcome = run(&config, &credentials(), None, dates()).await.unwrap();

        assert!(!outcome.delivered);
        assert!(outcome.text.ends_with("_İyi günler dileriz!_"));
    }

    #[tokio::test]
    async fn delivery_failure_fails_the_run() {
        let (_server, config) = offline_config().await;
        let messenger = Recording { fail: true, ..Recording::default() };

        let err = run(&config, &credentials(), Some(&messenger), dates()).await.unwrap_err();
        assert!(format!("{err:#}").contains("chat not found"));
    }

    #[tokio::test]
    async fn bad_chain_fails_before_fetching() {
        let (_server, mut config) = offline_config().await;
        config.forecast_chain = Some(vec!["open-meteo-archive".into()]);

        let messenger = Recording::default();

        let err = run(&config, &credentials(), Some(&messenger), dates()).await.unwrap_err();
        assert!(format!("{err:#}").contains("cannot serve the forecast window"));
        assert!(messenger.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_provider_times_out_and_next_one_answers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall/day_summary"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "date": "2026-10-18",
                        "temperature": {"min": 1.0, "max": 2.0},
                        "precipitation": {"total": 9.0}
                    }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "daily": {
                    "time": ["2026-10-18"],
                    "temperature_2m_min": [10.0],
                    "temperature_2m_max": [18.0],
                    "precipitation_sum": [0.0]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            cities: vec![City::new("Gebze", 40.8028, 29.4307)],
            request_timeout_secs: 1,
            endpoints: Endpoints::all_at(&server.uri()),
            ..Config::default()
        };
        let http = http_client(&config).unwrap();
        let chains = Chains::from_config(&config, "KEY", &http).unwrap();

        let text = compose(&config, &chains, &Formatter::default(), dates()).await.unwrap();

        assert!(text.contains("  📅 Dün: 10°–18° ⛅ Yağışsız"), "{text}");
    }
}
