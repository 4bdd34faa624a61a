use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use weather_report_core::{
    Config, ConfigError, Credentials, ReportDates, RunOutcome, TelegramMessenger, report,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-report", version, about = "Daily weather summary for a Telegram chat")]
pub struct Cli {
    /// Path to a TOML config file. Defaults to the platform config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the composed message instead of sending it.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_with(Credentials::from_env()).await?;
        Ok(())
    }

    async fn run_with(
        self,
        credentials: Result<Credentials, ConfigError>,
    ) -> anyhow::Result<RunOutcome> {
        info!("Weather bot starting");

        // Checked before anything touches the network.
        let credentials = credentials?;
        let config = Config::load(self.config.as_deref())?;
        let dates = ReportDates::now(config.utc_offset_hours);

        if self.dry_run {
            let outcome = report::run(&config, &credentials, None, dates).await?;
            println!("{}", outcome.text);
            return Ok(outcome);
        }

        let messenger = TelegramMessenger::new(
            report::http_client(&config)?,
            config.endpoints.telegram.clone(),
            credentials.bot_token.clone(),
        );
        let outcome = report::run(&config, &credentials, Some(&messenger), dates).await?;

        info!("Weather bot finished successfully");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_file(server: &MockServer) -> tempfile::NamedTempFile {
        let uri = server.uri();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[cities]]
name = "Gebze"
lat = 40.8028
lon = 29.4307

[endpoints]
openweather = "{uri}"
open_meteo_archive = "{uri}"
open_meteo_forecast = "{uri}"
telegram = "{uri}"
"#
        )
        .unwrap();
        file
    }

    fn credentials() -> Result<Credentials, ConfigError> {
        Credentials::from_lookup(|name| match name {
            "WEATHER_API_KEY" => Some("KEY".to_string()),
            "BOT_TOKEN" => Some("123:ABC".to_string()),
            "CHAT_ID" => Some("-100200".to_string()),
            _ => None,
        })
    }

    fn cli(config: &tempfile::NamedTempFile, dry_run: bool) -> Cli {
        Cli { config: Some(config.path().to_path_buf()), dry_run }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_send() {
        let cli = Cli::try_parse_from(["weather-report"]).unwrap();
        assert!(!cli.dry_run);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_config_and_dry_run() {
        let cli =
            Cli::try_parse_from(["weather-report", "--config", "/etc/weather.toml", "--dry-run"])
                .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/weather.toml")));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let server = MockServer::start().await;
        let file = config_file(&server);

        let err = cli(&file, false)
            .run_with(Credentials::from_lookup(|_| None))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Missing env: WEATHER_API_KEY, BOT_TOKEN, CHAT_ID"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn dry_run_fetches_but_never_posts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let file = config_file(&server);

        let outcome = cli(&file, true).run_with(credentials()).await.unwrap();

        assert!(!outcome.delivered);
        assert!(outcome.text.contains("📍 *Gebze*"));

        let requests = server.received_requests().await.unwrap_or_default();
        assert!(!requests.is_empty());
        assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
    }

    #[tokio::test]
    async fn normal_run_delivers_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"ok": true}"#, "application/json"))
            .expect(1)
            .mount(&server)
            .await;
        let file = config_file(&server);

        let outcome = cli(&file, false).run_with(credentials()).await.unwrap();

        assert!(outcome.delivered);
    }
}
