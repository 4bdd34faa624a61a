use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{error::ConfigError, model::City, provider::ProviderId};

pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "CHAT_ID";

/// Base URLs of every remote service. Overridable so tests can point at a mock server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub openweather: String,
    pub open_meteo_archive: String,
    pub open_meteo_forecast: String,
    pub telegram: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openweather: "https://api.openweathermap.org".to_string(),
            open_meteo_archive: "https://archive-api.open-meteo.com".to_string(),
            open_meteo_forecast: "https://api.open-meteo.com".to_string(),
            telegram: "https://api.telegram.org".to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint served from one base URL.
    pub fn all_at(base: &str) -> Self {
        Self {
            openweather: base.to_string(),
            open_meteo_archive: base.to_string(),
            open_meteo_forecast: base.to_string(),
            telegram: base.to_string(),
        }
    }
}

/// Non-secret settings, optionally read from a TOML file.
///
/// Example TOML:
/// ```toml
/// utc_offset_hours = 3
/// forecast_chain = ["open-meteo-forecast", "openweather-3h"]
///
/// [[cities]]
/// name = "Gebze"
/// lat = 40.8028
/// lon = 29.4307
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cities: Vec<City>,
    pub utc_offset_hours: i32,
    /// IANA name sent to Open-Meteo so its daily rows follow local days.
    pub timezone: String,
    /// Language of OpenWeather condition descriptions.
    pub language: String,
    pub request_timeout_secs: u64,
    pub yesterday_chain: Option<Vec<String>>,
    pub forecast_chain: Option<Vec<String>>,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cities: vec![
                City::new("Gebze", 40.8028, 29.4307),
                City::new("İstanbul", 41.0082, 28.9784),
            ],
            utc_offset_hours: 3,
            timezone: "Europe/Istanbul".to_string(),
            language: "tr".to_string(),
            request_timeout_secs: 15,
            yesterday_chain: None,
            forecast_chain: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load from `path` if given, else from the platform config dir.
    ///
    /// A missing file at the default location is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_file_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        let config: Self = toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(ConfigError::InvalidOffset(self.utc_offset_hours));
        }

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "weather-report", "weather-report")
            .ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn yesterday_chain(&self) -> Result<Vec<ProviderId>, ConfigError> {
        parse_chain(self.yesterday_chain.as_deref(), ProviderId::default_yesterday_chain())
    }

    pub fn forecast_chain(&self) -> Result<Vec<ProviderId>, ConfigError> {
        parse_chain(self.forecast_chain.as_deref(), ProviderId::default_forecast_chain())
    }
}

fn parse_chain(
    names: Option<&[String]>,
    default: &[ProviderId],
) -> Result<Vec<ProviderId>, ConfigError> {
    match names {
        Some(names) => names.iter().map(|n| ProviderId::try_from(n.as_str())).collect(),
        None => Ok(default.to_vec()),
    }
}

/// The three secrets, read from the environment only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub weather_api_key: String,
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("weather_api_key", &"<redacted>")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Empty values count as missing. Reports every missing name at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let weather_api_key = read(ENV_WEATHER_API_KEY);
        let bot_token = read(ENV_BOT_TOKEN);
        let chat_id = read(ENV_CHAT_ID);

        match (weather_api_key, bot_token, chat_id) {
            (Some(weather_api_key), Some(bot_token), Some(chat_id)) => {
                Ok(Self { weather_api_key, bot_token, chat_id })
            }
            (key, token, chat) => {
                let missing = [
                    (key.is_none(), ENV_WEATHER_API_KEY),
                    (token.is_none(), ENV_BOT_TOKEN),
                    (chat.is_none(), ENV_CHAT_ID),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();

                Err(ConfigError::MissingEnv(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_cover_two_cities() {
        let cfg = Config::default();

        let names: Vec<&str> = cfg.cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Gebze", "İstanbul"]);
        assert_eq!(cfg.utc_offset_hours, 3);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
request_timeout_secs = 5
forecast_chain = ["open-meteo-forecast"]

[[cities]]
name = "Ankara"
lat = 39.9334
lon = 32.8597

[endpoints]
telegram = "http://localhost:9999"
"#
        )
        .unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();

        assert_eq!(cfg.cities, vec![City::new("Ankara", 39.9334, 32.8597)]);
        assert_eq!(cfg.request_timeout_secs, 5);
        assert_eq!(cfg.timezone, "Europe/Istanbul");
        assert_eq!(cfg.endpoints.telegram, "http://localhost:9999");
        assert_eq!(cfg.endpoints.openweather, "https://api.openweathermap.org");
        assert_eq!(cfg.forecast_chain().unwrap(), vec![ProviderId::OpenMeteoForecast]);
        assert_eq!(cfg.yesterday_chain().unwrap(), ProviderId::default_yesterday_chain());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cities = 3").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn out_of_range_offset_is_rejected_on_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "utc_offset_hours = 40").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOffset(40)));
        assert!(err.to_string().contains("got 40"));
    }

    #[test]
    fn negative_offset_within_a_day_is_accepted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "utc_offset_hours = -11").unwrap();

        let cfg = Config::load_from(file.path()).unwrap();
        assert_eq!(cfg.utc_offset_hours, -11);
    }

    #[test]
    fn unknown_provider_in_chain_is_rejected() {
        let cfg = Config {
            yesterday_chain: Some(vec!["accuweather".to_string()]),
            ..Config::default()
        };

        let err = cfg.yesterday_chain().unwrap_err();
        assert!(err.to_string().contains("Unknown provider 'accuweather'"));
    }

    #[test]
    fn credentials_from_complete_env() {
        let creds = Credentials::from_lookup(lookup(&[
            ("WEATHER_API_KEY", "KEY"),
            ("BOT_TOKEN", "123:ABC"),
            ("CHAT_ID", "-100200"),
        ]))
        .unwrap();

        assert_eq!(creds.weather_api_key, "KEY");
        assert_eq!(creds.chat_id, "-100200");
    }

    #[test]
    fn credentials_report_all_missing_names() {
        let err = Credentials::from_lookup(lookup(&[("WEATHER_API_KEY", "KEY"), ("BOT_TOKEN", "  ")]))
            .unwrap_err();

        match err {
            ConfigError::MissingEnv(missing) => assert_eq!(missing, vec!["BOT_TOKEN", "CHAT_ID"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn credentials_debug_redacts_secrets() {
        let creds = Credentials {
            weather_api_key: "SECRET_KEY".into(),
            bot_token: "SECRET_TOKEN".into(),
            chat_id: "42".into(),
        };

        let shown = format!("{creds:?}");
        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("42"));
    }
}
