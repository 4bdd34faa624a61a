use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

use crate::{
    clock::ReportDates,
    config::Config,
    error::{ConfigError, FetchError, truncate_body},
    model::{City, ForecastDays, NormalizedDayRecord, Window},
    provider::{
        openmeteo::{ArchiveProvider, LookbackProvider, OpenMeteoClient, OpenMeteoForecastProvider},
        openweather::{DaySummaryProvider, OneCallProvider, OpenWeatherClient, ThreeHourlyProvider},
    },
};

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeatherDaySummary,
    OpenWeatherOneCall,
    OpenWeatherThreeHourly,
    OpenMeteoArchive,
    OpenMeteoLookback,
    OpenMeteoForecast,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeatherDaySummary => "openweather-day-summary",
            ProviderId::OpenWeatherOneCall => "openweather-onecall",
            ProviderId::OpenWeatherThreeHourly => "openweather-3h",
            ProviderId::OpenMeteoArchive => "open-meteo-archive",
            ProviderId::OpenMeteoLookback => "open-meteo-lookback",
            ProviderId::OpenMeteoForecast => "open-meteo-forecast",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::OpenWeatherDaySummary,
            ProviderId::OpenWeatherOneCall,
            ProviderId::OpenWeatherThreeHourly,
            ProviderId::OpenMeteoArchive,
            ProviderId::OpenMeteoLookback,
            ProviderId::OpenMeteoForecast,
        ]
    }

    /// The window this provider can fill.
    pub fn window(&self) -> Window {
        match self {
            ProviderId::OpenWeatherDaySummary
            | ProviderId::OpenMeteoArchive
            | ProviderId::OpenMeteoLookback => Window::Yesterday,
            ProviderId::OpenWeatherOneCall
            | ProviderId::OpenWeatherThreeHourly
            | ProviderId::OpenMeteoForecast => Window::Forecast,
        }
    }

    /// Priority order for the yesterday window.
    pub const fn default_yesterday_chain() -> &'static [ProviderId] {
        &[
            ProviderId::OpenWeatherDaySummary,
            ProviderId::OpenMeteoArchive,
            ProviderId::OpenMeteoLookback,
        ]
    }

    /// Priority order for the today/tomorrow window.
    pub const fn default_forecast_chain() -> &'static [ProviderId] {
        &[
            ProviderId::OpenWeatherOneCall,
            ProviderId::OpenMeteoForecast,
            ProviderId::OpenWeatherThreeHourly,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        ProviderId::all().iter().copied().find(|id| id.as_str() == lower).ok_or_else(|| {
            let supported: Vec<&str> = ProviderId::all().iter().map(|id| id.as_str()).collect();
            ConfigError::UnknownProvider(value.to_string(), supported.join(", "))
        })
    }
}

/// Parameters shared by every provider attempt for one city.
#[derive(Debug, Clone, Copy)]
pub struct FetchQuery {
    pub lat: f64,
    pub lon: f64,
    pub dates: ReportDates,
}

impl FetchQuery {
    pub fn new(city: &City, dates: ReportDates) -> Self {
        Self { lat: city.lat, lon: city.lon, dates }
    }

    /// Returns the coordinates if they are finite and on the globe.
    pub fn coordinates(&self) -> Result<(f64, f64), FetchError> {
        let valid = self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon);

        if valid {
            Ok((self.lat, self.lon))
        } else {
            Err(FetchError::InvalidCoordinates { lat: self.lat, lon: self.lon })
        }
    }
}

/// One way of producing a `T` for a city. Chains of these are tried in order.
#[async_trait]
pub trait Provider<T>: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch(&self, query: &FetchQuery) -> Result<T, FetchError>;
}

pub type YesterdayChain = Vec<Box<dyn Provider<NormalizedDayRecord>>>;
pub type ForecastChain = Vec<Box<dyn Provider<ForecastDays>>>;

/// The fallback chains for both windows.
#[derive(Debug)]
pub struct Chains {
    pub yesterday: YesterdayChain,
    pub forecast: ForecastChain,
}

impl Chains {
    /// Build both chains in the configured priority order.
    pub fn from_config(config: &Config, api_key: &str, http: &Client) -> Result<Self, ConfigError> {
        let openweather = OpenWeatherClient::new(
            http.clone(),
            config.endpoints.openweather.clone(),
            api_key.to_owned(),
            config.language.clone(),
        );
        let open_meteo = OpenMeteoClient::new(
            http.clone(),
            config.endpoints.open_meteo_archive.clone(),
            config.endpoints.open_meteo_forecast.clone(),
            config.timezone.clone(),
        );

        let yesterday: YesterdayChain = config
            .yesterday_chain()?
            .into_iter()
            .map(|id| yesterday_provider(id, &openweather, &open_meteo))
            .collect::<Result<_, _>>()?;

        let forecast: ForecastChain = config
            .forecast_chain()?
            .into_iter()
            .map(|id| forecast_provider(id, &openweather, &open_meteo))
            .collect::<Result<_, _>>()?;

        Ok(Self { yesterday, forecast })
    }
}

fn yesterday_provider(
    id: ProviderId,
    openweather: &OpenWeatherClient,
    open_meteo: &OpenMeteoClient,
) -> Result<Box<dyn Provider<NormalizedDayRecord>>, ConfigError> {
    let boxed: Box<dyn Provider<NormalizedDayRecord>> = match id {
        ProviderId::OpenWeatherDaySummary => Box::new(DaySummaryProvider::new(openweather.clone())),
        ProviderId::OpenMeteoArchive => Box::new(ArchiveProvider::new(open_meteo.clone())),
        ProviderId::OpenMeteoLookback => Box::new(LookbackProvider::new(open_meteo.clone())),
        other => return Err(wrong_window(other, Window::Yesterday)),
    };

    Ok(boxed)
}

fn forecast_provider(
    id: ProviderId,
    openweather: &OpenWeatherClient,
    open_meteo: &OpenMeteoClient,
) -> Result<Box<dyn Provider<ForecastDays>>, ConfigError> {
    let boxed: Box<dyn Provider<ForecastDays>> = match id {
        ProviderId::OpenWeatherOneCall => Box::new(OneCallProvider::new(openweather.clone())),
        ProviderId::OpenWeatherThreeHourly => {
            Box::new(ThreeHourlyProvider::new(openweather.clone()))
        }
        ProviderId::OpenMeteoForecast => {
            Box::new(OpenMeteoForecastProvider::new(open_meteo.clone()))
        }
        other => return Err(wrong_window(other, Window::Forecast)),
    };

    Ok(boxed)
}

fn wrong_window(id: ProviderId, window: Window) -> ConfigError {
    ConfigError::WrongWindow { provider: id.to_string(), window: window.as_str() }
}

/// One GET request, decoded as JSON. Any failure comes back as a `FetchError`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    // Query strings may carry an API key, strip the URL from transport errors.
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.without_url()))?;

    let status = res.status();
    let body = res.text().await.map_err(|e| FetchError::Transport(e.without_url()))?;

    if !status.is_success() {
        return Err(FetchError::Status { status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::malformed(e.to_string()))
}
