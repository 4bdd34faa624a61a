use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{ForecastDays, NormalizedDayRecord, Precipitation, Temperature},
    provider::{FetchQuery, Provider, ProviderId, get_json},
};

const OBSERVED_FIELDS: &str = "temperature_2m_min,temperature_2m_max,precipitation_sum";
const FORECAST_FIELDS: &str = "temperature_2m_min,temperature_2m_max,weather_code,precipitation_sum,precipitation_probability_max";

/// Keyless Open-Meteo access: the archive API and the forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    archive_url: String,
    forecast_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    pub fn new(http: Client, archive_base: String, forecast_base: String, timezone: String) -> Self {
        Self {
            http,
            archive_url: format!("{}/v1/archive", archive_base.trim_end_matches('/')),
            forecast_url: format!("{}/v1/forecast", forecast_base.trim_end_matches('/')),
            timezone,
        }
    }

    fn common_params(&self, lat: f64, lon: f64, daily: &str) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("daily", daily.to_string()),
            ("timezone", self.timezone.clone()),
        ]
    }

    async fn fetch_daily(&self, url: &str, params: &[(&str, String)]) -> Result<OmDaily, FetchError> {
        let parsed: OmResponse = get_json(&self.http, url, params).await?;
        parsed.daily.ok_or_else(|| FetchError::malformed("response has no daily block"))
    }

    async fn fetch_archive(&self, query: &FetchQuery) -> Result<NormalizedDayRecord, FetchError> {
        let (lat, lon) = query.coordinates()?;
        let date = query.dates.yesterday.format("%Y-%m-%d").to_string();

        let mut params = self.common_params(lat, lon, OBSERVED_FIELDS);
        params.push(("start_date", date.clone()));
        params.push(("end_date", date));

        let daily = self.fetch_daily(&self.archive_url, &params).await?;
        let idx = daily.position(query.dates.yesterday, 0)?;

        daily.observed(idx, ProviderId::OpenMeteoArchive).validated()
    }

    async fn fetch_lookback(&self, query: &FetchQuery) -> Result<NormalizedDayRecord, FetchError> {
        let (lat, lon) = query.coordinates()?;

        let mut params = self.common_params(lat, lon, OBSERVED_FIELDS);
        params.push(("past_days", "1".to_string()));
        params.push(("forecast_days", "1".to_string()));

        let daily = self.fetch_daily(&self.forecast_url, &params).await?;
        let idx = daily.position(query.dates.yesterday, 0)?;

        daily.observed(idx, ProviderId::OpenMeteoLookback).validated()
    }

    async fn fetch_forecast(&self, query: &FetchQuery) -> Result<ForecastDays, FetchError> {
        let (lat, lon) = query.coordinates()?;

        let mut params = self.common_params(lat, lon, FORECAST_FIELDS);
        params.push(("forecast_days", "2".to_string()));

        let daily = self.fetch_daily(&self.forecast_url, &params).await?;

        let today = daily
            .position(query.dates.today, 0)
            .ok()
            .and_then(|idx| daily.forecast(idx).validated().ok());
        let tomorrow = daily.forecast(daily.position(query.dates.tomorrow, 1)?).validated()?;

        Ok(ForecastDays { today, tomorrow })
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    daily: Option<OmDaily>,
}

/// Column-oriented daily block. Every column is indexed by the `time` column.
#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default, alias = "weathercode")]
    weather_code: Vec<Option<i64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}

fn at<T: Copy>(column: &[Option<T>], idx: usize) -> Option<T> {
    column.get(idx).copied().flatten()
}

impl OmDaily {
    /// Row of `date`. Without a `time` column the row is assumed to be `fallback`.
    fn position(&self, date: NaiveDate, fallback: usize) -> Result<usize, FetchError> {
        if self.time.is_empty() {
            return Ok(fallback);
        }

        let wanted = date.format("%Y-%m-%d").to_string();
        self.time
            .iter()
            .position(|t| *t == wanted)
            .ok_or_else(|| FetchError::malformed(format!("no daily row for {wanted}")))
    }

    fn temperature(&self, idx: usize) -> Temperature {
        Temperature::new(at(&self.temperature_2m_min, idx), at(&self.temperature_2m_max, idx))
    }

    fn observed(&self, idx: usize, source: ProviderId) -> NormalizedDayRecord {
        let total = at(&self.precipitation_sum, idx).unwrap_or(0.0);
        let raining = total > 0.0;

        NormalizedDayRecord {
            temperature: self.temperature(idx),
            precipitation: Precipitation::Total(total),
            description: NormalizedDayRecord::UNKNOWN_DESCRIPTION.to_string(),
            condition_main: if raining { "Rain".to_string() } else { String::new() },
            condition_code: if raining { 500 } else { 800 },
            probability_of_precipitation: None,
            source,
        }
    }

    fn forecast(&self, idx: usize) -> NormalizedDayRecord {
        let precip = at(&self.precipitation_sum, idx).unwrap_or(0.0);
        let condition = at(&self.weather_code, idx).and_then(wmo_condition);

        let (code, main, description) = match condition {
            Some(c) => c,
            None if precip > 0.0 => (500, "Rain", NormalizedDayRecord::UNKNOWN_DESCRIPTION),
            None => (800, "", NormalizedDayRecord::UNKNOWN_DESCRIPTION),
        };

        NormalizedDayRecord {
            temperature: self.temperature(idx),
            precipitation: Precipitation::LastPeriod(precip),
            description: description.to_string(),
            condition_main: main.to_string(),
            condition_code: code,
            probability_of_precipitation: at(&self.precipitation_probability_max, idx)
                .map(|pct| (pct / 100.0).clamp(0.0, 1.0)),
            source: ProviderId::OpenMeteoForecast,
        }
    }
}

/// WMO weather interpretation code to (condition family code, group, Turkish label).
fn wmo_condition(code: i64) -> Option<(u16, &'static str, &'static str)> {
    let mapped = match code {
        0 => (800, "Clear", "açık"),
        1 => (801, "Clouds", "çoğunlukla açık"),
        2 => (802, "Clouds", "parçalı bulutlu"),
        3 => (804, "Clouds", "kapalı"),
        45 => (741, "Fog", "sisli"),
        48 => (741, "Fog", "kırağılı sis"),
        51 => (500, "Drizzle", "hafif çiseleme"),
        53 => (500, "Drizzle", "çiseleme"),
        55 => (501, "Drizzle", "yoğun çiseleme"),
        56 | 57 => (511, "Drizzle", "donan çiseleme"),
        61 => (500, "Rain", "hafif yağmur"),
        63 => (501, "Rain", "yağmur"),
        65 => (502, "Rain", "kuvvetli yağmur"),
        66 | 67 => (511, "Rain", "dondurucu yağmur"),
        71 => (600, "Snow", "hafif kar"),
        73 => (601, "Snow", "kar"),
        75 => (602, "Snow", "yoğun kar"),
        77 => (600, "Snow", "kar taneleri"),
        80 => (520, "Rain", "sağanak"),
        81 => (521, "Rain", "kuvvetli sağanak"),
        82 => (522, "Rain", "şiddetli sağanak"),
        85 | 86 => (621, "Snow", "kar sağanağı"),
        95 => (211, "Thunderstorm", "gök gürültülü sağanak"),
        96 | 99 => (202, "Thunderstorm", "dolulu gök gürültülü fırtına"),
        _ => return None,
    };
    Some(mapped)
}

#[derive(Debug, Clone)]
pub struct ArchiveProvider {
    client: OpenMeteoClient,
}

impl ArchiveProvider {
    pub fn new(client: OpenMeteoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider<NormalizedDayRecord> for ArchiveProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteoArchive
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<NormalizedDayRecord, FetchError> {
        self.client.fetch_archive(query).await
    }
}

#[derive(Debug, Clone)]
pub struct LookbackProvider {
    client: OpenMeteoClient,
}

impl LookbackProvider {
    pub fn new(client: OpenMeteoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider<NormalizedDayRecord> for LookbackProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteoLookback
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<NormalizedDayRecord, FetchError> {
        self.client.fetch_lookback(query).await
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoForecastProvider {
    client: OpenMeteoClient,
}

impl OpenMeteoForecastProvider {
    pub fn new(client: OpenMeteoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider<ForecastDays> for OpenMeteoForecastProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteoForecast
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<ForecastDays, FetchError> {
        self.client.fetch_forecast(query).await
    }
}
