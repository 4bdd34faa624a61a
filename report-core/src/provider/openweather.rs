use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{ForecastDays, NormalizedDayRecord, Precipitation, Temperature},
    provider::{FetchQuery, Provider, ProviderId, get_json},
};

/// Shared HTTP plumbing for the three OpenWeather endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl OpenWeatherClient {
    pub fn new(http: Client, base_url: String, api_key: String, language: String) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string(), api_key, language }
    }

    fn common_params(&self, lat: f64, lon: f64) -> Vec<(&'static str, String)> {
        vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("units", "metric".to_string()),
            ("lang", self.language.clone()),
            ("appid", self.api_key.clone()),
        ]
    }

    async fn fetch_day_summary(&self, query: &FetchQuery) -> Result<NormalizedDayRecord, FetchError> {
        let (lat, lon) = query.coordinates()?;
        let url = format!("{}/data/3.0/onecall/day_summary", self.base_url);

        let mut params = self.common_params(lat, lon);
        params.push(("date", query.dates.yesterday.format("%Y-%m-%d").to_string()));
        params.push(("tz", query.dates.offset().to_string()));

        let parsed: OwDaySummary = get_json(&self.http, &url, &params).await?;

        let temperature = parsed.temperature.unwrap_or_default();
        let total = parsed.precipitation.and_then(|p| p.total).unwrap_or(0.0);
        let raining = total > 0.0;

        NormalizedDayRecord {
            temperature: Temperature::new(temperature.min, temperature.max),
            precipitation: Precipitation::Total(total),
            description: NormalizedDayRecord::UNKNOWN_DESCRIPTION.to_string(),
            condition_main: if raining { "Rain".to_string() } else { String::new() },
            condition_code: if raining { 500 } else { 800 },
            probability_of_precipitation: None,
            source: ProviderId::OpenWeatherDaySummary,
        }
        .validated()
    }

    async fn fetch_onecall(&self, query: &FetchQuery) -> Result<ForecastDays, FetchError> {
        let (lat, lon) = query.coordinates()?;
        let url = format!("{}/data/3.0/onecall", self.base_url);

        let mut params = self.common_params(lat, lon);
        params.push(("exclude", "current,minutely,hourly,alerts".to_string()));

        let parsed: OwOneCall = get_json(&self.http, &url, &params).await?;

        if parsed.daily.len() < 2 {
            return Err(FetchError::malformed(format!(
                "onecall returned {} daily entries, need 2",
                parsed.daily.len()
            )));
        }

        let today = parsed.daily[0].to_record().validated().ok();
        let tomorrow = parsed.daily[1].to_record().validated()?;

        Ok(ForecastDays { today, tomorrow })
    }

    async fn fetch_three_hourly(&self, query: &FetchQuery) -> Result<ForecastDays, FetchError> {
        let (lat, lon) = query.coordinates()?;
        let url = format!("{}/data/2.5/forecast", self.base_url);

        let params = self.common_params(lat, lon);
        let parsed: OwThreeHourly = get_json(&self.http, &url, &params).await?;

        let offset = query.dates.offset();
        let today = bucket_day(&parsed.list, query.dates.today, offset);
        let tomorrow = bucket_day(&parsed.list, query.dates.tomorrow, offset).ok_or_else(|| {
            FetchError::malformed(format!("no 3-hour entries for {}", query.dates.tomorrow))
        })?;

        Ok(ForecastDays { today, tomorrow })
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwTemperatureRange {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwSummaryPrecipitation {
    total: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwDaySummary {
    temperature: Option<OwTemperatureRange>,
    precipitation: Option<OwSummaryPrecipitation>,
}

#[derive(Debug, Clone, Deserialize)]
struct OwCondition {
    id: Option<u16>,
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    temp: Option<OwTemperatureRange>,
    #[serde(default)]
    weather: Vec<OwCondition>,
    rain: Option<f64>,
    pop: Option<f64>,
}

impl OwDaily {
    fn to_record(&self) -> NormalizedDayRecord {
        let temp = self.temp.as_ref();
        let condition = self.weather.first();

        NormalizedDayRecord {
            temperature: Temperature::new(temp.and_then(|t| t.min), temp.and_then(|t| t.max)),
            precipitation: Precipitation::LastPeriod(self.rain.unwrap_or(0.0)),
            description: condition
                .map(|c| c.description.clone())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NormalizedDayRecord::UNKNOWN_DESCRIPTION.to_string()),
            condition_main: condition.map(|c| c.main.clone()).unwrap_or_default(),
            condition_code: condition.and_then(|c| c.id).unwrap_or(800),
            probability_of_precipitation: self.pop,
            source: ProviderId::OpenWeatherOneCall,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwOneCall {
    #[serde(default)]
    daily: Vec<OwDaily>,
}

#[derive(Debug, Deserialize)]
struct OwEntryMain {
    temp_min: Option<f64>,
    temp_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwRainVolume {
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwThreeHourEntry {
    dt: i64,
    main: OwEntryMain,
    #[serde(default)]
    weather: Vec<OwCondition>,
    rain: Option<OwRainVolume>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwThreeHourly {
    #[serde(default)]
    list: Vec<OwThreeHourEntry>,
}

/// Fold every 3-hour entry falling on `date` (local time) into one day.
///
/// Min of minimums, max of maximums, summed rain, first non-empty condition,
/// highest probability of precipitation.
fn bucket_day(
    entries: &[OwThreeHourEntry],
    date: NaiveDate,
    offset: FixedOffset,
) -> Option<NormalizedDayRecord> {
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    let mut rain = 0.0;
    let mut pop: Option<f64> = None;
    let mut condition: Option<&OwCondition> = None;

    let on_date = entries.iter().filter(|e| {
        DateTime::from_timestamp(e.dt, 0).map(|t| t.with_timezone(&offset).date_naive())
            == Some(date)
    });

    for entry in on_date {
        if let Some(v) = entry.main.temp_min {
            min = Some(min.map_or(v, |m| m.min(v)));
        }
        if let Some(v) = entry.main.temp_max {
            max = Some(max.map_or(v, |m| m.max(v)));
        }
        rain += entry.rain.as_ref().and_then(|r| r.three_hours).unwrap_or(0.0);
        if let Some(p) = entry.pop {
            pop = Some(pop.map_or(p, |q| q.max(p)));
        }
        if condition.is_none() {
            condition = entry.weather.iter().find(|w| !w.description.is_empty());
        }
    }

    NormalizedDayRecord {
        temperature: Temperature::new(min, max),
        precipitation: Precipitation::LastPeriod(rain),
        description: condition
            .map(|c| c.description.clone())
            .unwrap_or_else(|| NormalizedDayRecord::UNKNOWN_DESCRIPTION.to_string()),
        condition_main: condition.map(|c| c.main.clone()).unwrap_or_default(),
        condition_code: condition.and_then(|c| c.id).unwrap_or(800),
        probability_of_precipitation: pop,
        source: ProviderId::OpenWeatherThreeHourly,
    }
    .validated()
    .ok()
}

#[derive(Debug, Clone)]
pub struct DaySummaryProvider {
    client: OpenWeatherClient,
}

impl DaySummaryProvider {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider<NormalizedDayRecord> for DaySummaryProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherDaySummary
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<NormalizedDayRecord, FetchError> {
        self.client.fetch_day_summary(query).await
    }
}

#[derive(Debug, Clone)]
pub struct OneCallProvider {
    client: OpenWeatherClient,
}

impl OneCallProvider {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider<ForecastDays> for OneCallProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherOneCall
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<ForecastDays, FetchError> {
        self.client.fetch_onecall(query).await
    }
}

#[derive(Debug, Clone)]
pub struct ThreeHourlyProvider {
    client: OpenWeatherClient,
}

impl ThreeHourlyProvider {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider<ForecastDays> for ThreeHourlyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherThreeHourly
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<ForecastDays, FetchError> {
        self.client.fetch_three_hourly(query).await
    }
}
