use serde::{Deserialize, Serialize};

use crate::{error::FetchError, provider::ProviderId};

/// A named location the report covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), lat, lon }
    }
}

/// The two periods fetched per city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Yesterday,
    Forecast,
}

impl Window {
    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Yesterday => "yesterday",
            Window::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Temperature {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Temperature {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Precipitation in millimetres.
///
/// Observation summaries report a daily total, forecasts report the amount
/// expected over their own period. Both mean "it rains" when positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precipitation {
    Total(f64),
    LastPeriod(f64),
}

/// Provider-agnostic weather for a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDayRecord {
    pub temperature: Temperature,
    pub precipitation: Precipitation,
    /// Display text, possibly localized. `"—"` when unknown.
    pub description: String,
    /// Condition group in English ("Rain", "Clear", ...), empty when unknown.
    pub condition_main: String,
    /// 3-digit condition family: 2xx thunderstorm, 5xx rain/drizzle, 8xx clear/clouds.
    pub condition_code: u16,
    /// 0.0..=1.0, forecasts only.
    pub probability_of_precipitation: Option<f64>,
    pub source: ProviderId,
}

impl NormalizedDayRecord {
    pub const UNKNOWN_DESCRIPTION: &'static str = "—";

    /// Checks the record carries at least one temperature bound.
    pub fn validated(self) -> Result<Self, FetchError> {
        if self.temperature.is_empty() {
            return Err(FetchError::MissingTemperature);
        }
        Ok(self)
    }

    pub fn source_id(&self) -> &'static str {
        self.source.as_str()
    }
}

/// Output of a forecast provider. One request yields both days.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDays {
    pub today: Option<NormalizedDayRecord>,
    pub tomorrow: NormalizedDayRecord,
}

/// Result of running a fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Unavailable,
}

impl<T> Resolution<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Resolution::Unavailable)
    }
}

impl<T> From<Option<T>> for Resolution<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Resolution::Resolved(v),
            None => Resolution::Unavailable,
        }
    }
}

/// Everything the formatter needs for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct CityReport {
    pub city: City,
    pub yesterday: Resolution<NormalizedDayRecord>,
    pub today: Resolution<NormalizedDayRecord>,
    pub tomorrow: Resolution<NormalizedDayRecord>,
}

impl CityReport {
    pub fn new(
        city: City,
        yesterday: Resolution<NormalizedDayRecord>,
        forecast: Resolution<ForecastDays>,
    ) -> Self {
        let (today, tomorrow) = match forecast {
            Resolution::Resolved(days) => (days.today.into(), Resolution::Resolved(days.tomorrow)),
            Resolution::Unavailable => (Resolution::Unavailable, Resolution::Unavailable),
        };

        Self { city, yesterday, today, tomorrow }
    }
}
