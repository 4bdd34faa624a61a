//! Core library for the daily weather report.
//!
//! This crate defines:
//! - Per-provider clients normalizing their payloads into one day record
//! - Fallback resolution over ordered provider chains
//! - Rain and temperature classification, message formatting
//! - Configuration, credentials and message delivery
//!
//! It is used by `weather-report`, which only parses arguments and maps the
//! outcome to an exit code.

pub mod classify;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod report;
pub mod resolver;

pub use classify::{Flags, classify};
pub use clock::ReportDates;
pub use config::{Config, Credentials, Endpoints};
pub use delivery::{Messenger, TelegramMessenger};
pub use error::{ConfigError, DeliveryError, FetchError};
pub use format::{Formatter, Phrases};
pub use model::{City, CityReport, ForecastDays, NormalizedDayRecord, Resolution, Window};
pub use provider::{Chains, FetchQuery, Provider, ProviderId};
pub use report::RunOutcome;
pub use resolver::resolve;
