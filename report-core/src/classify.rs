use crate::model::{NormalizedDayRecord, Precipitation};

pub const COLD_BELOW: i64 = 5;
pub const HOT_ABOVE: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub has_precipitation: bool,
    pub is_cold: bool,
    pub is_hot: bool,
}

/// Round to whole degrees, ties to even.
pub fn round_temp(value: f64) -> i64 {
    value.round_ties_even() as i64
}

pub fn classify(record: &NormalizedDayRecord) -> Flags {
    Flags {
        has_precipitation: has_precipitation(record),
        is_cold: record.temperature.min.is_some_and(|t| round_temp(t) < COLD_BELOW),
        is_hot: record.temperature.max.is_some_and(|t| round_temp(t) > HOT_ABOVE),
    }
}

fn has_precipitation(record: &NormalizedDayRecord) -> bool {
    match record.precipitation {
        Precipitation::Total(total) => total > 0.0,
        Precipitation::LastPeriod(amount) => {
            let group = record.condition_main.to_lowercase();
            amount > 0.0
                || group == "rain"
                || group == "drizzle"
                || (500..600).contains(&record.condition_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Temperature, provider::ProviderId};

    fn forecast(min: Option<f64>, max: Option<f64>) -> NormalizedDayRecord {
        NormalizedDayRecord {
            temperature: Temperature::new(min, max),
            precipitation: Precipitation::LastPeriod(0.0),
            description: "açık".to_string(),
            condition_main: "Clear".to_string(),
            condition_code: 800,
            probability_of_precipitation: None,
            source: ProviderId::OpenWeatherOneCall,
        }
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_temp(4.5), 4);
        assert_eq!(round_temp(5.5), 6);
        assert_eq!(round_temp(-0.5), 0);
        assert_eq!(round_temp(30.5), 30);
        assert_eq!(round_temp(30.51), 31);
    }

    #[test]
    fn cold_and_hot_use_rounded_values() {
        let flags = classify(&forecast(Some(4.5), Some(30.5)));
        assert!(flags.is_cold, "4.5 rounds to 4");
        assert!(!flags.is_hot, "30.5 rounds to 30");

        let flags = classify(&forecast(Some(5.5), Some(31.5)));
        assert!(!flags.is_cold);
        assert!(flags.is_hot);
    }

    #[test]
    fn thresholds_are_monotonic() {
        for max in [31.0, 35.2, 48.9] {
            assert!(classify(&forecast(Some(10.0), Some(max))).is_hot);
        }
        for min in [4.4, 0.0, -12.7] {
            assert!(classify(&forecast(Some(min), Some(10.0))).is_cold);
        }
    }

    #[test]
    fn absent_temperatures_never_flag() {
        let flags = classify(&forecast(None, Some(12.0)));
        assert!(!flags.is_cold);

        let flags = classify(&forecast(Some(12.0), None));
        assert!(!flags.is_hot);
    }

    #[test]
    fn condition_code_alone_means_rain() {
        let mut record = forecast(Some(8.0), Some(14.0));
        record.condition_code = 501;
        record.condition_main = "Clouds".to_string();

        assert!(classify(&record).has_precipitation);
    }

    #[test]
    fn drizzle_group_alone_means_rain() {
        let mut record = forecast(Some(8.0), Some(14.0));
        record.condition_main = "Drizzle".to_string();
        record.condition_code = 300;

        assert!(classify(&record).has_precipitation);
    }

    #[test]
    fn forecast_amount_alone_means_rain() {
        let mut record = forecast(Some(8.0), Some(14.0));
        record.precipitation = Precipitation::LastPeriod(0.2);

        assert!(classify(&record).has_precipitation);
    }

    #[test]
    fn clear_forecast_is_dry() {
        assert!(!classify(&forecast(Some(8.0), Some(14.0))).has_precipitation);
    }

    #[test]
    fn observed_total_ignores_condition_fields() {
        let mut record = forecast(Some(8.0), Some(14.0));
        record.precipitation = Precipitation::Total(0.0);
        record.condition_code = 501;
        record.condition_main = "Rain".to_string();
        assert!(!classify(&record).has_precipitation);

        record.precipitation = Precipitation::Total(0.1);
        assert!(classify(&record).has_precipitation);
    }
}
