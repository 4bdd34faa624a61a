//! Rendering of the final message text.
//!
//! Everything here is pure: the same reports and timestamp always give the
//! same output. All user-visible wording lives in [`Phrases`].

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::{
    classify::{Flags, classify, round_temp},
    model::{CityReport, NormalizedDayRecord, Resolution},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoji {
    pub rain: &'static str,
    pub storm: &'static str,
    pub sun: &'static str,
    pub partly_cloudy: &'static str,
    pub cloudy: &'static str,
    pub cold: &'static str,
    pub hot: &'static str,
}

/// Fixed wording of the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrases {
    pub months: [&'static str; 12],
    pub title: &'static str,
    pub clock_prefix: &'static str,
    pub subtitle: &'static str,
    pub footer: &'static str,
    pub city_prefix: &'static str,
    pub yesterday_label: &'static str,
    pub today_label: &'static str,
    pub tomorrow_label: &'static str,
    pub unavailable: &'static str,
    pub rainy_day: &'static str,
    pub dry_day: &'static str,
    pub placeholder: &'static str,
    pub drop_warning: &'static str,
    pub umbrella_note: &'static str,
    pub warm_clothes_note: &'static str,
    pub pop_label: &'static str,
    pub emoji: Emoji,
}

impl Phrases {
    pub fn turkish() -> Self {
        Self {
            months: [
                "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül",
                "Ekim", "Kasım", "Aralık",
            ],
            title: "🌤️ *Hava Durumu Özeti*",
            clock_prefix: "🕗",
            subtitle: "_Dün gerçekleşen, bugün ve yarın tahmin_",
            footer: "_İyi günler dileriz!_",
            city_prefix: "📍",
            yesterday_label: "📅 Dün",
            today_label: "🕐 Bugün",
            tomorrow_label: "📆 Yarın",
            unavailable: "Veri alınamadı",
            rainy_day: "Yağışlı",
            dry_day: "Yağışsız",
            placeholder: "?",
            drop_warning: "⚠️ Yarın hava {diff}° daha soğuk!",
            umbrella_note: "Şemsiyeni unutma ☔",
            warm_clothes_note: "Sıkı giyin 🧥",
            pop_label: "yağış ihtimali",
            emoji: Emoji {
                rain: "🌧️",
                storm: "⛈️",
                sun: "☀️",
                partly_cloudy: "⛅",
                cloudy: "☁️",
                cold: "❄️",
                hot: "🔥",
            },
        }
    }
}

impl Default for Phrases {
    fn default() -> Self {
        Self::turkish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Formatter {
    phrases: Phrases,
}

impl Formatter {
    pub fn new(phrases: Phrases) -> Self {
        Self { phrases }
    }

    /// Full message: header, one block per city, footer.
    pub fn render(&self, generated_at: DateTime<FixedOffset>, reports: &[CityReport]) -> String {
        let mut lines = self.header(generated_at);

        for report in reports {
            lines.push(format!("{} *{}*", self.phrases.city_prefix, report.city.name));
            lines.push(self.yesterday_line(&report.yesterday));
            lines.push(self.forecast_line(self.phrases.today_label, &report.today));
            lines.push(self.forecast_line(self.phrases.tomorrow_label, &report.tomorrow));
            if let Some(warning) = self.warning_line(&report.today, &report.tomorrow) {
                lines.push(warning);
            }
            lines.push(String::new());
        }

        lines.push(self.phrases.footer.to_string());

        lines.join("\n").trim().to_string()
    }

    fn header(&self, at: DateTime<FixedOffset>) -> Vec<String> {
        let month = self.phrases.months[at.month0() as usize];
        vec![
            self.phrases.title.to_string(),
            format!(
                "{} {} {} {}, {:02}:{:02}",
                self.phrases.clock_prefix,
                at.day(),
                month,
                at.year(),
                at.hour(),
                at.minute()
            ),
            self.phrases.subtitle.to_string(),
            String::new(),
        ]
    }

    pub fn yesterday_line(&self, day: &Resolution<NormalizedDayRecord>) -> String {
        let label = self.phrases.yesterday_label;
        let Resolution::Resolved(record) = day else {
            return self.unavailable_line(label);
        };

        let flags = classify(record);
        let (emoji, text) = if flags.has_precipitation {
            (self.phrases.emoji.rain, self.phrases.rainy_day)
        } else {
            (self.phrases.emoji.partly_cloudy, self.phrases.dry_day)
        };

        self.populated_line(label, record, emoji, text, flags)
    }

    pub fn forecast_line(&self, label: &str, day: &Resolution<NormalizedDayRecord>) -> String {
        let Resolution::Resolved(record) = day else {
            return self.unavailable_line(label);
        };

        let flags = classify(record);
        let emoji = self.condition_emoji(record.condition_code, flags.has_precipitation);
        let text = capitalize(&record.description);

        self.populated_line(label, record, emoji, &text, flags)
    }

    /// Warns about a day-over-day drop of the maximum temperature.
    pub fn warning_line(
        &self,
        today: &Resolution<NormalizedDayRecord>,
        tomorrow: &Resolution<NormalizedDayRecord>,
    ) -> Option<String> {
        let (Resolution::Resolved(today), Resolution::Resolved(tomorrow)) = (today, tomorrow) else {
            return None;
        };

        let diff = round_temp(today.temperature.max? - tomorrow.temperature.max?);
        if diff <= 0 {
            return None;
        }

        let note = if classify(tomorrow).has_precipitation {
            self.phrases.umbrella_note
        } else {
            self.phrases.warm_clothes_note
        };

        let mut line = format!(
            "  {} {}",
            self.phrases.drop_warning.replace("{diff}", &diff.to_string()),
            note
        );
        if let Some(pop) = tomorrow.probability_of_precipitation {
            line.push_str(&format!(" ({} %{})", self.phrases.pop_label, (pop * 100.0).round() as i64));
        }

        Some(line)
    }

    fn unavailable_line(&self, label: &str) -> String {
        format!("  {label}: {}", self.phrases.unavailable)
    }

    fn populated_line(
        &self,
        label: &str,
        record: &NormalizedDayRecord,
        emoji: &str,
        text: &str,
        flags: Flags,
    ) -> String {
        let mut line = format!(
            "  {label}: {}°–{}° {emoji} {text}",
            self.degrees(record.temperature.min),
            self.degrees(record.temperature.max)
        );

        if flags.is_cold {
            line.push(' ');
            line.push_str(self.phrases.emoji.cold);
        }
        if flags.is_hot {
            line.push(' ');
            line.push_str(self.phrases.emoji.hot);
        }

        line
    }

    fn degrees(&self, value: Option<f64>) -> String {
        match value {
            Some(v) => round_temp(v).to_string(),
            None => self.phrases.placeholder.to_string(),
        }
    }

    fn condition_emoji(&self, code: u16, has_precipitation: bool) -> &'static str {
        let emoji = &self.phrases.emoji;
        match code {
            _ if has_precipitation => emoji.rain,
            500..=599 => emoji.rain,
            200..=299 => emoji.storm,
            800 => emoji.sun,
            801 | 802 => emoji.partly_cloudy,
            803 | 804 => emoji.cloudy,
            _ => emoji.sun,
        }
    }
}

fn capitalize(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => NormalizedDayRecord::UNKNOWN_DESCRIPTION.to_string(),
    }
}
