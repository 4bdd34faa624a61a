use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, Utc};

/// Local "now" and the three calendar days a report talks about.
///
/// Uses a fixed UTC offset, not a timezone database: there is no DST handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDates {
    pub now: DateTime<FixedOffset>,
    pub yesterday: NaiveDate,
    pub today: NaiveDate,
    pub tomorrow: NaiveDate,
}

impl ReportDates {
    /// Compute the dates for `instant` shifted by `offset_hours`.
    ///
    /// Offsets outside -23..=23 hours fall back to UTC. `Config` rejects
    /// those on load, so only hand-built callers can hit this.
    pub fn at(instant: DateTime<Utc>, offset_hours: i32) -> Self {
        let offset = fixed_offset(offset_hours);
        let now = instant.with_timezone(&offset);
        let today = now.date_naive();

        Self {
            now,
            yesterday: today.checked_sub_days(Days::new(1)).unwrap_or(today),
            today,
            tomorrow: today.checked_add_days(Days::new(1)).unwrap_or(today),
        }
    }

    pub fn now(offset_hours: i32) -> Self {
        Self::at(Utc::now(), offset_hours)
    }

    pub fn offset(&self) -> FixedOffset {
        *self.now.offset()
    }
}

fn fixed_offset(hours: i32) -> FixedOffset {
    hours.checked_mul(3600).and_then(FixedOffset::east_opt).unwrap_or(Utc.fix())
}
