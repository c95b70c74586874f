use chrono::{Duration, NaiveDate};
use serde::Deserialize;

/// Shift applied to user-supplied calendar dates before they are stored or
/// compared. The back office has historically stored tour dates and reservation
/// due dates one day after what the admin picked; whether that is a timezone
/// workaround or a bug is unresolved, so the offset is configuration.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DateNormalization {
    pub offset_days: i64,
}

impl DateNormalization {
    pub const fn new(offset_days: i64) -> Self {
        Self { offset_days }
    }

    /// No shift at all.
    pub const fn identity() -> Self {
        Self { offset_days: 0 }
    }

    pub fn normalize(&self, date: NaiveDate) -> NaiveDate {
        date + Duration::days(self.offset_days)
    }
}

impl Default for DateNormalization {
    fn default() -> Self {
        Self::identity()
    }
}
