//! Day numbering and date stamps for newsletter entries.

use chrono::{Datelike, NaiveDate};

/// Format of the human-readable date stamp, e.g. "Monday, March 02, 2026".
pub const DATE_STAMP_FORMAT: &str = "%A, %B %d, %Y";

/// Numbers newsletter days.
///
/// Without an epoch the day number is the day of the year (Jan 1 is day 1).
/// With one, the epoch itself is day 1 and numbering never resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayCounter {
    epoch: Option<NaiveDate>,
}

impl DayCounter {
    pub fn new(epoch: Option<NaiveDate>) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> Option<NaiveDate> {
        self.epoch
    }

    pub fn day_number(&self, date: NaiveDate) -> i64 {
        match self.epoch {
            Some(epoch) => (date - epoch).num_days() + 1,
            None => i64::from(date.ordinal()),
        }
    }

    pub fn date_stamp(&self, date: NaiveDate) -> String {
        date.format(DATE_STAMP_FORMAT).to_string()
    }
}
