//! ISO-8601 durations as carried by the event stamp.

use std::fmt;

use chrono::{Months, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// A calendar duration (`P1DT2H`, `PT45M`, `P2W`, ...).
///
/// Components are kept as written instead of being normalized, so `PT60M` and
/// `PT1H` are different values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    pub year: u32,
    pub month: u32,
    pub week: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl Duration {
    /// Parse an ISO-8601 duration string.
    pub fn parse(s: &str) -> Option<Self> {
        match iso8601::duration(s.trim()).ok()? {
            iso8601::Duration::YMDHMS {
                year,
                month,
                day,
                hour,
                minute,
                second,
                ..
            } => Some(Duration {
                year,
                month,
                day,
                hour,
                minute,
                second,
                ..Default::default()
            }),
            iso8601::Duration::Weeks(week) => Some(Duration {
                week,
                ..Default::default()
            }),
        }
    }

    /// The time elapsed between two date-times, expressed in days, hours,
    /// minutes and seconds. An `end` before `start` yields a zero duration.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let total = (end - start).num_seconds().max(0);
        let total = u32::try_from(total).unwrap_or(u32::MAX);

        Duration {
            day: total / 86_400,
            hour: (total % 86_400) / 3_600,
            minute: (total % 3_600) / 60,
            second: total % 60,
            ..Default::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Duration::default()
    }

    /// Add this duration to `start`, honouring month lengths for the year and
    /// month components. Returns `None` on overflow.
    pub fn add_to(&self, start: NaiveDateTime) -> Option<NaiveDateTime> {
        let months = self.year.checked_mul(12)?.checked_add(self.month)?;
        let shifted = start.checked_add_months(Months::new(months))?;

        let seconds = i64::from(self.week) * 7 * 86_400
            + i64::from(self.day) * 86_400
            + i64::from(self.hour) * 3_600
            + i64::from(self.minute) * 60
            + i64::from(self.second);

        shifted.checked_add_signed(TimeDelta::try_seconds(seconds)?)
    }

    pub fn to_iso8601(&self) -> String {
        if self.is_zero() {
            return "PT0S".to_string();
        }

        let mut out = String::from("P");
        for (value, unit) in [
            (self.year, 'Y'),
            (self.month, 'M'),
            (self.week, 'W'),
            (self.day, 'D'),
        ] {
            if value > 0 {
                out.push_str(&format!("{value}{unit}"));
            }
        }

        if self.hour > 0 || self.minute > 0 || self.second > 0 {
            out.push('T');
            for (value, unit) in [(self.hour, 'H'), (self.minute, 'M'), (self.second, 'S')] {
                if value > 0 {
                    out.push_str(&format!("{value}{unit}"));
                }
            }
        }

        out
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}
