//! Date window for occurrence expansion.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::error::{PimError, PimResult};

/// Half-width, in days, of the window used when none is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

/// Date range for expanding occurrences.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl Default for DateRange {
    /// ±DEFAULT_WINDOW_DAYS from now
    fn default() -> Self {
        DateRange::around(Utc::now(), DEFAULT_WINDOW_DAYS)
    }
}

impl DateRange {
    /// `days` either side of `now`. A side that falls outside the
    /// representable date range is left unbounded.
    pub fn around(now: DateTime<Utc>, days: i64) -> Self {
        let Some(days) = TimeDelta::try_days(days) else {
            return DateRange { from: None, to: None };
        };
        DateRange {
            from: now.checked_sub_signed(days),
            to: now.checked_add_signed(days),
        }
    }

    /// Parse user-supplied bounds.
    /// - `from`: "start" for unbounded, or YYYY-MM-DD
    /// - `to`: YYYY-MM-DD
    ///
    /// A missing bound falls back to `days` either side of now.
    pub fn from_args(from: Option<&str>, to: Option<&str>, days: i64) -> PimResult<Self> {
        let window = DateRange::around(Utc::now(), days);

        let from_dt = match from {
            Some("start") => None,
            Some(s) => Some(parse_date_start(s)?),
            None => window.from,
        };

        let to_dt = match to {
            Some(s) => Some(parse_date_end(s)?),
            None => window.to,
        };

        Ok(DateRange {
            from: from_dt,
            to: to_dt,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| instant >= from) && self.to.is_none_or(|to| instant <= to)
    }
}

fn parse_date(s: &str) -> PimResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        PimError::InvalidDate(format!("'{}', expected YYYY-MM-DD", s))
    })
}

/// Parse YYYY-MM-DD as start of day in UTC
fn parse_date_start(s: &str) -> PimResult<DateTime<Utc>> {
    Ok(parse_date(s)?.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Parse YYYY-MM-DD as end of day in UTC
fn parse_date_end(s: &str) -> PimResult<DateTime<Utc>> {
    let end = parse_date(s)?
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| PimError::InvalidDate(format!("'{}' has no end of day", s)))?;
    Ok(end.and_utc())
}
