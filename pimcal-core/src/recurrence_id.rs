//! Occurrence identity.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Canonical key format for modifications.
pub const RECURRENCE_ID_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Compact wire form (`20240304T090000`).
const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%S";

/// The nominal start of one occurrence in a recurrence expansion.
///
/// Recurrence ids are floating date-times truncated to whole seconds, so two
/// ids that format to the same canonical key are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecurrenceId(NaiveDateTime);

impl RecurrenceId {
    pub fn new(datetime: NaiveDateTime) -> Self {
        RecurrenceId(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    /// Parse the canonical form, the compact wire form (with or without a
    /// trailing `Z`), `YYYY-MM-DDTHH:MM[:SS]`, or a bare date (midnight).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let compact = s.strip_suffix('Z').unwrap_or(s);

        let datetime = NaiveDateTime::parse_from_str(s, RECURRENCE_ID_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(compact, COMPACT_FORMAT))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;

        Some(RecurrenceId::new(datetime))
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// The canonical string this occurrence's modification is keyed by.
    pub fn key(&self) -> String {
        self.0.format(RECURRENCE_ID_FORMAT).to_string()
    }

    pub fn to_compact(&self) -> String {
        self.0.format(COMPACT_FORMAT).to_string()
    }
}

impl From<NaiveDateTime> for RecurrenceId {
    fn from(datetime: NaiveDateTime) -> Self {
        RecurrenceId::new(datetime)
    }
}

impl From<RecurrenceId> for String {
    fn from(rid: RecurrenceId) -> Self {
        rid.key()
    }
}

impl TryFrom<String> for RecurrenceId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        RecurrenceId::parse(&s).ok_or_else(|| format!("Invalid recurrence id '{s}'"))
    }
}

impl fmt::Display for RecurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
