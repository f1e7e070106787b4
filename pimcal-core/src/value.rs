//! Property values and the structural equality used by write resolution.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::{PimError, PimResult};
use crate::item::TriageStatus;
use crate::recurrence::RecurrenceRule;

/// Sparse property maps, keyed by property name.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Domain equality for property payloads.
///
/// Implemented explicitly by every type a [`PropertyValue`] can carry, so that
/// the resolver never has to guess how two values compare.
pub trait Equatable {
    fn equals(&self, other: &Self) -> bool;
}

macro_rules! equatable_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(impl Equatable for $ty {
            fn equals(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

equatable_by_eq!(
    bool,
    i64,
    f64,
    String,
    NaiveDateTime,
    DateTime<Utc>,
    Duration,
    TriageStatus,
);

impl<T: Equatable> Equatable for Vec<T> {
    fn equals(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.equals(b))
    }
}

/// A value stored on a note, a stamp or a modification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// No value. Comparable with every other kind.
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    /// Floating (zone-less) date-time, e.g. an event start.
    DateTime(NaiveDateTime),
    /// Absolute instant, e.g. creation and modification dates.
    Timestamp(DateTime<Utc>),
    Duration(Duration),
    Triage(TriageStatus),
    Rule(RecurrenceRule),
    DateTimeList(Vec<NaiveDateTime>),
    TextList(Vec<String>),
}

impl PropertyValue {
    /// Name of this value's kind, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Integer(_) | PropertyValue::Decimal(_) => "number",
            PropertyValue::Text(_) => "text",
            PropertyValue::DateTime(_) => "datetime",
            PropertyValue::Timestamp(_) => "timestamp",
            PropertyValue::Duration(_) => "duration",
            PropertyValue::Triage(_) => "triage",
            PropertyValue::Rule(_) => "rule",
            PropertyValue::DateTimeList(_) => "datetime list",
            PropertyValue::TextList(_) => "text list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Structural equality.
    ///
    /// `Null` equals only `Null` but is comparable with any kind. Integers and
    /// decimals compare numerically. Any other pairing of different kinds is a
    /// [`PimError::TypeMismatch`].
    pub fn equals(&self, other: &PropertyValue) -> PimResult<bool> {
        use PropertyValue::*;

        let equal = match (self, other) {
            (Null, other) | (other, Null) => other.is_null(),
            (Bool(a), Bool(b)) => a.equals(b),
            (Integer(a), Integer(b)) => a.equals(b),
            (Decimal(a), Decimal(b)) => a.equals(b),
            (Integer(a), Decimal(b)) | (Decimal(b), Integer(a)) => (*a as f64).equals(b),
            (Text(a), Text(b)) => a.equals(b),
            (DateTime(a), DateTime(b)) => a.equals(b),
            (Timestamp(a), Timestamp(b)) => a.equals(b),
            (Duration(a), Duration(b)) => a.equals(b),
            (Triage(a), Triage(b)) => a.equals(b),
            (Rule(a), Rule(b)) => a.equals(b),
            (DateTimeList(a), DateTimeList(b)) => a.equals(b),
            (TextList(a), TextList(b)) => a.equals(b),
            (expected, found) => {
                return Err(PimError::TypeMismatch {
                    expected: expected.kind(),
                    found: found.kind(),
                });
            }
        };

        Ok(equal)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            PropertyValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            PropertyValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            PropertyValue::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_triage(&self) -> Option<TriageStatus> {
        match self {
            PropertyValue::Triage(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&RecurrenceRule> {
        match self {
            PropertyValue::Rule(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_datetime_list(&self) -> Option<&[NaiveDateTime]> {
        match self {
            PropertyValue::DateTimeList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::TextList(list) => Some(list),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Decimal(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<NaiveDateTime> for PropertyValue {
    fn from(value: NaiveDateTime) -> Self {
        PropertyValue::DateTime(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Timestamp(value)
    }
}

impl From<Duration> for PropertyValue {
    fn from(value: Duration) -> Self {
        PropertyValue::Duration(value)
    }
}

impl From<TriageStatus> for PropertyValue {
    fn from(value: TriageStatus) -> Self {
        PropertyValue::Triage(value)
    }
}

impl From<RecurrenceRule> for PropertyValue {
    fn from(value: RecurrenceRule) -> Self {
        PropertyValue::Rule(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropertyValue::Null, Into::into)
    }
}
