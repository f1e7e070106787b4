//! The event stamp: start, duration and recurrence of a note.

use chrono::NaiveDateTime;

use crate::duration::Duration;
use crate::error::PimResult;
use crate::note::Note;
use crate::property::{PropertyDef, PropertyDefault};
use crate::recurrence::RecurrenceRule;
use crate::recurrence_id::RecurrenceId;
use crate::value::PropertyValue;

use super::registry::StampDescriptor;
use super::{StampRead, StampWrite};

pub const EVENT_STAMP: &str = "event";

pub const START_DATE: &str = "startDate";
pub const DURATION: &str = "duration";
pub const ANY_TIME: &str = "anyTime";
pub const ALL_DAY: &str = "allDay";
pub const RRULE: &str = "rrule";
pub const STATUS: &str = "status";
pub const LOCATION: &str = "location";
pub const EXDATES: &str = "exdates";

const EVENT_SCHEMA: &[PropertyDef] = &[
    PropertyDef::new(START_DATE, PropertyDefault::Null),
    PropertyDef::new(DURATION, PropertyDefault::Null),
    PropertyDef::new(ANY_TIME, PropertyDefault::Bool(false)),
    PropertyDef::new(ALL_DAY, PropertyDefault::Bool(false)),
    PropertyDef::new(RRULE, PropertyDefault::Null),
    PropertyDef::new(STATUS, PropertyDefault::Null),
    PropertyDef::new(LOCATION, PropertyDefault::Null),
    PropertyDef::new(EXDATES, PropertyDefault::Null),
];

/// An occurrence inherits its start from its own recurrence id, not from the
/// master's first start.
fn occurrence_start(_master: &Note, recurrence_id: RecurrenceId) -> PropertyValue {
    PropertyValue::DateTime(recurrence_id.datetime())
}

pub fn event_descriptor() -> StampDescriptor {
    StampDescriptor::new(EVENT_STAMP, EVENT_SCHEMA).with_master_getter(START_DATE, occurrence_start)
}

/// Typed getters for event stamp properties.
pub trait EventFields: StampRead {
    fn start_date(&self) -> Option<NaiveDateTime> {
        self.value(START_DATE).as_datetime()
    }

    fn duration(&self) -> Option<Duration> {
        self.value(DURATION).as_duration()
    }

    /// Start plus duration. A missing duration means a zero-length event.
    fn end_date(&self) -> Option<NaiveDateTime> {
        let start = self.start_date()?;
        match self.duration() {
            Some(duration) => duration.add_to(start),
            None => Some(start),
        }
    }

    fn any_time(&self) -> bool {
        self.value(ANY_TIME).as_bool().unwrap_or(false)
    }

    fn all_day(&self) -> bool {
        self.value(ALL_DAY).as_bool().unwrap_or(false)
    }

    fn rrule(&self) -> Option<RecurrenceRule> {
        self.value(RRULE).as_rule().cloned()
    }

    fn status(&self) -> Option<String> {
        self.value(STATUS).as_text().map(str::to_string)
    }

    fn location(&self) -> Option<String> {
        self.value(LOCATION).as_text().map(str::to_string)
    }

    fn exdates(&self) -> Vec<NaiveDateTime> {
        self.value(EXDATES)
            .as_datetime_list()
            .map(<[NaiveDateTime]>::to_vec)
            .unwrap_or_default()
    }
}

impl<T: StampRead + ?Sized> EventFields for T {}

/// Typed setters for event stamp properties.
pub trait EventFieldsMut: StampWrite {
    fn set_start_date(&mut self, start: NaiveDateTime) -> PimResult<()> {
        self.set_value(START_DATE, start.into())
    }

    fn set_duration(&mut self, duration: Option<Duration>) -> PimResult<()> {
        self.set_value(DURATION, duration.into())
    }

    /// Store the end as a duration from the current start.
    fn set_end_date(&mut self, end: NaiveDateTime) -> PimResult<()> {
        let duration = self.start_date().map(|start| Duration::between(start, end));
        self.set_duration(duration)
    }

    fn set_any_time(&mut self, any_time: bool) -> PimResult<()> {
        self.set_value(ANY_TIME, any_time.into())
    }

    fn set_all_day(&mut self, all_day: bool) -> PimResult<()> {
        self.set_value(ALL_DAY, all_day.into())
    }

    fn set_rrule(&mut self, rule: Option<RecurrenceRule>) -> PimResult<()> {
        self.set_value(RRULE, rule.into())
    }

    fn set_status(&mut self, status: Option<&str>) -> PimResult<()> {
        self.set_value(STATUS, status.into())
    }

    fn set_location(&mut self, location: Option<&str>) -> PimResult<()> {
        self.set_value(LOCATION, location.into())
    }

    fn set_exdates(&mut self, exdates: Vec<NaiveDateTime>) -> PimResult<()> {
        let value = if exdates.is_empty() {
            PropertyValue::Null
        } else {
            PropertyValue::DateTimeList(exdates)
        };
        self.set_value(EXDATES, value)
    }
}

impl<T: StampWrite + ?Sized> EventFieldsMut for T {}
