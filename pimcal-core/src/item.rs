//! Item and note properties, shared by master notes and occurrence views.
//!
//! Code that only needs to read or edit an item should be written against
//! [`NoteRead`] / [`NoteWrite`], so it works the same on a master [`Note`] and
//! on an [`OccurrenceView`] of one of its occurrences.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PimResult;
use crate::modification::Modification;
use crate::note::Note;
use crate::occurrence::OccurrenceView;
use crate::property::{PropertyDef, PropertyDefault};
use crate::recurrence_id::RecurrenceId;
use crate::value::PropertyValue;

pub const UID: &str = "uid";
pub const DISPLAY_NAME: &str = "displayName";
pub const VERSION: &str = "version";
pub const CREATION_DATE: &str = "creationDate";
pub const MODIFIED_DATE: &str = "modifiedDate";
pub const TRIAGE_STATUS: &str = "triageStatus";
pub const AUTO_TRIAGE: &str = "autoTriage";
pub const RANK: &str = "rank";
pub const BODY: &str = "body";

/// Properties an occurrence always reads from its master and may never override.
pub const NON_OVERRIDABLE: &[&str] = &[UID, VERSION];

pub(crate) fn generate_uid() -> PropertyValue {
    PropertyValue::Text(uuid::Uuid::new_v4().to_string())
}

fn now_timestamp() -> PropertyValue {
    PropertyValue::Timestamp(Utc::now())
}

fn triage_now() -> PropertyValue {
    PropertyValue::Triage(TriageStatus::Now)
}

pub(crate) const ITEM_SCHEMA: &[PropertyDef] = &[
    PropertyDef::new(UID, PropertyDefault::Generate(generate_uid)),
    PropertyDef::new(DISPLAY_NAME, PropertyDefault::Null),
    PropertyDef::new(VERSION, PropertyDefault::Null),
    PropertyDef::new(CREATION_DATE, PropertyDefault::Generate(now_timestamp)),
    PropertyDef::new(MODIFIED_DATE, PropertyDefault::Generate(now_timestamp)),
    PropertyDef::new(TRIAGE_STATUS, PropertyDefault::Generate(triage_now)),
    PropertyDef::new(AUTO_TRIAGE, PropertyDefault::Bool(true)),
    PropertyDef::new(RANK, PropertyDefault::Decimal(0.0)),
];

pub(crate) const NOTE_SCHEMA: &[PropertyDef] = &[PropertyDef::new(BODY, PropertyDefault::Null)];

/// Triage status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageStatus {
    Now,
    Later,
    Done,
}

impl TriageStatus {
    /// Numeric code used on the wire.
    pub fn code(&self) -> u16 {
        match self {
            TriageStatus::Now => 100,
            TriageStatus::Later => 200,
            TriageStatus::Done => 300,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            100 => Some(TriageStatus::Now),
            200 => Some(TriageStatus::Later),
            300 => Some(TriageStatus::Done),
            _ => None,
        }
    }
}

impl fmt::Display for TriageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageStatus::Now => write!(f, "now"),
            TriageStatus::Later => write!(f, "later"),
            TriageStatus::Done => write!(f, "done"),
        }
    }
}

/// Read access to a note, whether it is a master or an occurrence.
pub trait NoteRead {
    /// The master note (a master returns itself).
    fn master(&self) -> &Note;

    /// `None` for a master, the occurrence identity for an occurrence.
    fn recurrence_id(&self) -> Option<RecurrenceId>;

    /// Effective value of a note property. Absent properties read as `Null`.
    fn property(&self, name: &str) -> PropertyValue;

    fn has_stamp(&self, stamp: &str) -> bool;

    /// Effective value of a stamp property, or `None` when the stamp is not
    /// present on this note.
    fn stamp_value(&self, stamp: &str, property: &str) -> Option<PropertyValue>;

    /// Master only.
    fn modification(&self, recurrence_id: &RecurrenceId) -> PimResult<Option<&Modification>>;

    /// Master only.
    fn occurrence(&self, recurrence_id: RecurrenceId) -> PimResult<OccurrenceView<&Note>>;

    /// Deep copy of a master. Occurrences have no identity of their own and
    /// cannot be cloned.
    fn try_clone(&self) -> PimResult<Note>;

    fn is_occurrence(&self) -> bool {
        self.recurrence_id().is_some()
    }

    fn is_master(&self) -> bool {
        !self.is_occurrence()
    }

    fn uid(&self) -> String {
        self.property(UID).as_text().unwrap_or_default().to_string()
    }

    fn display_name(&self) -> Option<String> {
        self.property(DISPLAY_NAME).as_text().map(str::to_string)
    }

    fn version(&self) -> Option<i64> {
        match self.property(VERSION) {
            PropertyValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.property(CREATION_DATE).as_timestamp()
    }

    fn modified_date(&self) -> Option<DateTime<Utc>> {
        self.property(MODIFIED_DATE).as_timestamp()
    }

    fn triage_status(&self) -> Option<TriageStatus> {
        self.property(TRIAGE_STATUS).as_triage()
    }

    fn auto_triage(&self) -> bool {
        self.property(AUTO_TRIAGE).as_bool().unwrap_or(false)
    }

    fn rank(&self) -> f64 {
        self.property(RANK).as_f64().unwrap_or_default()
    }

    fn body(&self) -> Option<String> {
        self.property(BODY).as_text().map(str::to_string)
    }
}

/// Write access to a note, whether it is a master or an occurrence.
///
/// On an occurrence every write goes through occurrence resolution, and the
/// master-only operations fail with [`crate::PimError::InvalidOperation`].
pub trait NoteWrite: NoteRead {
    fn set_property(&mut self, name: &str, value: PropertyValue) -> PimResult<()>;

    /// Set a stamp property, adding the stamp first if it is not present.
    fn set_stamp_value(&mut self, stamp: &str, property: &str, value: PropertyValue)
    -> PimResult<()>;

    /// Master only.
    fn add_modification(&mut self, modification: Modification) -> PimResult<()>;

    /// Master only.
    fn remove_modification(&mut self, recurrence_id: &RecurrenceId)
    -> PimResult<Option<Modification>>;

    /// Master only.
    fn remove_stamp(&mut self, stamp: &str) -> PimResult<()>;

    fn set_display_name(&mut self, name: impl Into<PropertyValue>) -> PimResult<()> {
        self.set_property(DISPLAY_NAME, name.into())
    }

    fn set_version(&mut self, version: Option<i64>) -> PimResult<()> {
        self.set_property(VERSION, version.into())
    }

    fn set_modified_date(&mut self, date: DateTime<Utc>) -> PimResult<()> {
        self.set_property(MODIFIED_DATE, date.into())
    }

    fn set_triage_status(&mut self, status: TriageStatus) -> PimResult<()> {
        self.set_property(TRIAGE_STATUS, status.into())
    }

    fn set_auto_triage(&mut self, enabled: bool) -> PimResult<()> {
        self.set_property(AUTO_TRIAGE, enabled.into())
    }

    fn set_rank(&mut self, rank: f64) -> PimResult<()> {
        self.set_property(RANK, rank.into())
    }

    fn set_body(&mut self, body: impl Into<PropertyValue>) -> PimResult<()> {
        self.set_property(BODY, body.into())
    }
}
