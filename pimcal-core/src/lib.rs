//! Core types for pimcal: recurring notes and their occurrences.
//!
//! A recurring item is stored once, as a master [`Note`], together with a
//! sparse set of [`Modification`]s for the occurrences that were edited.
//! Occurrences are views ([`OccurrenceView`]) whose every read and write goes
//! through the [`resolver`]:
//! - reads return the occurrence's override, or the master value
//! - writes allocate a modification only when a value first diverges
//! - `uid` and `version` always come from the master
//!
//! Wire serialization, transport and persistence live outside this crate.
//! Serializers work with plain [`Modification`] data and the master
//! operations of [`NoteWrite`].

pub mod config;
pub mod date_range;
pub mod delta;
pub mod duration;
pub mod error;
pub mod item;
pub mod logging;
pub mod modification;
pub mod note;
pub mod occurrence;
pub mod property;
pub mod recurrence;
pub mod recurrence_id;
pub mod resolver;
pub mod session;
pub mod stamp;
pub mod triage;
pub mod value;

pub use crate::config::PimConfig;
pub use date_range::DateRange;
pub use delta::{ChangeScope, Delta};
pub use duration::Duration;
pub use error::{PimError, PimResult};
pub use item::{NoteRead, NoteWrite, TriageStatus};
pub use modification::Modification;
pub use note::Note;
pub use occurrence::{OccurrenceStampView, OccurrenceView};
pub use recurrence::{Frequency, RecurrenceRule};
pub use recurrence_id::RecurrenceId;
pub use session::Session;
pub use stamp::{Stamp, StampRead, StampRegistry, StampWrite};
pub use value::{PropertyMap, PropertyValue};
