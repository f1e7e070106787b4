//! Recurrence rules and their expansion into occurrences.

mod expand;
mod rule;

pub use expand::expand_occurrences;
pub use rule::{Frequency, RecurrenceRule};
