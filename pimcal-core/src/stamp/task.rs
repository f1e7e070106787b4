use crate::property::PropertyDef;

use super::registry::StampDescriptor;

pub const TASK_STAMP: &str = "task";

/// Tasks carry no properties of their own; the stamp marks the note as a task.
const TASK_SCHEMA: &[PropertyDef] = &[];

pub fn task_descriptor() -> StampDescriptor {
    StampDescriptor::new(TASK_STAMP, TASK_SCHEMA)
}
