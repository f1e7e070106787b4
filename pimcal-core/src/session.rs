//! Application session: configuration plus the stamp registry every note
//! created in the session shares.

use std::sync::Arc;

use crate::config::PimConfig;
use crate::date_range::DateRange;
use crate::error::PimResult;
use crate::note::Note;
use crate::recurrence::expand_occurrences;
use crate::recurrence_id::RecurrenceId;
use crate::stamp::StampRegistry;
use crate::value::PropertyMap;

#[derive(Debug, Clone)]
pub struct Session {
    config: PimConfig,
    registry: Arc<StampRegistry>,
}

impl Session {
    /// Load configuration from the default location and register the
    /// standard stamps.
    pub fn load() -> PimResult<Self> {
        Ok(Session::new(PimConfig::load()?))
    }

    pub fn new(config: PimConfig) -> Self {
        Session::with_registry(config, StampRegistry::standard())
    }

    pub fn with_registry(config: PimConfig, registry: StampRegistry) -> Self {
        Session {
            config,
            registry: Arc::new(registry),
        }
    }

    pub fn config(&self) -> &PimConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<StampRegistry> {
        &self.registry
    }

    /// A new master note bound to this session's registry.
    pub fn new_note(&self, initial: &PropertyMap) -> Note {
        Note::new(Arc::clone(&self.registry), initial)
    }

    /// Occurrence ids of `note` in `range`, or in the configured window
    /// around now, capped at the configured expansion limit.
    pub fn expand(&self, note: &Note, range: Option<&DateRange>) -> PimResult<Vec<RecurrenceId>> {
        let default_range;
        let range = match range {
            Some(range) => range,
            None => {
                default_range = DateRange::around(chrono::Utc::now(), self.config.default_window_days);
                &default_range
            }
        };

        expand_occurrences(note, range, self.config.expansion_limit)
    }
}
