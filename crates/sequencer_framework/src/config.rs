//! Sequencer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SequencerError;

/// Run-level settings of a [`Sequencer`](crate::Sequencer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Number of events to process. `None` processes every event the
    /// readers can provide.
    pub events: Option<u64>,
    /// Number of leading events to skip.
    pub skip: u64,
    /// Worker threads. Zero or negative picks the hardware parallelism.
    pub workers: i32,
}

impl SequencerConfig {
    /// Create a config for `events` events on automatically chosen workers.
    #[must_use]
    pub fn new(events: u64) -> Self {
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    /// Set the number of events.
    #[must_use]
    pub fn with_events(mut self, events: u64) -> Self {
        self.events = Some(events);
        self
    }

    /// Set the number of leading events to skip.
    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: i32) -> Self {
        self.workers = workers;
        self
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::ConfigRead`] or [`SequencerError::ConfigParse`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SequencerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SequencerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SequencerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The number of worker threads to use.
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        match usize::try_from(self.workers) {
            Ok(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            events: None,
            skip: 0,
            workers: -1,
        }
    }
}
