//! Framework error types.

use std::path::PathBuf;

use sequencer_random::RandomError;
use sequencer_store::StoreError;

/// Errors raised by components while processing an event.
///
/// Store and random errors convert with `?`, so a component body reads
/// like ordinary fallible Rust.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// An event store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Spawning a generator or drawing a value failed.
    #[error(transparent)]
    Random(#[from] RandomError),

    /// Any other component-specific failure.
    #[error("{0}")]
    Failed(String),
}

impl ProcessError {
    /// Build a [`ProcessError::Failed`] from a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors that prevent a run from being configured or started.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// A required setting is missing.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// A setting is present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A service refused to initialize.
    #[error("service '{service}' failed to initialize: {source}")]
    ServiceInitialize {
        /// The service name.
        service: String,
        /// Why it failed.
        #[source]
        source: ProcessError,
    },

    /// `run` or `skip` was called outside the `Configured` state.
    #[error("sequencer is {state}, expected configured")]
    NotRunnable {
        /// The state the sequencer was in.
        state: &'static str,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// The file path.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        /// The file path.
        path: PathBuf,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl SequencerError {
    /// Returns `true` for errors caused by missing setup.
    #[must_use]
    pub fn is_not_configured(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured(_)
                | Self::ServiceInitialize {
                    source: ProcessError::Random(RandomError::NotConfigured { .. }),
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use sequencer_store::EventStore;

    use super::*;

    fn store_lookup() -> Result<(), ProcessError> {
        let store = EventStore::new(1);
        store.get::<u64>("x")?;
        Ok(())
    }

    #[test]
    fn test_store_error_converts_with_question_mark() {
        let err = store_lookup().unwrap_err();
        assert!(matches!(err, ProcessError::Store(StoreError::NotFound { .. })));
        assert_eq!(err.to_string(), "collection 'x' not found in event 1");
    }

    #[test]
    fn test_service_not_configured_detected() {
        let err = SequencerError::ServiceInitialize {
            service: "rng".to_string(),
            source: ProcessError::Random(RandomError::NotConfigured {
                service: "rng".to_string(),
            }),
        };
        assert!(err.is_not_configured());
        assert!(!SequencerError::InvalidConfig("x".into()).is_not_configured());
    }
}
