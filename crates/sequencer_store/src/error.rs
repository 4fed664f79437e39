//! Event store error types.

/// Errors returned by [`EventStore`](crate::EventStore) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A collection with this name was already written in this event.
    #[error("collection '{name}' already exists in event {event}")]
    DuplicateKey {
        /// The collection name.
        name: String,
        /// The event the store belongs to.
        event: u64,
    },

    /// No collection with this name was written in this event.
    #[error("collection '{name}' not found in event {event}")]
    NotFound {
        /// The collection name.
        name: String,
        /// The event the store belongs to.
        event: u64,
    },

    /// The collection exists but holds a different type than requested.
    #[error("collection '{name}' holds {found}, requested {expected}")]
    TypeMismatch {
        /// The collection name.
        name: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type that was written.
        found: &'static str,
    },
}
