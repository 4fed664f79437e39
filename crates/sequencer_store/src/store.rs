//! Write-once collection storage for a single event.
//!
//! Collections are held as `Arc<dyn Any + Send + Sync>` together with the
//! Rust type name they were written with, so a read with the wrong type is
//! reported as [`StoreError::TypeMismatch`] instead of silently failing.

use std::any::{Any, type_name};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::error::StoreError;

/// A type-erased collection plus the name of its concrete type.
#[derive(Clone)]
struct StoredCollection {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Named, typed collections produced and consumed during one event.
///
/// A name can be written once. Reading a name that was never written is an
/// error. There is no removal: the whole store is dropped when the event is
/// finished.
///
/// # Examples
///
/// ```rust
/// use sequencer_store::{EventStore, StoreError};
///
/// let store = EventStore::new(7);
/// store.add("hits", vec![1.0_f64, 2.0, 3.0]).unwrap();
///
/// let hits = store.get::<Vec<f64>>("hits").unwrap();
/// assert_eq!(hits.len(), 3);
///
/// assert!(matches!(
///     store.add("hits", Vec::<f64>::new()),
///     Err(StoreError::DuplicateKey { .. })
/// ));
/// ```
pub struct EventStore {
    /// The event this store belongs to, used in diagnostics.
    event: u64,
    /// Collections keyed by name.
    collections: DashMap<String, StoredCollection>,
}

impl EventStore {
    /// Create an empty store for the given event.
    #[must_use]
    pub fn new(event: u64) -> Self {
        Self {
            event,
            collections: DashMap::new(),
        }
    }

    /// Returns the event number this store belongs to.
    #[must_use]
    pub fn event(&self) -> u64 {
        self.event
    }

    /// Write a collection under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if `name` was already written.
    /// The existing collection is left untouched.
    pub fn add<T>(&self, name: impl Into<String>, collection: T) -> Result<(), StoreError>
    where
        T: Send + Sync + 'static,
    {
        self.add_shared(name, Arc::new(collection))
    }

    /// Write an already shared collection under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if `name` was already written.
    pub fn add_shared<T>(&self, name: impl Into<String>, collection: Arc<T>) -> Result<(), StoreError>
    where
        T: Send + Sync + 'static,
    {
        let name = name.into();
        match self.collections.entry(name) {
            Entry::Occupied(entry) => Err(StoreError::DuplicateKey {
                name: entry.key().clone(),
                event: self.event,
            }),
            Entry::Vacant(entry) => {
                trace!(
                    event = self.event,
                    collection = entry.key().as_str(),
                    "writing collection"
                );
                entry.insert(StoredCollection {
                    type_name: type_name::<T>(),
                    value: collection,
                });
                Ok(())
            }
        }
    }

    /// Read the collection written under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `name` was never written, or
    /// [`StoreError::TypeMismatch`] if it was written with a different type.
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, StoreError>
    where
        T: Send + Sync + 'static,
    {
        // Clone out of the map so no shard guard is held by the caller.
        let stored = self
            .collections
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
                event: self.event,
            })?;

        trace!(event = self.event, collection = name, "reading collection");

        let found = stored.type_name;
        stored
            .value
            .downcast::<T>()
            .map_err(|_| StoreError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                found,
            })
    }

    /// Returns `true` if a collection named `name` has been written.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Returns the number of collections in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns `true` if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Returns the collection names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("event", &self.event)
            .field("collections", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Hit {
        layer: u32,
        energy: f64,
    }

    #[test]
    fn test_add_then_get_returns_collection() {
        let store = EventStore::new(3);
        let hits = vec![
            Hit {
                layer: 1,
                energy: 0.5,
            },
            Hit {
                layer: 2,
                energy: 1.5,
            },
        ];
        store.add("hits", hits.clone()).unwrap();

        let read = store.get::<Vec<Hit>>("hits").unwrap();
        assert_eq!(*read, hits);
    }

    #[test]
    fn test_second_add_is_duplicate_key() {
        let store = EventStore::new(3);
        store.add("x", 1_u64).unwrap();
        let err = store.add("x", 2_u64).unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateKey {
                name: "x".to_string(),
                event: 3,
            }
        );
        // The first value survives the rejected write.
        assert_eq!(*store.get::<u64>("x").unwrap(), 1);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = EventStore::new(9);
        let err = store.get::<u64>("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref name, event: 9 } if name == "missing"));
    }

    #[test]
    fn test_get_wrong_type_is_type_mismatch() {
        let store = EventStore::new(0);
        store.add("x", 1_u64).unwrap();
        let err = store.get::<String>("x").unwrap_err();
        match err {
            StoreError::TypeMismatch {
                name,
                expected,
                found,
            } => {
                assert_eq!(name, "x");
                assert!(expected.contains("String"));
                assert_eq!(found, "u64");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_reads_share_the_same_value() {
        let store = EventStore::new(0);
        store.add("big", vec![0_u8; 1024]).unwrap();
        let a = store.get::<Vec<u8>>("big").unwrap();
        let b = store.get::<Vec<u8>>("big").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_add_shared_keeps_pointer() {
        let store = EventStore::new(0);
        let shared = Arc::new(String::from("calibration"));
        store.add_shared("calib", Arc::clone(&shared)).unwrap();
        let read = store.get::<String>("calib").unwrap();
        assert!(Arc::ptr_eq(&shared, &read));
    }

    #[test]
    fn test_names_are_sorted() {
        let store = EventStore::new(0);
        store.add("tracks", 0_u8).unwrap();
        store.add("clusters", 0_u8).unwrap();
        store.add("hits", 0_u8).unwrap();
        assert_eq!(store.names(), vec!["clusters", "hits", "tracks"]);
        assert_eq!(store.len(), 3);
        assert!(store.contains("hits"));
        assert!(!store.contains("vertices"));
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = EventStore::new(42);
        assert!(store.is_empty());
        assert_eq!(store.event(), 42);
    }
}
