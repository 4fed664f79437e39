//! Per-event decoration written by context decorators.
//!
//! A [`Decoration`] is a type map: each decorator stores its payload under
//! the payload's own type, and downstream components look it up by type.
//! Decorators replace values wholesale; nothing hands out a mutable
//! reference into a payload that another component could be holding.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Typed payloads attached to one event by its decorators.
#[derive(Clone, Default)]
pub struct Decoration {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Decoration {
    /// Create an empty decoration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Store `value` as the payload of type `T`, replacing any previous one.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.insert_shared(Arc::new(value));
    }

    /// Store an already shared payload, replacing any previous one of type `T`.
    pub fn insert_shared<T: Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), value);
    }

    /// Returns the payload of type `T`, if a decorator set one.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns a shared handle to the payload of type `T`.
    #[must_use]
    pub fn get_shared<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
    }

    /// Returns `true` if a payload of type `T` is present.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no decorator has written anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Decoration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoration")
            .field("payloads", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct IovTag {
        iov: u64,
    }

    #[derive(Debug, PartialEq)]
    struct FieldScale(f64);

    #[test]
    fn test_insert_and_get() {
        let mut decoration = Decoration::new();
        decoration.insert(IovTag { iov: 3 });
        assert_eq!(decoration.get::<IovTag>(), Some(&IovTag { iov: 3 }));
        assert!(decoration.get::<FieldScale>().is_none());
    }

    #[test]
    fn test_insert_replaces_by_type() {
        let mut decoration = Decoration::new();
        decoration.insert(IovTag { iov: 1 });
        decoration.insert(FieldScale(2.0));
        decoration.insert(IovTag { iov: 2 });
        assert_eq!(decoration.len(), 2);
        assert_eq!(decoration.get::<IovTag>().map(|t| t.iov), Some(2));
    }

    #[test]
    fn test_shared_handle_outlives_replacement() {
        let mut decoration = Decoration::new();
        decoration.insert(IovTag { iov: 1 });
        let held = decoration.get_shared::<IovTag>().unwrap();
        decoration.insert(IovTag { iov: 2 });
        assert_eq!(held.iov, 1);
        assert_eq!(decoration.get::<IovTag>().map(|t| t.iov), Some(2));
    }

    #[test]
    fn test_empty() {
        let decoration = Decoration::default();
        assert!(decoration.is_empty());
        assert!(!decoration.contains::<IovTag>());
    }
}
