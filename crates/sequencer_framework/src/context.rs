//! Per-event and per-component execution contexts.
//!
//! The sequencer creates one [`EventContext`] per event. It owns that
//! event's [`EventStore`] and [`Decoration`]. Decorators receive the
//! event context mutably; readers, algorithms, and writers receive a
//! [`RunContext`], a read-only view tagged with their component index.

use sequencer_random::{RandomEngine, RandomError, RandomNumbers};
use sequencer_store::EventStore;

use crate::decoration::Decoration;

/// Everything belonging to one event while it is being processed.
#[derive(Debug)]
pub struct EventContext {
    /// The event being processed.
    event_number: u64,
    /// Exclusive upper bound of event numbers in this run.
    events_per_run: u64,
    /// Collections exchanged between components.
    store: EventStore,
    /// Payloads set by decorators.
    decoration: Decoration,
}

impl EventContext {
    /// Create a fresh context with an empty store and no decoration.
    #[must_use]
    pub fn new(event_number: u64, events_per_run: u64) -> Self {
        Self {
            event_number,
            events_per_run,
            store: EventStore::new(event_number),
            decoration: Decoration::new(),
        }
    }

    /// Returns the event number.
    #[must_use]
    pub fn event_number(&self) -> u64 {
        self.event_number
    }

    /// Returns the exclusive upper bound of event numbers in this run.
    #[must_use]
    pub fn events_per_run(&self) -> u64 {
        self.events_per_run
    }

    /// Returns the event store.
    #[must_use]
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Returns the current decoration.
    #[must_use]
    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    /// Set the decoration payload of type `T`, replacing any previous value.
    pub fn decorate<T: Send + Sync + 'static>(&mut self, value: T) {
        self.decoration.insert(value);
    }

    /// Set an already shared decoration payload of type `T`.
    pub fn decorate_shared<T: Send + Sync + 'static>(&mut self, value: std::sync::Arc<T>) {
        self.decoration.insert_shared(value);
    }

    /// Build the view handed to the component at `component_index`.
    #[must_use]
    pub fn for_component(&self, component_index: usize) -> RunContext<'_> {
        RunContext {
            component_index,
            event_number: self.event_number,
            events_per_run: self.events_per_run,
            store: &self.store,
            decoration: &self.decoration,
        }
    }
}

/// The view of one event given to one reader, algorithm, or writer.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    /// Position of the component in the pipeline.
    pub component_index: usize,
    /// The event being processed.
    pub event_number: u64,
    /// Exclusive upper bound of event numbers in this run.
    pub events_per_run: u64,
    /// Collections exchanged between components.
    pub store: &'a EventStore,
    /// Payloads set by decorators.
    pub decoration: &'a Decoration,
}

impl RunContext<'_> {
    /// Spawn this component's generator for this event.
    ///
    /// Call once per invocation and reuse the engine for every draw.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError::NotConfigured`] if the service has no seed.
    pub fn spawn_generator(&self, service: &RandomNumbers) -> Result<RandomEngine, RandomError> {
        service.spawn(
            self.component_index as u64,
            self.event_number,
            self.events_per_run,
        )
    }
}
