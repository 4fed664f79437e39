//! # sequencer_store
//!
//! The per-event data exchange of the event sequencer.
//!
//! Components never talk to each other directly. A reader writes named
//! collections into the [`EventStore`] of the event it is processing, later
//! algorithms read them back and add their own results, and writers consume
//! whatever they need. Each store lives for exactly one event.
//!
//! This crate provides:
//!
//! - [`EventStore`]: write-once, type-erased collection map.
//! - [`StoreError`]: duplicate writes, missing reads, and type mismatches.

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::EventStore;
