//! # sequencer_random
//!
//! Reproducible random numbers for parallel event processing.
//!
//! Every component that needs randomness spawns its own generator for the
//! event it is working on. The generator seed is a pure function of the
//! global seed, the component index, the event number, and the number of
//! events in the run, so the values drawn never depend on which worker
//! thread picked the event up or in which order events were processed.
//!
//! This crate provides:
//!
//! - [`RandomNumbers`]: the seeded service that spawns [`RandomEngine`]s.
//! - [`derive_seed`]: the seed derivation as a free function.
//! - [`Distribution`]: explicitly parameterised distributions to draw from.
//! - [`RandomError`]: unconfigured service and invalid parameters.

pub mod config;
pub mod distribution;
pub mod error;
pub mod service;

pub use config::RandomNumbersConfig;
pub use distribution::Distribution;
pub use error::RandomError;
pub use service::{RandomEngine, RandomNumbers, derive_seed};
