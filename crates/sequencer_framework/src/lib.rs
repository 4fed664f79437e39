//! Event processing framework.
//!
//! Components implement the narrow traits in [`component`] and are
//! assembled into a [`Pipeline`]. A [`Sequencer`] runs the pipeline once
//! per event, in parallel across events, and reports the outcome as a
//! [`RunReport`]. Each event gets its own [`EventContext`]: a fresh
//! [`EventStore`](sequencer_store::EventStore) for data exchange and a
//! [`Decoration`] filled by context decorators.
//!
//! Results do not depend on the worker count: every random stream is
//! derived from the component index and event number, never from the
//! thread that happens to run the event.

pub mod component;
pub mod config;
pub mod context;
pub mod decoration;
pub mod error;
pub mod pipeline;
pub mod process_code;
pub mod report;
pub mod sequencer;

pub use component::{
    Algorithm, CollectionWriter, ContextDecorator, Reader, Service, Writer, WriterT,
};
pub use config::SequencerConfig;
pub use context::{EventContext, RunContext};
pub use decoration::Decoration;
pub use error::{ProcessError, SequencerError};
pub use pipeline::Pipeline;
pub use process_code::{ProcessCode, ProcessResult};
pub use report::{EventFailure, FailureKind, RunReport, RunState, RunStatus, Stage};
pub use sequencer::Sequencer;

pub use sequencer_random::{RandomEngine, RandomNumbers, RandomNumbersConfig};
pub use sequencer_store::{EventStore, StoreError};
