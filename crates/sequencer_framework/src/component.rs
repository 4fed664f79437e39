//! Component traits plugged into the sequencer.
//!
//! Each kind of component is a narrow trait. A concrete type implements
//! only the ones it needs, and the sequencer holds `Arc<dyn Trait>` lists.
//! All traits take `&self`: one instance serves every worker thread, so a
//! component touching shared state (an output file, a counter) guards it
//! itself.

use std::marker::PhantomData;

use sequencer_random::RandomNumbers;

use crate::context::{EventContext, RunContext};
use crate::error::{ProcessError, SequencerError};
use crate::process_code::{ProcessCode, ProcessResult};

/// A job-level helper initialized before the first event and finalized
/// after the last.
pub trait Service: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Called once while the sequencer is configured.
    ///
    /// # Errors
    ///
    /// An error here is fatal; the sequencer is never built.
    fn initialize(&self) -> Result<(), ProcessError> {
        Ok(())
    }

    /// Called once after all writers finished their end-of-run work.
    ///
    /// # Errors
    ///
    /// An error here marks the run as failed.
    fn finalize(&self) -> Result<(), ProcessError> {
        Ok(())
    }
}

/// Mutates the event's decoration before any reader runs.
///
/// Decorators run in registration order, so a decorator may build on the
/// payload an earlier one produced.
pub trait ContextDecorator: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Decorate one event.
    ///
    /// # Errors
    ///
    /// An error aborts the event.
    fn decorate(&self, context: &mut EventContext) -> ProcessResult;
}

/// Fills the event store at the start of each event.
pub trait Reader: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Read one event into `context.store`.
    ///
    /// # Errors
    ///
    /// An error aborts the event.
    fn read(&self, context: &RunContext<'_>) -> ProcessResult;

    /// How many events this reader can provide, if it knows.
    fn available_events(&self) -> Option<u64> {
        None
    }

    /// Whether [`Reader::skip`] is cheaper than reading and discarding.
    fn can_skip(&self) -> bool {
        false
    }

    /// Skip the first `events` events without reading them.
    ///
    /// Only called when [`Reader::can_skip`] returns `true`.
    ///
    /// # Errors
    ///
    /// An error fails the run before any event is processed.
    fn skip(&self, events: u64) -> ProcessResult {
        let _ = events;
        Ok(ProcessCode::Success)
    }
}

/// Transforms event data: reads collections and adds new ones.
pub trait Algorithm: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Process one event.
    ///
    /// # Errors
    ///
    /// An error aborts the event.
    fn execute(&self, context: &RunContext<'_>) -> ProcessResult;
}

/// Consumes event data and produces output.
pub trait Writer: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Write one event.
    ///
    /// # Errors
    ///
    /// An error aborts the event.
    fn write(&self, context: &RunContext<'_>) -> ProcessResult;

    /// Flush aggregated output. Called once, after every event finished.
    ///
    /// # Errors
    ///
    /// An error marks the run as failed.
    fn end_run(&self) -> ProcessResult {
        Ok(ProcessCode::Success)
    }
}

/// A writer for exactly one typed collection. Wrap it in [`WriterT`].
pub trait CollectionWriter<T>: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Write the collection of one event.
    ///
    /// # Errors
    ///
    /// An error aborts the event.
    fn write_collection(&self, context: &RunContext<'_>, collection: &T) -> ProcessResult;

    /// Flush aggregated output.
    ///
    /// # Errors
    ///
    /// An error marks the run as failed.
    fn end_run(&self) -> ProcessResult {
        Ok(ProcessCode::Success)
    }
}

/// Adapts a [`CollectionWriter`] into a [`Writer`] by looking up its
/// collection in the event store.
pub struct WriterT<W, T> {
    collection: String,
    inner: W,
    _marker: PhantomData<fn() -> T>,
}

impl<W, T> WriterT<W, T>
where
    W: CollectionWriter<T>,
    T: Send + Sync + 'static,
{
    /// Wrap `inner` so it receives the collection named `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::InvalidConfig`] if the collection or writer
    /// name is empty.
    pub fn new(collection: impl Into<String>, inner: W) -> Result<Self, SequencerError> {
        let collection = collection.into();
        if collection.is_empty() {
            return Err(SequencerError::InvalidConfig(
                "writer input collection name is empty".to_string(),
            ));
        }
        if inner.name().is_empty() {
            return Err(SequencerError::InvalidConfig(
                "writer name is empty".to_string(),
            ));
        }
        Ok(Self {
            collection,
            inner,
            _marker: PhantomData,
        })
    }

    /// Returns the collection this writer consumes.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the wrapped writer.
    #[must_use]
    pub fn inner(&self) -> &W {
        &self.inner
    }
}

impl<W, T> Writer for WriterT<W, T>
where
    W: CollectionWriter<T>,
    T: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn write(&self, context: &RunContext<'_>) -> ProcessResult {
        let collection = context.store.get::<T>(&self.collection)?;
        self.inner.write_collection(context, &collection)
    }

    fn end_run(&self) -> ProcessResult {
        self.inner.end_run()
    }
}

impl Service for RandomNumbers {
    fn name(&self) -> &str {
        RandomNumbers::name(self)
    }

    fn initialize(&self) -> Result<(), ProcessError> {
        self.require_seed()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use sequencer_random::{RandomError, RandomNumbersConfig};
    use sequencer_store::StoreError;

    use super::*;

    struct SumWriter {
        seen: Mutex<Vec<u64>>,
    }

    impl CollectionWriter<Vec<u64>> for SumWriter {
        fn name(&self) -> &str {
            "SumWriter"
        }

        fn write_collection(&self, _context: &RunContext<'_>, collection: &Vec<u64>) -> ProcessResult {
            self.seen
                .lock()
                .map_err(|_| ProcessError::failed("poisoned"))?
                .push(collection.iter().sum());
            Ok(ProcessCode::Success)
        }
    }

    fn sum_writer() -> SumWriter {
        SumWriter {
            seen: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_writer_t_reads_named_collection() {
        let writer = WriterT::new("values", sum_writer()).unwrap();
        let ctx = EventContext::new(0, 1);
        ctx.store().add("values", vec![1_u64, 2, 3]).unwrap();
        let code = writer.write(&ctx.for_component(0)).unwrap();
        assert_eq!(code, ProcessCode::Success);
        assert_eq!(*writer.inner().seen.lock().unwrap(), vec![6]);
        assert_eq!(Writer::name(&writer), "SumWriter");
    }

    #[test]
    fn test_writer_t_missing_collection_is_not_found() {
        let writer = WriterT::new("values", sum_writer()).unwrap();
        let ctx = EventContext::new(5, 10);
        let err = writer.write(&ctx.for_component(0)).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::Store(StoreError::NotFound { event: 5, .. })
        ));
    }

    #[test]
    fn test_writer_t_rejects_empty_collection_name() {
        assert!(matches!(
            WriterT::new("", sum_writer()),
            Err(SequencerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_random_service_initialize() {
        let seeded = RandomNumbers::new(RandomNumbersConfig::with_seed(1));
        assert!(Service::initialize(&seeded).is_ok());

        let unseeded = RandomNumbers::new(RandomNumbersConfig::unseeded());
        let err = Service::initialize(&unseeded).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::Random(RandomError::NotConfigured { .. })
        ));
    }
}
