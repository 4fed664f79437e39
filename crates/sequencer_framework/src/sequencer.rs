//! The event sequencer.
//!
//! A [`Sequencer`] drives every event in `[skip, skip + count)` through the
//! pipeline: decorators, then readers, algorithms, and writers, each group
//! in registration order on one worker thread. Events are distributed over
//! a rayon pool; with a single worker they run in ascending order on the
//! calling thread. After the last event, each writer's `end_run` is called
//! once and services are finalized in reverse order.
//!
//! A failing component stops the rest of its event only. Other events keep
//! running and the run ends as [`RunStatus::Failed`].

use std::any::Any;
use std::ops::Range;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::SequencerConfig;
use crate::context::EventContext;
use crate::error::SequencerError;
use crate::pipeline::Pipeline;
use crate::process_code::{ProcessCode, ProcessResult};
use crate::report::{
    EventFailure, FailureKind, RunReport, RunState, RunStatus, Stage, sort_failures,
};

/// Runs a [`Pipeline`] over a range of events.
#[derive(Debug)]
pub struct Sequencer {
    config: SequencerConfig,
    pipeline: Pipeline,
    /// Smallest event count reported by any reader.
    available_events: Option<u64>,
    /// Events to process, after skipping.
    events: Range<u64>,
    workers: usize,
    state: RunState,
}

impl Sequencer {
    /// Validate the configuration, initialize services, and resolve the
    /// event range.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::NotConfigured`] if the pipeline has no reader,
    ///   algorithm, or writer, or if no event count is given and no reader
    ///   reports one.
    /// - [`SequencerError::ServiceInitialize`] if a service fails to
    ///   initialize, e.g. an unseeded random service.
    /// - [`SequencerError::InvalidConfig`] if the readers provide fewer
    ///   events than requested, or the range overflows the event number.
    pub fn configure(config: SequencerConfig, pipeline: Pipeline) -> Result<Self, SequencerError> {
        if pipeline.has_no_components() {
            return Err(SequencerError::NotConfigured(
                "pipeline has no readers, algorithms, or writers".to_string(),
            ));
        }

        for service in &pipeline.services {
            service
                .initialize()
                .map_err(|source| SequencerError::ServiceInitialize {
                    service: service.name().to_string(),
                    source,
                })?;
            debug!(service = service.name(), "service initialized");
        }

        let available_events = pipeline
            .readers
            .iter()
            .filter_map(|reader| reader.available_events())
            .min();
        let events = resolve_range(config.events, config.skip, available_events)?;
        let workers = config.resolved_workers();

        info!(
            first_event = events.start,
            events = events.end - events.start,
            workers,
            components = ?pipeline.component_names(),
            "sequencer configured"
        );

        Ok(Self {
            config,
            pipeline,
            available_events,
            events,
            workers,
            state: RunState::Configured,
        })
    }

    /// Start the run at event `events` instead of the configured skip.
    ///
    /// The events before it are skipped when [`Sequencer::run`] starts:
    /// readers that can skip are asked to, the others read and discard them.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::NotRunnable`] if the run already started,
    /// or [`SequencerError::InvalidConfig`] if the readers cannot provide
    /// the shifted range.
    pub fn skip(&mut self, events: u64) -> Result<(), SequencerError> {
        if self.state != RunState::Configured {
            return Err(SequencerError::NotRunnable {
                state: self.state.as_str(),
            });
        }
        self.events = resolve_range(self.config.events, events, self.available_events)?;
        self.config.skip = events;
        Ok(())
    }

    /// Returns the current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns the first event that will be processed.
    #[must_use]
    pub fn first_event(&self) -> u64 {
        self.events.start
    }

    /// Returns the number of events that will be processed.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.events.end - self.events.start
    }

    /// Returns the number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process all events.
    ///
    /// Component failures do not produce an `Err`; they are collected in
    /// the returned [`RunReport`].
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::NotRunnable`] if the sequencer already ran,
    /// or [`SequencerError::ThreadPool`] if the worker pool cannot start.
    pub fn run(&mut self) -> Result<RunReport, SequencerError> {
        if self.state != RunState::Configured {
            return Err(SequencerError::NotRunnable {
                state: self.state.as_str(),
            });
        }
        self.state = RunState::Running;

        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("run", run_id = %run_id);
        let _guard = span.enter();

        match self.execute(run_id) {
            Ok(report) => {
                self.state = match report.status {
                    RunStatus::Completed => RunState::Completed,
                    RunStatus::Failed => RunState::Failed,
                };
                Ok(report)
            }
            Err(err) => {
                self.state = RunState::Failed;
                Err(err)
            }
        }
    }

    fn execute(&self, run_id: String) -> Result<RunReport, SequencerError> {
        let started = Instant::now();
        let first_event = self.events.start;
        let end_event = self.events.end;
        let recorder = Recorder::default();

        info!(
            first_event,
            events = self.event_count(),
            workers = self.workers,
            "run started"
        );

        self.skip_events(first_event, end_event, &recorder);

        if self.workers == 1 {
            for event in first_event..end_event {
                self.process_event(event, end_event, &recorder);
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .thread_name(|i| format!("sequencer-worker-{i}"))
                .build()?;
            pool.install(|| {
                (first_event..end_event)
                    .into_par_iter()
                    .for_each(|event| self.process_event(event, end_event, &recorder));
            });
        }

        // All events are done; flush writers in order.
        for writer in &self.pipeline.writers {
            if let Err(failure) = invoke(None, writer.name(), Stage::EndRun, || writer.end_run()) {
                recorder.record(failure);
            }
        }

        for service in self.pipeline.services.iter().rev() {
            let finalized = invoke(None, service.name(), Stage::Finalize, || {
                service.finalize().map(|()| ProcessCode::Success)
            });
            if let Err(failure) = finalized {
                recorder.record(failure);
            }
        }

        let processed_events = recorder.processed.load(Ordering::Relaxed);
        let mut failures = recorder.into_failures();
        sort_failures(&mut failures);
        let status = if failures.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };

        info!(
            ?status,
            processed_events,
            failed = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );

        Ok(RunReport {
            run_id,
            status,
            first_event,
            processed_events,
            total_events: self.event_count(),
            failures,
        })
    }

    /// Bring readers to `first_event`.
    fn skip_events(&self, first_event: u64, end_event: u64, recorder: &Recorder) {
        if first_event == 0 {
            return;
        }
        debug!(events = first_event, "skipping events");

        let mut discard_readers = Vec::new();
        for (index, reader) in self.pipeline.readers.iter().enumerate() {
            if reader.can_skip() {
                if let Err(failure) =
                    invoke(None, reader.name(), Stage::Skip, || reader.skip(first_event))
                {
                    recorder.record(failure);
                }
            } else {
                discard_readers.push((index, reader));
            }
        }
        if discard_readers.is_empty() {
            return;
        }

        // Read and drop the skipped events so stateful readers advance.
        for event in 0..first_event {
            let mut context = EventContext::new(event, end_event);
            let decorated = self.pipeline.decorators.iter().try_for_each(|decorator| {
                invoke(Some(event), decorator.name(), Stage::Skip, || {
                    decorator.decorate(&mut context)
                })
            });
            let read = decorated.and_then(|()| {
                discard_readers.iter().try_for_each(|(index, reader)| {
                    invoke(Some(event), reader.name(), Stage::Skip, || {
                        reader.read(&context.for_component(*index))
                    })
                })
            });
            if let Err(failure) = read {
                recorder.record(failure);
            }
        }
    }

    fn process_event(&self, event: u64, events_per_run: u64, recorder: &Recorder) {
        debug!(event, "event started");
        match self.run_pipeline(event, events_per_run) {
            Ok(()) => {
                recorder.processed.fetch_add(1, Ordering::Relaxed);
                debug!(event, "event finished");
            }
            Err(failure) => recorder.record(failure),
        }
    }

    fn run_pipeline(&self, event: u64, events_per_run: u64) -> Result<(), EventFailure> {
        let pipeline = &self.pipeline;
        let mut context = EventContext::new(event, events_per_run);

        for decorator in &pipeline.decorators {
            invoke(Some(event), decorator.name(), Stage::Decorate, || {
                decorator.decorate(&mut context)
            })?;
        }

        for (position, reader) in pipeline.readers.iter().enumerate() {
            let view = context.for_component(position);
            invoke(Some(event), reader.name(), Stage::Read, || reader.read(&view))?;
        }

        for (position, algorithm) in pipeline.algorithms.iter().enumerate() {
            let view = context.for_component(pipeline.algorithm_index(position));
            invoke(Some(event), algorithm.name(), Stage::Execute, || {
                algorithm.execute(&view)
            })?;
        }

        for (position, writer) in pipeline.writers.iter().enumerate() {
            let view = context.for_component(pipeline.writer_index(position));
            invoke(Some(event), writer.name(), Stage::Write, || writer.write(&view))?;
        }

        Ok(())
    }
}

/// Work out the events to process after skipping `skip`.
fn resolve_range(
    requested: Option<u64>,
    skip: u64,
    available: Option<u64>,
) -> Result<Range<u64>, SequencerError> {
    let end = match (requested, available) {
        (Some(count), available) => {
            let end = skip.checked_add(count).ok_or_else(|| {
                SequencerError::InvalidConfig(format!(
                    "skipping {skip} and processing {count} events overflows the event number"
                ))
            })?;
            if let Some(available) = available.filter(|available| end > *available) {
                return Err(SequencerError::InvalidConfig(format!(
                    "requested events {skip}..{end} but readers provide only {available}"
                )));
            }
            end
        }
        (None, Some(available)) if skip > available => {
            return Err(SequencerError::InvalidConfig(format!(
                "cannot skip {skip} events, readers provide only {available}"
            )));
        }
        (None, Some(available)) => available,
        (None, None) => {
            return Err(SequencerError::NotConfigured(
                "no event count given and no reader reports one".to_string(),
            ));
        }
    };
    Ok(skip..end)
}

/// Call one component, turning aborts, errors, and panics into a failure.
fn invoke(
    event: Option<u64>,
    component: &str,
    stage: Stage,
    call: impl FnOnce() -> ProcessResult,
) -> Result<(), EventFailure> {
    let failure = |kind, message: String| EventFailure {
        event,
        component: component.to_string(),
        stage,
        kind,
        message,
    };
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(ProcessCode::Success)) => Ok(()),
        Ok(Ok(ProcessCode::Abort)) => Err(failure(
            FailureKind::ComponentAbort,
            "component requested abort".to_string(),
        )),
        Ok(Err(err)) => Err(failure(FailureKind::of(&err), err.to_string())),
        Err(payload) => Err(failure(FailureKind::Panic, panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "component panicked".to_string()
    }
}

/// Failures and counters shared by the workers of one run.
#[derive(Default)]
struct Recorder {
    failures: Mutex<Vec<EventFailure>>,
    processed: AtomicU64,
}

impl Recorder {
    fn record(&self, failure: EventFailure) {
        match failure.event {
            Some(event) => error!(
                event,
                component = %failure.component,
                stage = %failure.stage,
                kind = ?failure.kind,
                "{}",
                failure.message
            ),
            None => warn!(
                component = %failure.component,
                stage = %failure.stage,
                kind = ?failure.kind,
                "{}",
                failure.message
            ),
        }
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }

    fn into_failures(self) -> Vec<EventFailure> {
        self.failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
