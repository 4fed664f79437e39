//! Decorated runs through the sequencer.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use sequencer_alignment::{
    AlignmentConfig, AlignmentDecorator, AlignmentSnapshot, DVec3, ElementId, FieldScale,
    FieldScaleDecorator, RotationDecorator, barrel_layout,
};
use sequencer_framework::{
    Pipeline, ProcessCode, ProcessError, ProcessResult, RunContext, RunStatus, Sequencer,
    SequencerConfig, Writer,
};

/// What one event saw in its decoration.
#[derive(Debug, Clone, PartialEq)]
struct Seen {
    iov: u64,
    position: DVec3,
    field: f64,
}

#[derive(Default)]
struct DecorationRecorder {
    seen: Mutex<BTreeMap<u64, Seen>>,
}

impl Writer for DecorationRecorder {
    fn name(&self) -> &str {
        "DecorationRecorder"
    }

    fn write(&self, context: &RunContext<'_>) -> ProcessResult {
        let snapshot = context
            .decoration
            .get::<AlignmentSnapshot>()
            .ok_or_else(|| ProcessError::failed("no alignment snapshot"))?;
        let transform = snapshot
            .transform(ElementId(0))
            .ok_or_else(|| ProcessError::failed("element 0 missing"))?;
        let field = context.decoration.get::<FieldScale>().map_or(1.0, |s| s.factor);
        let seen = Seen {
            iov: snapshot.iov().0,
            position: transform.position,
            field,
        };
        self.seen
            .lock()
            .map_err(|_| ProcessError::failed("recorder poisoned"))?
            .insert(context.event_number, seen);
        Ok(ProcessCode::Success)
    }
}

fn alignment() -> Arc<AlignmentDecorator> {
    let config = AlignmentConfig::default().with_iov_size(10).with_flush_size(20);
    Arc::new(AlignmentDecorator::new(config, barrel_layout(2, 6, 30.0, 40.0)).unwrap())
}

fn run(workers: i32) -> (BTreeMap<u64, Seen>, Arc<AlignmentDecorator>) {
    let decorator = alignment();
    let recorder = Arc::new(DecorationRecorder::default());
    let pipeline = Pipeline::new()
        .add_decorator(decorator.clone())
        .add_decorator(Arc::new(FieldScaleDecorator::new(1.01).unwrap()))
        .add_writer(recorder.clone());

    let mut sequencer =
        Sequencer::configure(SequencerConfig::new(40).with_workers(workers), pipeline).unwrap();
    let report = sequencer.run().unwrap();
    assert_eq!(report.status, RunStatus::Completed);

    let seen = recorder.seen.lock().unwrap().clone();
    (seen, decorator)
}

#[test]
fn test_decoration_independent_of_worker_count() {
    let (sequential, _) = run(1);
    let (parallel, _) = run(4);
    assert_eq!(sequential.len(), 40);
    assert_eq!(sequential, parallel);
}

#[test]
fn test_every_event_sees_its_interval() {
    let (seen, _) = run(3);
    for (event, s) in &seen {
        assert_eq!(s.iov, event / 10);
    }
    // One placement per interval.
    assert_eq!(seen[&10].position, seen[&19].position);
    assert_ne!(seen[&19].position, seen[&20].position);
}

#[test]
fn test_generations_bounded_after_run() {
    for workers in [1, 4] {
        let (_, decorator) = run(workers);
        for element in decorator.elements() {
            assert!(decorator.live_generations(element.id) <= 2);
        }
        assert!(decorator.live_iovs().contains(&sequencer_alignment::IovId(3)));
    }
}

#[test]
fn test_rotation_composes_after_alignment() {
    let elements = barrel_layout(1, 4, 30.0, 0.0);
    let decorator = Arc::new(
        AlignmentDecorator::new(AlignmentConfig::default().with_iov_size(10), elements.clone())
            .unwrap(),
    );
    let recorder = Arc::new(DecorationRecorder::default());
    let pipeline = Pipeline::new()
        .add_decorator(decorator.clone())
        .add_decorator(Arc::new(RotationDecorator::new(0.001, &elements).unwrap()))
        .add_writer(recorder.clone());

    let mut sequencer =
        Sequencer::configure(SequencerConfig::new(5).with_workers(2), pipeline).unwrap();
    assert!(sequencer.run().unwrap().is_completed());

    // Local rotations keep the aligned position of each element.
    let aligned = decorator.snapshot(sequencer_alignment::IovId(0)).unwrap();
    let seen = recorder.seen.lock().unwrap();
    for s in seen.values() {
        assert_eq!(s.position, aligned.transform(ElementId(0)).unwrap().position);
        assert_eq!(s.iov, 0);
    }
}
