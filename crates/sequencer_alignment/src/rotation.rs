//! Per-event geometry rotation.

use std::sync::Arc;

use glam::DQuat;
use sequencer_framework::{ContextDecorator, EventContext, ProcessCode, ProcessResult};

use crate::decorator::{AlignmentSnapshot, IovId};
use crate::element::DetectorElement;
use crate::error::AlignmentError;

/// Rotates every element about its local y axis by `step * event`.
///
/// Stateless. When an earlier decorator already placed an
/// [`AlignmentSnapshot`] in the decoration, the rotation is applied on top
/// of it; otherwise it starts from the nominal placement. Register it after
/// the [`AlignmentDecorator`](crate::AlignmentDecorator) to compose both.
#[derive(Debug)]
pub struct RotationDecorator {
    step: f64,
    nominal: Arc<AlignmentSnapshot>,
}

impl RotationDecorator {
    /// Create a decorator rotating by `step` radians per event.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::InvalidRotationStep`] for a non-finite step.
    pub fn new(step: f64, elements: &[DetectorElement]) -> Result<Self, AlignmentError> {
        if !step.is_finite() {
            return Err(AlignmentError::InvalidRotationStep(step));
        }
        crate::element::check_unique(elements)?;
        Ok(Self {
            step,
            nominal: Arc::new(AlignmentSnapshot::nominal(IovId(0), elements)),
        })
    }

    /// Returns the rotation per event in radians.
    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }
}

impl ContextDecorator for RotationDecorator {
    fn name(&self) -> &str {
        "RotationDecorator"
    }

    fn decorate(&self, context: &mut EventContext) -> ProcessResult {
        let base = context
            .decoration()
            .get_shared::<AlignmentSnapshot>()
            .unwrap_or_else(|| Arc::clone(&self.nominal));
        let angle = self.step * context.event_number() as f64;
        let rotation = DQuat::from_rotation_y(angle);
        let rotated = base.map(|_, transform| transform.rotated_local(rotation));
        context.decorate(rotated);
        Ok(ProcessCode::Success)
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::element::{ElementId, barrel_layout};
    use crate::transform::Transform3D;

    fn decorated(decorator: &RotationDecorator, context: &mut EventContext) -> Arc<AlignmentSnapshot> {
        decorator.decorate(context).unwrap();
        context.decoration().get_shared::<AlignmentSnapshot>().unwrap()
    }

    #[test]
    fn test_event_zero_is_nominal() {
        let elements = barrel_layout(1, 4, 30.0, 0.0);
        let d = RotationDecorator::new(0.01, &elements).unwrap();
        let snapshot = decorated(&d, &mut EventContext::new(0, 10));
        for element in &elements {
            let t = snapshot.transform(element.id).unwrap();
            assert!(t.abs_diff_eq(&element.nominal, 1e-12));
        }
    }

    #[test]
    fn test_rotation_grows_with_event() {
        let elements = vec![DetectorElement::new(0, Transform3D::from_position(DVec3::X))];
        let d = RotationDecorator::new(0.1, &elements).unwrap();
        let snapshot = decorated(&d, &mut EventContext::new(5, 10));
        let t = snapshot.transform(ElementId(0)).unwrap();
        assert_eq!(t.position, DVec3::X);
        assert!(t.rotation.abs_diff_eq(DQuat::from_rotation_y(0.5), 1e-12));
    }

    #[test]
    fn test_composes_on_existing_snapshot() {
        let elements = vec![DetectorElement::new(0, Transform3D::IDENTITY)];
        let shifted = vec![DetectorElement::new(0, Transform3D::from_position(DVec3::Z))];
        let mut context = EventContext::new(2, 10);
        context.decorate(AlignmentSnapshot::nominal(IovId(7), &shifted));

        let d = RotationDecorator::new(0.25, &elements).unwrap();
        let snapshot = decorated(&d, &mut context);
        assert_eq!(snapshot.iov(), IovId(7));
        let t = snapshot.transform(ElementId(0)).unwrap();
        assert_eq!(t.position, DVec3::Z);
        assert!(t.rotation.abs_diff_eq(DQuat::from_rotation_y(0.5), 1e-12));
    }

    #[test]
    fn test_non_finite_step_rejected() {
        assert_eq!(
            RotationDecorator::new(f64::NAN, &[]).unwrap_err().to_string(),
            "rotation step must be finite, got NaN"
        );
    }
}
