//! Per-event magnetic field scaling.

use sequencer_framework::{ContextDecorator, EventContext, ProcessCode, ProcessResult};

use crate::error::AlignmentError;

/// Factor applied to the nominal field strength for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldScale {
    /// Multiplier of the nominal field.
    pub factor: f64,
}

impl FieldScale {
    /// Scale a field value.
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.factor
    }
}

/// Decorates event `n` with `FieldScale { factor: scalor^n }`.
#[derive(Debug, Clone, Copy)]
pub struct FieldScaleDecorator {
    scalor: f64,
}

impl FieldScaleDecorator {
    /// Create a decorator with the given per-event scalor.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError::InvalidScalor`] for a negative or
    /// non-finite scalor.
    pub fn new(scalor: f64) -> Result<Self, AlignmentError> {
        if !scalor.is_finite() || scalor < 0.0 {
            return Err(AlignmentError::InvalidScalor(scalor));
        }
        Ok(Self { scalor })
    }

    /// Returns the per-event scalor.
    #[must_use]
    pub fn scalor(&self) -> f64 {
        self.scalor
    }

    /// Scale factor of one event.
    #[must_use]
    pub fn factor(&self, event: u64) -> f64 {
        match i32::try_from(event) {
            Ok(n) => self.scalor.powi(n),
            Err(_) => self.scalor.powf(event as f64),
        }
    }
}

impl ContextDecorator for FieldScaleDecorator {
    fn name(&self) -> &str {
        "FieldScaleDecorator"
    }

    fn decorate(&self, context: &mut EventContext) -> ProcessResult {
        let factor = self.factor(context.event_number());
        context.decorate(FieldScale { factor });
        Ok(ProcessCode::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_is_power_of_event() {
        let d = FieldScaleDecorator::new(1.25).unwrap();
        assert_eq!(d.factor(0), 1.0);
        assert_eq!(d.factor(1), 1.25);
        assert!((d.factor(3) - 1.953_125).abs() < 1e-12);
    }

    #[test]
    fn test_decorates_context() {
        let d = FieldScaleDecorator::new(2.0).unwrap();
        let mut context = EventContext::new(4, 10);
        d.decorate(&mut context).unwrap();
        let scale = context.decoration().get::<FieldScale>().unwrap();
        assert_eq!(scale.factor, 16.0);
        assert_eq!(scale.apply(0.5), 8.0);
    }

    #[test]
    fn test_invalid_scalor_rejected() {
        assert_eq!(
            FieldScaleDecorator::new(-1.0).unwrap_err(),
            AlignmentError::InvalidScalor(-1.0)
        );
        assert!(FieldScaleDecorator::new(f64::INFINITY).is_err());
    }
}
