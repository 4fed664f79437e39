//! Decorator configuration errors.

/// A decorator parameter is unusable. Raised at construction, never while
/// decorating.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignmentError {
    /// The interval of validity must span at least one event.
    #[error("iov size must be at least 1")]
    ZeroIovSize,

    /// The flush window must span at least one event.
    #[error("flush size must be at least 1")]
    ZeroFlushSize,

    /// A misalignment width is negative or not finite.
    #[error("sigma '{name}' must be finite and non-negative, got {value}")]
    InvalidSigma {
        /// The configuration field.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A per-event rotation step is not finite.
    #[error("rotation step must be finite, got {0}")]
    InvalidRotationStep(f64),

    /// A field scale factor is negative or not finite.
    #[error("field scalor must be finite and non-negative, got {0}")]
    InvalidScalor(f64),

    /// Two detector elements share an identifier.
    #[error("duplicate detector element id {0}")]
    DuplicateElement(u32),
}
