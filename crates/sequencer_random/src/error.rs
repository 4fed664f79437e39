//! Random number error types.

/// Errors that can occur when spawning generators or drawing values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RandomError {
    /// The service has no base seed.
    #[error("random number service '{service}' has no seed configured")]
    NotConfigured {
        /// The service name.
        service: String,
    },

    /// The distribution parameters are out of range.
    #[error("invalid parameters for {distribution} distribution: {reason}")]
    InvalidParameters {
        /// The distribution kind (e.g. `"gauss"`).
        distribution: &'static str,
        /// What is wrong with the parameters.
        reason: String,
    },
}
