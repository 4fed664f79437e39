//! Alignment decorator configuration.

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

/// Default alignment seed.
pub const DEFAULT_ALIGNMENT_SEED: u64 = 1_324_354_657;

/// Settings of an [`AlignmentDecorator`](crate::AlignmentDecorator).
///
/// Lengths are in millimetres, angles in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Events per interval of validity.
    pub iov_size: u64,
    /// Events between cache flushes.
    pub flush_size: u64,
    /// Seed of the misalignment streams.
    pub seed: u64,
    /// Width of the shifts along the local x and y axes.
    pub sigma_in_plane: f64,
    /// Width of the shift along the local z axis.
    pub sigma_out_of_plane: f64,
    /// Width of the rotation about the local z axis.
    pub sigma_in_rotation: f64,
    /// Width of the rotations about the local x and y axes.
    pub sigma_out_rotation: f64,
    /// Keep the first interval at nominal placement.
    pub first_iov_nominal: bool,
}

impl AlignmentConfig {
    /// Set the interval of validity.
    #[must_use]
    pub fn with_iov_size(mut self, iov_size: u64) -> Self {
        self.iov_size = iov_size;
        self
    }

    /// Set the flush interval.
    #[must_use]
    pub fn with_flush_size(mut self, flush_size: u64) -> Self {
        self.flush_size = flush_size;
        self
    }

    /// Set the misalignment seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns the first [`AlignmentError`] found.
    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.iov_size == 0 {
            return Err(AlignmentError::ZeroIovSize);
        }
        if self.flush_size == 0 {
            return Err(AlignmentError::ZeroFlushSize);
        }
        let sigmas = [
            ("sigma_in_plane", self.sigma_in_plane),
            ("sigma_out_of_plane", self.sigma_out_of_plane),
            ("sigma_in_rotation", self.sigma_in_rotation),
            ("sigma_out_rotation", self.sigma_out_rotation),
        ];
        for (name, value) in sigmas {
            if !value.is_finite() || value < 0.0 {
                return Err(AlignmentError::InvalidSigma { name, value });
            }
        }
        Ok(())
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            iov_size: 100,
            flush_size: 200,
            seed: DEFAULT_ALIGNMENT_SEED,
            sigma_in_plane: 0.1,
            sigma_out_of_plane: 0.05,
            sigma_in_rotation: 0.02,
            sigma_out_rotation: 0.0,
            first_iov_nominal: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AlignmentConfig::default();
        assert_eq!(config.iov_size, 100);
        assert_eq!(config.flush_size, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let zero_iov = AlignmentConfig::default().with_iov_size(0);
        assert_eq!(zero_iov.validate(), Err(AlignmentError::ZeroIovSize));
        let zero_flush = AlignmentConfig::default().with_flush_size(0);
        assert_eq!(zero_flush.validate(), Err(AlignmentError::ZeroFlushSize));
    }

    #[test]
    fn test_negative_sigma_rejected() {
        let config = AlignmentConfig {
            sigma_out_of_plane: -1.0,
            ..AlignmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AlignmentError::InvalidSigma {
                name: "sigma_out_of_plane",
                ..
            })
        ));
    }
}
