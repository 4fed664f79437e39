//! Explicitly parameterised distributions.
//!
//! A [`Distribution`] carries all of its parameters, so drawing never reads
//! any hidden state beyond the engine passed in.

use rand_distr::Distribution as Sample;
use rand_distr::{Exp, Gamma, Normal, Poisson, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::RandomError;
use crate::service::RandomEngine;

/// A distribution to draw `f64` values from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Flat in `[low, high)`.
    Uniform {
        /// Lower bound (inclusive).
        low: f64,
        /// Upper bound (exclusive).
        high: f64,
    },
    /// Normal distribution.
    Gauss {
        /// Location.
        mean: f64,
        /// Scale, must be non-negative.
        sigma: f64,
    },
    /// Gamma distribution.
    Gamma {
        /// Shape, must be positive.
        shape: f64,
        /// Scale, must be positive.
        scale: f64,
    },
    /// Poisson distribution; values are whole numbers returned as `f64`.
    Poisson {
        /// Mean, must be positive.
        mean: f64,
    },
    /// Exponential distribution.
    Exponential {
        /// Rate, must be positive.
        rate: f64,
    },
}

impl Distribution {
    /// Returns the lower-case name of this distribution kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "uniform",
            Self::Gauss { .. } => "gauss",
            Self::Gamma { .. } => "gamma",
            Self::Poisson { .. } => "poisson",
            Self::Exponential { .. } => "exponential",
        }
    }

    /// Check the parameters without drawing.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError::InvalidParameters`] if a parameter is out of range.
    pub fn validate(&self) -> Result<(), RandomError> {
        let problem = match *self {
            Self::Uniform { low, high } if !(low.is_finite() && high.is_finite()) => {
                Some(format!("bounds must be finite, got [{low}, {high})"))
            }
            Self::Uniform { low, high } if low >= high => {
                Some(format!("low must be below high, got [{low}, {high})"))
            }
            Self::Gauss { mean, sigma } if !mean.is_finite() || !(sigma >= 0.0) || !sigma.is_finite() => {
                Some(format!("need finite mean and sigma >= 0, got mean {mean}, sigma {sigma}"))
            }
            Self::Gamma { shape, scale } if !(shape > 0.0 && scale > 0.0) => {
                Some(format!("shape and scale must be positive, got {shape}, {scale}"))
            }
            Self::Poisson { mean } if !(mean > 0.0) || !mean.is_finite() => {
                Some(format!("mean must be positive, got {mean}"))
            }
            Self::Exponential { rate } if !(rate > 0.0) => {
                Some(format!("rate must be positive, got {rate}"))
            }
            _ => None,
        };
        match problem {
            Some(reason) => Err(self.invalid(reason)),
            None => Ok(()),
        }
    }

    /// Draw one value.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError::InvalidParameters`] if a parameter is out of range.
    pub fn draw(&self, engine: &mut RandomEngine) -> Result<f64, RandomError> {
        self.validate()?;
        let value = match *self {
            Self::Uniform { low, high } => Uniform::new(low, high).sample(engine),
            Self::Gauss { mean, sigma } => Normal::new(mean, sigma)
                .map_err(|e| self.invalid(e.to_string()))?
                .sample(engine),
            Self::Gamma { shape, scale } => Gamma::new(shape, scale)
                .map_err(|e| self.invalid(e.to_string()))?
                .sample(engine),
            Self::Poisson { mean } => {
                let poisson = Poisson::new(mean).map_err(|e| self.invalid(e.to_string()))?;
                Sample::<f64>::sample(&poisson, engine)
            }
            Self::Exponential { rate } => Exp::new(rate)
                .map_err(|e| self.invalid(e.to_string()))?
                .sample(engine),
        };
        Ok(value)
    }

    /// Draw `count` values in sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError::InvalidParameters`] if a parameter is out of range.
    pub fn draw_n(&self, engine: &mut RandomEngine, count: usize) -> Result<Vec<f64>, RandomError> {
        self.validate()?;
        (0..count).map(|_| self.draw(engine)).collect()
    }

    fn invalid(&self, reason: String) -> RandomError {
        RandomError::InvalidParameters {
            distribution: self.kind(),
            reason,
        }
    }
}
