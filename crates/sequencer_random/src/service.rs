//! The random number service.
//!
//! The service holds nothing but its configuration. Spawning a generator
//! never mutates it, so one instance can be shared by every worker thread.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::config::RandomNumbersConfig;
use crate::error::RandomError;

/// The generator handed to components.
pub type RandomEngine = ChaCha8Rng;

/// Compute the effective seed for one (component, event) pair.
///
/// ```text
/// seed = base + (component_index * events_per_run + event_number)
/// ```
///
/// All arithmetic wraps. Two pairs never share a seed as long as every
/// event number is below `events_per_run`.
#[must_use]
pub const fn derive_seed(
    base_seed: u64,
    component_index: u64,
    event_number: u64,
    events_per_run: u64,
) -> u64 {
    base_seed.wrapping_add(
        component_index
            .wrapping_mul(events_per_run)
            .wrapping_add(event_number),
    )
}

/// Spawns independent, reproducible generators from one base seed.
///
/// # Examples
///
/// ```rust
/// use rand::Rng;
/// use sequencer_random::{RandomNumbers, RandomNumbersConfig};
///
/// let service = RandomNumbers::new(RandomNumbersConfig::with_seed(42));
/// let mut a = service.spawn(1, 17, 100).unwrap();
/// let mut b = service.spawn(1, 17, 100).unwrap();
/// assert_eq!(a.r#gen::<u64>(), b.r#gen::<u64>());
/// ```
#[derive(Debug, Clone)]
pub struct RandomNumbers {
    config: RandomNumbersConfig,
}

impl RandomNumbers {
    /// Create a service from its configuration.
    #[must_use]
    pub fn new(config: RandomNumbersConfig) -> Self {
        Self { config }
    }

    /// Returns the service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns the base seed, if one is configured.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.config.seed
    }

    /// Returns the base seed.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError::NotConfigured`] if no seed is set.
    pub fn require_seed(&self) -> Result<u64, RandomError> {
        self.config.seed.ok_or_else(|| RandomError::NotConfigured {
            service: self.config.name.clone(),
        })
    }

    /// Spawn the generator for one component working on one event.
    ///
    /// # Errors
    ///
    /// Returns [`RandomError::NotConfigured`] if no seed is set.
    pub fn spawn(
        &self,
        component_index: u64,
        event_number: u64,
        events_per_run: u64,
    ) -> Result<RandomEngine, RandomError> {
        let base = self.require_seed()?;
        let seed = derive_seed(base, component_index, event_number, events_per_run);
        trace!(
            service = self.config.name.as_str(),
            component_index, event_number, seed, "spawning random engine"
        );
        Ok(ChaCha8Rng::seed_from_u64(seed))
    }
}
