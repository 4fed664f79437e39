//! Random number service configuration.

use serde::{Deserialize, Serialize};

/// Default base seed.
pub const DEFAULT_SEED: u64 = 1_234_567_890;

/// Configuration for a [`RandomNumbers`](crate::RandomNumbers) service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomNumbersConfig {
    /// Service name, used in diagnostics.
    pub name: String,
    /// Base seed. `None` leaves the service unconfigured.
    pub seed: Option<u64>,
}

impl RandomNumbersConfig {
    /// Create a config with the given base seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Create a config without a seed. Spawning from such a service fails.
    #[must_use]
    pub fn unseeded() -> Self {
        Self {
            seed: None,
            ..Self::default()
        }
    }

    /// Override the service name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for RandomNumbersConfig {
    fn default() -> Self {
        Self {
            name: "RandomNumbers".to_string(),
            seed: Some(DEFAULT_SEED),
        }
    }
}
