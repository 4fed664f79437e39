//! Particle gun reader.

use std::f64::consts::PI;
use std::sync::Arc;

use glam::DVec3;
use rand::Rng;
use sequencer_framework::{ProcessCode, ProcessResult, Reader, RunContext};
use sequencer_random::{Distribution, RandomNumbers};
use tracing::trace;

/// A generated particle leaving the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Index within the event.
    pub index: u32,
    /// Charge in units of e, `+1` or `-1`.
    pub charge: f64,
    /// Momentum in GeV.
    pub momentum: DVec3,
}

impl Particle {
    /// Transverse momentum.
    #[must_use]
    pub fn pt(&self) -> f64 {
        self.momentum.truncate().length()
    }

    /// Azimuthal angle.
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.momentum.y.atan2(self.momentum.x)
    }
}

/// Kinematic ranges of the particle gun.
#[derive(Debug, Clone)]
pub struct ParticleGunConfig {
    /// Collection written each event.
    pub output: String,
    /// Mean number of particles per event.
    pub mean_multiplicity: f64,
    /// Mean transverse momentum in GeV.
    pub pt_mean: f64,
    /// Width of the transverse momentum in GeV.
    pub pt_sigma: f64,
    /// Pseudorapidity range.
    pub eta: (f64, f64),
}

impl Default for ParticleGunConfig {
    fn default() -> Self {
        Self {
            output: "particles".to_string(),
            mean_multiplicity: 20.0,
            pt_mean: 2.0,
            pt_sigma: 0.5,
            eta: (-1.0, 1.0),
        }
    }
}

/// Generates a Poisson-distributed number of particles per event.
///
/// Holds no per-event state, so skipping is free.
#[derive(Debug)]
pub struct ParticleGun {
    config: ParticleGunConfig,
    random: Arc<RandomNumbers>,
}

impl ParticleGun {
    /// Lowest transverse momentum generated, in GeV.
    const MIN_PT: f64 = 0.1;

    /// Create a gun drawing from `random`.
    #[must_use]
    pub fn new(config: ParticleGunConfig, random: Arc<RandomNumbers>) -> Self {
        Self { config, random }
    }
}

impl Reader for ParticleGun {
    fn name(&self) -> &str {
        "ParticleGun"
    }

    fn read(&self, context: &RunContext<'_>) -> ProcessResult {
        let c = &self.config;
        let mut engine = context.spawn_generator(&self.random)?;

        let multiplicity = Distribution::Poisson {
            mean: c.mean_multiplicity,
        }
        .draw(&mut engine)? as u32;
        let pt = Distribution::Gauss {
            mean: c.pt_mean,
            sigma: c.pt_sigma,
        };
        let eta = Distribution::Uniform {
            low: c.eta.0,
            high: c.eta.1,
        };
        let phi = Distribution::Uniform { low: -PI, high: PI };

        let mut particles = Vec::with_capacity(multiplicity as usize);
        for index in 0..multiplicity {
            let pt = pt.draw(&mut engine)?.max(Self::MIN_PT);
            let eta = eta.draw(&mut engine)?;
            let phi = phi.draw(&mut engine)?;
            let charge = if engine.gen_bool(0.5) { 1.0 } else { -1.0 };
            let momentum = DVec3::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh());
            particles.push(Particle {
                index,
                charge,
                momentum,
            });
        }

        trace!(event = context.event_number, particles = particles.len(), "generated");
        context.store.add(c.output.as_str(), particles)?;
        Ok(ProcessCode::Success)
    }

    fn can_skip(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use sequencer_framework::EventContext;
    use sequencer_random::RandomNumbersConfig;

    use super::*;

    fn gun() -> ParticleGun {
        let random = Arc::new(RandomNumbers::new(RandomNumbersConfig::with_seed(7)));
        ParticleGun::new(ParticleGunConfig::default(), random)
    }

    fn particles(gun: &ParticleGun, event: u64) -> Vec<Particle> {
        let context = EventContext::new(event, 100);
        gun.read(&context.for_component(0)).unwrap();
        context.store().get::<Vec<Particle>>("particles").unwrap().to_vec()
    }

    #[test]
    fn test_same_event_same_particles() {
        let gun = gun();
        assert_eq!(particles(&gun, 3), particles(&gun, 3));
        assert_ne!(particles(&gun, 3), particles(&gun, 4));
    }

    #[test]
    fn test_kinematic_ranges() {
        let gun = gun();
        for event in 0..10 {
            for p in particles(&gun, event) {
                assert!(p.pt() >= ParticleGun::MIN_PT - 1e-12);
                assert!(p.charge == 1.0 || p.charge == -1.0);
                let eta = (p.momentum.z / p.pt()).asinh();
                assert!((-1.0..1.0 + 1e-9).contains(&eta));
            }
        }
    }
}
