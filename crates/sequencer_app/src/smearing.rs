//! Hit creation with measurement smearing.

use std::sync::Arc;

use glam::{DVec2, DVec3};
use sequencer_alignment::{AlignmentSnapshot, ElementId, FieldScale, Transform3D};
use sequencer_framework::{Algorithm, ProcessCode, ProcessError, ProcessResult, RunContext};
use sequencer_random::{Distribution, RandomNumbers};

use crate::generator::Particle;

/// A smeared measurement on one detector element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Index of the particle that made the hit.
    pub particle: u32,
    /// The element that was hit.
    pub element: ElementId,
    /// Smeared local position on the element surface.
    pub local: DVec2,
    /// The smeared position in the global frame.
    pub global: DVec3,
}

/// Settings of [`HitSmearing`].
#[derive(Debug, Clone)]
pub struct HitSmearingConfig {
    /// Particle collection to read.
    pub input: String,
    /// Hit collection to write.
    pub output: String,
    /// Local resolution along x and y, in mm.
    pub resolution: DVec2,
    /// Azimuthal bend per unit charge over transverse momentum, in rad GeV,
    /// at nominal field.
    pub bending: f64,
}

impl Default for HitSmearingConfig {
    fn default() -> Self {
        Self {
            input: "particles".to_string(),
            output: "hits".to_string(),
            resolution: DVec2::new(0.05, 0.05),
            bending: 0.003,
        }
    }
}

/// Puts one hit per particle on the element its track crosses, using the
/// event's alignment and field scale, then smears it.
#[derive(Debug)]
pub struct HitSmearing {
    config: HitSmearingConfig,
    random: Arc<RandomNumbers>,
}

impl HitSmearing {
    /// Create the algorithm.
    #[must_use]
    pub fn new(config: HitSmearingConfig, random: Arc<RandomNumbers>) -> Self {
        Self { config, random }
    }

    /// Direction of a particle after bending in a field scaled by `field`.
    fn direction(&self, particle: &Particle, field: f64) -> DVec3 {
        let pt = particle.pt();
        let phi = particle.phi() + self.config.bending * particle.charge * field / pt;
        DVec3::new(phi.cos(), phi.sin(), particle.momentum.z / pt)
    }
}

/// The crossing of a straight track from the origin with an element plane,
/// in element-local coordinates.
fn crossing(transform: &Transform3D, direction: DVec3) -> Option<DVec3> {
    let normal = transform.rotation * DVec3::Z;
    let facing = normal.dot(direction);
    if facing <= 0.0 {
        return None;
    }
    let path = normal.dot(transform.position) / facing;
    if path <= 0.0 {
        return None;
    }
    Some(transform.to_local(direction * path))
}

/// The element crossed closest to its centre. Ties go to the lower id.
fn closest_crossing(
    snapshot: &AlignmentSnapshot,
    direction: DVec3,
) -> Option<(ElementId, &Transform3D, DVec2)> {
    let mut best: Option<(ElementId, &Transform3D, DVec2)> = None;
    for (id, transform) in snapshot.iter() {
        let Some(local) = crossing(transform, direction) else {
            continue;
        };
        let local = local.truncate();
        if best.is_none_or(|(_, _, current)| local.length() < current.length()) {
            best = Some((id, transform, local));
        }
    }
    best
}

impl Algorithm for HitSmearing {
    fn name(&self) -> &str {
        "HitSmearing"
    }

    fn execute(&self, context: &RunContext<'_>) -> ProcessResult {
        let particles = context.store.get::<Vec<Particle>>(&self.config.input)?;
        let snapshot = context
            .decoration
            .get::<AlignmentSnapshot>()
            .ok_or_else(|| ProcessError::failed("event has no alignment snapshot"))?;
        let field = context.decoration.get::<FieldScale>().map_or(1.0, |s| s.factor);

        let mut engine = context.spawn_generator(&self.random)?;
        let smear_x = Distribution::Gauss {
            mean: 0.0,
            sigma: self.config.resolution.x,
        };
        let smear_y = Distribution::Gauss {
            mean: 0.0,
            sigma: self.config.resolution.y,
        };

        let mut hits = Vec::with_capacity(particles.len());
        for particle in particles.iter() {
            let direction = self.direction(particle, field);
            let Some((element, transform, local)) = closest_crossing(snapshot, direction) else {
                continue;
            };
            let local = local + DVec2::new(smear_x.draw(&mut engine)?, smear_y.draw(&mut engine)?);
            hits.push(Hit {
                particle: particle.index,
                element,
                local,
                global: transform.to_global(local.extend(0.0)),
            });
        }

        context.store.add(self.config.output.as_str(), hits)?;
        Ok(ProcessCode::Success)
    }
}

#[cfg(test)]
mod tests {
    use sequencer_alignment::{DetectorElement, IovId, barrel_layout};
    use sequencer_framework::EventContext;
    use sequencer_random::RandomNumbersConfig;

    use super::*;

    fn particle(phi: f64, charge: f64) -> Particle {
        Particle {
            index: 0,
            charge,
            momentum: DVec3::new(2.0 * phi.cos(), 2.0 * phi.sin(), 0.0),
        }
    }

    #[test]
    fn test_crossing_on_facing_element() {
        let elements = barrel_layout(1, 4, 30.0, 0.0);
        let snapshot = AlignmentSnapshot::nominal(IovId(0), &elements);
        let (id, _, local) = closest_crossing(&snapshot, DVec3::X).unwrap();
        assert_eq!(id, ElementId(0));
        assert!(local.length() < 1e-9);
    }

    #[test]
    fn test_inner_layer_preferred() {
        let elements = barrel_layout(3, 8, 30.0, 40.0);
        let snapshot = AlignmentSnapshot::nominal(IovId(0), &elements);
        let direction = DVec3::new(1.0, 0.1, 0.0);
        let (id, _, _) = closest_crossing(&snapshot, direction).unwrap();
        assert_eq!(id, ElementId(0));
    }

    #[test]
    fn test_field_bends_by_charge() {
        let random = Arc::new(RandomNumbers::new(RandomNumbersConfig::with_seed(1)));
        let smearing = HitSmearing::new(HitSmearingConfig::default(), random);
        let plus = smearing.direction(&particle(0.0, 1.0), 2.0);
        let minus = smearing.direction(&particle(0.0, -1.0), 2.0);
        assert!(plus.y > 0.0);
        assert!((plus.y + minus.y).abs() < 1e-12);
    }

    #[test]
    fn test_execute_writes_one_hit_per_particle() {
        let random = Arc::new(RandomNumbers::new(RandomNumbersConfig::with_seed(1)));
        let smearing = HitSmearing::new(HitSmearingConfig::default(), random);
        let elements: Vec<DetectorElement> = barrel_layout(1, 8, 30.0, 0.0);

        let mut context = EventContext::new(0, 1);
        context.decorate(AlignmentSnapshot::nominal(IovId(0), &elements));
        context
            .store()
            .add("particles", vec![particle(0.0, 1.0), particle(1.0, -1.0)])
            .unwrap();
        smearing.execute(&context.for_component(1)).unwrap();

        let hits = context.store().get::<Vec<Hit>>("hits").unwrap();
        assert_eq!(hits.len(), 2);
        for hit in hits.iter() {
            let radius = hit.global.truncate().length();
            assert!((radius - 30.0).abs() < 1.0);
        }
    }

    #[test]
    fn test_missing_alignment_fails() {
        let random = Arc::new(RandomNumbers::new(RandomNumbersConfig::with_seed(1)));
        let smearing = HitSmearing::new(HitSmearingConfig::default(), random);
        let context = EventContext::new(0, 1);
        context.store().add("particles", Vec::<Particle>::new()).unwrap();
        let err = smearing.execute(&context.for_component(1)).unwrap_err();
        assert!(matches!(err, ProcessError::Failed(_)));
    }
}
