//! Time-varying detector alignment.
//!
//! The [`AlignmentDecorator`] emulates an alignment that changes every
//! `iov_size` events. Each interval of validity (IOV) gets one generation
//! of element transforms: the nominal placement perturbed by Gaussian
//! misalignments drawn from a stream seeded by the alignment seed and the
//! IOV number. A generation therefore only depends on its IOV, and events
//! decorated out of order on different workers see identical transforms.
//!
//! Generations are built on first demand and cached. Whenever a newer
//! generation is cached, everything older than the generation before it
//! is evicted from the cache and from each element's history, so at most
//! two generations are live. Events keep their generation alive through the
//! [`Arc<AlignmentSnapshot>`] in their decoration, so eviction never pulls
//! a snapshot out from under a running event.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use glam::{DQuat, DVec3};
use rand::Rng;
use rand_distr::StandardNormal;
use sequencer_framework::{ContextDecorator, EventContext, ProcessCode, ProcessError, ProcessResult};
use sequencer_random::{RandomEngine, RandomNumbers, RandomNumbersConfig};
use tracing::{debug, trace};

use crate::config::AlignmentConfig;
use crate::element::{DetectorElement, ElementId, check_unique};
use crate::error::AlignmentError;
use crate::transform::Transform3D;

/// Identifier of an interval of validity: `event / iov_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IovId(pub u64);

impl fmt::Display for IovId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The element transforms valid for one interval of validity.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSnapshot {
    iov: IovId,
    transforms: BTreeMap<ElementId, Transform3D>,
}

impl AlignmentSnapshot {
    /// Snapshot of the nominal placement of `elements`.
    #[must_use]
    pub fn nominal(iov: IovId, elements: &[DetectorElement]) -> Self {
        Self {
            iov,
            transforms: elements.iter().map(|e| (e.id, e.nominal)).collect(),
        }
    }

    /// Returns the interval this snapshot belongs to.
    #[must_use]
    pub fn iov(&self) -> IovId {
        self.iov
    }

    /// Returns the transform of one element.
    #[must_use]
    pub fn transform(&self, id: ElementId) -> Option<&Transform3D> {
        self.transforms.get(&id)
    }

    /// Iterate over all element transforms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Transform3D)> {
        self.transforms.iter().map(|(id, t)| (*id, t))
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns `true` if the snapshot holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Build a new snapshot for the same interval with every transform
    /// passed through `f`.
    #[must_use]
    pub fn map(&self, mut f: impl FnMut(ElementId, &Transform3D) -> Transform3D) -> Self {
        Self {
            iov: self.iov,
            transforms: self.transforms.iter().map(|(id, t)| (*id, f(*id, t))).collect(),
        }
    }
}

/// Cached generations and per-element histories.
#[derive(Debug, Default)]
struct GenerationStore {
    generations: BTreeMap<IovId, Arc<AlignmentSnapshot>>,
    /// Oldest first, keyed by interval.
    histories: BTreeMap<ElementId, BTreeMap<IovId, Transform3D>>,
    newest: Option<IovId>,
}

impl GenerationStore {
    /// Number of generations kept: the newest and the one before it.
    const LIVE: u64 = 2;

    /// Oldest interval still kept, if anything is cached.
    fn oldest_live(&self) -> Option<IovId> {
        self.newest
            .map(|newest| IovId(newest.0.saturating_sub(Self::LIVE - 1)))
    }

    /// Whether a generation for `iov` would be evicted right away.
    fn is_expired(&self, iov: IovId) -> bool {
        self.oldest_live().is_some_and(|oldest| iov < oldest)
    }

    fn insert(&mut self, snapshot: &Arc<AlignmentSnapshot>) {
        let iov = snapshot.iov();
        for (id, transform) in snapshot.iter() {
            self.histories.entry(id).or_default().insert(iov, *transform);
        }
        self.generations.insert(iov, Arc::clone(snapshot));
        self.newest = self.newest.max(Some(iov));
    }

    /// Drop every generation older than the newest minus one.
    fn evict(&mut self) -> usize {
        let Some(oldest) = self.oldest_live() else {
            return 0;
        };
        let before = self.generations.len();
        self.generations.retain(|iov, _| *iov >= oldest);
        for history in self.histories.values_mut() {
            history.retain(|iov, _| *iov >= oldest);
        }
        before - self.generations.len()
    }
}

/// Decorates every event with the alignment generation of its interval.
pub struct AlignmentDecorator {
    config: AlignmentConfig,
    elements: Vec<DetectorElement>,
    random: RandomNumbers,
    store: Mutex<GenerationStore>,
}

impl AlignmentDecorator {
    /// Create a decorator for `elements`.
    ///
    /// # Errors
    ///
    /// Returns an [`AlignmentError`] for a zero IOV or flush size, an
    /// unusable sigma, or repeated element ids.
    pub fn new(config: AlignmentConfig, elements: Vec<DetectorElement>) -> Result<Self, AlignmentError> {
        config.validate()?;
        check_unique(&elements)?;
        let random = RandomNumbers::new(
            RandomNumbersConfig::with_seed(config.seed).named("AlignmentDecorator"),
        );
        Ok(Self {
            config,
            elements,
            random,
            store: Mutex::new(GenerationStore::default()),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Returns the decorated elements.
    #[must_use]
    pub fn elements(&self) -> &[DetectorElement] {
        &self.elements
    }

    /// Interval of validity of `event`.
    #[must_use]
    pub fn iov_of(&self, event: u64) -> IovId {
        IovId(event / self.config.iov_size)
    }

    /// Number of generations held in the history of one element.
    #[must_use]
    pub fn live_generations(&self, element: ElementId) -> usize {
        self.lock()
            .histories
            .get(&element)
            .map_or(0, BTreeMap::len)
    }

    /// Intervals currently cached, ascending.
    #[must_use]
    pub fn live_iovs(&self) -> Vec<IovId> {
        self.lock().generations.keys().copied().collect()
    }

    /// Returns the generation for `iov`, building and caching it if needed.
    ///
    /// # Errors
    ///
    /// Propagates a failure to spawn the misalignment stream.
    pub fn snapshot(&self, iov: IovId) -> Result<Arc<AlignmentSnapshot>, ProcessError> {
        let mut store = self.lock();
        if let Some(cached) = store.generations.get(&iov) {
            return Ok(Arc::clone(cached));
        }

        let snapshot = Arc::new(self.generate(iov)?);
        if store.is_expired(iov) {
            // A late event from an evicted interval; rebuilt, not cached.
            trace!(iov = iov.0, "rebuilt evicted alignment generation");
            return Ok(snapshot);
        }
        store.insert(&snapshot);
        let evicted = store.evict();
        debug!(
            iov = iov.0,
            evicted,
            live = store.generations.len(),
            "new alignment generation"
        );
        Ok(snapshot)
    }

    /// Build the transforms of one generation.
    fn generate(&self, iov: IovId) -> Result<AlignmentSnapshot, ProcessError> {
        if iov.0 == 0 && self.config.first_iov_nominal {
            return Ok(AlignmentSnapshot::nominal(iov, &self.elements));
        }
        let mut engine = self.random.spawn(0, iov.0, 1)?;
        let transforms = self
            .elements
            .iter()
            .map(|element| (element.id, self.misalign(&element.nominal, &mut engine)))
            .collect();
        Ok(AlignmentSnapshot { iov, transforms })
    }

    fn misalign(&self, nominal: &Transform3D, engine: &mut RandomEngine) -> Transform3D {
        let c = &self.config;
        let mut gauss = |sigma: f64| sigma * engine.sample::<f64, _>(StandardNormal);
        let shift = DVec3::new(
            gauss(c.sigma_in_plane),
            gauss(c.sigma_in_plane),
            gauss(c.sigma_out_of_plane),
        );
        let rotation = DQuat::from_rotation_x(gauss(c.sigma_out_rotation))
            * DQuat::from_rotation_y(gauss(c.sigma_out_rotation))
            * DQuat::from_rotation_z(gauss(c.sigma_in_rotation));
        nominal.translated_local(shift).rotated_local(rotation)
    }

    fn lock(&self) -> MutexGuard<'_, GenerationStore> {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl fmt::Debug for AlignmentDecorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentDecorator")
            .field("config", &self.config)
            .field("elements", &self.elements.len())
            .finish_non_exhaustive()
    }
}

impl ContextDecorator for AlignmentDecorator {
    fn name(&self) -> &str {
        "AlignmentDecorator"
    }

    fn decorate(&self, context: &mut EventContext) -> ProcessResult {
        let event = context.event_number();
        if event % self.config.iov_size == 0 {
            trace!(event, "interval of validity boundary");
        }
        if event % self.config.flush_size == 0 {
            let evicted = self.lock().evict();
            debug!(event, evicted, "flush boundary");
        }
        let snapshot = self.snapshot(self.iov_of(event))?;
        context.decorate_shared(snapshot);
        Ok(ProcessCode::Success)
    }
}
