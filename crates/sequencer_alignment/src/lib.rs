//! # sequencer_alignment
//!
//! Context decorators for slowly varying detector conditions.
//!
//! - [`AlignmentDecorator`] hands every event the alignment generation of
//!   its interval of validity, with a bounded cache of generations.
//! - [`RotationDecorator`] rotates elements a little more each event.
//! - [`FieldScaleDecorator`] scales the magnetic field per event.
//!
//! Geometry is a flat list of [`DetectorElement`]s, each placed by a
//! [`Transform3D`].

pub mod config;
pub mod decorator;
pub mod element;
pub mod error;
pub mod field;
pub mod rotation;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{DQuat, DVec3};

pub use config::AlignmentConfig;
pub use decorator::{AlignmentDecorator, AlignmentSnapshot, IovId};
pub use element::{DetectorElement, ElementId, barrel_layout};
pub use error::AlignmentError;
pub use field::{FieldScale, FieldScaleDecorator};
pub use rotation::RotationDecorator;
pub use transform::Transform3D;
