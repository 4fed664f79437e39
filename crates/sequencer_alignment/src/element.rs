//! Detector elements and their nominal placement.

use std::collections::BTreeSet;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;
use crate::transform::Transform3D;

/// Identifier of a detector element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sensitive element with a fixed nominal placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorElement {
    /// Unique identifier.
    pub id: ElementId,
    /// Placement as built.
    pub nominal: Transform3D,
}

impl DetectorElement {
    /// Create an element.
    #[must_use]
    pub fn new(id: u32, nominal: Transform3D) -> Self {
        Self {
            id: ElementId(id),
            nominal,
        }
    }
}

/// Reject element lists with repeated identifiers.
///
/// # Errors
///
/// Returns [`AlignmentError::DuplicateElement`] naming the first repeat.
pub fn check_unique(elements: &[DetectorElement]) -> Result<(), AlignmentError> {
    let mut seen = BTreeSet::new();
    for element in elements {
        if !seen.insert(element.id) {
            return Err(AlignmentError::DuplicateElement(element.id.0));
        }
    }
    Ok(())
}

/// Build concentric cylindrical layers of flat modules around the z axis.
///
/// Layer `l` sits at radius `first_radius + l * layer_spacing` and holds
/// `modules_per_layer` modules whose local z axis points outward.
/// Identifiers count up from zero, layer by layer.
#[must_use]
pub fn barrel_layout(
    layers: u32,
    modules_per_layer: u32,
    first_radius: f64,
    layer_spacing: f64,
) -> Vec<DetectorElement> {
    let mut elements = Vec::with_capacity((layers * modules_per_layer) as usize);
    for layer in 0..layers {
        let radius = first_radius + f64::from(layer) * layer_spacing;
        for module in 0..modules_per_layer {
            let phi = TAU * f64::from(module) / f64::from(modules_per_layer);
            // Local z outward, local x along the beam.
            let rotation = DQuat::from_rotation_z(phi) * DQuat::from_rotation_y(FRAC_PI_2);
            let position = DVec3::new(radius * phi.cos(), radius * phi.sin(), 0.0);
            let id = layer * modules_per_layer + module;
            elements.push(DetectorElement::new(
                id,
                Transform3D::from_position_rotation(position, rotation),
            ));
        }
    }
    elements
}
