//! Rigid placement of a detector element.
//!
//! [`Transform3D`] maps element-local coordinates into the global frame.
//! Local shifts and rotations act in the element frame, global ones in the
//! lab frame.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A rigid transform: rotation followed by translation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform3D {
    /// Global position of the local origin.
    pub position: DVec3,
    /// Orientation of the local frame as a unit quaternion.
    pub rotation: DQuat,
}

impl Transform3D {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    /// Create a transform with the given position and no rotation.
    #[must_use]
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a transform with position and rotation.
    #[must_use]
    pub fn from_position_rotation(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    /// Map a local point into the global frame.
    #[must_use]
    pub fn to_global(&self, local: DVec3) -> DVec3 {
        self.position + self.rotation * local
    }

    /// Map a global point into the local frame.
    #[must_use]
    pub fn to_local(&self, global: DVec3) -> DVec3 {
        self.rotation.inverse() * (global - self.position)
    }

    /// Translate by a global offset.
    #[must_use]
    pub fn translated(mut self, offset: DVec3) -> Self {
        self.position += offset;
        self
    }

    /// Translate along the element's own axes.
    #[must_use]
    pub fn translated_local(mut self, offset: DVec3) -> Self {
        self.position += self.rotation * offset;
        self
    }

    /// Rotate about the global origin.
    #[must_use]
    pub fn rotated(mut self, rotation: DQuat) -> Self {
        self.position = rotation * self.position;
        self.rotation = (rotation * self.rotation).normalize();
        self
    }

    /// Rotate the element about its own origin, with `rotation` given in
    /// the local frame.
    #[must_use]
    pub fn rotated_local(mut self, rotation: DQuat) -> Self {
        self.rotation = (self.rotation * rotation).normalize();
        self
    }

    /// Returns `true` if both transforms agree within `epsilon`.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.position.abs_diff_eq(other.position, epsilon)
            && (self.rotation.abs_diff_eq(other.rotation, epsilon)
                || self.rotation.abs_diff_eq(-other.rotation, epsilon))
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_identity_transform() {
        let t = Transform3D::IDENTITY;
        assert_eq!(t.position, DVec3::ZERO);
        assert_eq!(t.rotation, DQuat::IDENTITY);
    }

    #[test]
    fn test_local_translation_follows_rotation() {
        let t = Transform3D::from_position_rotation(
            DVec3::new(0.0, 0.0, 100.0),
            DQuat::from_rotation_z(FRAC_PI_2),
        )
        .translated_local(DVec3::X);
        assert!(t.position.abs_diff_eq(DVec3::new(0.0, 1.0, 100.0), EPS));
    }

    #[test]
    fn test_global_local_roundtrip() {
        let t = Transform3D::from_position_rotation(
            DVec3::new(1.0, 2.0, 3.0),
            DQuat::from_rotation_y(0.3),
        );
        let p = DVec3::new(0.5, -0.25, 2.0);
        assert!(t.to_local(t.to_global(p)).abs_diff_eq(p, EPS));
    }

    #[test]
    fn test_rotated_moves_position() {
        let t = Transform3D::from_position(DVec3::X).rotated(DQuat::from_rotation_z(FRAC_PI_2));
        assert!(t.position.abs_diff_eq(DVec3::Y, EPS));
    }

    #[test]
    fn test_rotated_local_keeps_position() {
        let t = Transform3D::from_position(DVec3::X).rotated_local(DQuat::from_rotation_y(0.1));
        assert_eq!(t.position, DVec3::X);
        assert!(!t.abs_diff_eq(&Transform3D::from_position(DVec3::X), EPS));
    }
}
