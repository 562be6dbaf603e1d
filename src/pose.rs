//! Object pose (translation, rotation, scale)

use glam::{Quat, Vec3};

/// Where and how an object sits relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    /// Not required to be normalized; stored exactly as captured
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Origin, no rotation, unit scale (where new objects are placed)
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// True if every component is finite
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }

    /// Component-wise comparison within `eps`
    pub fn abs_diff_eq(&self, other: &Pose, eps: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, eps)
            && self.rotation.abs_diff_eq(other.rotation, eps)
            && self.scale.abs_diff_eq(other.scale, eps)
    }
}
