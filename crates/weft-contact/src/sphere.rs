//! Immovable sphere scene collider.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::response::{CollisionResponder, SphereResponder};

/// A static sphere that nodes collide against but never move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmovableSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl ImmovableSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl CollisionResponder for ImmovableSphere {
    fn velocity(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn inverse_mass(&self) -> f32 {
        0.0
    }

    fn apply_collision_effect(&mut self, _translation: Vec3, _impulse: Vec3) {}
}

impl SphereResponder for ImmovableSphere {
    fn center(&self) -> Vec3 {
        self.center
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}
