//! Immovable axis-aligned cuboid scene collider.
//!
//! Used for tables, floors and walls. The corners are normalised on
//! construction so `minimum <= maximum` on every axis.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::response::{CollisionResponder, CuboidResponder};

/// A static axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmovableCuboid {
    pub minimum: Vec3,
    pub maximum: Vec3,
}

impl ImmovableCuboid {
    /// Box spanning two opposite corners, in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            minimum: a.min(b),
            maximum: a.max(b),
        }
    }

    /// Box of full edge lengths `size` centred on `center`.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Returns true if `point` lies inside or on the box.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.minimum).all() && point.cmple(self.maximum).all()
    }
}

impl CollisionResponder for ImmovableCuboid {
    fn velocity(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn inverse_mass(&self) -> f32 {
        0.0
    }

    fn apply_collision_effect(&mut self, _translation: Vec3, _impulse: Vec3) {}
}

impl CuboidResponder for ImmovableCuboid {
    fn minimum(&self) -> Vec3 {
        self.minimum
    }

    fn maximum(&self) -> Vec3 {
        self.maximum
    }
}
