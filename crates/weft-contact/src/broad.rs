//! Broad phase vocabulary: integer grid bounds and hashable items.
//!
//! An item is hashed by its axis-aligned bounding box, not by a point,
//! so a node sitting on a cell border is registered in every cell its
//! box touches.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Anything that can be tracked by the [`SpatialHasher`](crate::SpatialHasher).
pub trait SpatialHashable {
    /// Centre of the item's bounding box.
    fn centroid(&self) -> Vec3;

    /// Full edge lengths of the item's bounding box.
    fn size(&self) -> Vec3;
}

/// Inclusive range of grid cells covered by a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridBounds {
    /// Lowest cell coordinate on each axis.
    pub min: IVec3,
    /// Highest cell coordinate on each axis (inclusive).
    pub max: IVec3,
}

impl GridBounds {
    /// Cell range of the box `centroid ± size / 2` on a grid of `grid_size` cubes.
    pub fn from_aabb(centroid: Vec3, size: Vec3, grid_size: f32) -> Self {
        let half = size * 0.5;
        Self {
            min: ((centroid - half) / grid_size).floor().as_ivec3(),
            max: ((centroid + half) / grid_size).floor().as_ivec3(),
        }
    }

    /// Cell range of a hashable item.
    pub fn of<T: SpatialHashable + ?Sized>(item: &T, grid_size: f32) -> Self {
        Self::from_aabb(item.centroid(), item.size(), grid_size)
    }

    /// Returns true if both ranges share at least one cell.
    pub fn overlaps(&self, other: &GridBounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Number of cells in the range, saturating at `u64::MAX`.
    pub fn cell_count(&self) -> u64 {
        let axis = |min: i32, max: i32| (i64::from(max) - i64::from(min) + 1).max(0) as u64;
        axis(self.min.x, self.max.x)
            .saturating_mul(axis(self.min.y, self.max.y))
            .saturating_mul(axis(self.min.z, self.max.z))
    }

    /// Iterates every cell of the range, x-major.
    pub fn cells(&self) -> impl Iterator<Item = IVec3> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| IVec3::new(x, y, z)))
        })
    }
}
