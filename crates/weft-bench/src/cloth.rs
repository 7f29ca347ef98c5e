//! Rectangular cloth builder.
//!
//! A cloth is a `(divisions + 1) × (divisions + 1)` grid of nodes in the
//! XZ plane, connected by three families of springs:
//!
//! ```text
//! Elastic  (x+1, z)   (x, z+1)       rest = one step
//! Shear    (x+1, z+1) (x+1, z-1)     rest = step diagonal
//! Bend     (x+2, z)   (x, z+2)       rest = two steps
//! ```
//!
//! Node `(x, z)` has local index `x * (divisions + 1) + z`.

use glam::Vec3;
use weft_io::ClothSpec;
use weft_solver::{DamperType, SpringProcessor};
use weft_types::{NodeId, WeftError, WeftResult};

/// Node radius as a fraction of half a grid step.
const COLLISION_MARGIN: f32 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct RectangularCloth {
    pub center: Vec3,
    pub width: f32,
    pub height: f32,
    pub divisions: u32,
}

impl RectangularCloth {
    pub fn new(center: Vec3, width: f32, height: f32, divisions: u32) -> WeftResult<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(WeftError::InvalidConfig(format!(
                "cloth dimensions must be positive, got {width} x {height}"
            )));
        }
        if divisions == 0 {
            return Err(WeftError::InvalidConfig(
                "cloth needs at least one division".into(),
            ));
        }
        Ok(Self {
            center,
            width,
            height,
            divisions,
        })
    }

    pub fn from_spec(spec: &ClothSpec) -> WeftResult<Self> {
        Self::new(spec.center, spec.width, spec.height, spec.divisions)
    }

    /// Nodes along one side.
    pub fn points_per_side(&self) -> usize {
        self.divisions as usize + 1
    }

    pub fn node_count(&self) -> usize {
        self.points_per_side() * self.points_per_side()
    }

    /// Springs the builder will add.
    pub fn damper_count(&self) -> usize {
        let d = self.divisions as usize;
        let p = d + 1;
        let elastic = 2 * d * p;
        let shear = 2 * d * d;
        let bend = 2 * d.saturating_sub(1) * p;
        elastic + shear + bend
    }

    /// Grid step as a fraction of the cloth size.
    pub fn step_size(&self) -> f32 {
        1.0 / self.divisions as f32
    }

    /// Node radius, kept just below half the smaller grid step.
    pub fn node_radius(&self) -> f32 {
        self.step_size() / 2.0 * COLLISION_MARGIN * self.width.min(self.height)
    }

    /// Local index of grid point `(x, z)`, or `None` off the grid.
    pub fn coord_to_index(&self, x: i64, z: i64) -> Option<usize> {
        let side = self.points_per_side() as i64;
        if x < 0 || z < 0 || x >= side || z >= side {
            return None;
        }
        Some((x * side + z) as usize)
    }

    /// Rest position of grid point `(x, z)`.
    pub fn rest_position(&self, x: u32, z: u32) -> Vec3 {
        let step = self.step_size();
        let corner = self.center - Vec3::new(self.width, 0.0, self.height) * 0.5;
        corner + Vec3::new(x as f32 * step * self.width, 0.0, z as f32 * step * self.height)
    }

    /// Adds the cloth's nodes and springs to `processor`. The topology is
    /// left open so several cloths can share one processor.
    pub fn build(&self, processor: &mut dyn SpringProcessor) -> WeftResult<ClothNodes> {
        let base = processor.node_count();
        let radius = self.node_radius();
        for x in 0..=self.divisions {
            for z in 0..=self.divisions {
                processor.add_node(self.rest_position(x, z), radius)?;
            }
        }

        let nodes = ClothNodes {
            base,
            points_per_side: self.points_per_side(),
            center: self.center,
        };

        let step = self.step_size();
        let x_rest = step * self.width;
        let z_rest = step * self.height;
        let xz_rest = (x_rest * x_rest + z_rest * z_rest).sqrt();

        let side = self.points_per_side() as i64;
        for x in 0..side {
            for z in 0..side {
                let Some(me) = nodes.id(x, z) else { continue };
                let mut link = |kind: DamperType, xx: i64, zz: i64, rest: f32| {
                    match nodes.id(xx, zz) {
                        Some(other) => processor.add_damper(kind, rest, me, other),
                        None => Ok(()),
                    }
                };
                link(DamperType::Elastic, x + 1, z, x_rest)?;
                link(DamperType::Elastic, x, z + 1, z_rest)?;
                link(DamperType::Shear, x + 1, z + 1, xz_rest)?;
                link(DamperType::Shear, x + 1, z - 1, xz_rest)?;
                link(DamperType::Bend, x + 2, z, x_rest * 2.0)?;
                link(DamperType::Bend, x, z + 2, z_rest * 2.0)?;
            }
        }

        tracing::debug!(
            base,
            nodes = self.node_count(),
            radius,
            "cloth added"
        );
        Ok(nodes)
    }
}

/// Where a built cloth's nodes live inside a processor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClothNodes {
    /// Id of node `(0, 0)`.
    pub base: usize,
    pub points_per_side: usize,
    /// Pivot for [`rotate_quarter_turn`](Self::rotate_quarter_turn).
    pub center: Vec3,
}

impl ClothNodes {
    /// Processor id of grid point `(x, z)`.
    pub fn id(&self, x: i64, z: i64) -> Option<NodeId> {
        let side = self.points_per_side as i64;
        if x < 0 || z < 0 || x >= side || z >= side {
            return None;
        }
        Some(NodeId::from_index(self.base + (x * side + z) as usize))
    }

    pub fn len(&self) -> usize {
        self.points_per_side * self.points_per_side
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (self.base..self.base + self.len()).map(NodeId::from_index)
    }

    /// The four corners in order `(0,0)`, `(0,max)`, `(max,0)`, `(max,max)`.
    pub fn corners(&self) -> [NodeId; 4] {
        let last = self.points_per_side as i64 - 1;
        let at = |x: i64, z: i64| NodeId::from_index(self.base + (x * (last + 1) + z) as usize);
        [at(0, 0), at(0, last), at(last, 0), at(last, last)]
    }

    /// Turns the cloth 90° about the vertical axis through its centre,
    /// teleporting every node at rest, then publishes.
    pub fn rotate_quarter_turn(&self, processor: &mut dyn SpringProcessor) -> WeftResult<()> {
        let pivot = self.center;
        for id in self.ids() {
            let p = processor.node_position(id)?;
            let rotated = Vec3::new(pivot.x + (p.z - pivot.z), p.y, pivot.z - (p.x - pivot.x));
            processor.snap_node(id, rotated, false)?;
        }
        processor.sync_positions()
    }

    /// Mean position of the cloth's nodes.
    pub fn centroid(&self, processor: &dyn SpringProcessor) -> WeftResult<Vec3> {
        let mut sum = Vec3::ZERO;
        for id in self.ids() {
            sum += processor.node_position(id)?;
        }
        Ok(sum / self.len().max(1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_layout() {
        let cloth = RectangularCloth::new(Vec3::ZERO, 1.0, 1.0, 4).unwrap();
        assert_eq!(cloth.coord_to_index(0, 0), Some(0));
        assert_eq!(cloth.coord_to_index(0, 4), Some(4));
        assert_eq!(cloth.coord_to_index(1, 0), Some(5));
        assert_eq!(cloth.coord_to_index(4, 4), Some(24));
        assert_eq!(cloth.coord_to_index(5, 0), None);
        assert_eq!(cloth.coord_to_index(0, -1), None);
    }

    #[test]
    fn radius_below_half_step() {
        let cloth = RectangularCloth::new(Vec3::ZERO, 2.0, 1.0, 10).unwrap();
        assert!((cloth.node_radius() - 0.0475).abs() < 1e-6);
    }
}
