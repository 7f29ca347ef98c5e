//! Magnetic grab: pins a group of nodes to a moving anchor.
//!
//! Each grabbed node keeps the offset it had from the anchor when the
//! grab started. Every tick the nodes are snapped with
//! `update_velocity = true`, so they are pulled along by velocity rather
//! than teleported and the springs around them react.

use glam::Vec3;
use weft_solver::SpringProcessor;
use weft_types::{NodeId, WeftError, WeftResult};

#[derive(Debug, Clone)]
pub struct Grab {
    nodes: Vec<NodeId>,
    offsets: Vec<Vec3>,
    start: Vec3,
    anchor: Vec3,
}

impl Grab {
    /// Grabs `nodes` relative to `anchor`.
    pub fn new(processor: &dyn SpringProcessor, nodes: Vec<NodeId>, anchor: Vec3) -> WeftResult<Self> {
        if nodes.is_empty() {
            return Err(WeftError::InvalidConfig("grab needs at least one node".into()));
        }
        let offsets = nodes
            .iter()
            .map(|&id| processor.node_position(id).map(|p| p - anchor))
            .collect::<WeftResult<Vec<_>>>()?;
        Ok(Self {
            nodes,
            offsets,
            start: anchor,
            anchor,
        })
    }

    /// Grabs `nodes` around their centroid.
    pub fn around_centroid(processor: &dyn SpringProcessor, nodes: Vec<NodeId>) -> WeftResult<Self> {
        let mut sum = Vec3::ZERO;
        for &id in &nodes {
            sum += processor.node_position(id)?;
        }
        let anchor = sum / nodes.len().max(1) as f32;
        Self::new(processor, nodes, anchor)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Distance the anchor has travelled since the grab started.
    pub fn travel(&self) -> Vec3 {
        self.anchor - self.start
    }

    pub fn move_to(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    pub fn move_by(&mut self, delta: Vec3) {
        self.anchor += delta;
    }

    /// Puts the anchor back where the grab started.
    pub fn reset(&mut self) {
        self.anchor = self.start;
    }

    /// Target position of every grabbed node for the current anchor.
    pub fn targets(&self) -> impl Iterator<Item = (NodeId, Vec3)> + '_ {
        self.nodes
            .iter()
            .zip(&self.offsets)
            .map(|(&id, &offset)| (id, self.anchor + offset))
    }

    /// Steers every grabbed node towards its target. Call once per tick,
    /// before the tick.
    pub fn apply(&self, processor: &mut dyn SpringProcessor) -> WeftResult<()> {
        for (id, target) in self.targets() {
            processor.snap_node(id, target, true)?;
        }
        Ok(())
    }
}
