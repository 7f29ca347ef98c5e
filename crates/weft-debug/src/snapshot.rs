//! Binary snapshots of node state.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_solver::SpringProcessor;
use weft_types::{NodeId, WeftError, WeftResult};

/// Positions and velocities of every node at one tick.
///
/// Serialized with `bincode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub tick: u64,
    /// Simulated time in seconds.
    pub time: f64,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

impl NodeSnapshot {
    /// Reads the published state of `processor`.
    pub fn capture(processor: &dyn SpringProcessor, tick: u64, time: f64) -> Self {
        Self {
            tick,
            time,
            positions: processor.positions(),
            velocities: processor.velocities(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Largest per-node distance between two snapshots of the same cloth.
    pub fn max_displacement(&self, other: &NodeSnapshot) -> WeftResult<f32> {
        if self.node_count() != other.node_count() {
            return Err(WeftError::InvalidTopology(format!(
                "snapshots differ in node count ({} vs {})",
                self.node_count(),
                other.node_count()
            )));
        }
        Ok(self
            .positions
            .iter()
            .zip(&other.positions)
            .map(|(a, b)| a.distance(*b))
            .fold(0.0, f32::max))
    }

    /// Teleports every node to its snapshot position at rest and
    /// publishes. Velocities are not restored.
    pub fn restore(&self, processor: &mut dyn SpringProcessor) -> WeftResult<()> {
        if self.node_count() != processor.node_count() {
            return Err(WeftError::InvalidTopology(format!(
                "snapshot has {} nodes, processor has {}",
                self.node_count(),
                processor.node_count()
            )));
        }
        for (index, &position) in self.positions.iter().enumerate() {
            processor.snap_node(NodeId::from_index(index), position, false)?;
        }
        processor.sync_positions()
    }

    pub fn to_bytes(&self) -> WeftResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| WeftError::Serialization(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> WeftResult<Self> {
        bincode::deserialize(data).map_err(|e| WeftError::Serialization(e.to_string()))
    }
}
