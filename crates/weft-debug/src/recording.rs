//! Per-tick position recordings for replay.
//!
//! A [`Recording`] is a list of frames, each holding the published
//! position of every node after one tick. Recordings are stored as JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_solver::SpringProcessor;
use weft_types::{NodeId, WeftError, WeftResult};

/// Node positions after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub positions: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Name of the processor that produced the frames.
    pub backend: String,
    pub node_count: usize,
    /// Frame time used for every recorded tick.
    pub delta_time: f32,
    /// Damper endpoints, so a viewer can draw the cloth.
    pub dampers: Vec<(NodeId, NodeId)>,
    pub frames: Vec<Frame>,
}

impl Recording {
    /// Starts an empty recording shaped after `processor`.
    pub fn new(processor: &dyn SpringProcessor, delta_time: f32) -> Self {
        Self {
            backend: processor.name().to_string(),
            node_count: processor.node_count(),
            delta_time,
            dampers: processor.damper_endpoints(),
            frames: Vec::new(),
        }
    }

    /// Appends the published positions of `processor` as frame `tick`.
    pub fn capture(&mut self, processor: &dyn SpringProcessor, tick: u64) -> WeftResult<()> {
        let positions = processor.positions();
        if positions.len() != self.node_count {
            return Err(WeftError::InvalidTopology(format!(
                "recording expects {} nodes, got {}",
                self.node_count,
                positions.len()
            )));
        }
        self.frames.push(Frame { tick, positions });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Snaps every node of `processor` to frame `index` and publishes.
    pub fn replay(&self, processor: &mut dyn SpringProcessor, index: usize) -> WeftResult<()> {
        let frame = self.frames.get(index).ok_or_else(|| {
            WeftError::InvalidConfig(format!(
                "frame {index} out of range ({} frames)",
                self.frames.len()
            ))
        })?;
        if processor.node_count() != self.node_count {
            return Err(WeftError::InvalidTopology(format!(
                "recording has {} nodes, processor has {}",
                self.node_count,
                processor.node_count()
            )));
        }
        for (i, &position) in frame.positions.iter().enumerate() {
            processor.snap_node(NodeId::from_index(i), position, false)?;
        }
        processor.sync_positions()
    }

    pub fn to_json(&self) -> WeftResult<String> {
        serde_json::to_string(self).map_err(|e| WeftError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> WeftResult<Self> {
        serde_json::from_str(json).map_err(|e| WeftError::Serialization(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> WeftResult<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), frames = self.frames.len(), "recording saved");
        Ok(())
    }

    pub fn load(path: &Path) -> WeftResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
