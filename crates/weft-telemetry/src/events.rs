//! Simulation event types.
//!
//! Events are small value types tagged with the tick they belong to.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by a runner or processor wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Tick number (0-indexed).
    pub tick: u64,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A tick is about to run.
    TickBegin {
        /// Frame time handed to the processor (seconds).
        delta_time: f32,
    },

    /// A tick completed.
    TickEnd {
        /// Sub-steps run inside the tick.
        substeps: u32,
        /// Wall-clock time for the whole tick (seconds).
        wall_time: f64,
    },

    /// Collision resolution summary for one tick.
    Contacts {
        pairs_tested: u32,
        node_contacts: u32,
        static_contacts: u32,
    },

    /// Energy snapshot after a tick.
    Energy {
        kinetic: f64,
        /// Elastic energy stored in the springs.
        potential: f64,
    },

    /// Every node was returned to its start position.
    Reset,

    /// Free-form event.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl EventKind {
    /// Short stable name, used as a log field and CSV column value.
    pub fn label(&self) -> &str {
        match self {
            EventKind::TickBegin { .. } => "tick_begin",
            EventKind::TickEnd { .. } => "tick_end",
            EventKind::Contacts { .. } => "contacts",
            EventKind::Energy { .. } => "energy",
            EventKind::Reset => "reset",
            EventKind::Custom { label, .. } => label,
        }
    }
}

impl SimulationEvent {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }
}
