//! # weft-debug
//!
//! Inspection hooks, binary node-state snapshots and per-tick position
//! recordings that can be replayed onto any spring processor.

pub mod hooks;
pub mod recording;
pub mod snapshot;

pub use hooks::{InspectionHook, RecordingHook, TelemetryHook};
pub use recording::{Frame, Recording};
pub use snapshot::NodeSnapshot;
