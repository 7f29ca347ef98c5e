//! # weft-telemetry
//!
//! Simulation telemetry. Runners record tick timing, contact and energy
//! events on an [`EventBus`], which delivers them to pluggable sinks one
//! tick at a time.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventLog, EventSink, TracingSink, VecSink};
