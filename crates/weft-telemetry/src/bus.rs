//! Event bus: per-tick batches delivered to pluggable sinks.
//!
//! Every event carries the tick it describes. The bus keeps the events of
//! the open tick together and hands them to each sink as one batch when
//! the tick is closed, either explicitly with [`EventBus::close_tick`] or
//! implicitly when an event for a different tick arrives. Sinks therefore
//! see whole ticks, in the order they were recorded.
//!
//! ```text
//! bus.record(tick, EventKind::TickBegin { .. });
//! bus.record(tick, EventKind::Contacts { .. });
//! bus.record(tick, EventKind::TickEnd { .. });
//! bus.close_tick();   // sinks receive [TickBegin, Contacts, TickEnd]
//! ```

use crate::events::{EventKind, SimulationEvent};
use crate::sinks::EventSink;

/// Batching event bus for simulation telemetry.
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
    /// Events of the open tick, in recording order.
    batch: Vec<SimulationEvent>,
    /// Disabled bus is a no-op.
    enabled: bool,
    recorded: u64,
    delivered_ticks: u64,
}

impl EventBus {
    /// Creates an enabled bus with no sinks.
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            batch: Vec::new(),
            enabled: true,
            recorded: 0,
            delivered_ticks: 0,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Enables or disables the bus. A disabled bus drops events silently.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records `kind` for `tick`.
    pub fn record(&mut self, tick: u64, kind: EventKind) {
        self.emit(SimulationEvent::new(tick, kind));
    }

    /// Adds an event to the open tick. An event for another tick closes
    /// the open one first.
    pub fn emit(&mut self, event: SimulationEvent) {
        if !self.enabled {
            return;
        }
        if self.open_tick().is_some_and(|tick| tick != event.tick) {
            self.close_tick();
        }
        self.batch.push(event);
        self.recorded += 1;
    }

    /// Tick whose events are waiting for delivery, if any.
    pub fn open_tick(&self) -> Option<u64> {
        self.batch.first().map(|event| event.tick)
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Delivers the open tick to every sink. Returns the number of events
    /// delivered; zero if no tick was open.
    pub fn close_tick(&mut self) -> usize {
        if self.batch.is_empty() {
            return 0;
        }
        for sink in &mut self.sinks {
            sink.handle_batch(&self.batch);
        }
        self.delivered_ticks += 1;
        let delivered = self.batch.len();
        self.batch.clear();
        delivered
    }

    /// Closes the open tick, then lets every sink finish.
    pub fn finish(&mut self) {
        self.close_tick();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Events accepted while enabled.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// Batches handed to the sinks so far.
    pub fn delivered_ticks(&self) -> u64 {
        self.delivered_ticks
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
