//! Pluggable event sinks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::Level;

use crate::events::{EventKind, SimulationEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Process every event of one tick. Defaults to [`handle`](Self::handle)
    /// per event.
    fn handle_batch(&mut self, events: &[SimulationEvent]) {
        for event in events {
            self.handle(event);
        }
    }

    /// Called once when the run ends.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

#[derive(Debug, Default)]
struct LogState {
    events: Vec<SimulationEvent>,
    batches: usize,
}

/// Shared view of the events collected by a [`VecSink`].
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    state: Arc<Mutex<LogState>>,
}

impl EventLog {
    /// A panic in another holder leaves the log readable.
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of every event received so far.
    pub fn events(&self) -> Vec<SimulationEvent> {
        self.lock().events.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tick batches received.
    pub fn batches(&self) -> usize {
        self.lock().batches
    }

    /// Events whose kind has the given label.
    pub fn with_label(&self, label: &str) -> Vec<SimulationEvent> {
        self.lock()
            .events
            .iter()
            .filter(|event| event.kind.label() == label)
            .cloned()
            .collect()
    }
}

/// Collects events in memory. Keep the [`EventLog`] from
/// [`VecSink::log`] to read them after the sink is boxed into a bus.
#[derive(Debug, Default)]
pub struct VecSink {
    log: EventLog,
    finalized: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        self.log.lock().events.push(event.clone());
    }

    fn handle_batch(&mut self, events: &[SimulationEvent]) {
        let mut state = self.log.lock();
        state.events.extend_from_slice(events);
        state.batches += 1;
    }

    fn finalize(&mut self) {
        self.finalized = true;
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing` at a fixed level.
///
/// A tick batch becomes one `tick` record carrying its timing, contact
/// and energy fields. Reset and custom events are logged on their own.
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

macro_rules! emit_at {
    ($level:expr, $($field:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!($($field)+)
        } else if level == Level::WARN {
            tracing::warn!($($field)+)
        } else if level == Level::INFO {
            tracing::info!($($field)+)
        } else if level == Level::DEBUG {
            tracing::debug!($($field)+)
        } else {
            tracing::trace!($($field)+)
        }
    }};
}

/// Fields of one tick folded from its events.
#[derive(Default)]
struct TickSummary {
    substeps: u32,
    wall_ms: f64,
    pairs_tested: u32,
    node_contacts: u32,
    static_contacts: u32,
    kinetic: f64,
    potential: f64,
    folded: usize,
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        emit_at!(
            self.level,
            tick = event.tick,
            event = event.kind.label(),
            "simulation_event"
        );
    }

    fn handle_batch(&mut self, events: &[SimulationEvent]) {
        let Some(first) = events.first() else {
            return;
        };
        let mut summary = TickSummary::default();
        for event in events {
            match event.kind {
                EventKind::TickBegin { .. } => summary.folded += 1,
                EventKind::TickEnd {
                    substeps,
                    wall_time,
                } => {
                    summary.substeps = substeps;
                    summary.wall_ms = wall_time * 1000.0;
                    summary.folded += 1;
                }
                EventKind::Contacts {
                    pairs_tested,
                    node_contacts,
                    static_contacts,
                } => {
                    summary.pairs_tested = pairs_tested;
                    summary.node_contacts = node_contacts;
                    summary.static_contacts = static_contacts;
                    summary.folded += 1;
                }
                EventKind::Energy { kinetic, potential } => {
                    summary.kinetic = kinetic;
                    summary.potential = potential;
                    summary.folded += 1;
                }
                EventKind::Reset | EventKind::Custom { .. } => self.handle(event),
            }
        }
        if summary.folded > 0 {
            emit_at!(
                self.level,
                tick = first.tick,
                substeps = summary.substeps,
                wall_ms = summary.wall_ms,
                pairs = summary.pairs_tested,
                node_contacts = summary.node_contacts,
                static_contacts = summary.static_contacts,
                kinetic = summary.kinetic,
                potential = summary.potential,
                "tick"
            );
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_log_stays_readable() {
        let mut sink = VecSink::new();
        let log = sink.log();
        sink.handle(&SimulationEvent::new(0, EventKind::Reset));

        let held = log.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.state.lock();
            panic!("holder panicked");
        })
        .join();
        assert!(log.state.is_poisoned());

        sink.handle(&SimulationEvent::new(1, EventKind::Reset));
        assert_eq!(log.len(), 2);
    }
}
