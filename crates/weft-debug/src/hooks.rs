//! Inspection hooks for live debugging.
//!
//! Hooks are called by a run loop around every tick. They observe the
//! processor read-only. A run that plays several episodes resets the
//! processor between them and reports it through `on_reset`.
//!
//! ```text
//! for each tick:
//!   hook.on_tick_begin(..)
//!   processor.tick(..)
//!   hook.on_tick_end(..)
//! between episodes:
//!   hook.on_reset(..)
//! hook.on_run_end()
//! ```

use weft_solver::{SpringProcessor, TickReport};
use weft_telemetry::{EventBus, EventKind};
use weft_types::WeftResult;

use crate::recording::Recording;

pub trait InspectionHook: Send {
    fn on_tick_begin(&mut self, tick: u64, delta_time: f32) {
        let _ = (tick, delta_time);
    }

    /// Called after `processor` finished tick `tick`.
    fn on_tick_end(
        &mut self,
        tick: u64,
        report: &TickReport,
        processor: &dyn SpringProcessor,
    ) -> WeftResult<()> {
        let _ = (tick, report, processor);
        Ok(())
    }

    fn on_reset(&mut self, tick: u64) {
        let _ = tick;
    }

    fn on_run_end(&mut self) {}

    fn name(&self) -> &str;
}

/// Records tick lifecycle calls on an [`EventBus`], closing the bus's
/// batch at the end of every tick.
#[derive(Default)]
pub struct TelemetryHook {
    bus: EventBus,
    /// Also record an energy event after every tick.
    with_energy: bool,
}

impl TelemetryHook {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            with_energy: false,
        }
    }

    pub fn with_energy(mut self) -> Self {
        self.with_energy = true;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }
}

impl InspectionHook for TelemetryHook {
    fn on_tick_begin(&mut self, tick: u64, delta_time: f32) {
        self.bus.record(tick, EventKind::TickBegin { delta_time });
    }

    fn on_tick_end(
        &mut self,
        tick: u64,
        report: &TickReport,
        processor: &dyn SpringProcessor,
    ) -> WeftResult<()> {
        let contacts = &report.contacts;
        self.bus.record(
            tick,
            EventKind::Contacts {
                pairs_tested: contacts.pairs_tested,
                node_contacts: contacts.node_contacts,
                static_contacts: contacts.static_contacts,
            },
        );
        if self.with_energy {
            self.bus.record(
                tick,
                EventKind::Energy {
                    kinetic: f64::from(processor.kinetic_energy()),
                    potential: f64::from(processor.potential_energy()),
                },
            );
        }
        self.bus.record(
            tick,
            EventKind::TickEnd {
                substeps: report.substeps,
                wall_time: report.wall_time,
            },
        );
        self.bus.close_tick();
        Ok(())
    }

    fn on_reset(&mut self, tick: u64) {
        self.bus.record(tick, EventKind::Reset);
        self.bus.close_tick();
    }

    fn on_run_end(&mut self) {
        self.bus.finish();
    }

    fn name(&self) -> &str {
        "telemetry_hook"
    }
}

/// Captures a frame every `every` ticks. The recording is shaped after
/// the processor the first time a frame is captured.
pub struct RecordingHook {
    recording: Option<Recording>,
    delta_time: f32,
    every: u64,
}

impl RecordingHook {
    pub fn new(delta_time: f32, every: u64) -> Self {
        Self {
            recording: None,
            delta_time,
            every: every.max(1),
        }
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    pub fn into_recording(self) -> Option<Recording> {
        self.recording
    }
}

impl InspectionHook for RecordingHook {
    fn on_tick_end(
        &mut self,
        tick: u64,
        _report: &TickReport,
        processor: &dyn SpringProcessor,
    ) -> WeftResult<()> {
        if tick % self.every != 0 {
            return Ok(());
        }
        let delta_time = self.delta_time;
        self.recording
            .get_or_insert_with(|| Recording::new(processor, delta_time))
            .capture(processor, tick)
    }

    fn name(&self) -> &str {
        "recording_hook"
    }
}
