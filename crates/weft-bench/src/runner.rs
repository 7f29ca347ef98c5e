//! Benchmark runner: drives a scenario on a processor and collects
//! metrics.

use std::time::Instant;

use weft_contact::ContactCounts;
use weft_debug::InspectionHook;
use weft_io::BackendKind;
use weft_solver::SpringProcessor;
use weft_types::WeftResult;

use crate::backend::create_processor;
use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Runs `scenario` on an empty `processor`.
    pub fn run(
        scenario: &Scenario,
        processor: &mut dyn SpringProcessor,
    ) -> WeftResult<BenchmarkMetrics> {
        Self::run_with_hook(scenario, processor, None)
    }

    /// Runs `scenario`, calling `hook` around every tick.
    ///
    /// Each episode after the first starts from a restarted cloth and is
    /// announced with `on_reset`. Tick numbers keep counting across
    /// episodes.
    pub fn run_with_hook(
        scenario: &Scenario,
        processor: &mut dyn SpringProcessor,
        mut hook: Option<&mut dyn InspectionHook>,
    ) -> WeftResult<BenchmarkMetrics> {
        let mut built = scenario.build(processor)?;
        let initial = processor.positions();

        let episodes = scenario.episodes.max(1);
        let total_ticks = u64::from(scenario.ticks) * u64::from(episodes);
        let mut tick_times: Vec<f64> = Vec::with_capacity(total_ticks as usize);
        let mut contacts = ContactCounts::default();
        let total_start = Instant::now();

        let mut tick = 0u64;
        for episode in 0..episodes {
            if episode > 0 {
                built.restart(scenario, processor)?;
                tracing::debug!(episode, tick, "episode restarted");
                if let Some(hook) = hook.as_deref_mut() {
                    hook.on_reset(tick);
                }
            }
            for _ in 0..scenario.ticks {
                if let Some((grab, velocity)) = built.grab.as_mut() {
                    grab.move_by(*velocity * scenario.delta_time);
                    grab.apply(processor)?;
                }
                if let Some(hook) = hook.as_deref_mut() {
                    hook.on_tick_begin(tick, scenario.delta_time);
                }

                let report =
                    processor.tick(scenario.delta_time, &scenario.spheres, &scenario.cuboids)?;
                tick_times.push(report.wall_time);
                contacts += report.contacts;

                if let Some(hook) = hook.as_deref_mut() {
                    hook.on_tick_end(tick, &report, &*processor)?;
                }
                tick += 1;
            }
        }
        if let Some(hook) = hook.as_deref_mut() {
            hook.on_run_end();
        }

        let total_wall_time = total_start.elapsed().as_secs_f64();

        let max_displacement = processor
            .positions()
            .iter()
            .zip(&initial)
            .map(|(now, start)| now.distance(*start))
            .fold(0.0f32, f32::max);

        let avg_tick_time = if tick_times.is_empty() {
            0.0
        } else {
            tick_times.iter().sum::<f64>() / tick_times.len() as f64
        };
        let min_tick_time = tick_times.iter().copied().fold(f64::MAX, f64::min);
        let max_tick_time = tick_times.iter().copied().fold(0.0, f64::max);

        let metrics = BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            backend: processor.name().to_string(),
            node_count: processor.node_count(),
            damper_count: processor.damper_count(),
            ticks: u32::try_from(tick_times.len()).unwrap_or(u32::MAX),
            total_wall_time,
            avg_tick_time,
            min_tick_time: if tick_times.is_empty() { 0.0 } else { min_tick_time },
            max_tick_time,
            final_kinetic_energy: f64::from(processor.kinetic_energy()),
            final_potential_energy: f64::from(processor.potential_energy()),
            max_displacement,
            contacts,
        };
        tracing::info!(
            scenario = %metrics.scenario,
            backend = %metrics.backend,
            ticks = metrics.ticks,
            avg_tick_ms = metrics.avg_tick_time * 1000.0,
            "scenario finished"
        );
        if let Some((grab, _)) = &built.grab {
            tracing::debug!(travel = %grab.travel(), "grab finished");
        }
        Ok(metrics)
    }

    /// Runs every canonical scenario on a fresh processor of `backend`.
    /// `ticks` overrides each scenario's tick count.
    pub fn run_all(backend: BackendKind, ticks: Option<u32>) -> WeftResult<Vec<BenchmarkMetrics>> {
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let mut scenario = Scenario::from_kind(kind)?;
            if let Some(ticks) = ticks {
                scenario.ticks = ticks;
            }
            let mut processor =
                create_processor(backend, scenario.physics.clone(), scenario.grid_size)?;
            results.push(Self::run(&scenario, processor.as_mut())?);
        }
        Ok(results)
    }
}
