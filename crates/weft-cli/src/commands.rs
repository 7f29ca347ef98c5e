//! CLI command implementations.

use std::path::Path;

use weft_bench::backend::create_processor;
use weft_bench::metrics::BenchmarkMetrics;
use weft_bench::runner::BenchmarkRunner;
use weft_bench::scenarios::{Scenario, ScenarioKind};
use weft_debug::{InspectionHook, NodeSnapshot, Recording, RecordingHook, TelemetryHook};
use weft_io::{validate_input, BackendKind, SimulationInput};
use weft_solver::{PhysicsConfig, SpringProcessor, TickReport};
use weft_telemetry::{EventBus, TracingSink};
use weft_types::WeftResult;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Telemetry to the log plus an optional position recording.
struct SimulateHook {
    telemetry: TelemetryHook,
    recording: Option<RecordingHook>,
}

impl InspectionHook for SimulateHook {
    fn on_tick_begin(&mut self, tick: u64, delta_time: f32) {
        self.telemetry.on_tick_begin(tick, delta_time);
    }

    fn on_tick_end(
        &mut self,
        tick: u64,
        report: &TickReport,
        processor: &dyn SpringProcessor,
    ) -> WeftResult<()> {
        self.telemetry.on_tick_end(tick, report, processor)?;
        if let Some(recording) = self.recording.as_mut() {
            recording.on_tick_end(tick, report, processor)?;
        }
        Ok(())
    }

    fn on_reset(&mut self, tick: u64) {
        self.telemetry.on_reset(tick);
        if let Some(recording) = self.recording.as_mut() {
            recording.on_reset(tick);
        }
    }

    fn on_run_end(&mut self) {
        self.telemetry.on_run_end();
        if let Some(recording) = self.recording.as_mut() {
            recording.on_run_end();
        }
    }

    fn name(&self) -> &str {
        "simulate"
    }
}

/// Run a simulation from a run file.
pub fn simulate(
    config_path: &str,
    backend: Option<&str>,
    ticks: Option<u32>,
    episodes: Option<u32>,
    verbose: bool,
) -> CliResult {
    let mut input = SimulationInput::from_path(Path::new(config_path))?;
    if let Some(name) = backend {
        input.backend = name.parse()?;
    }
    if let Some(ticks) = ticks {
        input.ticks = ticks;
    }
    if let Some(episodes) = episodes {
        input.episodes = episodes;
    }
    validate_input(&input)?;

    let scenario = Scenario::from_input(&input)?;
    let mut processor = create_processor(input.backend, input.physics.clone(), input.grid_size)?;

    println!("weft simulation");
    println!("───────────────");
    println!("Config:   {config_path}");
    println!(
        "Backend:  {} ({} nodes, {} springs, {} ticks x {} episodes)",
        input.backend,
        scenario.node_count(),
        scenario.damper_count(),
        scenario.ticks,
        scenario.episodes
    );
    println!();

    let mut bus = EventBus::new().with_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));
    bus.set_enabled(verbose);
    let mut hook = SimulateHook {
        telemetry: TelemetryHook::new(bus).with_energy(),
        recording: input
            .outputs
            .recording
            .as_ref()
            .map(|_| RecordingHook::new(input.delta_time, input.outputs.record_every)),
    };

    let metrics = BenchmarkRunner::run_with_hook(&scenario, processor.as_mut(), Some(&mut hook))?;
    print_metrics(&metrics);

    if let (Some(path), Some(recording)) = (
        input.outputs.recording.as_ref(),
        hook.recording.and_then(RecordingHook::into_recording),
    ) {
        recording.save(path)?;
        println!("Recording:  {} ({} frames)", path.display(), recording.len());
    }
    if let Some(path) = input.outputs.snapshot.as_ref() {
        let snapshot = NodeSnapshot::capture(
            processor.as_ref(),
            u64::from(input.ticks),
            f64::from(input.duration()),
        );
        std::fs::write(path, snapshot.to_bytes()?)?;
        println!("Snapshot:   {}", path.display());
    }
    if let Some(path) = input.outputs.metrics_csv.as_ref() {
        BenchmarkMetrics::write_csv(path, &[metrics])?;
        println!("Metrics:    {}", path.display());
    }
    Ok(())
}

fn print_metrics(metrics: &BenchmarkMetrics) {
    println!("  Wall time:     {:.3}s", metrics.total_wall_time);
    println!("  Avg tick:      {:.3}ms", metrics.avg_tick_time * 1000.0);
    println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
    println!("  Final PE:      {:.6e}", metrics.final_potential_energy);
    println!("  Max displace:  {:.4}m", metrics.max_displacement);
    println!(
        "  Contacts:      {} node, {} static",
        metrics.contacts.node_contacts, metrics.contacts.static_contacts
    );
    println!();
}

/// Run the benchmark suite.
pub fn benchmark(
    scenario_name: &str,
    backend: &str,
    ticks: Option<u32>,
    output_path: Option<&str>,
) -> CliResult {
    let backend: BackendKind = backend.parse()?;

    println!("weft benchmark suite");
    println!("════════════════════");
    println!("Backend: {backend}");
    println!();

    let kinds: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        match ScenarioKind::from_name(scenario_name) {
            Some(kind) => vec![kind],
            None => {
                let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
                return Err(format!(
                    "unknown scenario '{scenario_name}'. Available: {}, all",
                    available.join(", ")
                )
                .into());
            }
        }
    };

    let mut all_metrics = Vec::new();
    for kind in kinds {
        let mut scenario = Scenario::from_kind(kind)?;
        if let Some(ticks) = ticks {
            scenario.ticks = ticks;
        }
        println!(
            "Running: {} ({} nodes, {} springs, {} ticks)",
            kind.name(),
            scenario.node_count(),
            scenario.damper_count(),
            scenario.ticks,
        );

        let mut processor =
            create_processor(backend, scenario.physics.clone(), scenario.grid_size)?;
        let metrics = BenchmarkRunner::run(&scenario, processor.as_mut())
            .map_err(|e| format!("benchmark {} failed: {e}", kind.name()))?;
        print_metrics(&metrics);
        all_metrics.push(metrics);
    }

    if let Some(path) = output_path {
        BenchmarkMetrics::write_csv(Path::new(path), &all_metrics)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        print!("{}", BenchmarkMetrics::to_csv(&all_metrics));
    }
    Ok(())
}

/// Inspect a snapshot or a recording. A recording can be replayed onto
/// the cloth of its run file to trace the spring energy frame by frame.
pub fn inspect(path: &str, config_path: Option<&str>) -> CliResult {
    println!("weft inspector");
    println!("──────────────");
    println!();

    if path.ends_with(".json") {
        let recording = Recording::load(Path::new(path))?;
        println!("Recording:    {path}");
        println!("Backend:      {}", recording.backend);
        println!("Nodes:        {}", recording.node_count);
        println!("Springs:      {}", recording.dampers.len());
        println!("Frames:       {}", recording.len());
        println!("Delta time:   {:.4}s", recording.delta_time);
        if let Some(last) = recording.frames.last() {
            println!("Last tick:    {}", last.tick);
            print_y_range(last.positions.iter().map(|p| p.y));
        }
        if let Some(config_path) = config_path {
            replay_energy(&recording, config_path)?;
        }
    } else {
        let data = std::fs::read(path)?;
        let snapshot = NodeSnapshot::from_bytes(&data)?;
        println!("Snapshot:     {path}");
        println!("Tick:         {}", snapshot.tick);
        println!("Sim time:     {:.4}s", snapshot.time);
        println!("Nodes:        {}", snapshot.node_count());
        print_y_range(snapshot.positions.iter().map(|p| p.y));
        let max_speed = snapshot
            .velocities
            .iter()
            .map(|v| v.length())
            .fold(0.0f32, f32::max);
        println!("Max speed:    {max_speed:.4} m/s");
    }
    Ok(())
}

fn replay_energy(recording: &Recording, config_path: &str) -> CliResult {
    let input = SimulationInput::from_path(Path::new(config_path))?;
    let scenario = Scenario::from_input(&input)?;
    let mut processor = create_processor(BackendKind::Cpu, input.physics.clone(), input.grid_size)?;
    scenario.build(processor.as_mut())?;

    let mut peak = (0u64, 0.0f32);
    let mut last = 0.0f32;
    for (index, frame) in recording.frames.iter().enumerate() {
        recording.replay(processor.as_mut(), index)?;
        last = processor.potential_energy();
        if last > peak.1 {
            peak = (frame.tick, last);
        }
    }
    println!();
    println!("Replayed onto: {config_path}");
    println!("Peak PE:      {:.6e} (tick {})", peak.1, peak.0);
    println!("Final PE:     {last:.6e}");
    Ok(())
}

fn print_y_range(ys: impl Iterator<Item = f32>) {
    let (min_y, max_y) = ys.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    if min_y <= max_y {
        println!("Y range:      [{min_y:.4}, {max_y:.4}]");
    }
}

/// Validate a run file.
pub fn validate(path: &str) -> CliResult {
    println!("weft validator");
    println!("──────────────");
    println!();

    let input = SimulationInput::from_path(Path::new(path))?;
    match validate_input(&input) {
        Ok(()) => {
            println!(
                "✅ Run file is valid ({} backend, {} nodes, {} colliders, {} ticks).",
                input.backend,
                input.cloth.node_count(),
                input.colliders.len(),
                input.ticks
            );
            Ok(())
        }
        Err(e) => {
            println!("❌ Validation failed: {e}");
            Err(e.into())
        }
    }
}

/// Print the default run file, optionally with a physics preset.
pub fn print_config(preset: Option<&str>) -> CliResult {
    let mut input = SimulationInput::default();
    match preset {
        None | Some("default") => {}
        Some("stiff") => input.physics = PhysicsConfig::stiff(),
        Some("soft") => input.physics = PhysicsConfig::soft(),
        Some(other) => {
            return Err(format!("unknown preset '{other}'. Available: default, stiff, soft").into())
        }
    }
    print!("{}", input.to_toml_string()?);
    Ok(())
}
