//! Integration tests for weft-bench.

use glam::Vec3;
use weft_bench::backend::create_processor;
use weft_bench::cloth::RectangularCloth;
use weft_bench::grab::Grab;
use weft_bench::metrics::BenchmarkMetrics;
use weft_bench::runner::BenchmarkRunner;
use weft_bench::scenarios::{Scenario, ScenarioKind};
use weft_debug::TelemetryHook;
use weft_gpu::GpuSpringProcessor;
use weft_io::{BackendKind, SimulationInput};
use weft_solver::{CpuSpringProcessor, IntegrationType, PhysicsConfig, SpringProcessor};
use weft_telemetry::{EventBus, VecSink};
use weft_types::NodeId;

fn cpu() -> CpuSpringProcessor {
    CpuSpringProcessor::new(PhysicsConfig::default(), 0.1).unwrap()
}

fn approx_vec(a: Vec3, b: Vec3, tol: f32) -> bool {
    (a - b).abs().max_element() <= tol
}

// ─── Cloth Tests ──────────────────────────────────────────────

#[test]
fn cloth_topology_counts() {
    let cloth = RectangularCloth::new(Vec3::new(0.0, 1.0, 0.0), 1.0, 1.0, 4).unwrap();
    assert_eq!(cloth.node_count(), 25);
    // 40 elastic + 32 shear + 30 bend
    assert_eq!(cloth.damper_count(), 102);

    let mut p = cpu();
    let nodes = cloth.build(&mut p).unwrap();
    assert_eq!(p.node_count(), 25);
    assert_eq!(p.damper_count(), 102);
    assert_eq!(nodes.len(), 25);
    assert_eq!(nodes.id(1, 0), Some(NodeId(5)));
    assert_eq!(nodes.id(0, 5), None);
}

#[test]
fn cloth_lies_in_xz_plane_around_center() {
    let center = Vec3::new(0.5, 2.0, -1.0);
    let cloth = RectangularCloth::new(center, 2.0, 1.0, 2).unwrap();
    let mut p = cpu();
    let nodes = cloth.build(&mut p).unwrap();
    p.finalize_topology().unwrap();

    let [a, b, c, d] = nodes.corners();
    assert_eq!(p.node_position(a).unwrap(), Vec3::new(-0.5, 2.0, -1.5));
    assert_eq!(p.node_position(b).unwrap(), Vec3::new(-0.5, 2.0, -0.5));
    assert_eq!(p.node_position(c).unwrap(), Vec3::new(1.5, 2.0, -1.5));
    assert_eq!(p.node_position(d).unwrap(), Vec3::new(1.5, 2.0, -0.5));
    assert!(approx_vec(nodes.centroid(&p).unwrap(), center, 1e-5));
}

#[test]
fn cloth_springs_start_at_rest_length() {
    let cloth = RectangularCloth::new(Vec3::ZERO, 1.0, 0.5, 5).unwrap();
    let mut p = cpu();
    cloth.build(&mut p).unwrap();
    p.finalize_topology().unwrap();
    assert!(p.potential_energy() < 1e-6);
    for (first, second) in p.damper_endpoints() {
        assert_ne!(first, second);
    }
}

#[test]
fn cloths_share_one_processor() {
    let small = RectangularCloth::new(Vec3::ZERO, 1.0, 1.0, 2).unwrap();
    let mut p = cpu();
    let first = small.build(&mut p).unwrap();
    let second = small.build(&mut p).unwrap();
    assert_eq!(first.base, 0);
    assert_eq!(second.base, 9);
    assert_eq!(second.id(0, 0), Some(NodeId(9)));
    assert_eq!(p.damper_count(), 2 * small.damper_count());
}

#[test]
fn cloth_builds_identically_on_gpu() {
    let cloth = RectangularCloth::new(Vec3::ZERO, 1.0, 1.0, 6).unwrap();
    let mut c = cpu();
    let mut g = GpuSpringProcessor::with_cpu_fallback(PhysicsConfig::default()).unwrap();
    cloth.build(&mut c).unwrap();
    cloth.build(&mut g).unwrap();
    assert_eq!(c.damper_endpoints(), g.damper_endpoints());
    assert_eq!(c.positions(), g.positions());
}

#[test]
fn four_quarter_turns_return_home() {
    let cloth = RectangularCloth::new(Vec3::new(1.0, 0.5, 2.0), 1.0, 1.0, 3).unwrap();
    let mut p = cpu();
    let nodes = cloth.build(&mut p).unwrap();
    p.finalize_topology().unwrap();
    let start = p.positions();

    nodes.rotate_quarter_turn(&mut p).unwrap();
    let [a, ..] = nodes.corners();
    // (-0.5, -0.5) from the centre turns to (-0.5, +0.5).
    assert!(approx_vec(p.node_position(a).unwrap(), Vec3::new(0.5, 0.5, 2.5), 1e-5));

    for _ in 0..3 {
        nodes.rotate_quarter_turn(&mut p).unwrap();
    }
    for (now, then) in p.positions().iter().zip(&start) {
        assert!(approx_vec(*now, *then, 1e-5));
    }
}

// ─── Grab Tests ───────────────────────────────────────────────

#[test]
fn grab_keeps_offsets() {
    let mut p = cpu();
    let a = p.add_node(Vec3::new(-1.0, 0.0, 0.0), 0.05).unwrap();
    let b = p.add_node(Vec3::new(1.0, 0.0, 0.0), 0.05).unwrap();
    p.finalize_topology().unwrap();

    let mut grab = Grab::around_centroid(&p, vec![a, b]).unwrap();
    assert_eq!(grab.anchor(), Vec3::ZERO);
    grab.move_to(Vec3::Y);
    let targets: Vec<_> = grab.targets().collect();
    assert_eq!(targets, vec![(a, Vec3::new(-1.0, 1.0, 0.0)), (b, Vec3::new(1.0, 1.0, 0.0))]);
    assert!(Grab::new(&p, Vec::new(), Vec3::ZERO).is_err());
}

#[test]
fn grab_steers_by_velocity() {
    let mut p = cpu();
    let id = p.add_node(Vec3::ZERO, 0.05).unwrap();
    p.finalize_topology().unwrap();

    let mut grab = Grab::new(&p, vec![id], Vec3::ZERO).unwrap();
    grab.move_by(Vec3::new(0.0, 0.1, 0.0));
    grab.apply(&mut p).unwrap();
    // Reaches the target within one fixed tick.
    assert!(approx_vec(p.node_velocity(id).unwrap(), Vec3::new(0.0, 5.0, 0.0), 1e-4));
    assert_eq!(p.node_position(id).unwrap(), Vec3::ZERO);
}

// ─── Scenario Tests ───────────────────────────────────────────

#[test]
fn scenario_setups() {
    assert_eq!(ScenarioKind::all().len(), 4);
    for &kind in ScenarioKind::all() {
        let s = Scenario::from_kind(kind).unwrap();
        assert_eq!(s.kind, kind);
        assert_eq!(ScenarioKind::from_name(kind.name()), Some(kind));
        assert!(s.ticks > 0);
    }
    assert_eq!(Scenario::sphere_drape().unwrap().node_count(), 441);
    assert_eq!(Scenario::pile().unwrap().cloths.len(), 2);
    assert!(Scenario::grab().unwrap().grab.is_some());
    assert_eq!(ScenarioKind::from_name("custom"), None);
}

#[test]
fn scenario_from_input() {
    let mut input = SimulationInput::default();
    input.cloth.divisions = 3;
    input.cloth.quarter_turn = true;
    input.ticks = 4;
    let s = Scenario::from_input(&input).unwrap();
    assert_eq!(s.kind, ScenarioKind::Custom);
    assert_eq!(s.node_count(), 16);
    assert_eq!(s.spheres.len(), 1);
    assert!(s.quarter_turn);

    let mut p = cpu();
    let metrics = BenchmarkRunner::run(&s, &mut p).unwrap();
    assert_eq!(metrics.ticks, 4);
    assert_eq!(metrics.node_count, 16);
}

// ─── Runner Tests ─────────────────────────────────────────────

#[test]
fn sphere_drape_does_not_penetrate() {
    let scenario = Scenario::sphere_drape().unwrap().with_ticks(60);
    let mut p = cpu();
    let metrics = BenchmarkRunner::run(&scenario, &mut p).unwrap();

    assert_eq!(metrics.scenario, "sphere_drape");
    assert_eq!(metrics.backend, "cpu");
    assert!(metrics.contacts.static_contacts > 0);
    assert!(metrics.max_displacement > 0.1);

    let sphere = scenario.spheres[0];
    let radius = scenario.cloths[0].node_radius();
    for position in p.positions() {
        assert!(position.distance(sphere.center) >= sphere.radius + radius - 0.02);
    }
}

#[test]
fn grab_lifts_corners() {
    let scenario = Scenario::grab().unwrap().with_ticks(40);
    let mut p = cpu();
    BenchmarkRunner::run(&scenario, &mut p).unwrap();
    // Two corners rose with the anchor; the opposite ones stayed low.
    let corners = [NodeId(16), NodeId(16 * 17 + 16)];
    for id in corners {
        assert!(p.node_position(id).unwrap().y > 0.3);
    }
    assert!(p.node_position(NodeId(0)).unwrap().y < 0.2);
}

#[test]
fn pile_produces_node_contacts_on_cpu_only() {
    let scenario = Scenario::pile().unwrap().with_ticks(60);
    let mut c = cpu();
    let on_cpu = BenchmarkRunner::run(&scenario, &mut c).unwrap();
    assert!(on_cpu.contacts.node_contacts > 0);

    let mut g = create_processor(BackendKind::GpuFallback, scenario.physics.clone(), 0.1).unwrap();
    let on_gpu = BenchmarkRunner::run(&scenario, g.as_mut()).unwrap();
    assert_eq!(on_gpu.contacts.node_contacts, 0);
    assert_eq!(on_gpu.backend, "gpu");
    assert!(on_gpu.contacts.static_contacts > 0);
}

#[test]
fn runner_drives_hooks() {
    let scenario = Scenario::table_drape().unwrap().with_ticks(3);
    let mut p = cpu();
    let sink = VecSink::new();
    let log = sink.log();
    let mut hook = TelemetryHook::new(EventBus::new().with_sink(Box::new(sink)));
    BenchmarkRunner::run_with_hook(&scenario, &mut p, Some(&mut hook)).unwrap();
    let events = log.events();
    assert_eq!(events.len(), 9);
    assert_eq!(events.last().unwrap().tick, 2);
    assert_eq!(log.batches(), 3);
}

#[test]
fn episodes_reset_between_runs() {
    let scenario = Scenario::grab().unwrap().with_ticks(5).with_episodes(2);
    let mut p = cpu();
    let sink = VecSink::new();
    let log = sink.log();
    let mut hook = TelemetryHook::new(EventBus::new().with_sink(Box::new(sink)));
    let metrics = BenchmarkRunner::run_with_hook(&scenario, &mut p, Some(&mut hook)).unwrap();

    assert_eq!(metrics.ticks, 10);
    let resets = log.with_label("reset");
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0].tick, 5);
    assert_eq!(log.events().last().unwrap().tick, 9);
}

#[test]
fn restart_returns_to_built_state() {
    let mut scenario = Scenario::grab().unwrap();
    scenario.quarter_turn = true;
    let mut p = cpu();
    let mut built = scenario.build(&mut p).unwrap();
    let start = p.positions();

    for _ in 0..4 {
        if let Some((grab, velocity)) = built.grab.as_mut() {
            grab.move_by(*velocity * scenario.delta_time);
            grab.apply(&mut p).unwrap();
        }
        p.tick(scenario.delta_time, &scenario.spheres, &scenario.cuboids).unwrap();
    }
    assert_ne!(p.positions(), start);

    built.restart(&scenario, &mut p).unwrap();
    for (now, then) in p.positions().iter().zip(&start) {
        assert!(approx_vec(*now, *then, 1e-5));
    }
    assert_eq!(p.kinetic_energy(), 0.0);
    let (grab, _) = built.grab.as_ref().unwrap();
    assert_eq!(grab.travel(), Vec3::ZERO);
}

#[test]
fn run_all_on_cpu_fallback() {
    let results = BenchmarkRunner::run_all(BackendKind::GpuFallback, Some(2)).unwrap();
    assert_eq!(results.len(), 4);
    for (metrics, kind) in results.iter().zip(ScenarioKind::all()) {
        assert_eq!(metrics.scenario, kind.name());
        assert_eq!(metrics.ticks, 2);
    }
}

// ─── Backend Tests ────────────────────────────────────────────

#[test]
fn flat_backends_switch_to_euler() {
    let p = create_processor(BackendKind::GpuFallback, PhysicsConfig::default(), 0.1).unwrap();
    assert_eq!(p.physics().integration_type, IntegrationType::ExplicitEuler);
    assert!(!p.capabilities().node_collisions);

    let p = create_processor(BackendKind::Cpu, PhysicsConfig::default(), 0.1).unwrap();
    assert_eq!(p.physics().integration_type, IntegrationType::VelocityVerlet);
}

#[cfg(not(feature = "wgpu"))]
#[test]
fn wgpu_needs_feature() {
    assert!(create_processor(BackendKind::Wgpu, PhysicsConfig::default(), 0.1).is_err());
}

// ─── Metrics Tests ────────────────────────────────────────────

#[test]
fn csv_rows_match_header() {
    let scenario = Scenario::table_drape().unwrap().with_ticks(2);
    let mut p = cpu();
    let metrics = BenchmarkRunner::run(&scenario, &mut p).unwrap();
    let csv = BenchmarkMetrics::to_csv(&[metrics.clone(), metrics]);
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    let columns = lines[0].split(',').count();
    assert!(lines.iter().all(|l| l.split(',').count() == columns));
    assert!(lines[1].starts_with("table_drape,cpu,441,"));
}

#[test]
fn metrics_serialize() {
    let scenario = Scenario::grab().unwrap().with_ticks(1);
    let mut p = cpu();
    let metrics = BenchmarkRunner::run(&scenario, &mut p).unwrap();
    let json = serde_json::to_string(&metrics).unwrap();
    let back: BenchmarkMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(back.node_count, 17 * 17);
}
