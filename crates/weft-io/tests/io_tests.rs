//! Integration tests for weft-io.

use glam::Vec3;
use weft_io::contract::{BackendKind, ColliderSpec, SimulationInput};
use weft_io::validator::validate_input;
use weft_solver::IntegrationType;
use weft_types::WeftError;

fn assert_invalid(input: &SimulationInput) {
    assert!(
        matches!(validate_input(input), Err(WeftError::InvalidConfig(_))),
        "expected rejection: {input:?}"
    );
}

// ─── Contract Tests ───────────────────────────────────────────

#[test]
fn default_input_is_valid() {
    let input = SimulationInput::default();
    validate_input(&input).unwrap();
    assert_eq!(input.backend, BackendKind::Cpu);
    assert_eq!(input.cloth.node_count(), 21 * 21);
    assert_eq!(input.spheres().len(), 1);
    assert!(input.cuboids().is_empty());
}

#[test]
fn partial_toml_fills_defaults() {
    let input = SimulationInput::from_toml_str(
        r#"
        backend = "gpu_fallback"
        ticks = 10

        [physics]
        integration_type = "explicit_euler"
        damping = 20.0

        [cloth]
        divisions = 4

        [[colliders]]
        shape = "cuboid"
        minimum = [-1.0, -0.2, -1.0]
        maximum = [1.0, 0.0, 1.0]
        "#,
    )
    .unwrap();

    assert_eq!(input.backend, BackendKind::GpuFallback);
    assert_eq!(input.ticks, 10);
    assert_eq!(input.physics.integration_type, IntegrationType::ExplicitEuler);
    assert_eq!(input.physics.damping, 20.0);
    assert_eq!(input.physics.delta_time_divisor, 20);
    assert_eq!(input.cloth.node_count(), 25);
    assert_eq!(input.cloth.width, 1.0);
    assert_eq!(input.cuboids().len(), 1);
    assert!(input.spheres().is_empty());
    validate_input(&input).unwrap();
}

#[test]
fn toml_round_trip() {
    let mut input = SimulationInput::default();
    input.colliders.push(ColliderSpec::Cuboid {
        minimum: Vec3::new(-2.0, -1.0, -2.0),
        maximum: Vec3::new(2.0, 0.0, 2.0),
    });
    input.outputs.metrics_csv = Some("metrics.csv".into());
    let text = input.to_toml_string().unwrap();
    let recovered = SimulationInput::from_toml_str(&text).unwrap();
    assert_eq!(recovered, input);
}

#[test]
fn malformed_toml_is_a_serialization_error() {
    assert!(matches!(
        SimulationInput::from_toml_str("ticks = \"many\""),
        Err(WeftError::Serialization(_))
    ));
}

#[test]
fn backend_names_parse() {
    for kind in BackendKind::ALL {
        assert_eq!(kind.name().parse::<BackendKind>().unwrap(), kind);
    }
    assert!("vulkan".parse::<BackendKind>().is_err());
    assert!(BackendKind::Wgpu.is_flat());
    assert!(!BackendKind::Cpu.is_flat());
}

#[test]
fn input_json_round_trip() {
    let input = SimulationInput::default();
    let json = serde_json::to_string(&input).unwrap();
    let recovered: SimulationInput = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, input);
}

// ─── Validator Tests ──────────────────────────────────────────

#[test]
fn rejects_bad_run_parameters() {
    let mut input = SimulationInput::default();
    input.ticks = 0;
    assert_invalid(&input);

    let mut input = SimulationInput::default();
    input.episodes = 0;
    assert_invalid(&input);

    let mut input = SimulationInput::default();
    input.delta_time = 0.0;
    assert_invalid(&input);

    let mut input = SimulationInput::default();
    input.grid_size = -0.1;
    assert_invalid(&input);

    let mut input = SimulationInput::default();
    input.outputs.record_every = 0;
    assert_invalid(&input);
}

#[test]
fn rejects_bad_physics() {
    let mut input = SimulationInput::default();
    input.physics.inverse_mass = 0.0;
    assert_invalid(&input);
}

#[test]
fn rejects_bad_cloth() {
    let mut input = SimulationInput::default();
    input.cloth.divisions = 0;
    assert_invalid(&input);

    let mut input = SimulationInput::default();
    input.cloth.width = 0.0;
    assert_invalid(&input);

    let mut input = SimulationInput::default();
    input.cloth.center = Vec3::new(f32::NAN, 0.0, 0.0);
    assert_invalid(&input);
}

#[test]
fn rejects_bad_colliders() {
    let mut input = SimulationInput::default();
    input.colliders = vec![ColliderSpec::Sphere {
        center: Vec3::ZERO,
        radius: 0.0,
    }];
    assert_invalid(&input);

    input.colliders = vec![ColliderSpec::Cuboid {
        minimum: Vec3::ONE,
        maximum: Vec3::new(2.0, 1.0, 2.0),
    }];
    assert_invalid(&input);
}

#[test]
fn no_colliders_is_fine() {
    let mut input = SimulationInput::default();
    input.colliders.clear();
    validate_input(&input).unwrap();
    assert!((input.duration() - 3.0).abs() < 1e-5);
}
