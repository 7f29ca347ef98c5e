//! Integration tests for weft-solver.

use glam::Vec3;
use weft_contact::{ImmovableCuboid, ImmovableSphere};
use weft_solver::config::{DamperType, IntegrationType, PhysicsConfig};
use weft_solver::damper::spring_damper_force;
use weft_solver::integrator::{ExplicitEuler, IntegrationState, Integrator, Rk4, VelocityVerlet};
use weft_solver::node::SpringNode;
use weft_solver::{CpuSpringProcessor, NodeHandle, SpringProcessor};
use weft_types::{NodeId, WeftError};

fn approx(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}

fn approx_vec(a: Vec3, b: Vec3, tol: f32) -> bool {
    (a - b).abs().max_element() <= tol
}

fn weightless(integration_type: IntegrationType) -> PhysicsConfig {
    PhysicsConfig {
        gravity_multiplier: 0.0,
        integration_type,
        ..Default::default()
    }
}

fn processor(config: PhysicsConfig) -> CpuSpringProcessor {
    CpuSpringProcessor::new(config, 0.1).unwrap()
}

const DT: f32 = 1.0 / 50.0;

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn config_defaults() {
    let c = PhysicsConfig::default();
    assert_eq!(c.delta_time_divisor, 20);
    assert_eq!(c.integration_type, IntegrationType::VelocityVerlet);
    assert_eq!(c.spring_constant_for(DamperType::Elastic), 5400.0);
    assert_eq!(c.spring_constant_for(DamperType::Shear), 3000.0);
    assert_eq!(c.spring_constant_for(DamperType::Bend), 2400.0);
    assert_eq!(c.spring_constant_for(DamperType::MeshElastic), 2400.0);
    assert_eq!(c.spring_constant_for(DamperType::MeshShear), 2400.0);
    assert!(approx(c.gravity().y, -9.81 * 0.25, 1e-6));
    assert!(c.validate().is_ok());
}

#[test]
fn config_presets_are_valid() {
    assert!(PhysicsConfig::stiff().validate().is_ok());
    assert!(PhysicsConfig::soft().validate().is_ok());
    assert!(
        PhysicsConfig::stiff().elastic_spring_constant
            > PhysicsConfig::soft().elastic_spring_constant
    );
}

#[test]
fn config_rejects_out_of_range() {
    let cases = [
        PhysicsConfig { restitution: 1.5, ..Default::default() },
        PhysicsConfig { friction: -0.1, ..Default::default() },
        PhysicsConfig { delta_time_divisor: 0, ..Default::default() },
        PhysicsConfig { delta_time_divisor: 31, ..Default::default() },
        PhysicsConfig { inverse_mass: 0.0, ..Default::default() },
        PhysicsConfig { damping: f32::NAN, ..Default::default() },
    ];
    for config in cases {
        assert!(matches!(config.validate(), Err(WeftError::InvalidConfig(_))));
        assert!(CpuSpringProcessor::new(config, 0.1).is_err());
    }
}

#[test]
fn config_toml_partial_uses_defaults() {
    let config: PhysicsConfig =
        toml::from_str("delta_time_divisor = 10\nintegration_type = \"rk4\"\n").unwrap();
    assert_eq!(config.delta_time_divisor, 10);
    assert_eq!(config.integration_type, IntegrationType::Rk4);
    assert_eq!(config.damping, 38.0);

    let text = toml::to_string(&PhysicsConfig::stiff()).unwrap();
    let back: PhysicsConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, PhysicsConfig::stiff());
}

// ─── Integrator Tests ─────────────────────────────────────────

#[test]
fn euler_uses_old_velocity_for_position() {
    let mut euler = ExplicitEuler;
    let state = IntegrationState::new(Vec3::ZERO, Vec3::X);
    let next = euler.integrate(Vec3::Y * 10.0, 0.1, state);
    assert!(approx_vec(next.position, Vec3::new(0.1, 0.0, 0.0), 1e-6));
    assert!(approx_vec(next.velocity, Vec3::new(1.0, 1.0, 0.0), 1e-6));
}

#[test]
fn verlet_first_step_ignores_acceleration_in_position() {
    let mut verlet = VelocityVerlet::default();
    let a = Vec3::new(0.0, -2.0, 0.0);
    let s1 = verlet.integrate(a, 0.5, IntegrationState::default());
    assert_eq!(s1.position, Vec3::ZERO);
    assert!(approx_vec(s1.velocity, Vec3::new(0.0, -0.5, 0.0), 1e-6));
    assert_eq!(verlet.old_acceleration(), a);

    let s2 = verlet.integrate(a, 0.5, s1);
    // x = 0 + v·dt + a_old·dt²/2
    assert!(approx(s2.position.y, -0.25 - 0.25, 1e-6));
    assert!(approx(s2.velocity.y, -1.5, 1e-6));

    verlet.reset_internal_state();
    assert_eq!(verlet.old_acceleration(), Vec3::ZERO);
}

#[test]
fn rk4_is_exact_for_constant_acceleration() {
    let mut rk4 = Rk4;
    let a = Vec3::new(1.0, -3.0, 0.5);
    let v = Vec3::new(0.2, 1.0, 0.0);
    let dt = 0.3;
    let next = rk4.integrate(a, dt, IntegrationState::new(Vec3::ONE, v));
    assert!(approx_vec(next.position, Vec3::ONE + v * dt + a * dt * dt * 0.5, 1e-5));
    assert!(approx_vec(next.velocity, v + a * dt, 1e-5));
}

#[test]
fn integration_type_creates_matching_integrator() {
    for kind in [
        IntegrationType::ExplicitEuler,
        IntegrationType::VelocityVerlet,
        IntegrationType::Rk4,
    ] {
        assert_eq!(kind.create_integrator().name(), kind.name());
    }
}

// ─── Spring Damper Tests ──────────────────────────────────────

#[test]
fn stretched_spring_pulls_first_towards_second() {
    let f = spring_damper_force(Vec3::ZERO, Vec3::ZERO, Vec3::X * 2.0, Vec3::ZERO, 1.0, 10.0, 0.0);
    assert!(approx_vec(f, Vec3::X * 10.0, 1e-5));
    let f = spring_damper_force(Vec3::ZERO, Vec3::ZERO, Vec3::X * 0.5, Vec3::ZERO, 1.0, 10.0, 0.0);
    assert!(approx_vec(f, -Vec3::X * 5.0, 1e-5));
}

#[test]
fn damping_only_acts_along_spring() {
    // Second node moving sideways: no damping force.
    let f = spring_damper_force(Vec3::ZERO, Vec3::ZERO, Vec3::X, Vec3::Z * 3.0, 1.0, 10.0, 2.0);
    assert!(f.length() < 1e-6);
    // Second node separating: damping pulls first along.
    let f = spring_damper_force(Vec3::ZERO, Vec3::ZERO, Vec3::X, Vec3::X * 3.0, 1.0, 10.0, 2.0);
    assert!(approx_vec(f, Vec3::X * 6.0, 1e-5));
}

#[test]
fn coincident_nodes_are_not_guarded() {
    let f = spring_damper_force(Vec3::ONE, Vec3::ZERO, Vec3::ONE, Vec3::ZERO, 1.0, 10.0, 1.0);
    assert!(!f.is_finite());
}

// ─── Spring Node Tests ────────────────────────────────────────

#[test]
fn snap_with_velocity_does_not_teleport() {
    let mut node = SpringNode::new(
        NodeId(0),
        Vec3::ZERO,
        0.1,
        0.125,
        IntegrationType::ExplicitEuler.create_integrator(),
    );
    node.snap_to(Vec3::Y, true, DT);
    assert_eq!(node.position(), Vec3::ZERO);
    assert!(approx_vec(node.velocity(), Vec3::Y / DT, 1e-3));

    node.snap_to(Vec3::Y, false, DT);
    assert_eq!(node.position(), Vec3::Y);
    assert_eq!(node.velocity(), Vec3::ZERO);
}

#[test]
fn apply_force_clears_accumulator() {
    let mut node = SpringNode::new(
        NodeId(0),
        Vec3::ZERO,
        0.1,
        0.5,
        IntegrationType::ExplicitEuler.create_integrator(),
    );
    node.add_force(Vec3::X * 4.0);
    node.apply_force(Vec3::ZERO, 0.1);
    assert!(approx_vec(node.velocity(), Vec3::X * 0.2, 1e-6));
    assert_eq!(node.force(), Vec3::ZERO);
}

// ─── Phase And Topology Tests ─────────────────────────────────

#[test]
fn tick_before_finalize_is_rejected() {
    let mut p = processor(PhysicsConfig::default());
    p.add_node(Vec3::ZERO, 0.1).unwrap();
    assert!(matches!(p.tick(DT, &[], &[]), Err(WeftError::InvalidPhase(_))));
}

#[test]
fn topology_is_frozen_after_finalize() {
    let mut p = processor(PhysicsConfig::default());
    let a = p.add_node(Vec3::ZERO, 0.1).unwrap();
    let b = p.add_node(Vec3::X, 0.1).unwrap();
    p.finalize_topology().unwrap();
    assert!(p.is_finalized());
    assert!(matches!(p.add_node(Vec3::Y, 0.1), Err(WeftError::InvalidPhase(_))));
    assert!(matches!(
        p.add_damper(DamperType::Elastic, 1.0, a, b),
        Err(WeftError::InvalidPhase(_))
    ));
    assert!(matches!(p.finalize_topology(), Err(WeftError::InvalidPhase(_))));
}

#[test]
fn invalid_dampers_are_rejected() {
    let mut p = processor(PhysicsConfig::default());
    let a = p.add_node(Vec3::ZERO, 0.1).unwrap();
    assert!(matches!(
        p.add_damper(DamperType::Elastic, 1.0, a, a),
        Err(WeftError::InvalidTopology(_))
    ));
    assert!(matches!(
        p.add_damper(DamperType::Elastic, 1.0, a, NodeId(9)),
        Err(WeftError::InvalidTopology(_))
    ));
    assert_eq!(p.damper_count(), 0);
}

#[test]
fn unknown_node_queries_fail() {
    let p = processor(PhysicsConfig::default());
    assert!(matches!(
        p.node_position(NodeId(3)),
        Err(WeftError::UnknownNode { index: 3, count: 0 })
    ));
    assert!(p.node(NodeId(0)).is_err());
}

#[test]
fn invalid_tick_input_leaves_state_untouched() {
    let mut p = processor(PhysicsConfig::default());
    p.add_node(Vec3::Y, 0.1).unwrap();
    p.finalize_topology().unwrap();
    assert!(p.tick(-1.0, &[], &[]).is_err());
    let bad_sphere = [ImmovableSphere::new(Vec3::splat(f32::NAN), 1.0)];
    assert!(p.tick(DT, &bad_sphere, &[]).is_err());
    let inverted = [ImmovableCuboid {
        minimum: Vec3::new(0.0, 1.0, 0.0),
        maximum: Vec3::new(1.0, 0.0, 1.0),
    }];
    assert!(matches!(
        p.tick(DT, &[], &inverted),
        Err(WeftError::InvalidConfig(_))
    ));
    assert_eq!(p.node_position(NodeId(0)).unwrap(), Vec3::Y);
}

// ─── Dynamics Tests ───────────────────────────────────────────

#[test]
fn euler_free_fall_matches_substep_formula() {
    let config = PhysicsConfig {
        integration_type: IntegrationType::ExplicitEuler,
        ..Default::default()
    };
    let g = config.gravity().y;
    let mut p = processor(config);
    let id = p.add_node(Vec3::ZERO, 0.01).unwrap();
    p.finalize_topology().unwrap();
    let report = p.tick(DT, &[], &[]).unwrap();

    let h = DT / 20.0;
    assert_eq!(report.substeps, 20);
    assert!(approx(report.sub_delta_time, h, 1e-9));
    assert!(approx(p.node_velocity(id).unwrap().y, g * 20.0 * h, 1e-5));
    assert!(approx(p.node_position(id).unwrap().y, g * h * h * 190.0, 1e-6));
}

#[test]
fn spring_conserves_momentum() {
    for kind in [
        IntegrationType::ExplicitEuler,
        IntegrationType::VelocityVerlet,
        IntegrationType::Rk4,
    ] {
        let mut p = processor(weightless(kind));
        let a = p.add_node(Vec3::ZERO, 0.01).unwrap();
        let b = p.add_node(Vec3::X * 1.5, 0.01).unwrap();
        p.add_damper(DamperType::Elastic, 1.0, a, b).unwrap();
        p.finalize_topology().unwrap();
        p.tick(DT, &[], &[]).unwrap();

        let momentum: Vec3 = p.velocities().iter().sum();
        assert!(momentum.length() < 1e-3, "{kind:?}: {momentum}");
        let distance = p.node_position(a).unwrap().distance(p.node_position(b).unwrap());
        assert!(distance < 1.5, "{kind:?}: spring did not contract");
        assert!(p.kinetic_energy() > 0.0);
        assert!(p.potential_energy() < 0.5 * 5400.0 * 0.25);
    }
}

#[test]
fn node_rests_on_sphere_without_penetrating() {
    let mut p = processor(PhysicsConfig::default());
    let id = p.add_node(Vec3::new(0.3, 1.2, 0.0), 0.05).unwrap();
    p.finalize_topology().unwrap();
    let sphere = [ImmovableSphere::new(Vec3::ZERO, 1.0)];

    let mut contacts = 0;
    for _ in 0..150 {
        contacts += p.tick(DT, &sphere, &[]).unwrap().contacts.static_contacts;
        let d = p.node_position(id).unwrap().length();
        assert!(d >= 1.05 - 0.01, "penetrated to {d}");
    }
    assert!(contacts > 0);
}

#[test]
fn restitution_bounds_on_table() {
    for (restitution, expected_vy) in [(0.0, 0.0), (1.0, 1.0)] {
        let config = PhysicsConfig {
            restitution,
            friction: 0.0,
            ..weightless(IntegrationType::ExplicitEuler)
        };
        let mut p = processor(config);
        let id = p.add_node(Vec3::new(0.0, 0.06, 0.0), 0.05).unwrap();
        p.finalize_topology().unwrap();
        p.snap_node(id, Vec3::new(0.0, 0.06 - DT, 0.0), true).unwrap();
        assert!(approx(p.node_velocity(id).unwrap().y, -1.0, 1e-4));

        let table = [ImmovableCuboid::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 0.0, 1.0))];
        let report = p.tick(DT, &[], &table).unwrap();
        assert_eq!(report.contacts.static_contacts, 1);
        assert!(approx(p.node_position(id).unwrap().y, 0.05, 1e-4));
        assert!(approx(p.node_velocity(id).unwrap().y, expected_vy, 1e-3));
    }
}

#[test]
fn colliding_nodes_separate_and_stop() {
    let config = PhysicsConfig {
        restitution: 0.0,
        friction: 0.0,
        ..weightless(IntegrationType::ExplicitEuler)
    };
    let mut p = processor(config);
    let a = p.add_node(Vec3::ZERO, 0.1).unwrap();
    let b = p.add_node(Vec3::X * 0.15, 0.1).unwrap();
    p.finalize_topology().unwrap();
    assert!(p.capabilities().node_collisions);

    p.snap_node(a, Vec3::X * 0.01, true).unwrap();
    p.snap_node(b, Vec3::X * 0.14, true).unwrap();
    let report = p.tick(DT, &[], &[]).unwrap();

    assert!(report.contacts.node_contacts >= 1);
    let distance = p.node_position(a).unwrap().distance(p.node_position(b).unwrap());
    assert!(approx(distance, 0.2, 1e-4));
    assert!(p.node_velocity(a).unwrap().length() < 1e-3);
    assert!(p.node_velocity(b).unwrap().length() < 1e-3);
}

#[test]
fn reset_is_idempotent_and_clears_history() {
    let mut p = processor(PhysicsConfig::default());
    let a = p.add_node(Vec3::ZERO, 0.02).unwrap();
    let b = p.add_node(Vec3::X * 0.3, 0.02).unwrap();
    p.add_damper(DamperType::Elastic, 0.25, a, b).unwrap();
    p.finalize_topology().unwrap();
    let start = p.positions();

    p.tick(DT, &[], &[]).unwrap();
    let after_first = p.positions();
    for _ in 0..5 {
        p.tick(DT, &[], &[]).unwrap();
    }

    p.reset_to_initial_state().unwrap();
    assert_eq!(p.positions(), start);
    assert!(p.velocities().iter().all(|v| *v == Vec3::ZERO));
    p.reset_to_initial_state().unwrap();
    assert_eq!(p.positions(), start);

    p.tick(DT, &[], &[]).unwrap();
    for (x, y) in p.positions().iter().zip(&after_first) {
        assert!(approx_vec(*x, *y, 1e-6));
    }
}

// ─── Query And Handle Tests ───────────────────────────────────

#[test]
fn query_near_matches_brute_force() {
    let mut p = processor(PhysicsConfig::default());
    for x in 0..8 {
        for z in 0..8 {
            p.add_node(Vec3::new(x as f32 * 0.07, 0.0, z as f32 * 0.07), 0.03)
                .unwrap();
        }
    }
    p.finalize_topology().unwrap();

    let centre = Vec3::new(0.2, 0.01, 0.25);
    let radius = 0.16;
    let hits = p.query_near(centre, radius).unwrap();
    let expected: Vec<NodeId> = p
        .positions()
        .iter()
        .enumerate()
        .filter(|(_, pos)| pos.distance_squared(centre) <= radius * radius)
        .map(|(i, _)| NodeId::from_index(i))
        .collect();
    assert_eq!(hits, expected);
    assert!(!hits.is_empty());
    assert!(p.query_near(centre, -1.0).is_err());
}

#[test]
fn query_radius_far_beyond_grid_finds_every_node() {
    let mut p = processor(PhysicsConfig::default());
    let a = p.add_node(Vec3::ZERO, 0.05).unwrap();
    let b = p.add_node(Vec3::new(40.0, -3.0, 12.0), 0.05).unwrap();
    p.finalize_topology().unwrap();
    assert_eq!(p.query_near(Vec3::ZERO, 1.0e6).unwrap(), vec![a, b]);
}

#[test]
fn snapped_node_is_found_at_its_new_position() {
    let mut p = processor(PhysicsConfig::default());
    let a = p.add_node(Vec3::ZERO, 0.05).unwrap();
    p.finalize_topology().unwrap();

    let target = Vec3::splat(5.0);
    p.snap_node(a, target, false).unwrap();
    assert_eq!(p.query_near(target, 0.05).unwrap(), vec![a]);
    assert!(p.query_near(Vec3::ZERO, 0.05).unwrap().is_empty());
    assert!(p.hasher().verify_consistency().is_ok());
}

#[test]
fn query_after_collisions_matches_brute_force() {
    let mut p = processor(PhysicsConfig::default());
    for i in 0..12 {
        p.add_node(Vec3::new(i as f32 * 0.03, 0.05, 0.0), 0.05).unwrap();
    }
    p.finalize_topology().unwrap();
    let floor = [ImmovableCuboid::new(Vec3::new(-1.0, -0.2, -1.0), Vec3::new(1.0, 0.0, 1.0))];
    for _ in 0..5 {
        p.tick(DT, &[], &floor).unwrap();
    }

    for (i, &centre) in p.positions().iter().enumerate() {
        let hits = p.query_near(centre, 0.04).unwrap();
        let expected: Vec<NodeId> = p
            .positions()
            .iter()
            .enumerate()
            .filter(|(_, pos)| pos.distance_squared(centre) <= 0.04 * 0.04)
            .map(|(j, _)| NodeId::from_index(j))
            .collect();
        assert_eq!(hits, expected, "query around node {i}");
    }
}

#[test]
fn handles_read_and_snap_through_processor() {
    let mut p = processor(PhysicsConfig::default());
    let id = p.add_node(Vec3::ZERO, 0.05).unwrap();
    p.finalize_topology().unwrap();

    p.node_mut(id).unwrap().snap_to(Vec3::Y, false).unwrap();
    let handle = p.node(id).unwrap();
    assert_eq!(handle.id(), id);
    assert_eq!(handle.position().unwrap(), Vec3::Y);

    let boxed: Box<dyn SpringProcessor> = Box::new(p);
    let handle = NodeHandle::new(boxed.as_ref(), id).unwrap();
    assert_eq!(handle.velocity().unwrap(), Vec3::ZERO);
    assert_eq!(boxed.name(), "cpu");
}
