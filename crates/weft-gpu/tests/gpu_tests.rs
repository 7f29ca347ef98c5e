//! Integration tests for weft-gpu.

use glam::Vec3;
use weft_contact::{ImmovableCuboid, ImmovableSphere};
use weft_gpu::backend::{CpuFallback, GpuBackend};
use weft_gpu::kernels::{workgroup_count, Kernel};
use weft_gpu::{ColliderSet, GpuDamper, GpuNode, GpuSphere, GpuSpringProcessor, NodeOutput, SimParams};
use weft_solver::{
    CpuSpringProcessor, DamperType, IntegrationType, PhysicsConfig, SpringProcessor,
};
use weft_types::constants::SENTINEL_COORDINATE;
use weft_types::{NodeId, WeftError};

const DT: f32 = 1.0 / 50.0;

fn euler() -> PhysicsConfig {
    PhysicsConfig {
        integration_type: IntegrationType::ExplicitEuler,
        ..Default::default()
    }
}

fn gpu(config: PhysicsConfig) -> GpuSpringProcessor {
    GpuSpringProcessor::with_cpu_fallback(config).unwrap()
}

/// Square patch of `n × n` nodes with structural and shear springs.
fn build_patch(p: &mut dyn SpringProcessor, n: usize, spacing: f32, height: f32) {
    let index = |x: usize, z: usize| NodeId::from_index(x * n + z);
    for x in 0..n {
        for z in 0..n {
            let pos = Vec3::new(x as f32 * spacing - 0.15, height, z as f32 * spacing - 0.15);
            p.add_node(pos, 0.001).unwrap();
        }
    }
    for x in 0..n {
        for z in 0..n {
            if x + 1 < n {
                p.add_damper(DamperType::Elastic, spacing, index(x, z), index(x + 1, z))
                    .unwrap();
            }
            if z + 1 < n {
                p.add_damper(DamperType::Elastic, spacing, index(x, z), index(x, z + 1))
                    .unwrap();
            }
            if x + 1 < n && z + 1 < n {
                p.add_damper(
                    DamperType::Shear,
                    spacing * std::f32::consts::SQRT_2,
                    index(x, z),
                    index(x + 1, z + 1),
                )
                .unwrap();
            }
        }
    }
    p.finalize_topology().unwrap();
}

// ─── Layout Tests ─────────────────────────────────────────────

#[test]
fn dampers_are_duplicated_per_endpoint() {
    let mut p = gpu(euler());
    let a = p.add_node(Vec3::ZERO, 0.1).unwrap();
    let b = p.add_node(Vec3::X, 0.1).unwrap();
    let c = p.add_node(Vec3::Z * 5.0, 0.1).unwrap();
    p.add_damper(DamperType::Bend, 1.0, a, b).unwrap();
    p.finalize_topology().unwrap();

    assert_eq!(p.damper_count(), 1);
    assert_eq!(p.flat_dampers().len(), 2);

    let nodes = p.flat_nodes();
    let slice_a = nodes[a.index()].slice();
    let slice_b = nodes[b.index()].slice();
    assert_eq!(slice_a.len(), 1);
    assert_eq!(slice_b.len(), 1);
    assert!(nodes[c.index()].slice().is_empty());
    assert_eq!(p.flat_dampers()[slice_a.range()][0].other, b.0);
    assert_eq!(p.flat_dampers()[slice_b.range()][0].other, a.0);
    assert_eq!(p.flat_dampers()[0].spring_constant, 2400.0);
}

#[test]
fn workgroups_cover_every_node() {
    assert_eq!(workgroup_count(0), 0);
    assert_eq!(workgroup_count(1), 1);
    assert_eq!(workgroup_count(32), 1);
    assert_eq!(workgroup_count(33), 2);
}

// ─── Sentinel Tests ───────────────────────────────────────────

#[test]
fn empty_collider_lists_use_sentinels() {
    let set = ColliderSet::from_scene(&[], &[]);
    assert!(set.uses_sentinel_spheres());
    assert!(set.uses_sentinel_cuboids());
    assert_eq!(set.spheres, vec![GpuSphere::SENTINEL]);
    assert_eq!(set.cuboids.len(), 1);
    assert!(set.active_spheres().is_empty());
    assert!(set.active_cuboids().is_empty());

    let sphere = [ImmovableSphere::new(Vec3::ZERO, 1.0)];
    let set = ColliderSet::from_scene(&sphere, &[]);
    assert!(!set.uses_sentinel_spheres());
    assert_eq!(set.sphere_count, 1);
    assert_eq!(set.active_spheres().len(), 1);
}

#[test]
fn sentinels_are_never_collided_with() {
    let config = PhysicsConfig {
        gravity_multiplier: 0.0,
        ..euler()
    };
    let mut p = gpu(config);
    let id = p
        .add_node(Vec3::splat(SENTINEL_COORDINATE), 10.0)
        .unwrap();
    p.finalize_topology().unwrap();

    let report = p.tick(DT, &[], &[]).unwrap();
    assert_eq!(report.contacts.static_contacts, 0);
    assert_eq!(p.node_position(id).unwrap(), Vec3::splat(SENTINEL_COORDINATE));
    assert_eq!(p.node_velocity(id).unwrap(), Vec3::ZERO);
}

// ─── Backend Tests ────────────────────────────────────────────

#[test]
fn cpu_fallback_init() {
    let mut backend = CpuFallback::new();
    assert!(backend.upload_topology(1, &[]).is_err());
    backend.init().unwrap();
    assert_eq!(backend.name(), "cpu_fallback");
    assert!(!backend.is_gpu());
}

#[test]
fn cpu_fallback_rejects_mismatched_buffers() {
    let mut backend = CpuFallback::new();
    backend.init().unwrap();
    backend.upload_topology(2, &[]).unwrap();

    let nodes = [GpuNode::new(Vec3::ZERO, 0.1), GpuNode::new(Vec3::X, 0.1)];
    let colliders = ColliderSet::from_scene(&[], &[]);
    let params = SimParams::new(&euler(), 0.001, 2, &colliders);
    let mut short = [NodeOutput::default(); 1];
    assert!(matches!(
        backend.dispatch(Kernel::SpringForce, &params, &nodes, &colliders, &mut short),
        Err(WeftError::Gpu(_))
    ));

    let mut out = [NodeOutput::default(); 2];
    backend
        .dispatch(Kernel::SpringForce, &params, &nodes, &colliders, &mut out)
        .unwrap();
    assert_eq!(backend.dispatch_count(), 1);
    assert!(out[0].velocity[1] < 0.0);
}

#[test]
fn cpu_fallback_rejects_dangling_damper() {
    let mut backend = CpuFallback::new();
    backend.init().unwrap();
    let dangling = [GpuDamper::new(NodeId(5), 1.0, 10.0)];
    assert!(backend.upload_topology(2, &dangling).is_err());
}

// ─── Processor Tests ──────────────────────────────────────────

#[test]
fn tick_dispatches_force_kernel_per_substep() {
    let mut p = gpu(euler());
    p.add_node(Vec3::ZERO, 0.1).unwrap();
    assert!(matches!(p.tick(DT, &[], &[]), Err(WeftError::InvalidPhase(_))));
    p.finalize_topology().unwrap();
    let report = p.tick(DT, &[], &[]).unwrap();
    assert_eq!(report.substeps, 20);
    assert_eq!(p.dispatch_count(), 21);
}

#[test]
fn positions_publish_only_on_sync() {
    let mut p = gpu(euler());
    let id = p.add_node(Vec3::ZERO, 0.1).unwrap();
    p.finalize_topology().unwrap();

    p.snap_node(id, Vec3::Y, false).unwrap();
    assert_eq!(p.node_position(id).unwrap(), Vec3::ZERO);
    assert!(p.query_near(Vec3::Y, 0.01).unwrap().is_empty());

    p.sync_positions().unwrap();
    assert_eq!(p.node_position(id).unwrap(), Vec3::Y);
    assert_eq!(p.query_near(Vec3::Y, 0.01).unwrap(), vec![id]);
}

#[test]
fn reset_restores_start_positions() {
    let mut p = gpu(euler());
    build_patch(&mut p, 3, 0.1, 1.0);
    let start = p.positions();
    for _ in 0..5 {
        p.tick(DT, &[], &[]).unwrap();
    }
    assert_ne!(p.positions(), start);
    p.reset_to_initial_state().unwrap();
    assert_eq!(p.positions(), start);
    assert!(p.velocities().iter().all(|v| *v == Vec3::ZERO));
}

#[test]
fn gpu_lacks_node_collisions() {
    let config = PhysicsConfig {
        gravity_multiplier: 0.0,
        ..euler()
    };
    let mut cpu = CpuSpringProcessor::new(config.clone(), 0.1).unwrap();
    let mut gpu = gpu(config);
    assert!(cpu.capabilities().node_collisions);
    assert!(!gpu.capabilities().node_collisions);
    assert!(!gpu.capabilities().integrator_selection);

    let both: [&mut dyn SpringProcessor; 2] = [&mut cpu, &mut gpu];
    for p in both {
        p.add_node(Vec3::ZERO, 0.1).unwrap();
        p.add_node(Vec3::X * 0.15, 0.1).unwrap();
        p.finalize_topology().unwrap();
        p.tick(DT, &[], &[]).unwrap();
    }

    let gap = |p: &dyn SpringProcessor| {
        p.node_position(NodeId(0))
            .unwrap()
            .distance(p.node_position(NodeId(1)).unwrap())
    };
    assert!(gap(&cpu) >= 0.2 - 1e-4);
    assert!((gap(&gpu) - 0.15).abs() < 1e-6);
}

#[test]
fn gpu_matches_cpu_with_explicit_euler() {
    let config = euler();
    let mut cpu = CpuSpringProcessor::new(config.clone(), 0.1).unwrap();
    let mut gpu = gpu(config);
    build_patch(&mut cpu, 4, 0.1, 0.6);
    build_patch(&mut gpu, 4, 0.1, 0.6);

    let spheres = [ImmovableSphere::new(Vec3::new(0.0, 0.2, 0.0), 0.3)];
    let cuboids = [ImmovableCuboid::new(
        Vec3::new(-1.0, -0.5, -1.0),
        Vec3::new(1.0, 0.0, 1.0),
    )];

    let mut cpu_contacts = 0u32;
    let mut gpu_contacts = 0u32;
    for _ in 0..40 {
        let c = cpu.tick(DT, &spheres, &cuboids).unwrap();
        let g = gpu.tick(DT, &spheres, &cuboids).unwrap();
        assert_eq!(c.contacts.node_contacts, 0);
        cpu_contacts += c.contacts.static_contacts;
        gpu_contacts += g.contacts.static_contacts;
    }

    assert!(cpu_contacts > 0);
    assert!(cpu_contacts.abs_diff(gpu_contacts) <= 2);
    for (c, g) in cpu.positions().iter().zip(gpu.positions()) {
        assert!((*c - g).length() < 1e-3, "cpu {c} vs gpu {g}");
    }
    let (pe_cpu, pe_gpu) = (cpu.potential_energy(), gpu.potential_energy());
    assert!((pe_cpu - pe_gpu).abs() <= 0.05 * pe_cpu.max(1e-3));
    for (c, g) in cpu.velocities().iter().zip(gpu.velocities()) {
        assert!((*c - g).length() < 1e-2, "cpu {c} vs gpu {g}");
    }
}
