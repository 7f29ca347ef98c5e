//! Compute kernels, one invocation per node.
//!
//! These are the reference versions of the WGSL entry points in
//! `shaders/spring.wgsl`. An invocation reads the whole input node array
//! but writes only its own output record, so invocations can run in any
//! order or in parallel.

use glam::Vec3;
use weft_contact::{
    respond_to_cuboid, respond_to_sphere, CollisionResponder, ContactParams, ImmovableCuboid,
    ImmovableSphere, SphereResponder,
};
use weft_solver::spring_damper_force;
use weft_types::constants::WORKGROUP_SIZE;

use crate::buffers::{ColliderSet, GpuDamper, GpuNode, NodeOutput, SimParams};

/// The two kernels of the spring shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Sum damper forces and integrate one sub-step (explicit Euler).
    SpringForce,
    /// Resolve contacts against static spheres and cuboids.
    ResolveCollisions,
}

impl Kernel {
    /// WGSL entry point name.
    pub fn entry_point(self) -> &'static str {
        match self {
            Kernel::SpringForce => "spring_force",
            Kernel::ResolveCollisions => "resolve_collisions",
        }
    }
}

/// Workgroups needed to cover `node_count` invocations.
pub fn workgroup_count(node_count: usize) -> u32 {
    (node_count as u32).div_ceil(WORKGROUP_SIZE)
}

/// Spring force plus explicit Euler integration for node `index`.
pub fn spring_force(
    params: &SimParams,
    nodes: &[GpuNode],
    dampers: &[GpuDamper],
    index: usize,
) -> NodeOutput {
    let node = &nodes[index];
    let position = node.position();
    let velocity = node.velocity();

    let mut force = Vec3::ZERO;
    for damper in &dampers[node.slice().range()] {
        let other = &nodes[damper.other as usize];
        force += spring_damper_force(
            position,
            velocity,
            other.position(),
            other.velocity(),
            damper.rest_distance,
            damper.spring_constant,
            params.damping,
        );
    }

    let acceleration = force * params.inverse_mass + Vec3::from_array(params.gravity);
    NodeOutput {
        position: (position + velocity * params.delta_time).to_array(),
        velocity: (velocity + acceleration * params.delta_time).to_array(),
        ..NodeOutput::default()
    }
}

/// A node's private copy during the collision kernel.
struct KernelNode {
    position: Vec3,
    velocity: Vec3,
    radius: f32,
    inverse_mass: f32,
}

impl CollisionResponder for KernelNode {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    fn apply_collision_effect(&mut self, translation: Vec3, impulse: Vec3) {
        self.position += translation * self.inverse_mass;
        self.velocity += impulse * self.inverse_mass;
    }
}

impl SphereResponder for KernelNode {
    fn center(&self) -> Vec3 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Static collider response for node `index`. Node–node contacts are
/// not resolved by this kernel.
pub fn resolve_collisions(
    params: &SimParams,
    nodes: &[GpuNode],
    colliders: &ColliderSet,
    index: usize,
) -> NodeOutput {
    let node = &nodes[index];
    let mut me = KernelNode {
        position: node.position(),
        velocity: node.velocity(),
        radius: node.radius,
        inverse_mass: params.inverse_mass,
    };
    let contact_params = ContactParams {
        restitution: params.restitution,
        friction: params.friction,
    };

    let mut contacts = 0;
    for record in &colliders.spheres[..params.sphere_count as usize] {
        let mut sphere = ImmovableSphere::from(record);
        if respond_to_sphere(&mut me, &mut sphere, &contact_params) {
            contacts += 1;
        }
    }
    for record in &colliders.cuboids[..params.cuboid_count as usize] {
        let mut cuboid = ImmovableCuboid::from(record);
        if respond_to_cuboid(&mut me, &mut cuboid, &contact_params) {
            contacts += 1;
        }
    }

    NodeOutput {
        position: me.position.to_array(),
        contacts,
        velocity: me.velocity.to_array(),
        _pad: 0,
    }
}
