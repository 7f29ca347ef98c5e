//! Flat, GPU-compatible data layout.
//!
//! Every record is `#[repr(C)]` and `Pod`, laid out to match the WGSL
//! structs in `shaders/spring.wgsl` (a `vec3<f32>` is followed by a scalar
//! or explicit padding so every record is a multiple of 16 bytes).
//!
//! Dampers are stored per endpoint: a damper between nodes `a` and `b`
//! appears once in `a`'s slice pointing at `b` and once in `b`'s slice
//! pointing at `a`. Each node therefore sums its own spring forces without
//! writing to any other node.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use weft_contact::{ImmovableCuboid, ImmovableSphere};
use weft_solver::PhysicsConfig;
use weft_types::constants::SENTINEL_COORDINATE;
use weft_types::NodeId;

/// Half-open range `[start, end)` into the flat damper array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: u32,
    pub end: u32,
}

impl Slice {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// One spring node as the kernels see it.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuNode {
    pub position: [f32; 3],
    pub radius: f32,
    pub velocity: [f32; 3],
    pub damper_start: u32,
    pub damper_end: u32,
    pub _pad: [u32; 3],
}

impl GpuNode {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position: position.to_array(),
            radius,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }

    pub fn slice(&self) -> Slice {
        Slice::new(self.damper_start, self.damper_end)
    }

    pub fn set_slice(&mut self, slice: Slice) {
        self.damper_start = slice.start;
        self.damper_end = slice.end;
    }

    /// Same semantics as the CPU node: either derive a velocity that
    /// reaches `position` within one fixed tick, or teleport at rest.
    pub fn snap_to(&mut self, position: Vec3, update_velocity: bool, fixed_delta_time: f32) {
        if update_velocity {
            self.velocity = ((position - self.position()) / fixed_delta_time).to_array();
        } else {
            self.velocity = [0.0; 3];
            self.position = position.to_array();
        }
    }
}

/// One endpoint's view of a damper.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuDamper {
    /// The node at the far end of the spring.
    pub other: u32,
    pub rest_distance: f32,
    pub spring_constant: f32,
    pub _pad: u32,
}

impl GpuDamper {
    pub fn new(other: NodeId, rest_distance: f32, spring_constant: f32) -> Self {
        Self {
            other: other.0,
            rest_distance,
            spring_constant,
            _pad: 0,
        }
    }
}

/// Per-node kernel output, read back after every dispatch.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct NodeOutput {
    pub position: [f32; 3],
    /// Static contacts resolved for this node by the collision kernel.
    pub contacts: u32,
    pub velocity: [f32; 3],
    pub _pad: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

impl GpuSphere {
    /// A zero-radius sphere far outside any scene.
    pub const SENTINEL: GpuSphere = GpuSphere {
        center: [SENTINEL_COORDINATE; 3],
        radius: 0.0,
    };
}

impl From<&ImmovableSphere> for GpuSphere {
    fn from(sphere: &ImmovableSphere) -> Self {
        Self {
            center: sphere.center.to_array(),
            radius: sphere.radius,
        }
    }
}

impl From<&GpuSphere> for ImmovableSphere {
    fn from(sphere: &GpuSphere) -> Self {
        ImmovableSphere::new(Vec3::from_array(sphere.center), sphere.radius)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuCuboid {
    pub minimum: [f32; 3],
    pub _pad0: f32,
    pub maximum: [f32; 3],
    pub _pad1: f32,
}

impl GpuCuboid {
    /// A unit box far outside any scene.
    pub const SENTINEL: GpuCuboid = GpuCuboid {
        minimum: [SENTINEL_COORDINATE; 3],
        _pad0: 0.0,
        maximum: [SENTINEL_COORDINATE + 1.0; 3],
        _pad1: 0.0,
    };
}

impl From<&ImmovableCuboid> for GpuCuboid {
    fn from(cuboid: &ImmovableCuboid) -> Self {
        Self {
            minimum: cuboid.minimum.to_array(),
            _pad0: 0.0,
            maximum: cuboid.maximum.to_array(),
            _pad1: 0.0,
        }
    }
}

impl From<&GpuCuboid> for ImmovableCuboid {
    fn from(cuboid: &GpuCuboid) -> Self {
        ImmovableCuboid::new(
            Vec3::from_array(cuboid.minimum),
            Vec3::from_array(cuboid.maximum),
        )
    }
}

/// Uniform parameters shared by both kernels.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    pub gravity: [f32; 3],
    pub delta_time: f32,
    pub damping: f32,
    pub inverse_mass: f32,
    pub restitution: f32,
    pub friction: f32,
    pub node_count: u32,
    pub sphere_count: u32,
    pub cuboid_count: u32,
    pub _pad: u32,
}

impl SimParams {
    pub fn new(
        config: &PhysicsConfig,
        sub_delta_time: f32,
        node_count: usize,
        colliders: &ColliderSet,
    ) -> Self {
        Self {
            gravity: config.gravity().to_array(),
            delta_time: sub_delta_time,
            damping: config.damping,
            inverse_mass: config.inverse_mass,
            restitution: config.restitution,
            friction: config.friction,
            node_count: node_count as u32,
            sphere_count: colliders.sphere_count,
            cuboid_count: colliders.cuboid_count,
            _pad: 0,
        }
    }
}

/// Collider buffers for one tick.
///
/// Storage buffers cannot be empty, so a kind with no colliders is backed
/// by a single sentinel record while its count stays zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderSet {
    pub spheres: Vec<GpuSphere>,
    pub cuboids: Vec<GpuCuboid>,
    pub sphere_count: u32,
    pub cuboid_count: u32,
}

impl ColliderSet {
    pub fn from_scene(spheres: &[ImmovableSphere], cuboids: &[ImmovableCuboid]) -> Self {
        let mut sphere_records: Vec<GpuSphere> = spheres.iter().map(GpuSphere::from).collect();
        if sphere_records.is_empty() {
            sphere_records.push(GpuSphere::SENTINEL);
        }
        let mut cuboid_records: Vec<GpuCuboid> = cuboids.iter().map(GpuCuboid::from).collect();
        if cuboid_records.is_empty() {
            cuboid_records.push(GpuCuboid::SENTINEL);
        }
        Self {
            spheres: sphere_records,
            cuboids: cuboid_records,
            sphere_count: spheres.len() as u32,
            cuboid_count: cuboids.len() as u32,
        }
    }

    pub fn uses_sentinel_spheres(&self) -> bool {
        self.sphere_count == 0
    }

    pub fn uses_sentinel_cuboids(&self) -> bool {
        self.cuboid_count == 0
    }

    /// Spheres the kernels actually test.
    pub fn active_spheres(&self) -> &[GpuSphere] {
        &self.spheres[..self.sphere_count as usize]
    }

    /// Cuboids the kernels actually test.
    pub fn active_cuboids(&self) -> &[GpuCuboid] {
        &self.cuboids[..self.cuboid_count as usize]
    }
}

/// Nodes and their per-endpoint damper slices, ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTopology {
    pub nodes: Vec<GpuNode>,
    pub dampers: Vec<GpuDamper>,
}

impl FlatTopology {
    /// Concatenates per-node damper lists into one array and assigns each
    /// node its slice.
    pub fn build(mut nodes: Vec<GpuNode>, per_node: &[Vec<GpuDamper>]) -> Self {
        let mut dampers = Vec::with_capacity(per_node.iter().map(Vec::len).sum());
        for (node, list) in nodes.iter_mut().zip(per_node) {
            let start = dampers.len() as u32;
            dampers.extend_from_slice(list);
            node.set_slice(Slice::new(start, dampers.len() as u32));
        }
        Self { nodes, dampers }
    }
}
