//! Spring processor trait: the contract both execution backends fulfil.
//!
//! A processor goes through two phases. While building, nodes and dampers
//! are added. [`SpringProcessor::finalize_topology`] freezes the topology
//! and allocates whatever the backend needs; only then may it tick.
//!
//! ```text
//! let a = processor.add_node(position, radius)?;
//! processor.add_damper(DamperType::Elastic, rest, a, b)?;
//! processor.finalize_topology()?;
//! loop {
//!     processor.tick(dt, &spheres, &cuboids)?;
//! }
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_contact::{ContactCounts, ImmovableCuboid, ImmovableSphere};
use weft_types::{NodeId, WeftError, WeftResult};

use crate::config::{DamperType, PhysicsConfig};

/// Features that differ between backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Nodes collide with each other, not just with static colliders.
    pub node_collisions: bool,
    /// `PhysicsConfig::integration_type` is honoured.
    pub integrator_selection: bool,
}

/// Result of one processor tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Integration sub-steps performed.
    pub substeps: u32,
    /// Length of each sub-step (seconds).
    pub sub_delta_time: f32,
    /// Contacts resolved during the collision pass.
    pub contacts: ContactCounts,
    /// Wall-clock time for this tick (seconds).
    pub wall_time: f64,
}

/// Trait for spring processors.
///
/// # Implementations
/// - [`CpuSpringProcessor`](crate::cpu::CpuSpringProcessor): object-per-node,
///   spatial-hash node contacts, any integrator
/// - `GpuSpringProcessor` (in `weft-gpu`): flat buffers and compute kernels,
///   static colliders only
pub trait SpringProcessor: Send {
    /// Adds a node at `position`. Build phase only.
    fn add_node(&mut self, position: Vec3, radius: f32) -> WeftResult<NodeId>;

    /// Connects two existing, distinct nodes. Build phase only.
    fn add_damper(
        &mut self,
        kind: DamperType,
        rest_distance: f32,
        first: NodeId,
        second: NodeId,
    ) -> WeftResult<()>;

    /// Freezes the topology. Must be called exactly once, before ticking.
    fn finalize_topology(&mut self) -> WeftResult<()>;

    /// Advances the simulation by one fixed tick of `delta_time` seconds.
    ///
    /// The tick is split into `delta_time_divisor` sub-steps of spring force
    /// accumulation and integration, followed by one collision pass against
    /// the given colliders.
    fn tick(
        &mut self,
        delta_time: f32,
        spheres: &[ImmovableSphere],
        cuboids: &[ImmovableCuboid],
    ) -> WeftResult<TickReport>;

    /// Nodes whose centre lies within `radius` of `centroid`, sorted by id.
    fn query_near(&self, centroid: Vec3, radius: f32) -> WeftResult<Vec<NodeId>>;

    /// Externally visible position of a node.
    fn node_position(&self, id: NodeId) -> WeftResult<Vec3>;

    fn node_velocity(&self, id: NodeId) -> WeftResult<Vec3>;

    /// Moves a node; see [`SpringNode::snap_to`](crate::node::SpringNode::snap_to).
    fn snap_node(&mut self, id: NodeId, position: Vec3, update_velocity: bool) -> WeftResult<()>;

    /// Returns every node to its start position at rest.
    fn reset_to_initial_state(&mut self) -> WeftResult<()>;

    /// Publishes node positions to the queries that read them.
    fn sync_positions(&mut self) -> WeftResult<()>;

    fn capabilities(&self) -> Capabilities;

    fn node_count(&self) -> usize;

    fn damper_count(&self) -> usize;

    /// Endpoints of every damper, in insertion order.
    fn damper_endpoints(&self) -> Vec<(NodeId, NodeId)>;

    /// Externally visible positions of every node, indexed by id.
    fn positions(&self) -> Vec<Vec3>;

    /// Velocities of every node, indexed by id.
    fn velocities(&self) -> Vec<Vec3>;

    fn physics(&self) -> &PhysicsConfig;

    fn is_finalized(&self) -> bool;

    /// Returns the backend's name.
    fn name(&self) -> &str;

    /// Elastic energy stored in all dampers.
    fn potential_energy(&self) -> f32;

    /// Total kinetic energy of all nodes.
    fn kinetic_energy(&self) -> f32 {
        let mass = 1.0 / self.physics().inverse_mass;
        self.velocities()
            .iter()
            .map(|v| 0.5 * mass * v.length_squared())
            .sum()
    }

    /// Read-only proxy for one node.
    fn node(&self, id: NodeId) -> WeftResult<NodeHandle<'_, Self>>
    where
        Self: Sized,
    {
        NodeHandle::new(self, id)
    }

    /// Mutable proxy for one node.
    fn node_mut(&mut self, id: NodeId) -> WeftResult<NodeHandleMut<'_, Self>>
    where
        Self: Sized,
    {
        NodeHandleMut::new(self, id)
    }
}

/// A processor reference plus a node id. Every read goes back to the
/// processor, so a handle never holds stale data.
pub struct NodeHandle<'a, P: SpringProcessor + ?Sized> {
    processor: &'a P,
    id: NodeId,
}

impl<'a, P: SpringProcessor + ?Sized> NodeHandle<'a, P> {
    /// Errors if `id` is not a node of `processor`.
    pub fn new(processor: &'a P, id: NodeId) -> WeftResult<Self> {
        check_node(id, processor.node_count())?;
        Ok(Self { processor, id })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> WeftResult<Vec3> {
        self.processor.node_position(self.id)
    }

    pub fn velocity(&self) -> WeftResult<Vec3> {
        self.processor.node_velocity(self.id)
    }
}

/// Mutable counterpart of [`NodeHandle`].
pub struct NodeHandleMut<'a, P: SpringProcessor + ?Sized> {
    processor: &'a mut P,
    id: NodeId,
}

impl<'a, P: SpringProcessor + ?Sized> NodeHandleMut<'a, P> {
    /// Errors if `id` is not a node of `processor`.
    pub fn new(processor: &'a mut P, id: NodeId) -> WeftResult<Self> {
        check_node(id, processor.node_count())?;
        Ok(Self { processor, id })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> WeftResult<Vec3> {
        self.processor.node_position(self.id)
    }

    pub fn velocity(&self) -> WeftResult<Vec3> {
        self.processor.node_velocity(self.id)
    }

    pub fn snap_to(&mut self, position: Vec3, update_velocity: bool) -> WeftResult<()> {
        self.processor.snap_node(self.id, position, update_velocity)
    }
}

/// Build/run phase of a processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Building,
    Finalized,
}

impl Phase {
    /// Errors unless the topology can still be edited.
    pub fn require_building(self, operation: &str) -> WeftResult<()> {
        match self {
            Phase::Building => Ok(()),
            Phase::Finalized => Err(WeftError::InvalidPhase(format!(
                "{operation} is not allowed after finalize_topology"
            ))),
        }
    }

    /// Errors unless the topology has been finalized.
    pub fn require_finalized(self, operation: &str) -> WeftResult<()> {
        match self {
            Phase::Finalized => Ok(()),
            Phase::Building => Err(WeftError::InvalidPhase(format!(
                "{operation} requires finalize_topology first"
            ))),
        }
    }
}

/// Errors if `id` is outside `0..count`.
pub fn check_node(id: NodeId, count: usize) -> WeftResult<()> {
    if id.index() < count {
        Ok(())
    } else {
        Err(WeftError::UnknownNode {
            index: id.0,
            count,
        })
    }
}

/// Validates a damper against the current node count.
pub fn check_damper(
    rest_distance: f32,
    first: NodeId,
    second: NodeId,
    count: usize,
) -> WeftResult<()> {
    for id in [first, second] {
        if id.index() >= count {
            return Err(WeftError::InvalidTopology(format!(
                "damper references {id}, but only {count} nodes exist"
            )));
        }
    }
    if first == second {
        return Err(WeftError::InvalidTopology(format!(
            "damper connects {first} to itself"
        )));
    }
    if !(rest_distance.is_finite() && rest_distance >= 0.0) {
        return Err(WeftError::InvalidTopology(format!(
            "damper rest distance must be non-negative, got {rest_distance}"
        )));
    }
    Ok(())
}

/// Validates a node before it is added.
pub fn check_new_node(position: Vec3, radius: f32) -> WeftResult<()> {
    if !position.is_finite() {
        return Err(WeftError::InvalidTopology(format!(
            "node position must be finite, got {position}"
        )));
    }
    if !(radius.is_finite() && radius >= 0.0) {
        return Err(WeftError::InvalidTopology(format!(
            "node radius must be non-negative, got {radius}"
        )));
    }
    Ok(())
}

/// Validates a tick's inputs before any state is touched.
pub fn check_tick_inputs(
    delta_time: f32,
    spheres: &[ImmovableSphere],
    cuboids: &[ImmovableCuboid],
) -> WeftResult<()> {
    if !(delta_time.is_finite() && delta_time > 0.0) {
        return Err(WeftError::InvalidConfig(format!(
            "tick delta time must be positive, got {delta_time}"
        )));
    }
    if spheres
        .iter()
        .any(|s| !s.center.is_finite() || s.radius.is_nan() || s.radius < 0.0)
    {
        return Err(WeftError::InvalidConfig(
            "sphere colliders need a finite centre and non-negative radius".into(),
        ));
    }
    if cuboids
        .iter()
        .any(|c| !c.minimum.is_finite() || !c.maximum.is_finite())
    {
        return Err(WeftError::InvalidConfig(
            "cuboid colliders need finite corners".into(),
        ));
    }
    if let Some(c) = cuboids.iter().find(|c| c.minimum.cmpgt(c.maximum).any()) {
        return Err(WeftError::InvalidConfig(format!(
            "cuboid minimum {} exceeds maximum {} on some axis",
            c.minimum, c.maximum
        )));
    }
    Ok(())
}

/// Validates a proximity query.
pub fn check_query(centroid: Vec3, radius: f32) -> WeftResult<()> {
    if centroid.is_finite() && radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(WeftError::InvalidConfig(format!(
            "query needs a finite centre and non-negative radius, got {centroid} / {radius}"
        )))
    }
}
