//! CPU spring processor.
//!
//! Nodes and dampers live in index-addressed arenas. Every tick runs
//! `delta_time_divisor` sub-steps of damper force accumulation and node
//! integration, then a single collision pass in node-id order:
//!
//! 1. re-hash the node
//! 2. resolve it against every distinct neighbour sharing a hash cell
//! 3. re-hash it again, since the responses may have moved it
//! 4. resolve it against the tick's static spheres and cuboids
//!
//! Contact pairs are resolved sequentially with no conflict prevention,
//! so a node's later contacts see the effects of its earlier ones.
//!
//! A later node's responses can still move an earlier node, so the tick
//! ends by re-hashing every node. The hash always matches the current
//! positions between ticks, and a snap re-hashes the snapped node.

use std::time::Instant;

use glam::Vec3;
use tracing::{debug, info, warn};
use weft_contact::{
    respond_to_cuboid, respond_to_sphere, ContactCounts, ImmovableCuboid, ImmovableSphere,
    SpatialHasher,
};
use weft_types::{NodeId, WeftResult};

use crate::config::{DamperType, PhysicsConfig};
use crate::damper::SpringDamper;
use crate::node::SpringNode;
use crate::processor::{
    check_damper, check_new_node, check_node, check_query, check_tick_inputs, Capabilities, Phase,
    SpringProcessor, TickReport,
};

/// Reference spring processor running entirely on the CPU.
pub struct CpuSpringProcessor {
    config: PhysicsConfig,
    nodes: Vec<SpringNode>,
    dampers: Vec<SpringDamper>,
    hasher: SpatialHasher,
    phase: Phase,
    /// Scratch list reused by the collision pass.
    neighbours: Vec<usize>,
}

impl CpuSpringProcessor {
    /// Creates an empty processor. The configuration is validated here.
    pub fn new(config: PhysicsConfig, grid_size: f32) -> WeftResult<Self> {
        config.validate()?;
        let hasher = SpatialHasher::new(grid_size)?;
        Ok(Self {
            config,
            nodes: Vec::new(),
            dampers: Vec::new(),
            hasher,
            phase: Phase::Building,
            neighbours: Vec::new(),
        })
    }

    /// Direct access to a node.
    pub fn spring_node(&self, id: NodeId) -> WeftResult<&SpringNode> {
        check_node(id, self.nodes.len())?;
        Ok(&self.nodes[id.index()])
    }

    pub fn spring_nodes(&self) -> &[SpringNode] {
        &self.nodes
    }

    pub fn dampers(&self) -> &[SpringDamper] {
        &self.dampers
    }

    pub fn hasher(&self) -> &SpatialHasher {
        &self.hasher
    }

    fn substep(&mut self, delta_time: f32, gravity: Vec3) {
        for damper in &self.dampers {
            damper.apply_spring_force(&mut self.nodes);
        }
        for node in &mut self.nodes {
            node.apply_force(gravity, delta_time);
        }
    }

    fn resolve_collisions(
        &mut self,
        spheres: &[ImmovableSphere],
        cuboids: &[ImmovableCuboid],
    ) -> ContactCounts {
        let params = self.config.contact_params();
        let mut counts = ContactCounts::default();
        let mut neighbours = std::mem::take(&mut self.neighbours);

        for i in 0..self.nodes.len() {
            self.hasher.update(i, &self.nodes[i]);

            neighbours.clear();
            neighbours.extend(self.hasher.query_near_item(i).filter(|&j| j != i));
            neighbours.sort_unstable();
            neighbours.dedup();

            for &j in &neighbours {
                counts.pairs_tested += 1;
                let (node, other) = pair_mut(&mut self.nodes, i, j);
                if respond_to_sphere(node, other, &params) {
                    counts.node_contacts += 1;
                }
            }

            self.hasher.update(i, &self.nodes[i]);

            let node = &mut self.nodes[i];
            for mut sphere in spheres.iter().copied() {
                if respond_to_sphere(node, &mut sphere, &params) {
                    counts.static_contacts += 1;
                }
            }
            for mut cuboid in cuboids.iter().copied() {
                if respond_to_cuboid(node, &mut cuboid, &params) {
                    counts.static_contacts += 1;
                }
            }
        }

        self.neighbours = neighbours;
        counts
    }
}

/// Two distinct mutable elements of a slice.
fn pair_mut<T>(items: &mut [T], first: usize, second: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(first, second);
    if first < second {
        let (low, high) = items.split_at_mut(second);
        (&mut low[first], &mut high[0])
    } else {
        let (low, high) = items.split_at_mut(first);
        (&mut high[0], &mut low[second])
    }
}

impl SpringProcessor for CpuSpringProcessor {
    fn add_node(&mut self, position: Vec3, radius: f32) -> WeftResult<NodeId> {
        self.phase.require_building("add_node")?;
        check_new_node(position, radius)?;

        let id = NodeId::from_index(self.nodes.len());
        let node = SpringNode::new(
            id,
            position,
            radius,
            self.config.inverse_mass,
            self.config.integration_type.create_integrator(),
        );
        self.hasher.insert(id.index(), &node);
        self.nodes.push(node);
        Ok(id)
    }

    fn add_damper(
        &mut self,
        kind: DamperType,
        rest_distance: f32,
        first: NodeId,
        second: NodeId,
    ) -> WeftResult<()> {
        self.phase.require_building("add_damper")?;
        if let Err(e) = check_damper(rest_distance, first, second, self.nodes.len()) {
            warn!(%first, %second, error = %e, "rejected damper");
            return Err(e);
        }
        self.dampers.push(SpringDamper::new(
            kind,
            rest_distance,
            first,
            second,
            &self.config,
        ));
        Ok(())
    }

    fn finalize_topology(&mut self) -> WeftResult<()> {
        self.phase.require_building("finalize_topology")?;
        self.phase = Phase::Finalized;
        info!(
            backend = self.name(),
            nodes = self.nodes.len(),
            dampers = self.dampers.len(),
            integrator = self.config.integration_type.name(),
            "topology finalized"
        );
        Ok(())
    }

    fn tick(
        &mut self,
        delta_time: f32,
        spheres: &[ImmovableSphere],
        cuboids: &[ImmovableCuboid],
    ) -> WeftResult<TickReport> {
        self.phase.require_finalized("tick")?;
        check_tick_inputs(delta_time, spheres, cuboids)?;

        let start = Instant::now();
        let sub_delta_time = self.config.sub_delta_time(delta_time);
        let gravity = self.config.gravity();
        for _ in 0..self.config.delta_time_divisor {
            self.substep(sub_delta_time, gravity);
        }
        let contacts = self.resolve_collisions(spheres, cuboids);
        self.sync_positions()?;

        debug!(
            pairs = contacts.pairs_tested,
            node_contacts = contacts.node_contacts,
            static_contacts = contacts.static_contacts,
            "cpu tick"
        );

        Ok(TickReport {
            substeps: self.config.delta_time_divisor,
            sub_delta_time,
            contacts,
            wall_time: start.elapsed().as_secs_f64(),
        })
    }

    fn query_near(&self, centroid: Vec3, radius: f32) -> WeftResult<Vec<NodeId>> {
        check_query(centroid, radius)?;
        let radius_sq = radius * radius;
        let mut hits: Vec<NodeId> = self
            .hasher
            .query_near_sphere(centroid, radius)
            .filter(|&i| self.nodes[i].position().distance_squared(centroid) <= radius_sq)
            .map(NodeId::from_index)
            .collect();
        hits.sort_unstable();
        hits.dedup();
        Ok(hits)
    }

    fn node_position(&self, id: NodeId) -> WeftResult<Vec3> {
        Ok(self.spring_node(id)?.position())
    }

    fn node_velocity(&self, id: NodeId) -> WeftResult<Vec3> {
        Ok(self.spring_node(id)?.velocity())
    }

    fn snap_node(&mut self, id: NodeId, position: Vec3, update_velocity: bool) -> WeftResult<()> {
        check_node(id, self.nodes.len())?;
        let fixed_delta_time = self.config.fixed_delta_time;
        let node = &mut self.nodes[id.index()];
        node.snap_to(position, update_velocity, fixed_delta_time);
        self.hasher.update(id.index(), &*node);
        Ok(())
    }

    fn reset_to_initial_state(&mut self) -> WeftResult<()> {
        for node in &mut self.nodes {
            node.reset_to_initial_state();
        }
        self.sync_positions()
    }

    fn sync_positions(&mut self) -> WeftResult<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            self.hasher.update(i, node);
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            node_collisions: true,
            integrator_selection: true,
        }
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn damper_count(&self) -> usize {
        self.dampers.len()
    }

    fn damper_endpoints(&self) -> Vec<(NodeId, NodeId)> {
        self.dampers.iter().map(|d| (d.first, d.second)).collect()
    }

    fn positions(&self) -> Vec<Vec3> {
        self.nodes.iter().map(SpringNode::position).collect()
    }

    fn velocities(&self) -> Vec<Vec3> {
        self.nodes.iter().map(SpringNode::velocity).collect()
    }

    fn potential_energy(&self) -> f32 {
        self.dampers
            .iter()
            .map(|d| d.potential_energy(&self.nodes))
            .sum()
    }

    fn physics(&self) -> &PhysicsConfig {
        &self.config
    }

    fn is_finalized(&self) -> bool {
        self.phase == Phase::Finalized
    }

    fn name(&self) -> &str {
        "cpu"
    }
}
