//! Flat-buffer spring processor driving a [`GpuBackend`].
//!
//! Nodes live in one contiguous array with no per-node objects. The
//! canonical state is that array; every dispatch uploads it, runs a
//! kernel, and copies the outputs back. What callers see through
//! [`SpringProcessor::node_position`] is a separate published copy that
//! only [`SpringProcessor::sync_positions`] refreshes.
//!
//! This backend always integrates with explicit Euler and resolves static
//! colliders only; see [`Capabilities`].

use std::time::Instant;

use glam::Vec3;
use tracing::{debug, info, trace, warn};
use weft_contact::{ContactCounts, ImmovableCuboid, ImmovableSphere};
use weft_solver::processor::{
    check_damper, check_new_node, check_node, check_query, check_tick_inputs, Phase,
};
use weft_solver::{
    Capabilities, DamperType, IntegrationType, PhysicsConfig, SpringProcessor, TickReport,
};
use weft_types::{NodeId, WeftError, WeftResult};

use crate::backend::{CpuFallback, GpuBackend};
use crate::buffers::{ColliderSet, FlatTopology, GpuDamper, GpuNode, NodeOutput, SimParams};
use crate::kernels::Kernel;

pub struct GpuSpringProcessor {
    config: PhysicsConfig,
    backend: Box<dyn GpuBackend>,
    phase: Phase,
    nodes: Vec<GpuNode>,
    /// Per-node damper lists, flattened at finalization.
    pending_dampers: Vec<Vec<GpuDamper>>,
    dampers: Vec<GpuDamper>,
    endpoints: Vec<(NodeId, NodeId)>,
    outputs: Vec<NodeOutput>,
    initial_positions: Vec<Vec3>,
    published: Vec<Vec3>,
    dispatches: u64,
}

impl GpuSpringProcessor {
    /// Creates a processor on the given backend, initializing it.
    pub fn new(config: PhysicsConfig, mut backend: Box<dyn GpuBackend>) -> WeftResult<Self> {
        config.validate()?;
        backend.init()?;
        if config.integration_type != IntegrationType::ExplicitEuler {
            warn!(
                requested = config.integration_type.name(),
                "gpu backend always integrates with explicit_euler"
            );
        }
        Ok(Self {
            config,
            backend,
            phase: Phase::Building,
            nodes: Vec::new(),
            pending_dampers: Vec::new(),
            dampers: Vec::new(),
            endpoints: Vec::new(),
            outputs: Vec::new(),
            initial_positions: Vec::new(),
            published: Vec::new(),
            dispatches: 0,
        })
    }

    /// Creates a processor on the [`CpuFallback`] backend.
    pub fn with_cpu_fallback(config: PhysicsConfig) -> WeftResult<Self> {
        Self::new(config, Box::new(CpuFallback::new()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// The canonical node array, including state not yet published.
    pub fn flat_nodes(&self) -> &[GpuNode] {
        &self.nodes
    }

    /// The per-endpoint damper array (empty until finalization).
    pub fn flat_dampers(&self) -> &[GpuDamper] {
        &self.dampers
    }

    /// Kernel dispatches issued so far.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches
    }

    fn dispatch(
        &mut self,
        kernel: Kernel,
        params: &SimParams,
        colliders: &ColliderSet,
    ) -> WeftResult<()> {
        self.backend
            .dispatch(kernel, params, &self.nodes, colliders, &mut self.outputs)?;
        for (node, output) in self.nodes.iter_mut().zip(&self.outputs) {
            node.position = output.position;
            node.velocity = output.velocity;
        }
        self.dispatches += 1;
        trace!(kernel = kernel.entry_point(), "dispatch read back");
        Ok(())
    }
}

impl SpringProcessor for GpuSpringProcessor {
    fn add_node(&mut self, position: Vec3, radius: f32) -> WeftResult<NodeId> {
        self.phase.require_building("add_node")?;
        check_new_node(position, radius)?;

        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(GpuNode::new(position, radius));
        self.pending_dampers.push(Vec::new());
        self.initial_positions.push(position);
        self.published.push(position);
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

        let spring_constant = self.config.spring_constant_for(kind);
        self.pending_dampers[first.index()].push(GpuDamper::new(
            second,
            rest_distance,
            spring_constant,
        ));
        self.pending_dampers[second.index()].push(GpuDamper::new(
            first,
            rest_distance,
            spring_constant,
        ));
        self.endpoints.push((first, second));
        Ok(())
    }

    fn finalize_topology(&mut self) -> WeftResult<()> {
        self.phase.require_building("finalize_topology")?;

        let flat = FlatTopology::build(
            std::mem::take(&mut self.nodes),
            &std::mem::take(&mut self.pending_dampers),
        );
        self.nodes = flat.nodes;
        self.dampers = flat.dampers;
        self.outputs = vec![NodeOutput::default(); self.nodes.len()];
        self.backend.upload_topology(self.nodes.len(), &self.dampers)?;
        self.phase = Phase::Finalized;

        info!(
            backend = self.backend.name(),
            nodes = self.nodes.len(),
            dampers = self.endpoints.len(),
            damper_records = self.dampers.len(),
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
        let colliders = ColliderSet::from_scene(spheres, cuboids);
        let sub_delta_time = self.config.sub_delta_time(delta_time);
        let params = SimParams::new(&self.config, sub_delta_time, self.nodes.len(), &colliders);

        for _ in 0..self.config.delta_time_divisor {
            self.dispatch(Kernel::SpringForce, &params, &colliders)?;
        }
        self.dispatch(Kernel::ResolveCollisions, &params, &colliders)?;
        self.sync_positions()?;

        let contacts = ContactCounts {
            static_contacts: self.outputs.iter().map(|o| o.contacts).sum(),
            ..ContactCounts::default()
        };
        debug!(
            static_contacts = contacts.static_contacts,
            sentinel_spheres = colliders.uses_sentinel_spheres(),
            sentinel_cuboids = colliders.uses_sentinel_cuboids(),
            "gpu tick"
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
        Ok(self
            .published
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance_squared(centroid) <= radius_sq)
            .map(|(i, _)| NodeId::from_index(i))
            .collect())
    }

    fn node_position(&self, id: NodeId) -> WeftResult<Vec3> {
        check_node(id, self.published.len())?;
        Ok(self.published[id.index()])
    }

    fn node_velocity(&self, id: NodeId) -> WeftResult<Vec3> {
        check_node(id, self.nodes.len())?;
        Ok(self.nodes[id.index()].velocity())
    }

    fn snap_node(&mut self, id: NodeId, position: Vec3, update_velocity: bool) -> WeftResult<()> {
        check_node(id, self.nodes.len())?;
        let fixed_delta_time = self.config.fixed_delta_time;
        self.nodes[id.index()].snap_to(position, update_velocity, fixed_delta_time);
        Ok(())
    }

    fn reset_to_initial_state(&mut self) -> WeftResult<()> {
        let fixed_delta_time = self.config.fixed_delta_time;
        for (node, &start) in self.nodes.iter_mut().zip(&self.initial_positions) {
            node.snap_to(start, false, fixed_delta_time);
        }
        self.sync_positions()
    }

    fn sync_positions(&mut self) -> WeftResult<()> {
        if self.published.len() != self.nodes.len() {
            return Err(WeftError::Gpu(format!(
                "{} published positions for {} nodes",
                self.published.len(),
                self.nodes.len()
            )));
        }
        for (published, node) in self.published.iter_mut().zip(&self.nodes) {
            *published = node.position();
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            node_collisions: false,
            integrator_selection: false,
        }
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn damper_count(&self) -> usize {
        self.endpoints.len()
    }

    fn damper_endpoints(&self) -> Vec<(NodeId, NodeId)> {
        self.endpoints.clone()
    }

    fn positions(&self) -> Vec<Vec3> {
        self.published.clone()
    }

    fn velocities(&self) -> Vec<Vec3> {
        self.nodes.iter().map(GpuNode::velocity).collect()
    }

    fn potential_energy(&self) -> f32 {
        // Each spring appears once per endpoint; count it from the lower id.
        let mut energy = 0.0;
        for (index, node) in self.nodes.iter().enumerate() {
            for damper in &self.dampers[node.slice().range()] {
                let other = damper.other as usize;
                if other <= index {
                    continue;
                }
                let stretch =
                    node.position().distance(self.nodes[other].position()) - damper.rest_distance;
                energy += 0.5 * damper.spring_constant * stretch * stretch;
            }
        }
        energy
    }

    fn physics(&self) -> &PhysicsConfig {
        &self.config
    }

    fn is_finalized(&self) -> bool {
        self.phase == Phase::Finalized
    }

    fn name(&self) -> &str {
        "gpu"
    }
}

impl Drop for GpuSpringProcessor {
    fn drop(&mut self) {
        self.backend.release();
    }
}
