//! GPU compute backend trait and CPU fallback.
//!
//! The [`GpuBackend`] trait defines the interface for dispatching the
//! spring kernels over a flat node array. The [`CpuFallback`]
//! implementation executes the reference kernels workgroup by workgroup
//! on the CPU, serving as a reference for correctness.

use tracing::trace;
use weft_types::constants::WORKGROUP_SIZE;
use weft_types::{WeftError, WeftResult};

use crate::buffers::{ColliderSet, GpuDamper, GpuNode, NodeOutput, SimParams};
use crate::kernels::{self, workgroup_count, Kernel};

/// Trait for GPU/CPU compute backends.
///
/// The processor uploads the immutable damper array once, then for every
/// dispatch hands over the current node array and receives one output
/// record per node.
///
/// # Implementations
/// - [`CpuFallback`]: reference kernels on the CPU (always available)
/// - `WgpuBackend`: WGSL compute via wgpu (feature `wgpu`)
pub trait GpuBackend: Send {
    /// Initialize the backend. Called once before any upload.
    fn init(&mut self) -> WeftResult<()>;

    /// Returns the backend name (e.g., "cpu_fallback", "wgpu").
    fn name(&self) -> &str;

    /// Returns true if the backend runs on a GPU.
    fn is_gpu(&self) -> bool;

    /// Allocates per-topology buffers and uploads the damper array.
    fn upload_topology(&mut self, node_count: usize, dampers: &[GpuDamper]) -> WeftResult<()>;

    /// Runs `kernel` once for every node, blocking until `out` holds the
    /// results.
    fn dispatch(
        &mut self,
        kernel: Kernel,
        params: &SimParams,
        nodes: &[GpuNode],
        colliders: &ColliderSet,
        out: &mut [NodeOutput],
    ) -> WeftResult<()>;

    /// Frees per-topology buffers. Safe to call more than once.
    fn release(&mut self);
}

/// Checks the buffer lengths every backend relies on.
pub(crate) fn check_dispatch(
    params: &SimParams,
    nodes: &[GpuNode],
    colliders: &ColliderSet,
    out: &[NodeOutput],
) -> WeftResult<()> {
    if nodes.len() != params.node_count as usize || out.len() != nodes.len() {
        return Err(WeftError::Gpu(format!(
            "dispatch over {} nodes with {} outputs, params say {}",
            nodes.len(),
            out.len(),
            params.node_count
        )));
    }
    if colliders.spheres.len() < params.sphere_count as usize
        || colliders.cuboids.len() < params.cuboid_count as usize
    {
        return Err(WeftError::Gpu("collider counts exceed buffers".into()));
    }
    Ok(())
}

/// CPU fallback backend: the reference kernels executed in workgroup order.
///
/// Used for:
/// - Platforms without GPU support
/// - Correctness validation (GPU results should match it)
/// - Tests
#[derive(Debug, Default)]
pub struct CpuFallback {
    initialized: bool,
    dampers: Vec<GpuDamper>,
    node_count: usize,
    dispatches: u64,
}

impl CpuFallback {
    /// Creates a new CPU fallback backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of kernel dispatches executed so far.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches
    }
}

impl GpuBackend for CpuFallback {
    fn init(&mut self) -> WeftResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "cpu_fallback"
    }

    fn is_gpu(&self) -> bool {
        false
    }

    fn upload_topology(&mut self, node_count: usize, dampers: &[GpuDamper]) -> WeftResult<()> {
        if !self.initialized {
            return Err(WeftError::Gpu("backend used before init".into()));
        }
        if let Some(bad) = dampers.iter().find(|d| d.other as usize >= node_count) {
            return Err(WeftError::Gpu(format!(
                "damper points at node {} of {node_count}",
                bad.other
            )));
        }
        self.dampers = dampers.to_vec();
        self.node_count = node_count;
        Ok(())
    }

    fn dispatch(
        &mut self,
        kernel: Kernel,
        params: &SimParams,
        nodes: &[GpuNode],
        colliders: &ColliderSet,
        out: &mut [NodeOutput],
    ) -> WeftResult<()> {
        check_dispatch(params, nodes, colliders, out)?;
        if nodes.len() != self.node_count {
            return Err(WeftError::Gpu(format!(
                "topology has {} nodes, dispatch got {}",
                self.node_count,
                nodes.len()
            )));
        }

        let groups = workgroup_count(nodes.len());
        trace!(kernel = kernel.entry_point(), groups, "cpu fallback dispatch");

        for group in 0..groups {
            for lane in 0..WORKGROUP_SIZE {
                let index = (group * WORKGROUP_SIZE + lane) as usize;
                if index >= nodes.len() {
                    break;
                }
                out[index] = match kernel {
                    Kernel::SpringForce => {
                        kernels::spring_force(params, nodes, &self.dampers, index)
                    }
                    Kernel::ResolveCollisions => {
                        kernels::resolve_collisions(params, nodes, colliders, index)
                    }
                };
            }
        }

        self.dispatches += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.dampers = Vec::new();
        self.node_count = 0;
    }
}
