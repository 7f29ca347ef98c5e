//! # weft-gpu
//!
//! Data-parallel spring processing over flat buffers.
//!
//! Provides a [`GpuBackend`] trait with two implementations:
//! - [`CpuFallback`]: reference kernels on the CPU (always available)
//! - `WgpuBackend`: WGSL compute shaders via wgpu (feature `wgpu`)
//!
//! [`GpuSpringProcessor`] implements the same
//! [`SpringProcessor`](weft_solver::SpringProcessor) contract as the CPU
//! processor, restricted to explicit Euler and static colliders.

pub mod backend;
pub mod buffers;
pub mod kernels;
pub mod processor;
#[cfg(feature = "wgpu")]
pub mod wgpu_backend;

pub use backend::{CpuFallback, GpuBackend};
pub use buffers::{
    ColliderSet, FlatTopology, GpuCuboid, GpuDamper, GpuNode, GpuSphere, NodeOutput, SimParams,
    Slice,
};
pub use kernels::Kernel;
pub use processor::GpuSpringProcessor;
#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuBackend;
