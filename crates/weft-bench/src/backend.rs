//! Processor factory: picks a spring processor implementation at
//! construction time.

use tracing::{debug, info};
use weft_gpu::GpuSpringProcessor;
use weft_io::BackendKind;
use weft_solver::{CpuSpringProcessor, IntegrationType, PhysicsConfig, SpringProcessor};
use weft_types::WeftResult;

/// Builds an empty processor of the requested kind.
///
/// Flat-buffer backends always integrate with explicit Euler; their
/// config is switched to it here so reports show what actually runs.
pub fn create_processor(
    kind: BackendKind,
    mut physics: PhysicsConfig,
    grid_size: f32,
) -> WeftResult<Box<dyn SpringProcessor>> {
    if kind.is_flat() && physics.integration_type != IntegrationType::ExplicitEuler {
        debug!(
            backend = %kind,
            requested = physics.integration_type.name(),
            "switching to explicit_euler"
        );
        physics.integration_type = IntegrationType::ExplicitEuler;
    }

    let processor: Box<dyn SpringProcessor> = match kind {
        BackendKind::Cpu => Box::new(CpuSpringProcessor::new(physics, grid_size)?),
        BackendKind::GpuFallback => Box::new(GpuSpringProcessor::with_cpu_fallback(physics)?),
        BackendKind::Wgpu => wgpu_processor(physics)?,
    };
    info!(backend = %kind, processor = processor.name(), "processor created");
    Ok(processor)
}

#[cfg(feature = "wgpu")]
fn wgpu_processor(physics: PhysicsConfig) -> WeftResult<Box<dyn SpringProcessor>> {
    let backend = weft_gpu::WgpuBackend::new();
    Ok(Box::new(GpuSpringProcessor::new(physics, Box::new(backend))?))
}

#[cfg(not(feature = "wgpu"))]
fn wgpu_processor(_physics: PhysicsConfig) -> WeftResult<Box<dyn SpringProcessor>> {
    Err(weft_types::WeftError::Gpu(
        "built without the `wgpu` feature".into(),
    ))
}
