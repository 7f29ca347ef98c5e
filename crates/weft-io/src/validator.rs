//! Input validation.
//!
//! Catches data-level errors before any processor is built.

use weft_solver::IntegrationType;
use weft_types::{WeftError, WeftResult};

use crate::contract::{ClothSpec, ColliderSpec, SimulationInput};

/// Upper bound on cloth divisions accepted from a run file.
pub const MAX_DIVISIONS: u32 = 512;

/// Validates a complete simulation input.
///
/// Checks the physics parameters, the time step and tick count, the
/// cloth dimensions, every collider and the output cadence.
pub fn validate_input(input: &SimulationInput) -> WeftResult<()> {
    input.physics.validate()?;

    if !(input.grid_size > 0.0 && input.grid_size.is_finite()) {
        return Err(WeftError::InvalidConfig(format!(
            "grid_size must be positive, got {}",
            input.grid_size
        )));
    }
    if !(input.delta_time > 0.0 && input.delta_time <= 1.0) {
        return Err(WeftError::InvalidConfig(format!(
            "delta_time must be in (0, 1], got {}",
            input.delta_time
        )));
    }
    if input.ticks == 0 {
        return Err(WeftError::InvalidConfig("ticks must be >= 1".into()));
    }
    if input.episodes == 0 {
        return Err(WeftError::InvalidConfig("episodes must be >= 1".into()));
    }

    validate_cloth(&input.cloth)?;
    for (index, collider) in input.colliders.iter().enumerate() {
        validate_collider(index, collider)?;
    }
    if input.cuboids().iter().any(|c| c.contains(input.cloth.center)) {
        tracing::warn!(center = %input.cloth.center, "cloth starts inside a cuboid collider");
    }

    if input.outputs.record_every == 0 {
        return Err(WeftError::InvalidConfig(
            "outputs.record_every must be >= 1".into(),
        ));
    }

    if input.backend.is_flat() && input.physics.integration_type != IntegrationType::ExplicitEuler {
        tracing::warn!(
            backend = %input.backend,
            integrator = input.physics.integration_type.name(),
            "flat-buffer backends integrate with explicit Euler"
        );
    }

    Ok(())
}

fn validate_cloth(cloth: &ClothSpec) -> WeftResult<()> {
    if !cloth.center.is_finite() {
        return Err(WeftError::InvalidConfig("cloth.center must be finite".into()));
    }
    if !(cloth.width > 0.0 && cloth.width.is_finite())
        || !(cloth.height > 0.0 && cloth.height.is_finite())
    {
        return Err(WeftError::InvalidConfig(format!(
            "cloth dimensions must be positive, got {} x {}",
            cloth.width, cloth.height
        )));
    }
    if cloth.divisions == 0 || cloth.divisions > MAX_DIVISIONS {
        return Err(WeftError::InvalidConfig(format!(
            "cloth.divisions must be in 1..={MAX_DIVISIONS}, got {}",
            cloth.divisions
        )));
    }
    Ok(())
}

fn validate_collider(index: usize, collider: &ColliderSpec) -> WeftResult<()> {
    match *collider {
        ColliderSpec::Sphere { center, radius } => {
            if !center.is_finite() || !(radius > 0.0 && radius.is_finite()) {
                return Err(WeftError::InvalidConfig(format!(
                    "collider {index}: sphere needs a finite centre and positive radius"
                )));
            }
        }
        ColliderSpec::Cuboid { minimum, maximum } => {
            if !minimum.is_finite() || !maximum.is_finite() {
                return Err(WeftError::InvalidConfig(format!(
                    "collider {index}: cuboid corners must be finite"
                )));
            }
            if minimum.cmpge(maximum).any() {
                return Err(WeftError::InvalidConfig(format!(
                    "collider {index}: cuboid minimum {minimum} is not below maximum {maximum}"
                )));
            }
        }
    }
    Ok(())
}
