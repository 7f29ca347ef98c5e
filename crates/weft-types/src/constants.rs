//! Physical constants and simulation defaults.

/// Magnitude of the base gravity vector (m/s²), before the cloth multiplier.
pub const GRAVITY: f32 = 9.81;

/// Default fixed physics tick (seconds). 1/50th of a second.
pub const DEFAULT_FIXED_DT: f32 = 1.0 / 50.0;

/// Default number of integration sub-steps per tick.
pub const DEFAULT_DELTA_TIME_DIVISOR: u32 = 20;

/// Upper bound on sub-steps per tick accepted by configuration validation.
pub const MAX_DELTA_TIME_DIVISOR: u32 = 30;

/// Default edge length of a spatial hash cell (meters).
pub const DEFAULT_GRID_SIZE: f32 = 0.1;

/// Compute shader workgroup width used by the GPU kernels.
pub const WORKGROUP_SIZE: u32 = 32;

/// Coordinate used for sentinel collider records that can never be touched.
pub const SENTINEL_COORDINATE: f32 = -99_999.0;

