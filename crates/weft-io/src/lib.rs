//! # weft-io
//!
//! Simulation run contract and input validation.
//!
//! A [`SimulationInput`] describes one run: physics parameters, backend,
//! the cloth to build, static colliders, tick count and output paths.
//! It is read from TOML by the CLI and checked with [`validate_input`].

pub mod contract;
pub mod validator;

pub use contract::{BackendKind, ClothSpec, ColliderSpec, OutputSpec, SimulationInput};
pub use validator::validate_input;
