//! # weft-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the weft spring-mass cloth engine.
//!
//! This crate has no simulation logic. It defines the vocabulary
//! the solver, contact, and GPU crates agree on.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{WeftError, WeftResult};
pub use ids::NodeId;
