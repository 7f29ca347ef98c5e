//! Error types for the weft engine.
//!
//! All crates return `WeftResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the weft engine.
#[derive(Debug, Error)]
pub enum WeftError {
    /// Configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Node/damper topology references something that does not exist.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Operation is not allowed in the processor's current phase
    /// (e.g. adding a node after finalization, ticking before it).
    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    /// A node id outside the processor's node range.
    #[error("Unknown node {index} (processor has {count} nodes)")]
    UnknownNode {
        index: u32,
        count: usize,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// GPU backend error.
    #[error("GPU error: {0}")]
    Gpu(String),
}

/// Convenience alias for `Result<T, WeftError>`.
pub type WeftResult<T> = Result<T, WeftError>;
