//! Error types for the engine crate.
//!
//! Build-time errors abort startup. `NotFound` is the only error the query
//! path produces and is meant to be handed back to the caller as a value.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The configuration cannot be satisfied by the data (fatal at build time)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A linear-algebra step produced no usable result
    #[error("Decomposition failed: {0}")]
    Decomposition(String),

    /// The queried title is not in the item index
    #[error("Title not found: '{title}'")]
    NotFound { title: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
