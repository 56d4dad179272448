//! Error types for topology operations
//!
//! All mutation operations are atomic: on any error, no partial state change
//! is retained. Lookup misses surface as the `*NotFound` variants, which the
//! hosting request router maps to 404 responses.

use thiserror::Error;

/// Errors that can occur in topology operations
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Device lookup miss
    #[error("device {0} not found")]
    DeviceNotFound(String),

    /// Interface lookup miss
    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    /// Link lookup miss
    #[error("link {0} not found")]
    LinkNotFound(String),

    /// Metadata key lookup miss on delete
    #[error("metadata key {0} not found")]
    MetadataKeyNotFound(String),

    /// An operation required a different connection state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed identifier or circuit definition
    #[error("validation error: {0}")]
    Validation(String),

    /// Snapshot or config (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading failure
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot restore failed; every unresolved reference is listed and the
    /// live topology was left untouched
    #[error("snapshot restore failed: {}", .0.join("; "))]
    Restore(Vec<String>),
}

impl TopologyError {
    /// Whether this error is a lookup miss (404-equivalent at the boundary)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TopologyError::DeviceNotFound(_)
                | TopologyError::InterfaceNotFound(_)
                | TopologyError::LinkNotFound(_)
                | TopologyError::MetadataKeyNotFound(_)
        )
    }
}

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;
