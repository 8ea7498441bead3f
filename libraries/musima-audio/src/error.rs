//! Error types for the filter graph

use crate::types::ElementHandle;
use thiserror::Error;

/// Filter graph errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// The host has no audio-processing capability
    #[error("Audio processing unavailable: {0}")]
    Capability(String),

    /// The source node is already bound to another element
    #[error("Source already bound to element {bound}, cannot bind {requested}")]
    SourceAlreadyBound {
        /// Element the graph is bound to
        bound: ElementHandle,
        /// Element that was requested
        requested: ElementHandle,
    },

    /// `rebuild_chain` called before `initialize`
    #[error("Filter graph not initialized")]
    NotInitialized,

    /// Filter parameters rejected by the backend
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Unknown node handle
    #[error("Unknown node: {0}")]
    UnknownNode(u32),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl GraphError {
    /// Whether this error means the platform cannot do audio processing at all
    pub fn is_capability(&self) -> bool {
        matches!(self, GraphError::Capability(_))
    }
}

/// Result type for filter graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
