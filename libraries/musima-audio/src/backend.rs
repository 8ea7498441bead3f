//! Platform audio-graph abstraction
//!
//! Abstracts the audio-processing graph for different hosts (Web Audio in the
//! browser, the in-process biquad graph on native, ...)

use crate::error::{GraphError, Result};
use crate::types::{ElementHandle, ShelfFilter};

/// Handle to a filter node created by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// One end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The persistent source node bound to the media element
    Source,
    /// A filter node
    Filter(NodeId),
    /// The output device
    Destination,
}

/// Platform audio-processing graph
///
/// Implementors own the actual processing context. [`crate::FilterGraph`]
/// drives them and never calls `open` again before `close`.
pub trait GraphBackend {
    /// Create the processing context and the single source node bound to `element`
    ///
    /// # Returns
    /// * `Err(GraphError::Capability(_))` - the host cannot process audio
    fn open(&mut self, element: ElementHandle) -> Result<()>;

    /// Create a shelving filter node (not yet connected)
    fn create_shelf(&mut self, filter: &ShelfFilter) -> Result<NodeId>;

    /// Connect the output of `from` to the input of `to`
    fn connect(&mut self, from: Endpoint, to: Endpoint) -> Result<()>;

    /// Disconnect every outgoing connection of `node`
    fn disconnect(&mut self, node: Endpoint);

    /// Drop a filter node that is no longer part of the chain
    fn release(&mut self, node: NodeId) {
        let _ = node;
    }

    /// Tear down the processing context
    fn close(&mut self);
}

/// Backend for hosts with no audio-processing support
///
/// `open` always fails with a capability error so callers fall back to
/// unfiltered playback.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGraph {
    reason: Option<String>,
}

impl UnavailableGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl GraphBackend for UnavailableGraph {
    fn open(&mut self, _element: ElementHandle) -> Result<()> {
        Err(GraphError::Capability(
            self.reason
                .clone()
                .unwrap_or_else(|| "no audio processing on this host".to_string()),
        ))
    }

    fn create_shelf(&mut self, _filter: &ShelfFilter) -> Result<NodeId> {
        Err(GraphError::NotInitialized)
    }

    fn connect(&mut self, _from: Endpoint, _to: Endpoint) -> Result<()> {
        Err(GraphError::NotInitialized)
    }

    fn disconnect(&mut self, _node: Endpoint) {}

    fn close(&mut self) {}
}
