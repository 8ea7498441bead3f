//! Filter graph builder
//!
//! Owns the chain `source -> [low shelf] -> [high shelf] -> destination` and
//! rewires it whenever the tone gains change.

use crate::{
    backend::{Endpoint, GraphBackend, NodeId},
    error::{GraphError, Result},
    types::{ElementHandle, GraphNode, ShelfFilter, ShelfSettings, ToneGains},
};

/// Tone filter chain bound to one media element
///
/// Structure:
/// ```text
/// source ──> low shelf (bass ≠ 0) ──> high shelf (treble ≠ 0) ──> destination
/// ```
///
/// The source node is created once per element. Rebuilding only swaps the
/// filters in between.
pub struct FilterGraph {
    backend: Box<dyn GraphBackend>,
    settings: ShelfSettings,

    // Element the source node is bound to
    bound: Option<ElementHandle>,

    // Currently connected filters, in chain order
    chain: Vec<(NodeId, ShelfFilter)>,

    gains: ToneGains,
}

impl FilterGraph {
    /// Create a graph with default shelf settings (200 Hz / 2 kHz, ×10)
    pub fn new(backend: Box<dyn GraphBackend>) -> Self {
        Self::with_settings(backend, ShelfSettings::default())
    }

    pub fn with_settings(backend: Box<dyn GraphBackend>, settings: ShelfSettings) -> Self {
        Self {
            backend,
            settings,
            bound: None,
            chain: Vec::new(),
            gains: ToneGains::flat(),
        }
    }

    /// Create the processing context and bind the source node to `element`
    ///
    /// Calling this again for the same element is a no-op: the platform only
    /// allows one source node per element.
    pub fn initialize(&mut self, element: ElementHandle) -> Result<()> {
        match self.bound {
            Some(bound) if bound == element => return Ok(()),
            Some(bound) => {
                return Err(GraphError::SourceAlreadyBound {
                    bound,
                    requested: element,
                })
            }
            None => {}
        }

        self.backend.open(element)?;
        if let Err(e) = self.backend.connect(Endpoint::Source, Endpoint::Destination) {
            self.backend.close();
            return Err(e);
        }
        self.bound = Some(element);

        tracing::debug!(element = %element, "Filter graph initialized");
        Ok(())
    }

    /// Replace the filter chain for the given gains
    ///
    /// Previously connected filters are disconnected first. With both gains at
    /// zero the source is wired straight to the destination.
    ///
    /// On failure the partial chain is released and the source is wired
    /// straight to the destination again, so playback continues unfiltered.
    pub fn rebuild_chain(&mut self, gains: ToneGains) -> Result<()> {
        if self.bound.is_none() {
            return Err(GraphError::NotInitialized);
        }

        if let Err(e) = self.connect_chain(gains) {
            tracing::warn!(error = %e, "Filter chain failed, bypassing filters");
            self.bypass();
            return Err(e);
        }
        Ok(())
    }

    fn connect_chain(&mut self, gains: ToneGains) -> Result<()> {
        self.teardown_chain();

        let mut previous = Endpoint::Source;
        for filter in self.settings.filters_for(gains) {
            let node = self.backend.create_shelf(&filter)?;
            self.chain.push((node, filter));
            self.backend.connect(previous, Endpoint::Filter(node))?;
            previous = Endpoint::Filter(node);
        }
        self.backend.connect(previous, Endpoint::Destination)?;
        self.gains = gains;

        tracing::debug!(
            bass = gains.bass(),
            treble = gains.treble(),
            filters = self.chain.len(),
            "Filter chain rebuilt"
        );
        Ok(())
    }

    /// Wire the source straight to the destination
    ///
    /// If even that fails the graph is closed.
    fn bypass(&mut self) {
        self.teardown_chain();
        self.gains = ToneGains::flat();
        if let Err(e) = self.backend.connect(Endpoint::Source, Endpoint::Destination) {
            tracing::warn!(error = %e, "Could not restore unfiltered routing");
            self.close();
        }
    }

    /// Disconnect and release every filter, leaving the source unconnected
    fn teardown_chain(&mut self) {
        for (node, _) in self.chain.drain(..) {
            self.backend.disconnect(Endpoint::Filter(node));
            self.backend.release(node);
        }
        self.backend.disconnect(Endpoint::Source);
    }

    /// Connected chain from source to destination
    ///
    /// Empty until the graph is initialized.
    pub fn topology(&self) -> Vec<GraphNode> {
        if self.bound.is_none() {
            return Vec::new();
        }

        let mut nodes = Vec::with_capacity(self.chain.len() + 2);
        nodes.push(GraphNode::Source);
        nodes.extend(self.chain.iter().map(|(_, filter)| GraphNode::Shelf(*filter)));
        nodes.push(GraphNode::Destination);
        nodes
    }

    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    pub fn bound_element(&self) -> Option<ElementHandle> {
        self.bound
    }

    /// Gains of the chain as last built
    pub fn gains(&self) -> ToneGains {
        self.gains
    }

    pub fn settings(&self) -> &ShelfSettings {
        &self.settings
    }

    /// Release the chain and the processing context
    pub fn close(&mut self) {
        if self.bound.take().is_some() {
            self.teardown_chain();
            self.backend.close();
            tracing::debug!("Filter graph closed");
        }
    }
}

impl Drop for FilterGraph {
    fn drop(&mut self) {
        self.close();
    }
}
