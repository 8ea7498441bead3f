//! In-process graph backend
//!
//! Runs the shelf chain over interleaved stereo `f32` samples with `biquad`
//! filters. Used on hosts that decode audio themselves and in tests.

use crate::{
    backend::{Endpoint, GraphBackend, NodeId},
    error::{GraphError, Result},
    types::{ElementHandle, ShelfFilter, ShelfKind},
};
use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz, Type, Q_BUTTERWORTH_F32};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One shelf node with independent left/right filter state
struct ShelfNode {
    filter: ShelfFilter,
    left: DirectForm2Transposed<f32>,
    right: DirectForm2Transposed<f32>,
}

impl ShelfNode {
    fn new(filter: ShelfFilter, sample_rate: u32) -> Result<Self> {
        let fs = Hertz::<f32>::from_hz(sample_rate as f32)
            .map_err(|e| GraphError::InvalidFilter(format!("sample rate: {:?}", e)))?;
        let f0 = Hertz::<f32>::from_hz(filter.frequency_hz)
            .map_err(|e| GraphError::InvalidFilter(format!("frequency: {:?}", e)))?;

        let kind = match filter.kind {
            ShelfKind::Low => Type::LowShelf(filter.gain_db),
            ShelfKind::High => Type::HighShelf(filter.gain_db),
        };

        let coefficients = Coefficients::<f32>::from_params(kind, fs, f0, Q_BUTTERWORTH_F32)
            .map_err(|e| {
                GraphError::InvalidFilter(format!(
                    "{:?} shelf at {} Hz: {:?}",
                    filter.kind, filter.frequency_hz, e
                ))
            })?;

        Ok(Self {
            filter,
            left: DirectForm2Transposed::<f32>::new(coefficients),
            right: DirectForm2Transposed::<f32>::new(coefficients),
        })
    }

    #[inline]
    fn process(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            frame[0] = self.left.run(frame[0]);
            frame[1] = self.right.run(frame[1]);
        }
    }
}

/// Audio graph processed in-process
///
/// Samples enter at the source, pass through every filter on the connected
/// path and leave at the destination. If the source has no path to the
/// destination the output is silence, like an unconnected Web Audio source.
///
/// Cloning gives another handle to the same graph, so the host can keep one
/// for its render loop while a [`crate::FilterGraph`] owns the other.
#[derive(Clone)]
pub struct DspGraph {
    sample_rate: u32,
    state: Rc<RefCell<DspState>>,
}

#[derive(Default)]
struct DspState {
    element: Option<ElementHandle>,
    nodes: HashMap<NodeId, ShelfNode>,
    edges: Vec<(Endpoint, Endpoint)>,
    next_id: u32,
}

impl DspState {
    /// Walk from source to destination
    fn path(&self) -> Option<Vec<NodeId>> {
        let mut path = Vec::new();
        let mut current = Endpoint::Source;

        // A linear chain never visits more than every node once
        for _ in 0..=self.nodes.len() {
            let next = self
                .edges
                .iter()
                .find(|(from, _)| *from == current)
                .map(|(_, to)| *to)?;

            match next {
                Endpoint::Destination => return Some(path),
                Endpoint::Filter(id) => {
                    path.push(id);
                    current = next;
                }
                Endpoint::Source => return None,
            }
        }

        None
    }
}

impl DspGraph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: Rc::new(RefCell::new(DspState::default())),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Element the source node is bound to
    pub fn element(&self) -> Option<ElementHandle> {
        self.state.borrow().element
    }

    /// Current connections
    pub fn edges(&self) -> Vec<(Endpoint, Endpoint)> {
        self.state.borrow().edges.clone()
    }

    /// Number of live filter nodes
    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    /// Filter specs along the connected path, or `None` if the source does
    /// not reach the destination
    pub fn connected_filters(&self) -> Option<Vec<ShelfFilter>> {
        let state = self.state.borrow();
        state.path().map(|path| {
            path.iter()
                .filter_map(|id| state.nodes.get(id).map(|node| node.filter))
                .collect()
        })
    }

    /// Process interleaved stereo samples in place
    pub fn process(&self, buffer: &mut [f32]) {
        let mut state = self.state.borrow_mut();
        let Some(path) = state.path() else {
            buffer.fill(0.0);
            return;
        };

        for id in path {
            if let Some(node) = state.nodes.get_mut(&id) {
                node.process(buffer);
            }
        }
    }
}

impl GraphBackend for DspGraph {
    fn open(&mut self, element: ElementHandle) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(GraphError::Capability("sample rate is zero".to_string()));
        }
        self.state.borrow_mut().element = Some(element);
        Ok(())
    }

    fn create_shelf(&mut self, filter: &ShelfFilter) -> Result<NodeId> {
        let node = ShelfNode::new(*filter, self.sample_rate)?;
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = NodeId(state.next_id);
        state.nodes.insert(id, node);
        Ok(id)
    }

    fn connect(&mut self, from: Endpoint, to: Endpoint) -> Result<()> {
        let mut state = self.state.borrow_mut();
        for endpoint in [from, to] {
            if let Endpoint::Filter(id) = endpoint {
                if !state.nodes.contains_key(&id) {
                    return Err(GraphError::UnknownNode(id.0));
                }
            }
        }
        state.edges.push((from, to));
        Ok(())
    }

    fn disconnect(&mut self, node: Endpoint) {
        self.state
            .borrow_mut()
            .edges
            .retain(|(from, _)| *from != node);
    }

    fn release(&mut self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        state.nodes.remove(&node);
        state
            .edges
            .retain(|(from, to)| *from != Endpoint::Filter(node) && *to != Endpoint::Filter(node));
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.nodes.clear();
        state.edges.clear();
        state.element = None;
    }
}
