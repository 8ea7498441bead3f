//! Web Audio backend for the tone filter graph

use musima_audio::{
    ElementHandle, Endpoint, GraphBackend, GraphError, NodeId, ShelfFilter, ShelfKind,
};
use std::collections::HashMap;
use wasm_bindgen::JsValue;
use web_sys::{
    AudioContext, AudioNode, BiquadFilterNode, BiquadFilterType, HtmlAudioElement,
    MediaElementAudioSourceNode,
};

fn js_error(context: &str, value: &JsValue) -> String {
    format!("{}: {}", context, value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

/// `AudioContext` + one `MediaElementAudioSourceNode` + biquad shelves
///
/// A media element can only ever feed one source node, so `open` must not be
/// called twice; [`musima_audio::FilterGraph`] guarantees that.
pub struct WebAudioGraph {
    audio: HtmlAudioElement,
    context: Option<AudioContext>,
    source: Option<MediaElementAudioSourceNode>,
    filters: HashMap<NodeId, BiquadFilterNode>,
    next_id: u32,
}

impl WebAudioGraph {
    pub fn new(audio: HtmlAudioElement) -> Self {
        Self {
            audio,
            context: None,
            source: None,
            filters: HashMap::new(),
            next_id: 0,
        }
    }

    fn context(&self) -> musima_audio::Result<&AudioContext> {
        self.context.as_ref().ok_or(GraphError::NotInitialized)
    }

    fn node(&self, endpoint: Endpoint) -> musima_audio::Result<AudioNode> {
        match endpoint {
            Endpoint::Source => {
                let source = self.source.as_ref().ok_or(GraphError::NotInitialized)?;
                Ok(AudioNode::from(source.clone()))
            }
            Endpoint::Filter(id) => self
                .filters
                .get(&id)
                .map(|filter| AudioNode::from(filter.clone()))
                .ok_or(GraphError::UnknownNode(id.0)),
            Endpoint::Destination => Ok(AudioNode::from(self.context()?.destination())),
        }
    }
}

impl GraphBackend for WebAudioGraph {
    fn open(&mut self, element: ElementHandle) -> musima_audio::Result<()> {
        let context = AudioContext::new()
            .map_err(|e| GraphError::Capability(js_error("AudioContext unavailable", &e)))?;
        let source = context
            .create_media_element_source(&self.audio)
            .map_err(|e| GraphError::Capability(js_error("Cannot create media source", &e)))?;

        tracing::debug!(element = %element, "Web Audio context opened");
        self.context = Some(context);
        self.source = Some(source);
        Ok(())
    }

    fn create_shelf(&mut self, filter: &ShelfFilter) -> musima_audio::Result<NodeId> {
        let node = self
            .context()?
            .create_biquad_filter()
            .map_err(|e| GraphError::Backend(js_error("createBiquadFilter failed", &e)))?;

        node.set_type(match filter.kind {
            ShelfKind::Low => BiquadFilterType::Lowshelf,
            ShelfKind::High => BiquadFilterType::Highshelf,
        });
        node.frequency().set_value(filter.frequency_hz);
        node.gain().set_value(filter.gain_db);

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.filters.insert(id, node);
        Ok(id)
    }

    fn connect(&mut self, from: Endpoint, to: Endpoint) -> musima_audio::Result<()> {
        let from = self.node(from)?;
        let to = self.node(to)?;
        from.connect_with_audio_node(&to)
            .map_err(|e| GraphError::Backend(js_error("connect failed", &e)))?;
        Ok(())
    }

    fn disconnect(&mut self, node: Endpoint) {
        if let Ok(node) = self.node(node) {
            node.disconnect().ok();
        }
    }

    fn release(&mut self, node: NodeId) {
        self.filters.remove(&node);
    }

    fn close(&mut self) {
        self.filters.clear();
        if let Some(source) = self.source.take() {
            source.disconnect().ok();
        }
        if let Some(context) = self.context.take() {
            // close() settles asynchronously; nothing waits on it
            context.close().ok();
        }
    }
}
