// Render graph - tone generators feeding gain envelopes feeding the output
//
// The control side (scheduler) creates nodes, wires them and sets their
// start/stop times; the render side pulls one mono sample per frame.
// Both sides share the graph through `Arc<Mutex<RenderGraph>>`; the device
// callback only ever `try_lock`s it.

use std::collections::BTreeMap;

use crate::audio::clock::{frames_to_seconds, seconds_to_frames};
use crate::synth::envelope::GainEnvelope;
use crate::synth::oscillator::{ToneGenerator, Waveform};

/// Handle of a node inside one graph
pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not a tone generator")]
    NotATone(NodeId),

    #[error("Node {0} is not a gain node")]
    NotAGain(NodeId),
}

#[derive(Debug)]
struct ToneNode {
    generator: ToneGenerator,
    output: Option<NodeId>,
}

#[derive(Debug)]
struct GainNode {
    envelope: GainEnvelope,
    inputs: Vec<NodeId>,
    to_destination: bool,
}

/// Read-only view of a scheduled tone generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSnapshot {
    pub id: NodeId,
    pub frequency: f64,
    pub waveform: Waveform,
    /// Start time in seconds, if started
    pub start: Option<f64>,
    /// Stop time in seconds, if a stop is scheduled
    pub stop: Option<f64>,
    pub output: Option<NodeId>,
}

#[derive(Debug)]
pub struct RenderGraph {
    sample_rate: f64,
    tones: BTreeMap<NodeId, ToneNode>,
    gains: BTreeMap<NodeId, GainNode>,
    next_id: NodeId,
}

impl RenderGraph {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            tones: BTreeMap::new(),
            gains: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn create_tone(&mut self, waveform: Waveform) -> NodeId {
        let id = self.allocate_id();
        let generator = ToneGenerator::new(waveform, self.sample_rate as f32);
        self.tones.insert(
            id,
            ToneNode {
                generator,
                output: None,
            },
        );
        id
    }

    pub fn create_gain(&mut self) -> NodeId {
        let id = self.allocate_id();
        self.gains.insert(
            id,
            GainNode {
                envelope: GainEnvelope::default(),
                inputs: Vec::new(),
                to_destination: false,
            },
        );
        id
    }

    fn tone_mut(&mut self, id: NodeId) -> Result<&mut ToneNode, GraphError> {
        if self.gains.contains_key(&id) {
            return Err(GraphError::NotATone(id));
        }
        self.tones.get_mut(&id).ok_or(GraphError::UnknownNode(id))
    }

    fn gain_mut(&mut self, id: NodeId) -> Result<&mut GainNode, GraphError> {
        if self.tones.contains_key(&id) {
            return Err(GraphError::NotAGain(id));
        }
        self.gains.get_mut(&id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn set_frequency(&mut self, tone: NodeId, frequency: f64) -> Result<(), GraphError> {
        self.tone_mut(tone)?.generator.set_frequency(frequency);
        Ok(())
    }

    pub fn envelope_mut(&mut self, gain: NodeId) -> Result<&mut GainEnvelope, GraphError> {
        Ok(&mut self.gain_mut(gain)?.envelope)
    }

    /// Route a tone generator into a gain node (replacing any previous route)
    pub fn connect(&mut self, tone: NodeId, gain: NodeId) -> Result<(), GraphError> {
        self.gain_mut(gain)?;
        let previous = self.tone_mut(tone)?.output.replace(gain);
        if let Some(old) = previous.and_then(|id| self.gains.get_mut(&id)) {
            old.inputs.retain(|&input| input != tone);
        }
        self.gain_mut(gain)?.inputs.push(tone);
        Ok(())
    }

    pub fn connect_to_destination(&mut self, gain: NodeId) -> Result<(), GraphError> {
        self.gain_mut(gain)?.to_destination = true;
        Ok(())
    }

    /// Schedule a tone to start at a context time in seconds
    pub fn start(&mut self, tone: NodeId, when: f64) -> Result<(), GraphError> {
        let frame = seconds_to_frames(when, self.sample_rate);
        self.tone_mut(tone)?.generator.start_at(frame);
        Ok(())
    }

    /// Schedule a tone to stop at a context time in seconds
    pub fn stop(&mut self, tone: NodeId, when: f64) -> Result<(), GraphError> {
        let frame = seconds_to_frames(when, self.sample_rate);
        self.tone_mut(tone)?.generator.stop_at(frame);
        Ok(())
    }

    /// Stop and disconnect a node, then drop it from the graph.
    ///
    /// Releasing a gain node also detaches its inputs; releasing a tone
    /// removes it from its gain's input list. Returns false if the node was
    /// already gone.
    pub fn release(&mut self, id: NodeId) -> bool {
        if let Some(tone) = self.tones.remove(&id) {
            if let Some(gain) = tone.output.and_then(|g| self.gains.get_mut(&g)) {
                gain.inputs.retain(|&input| input != id);
            }
            return true;
        }
        if let Some(gain) = self.gains.remove(&id) {
            for input in gain.inputs {
                if let Some(tone) = self.tones.get_mut(&input) {
                    tone.output = None;
                }
            }
            return true;
        }
        false
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tones.contains_key(&id) || self.gains.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.tones.len() + self.gains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// All tone generators currently in the graph, in creation order
    pub fn tone_snapshots(&self) -> Vec<ToneSnapshot> {
        let to_seconds = |frame| frames_to_seconds(frame, self.sample_rate);
        self.tones
            .iter()
            .map(|(&id, tone)| ToneSnapshot {
                id,
                frequency: tone.generator.frequency(),
                waveform: tone.generator.waveform(),
                start: tone.generator.start_frame().map(to_seconds),
                stop: tone.generator.stop_frame().map(to_seconds),
                output: tone.output,
            })
            .collect()
    }

    /// Gain value a node would apply at a context time
    pub fn gain_value_at(&self, gain: NodeId, time: f64) -> Result<f32, GraphError> {
        if self.tones.contains_key(&gain) {
            return Err(GraphError::NotAGain(gain));
        }
        self.gains
            .get(&gain)
            .map(|node| node.envelope.value_at(time))
            .ok_or(GraphError::UnknownNode(gain))
    }

    /// Mix one output frame. Frames must be requested in increasing order.
    ///
    /// Real-time safe: no allocation, no locking.
    pub fn next_sample(&mut self, frame: u64) -> f32 {
        let time = frame as f64 / self.sample_rate;
        let mut mix = 0.0;

        for gain in self.gains.values() {
            if !gain.to_destination || gain.inputs.is_empty() {
                continue;
            }

            let mut sum = 0.0;
            for input in &gain.inputs {
                if let Some(tone) = self.tones.get_mut(input) {
                    sum += tone.generator.next_sample(frame);
                }
            }
            mix += sum * gain.envelope.value_at(time);
        }

        mix
    }
}
