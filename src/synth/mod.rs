// Module synth - Tone generators and amplitude envelopes

pub mod envelope;
pub mod oscillator;

pub use envelope::GainEnvelope;
pub use oscillator::{ToneGenerator, Waveform};
