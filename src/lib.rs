// Progression Player - Library exports for the binary, tests and benchmarks

pub mod audio;
pub mod config;
pub mod error;
pub mod messaging;
pub mod playback;
pub mod synth;
pub mod theory;

// Re-export commonly used types for convenience
pub use audio::context::{OutputContext, OutputContextManager};
pub use audio::export::{ExportSettings, ExportSummary, ProgressionExporter};
pub use audio::status::ContextStatus;
pub use config::PlayerConfig;
pub use error::PlaybackError;
pub use playback::{PlaybackEvent, PlaybackScheduler, PlaybackState, SessionToken};
pub use theory::{Chord, ChordProgression, MusicTheoryInfo, Note, resolve};
