// Error types for context acquisition, scheduling and export

use crate::audio::graph::GraphError;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Output device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to enumerate output devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("Failed to query output configuration: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0:?}. Supported formats: F32, I16, U16")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("Output context is closed")]
    ContextClosed,

    #[error("Offline rendering requires an offline output context")]
    NotOffline,

    #[error("Tempo must be a positive number of beats per minute, got {0}")]
    InvalidTempo(f64),

    #[error("Render graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Render graph lock poisoned")]
    GraphPoisoned,

    #[error("Failed to spawn notification timer: {0}")]
    Timer(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] ron::Error),

    #[error("Invalid export settings: {0}")]
    InvalidExport(String),
}
