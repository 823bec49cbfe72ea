// Output context clock - monotonic, advanced only by whoever renders audio

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Nearest frame to `seconds` at `sample_rate`. Negative times clamp to 0.
pub fn seconds_to_frames(seconds: f64, sample_rate: f64) -> u64 {
    (seconds * sample_rate).round().max(0.0) as u64
}

pub fn frames_to_seconds(frames: u64, sample_rate: f64) -> f64 {
    frames as f64 / sample_rate
}

/// Shared frame counter of an output context.
///
/// The device callback (or an offline render) advances it after each
/// rendered block; everyone else only reads it.
#[derive(Clone, Debug)]
pub struct AudioClock {
    frame_position: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frame_position: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate as f64,
        }
    }

    /// Frames rendered so far
    pub fn current_frame(&self) -> u64 {
        self.frame_position.load(Ordering::Acquire)
    }

    /// Seconds rendered so far
    pub fn current_time(&self) -> f64 {
        self.frames_to_seconds(self.current_frame())
    }

    /// Advance by a rendered block (called by the renderer only)
    pub fn advance(&self, frames: usize) {
        self.frame_position
            .fetch_add(frames as u64, Ordering::Release);
    }

    /// Nearest frame to a context time. Negative times clamp to frame 0.
    pub fn seconds_to_frames(&self, seconds: f64) -> u64 {
        seconds_to_frames(seconds, self.sample_rate)
    }

    pub fn frames_to_seconds(&self, frames: u64) -> f64 {
        frames_to_seconds(frames, self.sample_rate)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate as f32
    }
}
