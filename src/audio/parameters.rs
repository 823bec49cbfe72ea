// Lock-free control parameters read by the audio callback

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Master output level in [0, 1], stored as f32 bits
#[derive(Clone, Debug)]
pub struct MasterVolume {
    bits: Arc<AtomicU32>,
}

impl MasterVolume {
    pub fn new(level: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(Self::sanitize(level).to_bits())),
        }
    }

    fn sanitize(level: f32) -> f32 {
        if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) }
    }

    pub fn set(&self, level: f32) {
        self.bits
            .store(Self::sanitize(level).to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for MasterVolume {
    fn default() -> Self {
        Self::new(1.0)
    }
}
