// Output context status, shared with the cpal error callback

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStatus {
    /// Rendering (device stream playing, or offline and ready)
    Running = 0,
    /// Closed by its owner; must be recreated before use
    Closed = 1,
    /// The device stream reported an error; treated like `Closed`
    Error = 2,
}

impl ContextStatus {
    /// Whether the context can no longer schedule audio
    pub fn is_unusable(self) -> bool {
        matches!(self, ContextStatus::Closed | ContextStatus::Error)
    }
}

impl From<u8> for ContextStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => ContextStatus::Running,
            1 => ContextStatus::Closed,
            _ => ContextStatus::Error,
        }
    }
}

/// Atomic wrapper so the audio error callback can flag failures lock-free
#[derive(Clone, Debug)]
pub struct AtomicContextStatus {
    inner: Arc<AtomicU8>,
}

impl AtomicContextStatus {
    pub fn new(status: ContextStatus) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(status as u8)),
        }
    }

    pub fn get(&self) -> ContextStatus {
        ContextStatus::from(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, status: ContextStatus) {
        self.inner.store(status as u8, Ordering::Release);
    }
}
