// Notification timers - wall-clock events for one playback session
//
// One background thread per session walks the session's deadlines in order
// and forwards each event to the scheduler's event channel. Dropping the
// cancel sender wakes the thread immediately; it never calls user code.

use crossbeam_channel::{Receiver, Sender, select};
use std::fmt;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::PlaybackError;

/// Identifies one playback session. Tokens only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Progress events produced by a session's timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    ChordChanged { session: SessionToken, index: usize },
    Finished { session: SessionToken },
}

impl PlaybackEvent {
    pub fn session(&self) -> SessionToken {
        match *self {
            PlaybackEvent::ChordChanged { session, .. } | PlaybackEvent::Finished { session } => {
                session
            }
        }
    }
}

/// An event due `delay` after the timer origin
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedEvent {
    pub delay: Duration,
    pub event: PlaybackEvent,
}

impl TimedEvent {
    /// Delays too long for a [`Duration`] saturate to [`Duration::MAX`]
    pub fn after_seconds(seconds: f64, event: PlaybackEvent) -> Self {
        Self {
            delay: Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX),
            event,
        }
    }
}

pub(crate) struct NotificationTimer {
    cancel_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl NotificationTimer {
    /// Start delivering `schedule` (sorted by delay) relative to `origin`
    pub fn spawn(
        origin: Instant,
        schedule: Vec<TimedEvent>,
        events: Sender<PlaybackEvent>,
    ) -> Result<Self, PlaybackError> {
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name("playback-timer".to_string())
            .spawn(move || run_timer(origin, schedule, events, cancel_rx))
            .map_err(PlaybackError::Timer)?;

        Ok(Self {
            cancel_tx: Some(cancel_tx),
            handle: Some(handle),
        })
    }

    /// Stop delivering events and wait for the thread to exit. Idempotent.
    pub fn cancel(&mut self) {
        // Disconnecting the channel wakes the select below
        self.cancel_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Playback timer thread panicked");
            }
        }
    }
}

impl Drop for NotificationTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_timer(
    origin: Instant,
    schedule: Vec<TimedEvent>,
    events: Sender<PlaybackEvent>,
    cancel_rx: Receiver<()>,
) {
    for timed in schedule {
        let Some(deadline) = origin.checked_add(timed.delay) else {
            // Beyond what the clock can express: nothing left will fire
            let _ = cancel_rx.recv();
            return;
        };
        select! {
            recv(cancel_rx) -> _ => return,
            recv(crossbeam_channel::at(deadline)) -> _ => {
                if events.send(timed.event).is_err() {
                    // Scheduler is gone
                    return;
                }
            }
        }
    }
}
