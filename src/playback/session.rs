// Playback session - exclusive owner of one progression's graph nodes

use std::sync::{Arc, Mutex};

use crate::audio::graph::{NodeId, RenderGraph};
use crate::playback::timer::{NotificationTimer, SessionToken};

/// Observable state of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing played yet
    #[default]
    Idle,
    /// Nodes scheduled, first chord not reported yet
    Scheduled,
    /// At least one chord change delivered
    Playing,
    /// Last session ran to completion
    Finished,
    /// Last session was stopped or superseded
    Stopped,
}

impl PlaybackState {
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Scheduled | PlaybackState::Playing)
    }
}

pub(crate) type ChordChangeCallback = Box<dyn FnMut(usize)>;
pub(crate) type FinishCallback = Box<dyn FnOnce()>;

pub(crate) struct Session {
    token: SessionToken,
    graph: Arc<Mutex<RenderGraph>>,
    resources: Vec<NodeId>,
    timer: Option<NotificationTimer>,
    on_chord_change: ChordChangeCallback,
    on_finish: Option<FinishCallback>,
    state: PlaybackState,
    current_chord: Option<usize>,
}

impl Session {
    pub fn new(
        token: SessionToken,
        graph: Arc<Mutex<RenderGraph>>,
        resources: Vec<NodeId>,
        on_chord_change: ChordChangeCallback,
        on_finish: FinishCallback,
    ) -> Self {
        Self {
            token,
            graph,
            resources,
            timer: None,
            on_chord_change,
            on_finish: Some(on_finish),
            state: PlaybackState::Scheduled,
            current_chord: None,
        }
    }

    pub fn attach_timer(&mut self, timer: NotificationTimer) {
        self.timer = Some(timer);
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_chord(&self) -> Option<usize> {
        self.current_chord
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn chord_changed(&mut self, index: usize) {
        self.state = PlaybackState::Playing;
        self.current_chord = Some(index);
        (self.on_chord_change)(index);
    }

    /// Run the completion callback. Only the first call has an effect.
    pub fn finish(&mut self) {
        if let Some(on_finish) = self.on_finish.take() {
            on_finish();
        }
    }

    /// Cancel pending notifications and release every owned node.
    ///
    /// Safe to call more than once; later calls find nothing to release.
    pub fn teardown(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }

        if self.resources.is_empty() {
            return;
        }

        // A panic elsewhere must not leave nodes behind
        let mut graph = self
            .graph
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = self.resources.len();
        for id in self.resources.drain(..) {
            graph.release(id);
        }
        log::debug!("{}: released {} nodes", self.token, count);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
