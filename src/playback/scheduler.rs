// Playback scheduler
//
// Turns a progression and a tempo into graph nodes on the output context
// clock, plus one timer thread that reports chord changes and completion.
//
// Timer events are not delivered from the timer thread. They queue up in a
// channel and the owner of the scheduler delivers them on its own thread
// with `dispatch_pending` or `wait_for_event`, the same way a host event
// loop would. Every event carries the token of the session that armed it,
// and events whose session is no longer current are dropped, so callbacks
// never fire after `stop_all` or after a newer `play`.

use crossbeam_channel::{Receiver, Sender};
use std::iter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::context::OutputContext;
use crate::audio::graph::{GraphError, NodeId, RenderGraph};
use crate::error::PlaybackError;
use crate::playback::plan::{ENVELOPE_FLOOR, ENVELOPE_PEAK, PlaybackPlan};
use crate::playback::session::{PlaybackState, Session};
use crate::playback::timer::{NotificationTimer, PlaybackEvent, SessionToken, TimedEvent};
use crate::synth::oscillator::Waveform;
use crate::theory::frequency::resolve;
use crate::theory::note::ChordProgression;

/// Every chord tone uses the same waveform
pub const CHORD_WAVEFORM: Waveform = Waveform::Sine;

pub struct PlaybackScheduler {
    events_tx: Sender<PlaybackEvent>,
    events_rx: Receiver<PlaybackEvent>,
    last_token: u64,
    session: Option<Session>,
    last_state: PlaybackState,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            events_tx,
            events_rx,
            last_token: 0,
            session: None,
            last_state: PlaybackState::Idle,
        }
    }

    /// Schedule `progression` on `ctx` at `tempo_bpm`.
    ///
    /// Any session already playing is stopped first, without running its
    /// completion callback. `on_chord_change(i)` is delivered when chord `i`
    /// begins and `on_finish()` once after the last chord window, both
    /// through [`dispatch_pending`] / [`wait_for_event`].
    ///
    /// Rejects a closed context and any tempo [`PlaybackPlan::new`] refuses
    /// before touching the current session.
    ///
    /// [`dispatch_pending`]: PlaybackScheduler::dispatch_pending
    /// [`wait_for_event`]: PlaybackScheduler::wait_for_event
    pub fn play<F, G>(
        &mut self,
        progression: &ChordProgression,
        ctx: &OutputContext,
        tempo_bpm: f64,
        on_chord_change: F,
        on_finish: G,
    ) -> Result<SessionToken, PlaybackError>
    where
        F: FnMut(usize) + 'static,
        G: FnOnce() + 'static,
    {
        if ctx.is_closed() {
            return Err(PlaybackError::ContextClosed);
        }
        let plan = PlaybackPlan::new(progression.len(), tempo_bpm, ctx.current_time())?;

        self.stop_session(PlaybackState::Stopped);

        let origin = Instant::now();
        let resources = schedule_nodes(ctx, progression, &plan)?;

        self.last_token += 1;
        let token = SessionToken::new(self.last_token);
        let mut session = Session::new(
            token,
            Arc::clone(ctx.graph()),
            resources,
            Box::new(on_chord_change),
            Box::new(on_finish),
        );

        // On failure the session drops here and releases its nodes
        let timer = NotificationTimer::spawn(
            origin,
            notification_schedule(token, &plan),
            self.events_tx.clone(),
        )?;
        session.attach_timer(timer);

        log::info!(
            "{}: {} chords at {} BPM ({:.3}s per chord), {} nodes, finishes at {:.3}s",
            token,
            progression.len(),
            tempo_bpm,
            plan.seconds_per_chord(),
            session.resource_count(),
            plan.finish_time()
        );

        self.session = Some(session);
        Ok(token)
    }

    /// Silence and release everything the current session scheduled.
    ///
    /// No-op without a context or without an active session. Pending
    /// notifications of the stopped session are never delivered, and its
    /// completion callback does not run.
    pub fn stop_all(&mut self, ctx: Option<&OutputContext>) {
        if ctx.is_none() {
            log::trace!("stop_all without a context, nothing to do");
            return;
        }
        self.stop_session(PlaybackState::Stopped);
    }

    fn stop_session(&mut self, outcome: PlaybackState) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
            self.last_state = outcome;
            log::info!("{}: {:?}", session.token(), outcome);
        }
    }

    /// Deliver every event that is already due. Returns the number of
    /// callbacks that ran.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.deliver(event) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Block until one event of the current session has been delivered, or
    /// `timeout` elapses. Stale events are skipped while waiting.
    pub fn wait_for_event(&mut self, timeout: Duration) -> Option<PlaybackEvent> {
        let deadline = Instant::now() + timeout;

        while self.session.is_some() {
            match self.events_rx.recv_deadline(deadline) {
                Ok(event) => {
                    if self.deliver(event) {
                        return Some(event);
                    }
                }
                Err(_) => return None,
            }
        }
        None
    }

    /// Deliver events until the current session ends. Returns true if it
    /// ran to completion within `timeout`.
    pub fn wait_until_finished(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        while self.session.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.wait_for_event(remaining);
        }
        self.last_state == PlaybackState::Finished
    }

    fn deliver(&mut self, event: PlaybackEvent) -> bool {
        let is_current = self
            .session
            .as_ref()
            .is_some_and(|session| session.token() == event.session());
        if !is_current {
            log::trace!("Dropping stale {:?}", event);
            return false;
        }

        match event {
            PlaybackEvent::ChordChanged { index, .. } => {
                if let Some(session) = self.session.as_mut() {
                    log::debug!("{}: chord {}", session.token(), index);
                    session.chord_changed(index);
                }
            }
            PlaybackEvent::Finished { .. } => {
                if let Some(mut session) = self.session.take() {
                    session.finish();
                    session.teardown();
                    self.last_state = PlaybackState::Finished;
                    log::info!("{}: finished", session.token());
                }
            }
        }
        true
    }

    pub fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map_or(self.last_state, Session::state)
    }

    pub fn current_session(&self) -> Option<SessionToken> {
        self.session.as_ref().map(Session::token)
    }

    /// Index of the last chord reported to the current session
    pub fn current_chord(&self) -> Option<usize> {
        self.session.as_ref().and_then(Session::current_chord)
    }

    /// Graph nodes owned by the current session
    pub fn active_resource_count(&self) -> usize {
        self.session.as_ref().map_or(0, Session::resource_count)
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.stop_session(PlaybackState::Stopped);
    }
}

fn schedule_nodes(
    ctx: &OutputContext,
    progression: &ChordProgression,
    plan: &PlaybackPlan,
) -> Result<Vec<NodeId>, PlaybackError> {
    let mut graph = ctx.lock_graph()?;
    let mut resources = Vec::new();

    if let Err(e) = schedule_chords(&mut graph, progression, plan, &mut resources) {
        for id in resources {
            graph.release(id);
        }
        return Err(e.into());
    }
    Ok(resources)
}

// One gain envelope per chord, one tone per playable note. Nodes are pushed
// to `resources` as soon as they exist.
fn schedule_chords(
    graph: &mut RenderGraph,
    progression: &ChordProgression,
    plan: &PlaybackPlan,
    resources: &mut Vec<NodeId>,
) -> Result<(), GraphError> {
    for (chord, window) in progression.iter().zip(plan.windows()) {
        let frequencies: Vec<f64> = chord
            .notes
            .iter()
            .map(resolve)
            .filter(|&frequency| frequency.is_finite() && frequency > 0.0)
            .collect();

        if frequencies.is_empty() {
            log::debug!("Chord {} '{}' has no playable notes", window.index, chord.name);
            continue;
        }

        let gain = graph.create_gain();
        resources.push(gain);
        graph
            .envelope_mut(gain)?
            .set_value_at_time(ENVELOPE_FLOOR, window.start)
            .exponential_ramp_to_value_at_time(ENVELOPE_PEAK, window.attack_end())
            .exponential_ramp_to_value_at_time(ENVELOPE_FLOOR, window.stop);
        graph.connect_to_destination(gain)?;

        for frequency in frequencies {
            let tone = graph.create_tone(CHORD_WAVEFORM);
            resources.push(tone);
            graph.set_frequency(tone, frequency)?;
            graph.connect(tone, gain)?;
            graph.start(tone, window.start)?;
            graph.stop(tone, window.stop)?;
        }
    }
    Ok(())
}

fn notification_schedule(token: SessionToken, plan: &PlaybackPlan) -> Vec<TimedEvent> {
    let chord_changes = plan.windows().iter().map(|window| {
        TimedEvent::after_seconds(
            plan.delay_until(window.start),
            PlaybackEvent::ChordChanged {
                session: token,
                index: window.index,
            },
        )
    });
    let finished = TimedEvent::after_seconds(
        plan.delay_until(plan.finish_time()),
        PlaybackEvent::Finished { session: token },
    );

    chord_changes.chain(iter::once(finished)).collect()
}
