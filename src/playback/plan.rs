// Playback plan - pure timing of a progression on the context clock
//
// Nothing here touches audio or threads: given a chord count, a tempo and
// the context time at which `play` was called, compute every chord window
// and the completion time.

use std::time::Duration;

use crate::error::PlaybackError;

/// Fixed meter: every chord lasts four beats
pub const BEATS_PER_CHORD: f64 = 4.0;

/// Delay between the `play` call and the first chord onset, in seconds
pub const LEAD_IN_SECONDS: f64 = 0.1;

/// Portion of a chord window during which its tones sound
pub const SOUNDING_FRACTION: f64 = 0.9;

/// Near-silent envelope level at chord onset and release
pub const ENVELOPE_FLOOR: f32 = 0.0001;

/// Envelope level reached at the end of the attack
pub const ENVELOPE_PEAK: f32 = 0.3;

pub const ATTACK_SECONDS: f64 = 0.02;

/// Tempos must be finite and positive
pub fn validate_tempo(tempo_bpm: f64) -> Result<(), PlaybackError> {
    if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
        Ok(())
    } else {
        Err(PlaybackError::InvalidTempo(tempo_bpm))
    }
}

/// Seconds one chord occupies at `tempo_bpm`
#[inline]
pub fn seconds_per_chord(tempo_bpm: f64) -> f64 {
    (60.0 / tempo_bpm) * BEATS_PER_CHORD
}

/// Sounding window of one chord, in context seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordWindow {
    pub index: usize,
    pub start: f64,
    pub stop: f64,
}

impl ChordWindow {
    /// End of the attack ramp
    pub fn attack_end(&self) -> f64 {
        self.start + ATTACK_SECONDS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPlan {
    scheduled_at: f64,
    seconds_per_chord: f64,
    windows: Vec<ChordWindow>,
}

impl PlaybackPlan {
    /// Plan `chord_count` chords at `tempo_bpm`, starting from context time
    /// `now`. Rejects tempos that are not finite and positive, and tempos so
    /// slow that the progression length does not fit in a [`Duration`].
    pub fn new(chord_count: usize, tempo_bpm: f64, now: f64) -> Result<Self, PlaybackError> {
        validate_tempo(tempo_bpm)?;

        let spc = seconds_per_chord(tempo_bpm);
        let length = LEAD_IN_SECONDS + chord_count as f64 * spc;
        if !spc.is_finite() || Duration::try_from_secs_f64(length).is_err() {
            return Err(PlaybackError::InvalidTempo(tempo_bpm));
        }
        let origin = now + LEAD_IN_SECONDS;
        let windows = (0..chord_count)
            .map(|index| {
                let start = origin + index as f64 * spc;
                ChordWindow {
                    index,
                    start,
                    stop: start + SOUNDING_FRACTION * spc,
                }
            })
            .collect();

        Ok(Self {
            scheduled_at: now,
            seconds_per_chord: spc,
            windows,
        })
    }

    /// Context time at which the plan was made
    pub fn scheduled_at(&self) -> f64 {
        self.scheduled_at
    }

    pub fn seconds_per_chord(&self) -> f64 {
        self.seconds_per_chord
    }

    pub fn windows(&self) -> &[ChordWindow] {
        &self.windows
    }

    /// Onset of the first chord
    pub fn origin(&self) -> f64 {
        self.scheduled_at + LEAD_IN_SECONDS
    }

    /// End of the last chord window (lead-in included)
    pub fn finish_time(&self) -> f64 {
        self.origin() + self.windows.len() as f64 * self.seconds_per_chord
    }

    /// Lead-in plus every chord window
    pub fn total_duration(&self) -> f64 {
        self.finish_time() - self.scheduled_at
    }

    /// Seconds between the plan time and `time`, never negative
    pub fn delay_until(&self, time: f64) -> f64 {
        (time - self.scheduled_at).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_seconds_per_chord() {
        assert_eq!(seconds_per_chord(120.0), 2.0);
        assert_eq!(seconds_per_chord(60.0), 4.0);
        assert_eq!(seconds_per_chord(240.0), 1.0);
    }

    #[test]
    fn test_windows_at_120_bpm() {
        let t = 3.25;
        let plan = PlaybackPlan::new(4, 120.0, t).unwrap();

        assert_eq!(plan.windows().len(), 4);
        for (i, window) in plan.windows().iter().enumerate() {
            assert_eq!(window.index, i);
            assert!((window.start - (t + 0.1 + i as f64 * 2.0)).abs() < EPSILON);
            assert!((window.stop - (window.start + 1.8)).abs() < EPSILON);
        }
    }

    #[test]
    fn test_windows_strictly_increasing() {
        let plan = PlaybackPlan::new(16, 97.0, 0.0).unwrap();
        for pair in plan.windows().windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(pair[0].stop < pair[1].start, "10% gap between chords");
        }
    }

    #[test]
    fn test_finish_time() {
        let plan = PlaybackPlan::new(2, 120.0, 1.0).unwrap();
        assert!((plan.finish_time() - 5.1).abs() < EPSILON);
        assert!((plan.total_duration() - 4.1).abs() < EPSILON);
    }

    #[test]
    fn test_empty_plan_finishes_after_lead_in() {
        let plan = PlaybackPlan::new(0, 120.0, 2.0).unwrap();
        assert!(plan.windows().is_empty());
        assert!((plan.finish_time() - 2.1).abs() < EPSILON);
    }

    #[test]
    fn test_invalid_tempo_rejected() {
        for tempo in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                PlaybackPlan::new(1, tempo, 0.0),
                Err(PlaybackError::InvalidTempo(_))
            ));
        }
    }

    #[test]
    fn test_unrepresentable_length_rejected() {
        for tempo in [1e-18, 1e-300, f64::MIN_POSITIVE] {
            assert!(matches!(
                PlaybackPlan::new(4, tempo, 0.0),
                Err(PlaybackError::InvalidTempo(_))
            ));
        }
        // Very slow but still within range
        let plan = PlaybackPlan::new(2, 1e-6, 0.0).unwrap();
        assert!(plan.finish_time().is_finite());
    }

    #[test]
    fn test_delay_until() {
        let plan = PlaybackPlan::new(3, 120.0, 10.0).unwrap();
        let delays: Vec<f64> = plan.windows().iter().map(|w| plan.delay_until(w.start)).collect();

        assert!((delays[0] - 0.1).abs() < EPSILON);
        assert!((delays[1] - 2.1).abs() < EPSILON);
        assert!((delays[2] - 4.1).abs() < EPSILON);
        assert_eq!(plan.delay_until(0.0), 0.0);
    }

    #[test]
    fn test_attack_end() {
        let plan = PlaybackPlan::new(1, 120.0, 0.0).unwrap();
        assert!((plan.windows()[0].attack_end() - 0.12).abs() < EPSILON);
    }
}
