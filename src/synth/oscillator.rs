// Tone generators - one periodic waveform per sounding note

use std::f64::consts::TAU;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Value of the waveform at a normalized phase in [0, 1)
    #[inline]
    fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 { 1.0 } else { -1.0 }
            }
            Waveform::Sawtooth => (phase * 2.0) - 1.0,
            Waveform::Triangle => {
                if phase < 0.5 {
                    (phase * 4.0) - 1.0
                } else {
                    3.0 - (phase * 4.0)
                }
            }
        }
    }
}

/// A single oscillator with a sounding window `[start_frame, stop_frame)`.
///
/// Outside the window the generator outputs silence and its phase does not
/// advance, so every note starts at phase 0.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    waveform: Waveform,
    frequency: f64,
    phase: f64,
    phase_increment: f64,
    sample_rate: f64,
    start_frame: Option<u64>,
    stop_frame: Option<u64>,
}

impl ToneGenerator {
    pub fn new(waveform: Waveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            frequency: 0.0,
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate: sample_rate as f64,
            start_frame: None,
            stop_frame: None,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, freq: f64) {
        self.frequency = freq;
        self.phase_increment = freq / self.sample_rate;
    }

    pub fn start_frame(&self) -> Option<u64> {
        self.start_frame
    }

    pub fn stop_frame(&self) -> Option<u64> {
        self.stop_frame
    }

    /// Schedule the first sounding frame. Only the first call counts.
    pub fn start_at(&mut self, frame: u64) {
        if self.start_frame.is_none() {
            self.start_frame = Some(frame);
        }
    }

    /// Schedule the first silent frame after the note. A later call replaces
    /// an earlier one, so an immediate stop can cut a scheduled stop short.
    pub fn stop_at(&mut self, frame: u64) {
        self.stop_frame = Some(frame);
    }

    pub fn is_sounding_at(&self, frame: u64) -> bool {
        match self.start_frame {
            Some(start) => frame >= start && self.stop_frame.is_none_or(|stop| frame < stop),
            None => false,
        }
    }

    /// Produce the sample for `frame`. Frames must be requested in
    /// increasing order for the phase to stay continuous.
    pub fn next_sample(&mut self, frame: u64) -> f32 {
        if !self.is_sounding_at(frame) {
            return 0.0;
        }

        let sample = self.waveform.sample(self.phase);

        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44100.0;
    const EPSILON: f64 = 0.001;

    fn running(waveform: Waveform, freq: f64) -> ToneGenerator {
        let mut osc = ToneGenerator::new(waveform, SAMPLE_RATE);
        osc.set_frequency(freq);
        osc.start_at(0);
        osc
    }

    #[test]
    fn test_phase_increment_follows_frequency() {
        let osc = running(Waveform::Sine, 440.0);
        assert!((osc.phase_increment - 440.0 / SAMPLE_RATE as f64).abs() < EPSILON);
    }

    #[test]
    fn test_silent_before_start() {
        let mut osc = ToneGenerator::new(Waveform::Sine, SAMPLE_RATE);
        osc.set_frequency(440.0);
        osc.start_at(100);

        for frame in 0..100 {
            assert_eq!(osc.next_sample(frame), 0.0);
        }
        // Phase did not advance while waiting
        assert_eq!(osc.phase, 0.0);
        assert!(osc.is_sounding_at(100));
    }

    #[test]
    fn test_never_started_is_silent() {
        let mut osc = ToneGenerator::new(Waveform::Square, SAMPLE_RATE);
        osc.set_frequency(440.0);
        assert_eq!(osc.next_sample(0), 0.0);
        assert!(!osc.is_sounding_at(1000));
    }

    #[test]
    fn test_silent_after_stop() {
        let mut osc = running(Waveform::Square, 440.0);
        osc.stop_at(10);

        for frame in 0..10 {
            assert_ne!(osc.next_sample(frame), 0.0);
        }
        for frame in 10..20 {
            assert_eq!(osc.next_sample(frame), 0.0);
        }
        assert!(!osc.is_sounding_at(10));
        assert!(osc.is_sounding_at(9));
    }

    #[test]
    fn test_later_stop_replaces_earlier() {
        let mut osc = running(Waveform::Sine, 440.0);
        osc.stop_at(1000);
        osc.stop_at(50);
        assert_eq!(osc.stop_frame(), Some(50));
    }

    #[test]
    fn test_second_start_is_ignored() {
        let mut osc = ToneGenerator::new(Waveform::Sine, SAMPLE_RATE);
        osc.start_at(10);
        osc.start_at(500);
        assert_eq!(osc.start_frame(), Some(10));
    }

    #[test]
    fn test_sine_starts_at_zero() {
        let mut osc = running(Waveform::Sine, 440.0);
        let first = osc.next_sample(0);
        assert!((first as f64).abs() < EPSILON, "First sample: {}", first);
    }

    #[test]
    fn test_sine_amplitude() {
        let mut osc = running(Waveform::Sine, 440.0);
        for frame in 0..1000 {
            let sample = osc.next_sample(frame);
            assert!((-1.0..=1.0).contains(&sample), "Sample {} out of range", sample);
        }
    }

    #[test]
    fn test_square_wave() {
        let mut osc = running(Waveform::Square, 440.0);
        for frame in 0..1000 {
            let sample = osc.next_sample(frame);
            assert!(sample == 1.0 || sample == -1.0, "Square sample not ±1.0: {}", sample);
        }
    }

    #[test]
    fn test_saw_and_triangle_range() {
        for waveform in [Waveform::Sawtooth, Waveform::Triangle] {
            let mut osc = running(waveform, 440.0);
            for frame in 0..1000 {
                let sample = osc.next_sample(frame);
                assert!(
                    (-1.0..=1.0).contains(&sample),
                    "{:?} sample out of range: {}",
                    waveform,
                    sample
                );
            }
        }
    }

    #[test]
    fn test_phase_wrapping() {
        let mut osc = running(Waveform::Sine, 440.0);
        for frame in 0..10000 {
            osc.next_sample(frame);
            assert!(
                osc.phase >= 0.0 && osc.phase < 1.0,
                "Phase out of range: {}",
                osc.phase
            );
        }
    }

    #[test]
    fn test_sine_period_matches_frequency() {
        // 441 Hz at 44.1 kHz -> exactly 100 samples per period
        let mut osc = running(Waveform::Sine, 441.0);
        let first: Vec<f32> = (0..100).map(|f| osc.next_sample(f)).collect();
        let second: Vec<f32> = (100..200).map(|f| osc.next_sample(f)).collect();
        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }
}
