// Utilitaires DSP - Hygiène audio du callback temps-réel
//
// Everything here is allocation-free and safe to call per sample.

/// Flush denormals to zero.
///
/// Exponential envelope tails decay toward tiny values that can slow some
/// CPUs down dramatically; anything below 1e-15 is inaudible at 32-bit.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Clamp to [-1, 1], the way an audio destination clips its input
#[inline]
pub fn hard_clip(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

/// One-pole smoother for control values (master volume).
///
/// y[n] = y[n-1] + α * (x[n] - y[n-1])
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// * `initial_value` - starting output
    /// * `time_constant_ms` - time to cover ~63% of a step
    /// * `sample_rate` - Hz
    ///
    /// ```
    /// use progression_player::audio::dsp_utils::OnePoleSmoother;
    /// let mut smoother = OnePoleSmoother::new(0.0, 10.0, 44100.0);
    /// assert!(smoother.process(1.0) > 0.0);
    /// ```
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let time_constant_samples = (time_constant_ms * 0.001 * sample_rate).max(1.0);

        Self {
            current: initial_value,
            coefficient: (1.0 / time_constant_samples).min(1.0),
        }
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormals() {
        assert_eq!(flush_denormals_to_zero(1e-20), 0.0);
        assert_eq!(flush_denormals_to_zero(0.1), 0.1);
        assert_eq!(flush_denormals_to_zero(-0.1), -0.1);
    }

    #[test]
    fn test_hard_clip() {
        assert_eq!(hard_clip(0.3), 0.3);
        assert_eq!(hard_clip(1.7), 1.0);
        assert_eq!(hard_clip(-3.0), -1.0);
    }

    #[test]
    fn test_smoother_convergence() {
        // 10ms at 44.1kHz = 441 samples per time constant; 100ms is ~10 of them
        let mut smoother = OnePoleSmoother::new(0.0, 10.0, 44100.0);
        let mut final_value = 0.0;
        for _ in 0..4410 {
            final_value = smoother.process(1.0);
        }
        assert!((final_value - 1.0).abs() < 0.01);
        assert_eq!(smoother.get(), final_value);
    }

    #[test]
    fn test_smoother_no_overshoot() {
        let mut smoother = OnePoleSmoother::new(0.0, 5.0, 44100.0);
        for _ in 0..100 {
            let value = smoother.process(1.0);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_zero_time_constant_jumps() {
        let mut smoother = OnePoleSmoother::new(0.0, 0.0, 44100.0);
        assert_eq!(smoother.process(0.5), 0.5);
    }
}
