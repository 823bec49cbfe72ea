// Gain envelope - scheduled amplitude automation
//
// Automation follows the usual audio-parameter rules:
// - `set_value_at_time(v, t)` jumps to `v` at `t` and holds it
// - `exponential_ramp_to_value_at_time(v, t)` glides exponentially from the
//   previous event's value to `v`, arriving exactly at `t`
// - before the first event the parameter sits at its default value
//
// Times are in seconds on the output context clock.

/// Default value of a gain parameter with no automation
pub const DEFAULT_GAIN: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    SetValue { value: f32, time: f64 },
    ExponentialRamp { value: f32, time: f64 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. } | Automation::ExponentialRamp { time, .. } => time,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. } | Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GainEnvelope {
    default_value: f32,
    events: Vec<Automation>,
}

impl GainEnvelope {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::new(),
        }
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(Automation::SetValue { value, time });
        self
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(Automation::ExponentialRamp { value, time });
        self
    }

    /// Number of scheduled automation events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    // Events stay sorted by time; equal times keep insertion order.
    fn insert(&mut self, event: Automation) {
        let index = self
            .events
            .partition_point(|existing| existing.time() <= event.time());
        self.events.insert(index, event);
    }

    /// Parameter value at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let next_index = self.events.partition_point(|e| e.time() <= time);

        let (prev_value, prev_time) = match next_index.checked_sub(1) {
            Some(i) => (self.events[i].value(), self.events[i].time()),
            None => (self.default_value, 0.0),
        };

        match self.events.get(next_index) {
            Some(&Automation::ExponentialRamp { value, time: end }) => {
                exponential_interpolate(prev_value, prev_time, value, end, time)
            }
            _ => prev_value,
        }
    }
}

impl Default for GainEnvelope {
    fn default() -> Self {
        Self::new(DEFAULT_GAIN)
    }
}

// v(t) = v0 * (v1 / v0)^((t - t0) / (t1 - t0)). Endpoints of opposite sign
// or zero cannot be ramped exponentially; the start value is held instead.
fn exponential_interpolate(v0: f32, t0: f64, v1: f32, t1: f64, t: f64) -> f32 {
    if v0 == 0.0 || v1 == 0.0 || (v0 < 0.0) != (v1 < 0.0) {
        return v0;
    }
    if t1 <= t0 {
        return v1;
    }
    let progress = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
    let ratio = (v1 / v0) as f64;
    (v0 as f64 * ratio.powf(progress)) as f32
}
