// Format conversion between the internal f32 mix and output formats
//
// - device streams: cpal's `FromSample<f32>` handles f32 / i16 / u16
// - WAV export: f32 -> signed integer PCM at 16 or 24 bits
//
// All conversions are allocation-free and suitable for the audio callback.

use cpal::{FromSample, Sample};

/// Write one mono sample to every channel of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(sample: f32, frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    let converted = <T as Sample>::from_sample(sample);
    for channel_sample in frame.iter_mut() {
        *channel_sample = converted;
    }
}

/// Convert a sample in [-1.0, 1.0] to signed PCM with `bits` of resolution.
///
/// Out-of-range input is clamped. Positive full scale maps to 2^(bits-1) - 1
/// and negative full scale to -2^(bits-1).
#[inline]
pub fn f32_to_pcm(sample: f32, bits: u16) -> i32 {
    let clamped = sample.clamp(-1.0, 1.0) as f64;
    let negative_full_scale = (1_i64 << (bits - 1)) as f64;
    let positive_full_scale = negative_full_scale - 1.0;

    if clamped >= 0.0 {
        (clamped * positive_full_scale).round() as i32
    } else {
        (clamped * negative_full_scale).round() as i32
    }
}
