// Audio Export - Offline rendering of a progression to WAV
//
// The progression goes through the same scheduler as live playback, on an
// offline output context that is rendered as fast as possible. The result
// is the lead-in plus every chord window, written as integer PCM with the
// mono mix copied to each channel.

use hound::{WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::context::OutputContext;
use crate::audio::format_conversion::f32_to_pcm;
use crate::error::PlaybackError;
use crate::playback::plan::PlaybackPlan;
use crate::playback::scheduler::PlaybackScheduler;
use crate::theory::note::ChordProgression;

/// Frames rendered per block
const RENDER_BLOCK_FRAMES: usize = 1024;

/// Audio export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Sample rate (Hz)
    pub sample_rate: u32,
    /// Bit depth (16 or 24)
    pub bit_depth: u16,
    /// Number of channels (1=mono, 2=stereo)
    pub channels: u16,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: 16,
            channels: 2,
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.sample_rate == 0 {
            return Err(PlaybackError::InvalidExport(
                "sample rate must be positive".to_string(),
            ));
        }
        if !matches!(self.bit_depth, 16 | 24) {
            return Err(PlaybackError::InvalidExport(format!(
                "unsupported bit depth {} (expected 16 or 24)",
                self.bit_depth
            )));
        }
        if self.channels == 0 {
            return Err(PlaybackError::InvalidExport(
                "at least one channel is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Frames per channel
    pub frames: u64,
    pub duration_seconds: f64,
}

/// Renders progressions to WAV files
pub struct ProgressionExporter {
    settings: ExportSettings,
}

impl ProgressionExporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Render `progression` at `tempo_bpm` into a WAV file at `path`
    pub fn export(
        &self,
        progression: &ChordProgression,
        tempo_bpm: f64,
        path: &Path,
    ) -> Result<ExportSummary, PlaybackError> {
        self.settings.validate()?;

        let duration = PlaybackPlan::new(progression.len(), tempo_bpm, 0.0)?.total_duration();
        let context = OutputContext::offline(self.settings.sample_rate as f32);
        let total_frames = context.clock().seconds_to_frames(duration);

        log::info!(
            "Exporting {} chords: {:.2}s ({} frames) at {} Hz to {}",
            progression.len(),
            duration,
            total_frames,
            self.settings.sample_rate,
            path.display()
        );

        let spec = WavSpec {
            channels: self.settings.channels,
            sample_rate: self.settings.sample_rate,
            bits_per_sample: self.settings.bit_depth,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;

        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(progression, &context, tempo_bpm, |_| {}, || {})?;

        let mut block = vec![0.0_f32; RENDER_BLOCK_FRAMES];
        let mut rendered: u64 = 0;
        while rendered < total_frames {
            let frames = (total_frames - rendered).min(RENDER_BLOCK_FRAMES as u64) as usize;
            let chunk = &mut block[..frames];
            context.render_offline(chunk)?;

            for &sample in chunk.iter() {
                let pcm = f32_to_pcm(sample, self.settings.bit_depth);
                for _ in 0..self.settings.channels {
                    writer.write_sample(pcm)?;
                }
            }
            rendered += frames as u64;
        }

        scheduler.stop_all(Some(&context));
        writer.finalize()?;

        log::info!("Export complete: {}", path.display());

        Ok(ExportSummary {
            path: path.to_path_buf(),
            frames: total_frames,
            duration_seconds: duration,
        })
    }
}
