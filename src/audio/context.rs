// Output context - connection to the audio device and its clock
//
// # Real-time vs offline
//
// `OutputContext::open` builds a cpal output stream. The device callback
// pulls mono samples from the shared `RenderGraph`, applies the master
// volume, and writes the result to every channel of the device format
// (F32, I16 or U16, detected with `sample_format()`). After each block the
// callback advances the context clock, so the clock is hardware-driven.
//
// `OutputContext::offline` has no stream. Its clock only moves when the
// owner calls `render_offline`, which makes it deterministic for tests and
// for WAV export.
//
// # Stream limitations
//
// On macOS (CoreAudio) the cpal `Stream` is not Send, so an `OutputContext`
// stays on the thread that opened it. Everything the scheduler needs from
// other threads (graph, clock) is behind `Arc`.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::audio::clock::AudioClock;
use crate::audio::device::OutputDeviceManager;
use crate::audio::dsp_utils::{OnePoleSmoother, flush_denormals_to_zero, hard_clip};
use crate::audio::format_conversion::write_mono_to_interleaved_frame;
use crate::audio::graph::{NodeId, RenderGraph, ToneSnapshot};
use crate::audio::parameters::MasterVolume;
use crate::audio::status::{AtomicContextStatus, ContextStatus};
use crate::config::PlayerConfig;
use crate::error::PlaybackError;
use crate::messaging::channels::{
    NotificationConsumer, NotificationProducer, create_notification_channel, drain, try_notify,
};
use crate::messaging::notification::Notification;

const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 64;

/// Master volume smoothing, avoids zipper noise on level changes
const VOLUME_SMOOTHING_MS: f32 = 10.0;

pub struct OutputContext {
    graph: Arc<Mutex<RenderGraph>>,
    clock: AudioClock,
    status: AtomicContextStatus,
    volume: MasterVolume,
    notifications: NotificationConsumer,
    device_name: Option<String>,
    stream: Option<Stream>,
}

impl OutputContext {
    /// Open the configured (or default) output device and start rendering
    pub fn open(config: &PlayerConfig) -> Result<Self, PlaybackError> {
        let devices = OutputDeviceManager::new();
        let device = devices.output_device(config.output_device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let stream_config: StreamConfig = supported_config.into();

        log::info!(
            "Opening output '{}': {} Hz, {} channels, {:?}",
            device_name,
            sample_rate,
            channels,
            sample_format
        );

        let graph = Arc::new(Mutex::new(RenderGraph::new(sample_rate)));
        let clock = AudioClock::new(sample_rate);
        let status = AtomicContextStatus::new(ContextStatus::Running);
        let volume = MasterVolume::new(config.master_volume);
        let (notification_tx, notifications) =
            create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
        let notification_tx = Arc::new(Mutex::new(notification_tx));

        let renderer = StreamRenderer {
            graph: Arc::clone(&graph),
            clock: clock.clone(),
            volume: volume.clone(),
            smoother: OnePoleSmoother::new(volume.get(), VOLUME_SMOOTHING_MS, sample_rate),
            channels,
        };

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &stream_config,
                renderer,
                status.clone(),
                Arc::clone(&notification_tx),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &stream_config,
                renderer,
                status.clone(),
                Arc::clone(&notification_tx),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &stream_config,
                renderer,
                status.clone(),
                Arc::clone(&notification_tx),
            ),
            other => return Err(PlaybackError::UnsupportedSampleFormat(other)),
        }?;

        stream.play()?;

        if let Ok(mut tx) = notification_tx.try_lock() {
            try_notify(
                &mut tx,
                Notification::info(format!("Audio connected: {} @ {} Hz", device_name, sample_rate)),
            );
        }

        Ok(Self {
            graph,
            clock,
            status,
            volume,
            notifications,
            device_name: Some(device_name),
            stream: Some(stream),
        })
    }

    /// A context with no device, advanced manually with [`render_offline`].
    ///
    /// [`render_offline`]: OutputContext::render_offline
    pub fn offline(sample_rate: f32) -> Self {
        let (_, notifications) = create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
        Self {
            graph: Arc::new(Mutex::new(RenderGraph::new(sample_rate))),
            clock: AudioClock::new(sample_rate),
            status: AtomicContextStatus::new(ContextStatus::Running),
            volume: MasterVolume::default(),
            notifications,
            device_name: None,
            stream: None,
        }
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut renderer: StreamRenderer,
        status: AtomicContextStatus,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, PlaybackError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // No allocations, no I/O, no blocking locks in here
                renderer.render(data);
            },
            move |err| {
                // Only a vanished device makes the context unusable; backend
                // errors (xruns and the like) are reported and rendering goes on
                let notification = match err {
                    cpal::StreamError::DeviceNotAvailable => {
                        status.set(ContextStatus::Error);
                        Notification::error(format!("Audio stream error: {}", err))
                    }
                    other => Notification::warning(format!("Audio stream warning: {}", other)),
                };
                if let Ok(mut tx) = notification_tx.try_lock() {
                    try_notify(&mut tx, notification);
                }
            },
            None,
        )?;

        Ok(stream)
    }

    /// Context clock in seconds
    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    pub fn status(&self) -> ContextStatus {
        self.status.get()
    }

    /// Closed by its owner or broken by a stream error
    pub fn is_closed(&self) -> bool {
        self.status.get().is_unusable()
    }

    pub fn is_offline(&self) -> bool {
        self.stream.is_none() && self.device_name.is_none()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn set_master_volume(&self, level: f32) {
        self.volume.set(level);
    }

    pub fn master_volume(&self) -> f32 {
        self.volume.get()
    }

    pub(crate) fn graph(&self) -> &Arc<Mutex<RenderGraph>> {
        &self.graph
    }

    pub(crate) fn lock_graph(&self) -> Result<MutexGuard<'_, RenderGraph>, PlaybackError> {
        self.graph.lock().map_err(|_| PlaybackError::GraphPoisoned)
    }

    /// Nodes currently alive in this context's render graph
    pub fn node_count(&self) -> usize {
        self.graph
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .node_count()
    }

    /// Tone generators currently scheduled in this context
    pub fn scheduled_tones(&self) -> Result<Vec<ToneSnapshot>, PlaybackError> {
        Ok(self.lock_graph()?.tone_snapshots())
    }

    /// Envelope value of a gain node at a context time
    pub fn gain_value_at(&self, gain: NodeId, time: f64) -> Result<f32, PlaybackError> {
        let value = self.lock_graph()?.gain_value_at(gain, time)?;
        Ok(value)
    }

    /// Stop the device stream. The context cannot be used afterwards; the
    /// manager will create a fresh one on the next acquire.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!("Failed to pause output stream on close: {}", e);
            }
        }
        self.status.set(ContextStatus::Closed);
        log::info!("Output context closed");
    }

    /// Render the next `buffer.len()` mono frames of an offline context and
    /// advance its clock.
    pub fn render_offline(&self, buffer: &mut [f32]) -> Result<(), PlaybackError> {
        if !self.is_offline() {
            return Err(PlaybackError::NotOffline);
        }
        if self.is_closed() {
            return Err(PlaybackError::ContextClosed);
        }

        let start = self.clock.current_frame();
        let level = self.volume.get();
        {
            let mut graph = self.lock_graph()?;
            for (i, out) in buffer.iter_mut().enumerate() {
                let sample = flush_denormals_to_zero(graph.next_sample(start + i as u64));
                *out = hard_clip(sample * level);
            }
        }
        self.clock.advance(buffer.len());
        Ok(())
    }

    /// Notifications posted by the device callbacks since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        drain(&mut self.notifications)
    }
}

/// State owned by the device data callback
struct StreamRenderer {
    graph: Arc<Mutex<RenderGraph>>,
    clock: AudioClock,
    volume: MasterVolume,
    smoother: OnePoleSmoother,
    channels: usize,
}

impl StreamRenderer {
    fn render<T>(&mut self, data: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        let frames = data.len() / self.channels.max(1);
        let start = self.clock.current_frame();

        match self.graph.try_lock() {
            Ok(mut graph) => {
                for (i, frame) in data.chunks_mut(self.channels.max(1)).enumerate() {
                    let level = self.smoother.process(self.volume.get());
                    let sample = flush_denormals_to_zero(graph.next_sample(start + i as u64));
                    write_mono_to_interleaved_frame(hard_clip(sample * level), frame);
                }
            }
            Err(_) => {
                // Control side holds the graph: output silence, keep time moving
                for sample in data.iter_mut() {
                    *sample = <T as Sample>::from_sample(0.0_f32);
                }
            }
        }

        self.clock.advance(frames);
    }
}

/// Single owner of the process-wide output context.
///
/// The context is created lazily on the first [`acquire`] and recreated when
/// the held one has been closed or its stream failed. Acquisition errors
/// are returned as-is; there is no internal retry.
///
/// [`acquire`]: OutputContextManager::acquire
pub struct OutputContextManager {
    source: ContextSource,
    context: Option<OutputContext>,
    generation: u64,
}

enum ContextSource {
    Device(PlayerConfig),
    Offline { sample_rate: f32 },
}

impl OutputContextManager {
    /// Contexts backed by the configured output device
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            source: ContextSource::Device(config),
            context: None,
            generation: 0,
        }
    }

    /// Contexts rendered manually (tests, export)
    pub fn offline(sample_rate: f32) -> Self {
        Self {
            source: ContextSource::Offline { sample_rate },
            context: None,
            generation: 0,
        }
    }

    pub fn acquire(&mut self) -> Result<&mut OutputContext, PlaybackError> {
        let needs_new = self.context.as_ref().is_none_or(OutputContext::is_closed);

        if needs_new {
            if let Some(old) = self.context.take() {
                log::info!("Output context is {:?}, recreating", old.status());
            }
            let context = match &self.source {
                ContextSource::Device(config) => OutputContext::open(config)?,
                ContextSource::Offline { sample_rate } => OutputContext::offline(*sample_rate),
            };
            self.generation += 1;
            self.context = Some(context);
        }

        self.context.as_mut().ok_or(PlaybackError::ContextClosed)
    }

    /// The held context, without creating one
    pub fn current(&self) -> Option<&OutputContext> {
        self.context.as_ref()
    }

    /// Number of contexts created so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Close and drop the held context
    pub fn release(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.close();
        }
    }
}
