//! Forwarding from the audio backend's pull callback to the engine's sample producer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::AudioSource;

/// Shared slot holding the engine's [`AudioSource`].
///
/// The backend calls [`fill`](Self::fill) from its own thread; the slot can be
/// emptied or replaced at any time, in which case the callback plays silence.
#[derive(Clone, Default)]
pub struct AudioBridge {
    source: Arc<Mutex<Option<Box<dyn AudioSource>>>>,
}

impl AudioBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, source: Box<dyn AudioSource>) {
        *self.source.lock() = Some(source);
    }

    pub fn detach(&self) -> Option<Box<dyn AudioSource>> {
        self.source.lock().take()
    }

    pub fn is_attached(&self) -> bool {
        self.source.lock().is_some()
    }

    pub fn prepare(&self, sample_rate: u32) {
        if let Some(source) = self.source.lock().as_mut() {
            source.prepare(sample_rate);
        }
    }

    /// Fill `out` with signed 8-bit mono samples from the attached source.
    pub fn fill(&self, out: &mut [i8]) {
        match self.source.lock().as_mut() {
            Some(source) => source.fill(out),
            None => out.fill(0),
        }
    }
}

#[cfg(feature = "audio")]
pub use output::AudioOutput;

#[cfg(feature = "audio")]
mod output {
    use cpal::{
        SampleFormat, SampleRate,
        traits::{DeviceTrait, HostTrait, StreamTrait},
    };
    use tracing::{info, warn};

    use super::AudioBridge;
    use crate::types::RuntimeError;

    /// cpal output stream pulling from an [`AudioBridge`].
    pub struct AudioOutput {
        sample_rate: u32,
        _stream: cpal::Stream,
    }

    impl AudioOutput {
        /// Open the default output device, at `preferred_rate` when the device
        /// supports it and at its default rate otherwise.
        ///
        /// Only `f32` output streams are supported.
        pub fn open(bridge: AudioBridge, preferred_rate: Option<u32>) -> Result<Self, RuntimeError> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| RuntimeError::Audio("no default output device".into()))?;

            let supported = match preferred_rate.and_then(|rate| find_config(&device, rate)) {
                Some(config) => config,
                None => device
                    .default_output_config()
                    .map_err(|err| RuntimeError::Audio(format!("no default output config: {err}")))?,
            };

            let sample_format = supported.sample_format();
            if sample_format != SampleFormat::F32 {
                return Err(RuntimeError::Audio(format!(
                    "only f32 output format is supported, got {sample_format:?}"
                )));
            }

            let config: cpal::StreamConfig = supported.into();
            let sample_rate = config.sample_rate.0;
            let channels = usize::from(config.channels);
            bridge.prepare(sample_rate);

            let mut scratch: Vec<i8> = Vec::new();
            let err_fn = |err| warn!(%err, "audio stream error");
            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _| {
                        if channels == 0 {
                            return;
                        }
                        let frames = data.len() / channels;
                        scratch.resize(frames, 0);
                        bridge.fill(&mut scratch);
                        for (frame, &sample) in data.chunks_mut(channels).zip(&scratch) {
                            frame.fill(f32::from(sample) / 128.0);
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|err| RuntimeError::Audio(format!("failed to build output stream: {err}")))?;

            stream
                .play()
                .map_err(|err| RuntimeError::Audio(format!("failed to start output stream: {err}")))?;

            info!(sample_rate, channels, "audio output started");
            Ok(Self {
                sample_rate,
                _stream: stream,
            })
        }

        pub fn sample_rate(&self) -> u32 {
            self.sample_rate
        }
    }

    fn find_config(device: &cpal::Device, rate: u32) -> Option<cpal::SupportedStreamConfig> {
        device
            .supported_output_configs()
            .ok()?
            .filter(|range| range.sample_format() == SampleFormat::F32)
            .find(|range| range.min_sample_rate().0 <= rate && rate <= range.max_sample_rate().0)
            .map(|range| range.with_sample_rate(SampleRate(rate)))
    }
}
