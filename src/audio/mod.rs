use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, warn};

use crate::audio_api::AudioCommand;
use crate::config::AudioConfig;

mod ambience;
mod engine;
mod envelope;
mod filter;
mod frame;
mod master;
mod noise;
mod osc;
mod reverb;
mod tone;

pub use engine::Engine;
pub use frame::StereoFrame;
pub use master::DEFAULT_MASTER_VOLUME;

/// The UI thread's end of the audio thread. Fire-and-forget: a full queue
/// drops the command rather than blocking the UI.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    output_stream: Option<cpal::Stream>, // None when no device could be opened
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }

    pub fn is_live(&self) -> bool {
        self.output_stream.is_some()
    }

    /// A handle that accepts commands and plays nothing.
    pub fn disabled() -> Self {
        // receiver dropped: try_send fails immediately, nothing piles up
        let (tx, _) = crossbeam_channel::bounded::<AudioCommand>(1);
        Self { tx, output_stream: None }
    }
}

/// Opens the default output device, or falls back to a silent handle so the
/// rest of the app keeps working without sound.
pub fn start_audio(config: &AudioConfig) -> AudioHandle {
    match try_start_audio(config) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Audio disabled: {e:#}");
            AudioHandle::disabled()
        }
    }
}

fn try_start_audio(config: &AudioConfig) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(config.command_queue.max(1));

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let supported = device.default_output_config().context("no default output config")?;

    let sample_rate = supported.sample_rate();
    let channels = supported.channels() as usize;

    match supported.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(sample_rate, config);
            let output_stream =
                build_output_stream_f32(&device, &supported.into(), rx, engine, channels)?;
            output_stream.play().context("failed to play output stream")?;
            info!(sample_rate, channels, "audio output started");

            Ok(AudioHandle { tx, output_stream: Some(output_stream) })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let err_fn = |err| error!("audio output stream error: {err}");
    let mut scratch: Vec<StereoFrame> = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if scratch.len() < n_frames {
                // only grows on the first few callbacks
                scratch.resize(n_frames, StereoFrame::zero());
            }
            let frames = &mut scratch[..n_frames];
            engine.render_block(frames);
            write_interleaved(data, frames, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

// Mono devices get the average; extra channels beyond two stay silent.
fn write_interleaved(data: &mut [f32], frames: &[StereoFrame], channels: usize) {
    if channels == 0 {
        return;
    }
    for (out, frame) in data.chunks_exact_mut(channels).zip(frames) {
        match out {
            [mono] => *mono = (frame.left + frame.right) * 0.5,
            [l, r, rest @ ..] => {
                *l = frame.left;
                *r = frame.right;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}
