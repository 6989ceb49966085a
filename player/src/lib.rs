use cpal::{
    BufferSize, Device, OutputCallbackInfo, StreamConfig, SupportedBufferSize,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use lifesong_core::{Channel, StereoBuffer};
use std::{sync::mpsc, thread, time::Duration};

/// Playback settings independent of the device.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// How much audio the device is asked to buffer. Defaults to 10ms.
    pub target_latency_s: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_latency_s: 0.01,
        }
    }
}

const NUM_CHANNELS: u16 = 2;

/// Samples (not frames) the device should buffer, within what it supports. Alsa rejects buffer
/// sizes that are not a multiple of 4.
fn buffer_size(
    supported: &SupportedBufferSize,
    sample_rate_hz: u32,
    latency_s: f32,
) -> BufferSize {
    match supported {
        SupportedBufferSize::Range { min, max } => {
            let frames = (sample_rate_hz as f32 * latency_s) as u32;
            let samples = (frames * u32::from(NUM_CHANNELS)) & !3;
            BufferSize::Fixed(samples.clamp(*min, *max))
        }
        SupportedBufferSize::Unknown => BufferSize::Default,
    }
}

pub struct Player {
    device: Device,
}

struct PlaybackDone;

/// Copies frames starting at `position` into an interleaved output buffer with `channels`
/// channels, padding with silence past the end. Channels beyond the first two are silent.
/// Returns the position after the last frame written.
fn fill_frames(
    data: &mut [f32],
    channels: usize,
    buffer: &StereoBuffer,
    mut position: usize,
) -> usize {
    for output in data.chunks_mut(channels) {
        let frame = buffer.frame(position);
        output.fill(0.0);
        for (element, channel) in output.iter_mut().zip(Channel::ALL) {
            *element = *frame.get(channel);
        }
        position += 1;
    }
    position
}

impl Player {
    pub fn new() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no audio output device"))?;
        log::info!(
            "output device {} on host {}",
            device.name().as_deref().unwrap_or("(unnamed)"),
            host.id().name()
        );
        Ok(Self { device })
    }

    fn stream_config(&self, config: Config) -> anyhow::Result<StreamConfig> {
        let default_config = self.device.default_output_config()?;
        let sample_rate = default_config.sample_rate();
        Ok(StreamConfig {
            channels: NUM_CHANNELS,
            sample_rate,
            buffer_size: buffer_size(
                default_config.buffer_size(),
                sample_rate.0,
                config.target_latency_s,
            ),
        })
    }

    /// Scores should be rendered at this rate before being played.
    pub fn sample_rate_hz(&self, config: Config) -> anyhow::Result<u32> {
        Ok(self.stream_config(config)?.sample_rate.0)
    }

    /// Blocks until the whole buffer has been played.
    pub fn play_stereo_buffer(
        &self,
        buffer: StereoBuffer,
        config: Config,
    ) -> anyhow::Result<()> {
        let stream_config = self.stream_config(config)?;
        log::info!(
            "{}Hz, {} channels, buffer {:?}",
            stream_config.sample_rate.0,
            stream_config.channels,
            stream_config.buffer_size
        );
        let channels = stream_config.channels as usize;
        let num_frames = buffer.len();
        if num_frames == 0 {
            return Ok(());
        }
        let (send_done, recv_done) = mpsc::channel::<PlaybackDone>();
        let mut position = 0;
        let stream = self.device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &OutputCallbackInfo| {
                let done_before = position >= num_frames;
                position = fill_frames(data, channels, &buffer, position);
                if !done_before && position >= num_frames {
                    // the receiver only goes away once playback is over anyway
                    let _ = send_done.send(PlaybackDone);
                }
            },
            |err| log::error!("stream error: {}", err),
            None,
        )?;
        stream.play()?;
        log::info!(
            "playing {:.1}s",
            num_frames as f64 / f64::from(stream_config.sample_rate.0)
        );
        let PlaybackDone = recv_done.recv()?;
        // let the last callback's samples reach the speakers
        thread::sleep(Duration::from_secs_f32(config.target_latency_s * 4.0));
        Ok(())
    }
}
