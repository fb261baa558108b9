//! # Audio Capture Module
//!
//! Live microphone input through CPAL. Samples are cut into fixed-size
//! buffers, each buffer is run through the AMDF estimator, and the result is
//! forwarded as one timestamped frame.

use crate::source::{Control, SourceEvent};
use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};
use scribe_core::amdf::Amdf;
use scribe_core::{Frame, ScribeConfig};
use std::ops::RangeInclusive;
use std::time::Instant;

/// Starts capture from the default input device.
///
/// Returns the running stream and the sample rate actually selected.
fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    target_rate: u32,
    frame_size: usize,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    info!("Selected sample rate: {sample_rate} Hz");

    let err_fn = |err| error!("An error occurred on the audio stream: {err}");

    let mut audio_buffer = Vec::with_capacity(frame_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            audio_buffer.extend_from_slice(data);

            while audio_buffer.len() >= frame_size {
                let frame: Vec<f32> = audio_buffer.drain(..frame_size).collect();
                // Drop the buffer if the analysis side is behind.
                let _ = sender.try_send(frame);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Chooses the capture format handed to the AMDF estimator.
///
/// # Arguments
/// * `configs` - Formats reported by the input device
/// * `target_rate` - Sample rate the estimator is configured for, in Hz
///
/// # Returns
/// * `Some(config)` - A mono `f32` format whose rate range contains
///   `target_rate`, or failing that the one whose nearest rate is closest
/// * `None` - The device offers no mono `f32` format
fn find_supported_config(
    configs: impl IntoIterator<Item = SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| rate_gap(c.min_sample_rate().0..=c.max_sample_rate().0, target_rate))
}

/// Hz between `target` and the nearest rate in `range`; zero inside it.
fn rate_gap(range: RangeInclusive<u32>, target: u32) -> u32 {
    if target < *range.start() {
        range.start() - target
    } else {
        target.saturating_sub(*range.end())
    }
}

/// Runs on the source thread until shut down or the receiver goes away.
///
/// The CPAL stream is created and dropped on this thread.
pub fn run_live(config: ScribeConfig, events: Sender<SourceEvent>, control: Receiver<Control>) {
    let (raw_tx, raw_rx) = crossbeam_channel::bounded::<Vec<f32>>(8);

    let (stream, sample_rate) =
        match start_audio_capture(raw_tx, config.sample_rate, config.frame_size) {
            Ok(started) => started,
            Err(e) => {
                let _ = events.send(SourceEvent::Failed(e.context("starting audio capture")));
                return;
            }
        };

    let amdf = Amdf {
        sample_rate,
        ..Amdf::from_config(&config)
    };
    let started = Instant::now();

    loop {
        crossbeam_channel::select! {
            recv(raw_rx) -> msg => match msg {
                Ok(buffer) => {
                    let frame = Frame::new(started.elapsed(), amdf.detect(&buffer));
                    if events.send(SourceEvent::Frame(frame)).is_err() {
                        break;
                    }
                }
                Err(_) => {
                    warn!("Audio channel closed");
                    break;
                }
            },
            recv(control) -> msg => match msg {
                Ok(Control::Listen(true)) => {
                    if let Err(e) = stream.play() {
                        error!("Error resuming stream: {e}");
                    }
                }
                Ok(Control::Listen(false)) => {
                    if let Err(e) = stream.pause() {
                        error!("Error pausing stream: {e}");
                    }
                }
                Ok(Control::Shutdown) | Err(_) => break,
            },
        }
    }

    info!("Stopping audio stream");
    if let Err(e) = stream.pause() {
        error!("Error pausing stream: {e}");
    }
    drop(stream);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleFormat, SampleRate, SupportedBufferSize};

    fn range(
        channels: u16,
        min: u32,
        max: u32,
        format: SampleFormat,
    ) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn rate_gap_is_zero_inside_the_range() {
        assert_eq!(rate_gap(8_000..=96_000, 44_100), 0);
        assert_eq!(rate_gap(48_000..=96_000, 44_100), 3_900);
        assert_eq!(rate_gap(8_000..=22_050, 44_100), 22_050);
    }

    #[test]
    fn prefers_a_range_containing_the_target() {
        let configs = [
            range(1, 44_000, 44_000, SampleFormat::F32),
            range(2, 44_100, 44_100, SampleFormat::F32),
            range(1, 8_000, 96_000, SampleFormat::F32),
            range(1, 44_100, 44_100, SampleFormat::I16),
        ];
        let chosen = find_supported_config(configs, 44_100).unwrap();
        assert_eq!(chosen.min_sample_rate().0, 8_000);
    }

    #[test]
    fn needs_mono_f32() {
        let configs = [range(2, 44_100, 44_100, SampleFormat::F32)];
        assert!(find_supported_config(configs, 44_100).is_none());
    }
}
