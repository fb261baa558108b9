//! # AMDF Pitch Estimation Module
//!
//! Average Magnitude Difference Function pitch estimator: the upstream stage
//! that turns one buffer of audio samples into a single frequency, or `None`
//! when nothing pitched is sounding. Only live capture uses it; the notation
//! pipeline itself consumes frequencies from any source.
//!
//! For every candidate lag between the shortest and longest period of interest
//! the estimator sums `|x[i] - x[i + lag]|`. The first lag whose sum falls
//! below a sensitivity cutoff is refined to the nearby minimum, and that lag
//! is reported as the period if its dip is deep enough relative to the
//! largest difference.

use crate::config::ScribeConfig;

/// AMDF estimator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Amdf {
    pub sample_rate: u32,
    pub min_frequency: f64,
    pub max_frequency: f64,
    /// Fraction of the AMDF range above the minimum that counts as a dip.
    pub sensitivity: f64,
    /// A dip must be this many times shallower than the largest difference.
    pub ratio: f64,
    /// RMS below which a buffer is treated as silence.
    pub amplitude_threshold: f32,
}

impl Default for Amdf {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            min_frequency: 82.0,
            max_frequency: 1000.0,
            sensitivity: 0.1,
            ratio: 5.0,
            amplitude_threshold: 0.01,
        }
    }
}

impl Amdf {
    pub fn from_config(config: &ScribeConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            min_frequency: config.min_frequency_hz,
            max_frequency: config.max_frequency_hz,
            amplitude_threshold: config.amplitude_threshold,
            ..Self::default()
        }
    }

    /// Estimates the fundamental frequency of `signal` in Hz.
    pub fn detect(&self, signal: &[f32]) -> Option<f64> {
        let len = signal.len();
        if len < 2 {
            return None;
        }

        // --- Noise gate ---
        let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / len as f32).sqrt();
        if rms < self.amplitude_threshold {
            return None;
        }

        let sample_rate = self.sample_rate as f64;
        let min_period = ((sample_rate / self.max_frequency).floor() as usize).max(1);
        let max_period = ((sample_rate / self.min_frequency).ceil() as usize).min(len - 1);
        if min_period >= max_period {
            return None;
        }

        // amd[k] holds the difference sum for lag min_period + k.
        let amd: Vec<f64> = (min_period..=max_period)
            .map(|lag| {
                signal[..len - lag]
                    .iter()
                    .zip(&signal[lag..])
                    .map(|(a, b)| (a - b).abs() as f64)
                    .sum()
            })
            .collect();

        let span = &amd[..amd.len() - 1];
        let min_val = span.iter().copied().fold(f64::INFINITY, f64::min);
        let max_val = span.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let cutoff = (self.sensitivity * (max_val - min_val) + min_val).round();
        let first_dip = amd.iter().position(|&v| v <= cutoff)?;

        // Slide to the bottom of the dip.
        let search_end = (first_dip + min_period / 2).min(amd.len() - 1);
        let start = first_dip.saturating_sub(1);
        let mut best = first_dip;
        for k in start..=search_end {
            if amd[k] < amd[best] {
                best = k;
            }
        }

        if (amd[best] * self.ratio).round() < max_val {
            Some(sample_rate / (min_period + best) as f64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn detects_a_sine() {
        let amdf = Amdf::default();
        for freq in [110.0, 220.0, 440.0, 880.0] {
            let detected = amdf.detect(&sine(freq, 44_100, 2048)).unwrap();
            let error = (detected - freq as f64).abs() / freq as f64;
            assert!(error < 0.02, "{freq} Hz detected as {detected} Hz");
        }
    }

    #[test]
    fn silence_is_gated() {
        assert!(Amdf::default().detect(&[0.0f32; 2048]).is_none());
        let quiet: Vec<f32> = sine(440.0, 44_100, 2048).iter().map(|s| s * 0.001).collect();
        assert!(Amdf::default().detect(&quiet).is_none());
    }

    #[test]
    fn too_short_buffers_yield_nothing() {
        assert!(Amdf::default().detect(&[]).is_none());
        assert!(Amdf::default().detect(&sine(440.0, 44_100, 40)).is_none());
    }

    #[test]
    fn follows_config() {
        let config = ScribeConfig {
            sample_rate: 48_000,
            ..Default::default()
        };
        let amdf = Amdf::from_config(&config);
        assert_eq!(amdf.sample_rate, 48_000);
        let detected = amdf.detect(&sine(330.0, 48_000, 2048)).unwrap();
        assert!((detected - 330.0).abs() < 330.0 * 0.02);
    }
}
