//! Runtime settings for a scribe session, loadable from a JSON file.

use crate::error::{Result, ScribeError};
use crate::rhythm::{DEFAULT_MEASURE_UNITS, Quantizer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Session settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// Tempo used by the rhythm quantizer (quarter note = one beat).
    pub tempo_bpm: f64,
    /// Half-beat units per measure.
    pub measure_units: u32,
    /// Minimum RMS amplitude before live capture attempts pitch detection.
    pub amplitude_threshold: f32,
    /// Live capture sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per analysis frame.
    pub frame_size: usize,
    /// Lowest frequency the live estimator searches for.
    pub min_frequency_hz: f64,
    /// Highest frequency the live estimator searches for.
    pub max_frequency_hz: f64,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            measure_units: DEFAULT_MEASURE_UNITS,
            amplitude_threshold: 0.01,
            sample_rate: 44_100,
            frame_size: 2048,
            min_frequency_hz: 82.0,
            max_frequency_hz: 1000.0,
        }
    }
}

impl ScribeConfig {
    /// Loads and validates a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut data = String::new();
        File::open(path)?.read_to_string(&mut data)?;
        let config: ScribeConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.quantizer()?;
        if self.sample_rate == 0 {
            return Err(ScribeError::config(
                "sample_rate",
                self.sample_rate,
                "sample rate must be positive",
            ));
        }
        if self.frame_size < 2 {
            return Err(ScribeError::config(
                "frame_size",
                self.frame_size,
                "a frame needs at least two samples",
            ));
        }
        if !(self.min_frequency_hz > 0.0 && self.min_frequency_hz < self.max_frequency_hz) {
            return Err(ScribeError::config(
                "min_frequency_hz",
                self.min_frequency_hz,
                "must be positive and below max_frequency_hz",
            ));
        }
        let nyquist = self.sample_rate as f64 / 2.0;
        if !self.max_frequency_hz.is_finite() || self.max_frequency_hz >= nyquist {
            return Err(ScribeError::config(
                "max_frequency_hz",
                self.max_frequency_hz,
                "must be below the Nyquist frequency",
            ));
        }
        Ok(())
    }

    /// Quantizer for this config's tempo and measure capacity.
    pub fn quantizer(&self) -> Result<Quantizer> {
        Quantizer::with_measure_units(self.tempo_bpm, self.measure_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScribeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.quantizer().unwrap().half_beat_ms(), 250.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ScribeConfig = serde_json::from_str(r#"{ "tempo_bpm": 90.0 }"#).unwrap();
        assert_eq!(config.tempo_bpm, 90.0);
        assert_eq!(config.measure_units, 8);
        assert_eq!(config.frame_size, 2048);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad = [
            ScribeConfig {
                tempo_bpm: 0.0,
                ..Default::default()
            },
            ScribeConfig {
                tempo_bpm: 60_000.0,
                ..Default::default()
            },
            ScribeConfig {
                measure_units: 0,
                ..Default::default()
            },
            ScribeConfig {
                sample_rate: 0,
                ..Default::default()
            },
            ScribeConfig {
                min_frequency_hz: 2000.0,
                ..Default::default()
            },
            ScribeConfig {
                max_frequency_hz: 30_000.0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(ScribeError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn load_reads_and_validates() {
        let dir = std::env::temp_dir().join(format!("scribe-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.json");
        let bad = dir.join("bad.json");
        std::fs::write(&good, r#"{ "tempo_bpm": 60.0, "measure_units": 6 }"#).unwrap();
        std::fs::write(&bad, r#"{ "tempo_bpm": -1.0 }"#).unwrap();

        assert_eq!(ScribeConfig::load(&good).unwrap().measure_units, 6);
        assert!(ScribeConfig::load(&bad).is_err());
        assert!(matches!(
            ScribeConfig::load(dir.join("missing.json")),
            Err(ScribeError::Io(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
