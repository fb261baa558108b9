//! # Pitch Classifier Module
//!
//! Maps a single detected frequency onto the pitch table and measures how far
//! it sits from the matched pitch's reference frequency.
//!
//! The tuning verdict is a flat / in-tune / sharp trichotomy: a pitch counts as
//! in tune while the observed frequency stays within a fifth of the distance
//! from the reference to either band edge. A continuous cent value is also
//! available for meters that want one.

use crate::error::{Result, ScribeError};
use crate::notes::{PitchDefinition, pitch_table};
use serde::Serialize;
use std::fmt;

/// Fraction of the half-band on each side that still counts as in tune.
const TOLERANCE_DIVISOR: f64 = 5.0;

/// Tuning verdict for one classified frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Deviation {
    Flat,
    InTune,
    Sharp,
}

impl Deviation {
    /// Indicator shown next to the pitch name: which way to tune, or a check.
    pub fn indicator(self) -> &'static str {
        match self {
            Deviation::Flat => "↑",
            Deviation::Sharp => "↓",
            Deviation::InTune => "✅",
        }
    }
}

/// A frequency matched to its pitch table entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub pitch: &'static PitchDefinition,
    pub observed_hz: f64,
}

impl Classification {
    /// Key of the matched pitch, used for merging consecutive frames.
    pub fn key(&self) -> &'static str {
        self.pitch.key
    }

    /// Flat, in tune or sharp relative to the matched pitch.
    pub fn deviation(&self) -> Deviation {
        let PitchDefinition {
            reference_hz: hz,
            lower_hz: low,
            upper_hz: high,
            ..
        } = *self.pitch;
        let freq = self.observed_hz;

        if freq < hz - (hz - low) / TOLERANCE_DIVISOR {
            Deviation::Flat
        } else if freq > hz + (high - hz) / TOLERANCE_DIVISOR {
            Deviation::Sharp
        } else {
            Deviation::InTune
        }
    }

    /// Deviation from the reference frequency in cents (positive = sharp).
    pub fn cents(&self) -> f64 {
        1200.0 * (self.observed_hz / self.pitch.reference_hz).log2()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.2}/{:.2}",
            self.pitch.display_name,
            self.deviation().indicator(),
            self.observed_hz,
            self.pitch.reference_hz
        )
    }
}

/// Classifies one analysis frame.
///
/// `None` (no pitch detected) yields `Ok(None)`, i.e. silence. A present
/// frequency must be finite and positive.
pub fn classify(frequency: Option<f64>) -> Result<Option<Classification>> {
    frequency.map(classify_hz).transpose()
}

/// Classifies a present frequency against the pitch table.
pub fn classify_hz(freq: f64) -> Result<Classification> {
    if !freq.is_finite() || freq <= 0.0 {
        return Err(ScribeError::InvalidFrequency { freq });
    }

    let table = pitch_table();
    // First band whose upper edge lies above `freq`; same answer as a linear scan.
    let idx = table.partition_point(|p| p.upper_hz <= freq);
    let pitch = match table.get(idx) {
        Some(pitch) if pitch.contains(freq) => pitch,
        _ => unreachable!("pitch bands cover [0, inf) but {freq} Hz matched none"),
    };

    Ok(Classification {
        pitch,
        observed_hz: freq,
    })
}
