//! # Rhythm Quantizer Module
//!
//! Converts a finished score into measures of standard note values.
//!
//! Durations are counted in half-beat units (one eighth note at the configured
//! tempo, quarter note = one beat). Each note's unit count is decomposed
//! greedily into whole, half, quarter and eighth notes, and tokens are packed
//! into measures of a fixed capacity (8 units, one 4/4 bar, by default).
//!
//! Notes that straddle a bar line are not tied: once a measure reaches its
//! capacity a fresh, empty measure is started and the overflow is dropped.

use crate::error::{Result, ScribeError};
use crate::tracker::NoteEvent;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Half-beat units in one 4/4 measure.
pub const DEFAULT_MEASURE_UNITS: u32 = 8;

/// Longest note the quantizer will decompose, in half-beat units.
pub const MAX_NOTE_UNITS: u32 = 1 << 16;

/// Standard note durations, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
}

impl NoteValue {
    /// Denomination ladder used by the greedy decomposition.
    pub const LADDER: [NoteValue; 4] = [
        NoteValue::Whole,
        NoteValue::Half,
        NoteValue::Quarter,
        NoteValue::Eighth,
    ];

    /// Length in half-beat units.
    pub fn units(self) -> u32 {
        match self {
            NoteValue::Whole => 8,
            NoteValue::Half => 4,
            NoteValue::Quarter => 2,
            NoteValue::Eighth => 1,
        }
    }

    /// Duration code as used by common staff renderers ("w", "h", "q", "8").
    pub fn code(self) -> &'static str {
        match self {
            NoteValue::Whole => "w",
            NoteValue::Half => "h",
            NoteValue::Quarter => "q",
            NoteValue::Eighth => "8",
        }
    }

    /// Greedy largest-first decomposition of `units` half-beats.
    pub fn decompose(mut units: u32) -> Vec<NoteValue> {
        let mut values = Vec::new();
        while units > 0 {
            let value = Self::LADDER
                .into_iter()
                .find(|v| v.units() <= units)
                .unwrap_or(NoteValue::Eighth);
            values.push(value);
            units -= value.units();
        }
        values
    }
}

/// One notated token: a pitch key and its duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureEntry {
    pub key: String,
    pub value: NoteValue,
}

/// A bar of tokens with its running fill in half-beat units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub entries: Vec<MeasureEntry>,
    pub units: u32,
}

impl Measure {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Quantizer settings: tempo and measure capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    beats_per_minute: f64,
    measure_units: u32,
}

impl Quantizer {
    /// A 4/4 quantizer at the given tempo.
    pub fn new(beats_per_minute: f64) -> Result<Self> {
        Self::with_measure_units(beats_per_minute, DEFAULT_MEASURE_UNITS)
    }

    pub fn with_measure_units(beats_per_minute: f64, measure_units: u32) -> Result<Self> {
        if !beats_per_minute.is_finite() || beats_per_minute <= 0.0 {
            return Err(ScribeError::config(
                "tempo_bpm",
                beats_per_minute,
                "tempo must be a finite number of beats per minute above zero",
            ));
        }
        if 60_000.0 / (beats_per_minute * 2.0) < 1.0 {
            return Err(ScribeError::config(
                "tempo_bpm",
                beats_per_minute,
                "a half-beat must last at least one millisecond",
            ));
        }
        if measure_units == 0 {
            return Err(ScribeError::config(
                "measure_units",
                measure_units,
                "a measure must hold at least one half-beat",
            ));
        }
        Ok(Self {
            beats_per_minute,
            measure_units,
        })
    }

    /// Milliseconds in one half-beat (eighth note).
    pub fn half_beat_ms(&self) -> f64 {
        60_000.0 / (self.beats_per_minute * 2.0)
    }

    /// Whole half-beats covered by a note, or `None` below one half-beat.
    ///
    /// Counts are capped at [`MAX_NOTE_UNITS`].
    pub fn half_beat_units(&self, note: &NoteEvent) -> Option<u32> {
        let duration_ms = note.duration().as_secs_f64() * 1000.0;
        let units = (duration_ms / self.half_beat_ms()).floor();
        if units < 1.0 {
            return None;
        }
        if units > MAX_NOTE_UNITS as f64 {
            warn!("{} lasts {units} half-beats, capped at {MAX_NOTE_UNITS}", note.key());
            return Some(MAX_NOTE_UNITS);
        }
        Some(units as u32)
    }

    /// Renders a score into measures, in creation order.
    ///
    /// There is always at least one measure; the last one may be empty when
    /// the final token exactly fills a bar.
    pub fn quantize(&self, score: &[NoteEvent]) -> Vec<Measure> {
        let mut measures = vec![Measure::default()];

        for note in score {
            let Some(units) = self.half_beat_units(note) else {
                debug!("skip {} shorter than a half-beat", note.key());
                continue;
            };

            for value in NoteValue::decompose(units) {
                let Some(measure) = measures.last_mut() else {
                    unreachable!("measures is never empty");
                };
                measure.entries.push(MeasureEntry {
                    key: note.key().to_string(),
                    value,
                });
                measure.units += value.units();

                // TODO: tie the remainder into the next measure instead of dropping it.
                if measure.units >= self.measure_units {
                    measures.push(Measure::default());
                }
            }
        }
        measures
    }
}

/// Quantizes a score at `beats_per_minute` into 4/4 measures.
pub fn quantize(score: &[NoteEvent], beats_per_minute: f64) -> Result<Vec<Measure>> {
    Ok(Quantizer::new(beats_per_minute)?.quantize(score))
}
