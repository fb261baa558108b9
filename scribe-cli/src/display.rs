//! # Text Display Module
//!
//! Terminal rendering of the live tuner readout, the score and the quantized
//! measures, plus the JSON transcript handed to external staff renderers.

use scribe_core::{Classification, Measure, NoteEvent};
use serde::Serialize;
use std::fmt::Write;

/// Live readout line: name, tuning indicator, observed/reference Hz.
pub fn readout(current: Option<&Classification>) -> String {
    match current {
        Some(reading) => format!("{reading}  ({:+.1} cents)", reading.cents()),
        None => "-".to_string(),
    }
}

/// One line per note event with start time and duration in milliseconds.
pub fn score_text(score: &[NoteEvent]) -> String {
    if score.is_empty() {
        return "(empty score)".to_string();
    }
    let mut out = String::new();
    for (i, note) in score.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<5} {:>9.1} ms  {:>8.1} ms",
            i + 1,
            note.key(),
            note.start.as_secs_f64() * 1000.0,
            note.duration().as_secs_f64() * 1000.0
        );
    }
    out
}

/// Measures as bar-delimited `key/code` tokens, e.g. `| c4/h e4/h | |`.
pub fn measures_text(measures: &[Measure]) -> String {
    let mut out = String::from("|");
    for measure in measures {
        for entry in &measure.entries {
            let _ = write!(out, " {}/{}", entry.key, entry.value.code());
        }
        out.push_str(" |");
    }
    out
}

/// Everything a renderer needs to draw the session.
#[derive(Debug, Serialize)]
pub struct Transcript<'a> {
    pub tempo_bpm: f64,
    pub half_beat_ms: f64,
    pub score: &'a [NoteEvent],
    pub measures: &'a [Measure],
}
