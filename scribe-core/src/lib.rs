// scribe-core/src/lib.rs

//! The core logic for the pitch-to-notation scribe.
//! This crate maps detected frequencies to named pitches, tracks sustained
//! notes across analysis frames, and quantizes the resulting score into
//! measures. It is completely headless and contains no terminal or GUI code.

pub mod amdf;
pub mod classify;
pub mod config;
pub mod error;
pub mod frames;
pub mod notes;
pub mod rhythm;
pub mod session;
pub mod tracker;

pub use classify::{Classification, Deviation, classify};
pub use config::ScribeConfig;
pub use error::{Result, ScribeError};
pub use notes::{PitchDefinition, pitch_table};
pub use rhythm::{Measure, MeasureEntry, NoteValue, Quantizer, quantize};
pub use session::Session;
pub use tracker::{Action, NoteEvent, NoteTracker, TrackerState};

use std::time::Duration;

/// One analysis frame from the upstream pitch estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Offset from the start of the stream; non-decreasing across frames.
    pub timestamp: Duration,
    /// Detected frequency in Hz, `None` when no pitch was found.
    pub frequency: Option<f64>,
}

impl Frame {
    pub fn new(timestamp: Duration, frequency: Option<f64>) -> Self {
        Self {
            timestamp,
            frequency,
        }
    }
}
