//! # Session Module
//!
//! A [`NoteTracker`] behind a single lock so the frame loop and readers on
//! other threads (score display, quantization, "clear score") never observe a
//! half-applied update.

use crate::Frame;
use crate::classify::Classification;
use crate::error::Result;
use crate::rhythm::{Measure, Quantizer};
use crate::tracker::{NoteEvent, NoteTracker};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to a shared tracker.
#[derive(Debug, Clone)]
pub struct Session {
    tracker: Arc<Mutex<NoteTracker>>,
    quantizer: Quantizer,
}

impl Session {
    pub fn new(quantizer: Quantizer) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(NoteTracker::new())),
            quantizer,
        }
    }

    /// A 4/4 session at `beats_per_minute`.
    pub fn with_tempo(beats_per_minute: f64) -> Result<Self> {
        Ok(Self::new(Quantizer::new(beats_per_minute)?))
    }

    fn lock(&self) -> MutexGuard<'_, NoteTracker> {
        // Every tracker update is a single assignment, so a panic elsewhere
        // cannot leave the state half-written.
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one frame and returns the resulting live reading.
    pub fn push_frame(&self, frame: Frame) -> Option<Classification> {
        let mut tracker = self.lock();
        tracker.push_frame(frame);
        tracker.current().cloned()
    }

    pub fn clear_score(&self) {
        self.lock().clear_score();
    }

    pub fn current(&self) -> Option<Classification> {
        self.lock().current().cloned()
    }

    /// Copy of the score as of now.
    pub fn snapshot(&self) -> Vec<NoteEvent> {
        self.lock().score().to_vec()
    }

    /// Quantizes the score while holding the lock.
    pub fn quantize(&self) -> Vec<Measure> {
        let tracker = self.lock();
        self.quantizer.quantize(tracker.score())
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame(ms: u64, freq: Option<f64>) -> Frame {
        Frame {
            timestamp: Duration::from_millis(ms),
            frequency: freq,
        }
    }

    #[test]
    fn clones_share_one_score() {
        let session = Session::with_tempo(120.0).unwrap();
        let reader = session.clone();
        session.push_frame(frame(0, Some(440.0)));
        session.push_frame(frame(500, Some(440.0)));
        assert_eq!(reader.snapshot().len(), 1);
        assert_eq!(reader.current().unwrap().key(), "a4");

        reader.clear_score();
        assert!(session.snapshot().is_empty());
        assert!(session.current().is_some());
    }

    #[test]
    fn push_frame_reports_live_reading() {
        let session = Session::with_tempo(120.0).unwrap();
        assert_eq!(session.push_frame(frame(0, Some(329.628))).unwrap().key(), "e4");
        assert!(session.push_frame(frame(10, None)).is_none());
    }

    #[test]
    fn rejects_bad_tempo() {
        assert!(Session::with_tempo(0.0).is_err());
    }
}
