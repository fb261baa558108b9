//! # Note Event Tracker Module
//!
//! Turns the per-frame stream of classifications into note events. Consecutive
//! frames of the same pitch extend one event; a different pitch opens a new
//! one; silence closes the open event without discarding it.
//!
//! The transition logic is a pure function, [`reduce`], over an owned
//! [`TrackerState`]. [`NoteTracker`] is the stateful wrapper a frame loop
//! drives.

use crate::Frame;
use crate::classify::{Classification, classify};
use crate::notes::PitchDefinition;
use log::{debug, trace, warn};
use serde::Serialize;
use std::time::Duration;

/// A sustained pitch between two stream timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEvent {
    pub pitch: &'static PitchDefinition,
    /// Offset from the start of the stream.
    pub start: Duration,
    /// Offset from the start of the stream, never before `start`.
    pub end: Duration,
}

impl NoteEvent {
    fn open(pitch: &'static PitchDefinition, at: Duration) -> Self {
        Self {
            pitch,
            start: at,
            end: at,
        }
    }

    pub fn key(&self) -> &'static str {
        self.pitch.key
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Tracker inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A frame classified to a pitch.
    NewNote(Classification),
    /// A silent (or rejected) frame.
    ClearNote,
    /// Discard the accumulated score; the open note, if any, stays open.
    ClearScore,
}

/// The note currently sounding.
#[derive(Debug, Clone, PartialEq)]
struct OpenNote {
    /// Most recent classification, for live display.
    reading: Classification,
    event: NoteEvent,
    /// False once the score was cleared under this note.
    recorded: bool,
}

/// Score plus the open note, if any (Idle when `current` is `None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    score: Vec<NoteEvent>,
    current: Option<OpenNote>,
}

impl TrackerState {
    /// All note events in temporal order. The open note, when recorded, is last.
    pub fn score(&self) -> &[NoteEvent] {
        &self.score
    }

    /// Latest classification of the sounding note, `None` while idle.
    pub fn current(&self) -> Option<&Classification> {
        self.current.as_ref().map(|open| &open.reading)
    }

    /// The open note event, `None` while idle.
    pub fn current_note(&self) -> Option<&NoteEvent> {
        self.current.as_ref().map(|open| &open.event)
    }

    pub fn is_sustaining(&self) -> bool {
        self.current.is_some()
    }
}

/// Applies one action at stream time `now` and returns the next state.
pub fn reduce(mut state: TrackerState, action: Action, now: Duration) -> TrackerState {
    match action {
        Action::NewNote(reading) => {
            let sustained = state
                .current
                .as_ref()
                .is_some_and(|open| open.event.key() == reading.key());

            if let (true, Some(open)) = (sustained, state.current.as_mut()) {
                open.event.end = now.max(open.event.start);
                open.reading = reading;
                if open.recorded {
                    if let Some(last) = state.score.last_mut() {
                        last.end = open.event.end;
                    }
                }
                trace!("extend {} to {:?}", open.event.key(), open.event.end);
            } else {
                if let Some(closed) = state.current.as_ref() {
                    debug!(
                        "close {} after {:?}",
                        closed.event.key(),
                        closed.event.duration()
                    );
                }
                let event = NoteEvent::open(reading.pitch, now);
                debug!("open {} at {:?}", event.key(), now);
                state.score.push(event.clone());
                state.current = Some(OpenNote {
                    reading,
                    event,
                    recorded: true,
                });
            }
        }
        Action::ClearNote => {
            if let Some(closed) = state.current.take() {
                debug!(
                    "close {} after {:?}",
                    closed.event.key(),
                    closed.event.duration()
                );
            }
        }
        Action::ClearScore => {
            debug!("clear score ({} events)", state.score.len());
            state.score.clear();
            if let Some(open) = state.current.as_mut() {
                open.recorded = false;
            }
        }
    }
    state
}

/// Drives [`reduce`] from a stream of frames.
#[derive(Debug, Clone, Default)]
pub struct NoteTracker {
    state: TrackerState,
}

impl NoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies a frame and applies it.
    ///
    /// A malformed frequency is logged and handled as silence so one bad frame
    /// cannot interrupt tracking.
    pub fn push_frame(&mut self, frame: Frame) {
        let action = match classify(frame.frequency) {
            Ok(Some(reading)) => Action::NewNote(reading),
            Ok(None) => Action::ClearNote,
            Err(e) => {
                warn!("frame at {:?} treated as silence: {e}", frame.timestamp);
                Action::ClearNote
            }
        };
        self.apply(action, frame.timestamp);
    }

    pub fn apply(&mut self, action: Action, now: Duration) {
        self.state = reduce(std::mem::take(&mut self.state), action, now);
    }

    /// Discards the score without touching the open note.
    pub fn clear_score(&mut self) {
        // `ClearScore` is timeless.
        self.apply(Action::ClearScore, Duration::ZERO);
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn score(&self) -> &[NoteEvent] {
        self.state.score()
    }

    pub fn current(&self) -> Option<&Classification> {
        self.state.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_hz;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn frame(at: u64, freq: Option<f64>) -> Frame {
        Frame {
            timestamp: ms(at),
            frequency: freq,
        }
    }

    fn feed(frames: &[(u64, Option<f64>)]) -> NoteTracker {
        let mut tracker = NoteTracker::new();
        for &(at, freq) in frames {
            tracker.push_frame(frame(at, freq));
        }
        tracker
    }

    #[test]
    fn idle_silence_is_a_no_op() {
        let tracker = feed(&[(0, None), (10, None)]);
        assert!(tracker.score().is_empty());
        assert!(!tracker.state().is_sustaining());
    }

    #[test]
    fn same_pitch_merges_into_one_event() {
        let tracker = feed(&[(0, Some(440.0)), (100, Some(440.0)), (200, Some(441.0))]);
        assert_eq!(tracker.score().len(), 1);
        let note = &tracker.score()[0];
        assert_eq!(note.key(), "a4");
        assert_eq!(note.start, ms(0));
        assert_eq!(note.end, ms(200));
        assert_eq!(tracker.current().unwrap().observed_hz, 441.0);
        assert_eq!(tracker.state().current_note(), Some(note));
    }

    #[test]
    fn silence_splits_repeated_pitch() {
        let tracker = feed(&[(0, Some(440.0)), (100, None), (200, Some(440.0))]);
        assert_eq!(tracker.score().len(), 2);
        assert_eq!(tracker.score()[0].duration(), Duration::ZERO);
        assert_eq!(tracker.score()[1].start, ms(200));
    }

    #[test]
    fn pitch_change_opens_a_new_event() {
        let tracker = feed(&[(0, Some(440.0)), (100, Some(440.0)), (150, Some(493.883))]);
        let keys: Vec<_> = tracker.score().iter().map(NoteEvent::key).collect();
        assert_eq!(keys, ["a4", "b4"]);
        assert_eq!(tracker.score()[0].end, ms(100));
        assert_eq!(tracker.current().unwrap().key(), "b4");
    }

    #[test]
    fn silence_keeps_the_closed_note() {
        let tracker = feed(&[(0, Some(440.0)), (300, Some(440.0)), (350, None)]);
        assert!(tracker.current().is_none());
        assert_eq!(tracker.score()[0].end, ms(300));
    }

    #[test]
    fn bad_frames_count_as_silence() {
        let tracker = feed(&[(0, Some(440.0)), (50, Some(f64::NAN)), (100, Some(440.0))]);
        assert_eq!(tracker.score().len(), 2);
    }

    #[test]
    fn clear_score_keeps_the_open_note() {
        let mut tracker = feed(&[(0, Some(330.0)), (100, Some(440.0)), (150, Some(440.0))]);
        tracker.clear_score();
        assert!(tracker.score().is_empty());
        assert_eq!(tracker.current().unwrap().key(), "a4");
        let open = tracker.state().current_note().unwrap();
        assert_eq!((open.start, open.end), (ms(100), ms(150)));

        // The open note keeps extending but is not re-recorded.
        tracker.push_frame(frame(200, Some(440.0)));
        assert!(tracker.score().is_empty());
        assert_eq!(tracker.state().current_note().unwrap().end, ms(200));

        tracker.push_frame(frame(300, Some(330.0)));
        assert_eq!(tracker.score().len(), 1);
        assert_eq!(tracker.score()[0].key(), "e4");
    }

    #[test]
    fn clear_score_ignores_the_timestamp() {
        let state = feed(&[(0, Some(330.0)), (100, Some(440.0))]).state().clone();
        let early = reduce(state.clone(), Action::ClearScore, Duration::ZERO);
        let late = reduce(state, Action::ClearScore, ms(10_000));
        assert_eq!(early, late);
        assert_eq!(early.current_note().unwrap().end, ms(100));
    }

    #[test]
    fn reduce_is_pure() {
        let a4 = classify_hz(440.0).unwrap();
        let before = TrackerState::default();
        let after = reduce(before.clone(), Action::NewNote(a4), ms(5));
        assert_eq!(before, TrackerState::default());
        assert_eq!(after.score().len(), 1);
    }
}
