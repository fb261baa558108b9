//! Text format for recorded frame streams.
//!
//! One frame per line: `<timestamp_ms> <frequency_hz>`, or `<timestamp_ms> -`
//! for a frame with no detected pitch. Blank lines and `#` comments are
//! skipped. Timestamps must not decrease.

use crate::Frame;
use crate::error::{Result, ScribeError};
use std::io::BufRead;
use std::time::Duration;

/// Parses a single line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Frame>> {
    let content = line.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }

    let err = |message: String| ScribeError::Parse {
        line: line_no,
        message,
    };

    let mut fields = content.split_whitespace();
    let (Some(ts), Some(freq), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(err(format!("expected `<timestamp_ms> <hz|->`, got `{content}`")));
    };

    let ms: f64 = ts
        .parse()
        .map_err(|_| err(format!("bad timestamp `{ts}`")))?;
    if !ms.is_finite() || ms < 0.0 {
        return Err(err(format!("timestamp must be non-negative, got `{ts}`")));
    }

    // Out-of-range frequencies are passed through; the classifier rejects them.
    let frequency = match freq {
        "-" => None,
        hz => Some(
            hz.parse::<f64>()
                .map_err(|_| err(format!("bad frequency `{hz}`")))?,
        ),
    };

    let timestamp = Duration::try_from_secs_f64(ms / 1000.0)
        .map_err(|_| err(format!("timestamp out of range `{ts}`")))?;

    Ok(Some(Frame {
        timestamp,
        frequency,
    }))
}

/// Reads every frame from `reader`, checking timestamps never go backwards.
pub fn read_frames(reader: impl BufRead) -> Result<Vec<Frame>> {
    let mut frames: Vec<Frame> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let Some(frame) = parse_line(&line?, line_no)? else {
            continue;
        };
        if let Some(prev) = frames.last() {
            if frame.timestamp < prev.timestamp {
                return Err(ScribeError::Parse {
                    line: line_no,
                    message: "timestamp goes backwards".to_string(),
                });
            }
        }
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pitched_and_silent_frames() {
        let text = "# take 1\n0 440.0\n\n46.4 -\n92.8 261.626 # c\n";
        let frames = read_frames(text.as_bytes()).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].frequency, Some(440.0));
        assert_eq!(frames[1].frequency, None);
        assert_eq!(frames[2].timestamp, Duration::from_secs_f64(92.8 / 1000.0));
    }

    #[test]
    fn keeps_bad_frequencies_for_the_classifier() {
        let frame = parse_line("10 -5", 1).unwrap().unwrap();
        assert_eq!(frame.frequency, Some(-5.0));
    }

    #[test]
    fn reports_line_numbers() {
        let err = read_frames("0 440\n10 abc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScribeError::Parse { line: 2, .. }));

        let err = read_frames("0 440\n10 440 extra\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScribeError::Parse { line: 2, .. }));

        let err = read_frames("-1 440\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScribeError::Parse { line: 1, .. }));

        let err = read_frames("1e30 440\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScribeError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_decreasing_timestamps() {
        let err = read_frames("100 440\n50 440\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ScribeError::Parse { line: 2, .. }));
    }
}
