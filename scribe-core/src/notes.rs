//! # Pitch Table Module
//!
//! The static catalog of the 88 named pitches of a standard piano (A0 to C8).
//! Every entry carries an acceptance band bounded by the midpoints to its
//! neighbours, so the bands together cover `[0, +inf)` without gaps or overlap
//! and any positive frequency belongs to exactly one pitch.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

/// A single named pitch with its reference frequency and acceptance band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchDefinition {
    /// Piano key index (0 is A0, 87 is C8).
    pub index: u8,
    /// Canonical frequency in Hz (e.g. 440.0 for A4).
    pub reference_hz: f64,
    /// Human readable name, including enharmonic spellings for black keys.
    pub display_name: &'static str,
    /// Lowercase, octave-suffixed identifier used for merging and notation.
    pub key: &'static str,
    /// Midpoint with the previous entry, or 0 for the lowest pitch.
    pub lower_hz: f64,
    /// Midpoint with the next entry, or +inf for the highest pitch.
    pub upper_hz: f64,
}

impl PitchDefinition {
    /// Whether `freq` falls inside `[lower_hz, upper_hz)`.
    pub fn contains(&self, freq: f64) -> bool {
        self.lower_hz <= freq && freq < self.upper_hz
    }
}

/// Reference frequencies, display names and keys for the 88 piano keys,
/// equal-tempered around A4 = 440 Hz.
const PITCH_DATA: [(f64, &str, &str); 88] = [
    (27.5, "A0 Double Pedal A", "a0"),
    (29.1352, "A♯0/B♭0", "a#0"),
    (30.8677, "B0", "b0"),
    (32.7032, "C1 Pedal C", "c1"),
    (34.6478, "C♯1/D♭1", "c#1"),
    (36.7081, "D1", "d1"),
    (38.8909, "D♯1/E♭1", "d#1"),
    (41.2034, "E1", "e1"),
    (43.6535, "F1", "f1"),
    (46.2493, "F♯1/G♭1", "f#1"),
    (48.9994, "G1", "g1"),
    (51.9131, "G♯1/A♭1", "g#1"),
    (55.0, "A1", "a1"),
    (58.2705, "A♯1/B♭1", "a#1"),
    (61.7354, "B1", "b1"),
    (65.4064, "C2 Deep C", "c2"),
    (69.2957, "C♯2/D♭2", "c#2"),
    (73.4162, "D2", "d2"),
    (77.7817, "D♯2/E♭2", "d#2"),
    (82.4069, "E2", "e2"),
    (87.3071, "F2", "f2"),
    (92.4986, "F♯2/G♭2", "f#2"),
    (97.9989, "G2", "g2"),
    (103.826, "G♯2/A♭2", "g#2"),
    (110.0, "A2", "a2"),
    (116.541, "A♯2/B♭2", "a#2"),
    (123.471, "B2", "b2"),
    (130.813, "C3", "c3"),
    (138.591, "C♯3/D♭3", "c#3"),
    (146.832, "D3", "d3"),
    (155.563, "D♯3/E♭3", "d#3"),
    (164.814, "E3", "e3"),
    (174.614, "F3", "f3"),
    (184.997, "F♯3/G♭3", "f#3"),
    (195.998, "G3", "g3"),
    (207.652, "G♯3/A♭3", "g#3"),
    (220.0, "A3", "a3"),
    (233.082, "A♯3/B♭3", "a#3"),
    (246.942, "B3", "b3"),
    (261.626, "C4 Middle C", "c4"),
    (277.183, "C♯4/D♭4", "c#4"),
    (293.665, "D4", "d4"),
    (311.127, "D♯4/E♭4", "d#4"),
    (329.628, "E4", "e4"),
    (349.228, "F4", "f4"),
    (369.994, "F♯4/G♭4", "f#4"),
    (391.995, "G4", "g4"),
    (415.305, "G♯4/A♭4", "g#4"),
    (440.0, "A4 A440", "a4"),
    (466.164, "A♯4/B♭4", "a#4"),
    (493.883, "B4", "b4"),
    (523.251, "C5 Tenor C", "c5"),
    (554.365, "C♯5/D♭5", "c#5"),
    (587.33, "D5", "d5"),
    (622.254, "D♯5/E♭5", "d#5"),
    (659.255, "E5", "e5"),
    (698.456, "F5", "f5"),
    (739.989, "F♯5/G♭5", "f#5"),
    (783.991, "G5", "g5"),
    (830.609, "G♯5/A♭5", "g#5"),
    (880.0, "A5", "a5"),
    (932.328, "A♯5/B♭5", "a#5"),
    (987.767, "B5", "b5"),
    (1046.5, "C6 Soprano C(High C)", "c6"),
    (1108.73, "C♯6/D♭6", "c#6"),
    (1174.66, "D6", "d6"),
    (1244.51, "D♯6/E♭6", "d#6"),
    (1318.51, "E6", "e6"),
    (1396.91, "F6", "f6"),
    (1479.98, "F♯6/G♭6", "f#6"),
    (1567.98, "G6", "g6"),
    (1661.22, "G♯6/A♭6", "g#6"),
    (1760.0, "A6", "a6"),
    (1864.66, "A♯6/B♭6", "a#6"),
    (1975.53, "B6", "b6"),
    (2093.0, "C7 Double high C", "c7"),
    (2217.46, "C♯7/D♭7", "c#7"),
    (2349.32, "D7", "d7"),
    (2489.02, "D♯7/E♭7", "d#7"),
    (2637.02, "E7", "e7"),
    (2793.83, "F7", "f7"),
    (2959.96, "F♯7/G♭7", "f#7"),
    (3135.96, "G7", "g7"),
    (3322.44, "G♯7/A♭7", "g#7"),
    (3520.0, "A7", "a7"),
    (3729.31, "A♯7/B♭7", "a#7"),
    (3951.07, "B7", "b7"),
    (4186.01, "C8 Eighth octave", "c8"),
];

/// The pitch table, built once on first use and read-only afterwards.
static PITCH_TABLE: Lazy<Vec<PitchDefinition>> = Lazy::new(|| build_table(&PITCH_DATA));

/// Map from pitch key to table index for notation lookups.
static KEY_MAP: Lazy<BTreeMap<&'static str, usize>> = Lazy::new(|| {
    PITCH_TABLE
        .iter()
        .enumerate()
        .map(|(i, pitch)| (pitch.key, i))
        .collect()
});

/// Builds an ordered table from `(frequency, name, key)` triples.
///
/// Entries are sorted ascending by frequency, then each band is bounded by
/// the linear midpoints to its neighbours. The first band starts at 0 and
/// the last one is open-ended.
fn build_table(data: &[(f64, &'static str, &'static str)]) -> Vec<PitchDefinition> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let last = sorted.len().saturating_sub(1);
    sorted
        .iter()
        .enumerate()
        .map(|(i, &(hz, display_name, key))| {
            let lower_hz = if i == 0 { 0.0 } else { (sorted[i - 1].0 + hz) / 2.0 };
            let upper_hz = if i == last {
                f64::INFINITY
            } else {
                (hz + sorted[i + 1].0) / 2.0
            };
            PitchDefinition {
                index: i as u8,
                reference_hz: hz,
                display_name,
                key,
                lower_hz,
                upper_hz,
            }
        })
        .collect()
}

/// Returns the full table, sorted strictly ascending by reference frequency.
pub fn pitch_table() -> &'static [PitchDefinition] {
    &PITCH_TABLE
}

/// Looks up a pitch by its key (e.g. `"a4"`, `"c#3"`).
pub fn find_by_key(key: &str) -> Option<&'static PitchDefinition> {
    index_of(key).map(|i| &PITCH_TABLE[i])
}

/// Gets the 88-key piano index for a pitch key.
pub fn index_of(key: &str) -> Option<usize> {
    KEY_MAP.get(key.trim().to_lowercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_spans_the_piano() {
        let table = pitch_table();
        assert_eq!(table.len(), 88);
        assert_eq!(table[0].key, "a0");
        assert_eq!(table[0].reference_hz, 27.5);
        assert_eq!(table[87].key, "c8");
        assert_eq!(table[87].reference_hz, 4186.01);
    }

    #[test]
    fn table_is_strictly_ascending() {
        let table = pitch_table();
        assert!(table.windows(2).all(|w| w[0].reference_hz < w[1].reference_hz));
    }

    #[test]
    fn bands_partition_the_positive_axis() {
        let table = pitch_table();
        assert_eq!(table[0].lower_hz, 0.0);
        assert!(table[87].upper_hz.is_infinite());
        for pair in table.windows(2) {
            assert_eq!(pair[0].upper_hz, pair[1].lower_hz);
            assert!(pair[0].lower_hz < pair[0].reference_hz);
            assert!(pair[0].reference_hz < pair[0].upper_hz);
        }
    }

    #[test]
    fn keys_are_unique_and_match_index() {
        let table = pitch_table();
        assert_eq!(KEY_MAP.len(), table.len());
        for (i, pitch) in table.iter().enumerate() {
            assert_eq!(pitch.index as usize, i);
            assert_eq!(index_of(pitch.key), Some(i));
        }
    }

    #[test]
    fn lookup_by_key() {
        let a4 = find_by_key("A4").unwrap();
        assert_eq!(a4.reference_hz, 440.0);
        assert_eq!(a4.display_name, "A4 A440");
        assert_eq!(find_by_key("c#4").unwrap().display_name, "C♯4/D♭4");
        assert!(find_by_key("h4").is_none());
    }

    #[test]
    fn unsorted_input_is_sorted_before_banding() {
        let table = build_table(&[(440.0, "A4", "a4"), (220.0, "A3", "a3")]);
        assert_eq!(table[0].key, "a3");
        assert_eq!(table[0].upper_hz, 330.0);
        assert_eq!(table[1].lower_hz, 330.0);
    }
}
