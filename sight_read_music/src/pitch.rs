// Diatonic letters, key signatures, and pitches in ABC register notation.
//
// The generator thinks in letter names, not semitones: a key signature
// supplies the accidentals, so a melody only ever chooses one of seven
// letters and a register. This module provides:
// - Letter names and the diatonic scale built on a tonic letter
// - Triads and extensions for a scale degree
// - Step distance between letters (for stepwise-motion weighting)
// - Pitches (letter + octave) with ABC rendering and MIDI conversion
//
// Used by melody.rs, accompaniment.rs and cadence.rs for pitch choice, by
// score.rs for serialization, and by midi.rs for export.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the seven natural note letters, in C-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Position within `ALL` (C = 0 .. B = 6).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Letter {
        Letter::ALL[index % 7]
    }

    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }

    /// Pitch class of the natural letter (C = 0).
    pub fn natural_pc(self) -> u8 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }
}

/// The seven scale letters starting on `tonic`.
pub fn diatonic_letters(tonic: Letter) -> [Letter; 7] {
    std::array::from_fn(|i| Letter::from_index(tonic.index() + i))
}

/// Letter of a 1-based scale degree. Degrees above 7 wrap, so 9 is the
/// second and 14 the seventh.
pub fn degree_letter(tonic: Letter, degree: u8) -> Letter {
    let offset = (degree as usize + 6) % 7;
    Letter::from_index(tonic.index() + offset)
}

/// Root, third and fifth of the triad on a scale degree.
pub fn triad(degree: u8, tonic: Letter) -> [Letter; 3] {
    [
        degree_letter(tonic, degree),
        degree_letter(tonic, degree + 2),
        degree_letter(tonic, degree + 4),
    ]
}

/// Shortest distance in scale steps between two letters, up or down (0..=3).
pub fn step_distance(from: Letter, to: Letter) -> usize {
    let forward = (to.index() + 7 - from.index()) % 7;
    let backward = (from.index() + 7 - to.index()) % 7;
    forward.min(backward)
}

/// Semitone alteration a key signature applies to a letter.
///
/// Positive accidental counts add sharps in the order F C G D A E B;
/// negative counts add flats in the order B E A D G C F.
pub fn key_alteration(letter: Letter, accidentals: i8) -> i8 {
    const SHARP_ORDER: [Letter; 7] = [
        Letter::F,
        Letter::C,
        Letter::G,
        Letter::D,
        Letter::A,
        Letter::E,
        Letter::B,
    ];
    let count = accidentals.unsigned_abs() as usize;
    if accidentals > 0 {
        if SHARP_ORDER[..count.min(7)].contains(&letter) { 1 } else { 0 }
    } else if accidentals < 0 {
        let flat_order = SHARP_ORDER.iter().rev();
        if flat_order.take(count.min(7)).any(|&l| l == letter) { -1 } else { 0 }
    } else {
        0
    }
}

/// Split a key label such as `"F#m"` or `"Bb"` into its tonic letter and a
/// minor flag. Returns None if the label does not start with a letter.
pub fn parse_key_label(label: &str) -> Option<(Letter, bool)> {
    let tonic = Letter::from_char(label.chars().next()?)?;
    Some((tonic, label.ends_with('m')))
}

/// A notated pitch: a letter in an octave (scientific numbering, C4 = middle C).
///
/// ABC places octave 4 in uppercase (`C`..`B`) and octave 5 in lowercase
/// (`c`..`b`); each `'` raises and each `,` lowers by an octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub letter: Letter,
    pub octave: i8,
}

impl Pitch {
    pub const fn new(letter: Letter, octave: i8) -> Self {
        Pitch { letter, octave }
    }

    /// Diatonic staff position; adjacent letters differ by one.
    pub fn staff_step(self) -> i32 {
        self.octave as i32 * 7 + self.letter.index() as i32
    }

    /// MIDI note number under a key signature.
    pub fn midi(self, accidentals: i8) -> u8 {
        let base = (self.octave as i32 + 1) * 12 + self.letter.natural_pc() as i32;
        (base + key_alteration(self.letter, accidentals) as i32).clamp(0, 127) as u8
    }

    pub fn to_abc(self) -> String {
        let mut out = String::new();
        if self.octave >= 5 {
            out.push(self.letter.as_char().to_ascii_lowercase());
            for _ in 5..self.octave {
                out.push('\'');
            }
        } else {
            out.push(self.letter.as_char());
            for _ in self.octave..4 {
                out.push(',');
            }
        }
        out
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_abc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diatonic_letters_from_d() {
        let letters = diatonic_letters(Letter::D);
        assert_eq!(
            letters,
            [Letter::D, Letter::E, Letter::F, Letter::G, Letter::A, Letter::B, Letter::C]
        );
    }

    #[test]
    fn test_triads_in_c() {
        assert_eq!(triad(1, Letter::C), [Letter::C, Letter::E, Letter::G]);
        assert_eq!(triad(5, Letter::C), [Letter::G, Letter::B, Letter::D]);
        assert_eq!(triad(6, Letter::C), [Letter::A, Letter::C, Letter::E]);
    }

    #[test]
    fn test_degree_letter_wraps_for_extensions() {
        // 7th and 9th above the tonic in G.
        assert_eq!(degree_letter(Letter::G, 7), Letter::F);
        assert_eq!(degree_letter(Letter::G, 9), Letter::A);
    }

    #[test]
    fn test_step_distance_is_symmetric_and_short() {
        assert_eq!(step_distance(Letter::C, Letter::C), 0);
        assert_eq!(step_distance(Letter::C, Letter::D), 1);
        assert_eq!(step_distance(Letter::C, Letter::B), 1);
        assert_eq!(step_distance(Letter::C, Letter::G), 3);
        assert_eq!(step_distance(Letter::G, Letter::C), 3);
    }

    #[test]
    fn test_key_alterations() {
        // D major: F# and C#.
        assert_eq!(key_alteration(Letter::F, 2), 1);
        assert_eq!(key_alteration(Letter::C, 2), 1);
        assert_eq!(key_alteration(Letter::G, 2), 0);
        // Eb major: Bb, Eb, Ab.
        assert_eq!(key_alteration(Letter::A, -3), -1);
        assert_eq!(key_alteration(Letter::D, -3), 0);
        assert_eq!(key_alteration(Letter::C, 0), 0);
    }

    #[test]
    fn test_parse_key_label() {
        assert_eq!(parse_key_label("F#m"), Some((Letter::F, true)));
        assert_eq!(parse_key_label("Bb"), Some((Letter::B, false)));
        assert_eq!(parse_key_label(""), None);
    }

    #[test]
    fn test_abc_rendering() {
        assert_eq!(Pitch::new(Letter::C, 4).to_abc(), "C");
        assert_eq!(Pitch::new(Letter::C, 5).to_abc(), "c");
        assert_eq!(Pitch::new(Letter::D, 6).to_abc(), "d'");
        assert_eq!(Pitch::new(Letter::G, 3).to_abc(), "G,");
        assert_eq!(Pitch::new(Letter::G, 2).to_abc(), "G,,");
    }

    #[test]
    fn test_midi_under_key_signature() {
        assert_eq!(Pitch::new(Letter::C, 4).midi(0), 60);
        assert_eq!(Pitch::new(Letter::F, 4).midi(1), 66); // F# in G major
        assert_eq!(Pitch::new(Letter::B, 3).midi(-1), 58); // Bb in F major
    }
}
