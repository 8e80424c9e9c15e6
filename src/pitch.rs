//! # Pitch and Interval Utilities
//!
//! Letter-class arithmetic over the fixed cyclic alphabet `C D E F G A B`.
//!
//! Alterations are carried on [`Note`] but never take part in interval math:
//! only the letter identity matters for chord classification. The semitone
//! distance between two letters is therefore the distance in the natural
//! (white-key) scale, where the half steps sit at `E-F` and `B-C`.
//!
//! ## Example
//! ```rust
//! use harmony::pitch::{diatonic_interval, semitone_distance, Step};
//!
//! assert_eq!(diatonic_interval(Step::C, Step::E), 3); // a third
//! assert_eq!(semitone_distance(Step::C, Step::E), 4); // major third
//! assert_eq!(semitone_distance(Step::E, Step::G), 3); // minor third
//! assert_eq!(diatonic_interval(Step::B, Step::D), 3); // wraps around the octave
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter classes C through B
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Step {
    #[default]
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

/// The natural alphabet in ascending order.
pub const ALPHABET: [Step; 7] = [
    Step::C,
    Step::D,
    Step::E,
    Step::F,
    Step::G,
    Step::A,
    Step::B,
];

impl Step {
    /// Zero-based position in the natural alphabet
    pub fn index(self) -> usize {
        self as usize
    }

    /// The letter one position up, wrapping from B to C
    pub fn next(self) -> Step {
        ALPHABET[(self.index() + 1) % ALPHABET.len()]
    }

    pub fn from_char(c: char) -> Option<Step> {
        match c {
            'C' => Some(Step::C),
            'D' => Some(Step::D),
            'E' => Some(Step::E),
            'F' => Some(Step::F),
            'G' => Some(Step::G),
            'A' => Some(Step::A),
            'B' => Some(Step::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::C => "C",
            Step::D => "D",
            Step::E => "E",
            Step::F => "F",
            Step::G => "G",
            Step::A => "A",
            Step::B => "B",
        }
    }

    /// Semitones above C in the natural scale
    fn semitones_above_c(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed 1..=7 ordinal of a letter, used as a tie-break while stacking thirds.
pub fn step_rank(step: Step) -> u8 {
    step.index() as u8 + 1
}

/// Diatonic interval from `from` up to `to`, counted inclusively.
///
/// Unison is 1, adjacent letters are 2, and so on up to 7.
pub fn diatonic_interval(from: Step, to: Step) -> u8 {
    let distance = (to.index() + ALPHABET.len() - from.index()) % ALPHABET.len();
    distance as u8 + 1
}

/// Semitones walked from `from` up to `to` through the natural scale.
///
/// Landing on `C` or `F` costs one semitone, any other letter two.
pub fn semitone_distance(from: Step, to: Step) -> u8 {
    if from == to {
        return 0;
    }

    let mut semitones = 0;
    let mut step = from;
    loop {
        step = step.next();
        semitones += match step {
            Step::C | Step::F => 1,
            _ => 2,
        };
        if step == to {
            return semitones;
        }
    }
}

/// Diatonic intervals between consecutive letters.
///
/// A single letter yields `[1]`: one pitch class, nothing to stack.
pub fn intervals(steps: &[Step]) -> Vec<u8> {
    match steps {
        [_] => vec![1],
        _ => steps
            .windows(2)
            .map(|pair| diatonic_interval(pair[0], pair[1]))
            .collect(),
    }
}

/// Semitone distances between consecutive letters.
///
/// A single letter yields `[0]`.
pub fn semitones(steps: &[Step]) -> Vec<u8> {
    match steps {
        [_] => vec![0],
        _ => steps
            .windows(2)
            .map(|pair| semitone_distance(pair[0], pair[1]))
            .collect(),
    }
}

/// A sounding note, positioned inside its measure.
///
/// `point` is the offset in divisions from the start of the measure at which
/// the note's attack sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub step: Step,
    pub octave: i8,
    pub alter: i8,
    pub measure_number: usize,
    pub point: u32,
}

impl Note {
    /// MIDI note number (C4 = 60), alteration included
    pub fn midi_number(&self) -> u8 {
        let midi = (self.octave as i32 + 1) * 12 + self.step.semitones_above_c() + self.alter as i32;
        midi.clamp(0, 127) as u8
    }

    /// True when both notes sound the same written pitch, wherever they sit in time.
    pub fn same_pitch(&self, other: &Note) -> bool {
        self.step == other.step && self.octave == other.octave && self.alter == other.alter
    }

    /// Ordering key from the lowest to the highest written pitch
    pub(crate) fn height(&self) -> (i8, usize, i8) {
        (self.octave, self.step.index(), self.alter)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alter = match self.alter {
            -1 => "♭",
            1 => "♯",
            _ => "",
        };
        write!(f, "{}{}{}", self.step, alter, self.octave)
    }
}
