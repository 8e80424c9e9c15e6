//! # Score Model
//!
//! The parsed score the analysis consumes. It is populated by a score-loading
//! collaborator (or by [`crate::document`] for the command line) and is never
//! modified by the analysis.
//!
//! ## Type Hierarchy
//! ```text
//! Score
//!   └── Vec<Part>
//!         ├── id: String
//!         └── Vec<Measure>
//!               ├── attributes: Option<Attributes> (divisions, staves, clefs, time, key)
//!               └── Vec<ScoreNote>
//!                     ├── pitch: Option<Pitch> (None = rest)
//!                     ├── duration (divisions)
//!                     ├── voice, staff
//!                     ├── chord: sounds together with the previous note
//!                     └── note_type, dot
//! ```
//!
//! ## Key Concepts
//!
//! ### Staves
//! Notes of staff 1 (treble) are listed before the notes of staff 2 (bass)
//! inside a measure, as MusicXML lays out a piano part after `<backup>`.
//!
//! ### Chord flag
//! A note with `chord = true` starts together with the note before it and is
//! not counted again in the running duration. The first note of a group is
//! the one that carries the attack.

use crate::pitch::Step;

/// A complete score: ordered parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Part {
    pub id: String,
    pub measures: Vec<Measure>,
}

impl Part {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            measures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measure {
    pub attributes: Option<Attributes>,
    pub notes: Vec<ScoreNote>,
}

impl Measure {
    /// A measure with no attributes block: staves carry over from earlier measures
    pub fn new(notes: Vec<ScoreNote>) -> Self {
        Self {
            attributes: None,
            notes,
        }
    }

    /// A measure opening a piano system (two staves)
    pub fn piano(notes: Vec<ScoreNote>) -> Self {
        Self {
            attributes: Some(Attributes {
                staves: Some(2),
                ..Attributes::default()
            }),
            notes,
        }
    }

    /// Staff count declared by this measure, if it declares one
    pub fn declared_staves(&self) -> Option<u8> {
        self.attributes.as_ref().and_then(|a| a.staves)
    }
}

/// Measure attributes (MusicXML `<attributes>`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub divisions: Option<u32>,
    pub staves: Option<u8>,
    pub clefs: Vec<Clef>,
    pub time: Option<TimeSignature>,
    /// Key signature in fifths: positive = sharps, negative = flats
    pub key: Option<i8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClefSign {
    G,
    F,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clef {
    pub number: u8,
    pub sign: ClefSign,
    pub line: u8,
}

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

/// Written pitch of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pitch {
    pub step: Step,
    pub octave: i8,
    pub alter: i8,
}

impl Pitch {
    pub fn new(step: Step, octave: i8) -> Self {
        Self {
            step,
            octave,
            alter: 0,
        }
    }

    /// Parse a pitch like `"C4"`, `"F#3"` or `"Bb2"`.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let step = Step::from_char(chars.next()?)?;

        let rest = chars.as_str();
        let (alter, octave) = if let Some(octave) = rest.strip_prefix(|c: char| c == '#' || c == '♯') {
            (1, octave)
        } else if let Some(octave) = rest.strip_prefix(|c: char| c == 'b' || c == '♭') {
            (-1, octave)
        } else {
            (0, rest)
        };

        let octave = octave.parse::<i8>().ok()?;
        Some(Self {
            step,
            octave,
            alter,
        })
    }
}

/// A note or rest as written in the score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreNote {
    /// `None` for a rest
    pub pitch: Option<Pitch>,
    /// Length in divisions
    pub duration: u32,
    pub voice: u8,
    pub staff: u8,
    /// Sounds together with the previous note
    pub chord: bool,
    /// MusicXML rhythmic type ("quarter", "eighth", ...)
    pub note_type: Option<String>,
    pub dot: bool,
}

impl ScoreNote {
    pub fn new(pitch: Pitch, duration: u32, staff: u8) -> Self {
        Self {
            pitch: Some(pitch),
            duration,
            voice: if staff == 2 { 5 } else { 1 },
            staff,
            chord: false,
            note_type: None,
            dot: false,
        }
    }

    pub fn rest(duration: u32, staff: u8) -> Self {
        Self {
            pitch: None,
            ..Self::new(Pitch::new(Step::C, 4), duration, staff)
        }
    }

    /// Mark the note as sounding together with the previous one
    pub fn in_chord(mut self) -> Self {
        self.chord = true;
        self
    }

    pub fn with_voice(mut self, voice: u8) -> Self {
        self.voice = voice;
        self
    }

    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_from_str() {
        assert_eq!(Pitch::from_str("C4"), Some(Pitch::new(Step::C, 4)));
        assert_eq!(
            Pitch::from_str("F#3"),
            Some(Pitch { step: Step::F, octave: 3, alter: 1 })
        );
        assert_eq!(
            Pitch::from_str("Bb2"),
            Some(Pitch { step: Step::B, octave: 2, alter: -1 })
        );
        assert_eq!(
            Pitch::from_str("E♭5"),
            Some(Pitch { step: Step::E, octave: 5, alter: -1 })
        );
        assert_eq!(Pitch::from_str("H4"), None);
        assert_eq!(Pitch::from_str("C"), None);
        assert_eq!(Pitch::from_str(""), None);
    }

    #[test]
    fn test_note_builders() {
        let note = ScoreNote::new(Pitch::new(Step::G, 2), 4, 2).in_chord();
        assert!(note.chord);
        assert_eq!(note.voice, 5);
        assert!(!note.is_rest());
        assert!(ScoreNote::rest(4, 1).is_rest());
    }

    #[test]
    fn test_declared_staves() {
        assert_eq!(Measure::piano(vec![]).declared_staves(), Some(2));
        assert_eq!(Measure::new(vec![]).declared_staves(), None);
    }
}
