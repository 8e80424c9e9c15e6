//! # Score Documents
//!
//! A small YAML format for writing piano scores by hand, used by the
//! `harmony` binary and the tests. It fills the same [`Score`] a MusicXML
//! loader would.
//!
//! ```yaml
//! analysis:
//!   unresolved: tail
//! parts:
//!   - id: P1
//!     measures:
//!       - staves: 2
//!         divisions: 1
//!         time: 4/4
//!         clefs: [G2, F4]
//!         notes:
//!           - { pitch: E5, duration: 2 }
//!           - { pitch: G5, duration: 2 }
//!           - { pitch: C3 G3, duration: 4, staff: 2 }
//! ```
//!
//! ## Notes
//! - `pitch`: step, optional `#` or `b`, octave. Several space-separated
//!   pitches form one attack. `null`, `r` or `rest` is a rest.
//! - `duration`: length in divisions
//! - `staff`: 1 (treble, default) or 2 (bass)
//! - `voice`: defaults to the staff number
//! - `chord`: sounds together with the previous note
//! - `type`, `dot`: written rhythm, informational only

use crate::error::AnalysisError;
use crate::model::{Attributes, Clef, ClefSign, Measure, Part, Pitch, Score, ScoreNote, TimeSignature};
use crate::options::{AnalysisOptions, RawOptions};
use serde::Deserialize;

/// A score with the options it asks to be analysed with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub score: Score,
    pub options: AnalysisOptions,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    analysis: Option<RawOptions>,
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawPart {
    id: Option<String>,
    #[serde(default)]
    measures: Vec<RawMeasure>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawMeasure {
    staves: Option<u8>,
    divisions: Option<u32>,
    time: Option<String>,
    key: Option<i8>,
    #[serde(default)]
    clefs: Vec<String>,
    #[serde(default)]
    notes: Vec<RawNote>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawNote {
    pitch: Option<String>,
    duration: u32,
    staff: Option<u8>,
    voice: Option<u8>,
    #[serde(default)]
    chord: bool,
    #[serde(rename = "type")]
    note_type: Option<String>,
    #[serde(default)]
    dot: bool,
}

/// Parse a YAML score document.
///
/// ```rust
/// use harmony::document::parse_document;
///
/// let document = parse_document(
///     "parts:\n  - measures:\n      - staves: 2\n        notes:\n          - { pitch: C5 E5 G5, duration: 4 }\n          - { pitch: C3, duration: 4, staff: 2 }\n",
/// ).unwrap();
/// let measure = &document.score.parts[0].measures[0];
/// assert_eq!(measure.notes.len(), 4);
/// assert!(measure.notes[1].chord);
/// ```
pub fn parse_document(content: &str) -> Result<Document, AnalysisError> {
    let raw: RawDocument =
        serde_yaml::from_str(content).map_err(|e| AnalysisError::DocumentError(e.to_string()))?;

    let options = match &raw.analysis {
        Some(analysis) => AnalysisOptions::from_raw(analysis)?,
        None => AnalysisOptions::default(),
    };

    let mut score = Score::default();
    for (index, raw_part) in raw.parts.iter().enumerate() {
        let mut part = Part::new(
            raw_part
                .id
                .clone()
                .unwrap_or_else(|| format!("P{}", index + 1)),
        );
        for (number, raw_measure) in raw_part.measures.iter().enumerate() {
            let measure = convert_measure(raw_measure).map_err(|message| {
                AnalysisError::DocumentError(format!(
                    "part {}, measure {}: {}",
                    part.id,
                    number + 1,
                    message
                ))
            })?;
            part.measures.push(measure);
        }
        score.parts.push(part);
    }

    Ok(Document { score, options })
}

fn convert_measure(raw: &RawMeasure) -> Result<Measure, String> {
    let has_attributes = raw.staves.is_some()
        || raw.divisions.is_some()
        || raw.time.is_some()
        || raw.key.is_some()
        || !raw.clefs.is_empty();

    let attributes = if has_attributes {
        let time = match &raw.time {
            Some(time) => Some(parse_time(time).ok_or_else(|| format!("invalid time signature: {}", time))?),
            None => None,
        };
        let clefs = raw
            .clefs
            .iter()
            .enumerate()
            .map(|(i, clef)| parse_clef(i as u8 + 1, clef).ok_or_else(|| format!("invalid clef: {}", clef)))
            .collect::<Result<Vec<_>, _>>()?;
        Some(Attributes {
            divisions: raw.divisions,
            staves: raw.staves,
            clefs,
            time,
            key: raw.key,
        })
    } else {
        None
    };

    let mut notes = Vec::new();
    for raw_note in &raw.notes {
        convert_note(raw_note, &mut notes)?;
    }

    Ok(Measure { attributes, notes })
}

/// Expand one raw note into score notes: one per pitch, the later ones in chord.
fn convert_note(raw: &RawNote, out: &mut Vec<ScoreNote>) -> Result<(), String> {
    let staff = raw.staff.unwrap_or(1);
    let template = ScoreNote {
        pitch: None,
        duration: raw.duration,
        voice: raw.voice.unwrap_or(staff),
        staff,
        chord: raw.chord,
        note_type: raw.note_type.clone(),
        dot: raw.dot,
    };

    let pitches = raw.pitch.as_deref().unwrap_or("rest").trim();
    if pitches.is_empty() || pitches == "r" || pitches == "rest" {
        out.push(template);
        return Ok(());
    }

    for (i, text) in pitches.split_whitespace().enumerate() {
        let pitch = Pitch::from_str(text).ok_or_else(|| format!("invalid pitch: {}", text))?;
        out.push(ScoreNote {
            pitch: Some(pitch),
            chord: template.chord || i > 0,
            ..template.clone()
        });
    }
    Ok(())
}

/// Parse `"3/4"`
fn parse_time(s: &str) -> Option<TimeSignature> {
    let (beats, beat_type) = s.trim().split_once('/')?;
    Some(TimeSignature {
        beats: beats.trim().parse().ok()?,
        beat_type: beat_type.trim().parse().ok()?,
    })
}

/// Parse `"G2"` or `"F4"` (sign, staff line)
fn parse_clef(number: u8, s: &str) -> Option<Clef> {
    let mut chars = s.trim().chars();
    let sign = match chars.next()? {
        'G' => ClefSign::G,
        'F' => ClefSign::F,
        'C' => ClefSign::C,
        _ => return None,
    };
    let line = chars.as_str().parse().ok()?;
    Some(Clef { number, sign, line })
}
