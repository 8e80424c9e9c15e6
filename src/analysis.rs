//! Analysis result types
//!
//! The analysis is an arena: [`Analysis::subchords`] and [`Analysis::chords`]
//! are plain vectors and every cross reference between them is an index into
//! the other vector.

use crate::classify::ChordName;
use crate::pitch::{Note, Step};
use serde::Serialize;

/// All notes sounding at one rhythmic attack of either staff.
///
/// # Fields
/// - `part`: index into [`Analysis::parts`]
/// - `measure_number`: 1-based bar number inside the part
/// - `point`: onset in divisions from the start of the measure
/// - `notes`: bass staff notes first, then treble staff notes
/// - `steps`: letters of the classification, stacked in thirds
/// - `is_repeated`: same name as the previous subchord of the same measure
/// - `chord`: index of the owning chord in [`Analysis::chords`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subchord {
    pub part: usize,
    pub measure_number: usize,
    pub point: u32,
    pub notes: Vec<Note>,
    pub name: ChordName,
    pub steps: Vec<Step>,
    pub root_note: Option<Step>,
    pub bass_note: Option<Step>,
    pub is_repeated: bool,
    pub chord: Option<usize>,
}

impl Subchord {
    /// Text shown above the subchord.
    ///
    /// A repeated subchord shows `‥`. A resolved chord whose bass is not its
    /// root gets a slash bass (`C/E`).
    pub fn label(&self) -> String {
        let mut label = if self.is_repeated {
            "\u{2025}".to_string()
        } else {
            self.name.to_string()
        };
        if let Some(bass) = slash_bass(&self.name, self.root_note, self.bass_note) {
            label.push('/');
            label.push_str(bass.as_str());
        }
        label
    }
}

/// A maximal run of subchords sharing one harmonic identity inside a measure.
///
/// `start_point` and `end_point` are the points of the first and the last
/// subchord of the run. `bass_note` is `None` when the run has no stable bass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub part: usize,
    pub measure_number: usize,
    pub name: ChordName,
    pub start_point: u32,
    pub end_point: u32,
    pub steps: Vec<Step>,
    /// Distinct pitches sounding across the run, in order of appearance
    pub notes: Vec<Note>,
    pub subchords: Vec<usize>,
    pub bass_note: Option<Step>,
    pub root_note: Option<Step>,
}

impl Chord {
    /// A chord made of a single subchord, which it copies.
    pub fn from_subchord(index: usize, subchord: &Subchord) -> Self {
        Self {
            part: subchord.part,
            measure_number: subchord.measure_number,
            name: subchord.name.clone(),
            start_point: subchord.point,
            end_point: subchord.point,
            steps: subchord.steps.clone(),
            notes: Vec::new(),
            subchords: vec![index],
            bass_note: subchord.bass_note,
            root_note: subchord.root_note,
        }
    }

    /// Chord symbol with its slash bass, e.g. `G7/B`
    pub fn label(&self) -> String {
        let mut label = self.name.to_string();
        if let Some(bass) = slash_bass(&self.name, self.root_note, self.bass_note) {
            label.push('/');
            label.push_str(bass.as_str());
        }
        label
    }
}

fn slash_bass(name: &ChordName, root: Option<Step>, bass: Option<Step>) -> Option<Step> {
    match bass {
        Some(bass) if name.is_resolved() && Some(bass) != root => Some(bass),
        _ => None,
    }
}

/// Result of analysing one score
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Part ids, in score order
    pub parts: Vec<String>,
    pub subchords: Vec<Subchord>,
    pub chords: Vec<Chord>,
}

impl Analysis {
    /// The chord a subchord was merged into
    pub fn chord_of(&self, subchord: usize) -> Option<&Chord> {
        self.subchords
            .get(subchord)
            .and_then(|s| s.chord)
            .and_then(|c| self.chords.get(c))
    }

    /// Subchords of a chord, in time order
    pub fn subchords_of<'a>(&'a self, chord: &'a Chord) -> impl Iterator<Item = &'a Subchord> + 'a {
        chord.subchords.iter().filter_map(move |&i| self.subchords.get(i))
    }

    /// Chords of one measure (`measure_number` is 1-based)
    pub fn chords_in_measure(&self, part: usize, measure_number: usize) -> impl Iterator<Item = &Chord> + '_ {
        self.chords
            .iter()
            .filter(move |c| c.part == part && c.measure_number == measure_number)
    }

    /// Subchords of one measure (`measure_number` is 1-based)
    pub fn subchords_in_measure(&self, part: usize, measure_number: usize) -> impl Iterator<Item = &Subchord> + '_ {
        self.subchords
            .iter()
            .filter(move |s| s.part == part && s.measure_number == measure_number)
    }

    /// Set the subchord → chord back references and collect each chord's notes.
    pub(crate) fn link(&mut self) {
        for (index, chord) in self.chords.iter_mut().enumerate() {
            let mut notes: Vec<Note> = Vec::new();
            for &member in &chord.subchords {
                if let Some(subchord) = self.subchords.get_mut(member) {
                    subchord.chord = Some(index);
                    for note in &subchord.notes {
                        if !notes.iter().any(|n| n.same_pitch(note)) {
                            notes.push(*note);
                        }
                    }
                }
            }
            chord.notes = notes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Quality;

    fn subchord(name: ChordName, root: Step, bass: Step) -> Subchord {
        Subchord {
            part: 0,
            measure_number: 1,
            point: 0,
            notes: Vec::new(),
            name,
            steps: Vec::new(),
            root_note: Some(root),
            bass_note: Some(bass),
            is_repeated: false,
            chord: None,
        }
    }

    #[test]
    fn test_subchord_labels() {
        let c_major = ChordName::Chord { root: Step::C, quality: Quality::Major };

        assert_eq!(subchord(c_major.clone(), Step::C, Step::C).label(), "C");
        assert_eq!(subchord(c_major.clone(), Step::C, Step::E).label(), "C/E");

        let mut repeated = subchord(c_major, Step::C, Step::C);
        repeated.is_repeated = true;
        assert_eq!(repeated.label(), "‥");

        // interval clusters never get a slash bass
        assert_eq!(subchord(ChordName::Interval(vec![5]), Step::F, Step::C).label(), "(5)");
    }

    #[test]
    fn test_chord_label_without_bass() {
        let g7 = ChordName::Chord { root: Step::G, quality: Quality::Dominant7 };
        let mut chord = Chord::from_subchord(0, &subchord(g7, Step::G, Step::B));
        assert_eq!(chord.label(), "G7/B");

        chord.bass_note = None;
        assert_eq!(chord.label(), "G7");

        chord.name = ChordName::Unknown;
        chord.bass_note = Some(Step::C);
        chord.root_note = None;
        assert_eq!(chord.label(), "?");
    }
}
