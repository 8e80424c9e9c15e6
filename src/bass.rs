//! Bass resolution
//!
//! Gives every chord a bass once runs are built. A run whose subchords agree
//! on one bass takes it. When the bass moves inside a run, the run is checked
//! for a foreign bass: a subchord whose letters, without its bass, still name
//! a complete chord. Such a bass is a passing tone below the harmony and the
//! run is split back into one chord per subchord (or kept with no bass, see
//! [`ForeignBass`]). Any other moving bass leaves the chord without a bass.

use crate::analysis::{Chord, Subchord};
use crate::classify::{classify, letter_set, ChordName};
use crate::options::{AnalysisOptions, ForeignBass};
use crate::pitch::Step;
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BassResolution {
    /// Every subchord has this bass
    Stable(Option<Step>),
    /// A subchord's bass is foreign to the chord above it
    Foreign,
    /// The bass moves through chord tones
    Absent,
}

/// A bass foreign to its subchord: the remaining letters name a chord on their own.
fn has_foreign_bass(subchord: &Subchord) -> bool {
    let bass = match subchord.bass_note {
        Some(bass) => bass,
        None => return false,
    };
    let above = letter_set(
        subchord
            .notes
            .iter()
            .map(|note| note.step)
            .filter(|step| *step != bass),
    );
    above.len() >= 3 && classify(&above, None).name.is_resolved()
}

pub(crate) fn resolution(chord: &Chord, subchords: &[Subchord]) -> BassResolution {
    let members: Vec<&Subchord> = chord
        .subchords
        .iter()
        .filter_map(|&index| subchords.get(index))
        .collect();
    let first_bass = members.first().and_then(|subchord| subchord.bass_note);

    if members.iter().all(|subchord| subchord.bass_note == first_bass) {
        return BassResolution::Stable(first_bass);
    }
    if chord.name != ChordName::Unknown && members.iter().any(|subchord| has_foreign_bass(subchord)) {
        return BassResolution::Foreign;
    }
    BassResolution::Absent
}

/// Resolve the bass of every chord, splitting chords over a foreign bass.
///
/// Splitting clears the repetition mark of the subchords involved, since each
/// one now starts its own chord.
pub(crate) fn resolve_bass(
    chords: Vec<Chord>,
    subchords: &mut [Subchord],
    options: &AnalysisOptions,
) -> Vec<Chord> {
    let mut resolved = Vec::with_capacity(chords.len());

    for mut chord in chords {
        match resolution(&chord, subchords) {
            BassResolution::Stable(bass) => {
                chord.bass_note = bass;
                resolved.push(chord);
            }
            BassResolution::Foreign => match options.foreign_bass {
                ForeignBass::Split => {
                    warn!(
                        "measure {}: foreign bass under {}, splitting {} subchords",
                        chord.measure_number,
                        chord.name,
                        chord.subchords.len()
                    );
                    for index in chord.subchords {
                        if let Some(subchord) = subchords.get_mut(index) {
                            subchord.is_repeated = false;
                            resolved.push(Chord::from_subchord(index, subchord));
                        }
                    }
                }
                ForeignBass::Keep => {
                    warn!(
                        "measure {}: foreign bass under {}, keeping the chord without a bass",
                        chord.measure_number, chord.name
                    );
                    chord.bass_note = None;
                    resolved.push(chord);
                }
            },
            BassResolution::Absent => {
                chord.bass_note = None;
                resolved.push(chord);
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::pitch::Note;
    use Step::*;

    /// A subchord of the given letters over `bass`, classified as extraction would
    fn subchord(point: u32, bass: Step, letters: &[Step], previous: Option<&Subchord>) -> Subchord {
        let mut steps = vec![bass];
        steps.extend_from_slice(letters);
        let classification = classify(&steps, Some(bass));
        let notes = steps
            .iter()
            .enumerate()
            .map(|(i, &step)| Note {
                step,
                octave: if i == 0 { 2 } else { 4 },
                alter: 0,
                measure_number: 1,
                point,
            })
            .collect();
        Subchord {
            part: 0,
            measure_number: 1,
            point,
            notes,
            root_note: classification.root(),
            is_repeated: previous.map_or(false, |p| p.name == classification.name),
            name: classification.name,
            steps: classification.stacked,
            bass_note: Some(bass),
            chord: None,
        }
    }

    fn c_then_c_over_f() -> Vec<Subchord> {
        let first = subchord(0, C, &[E, G], None);
        let second = subchord(2, F, &[C, E, G], Some(&first));
        vec![first, second]
    }

    #[test]
    fn test_foreign_bass_splits_the_run() {
        let mut subchords = c_then_c_over_f();
        assert_eq!(subchords[1].name.to_string(), "C");
        assert!(subchords[1].is_repeated);

        let options = AnalysisOptions::default();
        let runs = aggregate(&subchords, &options);
        assert_eq!(runs.len(), 1);

        let chords = resolve_bass(runs, &mut subchords, &options);
        assert_eq!(chords.len(), 2);
        assert_eq!(chords[0].subchords, vec![0]);
        assert_eq!(chords[1].subchords, vec![1]);
        assert_eq!(chords[0].bass_note, Some(C));
        assert_eq!(chords[1].bass_note, Some(F));
        assert_eq!(chords[1].label(), "C/F");
        assert!(!subchords[1].is_repeated);
    }

    #[test]
    fn test_foreign_bass_kept() {
        let mut subchords = c_then_c_over_f();
        let options = AnalysisOptions {
            foreign_bass: ForeignBass::Keep,
            ..AnalysisOptions::default()
        };
        let runs = aggregate(&subchords, &options);
        let chords = resolve_bass(runs, &mut subchords, &options);

        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].bass_note, None);
        assert_eq!(chords[0].label(), "C");
        assert!(subchords[1].is_repeated);
    }

    #[test]
    fn test_shared_bass() {
        let first = subchord(0, C, &[E, G], None);
        let second = subchord(2, C, &[G, E], Some(&first));
        let mut subchords = vec![first, second];
        let options = AnalysisOptions::default();
        let chords = resolve_bass(aggregate(&subchords, &options), &mut subchords, &options);

        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].bass_note, Some(C));
    }

    #[test]
    fn test_bass_moving_through_chord_tones() {
        // C major with the bass walking C to E
        let first = subchord(0, C, &[E, G], None);
        let second = subchord(2, E, &[G, C], Some(&first));
        let mut subchords = vec![first, second];
        let options = AnalysisOptions::default();
        let runs = aggregate(&subchords, &options);
        assert_eq!(resolution(&runs[0], &subchords), BassResolution::Absent);

        let chords = resolve_bass(runs, &mut subchords, &options);
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].bass_note, None);
    }

    #[test]
    fn test_single_subchord_keeps_its_bass() {
        let mut subchords = vec![subchord(0, E, &[G, C], None)];
        let options = AnalysisOptions::default();
        let chords = resolve_bass(aggregate(&subchords, &options), &mut subchords, &options);
        assert_eq!(chords[0].bass_note, Some(E));
        assert_eq!(chords[0].label(), "C/E");
    }
}
