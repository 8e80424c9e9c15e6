//! # Subchord Extraction
//!
//! Turns the two staves of every measure into a time-ordered list of
//! subchords: one subchord per onset in either staff.
//!
//! ## Preconditions
//! The analysis only reads piano writing in its simplest form:
//! - exactly two staves (treble = staff 1, bass = staff 2)
//! - one voice per staff
//! - no rests
//! - both staves adding up to the same length
//!
//! Any other shape is a structural error and the whole analysis stops.
//!
//! ## Synchronization
//! Each staff is read as a lazy sequence of attacks: a note that starts an
//! attack followed by the notes flagged `chord`. The synchronizer keeps the
//! attack currently sounding on each staff and a clock. At every step it emits
//! the pair sounding at the clock, then moves the clock to the earliest end of
//! the two attacks and advances only the staff (or staves) whose attack ends
//! there. A long bass note under moving treble notes is thus re-read for each
//! treble attack without moving any index backwards.
//!
//! ```text
//! treble  | E5 ---- | F5 | G5 |
//! bass    | C3 ------------- |
//! clock     0         2    3
//! emits     C3+E5     C3+F5  C3+G5
//! ```

use crate::analysis::Subchord;
use crate::classify::{classify, ChordName};
use crate::error::AnalysisError;
use crate::model::{Measure, Part, ScoreNote};
use crate::options::AnalysisOptions;
use crate::pitch::{Note, Step};
use log::debug;
use std::iter::Peekable;

const TREBLE: u8 = 1;
const BASS: u8 = 2;

/// One sounding attack of a staff
#[derive(Debug, Clone)]
struct Attack<'a> {
    onset: u32,
    duration: u32,
    notes: Vec<&'a ScoreNote>,
}

impl Attack<'_> {
    fn end(&self) -> u32 {
        self.onset + self.duration
    }
}

/// Groups a staff's notes into attacks, lazily
struct Attacks<I: Iterator> {
    notes: Peekable<I>,
    clock: u32,
}

impl<I: Iterator> Attacks<I> {
    fn new(notes: I) -> Self {
        Self {
            notes: notes.peekable(),
            clock: 0,
        }
    }
}

impl<'a, I: Iterator<Item = &'a ScoreNote>> Iterator for Attacks<I> {
    type Item = Attack<'a>;

    fn next(&mut self) -> Option<Attack<'a>> {
        let first = self.notes.next()?;
        let mut notes = vec![first];
        while let Some(note) = self.notes.next_if(|note| note.chord) {
            notes.push(note);
        }

        let attack = Attack {
            onset: self.clock,
            duration: first.duration,
            notes,
        };
        self.clock += first.duration;
        Some(attack)
    }
}

/// The attacks of both staves sounding at one onset
#[derive(Debug, Clone)]
struct Onset<'a> {
    point: u32,
    treble: Attack<'a>,
    bass: Attack<'a>,
}

/// Merges the attacks of two staves on a common duration clock.
struct Synchronizer<'a, T, B>
where
    T: Iterator<Item = &'a ScoreNote>,
    B: Iterator<Item = &'a ScoreNote>,
{
    treble: Attacks<T>,
    bass: Attacks<B>,
    sounding_treble: Option<Attack<'a>>,
    sounding_bass: Option<Attack<'a>>,
    clock: u32,
    measure_duration: u32,
}

impl<'a, T, B> Synchronizer<'a, T, B>
where
    T: Iterator<Item = &'a ScoreNote>,
    B: Iterator<Item = &'a ScoreNote>,
{
    fn new(treble: T, bass: B, measure_duration: u32) -> Self {
        let mut treble = Attacks::new(treble);
        let mut bass = Attacks::new(bass);
        let sounding_treble = treble.next();
        let sounding_bass = bass.next();
        Self {
            treble,
            bass,
            sounding_treble,
            sounding_bass,
            clock: 0,
            measure_duration,
        }
    }
}

impl<'a, T, B> Iterator for Synchronizer<'a, T, B>
where
    T: Iterator<Item = &'a ScoreNote>,
    B: Iterator<Item = &'a ScoreNote>,
{
    type Item = Result<Onset<'a>, String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.clock >= self.measure_duration {
            return None;
        }

        let (treble, bass) = match (&self.sounding_treble, &self.sounding_bass) {
            (Some(treble), Some(bass)) => (treble, bass),
            (None, _) => return Some(Err("treble staff ends before the measure does".to_string())),
            (_, None) => return Some(Err("bass staff ends before the measure does".to_string())),
        };

        let (treble_end, bass_end) = (treble.end(), bass.end());
        let onset = Onset {
            point: self.clock,
            treble: treble.clone(),
            bass: bass.clone(),
        };

        let next = treble_end.min(bass_end);
        if next <= self.clock {
            return Some(Err(format!("attack at {} has no duration", self.clock)));
        }
        if treble_end == next {
            self.sounding_treble = self.treble.next();
        }
        if bass_end == next {
            self.sounding_bass = self.bass.next();
        }
        self.clock = next;

        Some(Ok(onset))
    }
}

/// Context of the measure being read, for error reporting
struct MeasureContext<'a> {
    part: &'a str,
    number: usize,
}

impl MeasureContext<'_> {
    fn malformed(&self, message: impl Into<String>) -> AnalysisError {
        AnalysisError::MalformedMeasure {
            part: self.part.to_string(),
            measure: self.number,
            message: message.into(),
        }
    }
}

/// Extract the subchords of every measure of a part, appending them to `out`.
pub(crate) fn extract_part(
    part_index: usize,
    part: &Part,
    options: &AnalysisOptions,
    out: &mut Vec<Subchord>,
) -> Result<(), AnalysisError> {
    for (index, measure) in part.measures.iter().enumerate() {
        let context = MeasureContext {
            part: &part.id,
            number: index + 1,
        };
        let before = out.len();
        extract_measure(part_index, measure, &context, options, out)?;
        debug!(
            "part {} measure {}: {} subchords",
            part.id,
            context.number,
            out.len() - before
        );
    }
    Ok(())
}

fn extract_measure(
    part_index: usize,
    measure: &Measure,
    context: &MeasureContext<'_>,
    options: &AnalysisOptions,
    out: &mut Vec<Subchord>,
) -> Result<(), AnalysisError> {
    let measure_duration = validate_measure(measure, context)?;

    let staff = |number: u8| measure.notes.iter().filter(move |note| note.staff == number);
    let synchronizer = Synchronizer::new(staff(TREBLE), staff(BASS), measure_duration);

    for onset in synchronizer {
        let onset = onset.map_err(|message| context.malformed(message))?;
        let subchord = build_subchord(part_index, context.number, &onset);
        let is_repeated = options.repeat_marks
            && out.last().map_or(false, |previous| {
                previous.part == subchord.part
                    && previous.measure_number == subchord.measure_number
                    && previous.name == subchord.name
            });
        out.push(Subchord {
            is_repeated,
            ..subchord
        });
    }

    Ok(())
}

/// Check the structural preconditions and return the measure duration.
///
/// The measure duration is the sum of the treble attacks. Once it fits in a
/// `u32`, every onset and attack end the synchronizer computes does too.
fn validate_measure(measure: &Measure, context: &MeasureContext<'_>) -> Result<u32, AnalysisError> {
    if let Some(staves) = measure.declared_staves() {
        if staves != 2 {
            return Err(AnalysisError::StaffCount {
                part: context.part.to_string(),
                measure: context.number,
                found: staves,
            });
        }
    }

    if measure.notes.iter().any(ScoreNote::is_rest) {
        return Err(AnalysisError::UnsupportedRest {
            part: context.part.to_string(),
            measure: context.number,
        });
    }

    if let Some(note) = measure.notes.iter().find(|n| n.staff != TREBLE && n.staff != BASS) {
        return Err(context.malformed(format!("note on unknown staff {}", note.staff)));
    }

    let mut durations = [0u32; 2];
    for (slot, staff) in [TREBLE, BASS].into_iter().enumerate() {
        let mut notes = measure.notes.iter().filter(|n| n.staff == staff).peekable();
        let name = if staff == TREBLE { "treble" } else { "bass" };
        let voice = match notes.peek() {
            Some(first) if first.chord => {
                return Err(context.malformed(format!("{} staff starts inside a chord", name)));
            }
            Some(first) => first.voice,
            None => return Err(context.malformed(format!("{} staff is empty", name))),
        };

        for note in notes {
            if note.voice != voice {
                return Err(AnalysisError::MultipleVoices {
                    part: context.part.to_string(),
                    measure: context.number,
                    staff,
                });
            }
            if !note.chord {
                if note.duration == 0 {
                    return Err(context.malformed("note without duration"));
                }
                durations[slot] = durations[slot]
                    .checked_add(note.duration)
                    .ok_or_else(|| context.malformed(format!("{} staff too long", name)))?;
            }
        }
    }

    let [treble, bass] = durations;
    if treble != bass {
        return Err(context.malformed(format!(
            "staves of unequal length (treble {}, bass {})",
            treble, bass
        )));
    }

    Ok(treble)
}

fn build_subchord(part: usize, measure_number: usize, onset: &Onset<'_>) -> Subchord {
    let to_note = |attack: &Attack<'_>, note: &ScoreNote| {
        note.pitch.map(|pitch| Note {
            step: pitch.step,
            octave: pitch.octave,
            alter: pitch.alter,
            measure_number,
            point: attack.onset,
        })
    };

    let bass_notes: Vec<Note> = onset
        .bass
        .notes
        .iter()
        .filter_map(|note| to_note(&onset.bass, note))
        .collect();
    let bass_note = bass_notes.iter().min_by_key(|note| note.height()).map(|note| note.step);

    let mut notes = bass_notes;
    notes.extend(
        onset
            .treble
            .notes
            .iter()
            .filter_map(|note| to_note(&onset.treble, note)),
    );

    let steps: Vec<Step> = notes.iter().map(|note| note.step).collect();
    let classification = classify(&steps, bass_note);

    let root_note = match classification.name {
        ChordName::Unknown => None,
        _ => classification.root(),
    };

    Subchord {
        part,
        measure_number,
        point: onset.point,
        notes,
        root_note,
        name: classification.name,
        steps: classification.stacked,
        bass_note,
        is_repeated: false,
        chord: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pitch;
    use Step::*;

    fn treble(step: Step, duration: u32) -> ScoreNote {
        ScoreNote::new(Pitch::new(step, 5), duration, 1)
    }

    fn bass(step: Step, duration: u32) -> ScoreNote {
        ScoreNote::new(Pitch::new(step, 3), duration, 2)
    }

    fn extract(measures: Vec<Measure>) -> Result<Vec<Subchord>, AnalysisError> {
        let part = Part {
            id: "P1".to_string(),
            measures,
        };
        let mut out = Vec::new();
        extract_part(0, &part, &AnalysisOptions::default(), &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_aligned_staves() {
        let subchords = extract(vec![Measure::piano(vec![
            treble(E, 2),
            treble(G, 2),
            bass(C, 2),
            bass(C, 2),
        ])])
        .unwrap();

        assert_eq!(subchords.len(), 2);
        assert_eq!(subchords[0].point, 0);
        assert_eq!(subchords[1].point, 2);
        assert_eq!(subchords[0].name.to_string(), "(3)");
        assert_eq!(subchords[1].name.to_string(), "(5)");
        assert_eq!(subchords[0].bass_note, Some(C));
    }

    #[test]
    fn test_held_bass_is_reread() {
        let subchords = extract(vec![Measure::piano(vec![
            treble(E, 2),
            treble(F, 1),
            treble(G, 1),
            bass(C, 4),
        ])])
        .unwrap();

        let points: Vec<u32> = subchords.iter().map(|s| s.point).collect();
        assert_eq!(points, vec![0, 2, 3]);
        for subchord in &subchords {
            assert_eq!(subchord.bass_note, Some(C));
            assert_eq!(subchord.notes[0].step, C);
            assert_eq!(subchord.notes[0].point, 0);
        }
        assert_eq!(subchords[1].notes[1].step, F);
        assert_eq!(subchords[1].notes[1].point, 2);
    }

    #[test]
    fn test_held_treble_is_reread() {
        let subchords = extract(vec![Measure::piano(vec![
            treble(C, 4),
            treble(E, 4).in_chord(),
            bass(C, 2),
            bass(A, 1),
            bass(G, 1),
        ])])
        .unwrap();

        let names: Vec<String> = subchords.iter().map(|s| s.name.to_string()).collect();
        assert_eq!(names, vec!["(3)", "Am", "C"]);
        let points: Vec<u32> = subchords.iter().map(|s| s.point).collect();
        assert_eq!(points, vec![0, 2, 3]);
    }

    #[test]
    fn test_unequal_subdivisions() {
        // treble 3+3, bass 2+2+2: onsets at 0, 2, 3, 4
        let subchords = extract(vec![Measure::piano(vec![
            treble(E, 3),
            treble(F, 3),
            bass(C, 2),
            bass(D, 2),
            bass(G, 2),
        ])])
        .unwrap();

        let points: Vec<u32> = subchords.iter().map(|s| s.point).collect();
        assert_eq!(points, vec![0, 2, 3, 4]);

        assert_voice_rebuilt(&points, &[3, 3], 6);
        assert_voice_rebuilt(&points, &[2, 2, 2], 6);
    }

    /// Every attack of a voice starts at a subchord point, and the point
    /// deltas inside each attack add up to its duration.
    fn assert_voice_rebuilt(points: &[u32], durations: &[u32], measure_duration: u32) {
        let mut onset = 0;
        for &duration in durations {
            assert!(points.contains(&onset), "no subchord at onset {}", onset);
            let covered: u32 = points
                .iter()
                .enumerate()
                .filter(|(_, &point)| point >= onset && point < onset + duration)
                .map(|(i, &point)| points.get(i + 1).copied().unwrap_or(measure_duration) - point)
                .sum();
            assert_eq!(covered, duration, "attack at {}", onset);
            onset += duration;
        }
        assert_eq!(onset, measure_duration);
    }

    #[test]
    fn test_chord_notes_form_one_attack() {
        let subchords = extract(vec![Measure::piano(vec![
            treble(E, 4),
            treble(G, 4).in_chord(),
            bass(C, 4),
            ScoreNote::new(Pitch::new(C, 2), 4, 2).in_chord(),
        ])])
        .unwrap();

        assert_eq!(subchords.len(), 1);
        assert_eq!(subchords[0].notes.len(), 4);
        assert_eq!(subchords[0].name.to_string(), "C");
        assert_eq!(subchords[0].root_note, Some(C));
    }

    #[test]
    fn test_bass_note_is_the_lowest_bass_pitch() {
        let subchords = extract(vec![Measure::piano(vec![
            treble(C, 4),
            ScoreNote::new(Pitch::new(G, 3), 4, 2),
            ScoreNote::new(Pitch::new(E, 2), 4, 2).in_chord(),
        ])])
        .unwrap();

        assert_eq!(subchords[0].bass_note, Some(E));
        assert_eq!(subchords[0].name.to_string(), "C");
    }

    #[test]
    fn test_repetition_marks() {
        let subchords = extract(vec![
            Measure::piano(vec![treble(E, 2), treble(E, 2), bass(C, 4)]),
            Measure::new(vec![treble(E, 4), bass(C, 4)]),
        ])
        .unwrap();

        assert!(!subchords[0].is_repeated);
        assert!(subchords[1].is_repeated);
        // a new measure never continues the previous one
        assert_eq!(subchords[2].measure_number, 2);
        assert!(!subchords[2].is_repeated);
    }

    #[test]
    fn test_wrong_staff_count() {
        let mut measure = Measure::piano(vec![treble(C, 4), bass(C, 4)]);
        if let Some(attributes) = measure.attributes.as_mut() {
            attributes.staves = Some(1);
        }
        let result = extract(vec![measure]);
        assert_eq!(
            result,
            Err(AnalysisError::StaffCount { part: "P1".to_string(), measure: 1, found: 1 })
        );
    }

    #[test]
    fn test_multiple_voices() {
        let result = extract(vec![Measure::piano(vec![
            treble(C, 2),
            treble(D, 2).with_voice(2),
            bass(C, 4),
        ])]);
        assert!(matches!(
            result,
            Err(AnalysisError::MultipleVoices { measure: 1, staff: 1, .. })
        ));
    }

    #[test]
    fn test_rest_is_rejected() {
        let result = extract(vec![
            Measure::piano(vec![treble(C, 4), bass(C, 4)]),
            Measure::new(vec![treble(C, 2), ScoreNote::rest(2, 1), bass(C, 4)]),
        ]);
        assert_eq!(
            result,
            Err(AnalysisError::UnsupportedRest { part: "P1".to_string(), measure: 2 })
        );
    }

    #[test]
    fn test_malformed_measures() {
        let empty_bass = extract(vec![Measure::piano(vec![treble(C, 4)])]);
        assert!(matches!(empty_bass, Err(AnalysisError::MalformedMeasure { .. })));

        let unequal = extract(vec![Measure::piano(vec![treble(C, 4), bass(C, 2)])]);
        match unequal {
            Err(AnalysisError::MalformedMeasure { message, .. }) => {
                assert!(message.contains("unequal"), "got: {}", message)
            }
            other => panic!("Expected MalformedMeasure but got: {:?}", other),
        }

        let starts_in_chord = extract(vec![Measure::piano(vec![
            treble(E, 2).in_chord(),
            treble(G, 2),
            bass(C, 2),
        ])]);
        match starts_in_chord {
            Err(AnalysisError::MalformedMeasure { message, .. }) => {
                assert!(message.contains("treble staff starts inside a chord"), "got: {}", message)
            }
            other => panic!("Expected MalformedMeasure but got: {:?}", other),
        }

        let third_staff = extract(vec![Measure::piano(vec![
            treble(C, 4),
            bass(C, 4),
            ScoreNote::new(Pitch::new(C, 2), 4, 3),
        ])]);
        assert!(matches!(third_staff, Err(AnalysisError::MalformedMeasure { .. })));
    }

    #[test]
    fn test_overlong_staff_is_an_error() {
        let result = extract(vec![Measure::piano(vec![
            ScoreNote::new(Pitch::new(C, 4), u32::MAX, 1),
            ScoreNote::new(Pitch::new(E, 4), 2, 1),
            bass(C, 1),
        ])]);
        match result {
            Err(AnalysisError::MalformedMeasure { measure, message, .. }) => {
                assert_eq!(measure, 1);
                assert!(message.contains("too long"), "got: {}", message);
            }
            other => panic!("Expected MalformedMeasure but got: {:?}", other),
        }
    }
}
