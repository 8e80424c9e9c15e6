//! # Chord-Run Aggregation
//!
//! Merges the subchords of each measure into chords, greedily, from left to
//! right. A run starts at the first subchord with a chord name (not an
//! interval cluster). The letters of that subchord, stacked in thirds, are
//! the run's template. The run then swallows following subchords while one
//! of these holds:
//!
//! - the subchord repeats the previous one
//! - it is an interval cluster that fits the template: its letters are in
//!   the template, or a missing letter completes a triad template into a
//!   seventh chord (the run is renamed to the seventh)
//! - it has the run's chord name
//! - it is affiliated: fewer letters, same root, all letters in the template
//!
//! Interval clusters before the run's first named subchord are tested the
//! same way against that subchord's template. An interval cluster fitting no
//! template leaves the rest of the measure unresolved (see
//! [`UnresolvedPolicy`]).
//!
//! Runs never cross a measure boundary.

use crate::analysis::{Chord, Subchord};
use crate::classify::{letter_set, name_stacked, stack_in_thirds, ChordName};
use crate::options::{AnalysisOptions, UnresolvedPolicy};
use crate::pitch::Step;
use log::{trace, warn};
use std::ops::Range;

/// A run being built
#[derive(Debug, Clone)]
struct Run {
    name: ChordName,
    template: Vec<Step>,
    members: Vec<usize>,
}

impl Run {
    fn start(index: usize, head: &Subchord) -> Self {
        Self {
            name: head.name.clone(),
            template: head.steps.clone(),
            members: vec![index],
        }
    }

    fn root(&self) -> Option<Step> {
        match self.name {
            ChordName::Unknown => None,
            _ => self.template.first().copied(),
        }
    }

    /// Try to add an interval cluster to the run, completing the template when needed.
    ///
    /// The run is only updated when every letter of the cluster fits.
    fn absorbs_incomplete(&mut self, subchord: &Subchord) -> bool {
        let mut template = self.template.clone();
        let mut name = self.name.clone();

        for step in letter_set(subchord.steps.iter().copied()) {
            if template.contains(&step) {
                continue;
            }
            // only a named triad can take one more letter
            if template.len() != 3 || name == ChordName::Unknown {
                return false;
            }
            let mut letters = template.clone();
            letters.push(step);
            let stacked = stack_in_thirds(&letter_set(letters));
            let seventh = name_stacked(&stacked, None);
            if !seventh.is_resolved() {
                return false;
            }
            trace!("{} completed by {} into {}", name, step, seventh);
            template = stacked;
            name = seventh;
        }

        self.template = template;
        self.name = name;
        true
    }

    fn is_affiliated(&self, subchord: &Subchord) -> bool {
        subchord.steps.len() < self.template.len()
            && subchord.root_note.is_some()
            && subchord.root_note == self.root()
            && subchord.steps.iter().all(|step| self.template.contains(step))
    }

    /// Whether the subchord continues the run. Interval clusters may update the template.
    fn extends(&mut self, subchord: &Subchord) -> bool {
        match &subchord.name {
            ChordName::Interval(_) => self.absorbs_incomplete(subchord),
            _ if subchord.is_repeated => true,
            name if name.is_resolved() && *name == self.name => true,
            _ => self.is_affiliated(subchord),
        }
    }

    fn into_chord(self, subchords: &[Subchord]) -> Chord {
        let root_note = self.root();
        let first = &subchords[self.members[0]];
        let last = &subchords[self.members[self.members.len() - 1]];
        Chord {
            part: first.part,
            measure_number: first.measure_number,
            name: self.name,
            start_point: first.point,
            end_point: last.point,
            steps: self.template,
            notes: Vec::new(),
            subchords: self.members,
            bass_note: None,
            root_note,
        }
    }
}

/// Build the next run of a measure, starting at subchord `start`.
///
/// Returns `None` when the subchords from `start` on cannot form a run: no
/// named subchord is left, or a leading interval cluster does not fit the
/// first named one.
fn next_run(subchords: &[Subchord], start: usize, end: usize) -> Option<Run> {
    let head = (start..end).find(|&i| !subchords[i].name.is_interval())?;
    let mut run = Run::start(head, &subchords[head]);

    let mut leading = Vec::new();
    for index in start..head {
        if !run.absorbs_incomplete(&subchords[index]) {
            trace!(
                "{} at point {} fits no chord",
                subchords[index].name,
                subchords[index].point
            );
            return None;
        }
        leading.push(index);
    }
    leading.append(&mut run.members);
    run.members = leading;

    let mut next = head + 1;
    while next < end && run.extends(&subchords[next]) {
        run.members.push(next);
        next += 1;
    }
    trace!("run {} over subchords {:?}", run.name, run.members);

    Some(run)
}

/// One `?` chord over a range of subchords
fn catch_all(subchords: &[Subchord], range: Range<usize>) -> Chord {
    let members = &subchords[range.clone()];
    let first = &members[0];
    let last = &members[members.len() - 1];
    Chord {
        part: first.part,
        measure_number: first.measure_number,
        name: ChordName::Unknown,
        start_point: first.point,
        end_point: last.point,
        steps: letter_set(members.iter().flat_map(|s| s.steps.iter().copied())),
        notes: Vec::new(),
        subchords: range.collect(),
        bass_note: None,
        root_note: None,
    }
}

fn aggregate_measure(
    subchords: &[Subchord],
    measure: Range<usize>,
    options: &AnalysisOptions,
    chords: &mut Vec<Chord>,
) {
    let first_chord = chords.len();
    let mut cursor = measure.start;

    while cursor < measure.end {
        match next_run(subchords, cursor, measure.end) {
            Some(run) => {
                cursor = run.members[run.members.len() - 1] + 1;
                chords.push(run.into_chord(subchords));
            }
            None => {
                let subchord = &subchords[cursor];
                warn!(
                    "measure {}: no chord found from point {}, falling back to ?",
                    subchord.measure_number, subchord.point
                );
                match options.unresolved {
                    UnresolvedPolicy::Tail => {
                        chords.push(catch_all(subchords, cursor..measure.end));
                    }
                    UnresolvedPolicy::Measure => {
                        chords.truncate(first_chord);
                        chords.push(catch_all(subchords, measure.clone()));
                    }
                }
                break;
            }
        }
    }
}

/// Merge subchords into chords, measure by measure.
///
/// Subchords must be grouped by part and measure, as extraction emits them.
/// The returned chords have no bass yet.
pub(crate) fn aggregate(subchords: &[Subchord], options: &AnalysisOptions) -> Vec<Chord> {
    let mut chords = Vec::new();
    let mut start = 0;

    while start < subchords.len() {
        let key = (subchords[start].part, subchords[start].measure_number);
        let end = subchords[start..]
            .iter()
            .position(|s| (s.part, s.measure_number) != key)
            .map_or(subchords.len(), |offset| start + offset);
        aggregate_measure(subchords, start..end, options, &mut chords);
        start = end;
    }

    chords
}
