//! # Chord Classifier
//!
//! Names a set of letter classes under the tertian (stacked thirds) model.
//!
//! ## Pipeline
//! 1. Deduplicate the letters in natural-alphabet order ([`letter_set`])
//! 2. Reorder them so that consecutive letters are a third, fifth or seventh
//!    apart ([`stack_in_thirds`])
//! 3. Measure the semitone distances between consecutive stacked letters
//! 4. Match the semitone pattern against the known triads and seventh chords
//! 5. When nothing matches, retry the alternative framings in order (today:
//!    the bass removed, i.e. the bass heard as a non-chord tone) and keep the
//!    first framing that names a complete chord
//!
//! ## Names
//! | Semitones  | Name        |
//! |------------|-------------|
//! | `4 3`      | `C`         |
//! | `3 4`      | `Cm`        |
//! | `4 4`      | `Caug`      |
//! | `3 3`      | `Cdim`      |
//! | `4 3 3`    | `C7`        |
//! | `4 3 4`    | `Cmaj7`     |
//! | `3 4 3`    | `Cm7`       |
//! | `3 4 4`    | `Cm(maj7)`  |
//! | `3 3 3`    | `Cdim`      |
//! | `3 3 4`    | `Cm(♭5)`    |
//!
//! Dyads and incomplete sevenths (`4 6`, `7 3`) are written as their diatonic
//! intervals in parentheses, e.g. `(5)` or `(3,5)`. Anything else is `?`.
//!
//! ## Example
//! ```rust
//! use harmony::classify::classify;
//! use harmony::pitch::Step;
//!
//! let chord = classify(&[Step::A, Step::F, Step::D], Some(Step::D));
//! assert_eq!(chord.name.to_string(), "Dm");
//! assert_eq!(chord.root(), Some(Step::D));
//! ```

use crate::pitch::{intervals, semitones, step_rank, Step, ALPHABET};
use log::trace;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Chord quality of a complete classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Major,
    Minor,
    Augmented,
    Diminished,
    Dominant7,
    Major7,
    Minor7,
    MinorMajor7,
    HalfDiminished,
}

impl Quality {
    /// Symbol written after the root letter
    pub fn suffix(self) -> &'static str {
        match self {
            Quality::Major => "",
            Quality::Minor => "m",
            Quality::Augmented => "aug",
            Quality::Diminished => "dim",
            Quality::Dominant7 => "7",
            Quality::Major7 => "maj7",
            Quality::Minor7 => "m7",
            Quality::MinorMajor7 => "m(maj7)",
            Quality::HalfDiminished => "m(♭5)",
        }
    }
}

/// Name of a sonority.
///
/// Serializes as its display string (`"Cm7"`, `"(3,5)"`, `"?"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChordName {
    /// A complete triad or seventh chord
    Chord { root: Step, quality: Quality },
    /// Too few members to name a chord: the diatonic intervals of the stack
    Interval(Vec<u8>),
    /// Not stackable in thirds
    Unknown,
}

impl ChordName {
    /// Interval-cluster notation, waiting to be absorbed by a neighbouring chord
    pub fn is_interval(&self) -> bool {
        matches!(self, ChordName::Interval(_))
    }

    /// A complete triad or seventh chord
    pub fn is_resolved(&self) -> bool {
        matches!(self, ChordName::Chord { .. })
    }
}

impl fmt::Display for ChordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChordName::Chord { root, quality } => write!(f, "{}{}", root, quality.suffix()),
            ChordName::Interval(intervals) => {
                let joined: Vec<String> = intervals.iter().map(|i| i.to_string()).collect();
                write!(f, "({})", joined.join(","))
            }
            ChordName::Unknown => f.write_str("?"),
        }
    }
}

impl Serialize for ChordName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of naming one framing of a letter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub name: ChordName,
    /// Letters of the framing that produced `name`, stacked in thirds
    pub stacked: Vec<Step>,
}

impl Classification {
    /// Root letter: the bottom of the stack that produced the name
    pub fn root(&self) -> Option<Step> {
        self.stacked.first().copied()
    }
}

/// Distinct letters, in natural-alphabet order.
pub fn letter_set<I>(steps: I) -> Vec<Step>
where
    I: IntoIterator<Item = Step>,
{
    let mut present = [false; 7];
    for step in steps {
        present[step.index()] = true;
    }
    ALPHABET
        .iter()
        .copied()
        .filter(|step| present[step.index()])
        .collect()
}

/// Reorder letters so that consecutive diatonic intervals are odd.
///
/// The first letter of the first pair with an even interval is moved to the
/// top of the stack. After the first move, a letter ranked above the current
/// top letter is slipped in just below it instead. The walk stops when every
/// interval is odd, when the interval pattern is back to the one it started
/// from, or when an arrangement repeats. The last two cases mean that the set
/// cannot be stacked in thirds.
pub fn stack_in_thirds(steps: &[Step]) -> Vec<Step> {
    let mut stacked = steps.to_vec();
    if stacked.len() < 2 {
        return stacked;
    }

    let initial = intervals(&stacked);
    let mut current = initial.clone();
    let mut seen: HashSet<Vec<Step>> = HashSet::new();
    seen.insert(stacked.clone());
    let mut first_move = true;

    while let Some(i) = current.iter().position(|interval| interval % 2 == 0) {
        let top = stacked[stacked.len() - 1];
        let offending = stacked.remove(i);

        if first_move || step_rank(top) < step_rank(offending) {
            stacked.push(offending);
        } else {
            let below_top = stacked.len() - 1;
            stacked.insert(below_top, offending);
        }
        first_move = false;

        current = intervals(&stacked);
        if current == initial || !seen.insert(stacked.clone()) {
            break;
        }
    }

    stacked
}

/// Name an arrangement exactly as stacked, without trying other framings.
pub fn name_stacked(stacked: &[Step], bass: Option<Step>) -> ChordName {
    let root = match stacked.first() {
        Some(root) => *root,
        None => return ChordName::Unknown,
    };
    let chord = |quality| ChordName::Chord { root, quality };
    // Bass on the seventh: the seventh doubles the bass and the chord reads as its triad.
    let seventh = |seventh_quality, triad_quality| {
        if stacked.get(3).copied() == bass {
            chord(triad_quality)
        } else {
            chord(seventh_quality)
        }
    };

    match semitones(stacked).as_slice() {
        [_] => ChordName::Interval(intervals(stacked)),
        [4, 3] => chord(Quality::Major),
        [3, 4] => chord(Quality::Minor),
        [4, 4] => chord(Quality::Augmented),
        [3, 3] => chord(Quality::Diminished),
        [4, 6] | [7, 3] => ChordName::Interval(intervals(stacked)),
        [4, 3, 3] => seventh(Quality::Dominant7, Quality::Major),
        [4, 3, 4] => seventh(Quality::Major7, Quality::Major),
        [3, 4, 3] => seventh(Quality::Minor7, Quality::Minor),
        [3, 4, 4] => seventh(Quality::MinorMajor7, Quality::Minor),
        [3, 3, 3] => chord(Quality::Diminished),
        [3, 3, 4] => seventh(Quality::HalfDiminished, Quality::Minor),
        _ => ChordName::Unknown,
    }
}

/// Name a letter set over a designated bass.
///
/// The result does not depend on the order of `steps` nor on duplicates.
pub fn classify(steps: &[Step], bass: Option<Step>) -> Classification {
    classify_framing(stack_in_thirds(&letter_set(steps.iter().copied())), bass)
}

/// Name an arrangement that is already stacked, falling back to the
/// alternative framings when the arrangement itself has no name.
///
/// ```rust
/// use harmony::classify::classify_framing;
/// use harmony::pitch::Step;
///
/// // G B D with an F added on top: a dominant seventh
/// let chord = classify_framing(vec![Step::G, Step::B, Step::D, Step::F], Some(Step::G));
/// assert_eq!(chord.name.to_string(), "G7");
/// ```
pub fn classify_framing(stacked: Vec<Step>, bass: Option<Step>) -> Classification {
    let name = name_stacked(&stacked, bass);
    let direct = Classification { name, stacked };
    if direct.name != ChordName::Unknown {
        return direct;
    }

    for framing in alternative_framings(&direct.stacked, bass) {
        let stacked = stack_in_thirds(&framing);
        let name = name_stacked(&stacked, bass);
        if name.is_resolved() {
            trace!("{:?} over {:?} reads as {}", direct.stacked, bass, name);
            return Classification { name, stacked };
        }
    }

    direct
}

/// Other ways of hearing an unnamed set, in priority order.
fn alternative_framings(letters: &[Step], bass: Option<Step>) -> Vec<Vec<Step>> {
    let mut framings = Vec::new();

    if let Some(bass) = bass {
        if letters.len() > 2 && letters.contains(&bass) {
            framings.push(letter_set(letters.iter().copied().filter(|step| *step != bass)));
        }
    }

    framings
}
