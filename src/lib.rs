//! Harmonic analysis of two-staff piano scores.
//!
//! The analysis reads a [`Score`] and produces an [`Analysis`]:
//! - one [`Subchord`] per onset in either staff, named as a chord symbol
//! - [`Chord`]s, runs of consecutive subchords with one harmonic identity
//!
//! ```rust
//! use harmony::{analyze, AnalysisOptions, Measure, Part, Pitch, Score, ScoreNote, Step};
//!
//! let mut part = Part::new("P1");
//! part.measures.push(Measure::piano(vec![
//!     ScoreNote::new(Pitch::new(Step::E, 4), 4, 1),
//!     ScoreNote::new(Pitch::new(Step::G, 4), 4, 1).in_chord(),
//!     ScoreNote::new(Pitch::new(Step::C, 3), 4, 2),
//! ]));
//! let score = Score { parts: vec![part] };
//!
//! let analysis = analyze(&score, &AnalysisOptions::default()).unwrap();
//! assert_eq!(analysis.chords[0].label(), "C");
//! ```

mod aggregate;
pub mod analysis;
mod bass;
pub mod classify;
pub mod document;
pub mod error;
mod extract;
pub mod model;
pub mod options;
pub mod pitch;

pub use analysis::*;
pub use classify::{ChordName, Quality};
pub use document::{parse_document, Document};
pub use error::*;
pub use model::*;
pub use options::{AnalysisOptions, ForeignBass, UnresolvedPolicy};
pub use pitch::{Note, Step};

use log::debug;

/// Analyse every part of a score.
///
/// Stops at the first measure that is not two-staff, one-voice-per-staff piano
/// writing and returns the error. No partial analysis is returned.
pub fn analyze(score: &Score, options: &AnalysisOptions) -> Result<Analysis, AnalysisError> {
    let mut subchords = Vec::new();
    for (index, part) in score.parts.iter().enumerate() {
        extract::extract_part(index, part, options, &mut subchords)?;
    }

    let runs = aggregate::aggregate(&subchords, options);
    let chords = bass::resolve_bass(runs, &mut subchords, options);

    let mut analysis = Analysis {
        parts: score.parts.iter().map(|part| part.id.clone()).collect(),
        subchords,
        chords,
    };
    analysis.link();

    debug!(
        "analysed {} parts: {} subchords, {} chords",
        analysis.parts.len(),
        analysis.subchords.len(),
        analysis.chords.len()
    );
    Ok(analysis)
}

/// Parse a YAML score document and analyse it with the options it carries.
pub fn analyze_document(source: &str) -> Result<Analysis, AnalysisError> {
    let document = parse_document(source)?;
    analyze(&document.score, &document.options)
}
