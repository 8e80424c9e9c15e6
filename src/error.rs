//! # Error Types
//!
//! This module defines all error types for the harmonic analysis.
//!
//! Structural errors carry the part id and the 1-based bar number so the caller
//! can point the user at the offending measure. A structural error aborts the
//! analysis of the whole score: no partial results are returned.
//!
//! ## Error Types
//! - `StaffCount` - the measure does not declare exactly two staves
//! - `MultipleVoices` - a staff carries more than one voice
//! - `UnsupportedRest` - rests are not an input shape the analysis handles
//! - `MalformedMeasure` - empty staff, unknown staff number, staves of unequal length
//! - `ConfigError` - invalid analysis options
//! - `DocumentError` - a score document could not be read
//!
//! ## Usage
//! ```rust
//! use harmony::{analyze, AnalysisError, AnalysisOptions, Score};
//!
//! let score = Score::default();
//! match analyze(&score, &AnalysisOptions::default()) {
//!     Ok(analysis) => println!("{} chords", analysis.chords.len()),
//!     Err(AnalysisError::MultipleVoices { part, measure, staff }) => {
//!         eprintln!("{}: measure {} has several voices on staff {}", part, measure, staff);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The measure declares a staff count other than two.
    ///
    /// # Example
    /// ```
    /// # use harmony::AnalysisError;
    /// let err = AnalysisError::StaffCount { part: "P1".to_string(), measure: 1, found: 1 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Part P1, measure 1: a piano score with two staves is required (found 1)"
    /// );
    /// ```
    #[error("Part {part}, measure {measure}: a piano score with two staves is required (found {found})")]
    StaffCount {
        part: String,
        measure: usize,
        found: u8,
    },

    /// A staff carries more than one voice.
    #[error("Part {part}, measure {measure}: at most one voice per staff is supported (staff {staff})")]
    MultipleVoices {
        part: String,
        measure: usize,
        staff: u8,
    },

    /// The measure contains a rest.
    #[error("Part {part}, measure {measure}: rests are not supported")]
    UnsupportedRest { part: String, measure: usize },

    /// Any other shape the synchronizer cannot walk.
    ///
    /// # Example
    /// ```
    /// # use harmony::AnalysisError;
    /// let err = AnalysisError::MalformedMeasure {
    ///     part: "P1".to_string(),
    ///     measure: 4,
    ///     message: "bass staff is empty".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Part P1, measure 4: bass staff is empty");
    /// ```
    #[error("Part {part}, measure {measure}: {message}")]
    MalformedMeasure {
        part: String,
        measure: usize,
        message: String,
    },

    /// Invalid analysis options.
    #[error("Invalid analysis options: {0}")]
    ConfigError(String),

    /// The score document could not be read.
    #[error("Invalid score document: {0}")]
    DocumentError(String),
}

impl AnalysisError {
    /// True for errors raised by the structural preconditions of the analysis.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            AnalysisError::StaffCount { .. }
                | AnalysisError::MultipleVoices { .. }
                | AnalysisError::UnsupportedRest { .. }
                | AnalysisError::MalformedMeasure { .. }
        )
    }

    /// The bar number the error points at, when there is one.
    pub fn measure(&self) -> Option<usize> {
        match self {
            AnalysisError::StaffCount { measure, .. }
            | AnalysisError::MultipleVoices { measure, .. }
            | AnalysisError::UnsupportedRest { measure, .. }
            | AnalysisError::MalformedMeasure { measure, .. } => Some(*measure),
            AnalysisError::ConfigError(_) | AnalysisError::DocumentError(_) => None,
        }
    }
}
