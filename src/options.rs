//! # Analysis Options
//!
//! Options are written as YAML with kebab-case keys, either as the
//! `analysis:` block of a score document or on their own:
//!
//! ```yaml
//! unresolved: tail      # tail | measure
//! foreign-bass: split   # split | keep
//! repeat-marks: true
//! ```
//!
//! ## Keys
//! - `unresolved` - what happens when an incomplete subchord fits no chord:
//!   `tail` spans the rest of the measure with one `?` chord and keeps the
//!   chords found before it, `measure` turns the whole measure into one `?` chord
//! - `foreign-bass` - when a chord's bass moves through a note foreign to the
//!   harmony, `split` breaks the chord into one chord per subchord, `keep`
//!   keeps the chord and leaves its bass undefined
//! - `repeat-marks` - mark subchords that repeat the previous one
//!
//! ## Example
//! ```rust
//! use harmony::{AnalysisOptions, ForeignBass, UnresolvedPolicy};
//!
//! let options = AnalysisOptions::from_yaml("foreign-bass: keep").unwrap();
//! assert_eq!(options.foreign_bass, ForeignBass::Keep);
//! assert_eq!(options.unresolved, UnresolvedPolicy::Tail);
//! assert!(options.repeat_marks);
//! ```

use crate::error::AnalysisError;
use serde::Deserialize;

/// Fallback when an incomplete subchord cannot join any chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// One `?` chord from the failing subchord to the end of the measure
    #[default]
    Tail,
    /// One `?` chord for the whole measure
    Measure,
}

impl UnresolvedPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "tail" => Some(UnresolvedPolicy::Tail),
            "measure" => Some(UnresolvedPolicy::Measure),
            _ => None,
        }
    }
}

/// Handling of a bass that is foreign to the chord above it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForeignBass {
    /// One chord per subchord
    #[default]
    Split,
    /// Keep the run, leave its bass undefined
    Keep,
}

impl ForeignBass {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "split" => Some(ForeignBass::Split),
            "keep" => Some(ForeignBass::Keep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub unresolved: UnresolvedPolicy,
    pub foreign_bass: ForeignBass,
    pub repeat_marks: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::default(),
            foreign_bass: ForeignBass::default(),
            repeat_marks: true,
        }
    }
}

/// Raw options for YAML deserialization
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawOptions {
    pub unresolved: Option<String>,
    pub foreign_bass: Option<String>,
    pub repeat_marks: Option<bool>,
}

impl AnalysisOptions {
    /// Validate raw options, filling in defaults for missing keys.
    pub fn from_raw(raw: &RawOptions) -> Result<Self, AnalysisError> {
        let mut options = Self::default();

        if let Some(unresolved) = &raw.unresolved {
            options.unresolved = UnresolvedPolicy::from_str(unresolved).ok_or_else(|| {
                AnalysisError::ConfigError(format!(
                    "Invalid unresolved policy: '{}'. Use 'tail' or 'measure'",
                    unresolved
                ))
            })?;
        }

        if let Some(foreign_bass) = &raw.foreign_bass {
            options.foreign_bass = ForeignBass::from_str(foreign_bass).ok_or_else(|| {
                AnalysisError::ConfigError(format!(
                    "Invalid foreign-bass handling: '{}'. Use 'split' or 'keep'",
                    foreign_bass
                ))
            })?;
        }

        if let Some(repeat_marks) = raw.repeat_marks {
            options.repeat_marks = repeat_marks;
        }

        Ok(options)
    }

    /// Parse options from a YAML mapping. An empty document gives the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, AnalysisError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawOptions =
            serde_yaml::from_str(content).map_err(|e| AnalysisError::ConfigError(e.to_string()))?;
        Self::from_raw(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AnalysisOptions::from_yaml("").unwrap();
        assert_eq!(options, AnalysisOptions::default());
        assert_eq!(options.unresolved, UnresolvedPolicy::Tail);
        assert_eq!(options.foreign_bass, ForeignBass::Split);
        assert!(options.repeat_marks);
    }

    #[test]
    fn test_all_keys() {
        let options = AnalysisOptions::from_yaml(
            "unresolved: measure\nforeign-bass: keep\nrepeat-marks: false\n",
        )
        .unwrap();
        assert_eq!(options.unresolved, UnresolvedPolicy::Measure);
        assert_eq!(options.foreign_bass, ForeignBass::Keep);
        assert!(!options.repeat_marks);
    }

    #[test]
    fn test_invalid_value() {
        let result = AnalysisOptions::from_yaml("unresolved: everywhere");
        match result {
            Err(AnalysisError::ConfigError(message)) => {
                assert!(message.contains("everywhere"), "got: {}", message)
            }
            other => panic!("Expected ConfigError but got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            AnalysisOptions::from_yaml("split-bass: true"),
            Err(AnalysisError::ConfigError(_))
        ));
    }
}
