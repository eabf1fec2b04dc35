//! Result Extraction
//!
//! Turns the free-form output of a trial into a single elapsed time.
//!
//! The search programs print a timing line of the form
//! `Execution Time: 1.234567 seconds`. On a miss they also print a
//! "not found" line *and* still print the timing line, so the not-found
//! marker is checked first: a miss is never reported as a valid timing,
//! and never conflated with unparseable output.

use crate::trial::TrialOutput;
use regex::Regex;
use thiserror::Error;

/// Default pattern for the timing line; group 1 is the number of seconds
pub const DEFAULT_TIMING_PATTERN: &str =
    r"Execution Time:\s*(\d+(?:\.\d*)?|\.\d+)\s*seconds";

/// Default pattern for the "target not found" marker: a whole line such as
/// `Password not found.`
pub const DEFAULT_NOT_FOUND_PATTERN: &str = r"(?im)^\s*\w+\s+not\s+found\.?\s*$";

/// Maximum characters of stderr kept in an `Unparseable` excerpt
pub const EXCERPT_CHARS: usize = 200;

/// Why a trial's output produced no timing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The trial ran to completion but did not locate the search target
    #[error("target not found")]
    TargetNotFound,

    /// No timing line could be found in the output
    #[error("unparseable output{}", .excerpt.as_deref().map(|e| format!(": {}", e)).unwrap_or_default())]
    Unparseable {
        /// Leading part of the captured stderr, if any
        excerpt: Option<String>,
    },
}

/// Invalid extractor pattern
#[derive(Debug, Error)]
#[error("Invalid {which} pattern: {source}")]
pub struct PatternError {
    which: &'static str,
    #[source]
    source: regex::Error,
}

/// Parses trial output into elapsed seconds
#[derive(Debug, Clone)]
pub struct Extractor {
    timing: Regex,
    not_found: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            timing: Regex::new(DEFAULT_TIMING_PATTERN).expect("default timing pattern is valid"),
            not_found: Regex::new(DEFAULT_NOT_FOUND_PATTERN)
                .expect("default not-found pattern is valid"),
        }
    }
}

impl Extractor {
    /// Build an extractor from custom patterns.
    ///
    /// The timing pattern must have a capture group holding the seconds value.
    pub fn new(timing_pattern: &str, not_found_pattern: &str) -> Result<Self, PatternError> {
        let timing = Regex::new(timing_pattern).map_err(|source| PatternError {
            which: "timing",
            source,
        })?;
        let not_found = Regex::new(not_found_pattern).map_err(|source| PatternError {
            which: "not-found",
            source,
        })?;
        Ok(Self { timing, not_found })
    }

    /// Extract elapsed seconds from a trial's captured output
    pub fn extract(&self, output: &TrialOutput) -> Result<f64, ExtractError> {
        if self.not_found.is_match(&output.stdout) {
            return Err(ExtractError::TargetNotFound);
        }
        self.parse_seconds(&output.stdout)
            .ok_or_else(|| ExtractError::Unparseable {
                excerpt: excerpt(&output.stderr),
            })
    }

    /// First timing value in `text`, if any
    pub fn parse_seconds(&self, text: &str) -> Option<f64> {
        self.timing
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| m.as_str().parse::<f64>().ok())
    }
}

/// Trimmed leading excerpt of `stream`, `None` when empty
pub fn excerpt(stream: &str) -> Option<String> {
    let trimmed = stream.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => Some(format!("{}...", &trimmed[..cut])),
        None => Some(trimmed.to_string()),
    }
}
