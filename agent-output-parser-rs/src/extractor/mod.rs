//! Candidate extraction
//!
//! Scans model output for `{"action": ..., "action_input": ...}` objects,
//! escapes raw control characters in their strings, rewrites Python
//! literals, and decodes each match into a
//! [`CandidateRecord`]. A match that fails to decode is dropped; the others
//! are still returned, in order of appearance.

pub mod normalize;
pub mod scanner;

pub use normalize::{
    escape_control_chars, normalize_literals, NormalizeResult, Normalizer, LITERAL_TOKENS,
};
pub use scanner::RejectReason;

use crate::errors::DecodeError;
use crate::markdown::JsonStrategy;
use crate::record::CandidateRecord;
use crate::{ParserConfig, DEFAULT_MAX_NESTING_DEPTH};
use scanner::Scan;

/// Longest snippet kept for a rejected candidate
const REJECTED_SNIPPET_CHARS: usize = 120;

/// A candidate that was recognized but not surfaced
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCandidate {
    /// Byte offset of the candidate's opening brace in the scanned text
    pub offset: usize,
    /// Leading part of the candidate text
    pub snippet: String,
    /// Why the candidate was dropped
    pub reason: RejectReason,
}

/// Records recovered from a text, plus what was dropped along the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<CandidateRecord>,
    pub rejected: Vec<RejectedCandidate>,
}

/// Finds and decodes action objects in text
#[derive(Debug, Clone)]
pub struct Extractor {
    normalizer: Normalizer,
    max_nesting_depth: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            normalizer: Normalizer::default(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl Extractor {
    /// Create an extractor with the default token table and depth limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor from parser configuration
    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            normalizer: Normalizer::from_pairs(config.literal_tokens.iter().cloned()),
            max_nesting_depth: config.max_nesting_depth,
        }
    }

    /// Lazily iterate the records in `text`, left to right
    pub fn extract<'e, 't>(&'e self, text: &'t str) -> Candidates<'e, 't> {
        Candidates {
            extractor: self,
            text,
            pos: 0,
        }
    }

    /// Collect every record in `text`
    pub fn extract_all(&self, text: &str) -> Vec<CandidateRecord> {
        self.extract(text).collect()
    }

    /// Collect every record in `text` together with the rejected candidates
    pub fn extract_with_report(&self, text: &str) -> Extraction {
        let mut extraction = Extraction::default();
        let mut pos = 0;

        while let Some(step) = self.step(text, pos) {
            pos = step.resume_at;
            match step.result {
                Ok(record) => extraction.records.push(record),
                Err(rejected) => extraction.rejected.push(rejected),
            }
        }

        extraction
    }

    fn step(&self, text: &str, from: usize) -> Option<Step> {
        let Scan { start, outcome } = scanner::next_candidate(text, from, self.max_nesting_depth)?;
        // The head starts with a one-byte `{`
        let retry_at = start + 1;

        let end = match outcome {
            Ok(end) => end,
            Err(reason) => {
                return Some(Step::rejected(text, start, reason, retry_at));
            }
        };

        match self.decode_candidate(&text[start..end]) {
            Ok(record) => Some(Step {
                result: Ok(record),
                resume_at: end,
            }),
            Err(err) => Some(Step::rejected(
                text,
                start,
                RejectReason::Decode(err.to_string()),
                retry_at,
            )),
        }
    }

    fn decode_candidate(&self, candidate: &str) -> Result<CandidateRecord, DecodeError> {
        let escaped = normalize::escape_control_chars(candidate);
        let normalized = self.normalizer.normalize(&escaped.normalized);
        let record: CandidateRecord = serde_json::from_str(&normalized.normalized)?;
        if !record.has_action() {
            return Err(DecodeError::EmptyAction);
        }
        Ok(record)
    }
}

impl JsonStrategy for Extractor {
    type Output = Vec<CandidateRecord>;

    fn decode(&self, text: &str) -> Self::Output {
        self.extract_all(text)
    }
}

struct Step {
    result: Result<CandidateRecord, RejectedCandidate>,
    resume_at: usize,
}

impl Step {
    fn rejected(text: &str, start: usize, reason: RejectReason, resume_at: usize) -> Self {
        log::debug!("Dropping candidate at offset {}: {}", start, reason);
        Step {
            result: Err(RejectedCandidate {
                offset: start,
                snippet: text[start..].chars().take(REJECTED_SNIPPET_CHARS).collect(),
                reason,
            }),
            resume_at,
        }
    }
}

/// Lazy iterator over the records found in a text.
///
/// Finite and not restartable; create a new one with [`Extractor::extract`]
/// to scan again.
#[derive(Debug)]
pub struct Candidates<'e, 't> {
    extractor: &'e Extractor,
    text: &'t str,
    pos: usize,
}

impl Iterator for Candidates<'_, '_> {
    type Item = CandidateRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = match self.extractor.step(self.text, self.pos) {
                Some(step) => step,
                None => {
                    self.pos = self.text.len();
                    return None;
                }
            };
            self.pos = step.resume_at;
            if let Ok(record) = step.result {
                return Some(record);
            }
        }
    }
}

impl std::iter::FusedIterator for Candidates<'_, '_> {}

/// Extract records from `text` with the default extractor
pub fn extract(text: &str) -> Vec<CandidateRecord> {
    Extractor::default().extract_all(text)
}
