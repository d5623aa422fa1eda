//! Error handling for the output parser
//!
//! Callers only ever see [`ParseFailure`]. Decoding problems with a single
//! candidate object are represented by [`DecodeError`], which stays inside
//! the extractor and is recovered from by dropping the candidate.

use std::fmt;
use thiserror::Error;

/// Result type for parse operations
pub type ParseResult<T> = Result<T, ParseFailure>;

/// Why a parse failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No candidate record could be recovered from the text
    NoCandidates,
    /// A record selected for classification had no usable `action`
    MissingAction,
    /// The input exceeded the configured size limit
    InputTooLarge,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::NoCandidates => "no candidates",
            FailureKind::MissingAction => "missing action",
            FailureKind::InputTooLarge => "input too large",
        };
        f.write_str(name)
    }
}

/// The single error surfaced to callers.
///
/// Always carries the original model output so the agent loop can feed it
/// back to the model as part of a retry prompt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not parse LLM output: {raw_text}")]
pub struct ParseFailure {
    kind: FailureKind,
    raw_text: String,
}

impl ParseFailure {
    /// Create a new failure for the given raw text
    pub fn new<S: Into<String>>(kind: FailureKind, raw_text: S) -> Self {
        Self {
            kind,
            raw_text: raw_text.into(),
        }
    }

    /// Failure for text without any usable candidate
    pub fn no_candidates<S: Into<String>>(raw_text: S) -> Self {
        Self::new(FailureKind::NoCandidates, raw_text)
    }

    /// Failure for a record without a usable action
    pub fn missing_action<S: Into<String>>(raw_text: S) -> Self {
        Self::new(FailureKind::MissingAction, raw_text)
    }

    /// Failure for input above the size limit
    pub fn input_too_large<S: Into<String>>(raw_text: S) -> Self {
        Self::new(FailureKind::InputTooLarge, raw_text)
    }

    /// What went wrong
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The model output that failed to parse
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Consume the failure and return the raw text
    pub fn into_raw_text(self) -> String {
        self.raw_text
    }
}

/// A matched candidate that could not be turned into a record
#[derive(Error, Debug)]
pub(crate) enum DecodeError {
    /// Not valid JSON for the record shape after normalization
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Decoded, but the `action` field is empty
    #[error("empty action")]
    EmptyAction,
}
