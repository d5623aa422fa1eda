//! Structural recognizer for action objects embedded in prose
//!
//! A candidate starts with `{ "action": "<name>"`, matched by a regex. The
//! remainder is walked by hand as a list of `, "key": value` members up to
//! the closing brace. `action_input` must be a quoted string or an object;
//! other members (a model's `"thought"`, say) may hold any value and end up
//! in the record's extra keys. Objects and arrays are consumed with a
//! string-aware bracket counter so nested mappings (and braces inside string
//! values) never cut the candidate short.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

const ACTION_INPUT: &str = "action_input";

lazy_static! {
    // The name may span newlines or end in a backslash; such names are
    // rejected later by the decoder, not here.
    static ref CANDIDATE_HEAD: Regex = Regex::new(r#"\{\s*"action"\s*:\s*"[^"]+"\s*"#).unwrap();
}

/// Why a candidate was not turned into a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The object shape after the action name was not recognized
    Malformed(&'static str),
    /// A string or object ran to the end of the text
    Unterminated,
    /// A member value nested deeper than the configured limit
    TooDeep(usize),
    /// The matched text did not decode into a record
    Decode(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Malformed(what) => write!(f, "malformed candidate: {}", what),
            RejectReason::Unterminated => f.write_str("unterminated candidate"),
            RejectReason::TooDeep(limit) => {
                write!(f, "value nested deeper than {} levels", limit)
            }
            RejectReason::Decode(msg) => write!(f, "decode failed: {}", msg),
        }
    }
}

/// One structural scan step: where a candidate begins and how it ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scan {
    /// Byte offset of the opening brace
    pub start: usize,
    /// Exclusive end offset of the candidate, or why it was rejected
    pub outcome: Result<usize, RejectReason>,
}

/// Find the next candidate at or after byte offset `from`.
///
/// `from` must lie on a char boundary of `text`.
pub(crate) fn next_candidate(text: &str, from: usize, max_depth: usize) -> Option<Scan> {
    let head = CANDIDATE_HEAD.find_at(text, from)?;
    Some(Scan {
        start: head.start(),
        outcome: recognize_tail(text, head.end(), max_depth),
    })
}

fn recognize_tail(text: &str, pos: usize, max_depth: usize) -> Result<usize, RejectReason> {
    let bytes = text.as_bytes();
    let mut pos = pos;

    loop {
        match bytes.get(pos) {
            Some(b'}') => return Ok(pos + 1),
            Some(b',') => pos = skip_whitespace(bytes, pos + 1),
            Some(_) => return Err(RejectReason::Malformed("expected `,` or `}` after a member")),
            None => return Err(RejectReason::Unterminated),
        }

        let key_end = match bytes.get(pos) {
            Some(b'"') => scan_string(bytes, pos)?,
            Some(_) => return Err(RejectReason::Malformed("expected a quoted key")),
            None => return Err(RejectReason::Unterminated),
        };
        let key = &text[pos + 1..key_end - 1];

        pos = skip_whitespace(bytes, key_end);
        match bytes.get(pos) {
            Some(b':') => pos = skip_whitespace(bytes, pos + 1),
            Some(_) => return Err(RejectReason::Malformed("expected `:` after key")),
            None => return Err(RejectReason::Unterminated),
        }

        let value_end = match bytes.get(pos) {
            Some(b'{') => scan_nested(bytes, pos, b'{', b'}', max_depth)?,
            Some(b'"') => scan_string(bytes, pos)?,
            Some(_) if key == ACTION_INPUT => {
                return Err(RejectReason::Malformed(
                    "action_input must be an object or a string",
                ))
            }
            Some(b'[') => scan_nested(bytes, pos, b'[', b']', max_depth)?,
            Some(_) => scan_scalar(bytes, pos)?,
            None => return Err(RejectReason::Unterminated),
        };
        pos = skip_whitespace(bytes, value_end);
    }
}

/// Consume a quoted string starting at `start`; returns the offset after the
/// closing quote.
fn scan_string(bytes: &[u8], start: usize) -> Result<usize, RejectReason> {
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start + 1) {
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if b == b'"' {
            return Ok(i + 1);
        }
    }
    Err(RejectReason::Unterminated)
}

/// Consume a bracketed value (`{...}` or `[...]`) starting at `start`;
/// returns the offset after the matching closing bracket.
fn scan_nested(
    bytes: &[u8],
    start: usize,
    open: u8,
    close: u8,
    max_depth: usize,
) -> Result<usize, RejectReason> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
            if depth > max_depth {
                return Err(RejectReason::TooDeep(max_depth));
            }
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Ok(i + 1);
            }
        }
    }
    Err(RejectReason::Unterminated)
}

/// Consume a bare value (number, literal) up to the next separator
fn scan_scalar(bytes: &[u8], start: usize) -> Result<usize, RejectReason> {
    let mut end = start;
    while end < bytes.len() && !matches!(bytes[end], b',' | b'}') && !bytes[end].is_ascii_whitespace() {
        end += 1;
    }
    if end == start {
        return Err(RejectReason::Malformed("missing member value"));
    }
    Ok(end)
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}
