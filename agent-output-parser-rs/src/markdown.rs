//! Code-fence unwrapping
//!
//! Models often wrap their JSON in a markdown block (```` ```json ... ``` ````).
//! [`parse_json_markdown`] strips the fence and hands the inner text to a
//! pluggable [`JsonStrategy`].

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CLOSED_FENCE: Regex = Regex::new(r"(?s)```(?:json)?(.*)```").unwrap();
    static ref OPEN_FENCE: Regex = Regex::new(r"(?s)```(?:json)?(.*)").unwrap();
}

/// Decoding strategy applied to the unwrapped text
pub trait JsonStrategy {
    type Output;

    fn decode(&self, text: &str) -> Self::Output;
}

/// Return the text inside the first code fence, or the whole text if there
/// is none. Surrounding whitespace and stray backticks are removed.
pub fn strip_code_fence(text: &str) -> &str {
    let inner = CLOSED_FENCE
        .captures(text)
        .or_else(|| OPEN_FENCE.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    inner.trim().trim_matches('`').trim()
}

/// Strip markdown fencing from `text` and decode the rest with `strategy`
pub fn parse_json_markdown<S: JsonStrategy + ?Sized>(text: &str, strategy: &S) -> S::Output {
    strategy.decode(strip_code_fence(text))
}
