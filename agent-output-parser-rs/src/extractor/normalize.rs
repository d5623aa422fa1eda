//! Literal-token normalization
//!
//! Some models write Python literals (`True`, `False`) inside otherwise
//! JSON-shaped output. Before a candidate is decoded, every table entry
//! preceded by whitespace and ending on a word boundary is rewritten to its
//! JSON spelling. Tokens that are prefixes of longer words (`Truest`) and
//! tokens glued to a preceding character (`"True"`) are left alone.
//!
//! Models also write multi-line strings with raw newlines and tabs, which
//! JSON forbids. [`escape_control_chars`] turns those into escape sequences,
//! touching only characters inside string literals.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Default rewrite table: Python booleans to JSON booleans
pub const LITERAL_TOKENS: &[(&str, &str)] = &[("True", "true"), ("False", "false")];

lazy_static! {
    static ref DEFAULT_NORMALIZER: Normalizer = Normalizer::from_pairs(LITERAL_TOKENS.iter().copied());
}

/// Normalization result with information about what was rewritten
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeResult {
    /// Normalized text
    pub normalized: String,
    /// Number of tokens rewritten
    pub replacements: usize,
}

impl NormalizeResult {
    fn unmodified(text: &str) -> Self {
        Self {
            normalized: text.to_string(),
            replacements: 0,
        }
    }

    /// Whether any token was rewritten
    pub fn was_modified(&self) -> bool {
        self.replacements > 0
    }
}

/// Rewrites literal tokens according to a fixed table
#[derive(Debug, Clone)]
pub struct Normalizer {
    pattern: Option<Regex>,
    table: HashMap<String, String>,
}

impl Normalizer {
    /// Build a normalizer from `(from, to)` pairs.
    ///
    /// An empty table yields a normalizer that never rewrites anything.
    pub fn from_pairs<I, F, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        let table: HashMap<String, String> = pairs
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .filter(|(from, _)| !from.is_empty())
            .collect();

        let pattern = if table.is_empty() {
            None
        } else {
            // Longest first so that overlapping tokens prefer the longer one
            let mut tokens: Vec<&String> = table.keys().collect();
            tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation = tokens
                .iter()
                .map(|token| regex::escape(token))
                .collect::<Vec<_>>()
                .join("|");
            // Escaped literals joined by `|` always form a valid pattern
            Regex::new(&format!(r"(\s)({})\b", alternation)).ok()
        };

        Self { pattern, table }
    }

    /// The normalizer for [`LITERAL_TOKENS`]
    pub fn standard() -> &'static Normalizer {
        &DEFAULT_NORMALIZER
    }

    /// Rewrite all table tokens in `input`
    pub fn normalize(&self, input: &str) -> NormalizeResult {
        let pattern = match &self.pattern {
            Some(pattern) => pattern,
            None => return NormalizeResult::unmodified(input),
        };

        let mut replacements = 0;
        let normalized = pattern.replace_all(input, |caps: &Captures| {
            let token = &caps[2];
            match self.table.get(token) {
                Some(replacement) => {
                    replacements += 1;
                    format!("{}{}", &caps[1], replacement)
                }
                None => caps[0].to_string(),
            }
        });

        if replacements > 0 {
            log::debug!("Rewrote {} literal token(s) in candidate", replacements);
        }

        NormalizeResult {
            normalized: normalized.into_owned(),
            replacements,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::standard().clone()
    }
}

/// Escape raw `\n`, `\r` and `\t` inside the string literals of `input`.
///
/// Whitespace between tokens is left as is. Already-escaped sequences are
/// not escaped again, so the pass is idempotent.
pub fn escape_control_chars(input: &str) -> NormalizeResult {
    let mut normalized = String::with_capacity(input.len());
    let mut replacements = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in input.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            normalized.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            normalized.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                normalized.push(c);
            }
            '"' => {
                in_string = false;
                normalized.push(c);
            }
            '\n' | '\r' | '\t' => {
                replacements += 1;
                normalized.push_str(match c {
                    '\n' => "\\n",
                    '\r' => "\\r",
                    _ => "\\t",
                });
            }
            _ => normalized.push(c),
        }
    }

    if replacements > 0 {
        log::debug!("Escaped {} control character(s) in string literals", replacements);
    }

    NormalizeResult {
        normalized,
        replacements,
    }
}

/// Rewrite Python booleans using the default table
pub fn normalize_literals(input: &str) -> NormalizeResult {
    Normalizer::standard().normalize(input)
}
