//! # Agent Output Parser
//!
//! Turns free-form language model output into the next step of the Phoenix
//! ORCH agent loop: either a tool invocation or a final answer.
//!
//! ## Features
//!
//! - Lenient extraction of `{"action": ..., "action_input": ...}` objects
//!   embedded in prose, with correct handling of nested objects
//! - Rewriting of Python-style literals (`True`, `False`) before decoding
//! - Classification with first-action / last-final-answer tie-breaking
//! - Markdown code-fence unwrapping
//! - A single error type, [`ParseFailure`], that always carries the raw text

mod errors;
mod record;
pub mod classifier;
pub mod extractor;
pub mod markdown;
pub mod parser;

#[cfg(test)]
mod tests;

pub use classifier::{classify, Classification, Classifier, DiscardReason, DiscardedCandidate};
pub use errors::{FailureKind, ParseFailure, ParseResult};
pub use extractor::{extract, Candidates, Extraction, Extractor, RejectReason, RejectedCandidate};
pub use markdown::{parse_json_markdown, JsonStrategy};
pub use parser::{AgentOutputParser, JsonAgentOutputParser};
pub use record::{ActionInput, CandidateRecord, ParseOutcome};

/// Re-export commonly used items for convenience
pub mod prelude {
    pub use crate::errors::{ParseFailure, ParseResult};
    pub use crate::parser::{AgentOutputParser, JsonAgentOutputParser};
    pub use crate::record::{ActionInput, CandidateRecord, ParseOutcome};
    pub use crate::ParserConfig;
}

use std::env;

/// Version of the parser library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Action name that ends the agent loop
pub const DEFAULT_FINAL_ANSWER_ACTION: &str = "Final Answer";

/// Largest model output accepted (1 MiB)
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Deepest `action_input` object nesting accepted
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

const ENV_FINAL_ANSWER: &str = "AGENT_PARSER_FINAL_ANSWER";
const ENV_MAX_INPUT_BYTES: &str = "AGENT_PARSER_MAX_INPUT_BYTES";
const ENV_MAX_NESTING_DEPTH: &str = "AGENT_PARSER_MAX_NESTING_DEPTH";

/// Configuration for the output parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Action name treated as the final answer
    pub final_answer_action: String,
    /// Maximum accepted input size in bytes
    pub max_input_bytes: usize,
    /// Maximum nesting depth of an `action_input` object
    pub max_nesting_depth: usize,
    /// `(from, to)` token rewrites applied before decoding
    pub literal_tokens: Vec<(String, String)>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            final_answer_action: DEFAULT_FINAL_ANSWER_ACTION.to_string(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            literal_tokens: extractor::LITERAL_TOKENS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }
}

impl ParserConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset or invalid
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let final_answer_action = match env::var(ENV_FINAL_ANSWER) {
            Ok(value) if !value.trim().is_empty() => value,
            Ok(_) => {
                log::warn!("Empty {}, using default '{}'", ENV_FINAL_ANSWER, DEFAULT_FINAL_ANSWER_ACTION);
                defaults.final_answer_action
            }
            Err(_) => defaults.final_answer_action,
        };

        Self {
            final_answer_action,
            max_input_bytes: env_usize(ENV_MAX_INPUT_BYTES, defaults.max_input_bytes),
            max_nesting_depth: env_usize(ENV_MAX_NESTING_DEPTH, defaults.max_nesting_depth),
            literal_tokens: defaults.literal_tokens,
        }
    }

    pub fn with_final_answer_action<S: Into<String>>(mut self, action: S) -> Self {
        self.final_answer_action = action.into();
        self
    }

    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Replace the literal-token table
    pub fn with_literal_tokens<I, F, T>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        self.literal_tokens = tokens
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .collect();
        self
    }
}

fn env_usize(var_name: &str, default: usize) -> usize {
    match env::var(var_name) {
        Ok(value) => match value.trim().parse::<usize>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => {
                log::warn!("Invalid value in {}, using default {}", var_name, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse model output with default settings
pub fn parse(text: &str) -> ParseResult<ParseOutcome> {
    JsonAgentOutputParser::default().parse(text)
}
