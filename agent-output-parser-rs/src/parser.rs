//! The JSON agent output parser
//!
//! Expects the model to answer with one (or, in practice, several) objects:
//!
//! ```text
//! {
//!   "action": "search",
//!   "action_input": "2+2"
//! }
//! ```
//!
//! which becomes a [`ParseOutcome::ToolInvocation`], or
//!
//! ```text
//! {
//!   "action": "Final Answer",
//!   "action_input": "4"
//! }
//! ```
//!
//! which becomes a [`ParseOutcome::FinalAnswer`].

use crate::classifier::{Classification, Classifier};
use crate::errors::{ParseFailure, ParseResult};
use crate::extractor::Extractor;
use crate::markdown::parse_json_markdown;
use crate::record::ParseOutcome;
use crate::ParserConfig;

/// Type tag reported by [`JsonAgentOutputParser`]
pub const JSON_AGENT_PARSER_TYPE: &str = "json-agent";

/// Turns raw model output into the agent loop's next step
pub trait AgentOutputParser: Send + Sync {
    /// Parse one model response
    fn parse(&self, text: &str) -> ParseResult<ParseOutcome>;

    /// Stable identifier of the parser
    fn parser_type(&self) -> &'static str;
}

/// Parser for responses made of `action` / `action_input` JSON objects
#[derive(Debug, Clone)]
pub struct JsonAgentOutputParser {
    extractor: Extractor,
    classifier: Classifier,
    max_input_bytes: usize,
}

impl Default for JsonAgentOutputParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl JsonAgentOutputParser {
    /// Create a parser from configuration
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            extractor: Extractor::from_config(config),
            classifier: Classifier::new(config.final_answer_action.clone()),
            max_input_bytes: config.max_input_bytes,
        }
    }

    /// Create a parser configured from the environment
    pub fn from_env() -> Self {
        Self::new(&ParserConfig::from_env())
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Parse `text` and report the records that did not make it into the outcome
    pub fn parse_detailed(&self, text: &str) -> ParseResult<Classification> {
        if text.len() > self.max_input_bytes {
            log::warn!(
                "Model output of {} bytes exceeds limit of {} bytes",
                text.len(),
                self.max_input_bytes
            );
            return Err(ParseFailure::input_too_large(text));
        }

        let records = parse_json_markdown(text, &self.extractor);
        log::trace!("Extracted {} candidate record(s)", records.len());

        let classification = self.classifier.classify_detailed(records, text)?;
        log::trace!("Parsed model output as {}", classification.outcome.kind());
        Ok(classification)
    }
}

impl AgentOutputParser for JsonAgentOutputParser {
    fn parse(&self, text: &str) -> ParseResult<ParseOutcome> {
        self.parse_detailed(text)
            .map(|classification| classification.outcome)
    }

    fn parser_type(&self) -> &'static str {
        JSON_AGENT_PARSER_TYPE
    }
}
