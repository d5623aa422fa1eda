//! Result classification
//!
//! Turns the ordered records recovered from one model response into a
//! [`ParseOutcome`]:
//!
//! - the **last** record decides whether the response is a final answer
//!   (a concluding `Final Answer` block wins over earlier tool calls);
//! - otherwise the **first** record is the tool invocation, and every later
//!   record is discarded with [`DiscardReason::SupersededByFirstAction`].

use crate::errors::{ParseFailure, ParseResult};
use crate::record::{CandidateRecord, ParseOutcome};
use crate::DEFAULT_FINAL_ANSWER_ACTION;
use std::fmt;

/// Why a record was left out of the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// An earlier record already supplied the tool invocation
    SupersededByFirstAction,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::SupersededByFirstAction => {
                f.write_str("superseded by the first action in the response")
            }
        }
    }
}

/// A record that did not contribute to the outcome
#[derive(Debug, Clone, PartialEq)]
pub struct DiscardedCandidate {
    /// Position of the record in the classified sequence
    pub index: usize,
    pub record: CandidateRecord,
    pub reason: DiscardReason,
}

/// An outcome together with the records it ignored
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub outcome: ParseOutcome,
    pub discarded: Vec<DiscardedCandidate>,
}

/// Maps candidate records to a [`ParseOutcome`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    final_answer_action: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_FINAL_ANSWER_ACTION)
    }
}

impl Classifier {
    /// Create a classifier that treats `final_answer_action` as the stop sentinel
    pub fn new<S: Into<String>>(final_answer_action: S) -> Self {
        Self {
            final_answer_action: final_answer_action.into(),
        }
    }

    /// The sentinel action name
    pub fn final_answer_action(&self) -> &str {
        &self.final_answer_action
    }

    /// Classify `records`, failing with the raw text when no outcome can be built
    pub fn classify(&self, records: Vec<CandidateRecord>, raw_text: &str) -> ParseResult<ParseOutcome> {
        self.classify_detailed(records, raw_text)
            .map(|classification| classification.outcome)
    }

    /// Classify `records` and report which of them were ignored
    pub fn classify_detailed(
        &self,
        records: Vec<CandidateRecord>,
        raw_text: &str,
    ) -> ParseResult<Classification> {
        let mut records = records.into_iter();
        let first = match records.next() {
            Some(first) => first,
            None => {
                log::debug!("No candidate records in model output");
                return Err(ParseFailure::no_candidates(raw_text));
            }
        };
        let rest: Vec<CandidateRecord> = records.collect();
        let last = rest.last().unwrap_or(&first);

        if !rest.is_empty() {
            log::warn!(
                "Got {} action blocks in one response; using the first for tool calls",
                rest.len() + 1
            );
        }

        if !first.has_action() || !last.has_action() {
            return Err(ParseFailure::missing_action(raw_text));
        }

        if last.action == self.final_answer_action {
            let payload: Vec<CandidateRecord> = std::iter::once(first).chain(rest).collect();
            log::trace!("Classified {} record(s) as final answer", payload.len());
            return Ok(Classification {
                outcome: ParseOutcome::FinalAnswer {
                    payload,
                    raw_text: raw_text.to_string(),
                },
                discarded: Vec::new(),
            });
        }

        let discarded: Vec<DiscardedCandidate> = rest
            .into_iter()
            .enumerate()
            .map(|(offset, record)| DiscardedCandidate {
                index: offset + 1,
                record,
                reason: DiscardReason::SupersededByFirstAction,
            })
            .collect();

        for candidate in &discarded {
            log::debug!(
                "Discarding action '{}' at index {}: {}",
                candidate.record.action,
                candidate.index,
                candidate.reason
            );
        }
        log::trace!("Classified response as tool invocation of '{}'", first.action);

        Ok(Classification {
            outcome: ParseOutcome::ToolInvocation {
                action: first.action,
                action_input: first.action_input,
                raw_text: raw_text.to_string(),
            },
            discarded,
        })
    }
}

/// Classify `records` with the default `Final Answer` sentinel
pub fn classify(records: Vec<CandidateRecord>, raw_text: &str) -> ParseResult<ParseOutcome> {
    Classifier::default().classify(records, raw_text)
}
