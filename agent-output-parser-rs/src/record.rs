//! Records recovered from model output and the outcomes built from them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments for a tool: a single string or a structured mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionInput {
    Text(String),
    Structured(Map<String, Value>),
}

impl Default for ActionInput {
    fn default() -> Self {
        ActionInput::Structured(Map::new())
    }
}

impl ActionInput {
    /// The string argument, if this is a text input
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ActionInput::Text(text) => Some(text),
            ActionInput::Structured(_) => None,
        }
    }

    /// The mapping, if this is a structured input
    pub fn as_structured(&self) -> Option<&Map<String, Value>> {
        match self {
            ActionInput::Text(_) => None,
            ActionInput::Structured(map) => Some(map),
        }
    }

    /// Whether this is the empty mapping used when no input was given
    pub fn is_empty_mapping(&self) -> bool {
        matches!(self, ActionInput::Structured(map) if map.is_empty())
    }

    /// Convert into a plain JSON value
    pub fn into_value(self) -> Value {
        match self {
            ActionInput::Text(text) => Value::String(text),
            ActionInput::Structured(map) => Value::Object(map),
        }
    }
}

impl From<&str> for ActionInput {
    fn from(text: &str) -> Self {
        ActionInput::Text(text.to_string())
    }
}

impl From<String> for ActionInput {
    fn from(text: String) -> Self {
        ActionInput::Text(text)
    }
}

impl From<Map<String, Value>> for ActionInput {
    fn from(map: Map<String, Value>) -> Self {
        ActionInput::Structured(map)
    }
}

/// A JSON object recognized in model output, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Tool name, or the final-answer sentinel
    pub action: String,
    /// Tool arguments; an empty mapping when the object had none
    #[serde(default)]
    pub action_input: ActionInput,
    /// Any other keys present in the object, kept for audit
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CandidateRecord {
    /// Create a record without extra keys
    pub fn new<S, I>(action: S, action_input: I) -> Self
    where
        S: Into<String>,
        I: Into<ActionInput>,
    {
        Self {
            action: action.into(),
            action_input: action_input.into(),
            extra: Map::new(),
        }
    }

    /// Whether the record carries a non-empty action
    pub fn has_action(&self) -> bool {
        !self.action.is_empty()
    }
}

/// The decision handed to the agent loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParseOutcome {
    /// Dispatch `action` to the tool registry with `action_input`
    ToolInvocation {
        action: String,
        action_input: ActionInput,
        raw_text: String,
    },
    /// Stop the loop and surface `payload` to the user
    FinalAnswer {
        payload: Vec<CandidateRecord>,
        raw_text: String,
    },
}

impl ParseOutcome {
    pub fn is_final(&self) -> bool {
        matches!(self, ParseOutcome::FinalAnswer { .. })
    }

    /// The tool name for an invocation
    pub fn action(&self) -> Option<&str> {
        match self {
            ParseOutcome::ToolInvocation { action, .. } => Some(action),
            ParseOutcome::FinalAnswer { .. } => None,
        }
    }

    /// The model output this outcome was parsed from
    pub fn raw_text(&self) -> &str {
        match self {
            ParseOutcome::ToolInvocation { raw_text, .. } => raw_text,
            ParseOutcome::FinalAnswer { raw_text, .. } => raw_text,
        }
    }

    /// Short name of the variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ParseOutcome::ToolInvocation { .. } => "tool_invocation",
            ParseOutcome::FinalAnswer { .. } => "final_answer",
        }
    }
}
