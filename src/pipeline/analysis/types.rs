use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// How the case instruction is assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Full record text + death-certification checklist, five-step persona.
    #[default]
    Narrative,
    /// Extracted fact lists + four-point root-cause instructions.
    Structured,
    /// Full record text + four-point root-cause instructions.
    RootCause,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Structured => "structured",
            Self::RootCause => "root_cause",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// A composed analysis request: persona plus case instruction.
///
/// Built only by the prompt composer. Immutable; moved into the client for
/// exactly one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    mode: AnalysisMode,
    persona: String,
    case_instruction: String,
}

impl AnalysisRequest {
    pub(crate) fn new(mode: AnalysisMode, persona: String, case_instruction: String) -> Self {
        Self {
            mode,
            persona,
            case_instruction,
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn case_instruction(&self) -> &str {
        &self.case_instruction
    }

    /// Ordered wire messages: system persona, then user case instruction.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: Role::System,
                content: self.persona.clone(),
            },
            ChatMessage {
                role: Role::User,
                content: self.case_instruction.clone(),
            },
        ]
    }
}

/// A successful analysis: the model's full response text plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub text: String,
    pub model: String,
    pub mode: AnalysisMode,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(text: String, model: &str, mode: AnalysisMode) -> Self {
        Self {
            text,
            model: model.to_string(),
            mode,
            generated_at: Utc::now(),
        }
    }
}

/// Outcome of one analysis call: report or tagged failure.
pub type AnalysisResult = Result<AnalysisReport, AnalysisError>;

/// Text-completion backend abstraction (allows mocking).
pub trait LlmClient {
    /// Send the messages to `model` and return the first choice's text.
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, AnalysisError>;
}

impl<T: LlmClient + ?Sized> LlmClient for std::sync::Arc<T> {
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, AnalysisError> {
        (**self).complete(model, messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_system_then_user() {
        let request = AnalysisRequest::new(
            AnalysisMode::Narrative,
            "persona".into(),
            "case".into(),
        );
        let messages = request.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "persona");
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "case");
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage {
            role: Role::System,
            content: "x".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"x"}"#);
    }

    #[test]
    fn mode_strings() {
        assert_eq!(AnalysisMode::RootCause.to_string(), "root_cause");
        assert_eq!(AnalysisMode::default(), AnalysisMode::Narrative);
        let json = serde_json::to_string(&AnalysisMode::Structured).unwrap();
        assert_eq!(json, "\"structured\"");
    }

    #[test]
    fn report_records_provenance() {
        let report = AnalysisReport::new("text".into(), "mistral-large-latest", AnalysisMode::Structured);
        assert_eq!(report.model, "mistral-large-latest");
        assert_eq!(report.mode, AnalysisMode::Structured);
        assert!(report.generated_at <= Utc::now());
    }
}
