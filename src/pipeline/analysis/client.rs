use std::time::Instant;

use super::mistral::MistralClient;
use super::types::{AnalysisReport, AnalysisRequest, AnalysisResult, LlmClient};
use super::AnalysisError;
use crate::config::{AnalysisConfig, ApiKey};

/// Submits composed requests to a completion backend.
///
/// The sole error boundary of the pipeline: every backend failure comes back
/// as the `Err` arm of [`AnalysisResult`].
pub struct AnalysisClient {
    llm: Box<dyn LlmClient + Send + Sync>,
    model: String,
}

impl AnalysisClient {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, model: &str) -> Self {
        Self {
            llm,
            model: model.to_string(),
        }
    }

    /// Client backed by the hosted chat-completions API.
    pub fn mistral(api_key: ApiKey, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let llm = MistralClient::new(api_key, config)?;
        tracing::debug!(base_url = %llm.base_url(), model = %config.model, "Completion client ready");
        Ok(Self::new(Box::new(llm), &config.model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one request and wait for the full response.
    ///
    /// Blocking, no retries. Record and response text are never logged.
    pub fn submit(&self, request: AnalysisRequest) -> AnalysisResult {
        let mode = request.mode();
        let messages = request.messages();

        tracing::info!(
            model = %self.model,
            mode = %mode,
            persona_chars = request.persona().len(),
            case_chars = request.case_instruction().len(),
            "Submitting analysis request"
        );

        let started = Instant::now();
        match self.llm.complete(&self.model, &messages) {
            Ok(text) => {
                tracing::info!(
                    model = %self.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    response_chars = text.len(),
                    "Analysis completed"
                );
                Ok(AnalysisReport::new(text, &self.model, mode))
            }
            Err(e) => {
                tracing::warn!(
                    model = %self.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Analysis request failed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pipeline::analysis::mistral::MockLlmClient;
    use crate::pipeline::analysis::prompt::{compose_narrative, DEATH_CERTIFICATION_PERSONA};
    use crate::pipeline::analysis::types::{AnalysisMode, Role};

    #[test]
    fn submit_wraps_response_in_report() {
        let client = AnalysisClient::new(Box::new(MockLlmClient::new("Sepsis (A41.9)")), "m-1");
        let report = client.submit(compose_narrative("record")).unwrap();

        assert_eq!(report.text, "Sepsis (A41.9)");
        assert_eq!(report.model, "m-1");
        assert_eq!(report.mode, AnalysisMode::Narrative);
    }

    #[test]
    fn submit_sends_persona_then_case() {
        let mock = Arc::new(MockLlmClient::new("ok"));
        let client = AnalysisClient::new(Box::new(Arc::clone(&mock)), "m");
        client.submit(compose_narrative("Patient X died of sepsis.")).unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].role, Role::System);
        assert_eq!(calls[0][0].content, DEATH_CERTIFICATION_PERSONA);
        assert_eq!(calls[0][1].role, Role::User);
        assert!(calls[0][1].content.contains("Patient X died of sepsis."));
    }

    #[test]
    fn transport_failure_is_tagged_error() {
        let failure = AnalysisError::Connection {
            url: "https://api.mistral.ai".into(),
            message: "dns error: no such host".into(),
        };
        let client = AnalysisClient::new(Box::new(MockLlmClient::failing(failure.clone())), "m");

        let err = client.submit(compose_narrative("record")).unwrap_err();
        assert_eq!(err, failure);
        assert!(err.to_string().contains("dns error: no such host"));
    }

    #[test]
    fn mistral_constructor_uses_config_model() {
        let config = AnalysisConfig::default().with_model("open-mistral-nemo").unwrap();
        let client = AnalysisClient::mistral(ApiKey::new("sk").unwrap(), &config).unwrap();
        assert_eq!(client.model(), "open-mistral-nemo");
    }
}
