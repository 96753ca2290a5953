pub mod types;
pub mod prompt;
pub mod mistral;
pub mod client;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use mistral::*;
pub use client::*;
pub use orchestrator::*;

use thiserror::Error;

/// Failure of one analysis call.
///
/// This is the only error that crosses the analysis client boundary. It is
/// delivered as the `Err` arm of [`AnalysisResult`], never as response text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Could not reach the completion service at {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Completion service returned an error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Completion service returned no message")]
    EmptyResponse,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl AnalysisError {
    /// Rejected credential (401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_detection() {
        let unauthorized = AnalysisError::Api {
            status: 401,
            body: "Unauthorized".into(),
        };
        let server = AnalysisError::Api {
            status: 500,
            body: "boom".into(),
        };
        assert!(unauthorized.is_auth_failure());
        assert!(!server.is_auth_failure());
        assert!(!AnalysisError::EmptyResponse.is_auth_failure());
    }

    #[test]
    fn display_carries_original_description() {
        let err = AnalysisError::Connection {
            url: "https://api.mistral.ai".into(),
            message: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("https://api.mistral.ai"));
    }
}
