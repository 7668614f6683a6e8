//! Stage clients: the three external services an entity analysis calls
//!
//! Each stage is one trait so the analyzer doesn't depend on how a service
//! is reached. Implementations:
//! - [`PerplexityClient`]: web search with citations (stage 1)
//! - [`GrokClient`]: social-media sentiment (stage 2)
//! - [`GeminiClient`]: schema-constrained extraction (stage 3)
//! - [`MockClient`]: configurable in-process stand-in for all three (testing)
//!
//! None of the clients retry. A failed call is reported once and the caller
//! decides what to do with it.

mod chat;
mod gemini;
mod grok;
mod mock;
mod perplexity;

pub use gemini::{GeminiClient, GeminiConfig};
pub use grok::{GrokClient, GrokConfig};
pub use mock::{sample_payload, MockClient};
pub use perplexity::{PerplexityClient, PerplexityConfig};

use crate::forecast::{Forecast, OutputError, OutputSchema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Output of the search stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub content: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// Output of the sentiment stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub content: String,
}

/// Errors from a single stage call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    /// Transport failure or non-2xx response
    #[error("{message}")]
    Unavailable { status: Option<u16>, message: String },
    #[error("malformed output: {0}")]
    Malformed(String),
    #[error("schema violation: {0}")]
    SchemaViolation(String),
}

impl StageError {
    /// A non-2xx response from `service`.
    pub fn http(service: &str, status: u16, body: &str) -> Self {
        Self::Unavailable {
            status: Some(status),
            message: format!("{} API error: {} - {}", service, status, body),
        }
    }

    /// A request that never produced a response.
    pub fn transport(service: &str, error: reqwest::Error) -> Self {
        Self::Unavailable {
            status: error.status().map(|s| s.as_u16()),
            message: format!("{} request failed: {}", service, error),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unavailable { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<OutputError> for StageError {
    fn from(err: OutputError) -> Self {
        match err {
            OutputError::Malformed(m) => Self::Malformed(m),
            OutputError::SchemaViolation(m) => Self::SchemaViolation(m),
        }
    }
}

/// Failure to construct the stage clients. Aborts a run before it starts.
#[derive(Debug, thiserror::Error)]
#[error("failed to build HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// Stage 1: search-style client returning free text plus citations.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, prompt: &str) -> Result<SearchResponse, StageError>;
}

/// Stage 2: sentiment-style client returning free text.
#[async_trait]
pub trait SentimentClient: Send + Sync {
    /// `enable_auxiliary_tool` permits the service to perform its own
    /// secondary lookup. The returned content is used the same way either way.
    async fn analyze(
        &self,
        prompt: &str,
        enable_auxiliary_tool: bool,
    ) -> Result<SentimentResponse, StageError>;
}

/// Stage 3: structured extraction.
///
/// Implementations validate the payload against `schema` before returning;
/// a shape mismatch is an error, never a value.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    async fn extract(&self, prompt: &str, schema: &OutputSchema) -> Result<Forecast, StageError>;
}

/// The three stage clients an analyzer needs.
#[derive(Clone)]
pub struct StageClients {
    pub search: Arc<dyn SearchClient>,
    pub sentiment: Arc<dyn SentimentClient>,
    pub extraction: Arc<dyn ExtractionClient>,
}

impl StageClients {
    pub fn new(
        search: Arc<dyn SearchClient>,
        sentiment: Arc<dyn SentimentClient>,
        extraction: Arc<dyn ExtractionClient>,
    ) -> Self {
        Self {
            search,
            sentiment,
            extraction,
        }
    }

    /// Use one mock for all three stages.
    pub fn from_mock(mock: Arc<MockClient>) -> Self {
        Self {
            search: mock.clone(),
            sentiment: mock.clone(),
            extraction: mock,
        }
    }

    /// Build the HTTP clients from configuration.
    pub fn from_config(config: &crate::config::ForecastConfig) -> Result<Self, ClientBuildError> {
        let http = build_http_client(config.request_timeout)?;
        Ok(Self {
            search: Arc::new(PerplexityClient::new(http.clone(), config.perplexity.clone())),
            sentiment: Arc::new(GrokClient::new(http.clone(), config.grok.clone())),
            extraction: Arc::new(GeminiClient::new(http, config.gemini.clone())),
        })
    }
}

/// Shared `reqwest::Client` for all three services.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ClientBuildError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

/// Read a non-2xx body for the error message.
async fn error_body(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_carries_status_and_body() {
        let err = StageError::http("Perplexity", 500, "Internal Server Error");
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "Perplexity API error: 500 - Internal Server Error"
        );
    }

    #[test]
    fn output_errors_keep_their_class() {
        let malformed: StageError = OutputError::Malformed("eof".into()).into();
        assert!(matches!(malformed, StageError::Malformed(_)));
        assert_eq!(malformed.status(), None);

        let violation: StageError = OutputError::SchemaViolation("missing".into()).into();
        assert!(matches!(violation, StageError::SchemaViolation(_)));
    }

    #[test]
    fn http_client_builds_with_timeout() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }
}
