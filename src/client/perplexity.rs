//! Search stage over Perplexity's chat-completions API

use super::chat::{ChatCompletion, ChatMessage};
use super::{error_body, SearchClient, SearchResponse, StageError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const SERVICE: &str = "Perplexity";
const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar-pro";
const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Restrict search to the past week
const RECENCY_FILTER: &str = "week";

const SYSTEM_PROMPT: &str =
    "あなたは日本の選挙・政治を専門とする政治アナリストです。正確で客観的な情報を提供してください。";

#[derive(Debug, Clone)]
pub struct PerplexityConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl PerplexityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

pub struct PerplexityClient {
    http: reqwest::Client,
    config: PerplexityConfig,
}

impl PerplexityClient {
    pub fn new(http: reqwest::Client, config: PerplexityConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            "max_tokens": self.config.max_tokens,
            "return_citations": true,
            "search_recency_filter": RECENCY_FILTER,
        })
    }
}

#[async_trait]
impl SearchClient for PerplexityClient {
    async fn search(&self, prompt: &str) -> Result<SearchResponse, StageError> {
        debug!(model = %self.config.model, prompt_chars = prompt.chars().count(), "perplexity search");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| StageError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StageError::http(SERVICE, status.as_u16(), &error_body(response).await));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StageError::transport(SERVICE, e))?;
        let completion = ChatCompletion::parse(SERVICE, &body)?;
        let content = completion.content();
        Ok(SearchResponse {
            content,
            citations: completion.citations,
        })
    }
}
