//! Sentiment stage over xAI's chat-completions API

use super::chat::{ChatCompletion, ChatMessage};
use super::{error_body, SentimentClient, SentimentResponse, StageError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const SERVICE: &str = "Grok";
const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-3-fast";
const DEFAULT_MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str = "あなたはX（旧Twitter）上の政治的な議論や世論を分析する専門家です。
SNSの声は有権者全体を代表しているわけではないことに注意し、バイアスを考慮した分析を行ってください。
ボットや組織的な投稿の可能性も考慮してください。";

#[derive(Debug, Clone)]
pub struct GrokConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl GrokConfig {
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
}

pub struct GrokClient {
    http: reqwest::Client,
    config: GrokConfig,
}

impl GrokClient {
    pub fn new(http: reqwest::Client, config: GrokConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str, enable_x_search: bool) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            "max_tokens": self.config.max_tokens,
        });
        if enable_x_search {
            body["tools"] = json!([x_search_tool()]);
        }
        body
    }
}

/// Function tool letting the model search X posts itself
fn x_search_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": "x_search",
            "description": "Search X (Twitter) for posts about a topic",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            }
        }
    })
}

#[async_trait]
impl SentimentClient for GrokClient {
    async fn analyze(
        &self,
        prompt: &str,
        enable_auxiliary_tool: bool,
    ) -> Result<SentimentResponse, StageError> {
        debug!(
            model = %self.config.model,
            x_search = enable_auxiliary_tool,
            "grok sentiment analysis"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(prompt, enable_auxiliary_tool))
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
        // Tool-call results are folded into the message content by the service.
        let content = ChatCompletion::parse(SERVICE, &body)?.content();
        Ok(SentimentResponse { content })
    }
}
