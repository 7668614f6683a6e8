//! Extraction stage over Gemini's `generateContent` API
//!
//! The schema description rides along as `responseSchema` so the service
//! emits JSON in the contracted shape; the reply is still validated locally
//! before it is returned.

use super::{error_body, ExtractionClient, StageError};
use crate::forecast::{Forecast, OutputSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const SERVICE: &str = "Gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
const TEMPERATURE: f64 = 0.7;

const SYSTEM_INSTRUCTION: &str = "あなたは日本の選挙データを分析し、構造化されたJSONを生成する専門家です。
与えられた情報を正確に分析し、指定されたJSON形式で出力してください。
推測が必要な場合は、保守的な予測を行い、確信度を適切に設定してください。";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
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

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    /// API key goes in the query string, not a header
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, prompt: &str, schema: &OutputSchema) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema.description(),
                "temperature": TEMPERATURE,
                "maxOutputTokens": self.config.max_output_tokens,
            },
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        })
    }
}

/// Pull the JSON text out of the first candidate's first part.
fn candidate_text(body: &str) -> Result<String, StageError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| StageError::Malformed(format!("unreadable {} response: {}", SERVICE, e)))?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| StageError::Malformed(format!("{} returned no candidates", SERVICE)))?;
    candidate
        .content
        .parts
        .into_iter()
        .find_map(|p| p.text)
        .ok_or_else(|| StageError::Malformed(format!("{} candidate has no text part", SERVICE)))
}

#[async_trait]
impl ExtractionClient for GeminiClient {
    async fn extract(&self, prompt: &str, schema: &OutputSchema) -> Result<Forecast, StageError> {
        debug!(model = %self.config.model, kind = %schema.kind(), "gemini extraction");

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&self.request_body(prompt, schema))
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
        let text = candidate_text(&body)?;
        Ok(schema.validate(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EntityKind;

    fn client() -> GeminiClient {
        GeminiClient::new(reqwest::Client::new(), GeminiConfig::new("test-api-key"))
    }

    #[test]
    fn request_carries_schema_and_generation_settings() {
        let schema = OutputSchema::for_kind(EntityKind::Block);
        let body = client().request_body("prompt", &schema);
        let generation = &body["generationConfig"];
        assert_eq!(generation["responseMimeType"], "application/json");
        assert_eq!(generation["maxOutputTokens"], 8192);
        assert_eq!(generation["temperature"], 0.7);
        assert_eq!(&generation["responseSchema"], schema.description());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
    }

    #[test]
    fn endpoint_names_model() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn candidate_text_is_extracted() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}]}"#;
        assert_eq!(candidate_text(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn no_candidates_is_malformed() {
        let err = candidate_text(r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, StageError::Malformed(ref m) if m.contains("no candidates")));
    }
}
