//! Shared OpenAI-style chat-completions wire types (Perplexity and xAI)

use super::StageError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    /// Null when the model answered only with tool calls
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Parse a 2xx body. A missing or null message content reads as "".
    pub fn parse(service: &str, body: &str) -> Result<Self, StageError> {
        let completion: ChatCompletion =
            serde_json::from_str(body).map_err(|e| StageError::Unavailable {
                status: None,
                message: format!("{} returned an unreadable response: {}", service, e),
            })?;
        if completion.choices.is_empty() {
            return Err(StageError::Unavailable {
                status: None,
                message: format!("{} returned no choices", service),
            });
        }
        Ok(completion)
    }

    pub fn content(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_content_reads_as_empty() {
        let body = r#"{"choices":[{"message":{"content":null,"tool_calls":[]}}],"model":"grok-3-fast"}"#;
        let completion = ChatCompletion::parse("Grok", body).unwrap();
        assert_eq!(completion.content(), "");
        assert!(completion.citations.is_empty());
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = ChatCompletion::parse("Grok", r#"{"choices":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(ChatCompletion::parse("Perplexity", "<html>").is_err());
    }
}
