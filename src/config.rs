//! Environment-driven configuration

use crate::analysis::DEFAULT_CONCURRENCY;
use crate::client::{GeminiConfig, GrokConfig, PerplexityConfig};
use std::time::Duration;
use thiserror::Error;

pub const PERPLEXITY_API_KEY: &str = "PERPLEXITY_API_KEY";
pub const XAI_API_KEY: &str = "XAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const PERPLEXITY_MODEL: &str = "PERPLEXITY_MODEL";
pub const GROK_MODEL: &str = "GROK_MODEL";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const REQUEST_TIMEOUT_SECS: &str = "SENKYO_REQUEST_TIMEOUT_SECS";
pub const CONCURRENCY: &str = "SENKYO_CONCURRENCY";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingEnv(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },
}

/// Settings for the three stage clients and the run
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub perplexity: PerplexityConfig,
    pub grok: GrokConfig,
    pub gemini: GeminiConfig,
    pub request_timeout: Duration,
    pub concurrency: usize,
}

impl ForecastConfig {
    /// Defaults for everything but the API keys
    pub fn new(
        perplexity_key: impl Into<String>,
        xai_key: impl Into<String>,
        gemini_key: impl Into<String>,
    ) -> Self {
        Self {
            perplexity: PerplexityConfig::new(perplexity_key),
            grok: GrokConfig::new(xai_key),
            gemini: GeminiConfig::new(gemini_key),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| ConfigError::MissingEnv(name.to_string()));

        let mut config = Self::new(
            require(PERPLEXITY_API_KEY)?,
            require(XAI_API_KEY)?,
            require(GEMINI_API_KEY)?,
        );

        if let Some(model) = get(PERPLEXITY_MODEL) {
            config.perplexity = config.perplexity.with_model(model);
        }
        if let Some(model) = get(GROK_MODEL) {
            config.grok = config.grok.with_model(model);
        }
        if let Some(model) = get(GEMINI_MODEL) {
            config.gemini = config.gemini.with_model(model);
        }
        if let Some(secs) = get(REQUEST_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_positive(REQUEST_TIMEOUT_SECS, &secs)?);
        }
        if let Some(limit) = get(CONCURRENCY) {
            config.concurrency = parse_positive(CONCURRENCY, &limit)? as usize;
        }

        Ok(config)
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_positive(name: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
