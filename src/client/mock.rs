//! In-process stand-in for all three stage services (testing)

use super::{
    ExtractionClient, SearchClient, SearchResponse, SentimentClient, SentimentResponse,
    StageError,
};
use crate::data::EntityKind;
use crate::forecast::{Forecast, OutputSchema};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A valid extraction payload for `kind`.
pub fn sample_payload(kind: EntityKind) -> Value {
    match kind {
        EntityKind::National => json!({
            "cabinet_approval": 35.5,
            "party_support": { "ldp": 30.0, "chudou": 12.0, "ishin": 6.0 },
            "key_issues": [
                { "issue": "物価高対策", "importance": "high", "favorable_to": "dpfp" }
            ],
            "national_trend": "close",
            "seat_projection": { "ldp": 200, "chudou": 120, "ishin": 40 },
            "district_seats": { "ldp": 140, "chudou": 80, "ishin": 20 },
            "proportional_seats": { "ldp": 60, "chudou": 40, "ishin": 20 },
            "analysis_summary": "与野党拮抗"
        }),
        EntityKind::Regional => json!({
            "prefecture_id": "mock",
            "prefecture_name": "モック県",
            "districts": [{
                "district_id": "mock-1",
                "district_name": "モック県第1区",
                "winner_party": "ldp",
                "confidence": "medium",
                "analysis": "接戦",
                "candidates": [
                    { "name": "候補A", "party": "ldp", "vote_share_min": 40, "vote_share_max": 50 },
                    { "name": "候補B", "party": "chudou", "vote_share_min": 35, "vote_share_max": 45 }
                ]
            }],
            "overview": "概況"
        }),
        EntityKind::Block => json!({
            "block_id": "mock",
            "block_name": "モック",
            "seats_total": 6,
            "party_seats": { "ldp": 3, "chudou": 2, "ishin": 1 },
            "analysis": "分析"
        }),
    }
}

#[derive(Default)]
struct CallLog {
    search: AtomicUsize,
    sentiment: AtomicUsize,
    extraction: AtomicUsize,
    auxiliary_tool: AtomicUsize,
    searches_in_flight: AtomicUsize,
    peak_searches: AtomicUsize,
    extraction_prompts: Mutex<Vec<String>>,
}

/// Mock client for testing: serves every stage from preconfigured data.
///
/// Failures and payload overrides are keyed by a marker substring of the
/// prompt (an entity name appears in all of its prompts).
pub struct MockClient {
    payloads: HashMap<EntityKind, String>,
    extraction_overrides: Vec<(String, String)>,
    search_failures: Vec<(String, StageError)>,
    sentiment_failures: Vec<(String, StageError)>,
    latency: Duration,
    calls: CallLog,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    pub const SEARCH_REPORT: &'static str = "mock search report";
    pub const SENTIMENT_REPORT: &'static str = "mock sentiment report";
    pub const CITATION: &'static str = "https://example.com/mock-citation";

    /// Every stage succeeds; extraction returns [`sample_payload`] per kind.
    pub fn new() -> Self {
        let payloads = [EntityKind::National, EntityKind::Regional, EntityKind::Block]
            .into_iter()
            .map(|kind| (kind, sample_payload(kind).to_string()))
            .collect();
        Self {
            payloads,
            extraction_overrides: Vec::new(),
            search_failures: Vec::new(),
            sentiment_failures: Vec::new(),
            latency: Duration::ZERO,
            calls: CallLog::default(),
        }
    }

    /// Replace the default extraction payload for a kind.
    pub fn with_extraction_payload(mut self, kind: EntityKind, raw: impl Into<String>) -> Self {
        self.payloads.insert(kind, raw.into());
        self
    }

    /// Return `raw` from extraction when the prompt contains `marker`.
    pub fn with_extraction_override(
        mut self,
        marker: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        self.extraction_overrides.push((marker.into(), raw.into()));
        self
    }

    /// Fail the search stage when the prompt contains `marker`.
    pub fn fail_search_when(mut self, marker: impl Into<String>, error: StageError) -> Self {
        self.search_failures.push((marker.into(), error));
        self
    }

    /// Fail the search stage with an HTTP status when the prompt contains `marker`.
    pub fn fail_search_with_status(self, marker: impl Into<String>, status: u16) -> Self {
        self.fail_search_when(marker, StageError::http("Mock search", status, "mock failure"))
    }

    /// Fail the sentiment stage when the prompt contains `marker`.
    pub fn fail_sentiment_when(mut self, marker: impl Into<String>, error: StageError) -> Self {
        self.sentiment_failures.push((marker.into(), error));
        self
    }

    /// Delay each search and sentiment call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.calls.search.load(Ordering::SeqCst)
    }

    pub fn sentiment_calls(&self) -> usize {
        self.calls.sentiment.load(Ordering::SeqCst)
    }

    pub fn extraction_calls(&self) -> usize {
        self.calls.extraction.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.sentiment_calls() + self.extraction_calls()
    }

    /// Sentiment calls that asked for the auxiliary tool
    pub fn auxiliary_tool_requests(&self) -> usize {
        self.calls.auxiliary_tool.load(Ordering::SeqCst)
    }

    /// Highest number of search calls observed in flight at once
    pub fn peak_concurrent_searches(&self) -> usize {
        self.calls.peak_searches.load(Ordering::SeqCst)
    }

    /// Every prompt the extraction stage received, in call order
    pub fn extraction_prompts(&self) -> Vec<String> {
        self.calls
            .extraction_prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn failure_for(failures: &[(String, StageError)], prompt: &str) -> Option<StageError> {
        failures
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, err)| err.clone())
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl SearchClient for MockClient {
    async fn search(&self, prompt: &str) -> Result<SearchResponse, StageError> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.calls.searches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.peak_searches.fetch_max(in_flight, Ordering::SeqCst);

        self.simulate_latency().await;
        self.calls.searches_in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = Self::failure_for(&self.search_failures, prompt) {
            return Err(err);
        }
        Ok(SearchResponse {
            content: Self::SEARCH_REPORT.to_string(),
            citations: vec![Self::CITATION.to_string()],
        })
    }
}

#[async_trait]
impl SentimentClient for MockClient {
    async fn analyze(
        &self,
        prompt: &str,
        enable_auxiliary_tool: bool,
    ) -> Result<SentimentResponse, StageError> {
        self.calls.sentiment.fetch_add(1, Ordering::SeqCst);
        if enable_auxiliary_tool {
            self.calls.auxiliary_tool.fetch_add(1, Ordering::SeqCst);
        }
        self.simulate_latency().await;

        if let Some(err) = Self::failure_for(&self.sentiment_failures, prompt) {
            return Err(err);
        }
        Ok(SentimentResponse {
            content: Self::SENTIMENT_REPORT.to_string(),
        })
    }
}

#[async_trait]
impl ExtractionClient for MockClient {
    async fn extract(&self, prompt: &str, schema: &OutputSchema) -> Result<Forecast, StageError> {
        self.calls.extraction.fetch_add(1, Ordering::SeqCst);
        self.calls
            .extraction_prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());

        let raw = self
            .extraction_overrides
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, raw)| raw.as_str())
            .or_else(|| self.payloads.get(&schema.kind()).map(String::as_str))
            .ok_or_else(|| StageError::Unavailable {
                status: None,
                message: format!("no mock payload for {} extraction", schema.kind()),
            })?;

        Ok(schema.validate(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_mock_serves_every_stage() {
        let mock = MockClient::new();
        let search = mock.search("東京都").await.unwrap();
        assert_eq!(search.content, MockClient::SEARCH_REPORT);
        assert_eq!(search.citations, vec![MockClient::CITATION.to_string()]);

        let sentiment = mock.analyze("東京都", true).await.unwrap();
        assert_eq!(sentiment.content, MockClient::SENTIMENT_REPORT);

        for kind in [EntityKind::National, EntityKind::Regional, EntityKind::Block] {
            let forecast = mock.extract("p", &OutputSchema::for_kind(kind)).await.unwrap();
            assert_eq!(forecast.kind(), kind);
        }

        assert_eq!(mock.total_calls(), 5);
        assert_eq!(mock.auxiliary_tool_requests(), 1);
    }

    #[tokio::test]
    async fn failures_match_by_marker() {
        let mock = MockClient::new().fail_search_with_status("大阪府", 500);
        let err = mock.search("大阪府の情勢").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(mock.search("京都府の情勢").await.is_ok());
        assert_eq!(mock.search_calls(), 2);
    }

    #[tokio::test]
    async fn overrides_pass_through_validation() {
        let mock = MockClient::new().with_extraction_override("壊れた", "{not json");
        let schema = OutputSchema::for_kind(EntityKind::Block);
        let err = mock.extract("壊れたブロック", &schema).await.unwrap_err();
        assert!(matches!(err, StageError::Malformed(_)));
        assert_eq!(mock.extraction_prompts(), vec!["壊れたブロック".to_string()]);
    }
}
