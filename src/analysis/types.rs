//! Core types for the analysis pipeline

use crate::client::{SearchResponse, SentimentResponse, StageError};
use crate::data::EntityKey;
use crate::forecast::Forecast;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// External calls one successful entity analysis consumes
pub const CALLS_PER_ENTITY: u32 = 3;

/// One of the three ordered steps of an entity analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Search,
    Sentiment,
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Search => "search",
            Self::Sentiment => "sentiment",
            Self::Extraction => "extraction",
        })
    }
}

/// Why one entity's analysis did not complete
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityKey),

    #[error("{stage} stage unavailable: {message}")]
    StageUnavailable {
        stage: Stage,
        status: Option<u16>,
        message: String,
    },

    #[error("{stage} stage returned malformed output: {message}")]
    MalformedOutput { stage: Stage, message: String },

    #[error("schema violation: {0}")]
    SchemaViolation(String),
}

impl AnalysisError {
    /// Tag a stage client error with the stage it came from.
    pub fn from_stage(stage: Stage, err: StageError) -> Self {
        match err {
            StageError::Unavailable { status, message } => Self::StageUnavailable {
                stage,
                status,
                message,
            },
            StageError::Malformed(message) => Self::MalformedOutput { stage, message },
            StageError::SchemaViolation(message) => Self::SchemaViolation(message),
        }
    }
}

/// Everything one entity's three stages produced
#[derive(Debug, Clone, Serialize)]
pub struct EntityAnalysis {
    pub key: EntityKey,
    /// Display name (prefecture or block name, or the national label)
    pub name: String,
    pub search: SearchResponse,
    pub sentiment: SentimentResponse,
    pub forecast: Forecast,
    pub api_calls: u32,
}

/// Run state machine: strictly `National → Regional → Block → Complete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    National,
    Regional,
    Block,
    Complete,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::National => "national",
            Self::Regional => "regional",
            Self::Block => "block",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot handed to progress observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunProgress {
    pub phase: RunPhase,
    pub completed: usize,
    pub total: usize,
    /// Errors accumulated so far in this run, in completion order
    pub errors: Vec<String>,
    /// Entity just processed (or the phase label at phase start)
    pub current_item: Option<String>,
}

impl RunProgress {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::National,
            completed: 0,
            total: 0,
            errors: Vec::new(),
            current_item: None,
        }
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a partial run over an explicit set of regions or blocks
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: RunPhase,
    pub started_at: DateTime<Utc>,
    pub results: BTreeMap<String, EntityAnalysis>,
    pub errors: Vec<String>,
    pub api_calls: u32,
    pub duration: Duration,
}

/// Aggregate of one full run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub started_at: DateTime<Utc>,
    pub national: Option<EntityAnalysis>,
    pub regions: BTreeMap<String, EntityAnalysis>,
    pub blocks: BTreeMap<String, EntityAnalysis>,
    pub total_api_calls: u32,
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl RunResult {
    /// Every successful analysis: national, then regions, then blocks
    pub fn analyses(&self) -> impl Iterator<Item = &EntityAnalysis> {
        self.national
            .iter()
            .chain(self.regions.values())
            .chain(self.blocks.values())
    }

    pub fn succeeded(&self) -> usize {
        self.analyses().count()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            api_calls: self.total_api_calls,
            duration_ms: self.duration.as_millis() as u64,
            errors: self.errors.len(),
            national: self.national.is_some(),
            regions: self.regions.len(),
            blocks: self.blocks.len(),
        }
    }
}

impl From<PhaseReport> for RunResult {
    fn from(report: PhaseReport) -> Self {
        let (regions, blocks) = match report.phase {
            RunPhase::Block => (BTreeMap::new(), report.results),
            _ => (report.results, BTreeMap::new()),
        };
        Self {
            started_at: report.started_at,
            national: None,
            regions,
            blocks,
            total_api_calls: report.api_calls,
            errors: report.errors,
            duration: report.duration,
        }
    }
}

/// Counts for reporting a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub api_calls: u32,
    pub duration_ms: u64,
    pub errors: usize,
    pub national: bool,
    pub regions: usize,
    pub blocks: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "national: {}, regions: {}, blocks: {}, api calls: {}, errors: {}, duration: {}ms",
            if self.national { "ok" } else { "missing" },
            self.regions,
            self.blocks,
            self.api_calls,
            self.errors,
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_are_tagged() {
        let err = AnalysisError::from_stage(
            Stage::Search,
            StageError::http("Perplexity", 500, "boom"),
        );
        assert_eq!(
            err,
            AnalysisError::StageUnavailable {
                stage: Stage::Search,
                status: Some(500),
                message: "Perplexity API error: 500 - boom".into(),
            }
        );
        assert!(err.to_string().starts_with("search stage unavailable"));

        let err = AnalysisError::from_stage(
            Stage::Extraction,
            StageError::SchemaViolation("missing field `overview`".into()),
        );
        assert!(matches!(err, AnalysisError::SchemaViolation(_)));
    }

    #[test]
    fn unknown_entity_names_the_key() {
        let err = AnalysisError::UnknownEntity(EntityKey::regional("atlantis"));
        assert_eq!(err.to_string(), "unknown entity regional:atlantis");
    }

    #[test]
    fn block_report_converts_into_block_results() {
        let report = PhaseReport {
            phase: RunPhase::Block,
            started_at: Utc::now(),
            results: BTreeMap::new(),
            errors: vec!["block:tokyo failed: x".into()],
            api_calls: 0,
            duration: Duration::from_millis(12),
        };
        let result = RunResult::from(report);
        assert!(result.national.is_none());
        assert!(result.has_errors());

        let summary = result.summary();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.duration_ms, 12);
        assert!(summary.to_string().contains("national: missing"));
    }
}
