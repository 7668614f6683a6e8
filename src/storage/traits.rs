//! Storage trait definitions

use crate::analysis::RunResult;
use crate::data::EntityKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Identifier of one saved run (UUID v4)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an update-log row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Running,
    Completed,
    Failed,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for UpdateStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(StorageError::InvalidValue(format!("update status '{}'", other))),
        }
    }
}

/// One row of the update log
#[derive(Debug, Clone, Serialize)]
pub struct UpdateLog {
    pub run_id: RunId,
    pub status: UpdateStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub api_calls: u32,
    pub duration_secs: Option<u64>,
    pub errors: Vec<String>,
}

/// A persisted entity prediction
#[derive(Debug, Clone, Serialize)]
pub struct StoredPrediction {
    pub run_id: RunId,
    pub kind: EntityKind,
    pub target_id: String,
    pub search_raw: String,
    pub citations: Vec<String>,
    pub sentiment_raw: String,
    /// Validated structured object as JSON
    pub forecast: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Seats per party aggregated from the latest predictions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeatProjection {
    /// Districts won, counted from regional winners
    pub district_seats: BTreeMap<String, u32>,
    /// Seats summed over proportional blocks
    pub proportional_seats: BTreeMap<String, f64>,
    pub total_seats: BTreeMap<String, f64>,
    /// When the latest national prediction was saved
    pub updated_at: Option<DateTime<Utc>>,
}

/// Persistence interface the orchestrator hands finished runs to.
///
/// Each entity prediction is committed on its own, so a failure partway
/// through leaves earlier saves intact.
pub trait ResultSink: Send + Sync {
    fn save_run(&self, result: &RunResult) -> StorageResult<RunId>;
}

/// Construction of file-backed or in-memory sinks
pub trait OpenSink: ResultSink + Sized {
    /// Open or create a sink at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory sink (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_uuids() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn update_status_round_trips_through_text() {
        for status in [UpdateStatus::Running, UpdateStatus::Completed, UpdateStatus::Failed] {
            assert_eq!(status.as_str().parse::<UpdateStatus>().unwrap(), status);
        }
        assert!("paused".parse::<UpdateStatus>().is_err());
    }
}
