//! Persistence for finished runs
//!
//! The orchestrator only sees the `ResultSink` trait. `SqliteSink` is the
//! implementation, and also answers the read-side queries (latest predictions,
//! update logs, aggregated seat projection).

mod sqlite;
mod traits;

pub use sqlite::SqliteSink;
pub use traits::{
    OpenSink, ResultSink, RunId, SeatProjection, StorageError, StorageResult, StoredPrediction,
    UpdateLog, UpdateStatus,
};
