//! Senkyo: election forecast pipeline
//!
//! Fans out three external stages per electoral unit (web search, social
//! sentiment, structured extraction) over the national situation, every
//! prefecture and every proportional block, then persists the validated
//! forecasts.
//!
//! # Core Concepts
//!
//! - **Entities**: analysis targets, keyed by kind and id ([`EntityKey`])
//! - **Stages**: search and sentiment run concurrently; extraction consumes both
//! - **Runs**: national → regional → block, bounded by a shared concurrency gate
//!
//! # Example
//!
//! ```
//! use senkyo::{Catalog, EntityAnalyzer, MockClient, RunOrchestrator, StageClients};
//! use std::sync::Arc;
//!
//! let clients = StageClients::from_mock(Arc::new(MockClient::new()));
//! let analyzer = EntityAnalyzer::new(Arc::new(Catalog::builtin()), clients);
//! let orchestrator = RunOrchestrator::new(analyzer).with_concurrency(3);
//! assert_eq!(orchestrator.concurrency(), 3);
//! ```

pub mod analysis;
pub mod client;
pub mod config;
pub mod data;
pub mod forecast;
pub mod prompt;
pub mod storage;

pub use analysis::{
    AnalysisError, EntityAnalysis, EntityAnalyzer, PhaseReport, ProgressObserver, RunOrchestrator,
    RunPhase, RunProgress, RunResult, RunSummary,
};
pub use client::{MockClient, StageClients, StageError};
pub use config::{ConfigError, ForecastConfig};
pub use data::{Catalog, EntityKey, EntityKind};
pub use forecast::{Forecast, OutputSchema, SchemaSet};
pub use storage::{OpenSink, ResultSink, RunId, SqliteSink, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
