//! Forecast analysis pipeline
//!
//! # Architecture
//!
//! - **EntityAnalyzer**: runs the three stages for one entity (search and
//!   sentiment concurrently, then extraction over both reports)
//! - **ConcurrencyGate**: fair admission limit shared by a run's regional and
//!   block phases
//! - **ProgressAggregator**: single consumer task that owns counters and the
//!   error list; entity tasks only send it events
//! - **RunOrchestrator**: national → regional → block, aggregating results
//!   into a [`RunResult`]
//!
//! # Example
//!
//! ```
//! use senkyo::analysis::{EntityAnalyzer, RunOrchestrator};
//! use senkyo::client::{MockClient, StageClients};
//! use senkyo::data::Catalog;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let clients = StageClients::from_mock(Arc::new(MockClient::new()));
//! let analyzer = EntityAnalyzer::new(Arc::new(Catalog::builtin()), clients);
//! let orchestrator = RunOrchestrator::new(analyzer).with_concurrency(5);
//!
//! let result = orchestrator.run(None).await;
//! assert!(result.errors.is_empty());
//! println!("{}", result.summary());
//! # });
//! ```

mod analyzer;
mod gate;
mod orchestrator;
mod progress;
mod types;

pub use analyzer::EntityAnalyzer;
pub use gate::{ConcurrencyGate, GateClosed, GatePermit};
pub use orchestrator::{RunOrchestrator, DEFAULT_CONCURRENCY};
pub use progress::{
    ProgressAggregator, ProgressEvent, ProgressHandle, ProgressObserver, ProgressTask,
    ProgressTotals,
};
pub use types::{
    AnalysisError, EntityAnalysis, PhaseReport, RunPhase, RunProgress, RunResult, RunSummary,
    Stage, CALLS_PER_ENTITY,
};
