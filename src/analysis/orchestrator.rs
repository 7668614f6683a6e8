//! Run orchestrator: national, then regional, then block analyses
//!
//! The national analysis runs alone, outside the gate. Regional and block
//! analyses are admitted through one [`ConcurrencyGate`] per run; a phase
//! only starts once every analysis of the previous phase has settled.
//! Entity failures are recorded as error strings and never stop the run.

use super::analyzer::EntityAnalyzer;
use super::gate::ConcurrencyGate;
use super::progress::{ProgressAggregator, ProgressHandle, ProgressObserver};
use super::types::{AnalysisError, EntityAnalysis, PhaseReport, RunPhase, RunResult};
use crate::data::{EntityKey, EntityKind, NATIONAL_LABEL};
use crate::storage::{ResultSink, RunId, StorageResult};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Concurrent entity analyses admitted by default
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Drives a full forecast run, or a partial run over chosen entities.
///
/// Each run gets a fresh [`ConcurrencyGate`] and progress aggregator.
pub struct RunOrchestrator {
    analyzer: Arc<EntityAnalyzer>,
    concurrency: usize,
}

/// Successes of one fanned-out phase
struct PhaseOutcome {
    results: BTreeMap<String, EntityAnalysis>,
    api_calls: u32,
}

impl RunOrchestrator {
    /// Create a new orchestrator with default settings
    pub fn new(analyzer: EntityAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Create with a specific concurrency limit
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Entity analyses admitted at once in the regional and block phases
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The analyzer every entity is run through
    pub fn analyzer(&self) -> &EntityAnalyzer {
        &self.analyzer
    }

    /// Analyze every entity in the catalog.
    pub async fn run(&self, observer: Option<Arc<dyn ProgressObserver>>) -> RunResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        let gate = ConcurrencyGate::new(self.concurrency);
        let (progress, progress_task) = ProgressAggregator::new(observer).spawn();

        let catalog = self.analyzer.catalog();
        let regional_keys: Vec<EntityKey> = catalog
            .prefecture_ids()
            .into_iter()
            .map(EntityKey::regional)
            .collect();
        let block_keys: Vec<EntityKey> = catalog
            .block_ids()
            .into_iter()
            .map(EntityKey::block)
            .collect();
        let grand_total = 1 + regional_keys.len() + block_keys.len();

        info!(
            regions = regional_keys.len(),
            blocks = block_keys.len(),
            concurrency = gate.limit(),
            "starting forecast run"
        );

        // National
        progress.phase_started(RunPhase::National, 1, Some(NATIONAL_LABEL.to_string()));
        let national_key = EntityKey::national();
        let national = match self.analyzer.analyze(&national_key).await {
            Ok(analysis) => {
                progress.entity_completed(NATIONAL_LABEL, None);
                Some(analysis)
            }
            Err(e) => {
                warn!(entity = %national_key, error = %e, "national analysis failed");
                progress.entity_completed(NATIONAL_LABEL, Some(failure_message(&national_key, &e)));
                None
            }
        };
        info!(ok = national.is_some(), "national phase complete");

        let regional = self
            .run_phase(RunPhase::Regional, regional_keys, &gate, &progress)
            .await;
        let blocks = self
            .run_phase(RunPhase::Block, block_keys, &gate, &progress)
            .await;

        progress.finished(grand_total);
        drop(progress);
        let totals = progress_task.finish().await;

        let total_api_calls = national.as_ref().map_or(0, |n| n.api_calls)
            + regional.api_calls
            + blocks.api_calls;
        let result = RunResult {
            started_at,
            national,
            regions: regional.results,
            blocks: blocks.results,
            total_api_calls,
            errors: totals.errors,
            duration: clock.elapsed(),
        };

        info!(
            api_calls = result.total_api_calls,
            errors = result.errors.len(),
            duration_ms = result.duration.as_millis() as u64,
            peak_in_flight = gate.peak(),
            "forecast run complete"
        );
        result
    }

    /// Run, then hand the result to `sink`.
    ///
    /// The result is returned whether or not saving succeeded.
    pub async fn run_and_save<S>(
        &self,
        sink: &S,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> (RunResult, StorageResult<RunId>)
    where
        S: ResultSink + ?Sized,
    {
        let result = self.run(observer).await;
        let saved = sink.save_run(&result);
        if let Err(e) = &saved {
            error!("failed to save run: {}", e);
        }
        (result, saved)
    }

    /// Analyze an explicit set of prefectures.
    pub async fn run_regions(
        &self,
        ids: &[String],
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<PhaseReport, AnalysisError> {
        self.run_subset(EntityKind::Regional, ids, observer).await
    }

    /// Analyze an explicit set of proportional blocks.
    pub async fn run_blocks(
        &self,
        ids: &[String],
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<PhaseReport, AnalysisError> {
        self.run_subset(EntityKind::Block, ids, observer).await
    }

    async fn run_subset(
        &self,
        kind: EntityKind,
        ids: &[String],
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<PhaseReport, AnalysisError> {
        let (phase, keys) = self.subset_keys(kind, ids)?;

        let started_at = Utc::now();
        let clock = Instant::now();
        let gate = ConcurrencyGate::new(self.concurrency);
        let (progress, progress_task) = ProgressAggregator::new(observer).spawn();

        let total = keys.len();
        let outcome = self.run_phase(phase, keys, &gate, &progress).await;
        progress.finished(total);
        drop(progress);
        let totals = progress_task.finish().await;

        Ok(PhaseReport {
            phase,
            started_at,
            results: outcome.results,
            errors: totals.errors,
            api_calls: outcome.api_calls,
            duration: clock.elapsed(),
        })
    }

    /// Validate ids up front; duplicates collapse to one.
    fn subset_keys(
        &self,
        kind: EntityKind,
        ids: &[String],
    ) -> Result<(RunPhase, Vec<EntityKey>), AnalysisError> {
        let catalog = self.analyzer.catalog();
        let phase = match kind {
            EntityKind::Regional => RunPhase::Regional,
            EntityKind::Block => RunPhase::Block,
            EntityKind::National => {
                return Err(AnalysisError::UnknownEntity(EntityKey::national()));
            }
        };

        let mut seen = BTreeSet::new();
        let mut keys = Vec::new();
        for id in ids {
            let key = EntityKey {
                kind,
                id: id.clone(),
            };
            let known = match kind {
                EntityKind::Regional => catalog.prefecture(id).is_some(),
                _ => catalog.block(id).is_some(),
            };
            if !known {
                return Err(AnalysisError::UnknownEntity(key));
            }
            if seen.insert(id.as_str()) {
                keys.push(key);
            }
        }
        Ok((phase, keys))
    }

    /// Fan `keys` out through the gate and wait for all of them.
    ///
    /// Each key is admitted before its task is spawned, so admission follows
    /// the order of `keys`.
    async fn run_phase(
        &self,
        phase: RunPhase,
        keys: Vec<EntityKey>,
        gate: &ConcurrencyGate,
        progress: &ProgressHandle,
    ) -> PhaseOutcome {
        info!(phase = %phase, entities = keys.len(), "phase started");
        progress.phase_started(phase, keys.len(), None);

        let mut pending: BTreeSet<EntityKey> = BTreeSet::new();
        let mut tasks = JoinSet::new();

        for key in keys {
            let permit = match gate.admit().await {
                Ok(permit) => permit,
                Err(e) => {
                    progress.entity_completed(key.id.clone(), Some(format!("{} failed: {}", key, e)));
                    continue;
                }
            };
            pending.insert(key.clone());

            let analyzer = self.analyzer.clone();
            let progress = progress.clone();
            tasks.spawn(async move {
                let outcome = analyzer.analyze(&key).await;
                drop(permit);
                match &outcome {
                    Ok(_) => progress.entity_completed(key.id.clone(), None),
                    Err(e) => {
                        warn!(entity = %key, error = %e, "entity analysis failed");
                        progress.entity_completed(key.id.clone(), Some(failure_message(&key, e)));
                    }
                }
                (key, outcome)
            });
        }

        let mut outcome = PhaseOutcome {
            results: BTreeMap::new(),
            api_calls: 0,
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, result)) => {
                    pending.remove(&key);
                    if let Ok(analysis) = result {
                        outcome.api_calls += analysis.api_calls;
                        outcome.results.insert(key.id, analysis);
                    }
                }
                Err(e) => error!(phase = %phase, "entity task died: {}", e),
            }
        }

        // Tasks that died never reported; record them here.
        for key in pending {
            progress.entity_completed(
                key.id.clone(),
                Some(format!("{} failed: analysis task aborted", key)),
            );
        }

        info!(
            phase = %phase,
            succeeded = outcome.results.len(),
            "phase complete"
        );
        outcome
    }
}

fn failure_message(key: &EntityKey, err: &AnalysisError) -> String {
    format!("{} failed: {}", key, err)
}
