//! Common test utilities for pipeline runs
//!
//! A reduced catalog (1 national, 3 prefectures, 2 blocks) and helpers for
//! wiring a [`MockClient`] into an orchestrator and recording progress.

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::{fixture_catalog, BLOCK_IDS, PREFECTURE_IDS};

use chrono::NaiveDate;
use senkyo::{
    EntityAnalyzer, MockClient, ProgressObserver, RunOrchestrator, RunProgress, StageClients,
};
use std::sync::{Arc, Mutex};

/// Entities in the fixture catalog
pub const FIXTURE_ENTITIES: usize = 1 + PREFECTURE_IDS.len() + BLOCK_IDS.len();

/// Marker that only appears in a prefecture's search and sentiment prompts
pub fn region_marker(prefecture_name: &str) -> String {
    format!("Region: {}", prefecture_name)
}

/// Marker that only appears in a prefecture's extraction prompt
pub fn region_extraction_marker(prefecture_name: &str) -> String {
    format!("JSON for {}", prefecture_name)
}

pub fn analyzer(mock: Arc<MockClient>) -> EntityAnalyzer {
    EntityAnalyzer::new(Arc::new(fixture_catalog()), StageClients::from_mock(mock))
        .with_date(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())
}

pub fn orchestrator(mock: MockClient, concurrency: usize) -> (RunOrchestrator, Arc<MockClient>) {
    let mock = Arc::new(mock);
    let orchestrator = RunOrchestrator::new(analyzer(mock.clone())).with_concurrency(concurrency);
    (orchestrator, mock)
}

/// Observer that keeps every snapshot it is handed
#[derive(Default)]
pub struct Recorder {
    seen: Mutex<Vec<RunProgress>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshots(&self) -> Vec<RunProgress> {
        self.seen.lock().unwrap().clone()
    }
}

impl ProgressObserver for Recorder {
    fn on_progress(&self, progress: &RunProgress) {
        self.seen.lock().unwrap().push(progress.clone());
    }
}
