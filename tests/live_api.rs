//! Live calls against the real stage services
//!
//! Needs PERPLEXITY_API_KEY, XAI_API_KEY and GEMINI_API_KEY in the environment.
//!
//! Run with: `cargo test --features live_api --test live_api -- --nocapture`

#![cfg(feature = "live_api")]

use senkyo::data::{EntityKey, EntityKind};
use senkyo::{Catalog, EntityAnalyzer, ForecastConfig, StageClients};
use std::sync::Arc;

fn live_analyzer() -> EntityAnalyzer {
    let config = ForecastConfig::from_env().expect("API keys must be set for live tests");
    let clients = StageClients::from_config(&config).expect("HTTP client");
    EntityAnalyzer::new(Arc::new(Catalog::builtin()), clients).with_auxiliary_tool(false)
}

#[tokio::test]
async fn live_block_analysis_produces_valid_forecast() {
    let analysis = live_analyzer()
        .analyze(&EntityKey::block("shikoku"))
        .await
        .expect("live analysis failed");

    assert_eq!(analysis.forecast.kind(), EntityKind::Block);
    assert!(!analysis.search.content.is_empty());
    let block = analysis.forecast.as_block().unwrap();
    println!(
        "shikoku: {} seats, allocated {:.1}, citations {}",
        block.seats_total,
        block.allocated_seats(),
        analysis.search.citations.len()
    );
}

#[tokio::test]
async fn live_regional_analysis_returns_districts() {
    let analysis = live_analyzer()
        .analyze(&EntityKey::regional("tottori"))
        .await
        .expect("live analysis failed");

    let regional = analysis.forecast.as_regional().unwrap();
    assert!(!regional.districts.is_empty());
    println!("tottori: {} districts forecast", regional.districts.len());
}
