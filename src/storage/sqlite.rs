//! SQLite result sink
//!
//! Two tables: `update_logs` (one row per saved run) and `predictions` (one
//! row per successful entity analysis). Thread-safe via an internal mutex on
//! the connection.

use super::traits::{
    OpenSink, ResultSink, RunId, SeatProjection, StorageError, StorageResult, StoredPrediction,
    UpdateLog, UpdateStatus,
};
use crate::analysis::{EntityAnalysis, RunResult};
use crate::data::EntityKind;
use crate::forecast::{BlockForecast, RegionalForecast};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

const PREDICTION_COLUMNS: &str =
    "run_id, kind, target_id, search_raw, citations_json, sentiment_raw, forecast_json, created_at";

pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS update_logs (
                run_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                api_calls INTEGER NOT NULL,
                duration_secs INTEGER,
                errors_json TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS predictions (
                run_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                target_id TEXT NOT NULL,
                search_raw TEXT NOT NULL,
                citations_json TEXT NOT NULL,
                sentiment_raw TEXT NOT NULL,
                forecast_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (run_id, kind, target_id),
                FOREIGN KEY (run_id) REFERENCES update_logs(run_id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_predictions_target
                ON predictions(kind, target_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_update_logs_started
                ON update_logs(started_at);

            PRAGMA foreign_keys = ON;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn insert_log(&self, run_id: &RunId, result: &RunResult) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO update_logs (run_id, status, started_at, api_calls) VALUES (?1, ?2, ?3, ?4)",
            params![
                run_id.as_str(),
                UpdateStatus::Running.as_str(),
                result.started_at.to_rfc3339(),
                result.total_api_calls,
            ],
        )?;
        Ok(())
    }

    fn insert_prediction(&self, run_id: &RunId, analysis: &EntityAnalysis) -> StorageResult<()> {
        let citations_json = serde_json::to_string(&analysis.search.citations)?;
        let forecast_json = serde_json::to_string(&analysis.forecast)?;
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO predictions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                PREDICTION_COLUMNS
            ),
            params![
                run_id.as_str(),
                analysis.key.kind.as_str(),
                analysis.key.id,
                analysis.search.content,
                citations_json,
                analysis.sentiment.content,
                forecast_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn finish_log(
        &self,
        run_id: &RunId,
        status: UpdateStatus,
        duration_secs: Option<u64>,
        errors: &[String],
    ) -> StorageResult<()> {
        let errors_json = serde_json::to_string(errors)?;
        let conn = self.conn()?;
        conn.execute(
            "UPDATE update_logs SET status = ?2, completed_at = ?3, duration_secs = ?4, errors_json = ?5
             WHERE run_id = ?1",
            params![
                run_id.as_str(),
                status.as_str(),
                Utc::now().to_rfc3339(),
                duration_secs.map(|d| d as i64),
                errors_json,
            ],
        )?;
        Ok(())
    }

    fn save_predictions(&self, run_id: &RunId, result: &RunResult) -> StorageResult<()> {
        for analysis in result.analyses() {
            self.insert_prediction(run_id, analysis)?;
            debug!(run = %run_id, entity = %analysis.key, "prediction saved");
        }
        Ok(())
    }

    /// Latest prediction for one entity
    pub fn latest_prediction(
        &self,
        kind: EntityKind,
        target_id: &str,
    ) -> StorageResult<Option<StoredPrediction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM predictions WHERE kind = ?1 AND target_id = ?2
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            PREDICTION_COLUMNS
        ))?;
        let raw = stmt
            .query_row(params![kind.as_str(), target_id], RawPrediction::from_row)
            .optional()?;
        raw.map(RawPrediction::decode).transpose()
    }

    /// Latest prediction of every target of one kind, ordered by target id
    pub fn latest_predictions(&self, kind: EntityKind) -> StorageResult<Vec<StoredPrediction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM predictions p
             WHERE p.kind = ?1 AND p.rowid = (
                 SELECT q.rowid FROM predictions q
                 WHERE q.kind = p.kind AND q.target_id = p.target_id
                 ORDER BY q.created_at DESC, q.rowid DESC LIMIT 1
             )
             ORDER BY p.target_id",
            PREDICTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![kind.as_str()], RawPrediction::from_row)?;

        let mut predictions = Vec::new();
        for row in rows {
            predictions.push(row?.decode()?);
        }
        Ok(predictions)
    }

    /// Most recent update logs first
    pub fn update_logs(&self, limit: usize) -> StorageResult<Vec<UpdateLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, status, started_at, completed_at, api_calls, duration_secs, errors_json
             FROM update_logs ORDER BY started_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut logs = Vec::new();
        for row in rows {
            let (run_id, status, started_at, completed_at, api_calls, duration, errors_json) = row?;
            logs.push(UpdateLog {
                run_id: RunId::from_string(run_id),
                status: status.parse()?,
                started_at: parse_timestamp(&started_at)?,
                completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
                api_calls,
                duration_secs: duration.map(|d| d.max(0) as u64),
                errors: serde_json::from_str(&errors_json)?,
            });
        }
        Ok(logs)
    }

    /// Seats per party from the latest regional and block predictions
    pub fn seat_projection(&self) -> StorageResult<SeatProjection> {
        let mut projection = SeatProjection {
            updated_at: self
                .latest_prediction(EntityKind::National, crate::data::NATIONAL_ID)?
                .map(|p| p.created_at),
            ..SeatProjection::default()
        };

        for stored in self.latest_predictions(EntityKind::Regional)? {
            let regional: RegionalForecast = serde_json::from_value(stored.forecast)?;
            for district in regional.districts {
                *projection
                    .district_seats
                    .entry(district.winner_party)
                    .or_insert(0) += 1;
            }
        }

        for stored in self.latest_predictions(EntityKind::Block)? {
            let block: BlockForecast = serde_json::from_value(stored.forecast)?;
            for (party, seats) in block.party_seats {
                *projection.proportional_seats.entry(party).or_insert(0.0) += seats;
            }
        }

        for (party, seats) in &projection.district_seats {
            *projection.total_seats.entry(party.clone()).or_insert(0.0) += f64::from(*seats);
        }
        for (party, seats) in &projection.proportional_seats {
            *projection.total_seats.entry(party.clone()).or_insert(0.0) += seats;
        }

        Ok(projection)
    }
}

impl OpenSink for SqliteSink {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl ResultSink for SqliteSink {
    fn save_run(&self, result: &RunResult) -> StorageResult<RunId> {
        let run_id = RunId::new();
        self.insert_log(&run_id, result)?;

        match self.save_predictions(&run_id, result) {
            Ok(()) => {
                self.finish_log(
                    &run_id,
                    UpdateStatus::Completed,
                    Some(result.duration.as_secs()),
                    &result.errors,
                )?;
                debug!(run = %run_id, saved = result.succeeded(), "run saved");
                Ok(run_id)
            }
            Err(e) => {
                warn!(run = %run_id, "saving predictions failed: {}", e);
                // Predictions already written stay; the log records the failure.
                if let Err(log_err) =
                    self.finish_log(&run_id, UpdateStatus::Failed, None, &[e.to_string()])
                {
                    warn!(run = %run_id, "could not mark run failed: {}", log_err);
                }
                Err(e)
            }
        }
    }
}

/// Column values before JSON and timestamp decoding
struct RawPrediction {
    run_id: String,
    kind: String,
    target_id: String,
    search_raw: String,
    citations_json: String,
    sentiment_raw: String,
    forecast_json: String,
    created_at: String,
}

impl RawPrediction {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            run_id: row.get(0)?,
            kind: row.get(1)?,
            target_id: row.get(2)?,
            search_raw: row.get(3)?,
            citations_json: row.get(4)?,
            sentiment_raw: row.get(5)?,
            forecast_json: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn decode(self) -> StorageResult<StoredPrediction> {
        Ok(StoredPrediction {
            run_id: RunId::from_string(self.run_id),
            kind: self.kind.parse().map_err(StorageError::InvalidValue)?,
            target_id: self.target_id,
            search_raw: self.search_raw,
            citations: serde_json::from_str(&self.citations_json)?,
            sentiment_raw: self.sentiment_raw,
            forecast: serde_json::from_str(&self.forecast_json)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EntityAnalysis;
    use crate::client::{sample_payload, SearchResponse, SentimentResponse};
    use crate::data::EntityKey;
    use crate::forecast::OutputSchema;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn analysis(key: EntityKey, payload: serde_json::Value) -> EntityAnalysis {
        let forecast = OutputSchema::for_kind(key.kind)
            .validate_value(payload)
            .unwrap();
        EntityAnalysis {
            name: key.id.clone(),
            key,
            search: SearchResponse {
                content: "検索".into(),
                citations: vec!["https://example.com/a".into()],
            },
            sentiment: SentimentResponse {
                content: "世論".into(),
            },
            forecast,
            api_calls: 3,
        }
    }

    fn regional(id: &str, winners: &[&str]) -> EntityAnalysis {
        let mut payload = sample_payload(EntityKind::Regional);
        let template = payload["districts"][0].clone();
        payload["prefecture_id"] = json!(id);
        payload["districts"] = json!(winners
            .iter()
            .map(|w| {
                let mut d = template.clone();
                d["winner_party"] = json!(w);
                d
            })
            .collect::<Vec<_>>());
        analysis(EntityKey::regional(id), payload)
    }

    fn block(id: &str, seats: serde_json::Value) -> EntityAnalysis {
        let mut payload = sample_payload(EntityKind::Block);
        payload["block_id"] = json!(id);
        payload["party_seats"] = seats;
        analysis(EntityKey::block(id), payload)
    }

    fn run_result() -> RunResult {
        let mut regions = BTreeMap::new();
        regions.insert("tottori".to_string(), regional("tottori", &["ldp", "ldp"]));
        regions.insert("tokyo".to_string(), regional("tokyo", &["chudou", "ldp", "ishin"]));
        let mut blocks = BTreeMap::new();
        blocks.insert("tokyo".to_string(), block("tokyo", json!({ "ldp": 6, "chudou": 5 })));
        blocks.insert("shikoku".to_string(), block("shikoku", json!({ "ldp": 4, "ishin": 2 })));

        RunResult {
            started_at: Utc::now(),
            national: Some(analysis(EntityKey::national(), sample_payload(EntityKind::National))),
            regions,
            blocks,
            total_api_calls: 15,
            errors: vec!["regional:osaka failed: search stage unavailable".into()],
            duration: Duration::from_secs(42),
        }
    }

    #[test]
    fn save_run_writes_log_and_predictions() {
        let sink = SqliteSink::open_in_memory().unwrap();
        let run_id = sink.save_run(&run_result()).unwrap();

        let logs = sink.update_logs(10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].run_id, run_id);
        assert_eq!(logs[0].status, UpdateStatus::Completed);
        assert_eq!(logs[0].api_calls, 15);
        assert_eq!(logs[0].duration_secs, Some(42));
        assert_eq!(logs[0].errors.len(), 1);
        assert!(logs[0].completed_at.is_some());

        let tokyo_region = sink
            .latest_prediction(EntityKind::Regional, "tokyo")
            .unwrap()
            .unwrap();
        assert_eq!(tokyo_region.run_id, run_id);
        assert_eq!(tokyo_region.citations, vec!["https://example.com/a".to_string()]);
        assert_eq!(tokyo_region.forecast["districts"].as_array().unwrap().len(), 3);

        let tokyo_block = sink.latest_prediction(EntityKind::Block, "tokyo").unwrap().unwrap();
        assert_eq!(tokyo_block.forecast["party_seats"]["chudou"], 5.0);

        assert!(sink.latest_prediction(EntityKind::Regional, "osaka").unwrap().is_none());
    }

    #[test]
    fn latest_predictions_prefer_newest_run() {
        let sink = SqliteSink::open_in_memory().unwrap();
        sink.save_run(&run_result()).unwrap();

        let mut newer = run_result();
        newer
            .regions
            .insert("tokyo".to_string(), regional("tokyo", &["dpfp"]));
        let newer_id = sink.save_run(&newer).unwrap();

        let latest = sink.latest_predictions(EntityKind::Regional).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].target_id, "tokyo");
        assert_eq!(latest[0].run_id, newer_id);
        assert_eq!(latest[1].target_id, "tottori");

        assert_eq!(sink.update_logs(1).unwrap()[0].run_id, newer_id);
    }

    #[test]
    fn seat_projection_aggregates_latest_predictions() {
        let sink = SqliteSink::open_in_memory().unwrap();
        sink.save_run(&run_result()).unwrap();

        let projection = sink.seat_projection().unwrap();
        assert_eq!(projection.district_seats["ldp"], 3);
        assert_eq!(projection.district_seats["chudou"], 1);
        assert_eq!(projection.district_seats["ishin"], 1);
        assert_eq!(projection.proportional_seats["ldp"], 10.0);
        assert_eq!(projection.total_seats["ldp"], 13.0);
        assert_eq!(projection.total_seats["ishin"], 3.0);
        assert!(projection.updated_at.is_some());
    }

    #[test]
    fn failed_save_keeps_earlier_rows_and_marks_log_failed() {
        let sink = SqliteSink::open_in_memory().unwrap();
        sink.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_tottori BEFORE INSERT ON predictions
                 WHEN NEW.target_id = 'tottori'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        // Saved in order: national, regions (tokyo, tottori), blocks.
        let err = sink.save_run(&run_result()).unwrap_err();
        assert!(matches!(err, StorageError::Database(_)));
        assert!(err.to_string().contains("rejected"), "{}", err);

        let logs = sink.update_logs(10).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, UpdateStatus::Failed);
        assert_eq!(logs[0].errors, vec![err.to_string()]);
        assert!(logs[0].completed_at.is_some());
        assert_eq!(logs[0].duration_secs, None);

        assert!(sink
            .latest_prediction(EntityKind::National, crate::data::NATIONAL_ID)
            .unwrap()
            .is_some());
        assert!(sink.latest_prediction(EntityKind::Regional, "tokyo").unwrap().is_some());
        assert!(sink.latest_prediction(EntityKind::Regional, "tottori").unwrap().is_none());
        assert!(sink.latest_predictions(EntityKind::Block).unwrap().is_empty());
    }

    #[test]
    fn empty_store_projects_nothing() {
        let sink = SqliteSink::open_in_memory().unwrap();
        let projection = sink.seat_projection().unwrap();
        assert!(projection.total_seats.is_empty());
        assert!(projection.updated_at.is_none());
        assert!(sink.update_logs(5).unwrap().is_empty());
    }
}
