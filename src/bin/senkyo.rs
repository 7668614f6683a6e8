//! Senkyo CLI: election forecast runs and stored results.
//!
//! Usage:
//!   senkyo run [--concurrency N] [--no-x-search] [--no-save] [--db path]
//!   senkyo region <id>... [--no-x-search] [--db path]
//!   senkyo block <id>... [--no-x-search] [--db path]
//!   senkyo runs | seats | show <kind> <id> | schema <kind>

use clap::{Parser, Subcommand};
use senkyo::analysis::RunProgress;
use senkyo::data::EntityKind;
use senkyo::{
    Catalog, EntityAnalyzer, ForecastConfig, OpenSink, ProgressObserver, ResultSink,
    RunOrchestrator, RunResult, SchemaSet, SqliteSink, StageClients,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(
    name = "senkyo",
    version,
    about = "Election forecast pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Keep the sentiment stage from searching X posts
    #[arg(long, global = true)]
    no_x_search: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the national situation, every prefecture and every block
    Run {
        /// Concurrent entity analyses (overrides SENKYO_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print the result without saving it
        #[arg(long)]
        no_save: bool,
    },
    /// Analyze the given prefectures only
    Region {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Analyze the given proportional blocks only
    Block {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List recent update logs
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the aggregated seat projection
    Seats,
    /// Print the latest stored forecast for one entity
    Show {
        /// national, regional or block
        kind: EntityKind,
        id: String,
    },
    /// Print the output schema sent to the extraction stage
    Schema {
        /// national, regional or block
        kind: EntityKind,
    },
}

/// Get the default database path (~/.local/share/senkyo/senkyo.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("senkyo").join("senkyo.db")
}

fn open_sink(db: Option<PathBuf>) -> Result<SqliteSink, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteSink::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn build_orchestrator(
    config: &ForecastConfig,
    x_search: bool,
) -> Result<RunOrchestrator, String> {
    let clients = StageClients::from_config(config)
        .map_err(|e| format!("Failed to build API clients: {}", e))?;
    let analyzer = EntityAnalyzer::new(Arc::new(Catalog::builtin()), clients)
        .with_auxiliary_tool(x_search);
    Ok(RunOrchestrator::new(analyzer).with_concurrency(config.concurrency))
}

fn load_config(concurrency: Option<usize>) -> Result<ForecastConfig, String> {
    let config = ForecastConfig::from_env().map_err(|e| format!("Configuration error: {}", e))?;
    Ok(match concurrency {
        Some(limit) => config.with_concurrency(limit),
        None => config,
    })
}

fn log_observer() -> Arc<dyn ProgressObserver> {
    Arc::new(|progress: &RunProgress| {
        info!(
            "[{}] {}/{} - {}",
            progress.phase,
            progress.completed,
            progress.total,
            progress.current_item.as_deref().unwrap_or("")
        );
    })
}

fn print_result(result: &RunResult) {
    println!("{}", result.summary());
    for error in &result.errors {
        println!("  error: {}", error);
    }
}

fn save(sink: &SqliteSink, result: &RunResult) -> i32 {
    match sink.save_run(result) {
        Ok(run_id) => {
            println!("Saved run {}", run_id);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to save run: {}", e);
            1
        }
    }
}

async fn cmd_run(
    db: Option<PathBuf>,
    concurrency: Option<usize>,
    x_search: bool,
    no_save: bool,
) -> Result<i32, String> {
    let config = load_config(concurrency)?;
    let orchestrator = build_orchestrator(&config, x_search)?;

    if no_save {
        let result = orchestrator.run(Some(log_observer())).await;
        print_result(&result);
        return Ok(0);
    }

    let sink = open_sink(db)?;
    let (result, saved) = orchestrator.run_and_save(&sink, Some(log_observer())).await;
    print_result(&result);
    match saved {
        Ok(run_id) => {
            println!("Saved run {}", run_id);
            Ok(0)
        }
        Err(e) => Err(format!("failed to save run: {}", e)),
    }
}

async fn cmd_partial(
    db: Option<PathBuf>,
    kind: EntityKind,
    ids: &[String],
    x_search: bool,
) -> Result<i32, String> {
    let config = load_config(None)?;
    let orchestrator = build_orchestrator(&config, x_search)?;
    let sink = open_sink(db)?;

    let report = match kind {
        EntityKind::Block => orchestrator.run_blocks(ids, Some(log_observer())).await,
        _ => orchestrator.run_regions(ids, Some(log_observer())).await,
    }
    .map_err(|e| e.to_string())?;

    let result = RunResult::from(report);
    print_result(&result);
    Ok(save(&sink, &result))
}

fn cmd_runs(db: Option<PathBuf>, limit: usize) -> Result<i32, String> {
    let sink = open_sink(db)?;
    let logs = sink.update_logs(limit).map_err(|e| e.to_string())?;
    if logs.is_empty() {
        println!("No runs recorded");
        return Ok(0);
    }
    for log in logs {
        println!(
            "{}  {:<9}  {}  api calls: {}  errors: {}",
            log.run_id,
            log.status.as_str(),
            log.started_at.format("%Y-%m-%d %H:%M:%S"),
            log.api_calls,
            log.errors.len()
        );
    }
    Ok(0)
}

fn cmd_seats(db: Option<PathBuf>) -> Result<i32, String> {
    let sink = open_sink(db)?;
    let projection = sink.seat_projection().map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&projection).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(0)
}

fn cmd_show(db: Option<PathBuf>, kind: EntityKind, id: &str) -> Result<i32, String> {
    let sink = open_sink(db)?;
    match sink.latest_prediction(kind, id).map_err(|e| e.to_string())? {
        Some(prediction) => {
            let json = serde_json::to_string_pretty(&prediction).map_err(|e| e.to_string())?;
            println!("{}", json);
            Ok(0)
        }
        None => {
            eprintln!("No prediction stored for {}:{}", kind, id);
            Ok(1)
        }
    }
}

fn cmd_schema(kind: EntityKind) -> Result<i32, String> {
    let schemas = SchemaSet::new();
    let json = serde_json::to_string_pretty(schemas.get(kind).description())
        .map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(0)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let x_search = !cli.no_x_search;
    let outcome = match cli.command {
        Commands::Run {
            concurrency,
            no_save,
        } => cmd_run(cli.db, concurrency, x_search, no_save).await,
        Commands::Region { ids } => {
            cmd_partial(cli.db, EntityKind::Regional, &ids, x_search).await
        }
        Commands::Block { ids } => cmd_partial(cli.db, EntityKind::Block, &ids, x_search).await,
        Commands::Runs { limit } => cmd_runs(cli.db, limit),
        Commands::Seats => cmd_seats(cli.db),
        Commands::Show { kind, id } => cmd_show(cli.db, kind, &id),
        Commands::Schema { kind } => cmd_schema(kind),
    };

    let code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_search_is_on_unless_disabled() {
        let cli = Cli::try_parse_from(["senkyo", "run"]).unwrap();
        assert!(!cli.no_x_search);

        let cli = Cli::try_parse_from(["senkyo", "region", "tokyo"]).unwrap();
        assert!(!cli.no_x_search);

        let cli = Cli::try_parse_from(["senkyo", "block", "kinki", "--no-x-search"]).unwrap();
        assert!(cli.no_x_search);
        assert!(matches!(cli.command, Commands::Block { ref ids } if ids == &["kinki"]));
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from(["senkyo", "--no-x-search", "run", "--concurrency", "2", "--no-save"])
            .unwrap();
        assert!(cli.no_x_search);
        assert!(matches!(
            cli.command,
            Commands::Run {
                concurrency: Some(2),
                no_save: true
            }
        ));
    }
}
