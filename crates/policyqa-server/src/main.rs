//! PolicyQA: answers HR policy questions from stored regulation documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use policyqa_core::PolicyQaConfig;
use policyqa_server::{build_router, validate, AppState};
use policyqa_store::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("POLICYQA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn open_state(data_dir: &Path) -> anyhow::Result<AppState> {
    let config = PolicyQaConfig::from_env(data_dir)?;
    let store = SqliteStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    Ok(AppState::new(config, store))
}

fn print_help() {
    println!("PolicyQA — question answering over HR policy documents");
    println!();
    println!("Usage: policyqa [command]");
    println!();
    println!("Commands:");
    println!("  (none)                       Start the server");
    println!("  ask <question> [--summary]   Answer one question and print the JSON response");
    println!("  validate [data-dir]          Validate the block database");
    println!("  help                         Show this help message");
}

async fn run_ask(args: &[String]) -> anyhow::Result<()> {
    let summary = args.iter().any(|a| a == "--summary");
    let question = args
        .iter()
        .filter(|a| a.as_str() != "--summary")
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    if question.trim().is_empty() {
        eprintln!("Usage: policyqa ask <question> [--summary]");
        std::process::exit(1);
    }

    let state = open_state(&resolve_data_dir())?;
    let pipeline = state.pipeline();
    let response = if summary {
        pipeline.summarize(question.trim()).await?
    } else {
        pipeline.answer(question.trim()).await?
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "ask" => return run_ask(&args[2..]).await,
            "--validate" | "validate" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                let report = validate::validate(&data_dir);
                validate::print_report(&report);
                std::process::exit(if report.db_valid && report.errors.is_empty() { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'policyqa help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let state = Arc::new(open_state(&data_dir)?);
    let port = state.config.port;
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("PolicyQA server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
