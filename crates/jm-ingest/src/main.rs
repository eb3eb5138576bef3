use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use jm_common::db::{
    DbPoolError, MigrationError, UpsertError, create_pool_from_url_checked, resolve_database_url,
    run_migrations, upsert_listings,
};
use jm_common::ingest::{NewListing, dedupe_by_url};
use jm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use thiserror::Error;
use tracing::info;

const INGEST_POOL_SIZE: usize = 2;

#[derive(Debug, Parser)]
#[command(
    name = "jm-ingest",
    about = "Upsert scraped job listings (JSON array or JSON lines) into the record store"
)]
struct Cli {
    /// PostgreSQL connection string; falls back to the DB_* variables
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Listings file; reads stdin when omitted or `-`
    #[arg(long)]
    input: Option<PathBuf>,

    /// Parse and deduplicate without writing
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Error)]
enum IngestError {
    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid listing on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Pool(#[from] DbPoolError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Upsert(#[from] UpsertError),
}

/// A JSON array, or one listing object per non-blank line.
fn parse_listings(text: &str) -> Result<Vec<NewListing>, IngestError> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|source| IngestError::Parse {
            line: source.line(),
            source,
        });
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| IngestError::Parse {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

fn read_input(input: Option<&PathBuf>) -> Result<String, IngestError> {
    match input {
        Some(path) if path.as_os_str() != "-" => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

async fn run() -> Result<(), IngestError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let args = Cli::parse();
    let collected = parse_listings(&read_input(args.input.as_ref())?)?;
    let collected_count = collected.len();
    let rows = dedupe_by_url(collected);

    info!(
        collected = collected_count,
        deduped = rows.len(),
        dry_run = args.dry_run,
        "listings prepared"
    );
    if args.dry_run || rows.is_empty() {
        return Ok(());
    }

    let database_url = resolve_database_url(args.database_url)?;
    let pool = create_pool_from_url_checked(&database_url, INGEST_POOL_SIZE).await?;
    run_migrations(&pool).await?;

    let report = upsert_listings(&pool, &rows).await?;
    info!(
        collected = collected_count,
        deduped = rows.len(),
        upserted = report.upserted,
        failed = report.failed,
        "ingest finished"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("jm-ingest failed: {err}");
        std::process::exit(1);
    }
}
