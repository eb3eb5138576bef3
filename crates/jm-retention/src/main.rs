use chrono::{DateTime, Utc};
use clap::Parser;
use dotenvy::dotenv;
use jm_common::db::{
    PgPool, count_listings, count_listings_before, create_pool_from_url_checked,
    purge_listings_before, resolve_database_url, retention_cutoff,
};
use jm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use tracing::info;

const DEFAULT_KEEP_DAYS: i64 = 5;
const RETENTION_POOL_SIZE: usize = 2;

#[derive(Debug, Parser)]
#[command(
    name = "jm-retention",
    about = "Delete job listings posted before the retention window"
)]
struct Cli {
    /// PostgreSQL connection string; falls back to the DB_* variables
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Listings posted within this many days are kept
    #[arg(
        long,
        env = "JM_RETENTION_KEEP_DAYS",
        default_value_t = DEFAULT_KEEP_DAYS,
        allow_negative_numbers = true
    )]
    keep_days: i64,

    /// Count what would be deleted without deleting it
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RetentionReport {
    cutoff: DateTime<Utc>,
    expired: u64,
    deleted: u64,
    remaining: u64,
}

/// Delete is skipped when nothing is expired or on a dry run.
fn should_delete(expired: u64, dry_run: bool) -> bool {
    expired > 0 && !dry_run
}

async fn apply_retention(
    pool: &PgPool,
    now: DateTime<Utc>,
    keep_days: i64,
    dry_run: bool,
) -> Result<RetentionReport, Box<dyn std::error::Error>> {
    let cutoff = retention_cutoff(now, keep_days)?;
    let expired = count_listings_before(pool, cutoff).await?;

    let deleted = if should_delete(expired, dry_run) {
        purge_listings_before(pool, cutoff).await?
    } else {
        0
    };

    Ok(RetentionReport {
        cutoff,
        expired,
        deleted,
        remaining: count_listings(pool).await?,
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let args = Cli::parse();
    // Reject a bad window before touching the database.
    retention_cutoff(Utc::now(), args.keep_days)?;

    let database_url = resolve_database_url(args.database_url)?;
    let pool = create_pool_from_url_checked(&database_url, RETENTION_POOL_SIZE).await?;

    let report = apply_retention(&pool, Utc::now(), args.keep_days, args.dry_run).await?;
    info!(
        keep_days = args.keep_days,
        dry_run = args.dry_run,
        cutoff = %report.cutoff.to_rfc3339(),
        expired = report.expired,
        deleted = report.deleted,
        remaining = report.remaining,
        "retention finished"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("jm-retention failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_days_defaults_to_five() {
        let cli = Cli::try_parse_from(["jm-retention", "--database-url", "postgres://u:p@h/db"]).unwrap();
        assert!(!cli.dry_run);
        if std::env::var_os("JM_RETENTION_KEEP_DAYS").is_none() {
            assert_eq!(cli.keep_days, DEFAULT_KEEP_DAYS);
        }
    }

    #[test]
    fn negative_keep_days_parses_then_fails_validation() {
        let cli = Cli::try_parse_from(["jm-retention", "--keep-days", "-2", "--dry-run"]).unwrap();
        assert_eq!(cli.keep_days, -2);
        assert!(cli.dry_run);
        assert!(retention_cutoff(Utc::now(), cli.keep_days).is_err());
    }

    #[test]
    fn dry_run_and_empty_windows_never_delete() {
        assert!(should_delete(3, false));
        assert!(!should_delete(3, true));
        assert!(!should_delete(0, false));
    }
}
