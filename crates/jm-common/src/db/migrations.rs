use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{debug, info, instrument};

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const BOOTSTRAP_SQL: &str = "CREATE SCHEMA IF NOT EXISTS listings;
     CREATE TABLE IF NOT EXISTS listings.schema_migrations (
        id INTEGER PRIMARY KEY,
        description TEXT NOT NULL,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
     );";

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "job_listings table",
        sql: r#"
CREATE TABLE IF NOT EXISTS listings.job_listings (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL DEFAULT '',
    detail TEXT NOT NULL DEFAULT '',
    price TEXT NOT NULL DEFAULT '',
    period TEXT,
    skills TEXT NOT NULL DEFAULT '',
    source TEXT NOT NULL,
    posted_at TIMESTAMPTZ NOT NULL
);
"#,
    },
    Migration {
        id: 2,
        description: "posted_at index for recency ordering and retention",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_job_listings_posted_at
    ON listings.job_listings(posted_at DESC);
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client.batch_execute(BOOTSTRAP_SQL).await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM listings.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            debug!(id = migration.id, "migration already applied");
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO listings.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_ids_are_strictly_increasing() {
        let ids: Vec<i32> = MIGRATIONS.iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(ids.first(), Some(&1));
    }

    #[test]
    fn job_listings_columns_match_candidate_select() {
        let table = MIGRATIONS[0].sql;
        for column in ["url", "title", "detail", "price", "period", "skills", "source", "posted_at"] {
            assert!(table.contains(&format!("    {column} ")), "missing column {column}");
        }
    }
}
