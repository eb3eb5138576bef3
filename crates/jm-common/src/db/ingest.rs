use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::types::ToSql;
use tracing::{info, instrument, warn};

use super::{PgPool, util::TimedClientExt};
use crate::ingest::{NewListing, UPSERT_CHUNK_SIZE};

const COLUMNS_PER_ROW: usize = 8;

#[derive(Debug, Error)]
pub enum UpsertError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub upserted: u64,
    pub failed: u64,
    /// Chunks that were retried row by row.
    pub fallback_chunks: u64,
}

/// Multi-row upsert keyed on `url`. A re-seen url refreshes its content but
/// keeps its original `posted_at`.
pub fn upsert_query(row_count: usize) -> String {
    let values = (0..row_count)
        .map(|row| {
            let base = row * COLUMNS_PER_ROW;
            format!(
                "(${}, ${}, ${}, ${}, ${}, ${}, ${}, COALESCE(${}::timestamptz, NOW()))",
                base + 1,
                base + 2,
                base + 3,
                base + 4,
                base + 5,
                base + 6,
                base + 7,
                base + 8,
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO listings.job_listings \
         (url, title, detail, price, period, skills, source, posted_at) \
         VALUES {values} \
         ON CONFLICT (url) DO UPDATE SET \
         title = EXCLUDED.title, detail = EXCLUDED.detail, price = EXCLUDED.price, \
         period = EXCLUDED.period, skills = EXCLUDED.skills, source = EXCLUDED.source"
    )
}

fn listing_params(row: &NewListing) -> [&(dyn ToSql + Sync); COLUMNS_PER_ROW] {
    [
        &row.url,
        &row.title,
        &row.detail,
        &row.price,
        &row.period,
        &row.skills,
        &row.source,
        &row.posted_at,
    ]
}

fn row_params(rows: &[NewListing]) -> Vec<&(dyn ToSql + Sync)> {
    rows.iter().flat_map(listing_params).collect()
}

/// Upsert already deduplicated rows in chunks.
///
/// A failed chunk writes nothing, so it is retried one row at a time and only
/// the rows that still fail are counted as failed. Losing the pool aborts.
#[instrument(skip(pool, rows), fields(rows = rows.len()))]
pub async fn upsert_listings(
    pool: &PgPool,
    rows: &[NewListing],
) -> Result<UpsertReport, UpsertError> {
    let client = pool.get().await?;
    let mut report = UpsertReport::default();

    for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
        let sql = upsert_query(chunk.len());
        let params = row_params(chunk);

        match client
            .timed_execute(sql.as_str(), &params, "listings.upsert_chunk")
            .await
        {
            Ok(_) => report.upserted += chunk.len() as u64,
            Err(err) => {
                warn!(error = %err, chunk = chunk.len(), "chunk upsert failed; retrying per row");
                report.fallback_chunks += 1;

                let single = upsert_query(1);
                for row in chunk {
                    let params = listing_params(row);
                    match client
                        .timed_execute(single.as_str(), &params, "listings.upsert_row")
                        .await
                    {
                        Ok(_) => report.upserted += 1,
                        Err(err) => {
                            warn!(url = %row.url, error = %err, "row upsert failed");
                            report.failed += 1;
                        }
                    }
                }
            }
        }
    }

    info!(
        upserted = report.upserted,
        failed = report.failed,
        fallback_chunks = report.fallback_chunks,
        "upsert finished"
    );
    Ok(report)
}
