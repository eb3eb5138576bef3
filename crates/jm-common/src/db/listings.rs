use std::pin::pin;

use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use tokio_postgres::{Row, types::ToSql};
use tracing::{instrument, warn};

use super::{
    PgPool,
    util::{TimedClientExt, slice_iter},
};
use crate::{
    ListingRecord, StoredListing,
    search::{CandidateRow, ListingStore, RowDecodeError, StoreError, decoded_candidates},
};

const LISTING_COLUMNS: &str = "url, title, detail, price, period, skills, source, posted_at";

/// Escape `%`, `_` and `\` so a term is matched literally inside ILIKE.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// One parameter per term; a listing qualifies when any term hits any field.
pub fn candidate_query(term_count: usize) -> String {
    let where_clause = (1..=term_count)
        .map(|idx| format!("(title ILIKE ${idx} OR skills ILIKE ${idx} OR detail ILIKE ${idx})"))
        .collect::<Vec<_>>()
        .join(" OR ");

    format!("SELECT {LISTING_COLUMNS} FROM listings.job_listings WHERE {where_clause}")
}

pub fn all_listings_query() -> String {
    format!("SELECT {LISTING_COLUMNS} FROM listings.job_listings ORDER BY posted_at DESC, url ASC")
}

fn decode_listing_row(index: usize, row: &Row) -> Result<StoredListing, RowDecodeError> {
    let decode_err = |err: tokio_postgres::Error| RowDecodeError {
        index,
        cause: err.to_string(),
    };

    Ok(StoredListing {
        url: row.try_get("url").map_err(decode_err)?,
        title: row.try_get("title").map_err(decode_err)?,
        detail: row.try_get("detail").map_err(decode_err)?,
        price: row.try_get("price").map_err(decode_err)?,
        period: row.try_get::<_, Option<String>>("period").map_err(decode_err)?,
        skills: row.try_get("skills").map_err(decode_err)?,
        source: row.try_get("source").map_err(decode_err)?,
        posted_at: row
            .try_get::<_, DateTime<Utc>>("posted_at")
            .map_err(decode_err)?,
    })
}

/// Drain a row stream, decoding each row in place.
///
/// A stream error before any row decoded is a query failure; after that it is
/// an iteration failure. Either way nothing read so far is returned.
async fn drain_rows<S, R, E, D>(stream: S, decode: D) -> Result<Vec<CandidateRow>, StoreError>
where
    S: Stream<Item = Result<R, E>>,
    E: std::fmt::Display,
    D: Fn(usize, &R) -> CandidateRow,
{
    let mut stream = pin!(stream);
    let mut rows = Vec::new();
    let mut decoded = 0usize;

    while let Some(next) = stream.next().await {
        match next {
            Ok(row) => {
                let candidate = decode(rows.len(), &row);
                if candidate.is_ok() {
                    decoded += 1;
                }
                rows.push(candidate);
            }
            Err(err) if decoded == 0 => return Err(StoreError::QueryFailed(err.to_string())),
            Err(err) => {
                return Err(StoreError::IterationFailed {
                    rows_read: rows.len(),
                    cause: err.to_string(),
                });
            }
        }
    }

    Ok(rows)
}

/// Postgres-backed listing store. The pool is created by the caller and
/// shared; the store itself keeps no other state.
#[derive(Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Every listing, newest first, with undecodable rows skipped.
    #[instrument(skip(self))]
    pub async fn fetch_all_listings(&self) -> Result<Vec<ListingRecord>, StoreError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|err| StoreError::QueryFailed(err.to_string()))?;

        let no_params: [&(dyn ToSql + Sync); 0] = [];
        let stream = client
            .timed_query_raw(
                all_listings_query().as_str(),
                slice_iter(&no_params),
                "listings.fetch_all",
            )
            .await
            .map_err(|err| StoreError::QueryFailed(err.to_string()))?;

        let rows = drain_rows(stream, decode_listing_row).await?;
        Ok(decoded_candidates(rows)
            .into_iter()
            .map(ListingRecord::from)
            .collect())
    }
}

impl ListingStore for PgListingStore {
    #[instrument(skip(self, terms), fields(term_count = terms.len()))]
    async fn fetch_candidates(&self, terms: &[String]) -> Result<Vec<CandidateRow>, StoreError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|err| StoreError::QueryFailed(err.to_string()))?;

        let patterns: Vec<String> = terms.iter().map(|term| contains_pattern(term)).collect();
        let params: Vec<&(dyn ToSql + Sync)> = patterns
            .iter()
            .map(|pattern| pattern as &(dyn ToSql + Sync))
            .collect();

        let query = candidate_query(terms.len());
        let stream = client
            .timed_query_raw(query.as_str(), slice_iter(&params), "listings.fetch_candidates")
            .await
            .map_err(|err| {
                warn!(error = %err, "candidate query failed");
                StoreError::QueryFailed(err.to_string())
            })?;

        drain_rows(stream, decode_listing_row).await
    }
}
