use chrono::{DateTime, Duration, Utc};
use deadpool_postgres::PoolError;
use thiserror::Error;
use tracing::instrument;

use super::{PgPool, util::TimedClientExt};

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("keep_days must be positive, got {0}")]
    InvalidKeepDays(i64),
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("retention query failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// Listings posted strictly before the returned instant are expired.
pub fn retention_cutoff(now: DateTime<Utc>, keep_days: i64) -> Result<DateTime<Utc>, RetentionError> {
    if keep_days <= 0 {
        return Err(RetentionError::InvalidKeepDays(keep_days));
    }
    Duration::try_days(keep_days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(RetentionError::InvalidKeepDays(keep_days))
}

#[instrument(skip(pool))]
pub async fn count_listings_before(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, RetentionError> {
    let client = pool.get().await?;
    let row = client
        .timed_query_one(
            "SELECT COUNT(*) FROM listings.job_listings WHERE posted_at < $1",
            &[&cutoff],
            "retention.count_before",
        )
        .await?;
    let count: i64 = row.try_get(0)?;
    Ok(count.max(0) as u64)
}

#[instrument(skip(pool))]
pub async fn purge_listings_before(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, RetentionError> {
    let client = pool.get().await?;
    let deleted = client
        .timed_execute(
            "DELETE FROM listings.job_listings WHERE posted_at < $1",
            &[&cutoff],
            "retention.purge_before",
        )
        .await?;
    Ok(deleted)
}

#[instrument(skip(pool))]
pub async fn count_listings(pool: &PgPool) -> Result<u64, RetentionError> {
    let client = pool.get().await?;
    let row = client
        .timed_query_one(
            "SELECT COUNT(*) FROM listings.job_listings",
            &[],
            "retention.count_all",
        )
        .await?;
    let count: i64 = row.try_get(0)?;
    Ok(count.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cutoff_is_keep_days_before_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let cutoff = retention_cutoff(now, 5).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 5, 5, 12, 0, 0).unwrap());
    }

    #[test]
    fn non_positive_keep_days_is_rejected() {
        let now = Utc::now();
        assert!(matches!(
            retention_cutoff(now, 0),
            Err(RetentionError::InvalidKeepDays(0))
        ));
        assert!(matches!(
            retention_cutoff(now, -3),
            Err(RetentionError::InvalidKeepDays(-3))
        ));
    }

    #[test]
    fn absurd_keep_days_does_not_overflow() {
        assert!(retention_cutoff(Utc::now(), i64::MAX).is_err());
    }
}
