use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::{
    store::{CandidateRow, ListingStore, StoreError},
    strategy::RankingStrategy,
};
use crate::{ListingRecord, SkillProfile, StoredListing};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("candidate retrieval failed: {0}")]
    QueryFailed(String),
    #[error("candidate stream failed: {0}")]
    IterationFailed(String),
}

impl From<StoreError> for SearchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::QueryFailed(cause) => SearchError::QueryFailed(cause),
            err @ StoreError::IterationFailed { .. } => SearchError::IterationFailed(err.to_string()),
        }
    }
}

/// Runs a ranking strategy against an injected listing store.
///
/// Holds no state besides the store handle; concurrent searches are independent.
pub struct SkillSearchEngine<S> {
    store: S,
}

impl<S: ListingStore> SkillSearchEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// An empty term set short-circuits to an empty result without touching
    /// the store. "Nothing matched" is `Ok(vec![])`, never an error.
    #[instrument(skip_all, fields(strategy = strategy.name()))]
    pub async fn search<R>(
        &self,
        profile: &SkillProfile,
        strategy: &R,
    ) -> Result<Vec<ListingRecord>, SearchError>
    where
        R: RankingStrategy + ?Sized,
    {
        let terms = strategy.search_terms(profile);
        if terms.is_empty() {
            debug!("no search terms; skipping candidate retrieval");
            return Ok(Vec::new());
        }

        let rows = self.store.fetch_candidates(&terms).await?;
        let candidates = decoded_candidates(rows);
        let candidate_count = candidates.len();

        let ranked: Vec<ListingRecord> = strategy
            .rank(&terms, candidates)
            .into_iter()
            .map(ListingRecord::from)
            .collect();

        debug!(
            terms = terms.len(),
            candidates = candidate_count,
            returned = ranked.len(),
            "search complete"
        );
        Ok(ranked)
    }
}

/// Drop rows that failed to decode, logging each one.
pub fn decoded_candidates(rows: Vec<CandidateRow>) -> Vec<StoredListing> {
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(listing) => Some(listing),
            Err(err) => {
                warn!(row = err.index, cause = %err.cause, "skipping undecodable listing row");
                None
            }
        })
        .collect()
}
