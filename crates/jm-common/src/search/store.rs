#![allow(async_fn_in_trait)]

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use thiserror::Error;

use crate::StoredListing;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("candidate query failed: {0}")]
    QueryFailed(String),
    #[error("row iteration failed after {rows_read} rows: {cause}")]
    IterationFailed { rows_read: usize, cause: String },
}

/// One row of the result set could not be turned into a listing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("row {index} could not be decoded: {cause}")]
pub struct RowDecodeError {
    pub index: usize,
    pub cause: String,
}

pub type CandidateRow = Result<StoredListing, RowDecodeError>;

/// Read side of the listing record store.
pub trait ListingStore {
    /// Every listing where at least one term is a case-insensitive substring
    /// of the title, the skill summary or the detail text.
    ///
    /// Rows that fail to decode are reported in place so the caller can skip
    /// them; a failure of the query or of the row stream fails the whole call.
    async fn fetch_candidates(&self, terms: &[String]) -> Result<Vec<CandidateRow>, StoreError>;
}

/// Case-insensitive containment in any of the searchable fields.
pub fn matches_any_term(listing: &StoredListing, terms: &[String]) -> bool {
    let fields = [
        listing.title.to_lowercase(),
        listing.skills.to_lowercase(),
        listing.detail.to_lowercase(),
    ];

    terms.iter().any(|term| {
        let term = term.to_lowercase();
        fields.iter().any(|field| field.contains(term.as_str()))
    })
}

/// Store backed by a vector of rows, used by tests and local tooling.
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    rows: Vec<CandidateRow>,
    failure: Mutex<Option<StoreError>>,
    calls: AtomicUsize,
}

impl InMemoryListingStore {
    pub fn new(listings: Vec<StoredListing>) -> Self {
        Self::from_rows(listings.into_iter().map(Ok).collect())
    }

    /// Undecodable rows are always handed back, the way a database would
    /// return a row it cannot map.
    pub fn from_rows(rows: Vec<CandidateRow>) -> Self {
        Self {
            rows,
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every subsequent fetch fails with `error`.
    pub fn fail_with(&self, error: StoreError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(error);
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ListingStore for InMemoryListingStore {
    async fn fetch_candidates(&self, terms: &[String]) -> Result<Vec<CandidateRow>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.failure.lock().ok().and_then(|failure| failure.clone()) {
            return Err(error);
        }

        Ok(self
            .rows
            .iter()
            .filter(|row| match row {
                Ok(listing) => matches_any_term(listing, terms),
                Err(_) => true,
            })
            .cloned()
            .collect())
    }
}
