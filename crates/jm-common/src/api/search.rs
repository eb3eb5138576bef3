use serde::{Deserialize, Serialize};

use crate::ListingRecord;

/// Which ranking a search request runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    #[default]
    Priority,
    EqualDistribution,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub strategy: SearchStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub listings: Vec<ListingRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsResponse {
    pub listings: Vec<ListingRecord>,
    pub total: usize,
}

impl From<Vec<ListingRecord>> for ListingsResponse {
    fn from(listings: Vec<ListingRecord>) -> Self {
        let total = listings.len();
        Self { listings, total }
    }
}
