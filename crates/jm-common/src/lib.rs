pub mod api;
pub mod db;
pub mod ingest;
pub mod logging;
pub mod search;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing shape returned to callers. `period` is always a string here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub url: String,
    pub title: String,
    pub detail: String,
    pub price: String,
    pub period: String,
    /// Free-text skill summary of the listing.
    pub skills: String,
    pub source: String,
    pub posted_at: DateTime<Utc>,
}

/// Listing as the record store holds it, with a nullable `period`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredListing {
    pub url: String,
    pub title: String,
    pub detail: String,
    pub price: String,
    pub period: Option<String>,
    pub skills: String,
    pub source: String,
    pub posted_at: DateTime<Utc>,
}

impl From<StoredListing> for ListingRecord {
    fn from(listing: StoredListing) -> Self {
        Self {
            url: listing.url,
            title: listing.title,
            detail: listing.detail,
            price: listing.price,
            period: listing.period.unwrap_or_default(),
            skills: listing.skills,
            source: listing.source,
            posted_at: listing.posted_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredSkill {
    pub skill_name: String,
    #[serde(default)]
    pub experience_years: f64,
}

/// Analyzed skill payload handed over by the upstream skill analysis.
///
/// `key_skills` is ordered by importance, most important first.
/// `structured_skills` is accepted as-is; the priority search does not weight it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    #[serde(default)]
    pub key_skills: Vec<String>,
    #[serde(default)]
    pub structured_skills: Vec<StructuredSkill>,
}
