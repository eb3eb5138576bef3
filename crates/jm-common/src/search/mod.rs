pub mod diversify;
pub mod engine;
pub mod prioritizer;
pub mod scoring;
pub mod store;
pub mod strategy;
pub mod weights;

pub use engine::{SearchError, SkillSearchEngine, decoded_candidates};
pub use scoring::{FieldScorer, ScoredCandidate};
pub use store::{
    CandidateRow, InMemoryListingStore, ListingStore, RowDecodeError, StoreError, matches_any_term,
};
pub use strategy::{EqualDistributionRanking, PriorityRanking, RankingStrategy};
pub use weights::{EqualDistributionConfig, FieldWeights, RankingConfig};
