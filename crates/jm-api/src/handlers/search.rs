use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use jm_common::SkillProfile;
use jm_common::api::{SearchQuery, SearchResponse, SearchStrategy};
use tracing::info;

use crate::SharedState;
use crate::error::ApiError;

/// Rank listings for an analyzed skill payload.
///
/// Malformed query strings and bodies are answered as `bad_request`.
pub async fn search_listings(
    State(state): State<SharedState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
    profile: Result<Json<SkillProfile>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query?;
    let Json(profile) = profile?;

    let listings = match query.strategy {
        SearchStrategy::Priority => state.engine.search(&profile, &state.priority).await?,
        SearchStrategy::EqualDistribution => {
            state
                .engine
                .search(&profile, &state.equal_distribution)
                .await?
        }
    };

    info!(
        strategy = ?query.strategy,
        key_skills = profile.key_skills.len(),
        returned = listings.len(),
        "search served"
    );

    Ok(Json(SearchResponse { listings }))
}
