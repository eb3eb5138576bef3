use axum::{Json, extract::State};
use jm_common::api::ListingsResponse;

use crate::SharedState;
use crate::error::ApiError;

pub async fn list_listings(
    State(state): State<SharedState>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let listings = state.engine.store().fetch_all_listings().await?;
    Ok(Json(ListingsResponse::from(listings)))
}
