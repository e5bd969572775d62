use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use validator::Validate;

use crate::api::JsonBody;
use crate::error::{FieldErrors, Result};
use crate::services::SearchResult;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/search", post(search))
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
struct SearchRequest {
    #[validate(length(min = 1, message = "Query is required"))]
    query: String,
}

async fn search(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SearchRequest>,
) -> Result<Json<SearchResult>> {
    FieldErrors::of(&payload).into_result()?;
    let result = state.search.improve(&payload.query).await?;
    Ok(Json(result))
}
