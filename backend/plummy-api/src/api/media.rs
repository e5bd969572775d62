use axum::{
    extract::{Path, State},
    routing::delete,
    Json, Router,
};

use crate::error::Result;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:resourceName", delete(destroy_resource))
}

async fn destroy_resource(
    State(state): State<AppState>,
    Path(resource_name): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let result = state.media.destroy(&resource_name).await?;
    Ok(Json(serde_json::json!({ "result": result })))
}
