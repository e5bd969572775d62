use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::JsonBody;
use crate::error::Result;
use crate::listing::Window;
use crate::middleware::CurrentUser;
use crate::models::{Daily, DailyModification, DailyUploadRequest, FeaturedDaily, MemberDaily};
use crate::services::DailyService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/daily", get(list_dailies))
        .route("/dailyUploadImage", post(upload_dailies))
        .route("/dailyUserFeatured", get(user_featured))
        .route("/dailyMemberFeatured", get(member_featured))
        .route("/dailies/:dailyId/setDaily", patch(set_daily))
        .route("/dailies/:dailyId/clearDaily", patch(clear_daily))
        .route("/dailies/:dailyId/modifyDaily", patch(modify_daily))
        .route("/dailies/:dailyId/removeDaily", delete(remove_daily))
}

async fn list_dailies(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<Daily>>> {
    let dailies = DailyService::new(state.db.clone()).list(current.user.id).await?;
    Ok(Json(dailies))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    status_code: u16,
    data: Vec<Daily>,
}

async fn upload_dailies(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(payload): JsonBody<DailyUploadRequest>,
) -> Result<Json<UploadResponse>> {
    let data = DailyService::new(state.db.clone())
        .upload(current.user.id, payload, state.media.as_ref())
        .await?;
    Ok(Json(UploadResponse { status_code: 200, data }))
}

async fn user_featured(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<FeaturedDaily>> {
    let featured = DailyService::new(state.db.clone())
        .featured_for_user(current.user.id)
        .await?;
    Ok(Json(featured))
}

/// Other users' active dailies.
async fn member_featured(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(window): Query<Window>,
) -> Result<Json<Vec<MemberDaily>>> {
    let (skip, take) = window.resolve(5, 50);
    let dailies = DailyService::new(state.db.clone())
        .featured_members(current.user.id, skip, take)
        .await?;
    Ok(Json(dailies))
}

async fn set_daily(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(daily_id): Path<Uuid>,
) -> Result<Json<Daily>> {
    let daily = DailyService::new(state.db.clone())
        .set_active(current.user.id, daily_id)
        .await?;
    Ok(Json(daily))
}

async fn clear_daily(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(daily_id): Path<Uuid>,
) -> Result<Json<Daily>> {
    let daily = DailyService::new(state.db.clone())
        .clear_active(current.user.id, daily_id)
        .await?;
    Ok(Json(daily))
}

async fn modify_daily(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(daily_id): Path<Uuid>,
    JsonBody(modification): JsonBody<DailyModification>,
) -> Result<Json<Daily>> {
    let daily = DailyService::new(state.db.clone())
        .modify(current.user.id, daily_id, modification)
        .await?;
    Ok(Json(daily))
}

async fn remove_daily(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(daily_id): Path<Uuid>,
) -> Result<Json<Daily>> {
    let daily = DailyService::new(state.db.clone())
        .remove(current.user.id, daily_id)
        .await?;
    Ok(Json(daily))
}
