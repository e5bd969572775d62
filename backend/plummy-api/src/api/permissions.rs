use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::JsonBody;
use crate::error::Result;
use crate::listing::Window;
use crate::models::{Role, RolePermissions, RoleWithMembers};
use crate::services::{parse_id_list, RoleService, DEFAULT_MEMBER_TAKE};
use crate::AppState;

const MAX_MEMBER_TAKE: i64 = 1000;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).patch(reorder_roles))
        .route("/:permissionsId", get(get_permissions).patch(update_permissions))
        .route("/roles/:rolesId", get(role_members).patch(reorder_members))
}

async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>> {
    let roles = RoleService::new(state.db.clone()).all_by_position().await?;
    Ok(Json(roles))
}

/// Body: role ids in their new display order.
async fn reorder_roles(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<serde_json::Value>,
) -> Result<Json<Vec<Role>>> {
    let ids = parse_id_list(&body)?;
    let roles = RoleService::new(state.db.clone()).reorder_positions(&ids).await?;
    Ok(Json(roles))
}

async fn get_permissions(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<RolePermissions>> {
    let permissions = RoleService::new(state.db.clone()).permissions(id).await?;
    Ok(Json(permissions))
}

/// The permissions document is stored as sent.
async fn update_permissions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(permissions): JsonBody<serde_json::Value>,
) -> Result<Json<Role>> {
    let role = RoleService::new(state.db.clone()).update_permissions(id, permissions).await?;
    Ok(Json(role))
}

#[derive(Debug, Deserialize)]
struct MemberQuery {
    skip: Option<String>,
    take: Option<String>,
    search: Option<String>,
}

async fn role_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MemberQuery>,
) -> Result<Json<RoleWithMembers>> {
    let (skip, take) = Window { skip: query.skip, take: query.take }.resolve(DEFAULT_MEMBER_TAKE as i64, MAX_MEMBER_TAKE);
    let role = RoleService::new(state.db.clone())
        .member_view(id, query.search.as_deref(), skip as usize, take as usize)
        .await?;
    Ok(Json(role))
}

/// Body: member ids in their new display order.
async fn reorder_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(body): JsonBody<serde_json::Value>,
) -> Result<Json<RoleWithMembers>> {
    let ids = parse_id_list(&body)?;
    let role = RoleService::new(state.db.clone()).reorder_members(id, &ids).await?;
    Ok(Json(role))
}
