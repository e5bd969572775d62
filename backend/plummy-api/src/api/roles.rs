use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::api::JsonBody;
use crate::error::Result;
use crate::listing::{ListParams, ListQuery, Paginated, ROLE_LISTING};
use crate::middleware::CurrentUser;
use crate::models::{Role, RoleForm, RoleListItem};
use crate::services::RoleService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:rolesId", patch(update_role).delete(delete_role))
}

async fn list_roles(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<RoleListItem>>> {
    let query = ListQuery::parse(&params, &ROLE_LISTING)?;
    let page = RoleService::new(state.db.clone()).list(&query).await?;
    Ok(Json(page))
}

async fn create_role(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    JsonBody(form): JsonBody<RoleForm>,
) -> Result<Json<Role>> {
    let role = RoleService::new(state.db.clone()).create(form, current.user.id).await?;
    Ok(Json(role))
}

async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(form): JsonBody<RoleForm>,
) -> Result<Json<Role>> {
    let role = RoleService::new(state.db.clone()).update(id, form).await?;
    Ok(Json(role))
}

async fn delete_role(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Role>> {
    let role = RoleService::new(state.db.clone()).delete(id).await?;
    Ok(Json(role))
}
