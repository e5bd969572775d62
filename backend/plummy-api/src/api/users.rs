use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::api::JsonBody;
use crate::error::Result;
use crate::listing::{ListParams, ListQuery, Paginated, USER_LISTING};
use crate::models::{RoleFacet, User, UserForm, UserListItem};
use crate::services::{RoleService, UserService};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/roleToolbar", get(role_toolbar))
        .route("/:usersId", patch(update_user).delete(delete_user))
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<UserListItem>>> {
    let query = ListQuery::parse(&params, &USER_LISTING)?;
    let page = UserService::new(state.db.clone()).list(&query).await?;
    Ok(Json(page))
}

async fn create_user(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<UserForm>,
) -> Result<Json<User>> {
    let user = UserService::new(state.db.clone())
        .create(form, &state.config.accounts.default_password)
        .await?;
    Ok(Json(user))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(form): JsonBody<UserForm>,
) -> Result<Json<User>> {
    let user = UserService::new(state.db.clone()).update(id, form).await?;
    Ok(Json(user))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<User>> {
    let user = UserService::new(state.db.clone()).delete(id).await?;
    Ok(Json(user))
}

/// Role facet options for the users table toolbar.
async fn role_toolbar(State(state): State<AppState>) -> Result<Json<Vec<RoleFacet>>> {
    let facets = RoleService::new(state.db.clone()).facets().await?;
    Ok(Json(facets))
}
