use axum::{extract::State, routing::patch, Extension, Json, Router};
use axum_extra::extract::cookie::CookieJar;

use crate::api::JsonBody;
use crate::error::Result;
use crate::middleware::{start_session, CurrentUser};
use crate::models::{AvatarUpdate, ProfileUpdate, SessionUser};
use crate::services::UserService;
use crate::AppState;

// Both edits change what the session carries, so the cookie is reissued.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settingsFormUpdate", patch(update_settings))
        .route("/settingsFormImageUpdate", patch(update_avatar))
}

async fn update_settings(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<(CookieJar, Json<SessionUser>)> {
    let user = UserService::new(state.db.clone())
        .update_profile(current.user.id, update)
        .await?;
    let jar = start_session(jar, &state.config.session, &user)?;
    Ok((jar, Json(user)))
}

async fn update_avatar(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
    JsonBody(update): JsonBody<AvatarUpdate>,
) -> Result<(CookieJar, Json<SessionUser>)> {
    let user = UserService::new(state.db.clone())
        .update_avatar(current.user.id, update)
        .await?;
    let jar = start_session(jar, &state.config.session, &user)?;
    Ok((jar, Json(user)))
}
