use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;

use crate::api::JsonBody;
use crate::error::Result;
use crate::middleware::{removal_cookie, require_session, revoke_token, start_session, CurrentUser};
use crate::models::{LoginRequest, RegisterRequest, SessionUser, User};
use crate::services::{AuthService, UserService};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let signed_in = Router::new()
        .route("/logout", post(logout))
        .route("/session", get(session))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(signed_in)
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(CookieJar, Json<User>)> {
    let user = AuthService::new(state.db.clone()).register(payload).await?;

    let session_user = UserService::new(state.db.clone()).session_user(user.id).await?;
    let jar = start_session(jar, &state.config.session, &session_user)?;

    Ok((jar, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<SessionUser>)> {
    let user = AuthService::new(state.db.clone()).login(payload).await?;
    let jar = start_session(jar, &state.config.session, &user)?;

    tracing::info!(user_id = %user.id, "User signed in");
    Ok((jar, Json(user)))
}

async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    // The cookie is cleared even when the deny-list write fails.
    if let Err(e) = revoke_token(&state.db, &current.token, current.expires_at).await {
        tracing::error!(user_id = %current.user.id, error = %e, "Failed to revoke session token");
    }

    let jar = jar.remove(removal_cookie(&state.config.session));
    Ok((jar, Json(serde_json::json!({ "success": true }))))
}

async fn session(Extension(current): Extension<CurrentUser>) -> Json<SessionUser> {
    Json(current.user)
}
