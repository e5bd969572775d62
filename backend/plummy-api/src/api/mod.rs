mod dailies;
mod feed;
mod guest;
mod media;
mod permissions;
mod profile;
mod roles;
mod search;
mod users;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    middleware, Json, Router,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::middleware::require_session;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/account/accounts/users", users::routes())
        .nest("/account/accounts/roles", roles::routes())
        .nest("/account/accounts/permissions", permissions::routes())
        .nest("/account/profile", profile::routes())
        .nest("/plummy/home/main", feed::routes().merge(dailies::routes()))
        .nest("/cloudinary", media::routes())
        .nest("/llm/tavily", search::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .nest("/guest/auth", guest::routes(state))
        .merge(protected)
}

/// JSON body whose rejections use the API error shape.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| JsonBody(value))
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}
