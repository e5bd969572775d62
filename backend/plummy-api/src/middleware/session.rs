use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::SessionUser;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub user: SessionUser,
    pub exp: usize,
    pub iat: usize,
}

/// The authenticated caller, inserted into request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: SessionUser,
    pub token: String,
    pub expires_at: usize,
}

pub fn issue_token(config: &SessionConfig, user: &SessionUser) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(config.ttl_hours as i64);

    let claims = Claims {
        sub: user.id.to_string(),
        user: user.clone(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))
}

pub fn verify_token(config: &SessionConfig, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .build()
}

pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), "")).path("/").build()
}

/// Signs a token for `user` and adds it to the jar.
pub fn start_session(jar: CookieJar, config: &SessionConfig, user: &SessionUser) -> Result<CookieJar> {
    let token = issue_token(config, user)?;
    Ok(jar.add(session_cookie(config, token)))
}

fn blacklist_key(token: &str) -> String {
    format!("token_blacklist:{}", token)
}

/// Whether the token has been revoked. Redis being unreachable is logged and
/// treated as "not revoked".
async fn is_revoked(db: &Database, token: &str) -> bool {
    let mut conn = match db.get_redis_conn().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, skipping session revocation check");
            return false;
        }
    };

    match conn.exists::<_, bool>(blacklist_key(token)).await {
        Ok(revoked) => revoked,
        Err(e) => {
            tracing::warn!(error = %e, "Session revocation lookup failed");
            false
        }
    }
}

/// Deny-lists the token until it would have expired anyway.
pub async fn revoke_token(db: &Database, token: &str, expires_at: usize) -> Result<()> {
    let remaining = (expires_at as i64 - Utc::now().timestamp()).max(1);

    let mut conn = db
        .get_redis_conn()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Redis connection failed: {}", e)))?;

    conn.set_ex::<_, _, ()>(blacklist_key(token), "1", remaining.try_into().unwrap_or(1))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token revocation failed: {}", e)))?;

    Ok(())
}

pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = jar
        .get(&state.config.session.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_token(&state.config.session, &token)?;

    if is_revoked(&state.db, &token).await {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(CurrentUser {
        user: claims.user,
        token,
        expires_at: claims.exp,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use uuid::Uuid;

    fn user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            middle_name: "K".into(),
            last_name: "Lovelace".into(),
            avatar_url: None,
            role: Some("Administrator".into()),
            email: "ada@example.com".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips_the_session_user() {
        let config = Config::defaults().unwrap().session;
        let user = user();
        let token = issue_token(&config, &user).unwrap();
        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.user, user);
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let config = Config::defaults().unwrap().session;
        let mut other = config.clone();
        other.secret = "another-secret".into();
        let token = issue_token(&other, &user()).unwrap();
        assert!(matches!(verify_token(&config, &token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn cookie_is_http_only_and_lax() {
        let config = Config::defaults().unwrap().session;
        let cookie = session_cookie(&config, "abc".into());
        assert_eq!(cookie.name(), "plummy_session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
