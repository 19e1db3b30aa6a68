use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::session;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Authenticated user extracted from the session cookie, or from an
/// `Authorization: Bearer <token>` header for non-browser clients.
///
/// Add this as a handler parameter to require an active session. A token is
/// only accepted while its session row exists and has not expired.
#[derive(Debug)]
pub struct SessionUser {
    pub session_id: Uuid,
    pub user_id: i32,
    pub username: String,
}

fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AppError::SessionMissing)?;

        let claims = jwt::verify(&token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::SessionInvalid)?;

        let row = session::Entity::find_by_id(claims.jti)
            .filter(session::Column::UserId.eq(claims.uid))
            .filter(session::Column::ExpiresAt.gt(chrono::Utc::now()))
            .one(&state.db)
            .await?;
        if row.is_none() {
            tracing::debug!(session = %claims.jti, "Token refers to a closed session");
            return Err(AppError::SessionInvalid);
        }

        Ok(SessionUser {
            session_id: claims.jti,
            user_id: claims.uid,
            username: claims.sub,
        })
    }
}
