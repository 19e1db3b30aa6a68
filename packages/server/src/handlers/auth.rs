use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{session, user};
use crate::error::{AppError, ErrorBody, unique_violation_or};
use crate::extractors::auth::{SESSION_COOKIE, SessionUser};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse,
    validate_login_request, validate_register_request,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Where clients continue after registering or when a session is required.
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Create a user account",
    description = "Registers a new user. The password must be entered twice. On success the response points to the login entry point through the `Location` header and `login_url`.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username already taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let username = payload.username.trim().to_string();

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        username: Set(username),
        password: Set(hash),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let user = new_user
        .insert(&state.db)
        .await
        .map_err(|e| unique_violation_or(e, AppError::UsernameTaken))?;

    tracing::info!(user_id = user.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, LOGIN_PATH)],
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            login_url: LOGIN_PATH.to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Start a session",
    description = "Verifies the credentials and sets an HttpOnly `session` cookie. The token is also returned for bearer-token clients. Unknown usernames and wrong passwords yield the same response.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?;

    let Some(user) = user else {
        hash::verify_dummy(&payload.password);
        return Err(AppError::InvalidCredentials);
    };

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let auth = &state.config.auth;
    let now = chrono::Utc::now();
    let opened = session::ActiveModel {
        uid: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        created_at: Set(now),
        expires_at: Set(now + chrono::Duration::hours(auth.session_ttl_hours)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let token = jwt::sign(
        opened.uid,
        user.id,
        &user.username,
        &auth.jwt_secret,
        opened.expires_at,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .path("/")
        .max_age(time::Duration::hours(auth.session_ttl_hours));

    tracing::info!(user_id = user.id, session = %opened.uid, "Session opened");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            id: user.id,
            username: user.username,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "End the session",
    description = "Closes the current session and clears the session cookie. The session token, whether sent as cookie or bearer token, is rejected afterwards. Succeeds whether or not a session was present.",
    responses(
        (status = 204, description = "Logged out"),
    ),
)]
#[instrument(skip(state, current, jar))]
pub async fn logout(
    current: Result<SessionUser, AppError>,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), AppError> {
    if let Ok(current) = current {
        session::Entity::delete_by_id(current.session_id)
            .exec(&state.db)
            .await?;
        tracing::info!(
            user_id = current.user_id,
            session = %current.session_id,
            "Session closed"
        );
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/");
    Ok((jar.remove(removal), StatusCode::NO_CONTENT))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "Session user", body = MeResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(session), fields(user_id = session.user_id))]
pub async fn me(session: SessionUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: session.user_id,
        username: session.username,
    })
}
