use crate::error::AppError;
use serde::{Deserialize, Serialize};

pub const MAX_USERNAME_LENGTH: usize = 150;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (1-150 chars: letters, digits and `@.+-_`).
    #[schema(example = "baker_anna")]
    pub username: String,
    /// Password (8-128 characters, not entirely numeric).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Must repeat `password` exactly.
    #[schema(example = "s3cure_P@ss!")]
    pub confirm_password: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::field(
            "username",
            format!("Username must be 1-{MAX_USERNAME_LENGTH} characters"),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AppError::field(
            "username",
            "Username may contain only letters, digits and @/./+/-/_",
        ));
    }
    if payload.password.chars().count() < 8 || payload.password.chars().count() > 128 {
        return Err(AppError::field(
            "password",
            "Password must be 8-128 characters",
        ));
    }
    if payload.password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::field(
            "password",
            "Password must not be entirely numeric",
        ));
    }
    if payload.password != payload.confirm_password {
        return Err(AppError::field(
            "confirm_password",
            "The two password fields didn't match",
        ));
    }
    Ok(())
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "baker_anna")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::field("username", "Username must not be empty"));
    }
    if payload.password.is_empty() {
        return Err(AppError::field("password", "Password must not be empty"));
    }
    Ok(())
}

/// Successful registration response. The client should continue at `login_url`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "baker_anna")]
    pub username: String,
    #[schema(example = "/api/v1/auth/login")]
    pub login_url: String,
}

/// Successful login response. The session cookie is set alongside it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Session token, also usable as a bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "baker_anna")]
    pub username: String,
}

/// Current session's user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "baker_anna")]
    pub username: String,
}
