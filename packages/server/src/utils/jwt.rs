use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub uid: i32,    // User ID
    pub jti: Uuid,   // Session row
    pub exp: usize,  // Expiration timestamp
}

/// Sign a token for session `session_id`, valid until `expires_at`.
pub fn sign(
    session_id: Uuid,
    user_id: i32,
    username: &str,
    secret: &str,
    expires_at: DateTime<Utc>,
) -> Result<String> {
    let claims = Claims {
        sub: username.to_owned(),
        uid: user_id,
        jti: session_id,
        exp: usize::try_from(expires_at.timestamp()).context("session expiry before epoch")?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a session token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
