//! Password hashing and bearer tokens
//!
//! Passwords are hashed with bcrypt (random per-record salt, configurable
//! cost) on the blocking thread pool. Session tokens are HS256 JWTs signed
//! with `jsonwebtoken`, carrying the user id, the user's token version and an expiry.

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::User;

/// Hashes a password with a freshly generated salt.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Compares a candidate password with a stored bcrypt hash.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Token version of the user at issue time
    pub ver: u32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("Invalid token")]
    Malformed,

    #[error("Invalid token")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

/// Signs an HS256 token for `user` valid for the configured lifetime.
pub fn issue_token(user: &User, config: &Config, now: DateTime<Utc>) -> AppResult<String> {
    let claims = Claims {
        sub: user.id,
        ver: user.token_version,
        iat: now.timestamp(),
        exp: (now + config.token_ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|err| AppError::Internal(format!("failed to sign token: {err}")))
}

/// Checks signature and expiry, returning the claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = decode::<Claims>(
        token.trim(),
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
