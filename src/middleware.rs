use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use redb::ReadableDatabase;

use crate::auth::{bearer_token, decode_token};
use crate::database::{find_user, AppState};
use crate::error::{AppError, AppResult};
use crate::model::User;

/// The authenticated identity, inserted by [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// The identity behind an optional bearer token, inserted by [`optional_auth`].
#[derive(Clone, Debug)]
pub struct Viewer(pub Option<User>);

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

/// Decodes the token and reloads the identity, checking that it still
/// exists and that its token version has not moved on.
fn authenticate(state: &AppState, token: &str) -> AppResult<User> {
    let claims = decode_token(token, &state.config.jwt_secret)?;
    let read_txn = state.db.begin_read()?;
    match find_user(&read_txn, claims.sub)? {
        Some(user) if user.token_version == claims.ver => Ok(user),
        _ => Err(AppError::Unauthorized(
            "User not found or token revoked".to_string(),
        )),
    }
}

/// Identity gate: rejects requests without a valid bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = header_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;
    let user = authenticate(&state, token)?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

/// Like [`require_auth`] but lets anonymous requests through.
/// A token that is present but invalid is still rejected.
pub async fn optional_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user = match header_token(&headers) {
        Some(token) => Some(authenticate(&state, token)?),
        None => None,
    };

    request.extensions_mut().insert(Viewer(user));
    Ok(next.run(request).await)
}

/// Admin gate. Must be layered inside [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    let is_admin = request
        .extensions()
        .get::<AuthUser>()
        .map(|AuthUser(user)| user.is_admin());

    match is_admin {
        Some(true) => Ok(next.run(request).await),
        Some(false) => Err(AppError::Forbidden("Admin access required".to_string())),
        None => Err(AppError::Unauthorized("No token provided".to_string())),
    }
}
