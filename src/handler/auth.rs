//! Registration, login, token verification and global logout

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use redb::ReadableDatabase;
use tracing::info;
use uuid::Uuid;

use super::Body;
use crate::auth::{hash_password, issue_token, verify_password};
use crate::database::{find_user_by_email, insert_user, require_user, save_user, AppState};
use crate::dto::{ApiResponse, AuthView, LoginRequest, RegisterRequest, UserView};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::model::{Cart, Role, User, Wishlist};

/// Creates a customer account and signs the new user in.
///
/// - **201 Created** with `{token, user}`
/// - **400 Bad Request** when a field is missing or invalid
/// - **409 Conflict** when the email is already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Body<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthView>>)> {
    let Json(req) = payload?;
    let new_user = req.validate()?;

    // insert_user re-checks under the write lock
    if find_user_by_email(&state.db.begin_read()?, &new_user.email)?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(new_user.password, state.config.bcrypt_cost).await?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: new_user.name,
        email: new_user.email,
        password_hash,
        phone: new_user.phone,
        address: new_user.address,
        role: Role::Customer,
        joined: now,
        cart: Cart::default(),
        wishlist: Wishlist::default(),
        reviews: Vec::new(),
        token_version: 0,
        updated_at: now,
    };

    let write_txn = state.db.begin_write()?;
    insert_user(&write_txn, &user)?;
    write_txn.commit()?;

    let token = issue_token(&user, &state.config, now)?;
    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            AuthView {
                token,
                user: UserView::from(&user),
            },
        )),
    ))
}

/// Exchanges credentials for a bearer token.
///
/// Unknown email and wrong password produce the same response.
pub async fn login(
    State(state): State<AppState>,
    payload: Body<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthView>>> {
    let Json(req) = payload?;
    let (email, password) = req.validate()?;

    let invalid = || AppError::validation("Invalid credentials");
    let user = find_user_by_email(&state.db.begin_read()?, &email)?.ok_or_else(invalid)?;
    if !verify_password(password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let token = issue_token(&user, &state.config, Utc::now())?;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        AuthView {
            token,
            user: UserView::from(&user),
        },
    )))
}

pub async fn verify(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<ApiResponse<UserView>> {
    Json(ApiResponse::ok(UserView::from(&user)))
}

/// Revokes every token issued to the caller so far, including the current one.
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    let write_txn = state.db.begin_write()?;
    let mut user = require_user(&write_txn, caller.id)?;
    user.token_version = user.token_version.wrapping_add(1);
    user.updated_at = Utc::now();
    let email = user.email.clone();
    save_user(&write_txn, &user, &email)?;
    write_txn.commit()?;

    info!(user_id = %user.id, "all sessions revoked");
    Ok(Json(ApiResponse::with_message(
        "Logged out from all sessions",
        (),
    )))
}
