//! Profile management and the caller's own orders

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use redb::ReadableDatabase;
use tracing::info;

use super::Body;
use crate::auth::{hash_password, verify_password};
use crate::database::{
    find_order, orders_for_user, parse_id, require_order, require_user, save_order, save_user,
    AppState,
};
use crate::dto::{ApiResponse, ChangePasswordRequest, OrderView, UpdateProfileRequest, UserView};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

pub async fn profile(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<ApiResponse<UserView>> {
    Json(ApiResponse::ok(UserView::from(&user)))
}

/// Applies the provided profile fields. A new email must not belong to anyone else.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    payload: Body<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let Json(req) = payload?;

    let write_txn = state.db.begin_write()?;
    let mut user = require_user(&write_txn, caller.id)?;
    let previous_email = user.email.clone();
    req.apply(&mut user)?;
    user.updated_at = Utc::now();
    save_user(&write_txn, &user, &previous_email)?;
    write_txn.commit()?;

    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        UserView::from(&user),
    )))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    payload: Body<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let Json(req) = payload?;
    let (current, new) = req.validate()?;

    if !verify_password(current, caller.password_hash.clone()).await? {
        return Err(AppError::Unauthorized(
            "Incorrect current password".to_string(),
        ));
    }
    let password_hash = hash_password(new, state.config.bcrypt_cost).await?;

    let write_txn = state.db.begin_write()?;
    let mut user = require_user(&write_txn, caller.id)?;
    user.password_hash = password_hash;
    user.updated_at = Utc::now();
    let email = user.email.clone();
    save_user(&write_txn, &user, &email)?;
    write_txn.commit()?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(ApiResponse::with_message(
        "Password updated successfully",
        (),
    )))
}

/// The caller's orders, newest first.
pub async fn orders(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<Vec<OrderView>>>> {
    let orders = orders_for_user(&state.db.begin_read()?, user.id)?;
    let views = orders
        .iter()
        .map(|order| OrderView::new(order, Some(&user)))
        .collect();
    Ok(Json(ApiResponse::ok(views)))
}

/// Someone else's order is reported exactly like a missing one.
pub async fn order(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let order_id = parse_id(&order_id, "order")?;
    let order = find_order(&state.db.begin_read()?, order_id)?
        .filter(|order| order.user == user.id)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(Json(ApiResponse::ok(OrderView::new(&order, Some(&user)))))
}

/// Owner cancellation of a pending order within 24 hours of placing it.
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let order_id = parse_id(&order_id, "order")?;

    let write_txn = state.db.begin_write()?;
    let mut order = require_order(&write_txn, order_id)?;
    if order.user != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this order".to_string(),
        ));
    }
    order.cancel(Utc::now())?;
    save_order(&write_txn, &order)?;
    write_txn.commit()?;

    info!(order_id = %order.id, user_id = %user.id, "order cancelled by owner");
    Ok(Json(ApiResponse::with_message(
        "Order cancelled successfully",
        OrderView::new(&order, Some(&user)),
    )))
}
