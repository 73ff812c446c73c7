//! The caller's cart
//!
//! Every mutation reloads the user inside a write transaction, applies the
//! change and returns the cart joined with current product data.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use redb::{ReadableDatabase, WriteTransaction};
use uuid::Uuid;

use super::{products_by_id, Body};
use crate::database::{
    parse_id, require_product, require_user, save_user, AppState, RecordReader,
};
use crate::dto::{AddToCartRequest, ApiResponse, CartView, UpdateCartRequest};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::model::{Cart, User};

fn cart_view(tx: &impl RecordReader, cart: &Cart) -> AppResult<CartView> {
    let products = products_by_id(tx, cart.items.iter().map(|item| item.product))?;
    Ok(CartView::new(cart, &products))
}

/// Runs `mutate` on the caller's stored cart and persists the result.
fn mutate_cart(
    state: &AppState,
    user_id: Uuid,
    mutate: impl FnOnce(&WriteTransaction, &mut User) -> AppResult<()>,
) -> AppResult<CartView> {
    let write_txn = state.db.begin_write()?;
    let mut user = require_user(&write_txn, user_id)?;
    mutate(&write_txn, &mut user)?;
    user.updated_at = Utc::now();
    let email = user.email.clone();
    save_user(&write_txn, &user, &email)?;
    let view = cart_view(&write_txn, &user.cart)?;
    write_txn.commit()?;
    Ok(view)
}

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let view = cart_view(&state.db.begin_read()?, &user.cart)?;
    Ok(Json(ApiResponse::ok(view)))
}

/// Adds `quantity` (default 1) of a product, merging with an existing line.
pub async fn add_item(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    payload: Body<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let Json(req) = payload?;
    let raw_id = req
        .product_id
        .ok_or_else(|| AppError::validation("Product ID is required"))?;
    let product_id = parse_id(&raw_id, "product")?;
    let quantity = req.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }
    let quantity =
        u32::try_from(quantity).map_err(|_| AppError::validation("Quantity is too large"))?;

    let view = mutate_cart(&state, caller.id, |txn, user| {
        require_product(txn, product_id)?;
        user.cart.add(product_id, quantity)
    })?;
    Ok(Json(ApiResponse::with_message("Item added to cart", view)))
}

/// Sets a line's quantity; zero or less removes the line.
pub async fn update_item(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(product_id): Path<String>,
    payload: Body<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let product_id = parse_id(&product_id, "product")?;
    let Json(req) = payload?;
    let quantity = req
        .quantity
        .ok_or_else(|| AppError::validation("Quantity is required"))?;

    let view = mutate_cart(&state, caller.id, |_, user| {
        user.cart.set_quantity(product_id, quantity)
    })?;
    Ok(Json(ApiResponse::with_message("Cart updated", view)))
}

/// Removing a product that is not in the cart succeeds without change.
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let product_id = parse_id(&product_id, "product")?;
    let view = mutate_cart(&state, caller.id, |_, user| {
        user.cart.remove(product_id);
        Ok(())
    })?;
    Ok(Json(ApiResponse::with_message("Item removed from cart", view)))
}

pub async fn clear(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let view = mutate_cart(&state, caller.id, |_, user| {
        user.cart.clear();
        Ok(())
    })?;
    Ok(Json(ApiResponse::with_message("Cart cleared", view)))
}
