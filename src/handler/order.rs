//! Order creation and lookup
//!
//! An order is built from explicit `items` or, when they are omitted, from
//! the purchaser's cart. Every product is resolved and snapshotted inside
//! the same write transaction that stores the order, so a missing product
//! aborts the whole checkout before anything is written.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use redb::ReadableDatabase;
use tracing::info;
use uuid::Uuid;

use super::Body;
use crate::database::{
    find_product, find_user, insert_order, parse_id, require_order, require_user, save_product,
    save_user, AppState,
};
use crate::dto::{ApiResponse, CreateOrderRequest, OrderView};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::model::{LineItem, Order};

/// `POST /api/orders`
///
/// - **201 Created** with the order view
/// - **400 Bad Request** for malformed ids, empty carts or invalid fields
/// - **403 Forbidden** when a customer orders on behalf of someone else
/// - **404 Not Found** naming the first product or user that does not exist
pub async fn create(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    payload: Body<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderView>>)> {
    let Json(req) = payload?;
    let details = req.checkout_details()?;

    let purchaser_id = match req.user_id.as_deref() {
        Some(raw) => parse_id(raw, "user")?,
        None => caller.id,
    };
    if purchaser_id != caller.id && !caller.is_admin() {
        return Err(AppError::Forbidden(
            "You can only place orders for yourself".to_string(),
        ));
    }

    let requested: Option<Vec<(Uuid, u32)>> = req
        .items
        .as_ref()
        .map(|items| {
            items
                .iter()
                .map(|item| -> AppResult<(Uuid, u32)> {
                    let id = Uuid::parse_str(item.product.trim()).map_err(|_| {
                        AppError::validation(format!("Invalid product ID: {}", item.product))
                    })?;
                    let quantity = u32::try_from(item.quantity)
                        .map_err(|_| AppError::validation("Quantity is too large"))?;
                    Ok((id, quantity))
                })
                .collect::<AppResult<_>>()
        })
        .transpose()?;

    let now = Utc::now();
    let write_txn = state.db.begin_write()?;
    let mut purchaser = require_user(&write_txn, purchaser_id)?;

    let from_cart = requested.is_none();
    let lines = match requested {
        Some(lines) => lines,
        None => {
            // Lines whose product has since been deleted are dropped, as in the cart view
            let mut lines = Vec::with_capacity(purchaser.cart.items.len());
            for item in &purchaser.cart.items {
                if find_product(&write_txn, item.product)?.is_some() {
                    lines.push((item.product, item.quantity));
                }
            }
            if lines.is_empty() {
                return Err(AppError::validation("Cart is empty"));
            }
            lines
        }
    };

    let mut items = Vec::with_capacity(lines.len());
    for (product_id, quantity) in lines {
        let mut product = find_product(&write_txn, product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Product not found: {product_id}")))?;
        items.push(LineItem::snapshot(&product, quantity));
        product.sales = product.sales.saturating_add(u64::from(quantity));
        save_product(&write_txn, &product)?;
    }

    let order = Order::new(
        purchaser.id,
        items,
        details.shipping_address,
        details.payment_method,
        Duration::days(state.config.delivery_days),
        now,
    );
    insert_order(&write_txn, &order)?;

    if from_cart {
        purchaser.cart.clear();
        purchaser.updated_at = now;
        let email = purchaser.email.clone();
        save_user(&write_txn, &purchaser, &email)?;
    }
    write_txn.commit()?;

    info!(order_id = %order.id, user_id = %purchaser.id, total = order.total, "order created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Order created successfully",
            OrderView::new(&order, Some(&purchaser)),
        )),
    ))
}

/// `GET /api/orders/:id`, for the owner or an admin.
pub async fn get(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let id = parse_id(&id, "order")?;
    let read_txn = state.db.begin_read()?;
    let order = require_order(&read_txn, id)?;
    if order.user != caller.id && !caller.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }
    let purchaser = find_user(&read_txn, order.user)?;
    Ok(Json(ApiResponse::ok(OrderView::new(&order, purchaser.as_ref()))))
}
