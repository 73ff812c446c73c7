//! HTTP request handlers
//!
//! Handlers validate their input, open one redb transaction for the whole
//! operation and return an [`ApiResponse`](crate::dto::ApiResponse) or an
//! [`AppError`](crate::error::AppError).

use std::collections::HashMap;

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::{find_product, RecordReader};
use crate::dto::ApiResponse;
use crate::error::AppResult;
use crate::model::Product;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod order;
pub mod product;
pub mod user;
pub mod wishlist;

/// A JSON body whose rejection is reported through the error envelope.
pub type Body<T> = Result<Json<T>, JsonRejection>;

/// Loads the given products, skipping ids that no longer resolve.
pub(crate) fn products_by_id(
    tx: &impl RecordReader,
    ids: impl IntoIterator<Item = Uuid>,
) -> AppResult<HashMap<Uuid, Product>> {
    let mut products = HashMap::new();
    for id in ids {
        if let Some(product) = find_product(tx, id)? {
            products.insert(id, product);
        }
    }
    Ok(products)
}

pub async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({ "status": "ok" })))
}
