//! Admin-only management of products, users and orders
//!
//! Mounted behind both the identity gate and the admin gate.

use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use redb::ReadableDatabase;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Body;
use crate::auth::hash_password;
use crate::database::{
    delete_order, delete_product, delete_user, find_user, find_user_by_email, insert_user,
    list_orders, list_products, list_users, parse_id, require_order, require_product,
    require_user, save_order, save_product, save_user, AppState,
};
use crate::dto::{
    AdminCreateUserRequest, AdminUpdateUserRequest, AdminUserView, ApiResponse, OrderView,
    ProductAdminView, ProductRequest, StatusUpdateRequest,
};
use crate::error::{AppError, AppResult};
use crate::model::{Cart, User, Wishlist};

const UPLOADS_PREFIX: &str = "/uploads/";

// ---------------- products ----------------

pub async fn list_products_admin(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ProductAdminView>>>> {
    let products = list_products(&state.db.begin_read()?)?;
    let views = products.iter().rev().map(ProductAdminView::from).collect();
    Ok(Json(ApiResponse::ok(views)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductAdminView>>> {
    let id = parse_id(&id, "product")?;
    let product = require_product(&state.db.begin_read()?, id)?;
    Ok(Json(ApiResponse::ok(ProductAdminView::from(&product))))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Body<ProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductAdminView>>)> {
    let Json(req) = payload?;
    let draft = req.validate_new()?;

    let product = draft.into_product(Utc::now());

    let write_txn = state.db.begin_write()?;
    save_product(&write_txn, &product)?;
    write_txn.commit()?;

    info!(product_id = %product.id, name = %product.name, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Product created successfully",
            ProductAdminView::from(&product),
        )),
    ))
}

/// Partial update. Rating, review count and sales are never touched here.
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Body<ProductRequest>,
) -> AppResult<Json<ApiResponse<ProductAdminView>>> {
    let id = parse_id(&id, "product")?;
    let Json(req) = payload?;

    let write_txn = state.db.begin_write()?;
    let mut product = require_product(&write_txn, id)?;
    req.validate_update(&product)?.apply_to(&mut product);
    product.updated_at = Utc::now();
    save_product(&write_txn, &product)?;
    write_txn.commit()?;

    info!(product_id = %product.id, "product updated");
    Ok(Json(ApiResponse::with_message(
        "Product updated successfully",
        ProductAdminView::from(&product),
    )))
}

/// Deletes the product, then removes its uploaded images on a best-effort basis.
pub async fn delete_product_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "product")?;

    let write_txn = state.db.begin_write()?;
    let product = delete_product(&write_txn, id)?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    write_txn.commit()?;

    remove_uploaded_images(&state.config.upload_dir, &product.images).await;

    info!(product_id = %product.id, "product deleted");
    Ok(Json(ApiResponse::with_message(
        "Product deleted successfully",
        (),
    )))
}

/// Maps an `/uploads/<file>` image path onto the upload directory.
/// Anything else, including paths that would escape the directory, is skipped.
fn upload_path(upload_dir: &FsPath, image: &str) -> Option<PathBuf> {
    let name = image.strip_prefix(UPLOADS_PREFIX)?;
    let relative = FsPath::new(name);
    let safe = !name.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    safe.then(|| upload_dir.join(relative))
}

async fn remove_uploaded_images(upload_dir: &FsPath, images: &[String]) {
    for image in images {
        let Some(path) = upload_path(upload_dir, image) else {
            continue;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "removed product image"),
            Err(err) => warn!(path = %path.display(), error = %err, "failed to remove product image"),
        }
    }
}

// ---------------- users ----------------

pub async fn list_users_admin(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<AdminUserView>>>> {
    let users = list_users(&state.db.begin_read()?)?;
    let views = users.iter().map(AdminUserView::from).collect();
    Ok(Json(ApiResponse::ok(views)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<AdminUserView>>> {
    let id = parse_id(&id, "user")?;
    let user = require_user(&state.db.begin_read()?, id)?;
    Ok(Json(ApiResponse::ok(AdminUserView::from(&user))))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Body<AdminCreateUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AdminUserView>>)> {
    let Json(req) = payload?;
    let (new_user, role) = req.validate()?;

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
        role,
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

    info!(user_id = %user.id, role = ?user.role, "user created by admin");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User created successfully",
            AdminUserView::from(&user),
        )),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Body<AdminUpdateUserRequest>,
) -> AppResult<Json<ApiResponse<AdminUserView>>> {
    let id = parse_id(&id, "user")?;
    let Json(req) = payload?;

    let write_txn = state.db.begin_write()?;
    let mut user = require_user(&write_txn, id)?;
    let previous_email = user.email.clone();
    req.apply(&mut user)?;
    user.updated_at = Utc::now();
    save_user(&write_txn, &user, &previous_email)?;
    write_txn.commit()?;

    Ok(Json(ApiResponse::with_message(
        "User updated successfully",
        AdminUserView::from(&user),
    )))
}

pub async fn delete_user_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "user")?;

    let write_txn = state.db.begin_write()?;
    let user = delete_user(&write_txn, id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    write_txn.commit()?;

    info!(user_id = %user.id, "user deleted");
    Ok(Json(ApiResponse::with_message("User deleted successfully", ())))
}

// ---------------- orders ----------------

pub async fn list_orders_admin(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<OrderView>>>> {
    let read_txn = state.db.begin_read()?;
    let orders = list_orders(&read_txn)?;
    let mut views = Vec::with_capacity(orders.len());
    for order in &orders {
        let purchaser = find_user(&read_txn, order.user)?;
        views.push(OrderView::new(order, purchaser.as_ref()));
    }
    Ok(Json(ApiResponse::ok(views)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let id = parse_id(&id, "order")?;
    let read_txn = state.db.begin_read()?;
    let order = require_order(&read_txn, id)?;
    let purchaser = find_user(&read_txn, order.user)?;
    Ok(Json(ApiResponse::ok(OrderView::new(&order, purchaser.as_ref()))))
}

/// `PUT /api/admin/orders/:id/status`
///
/// Re-applying the current status succeeds without modifying the order.
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Body<StatusUpdateRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let id = parse_id(&id, "order")?;
    let Json(req) = payload?;
    let status = req.validate()?;

    let write_txn = state.db.begin_write()?;
    let mut order = require_order(&write_txn, id)?;
    if order.set_status(status, Utc::now())? {
        save_order(&write_txn, &order)?;
        info!(order_id = %order.id, status = status.as_str(), "order status updated");
    }
    let purchaser = find_user(&write_txn, order.user)?;
    write_txn.commit()?;

    Ok(Json(ApiResponse::with_message(
        "Order status updated",
        OrderView::new(&order, purchaser.as_ref()),
    )))
}

/// Unconditional hard delete.
pub async fn delete_order_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "order")?;

    let write_txn = state.db.begin_write()?;
    let order = delete_order(&write_txn, id)?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    write_txn.commit()?;

    info!(order_id = %order.id, "order deleted");
    Ok(Json(ApiResponse::with_message("Order deleted successfully", ())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_paths_stay_inside_upload_dir() {
        let dir = FsPath::new("uploads");
        assert_eq!(
            upload_path(dir, "/uploads/ring-1.jpg"),
            Some(PathBuf::from("uploads/ring-1.jpg"))
        );
        assert_eq!(upload_path(dir, "/uploads/../Cargo.toml"), None);
        assert_eq!(upload_path(dir, "/uploads/"), None);
        assert_eq!(upload_path(dir, "https://cdn.example.com/ring.jpg"), None);
    }
}
