use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use redb::ReadableDatabase;

use super::products_by_id;
use crate::database::{parse_id, require_product, require_user, save_user, AppState, RecordReader};
use crate::dto::{wishlist_view, ApiResponse, WishlistCheckView, WishlistItemView, WishlistToggleView};
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::model::Wishlist;

fn populated(tx: &impl RecordReader, wishlist: &Wishlist) -> AppResult<Vec<WishlistItemView>> {
    let products = products_by_id(tx, wishlist.products())?;
    Ok(wishlist_view(wishlist, &products))
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<Vec<WishlistItemView>>>> {
    let items = populated(&state.db.begin_read()?, &user.wishlist)?;
    Ok(Json(ApiResponse::ok(items)))
}

/// Adds the product when absent, removes it when present.
pub async fn toggle(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<WishlistToggleView>>> {
    let product_id = parse_id(&product_id, "product")?;

    let write_txn = state.db.begin_write()?;
    require_product(&write_txn, product_id)?;
    let mut user = require_user(&write_txn, caller.id)?;
    let is_in_wishlist = user.wishlist.toggle(product_id);
    user.updated_at = Utc::now();
    let email = user.email.clone();
    save_user(&write_txn, &user, &email)?;
    let wishlist = populated(&write_txn, &user.wishlist)?;
    write_txn.commit()?;

    let message = if is_in_wishlist {
        "Added to wishlist"
    } else {
        "Removed from wishlist"
    };
    Ok(Json(ApiResponse::with_message(
        message,
        WishlistToggleView {
            is_in_wishlist,
            wishlist,
        },
    )))
}

pub async fn check(
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<WishlistCheckView>>> {
    let product_id = parse_id(&product_id, "product")?;
    Ok(Json(ApiResponse::ok(WishlistCheckView {
        is_in_wishlist: user.wishlist.contains(product_id),
    })))
}
