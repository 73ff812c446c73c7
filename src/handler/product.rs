//! Public catalog endpoints and review submission

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use redb::ReadableDatabase;
use tracing::info;
use uuid::Uuid;

use super::Body;
use crate::database::{
    find_user, list_products, parse_id, require_product, reviews_by_ids, save_product,
    save_review, save_user, AppState,
};
use crate::dto::{
    ApiResponse, LimitQuery, ProductDetailView, ProductListingView, ProductSort,
    ReviewCreatedView, ReviewRequest, ReviewView, SortedQuery,
};
use crate::error::AppResult;
use crate::middleware::Viewer;
use crate::model::{Category, Product, Review};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn listing(products: &[Product]) -> Vec<ProductListingView> {
    products.iter().map(ProductListingView::from).collect()
}

/// Every product, newest first.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<ProductListingView>>>> {
    let mut products = list_products(&state.db.begin_read()?)?;
    products.reverse();
    Ok(Json(ApiResponse::ok(listing(&products))))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetailView>>> {
    let id = parse_id(&id, "product")?;
    let read_txn = state.db.begin_read()?;
    let product = require_product(&read_txn, id)?;
    let reviews = reviews_by_ids(&read_txn, &product.reviews)?;
    Ok(Json(ApiResponse::ok(ProductDetailView::new(&product, reviews))))
}

/// `GET /api/products/sorted?sortBy=&limit=&category=`
pub async fn sorted(
    State(state): State<AppState>,
    query: Result<Query<SortedQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<ProductListingView>>>> {
    let Query(query) = query?;
    let sort: ProductSort = query.sort_by.as_deref().unwrap_or("latest").parse()?;
    let category = query
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()?;
    let limit = clamp_limit(query.limit);

    let mut products = list_products(&state.db.begin_read()?)?;
    if let Some(category) = category {
        products.retain(|p| p.category == category);
    }
    sort.sort(&mut products);
    products.truncate(limit);

    Ok(Json(ApiResponse::ok(listing(&products))))
}

/// Newest products of one category, used for "related products".
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<ProductListingView>>>> {
    let Query(query) = query?;
    let category: Category = category.parse()?;

    let mut products = list_products(&state.db.begin_read()?)?;
    products.retain(|p| p.category == category);
    products.reverse();
    products.truncate(clamp_limit(query.limit));

    Ok(Json(ApiResponse::ok(listing(&products))))
}

/// Appends a review and recomputes the product's rating from all of its reviews.
///
/// The request may be anonymous. Product lookup, review insert, aggregate
/// update and author attribution share one write transaction.
pub async fn add_review(
    State(state): State<AppState>,
    Extension(Viewer(viewer)): Extension<Viewer>,
    Path(id): Path<String>,
    payload: Body<ReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ReviewCreatedView>>)> {
    let product_id = parse_id(&id, "product")?;
    let Json(req) = payload?;
    let (rating, comment) = req.validate()?;

    let now = Utc::now();
    let write_txn = state.db.begin_write()?;
    let mut product = require_product(&write_txn, product_id)?;

    let review = Review {
        id: Uuid::new_v4(),
        user: viewer.as_ref().map(|u| u.id),
        product: product.id,
        rating,
        comment,
        created_at: now,
    };
    save_review(&write_txn, &review)?;

    product.reviews.push(review.id);
    let ratings: Vec<u8> = reviews_by_ids(&write_txn, &product.reviews)?
        .iter()
        .map(|r| r.rating)
        .collect();
    product.apply_ratings(&ratings);
    product.updated_at = now;
    save_product(&write_txn, &product)?;

    if let Some(author) = &viewer {
        if let Some(mut user) = find_user(&write_txn, author.id)? {
            user.reviews.push(review.id);
            let email = user.email.clone();
            save_user(&write_txn, &user, &email)?;
        }
    }
    write_txn.commit()?;

    info!(product_id = %product.id, rating = product.rating, "review added");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Review added successfully",
            ReviewCreatedView {
                review: ReviewView::from(&review),
                rating: product.rating,
                review_count: product.review_count,
            },
        )),
    ))
}
