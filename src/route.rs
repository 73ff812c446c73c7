//! Route definitions for the storefront API
//!
//! Routes are grouped by the gate they sit behind: public, optionally
//! authenticated (review submission), authenticated, and admin.

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::database::AppState;
use crate::error::route_not_found;
use crate::handler::{admin, auth, cart, health, order, product, user, wishlist};
use crate::middleware::{optional_auth, require_admin, require_auth};

/// Creates the application router
///
/// # Route Definitions
///
/// - `POST /api/auth/register`, `POST /api/auth/login` - public
/// - `GET /api/auth/verify`, `POST /api/auth/logout-all` - authenticated
/// - `GET /api/products[/{id}|/sorted|/category/{category}]` - public catalog
/// - `POST /api/products/{id}/reviews` - anonymous or authenticated
/// - `/api/user/*` - the caller's profile, cart, wishlist and orders
/// - `POST /api/orders`, `GET /api/orders/{id}` - checkout and lookup
/// - `/api/admin/*` - product, user and order management
///
/// Layers added last run first, so the identity gate always precedes the admin gate.
pub fn create_app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/products", get(product::list))
        .route("/products/sorted", get(product::sorted))
        .route("/products/category/{category}", get(product::by_category))
        .route("/products/{id}", get(product::detail));

    let review_routes = Router::new()
        .route("/products/{id}/reviews", post(product::add_review))
        .layer(from_fn_with_state(state.clone(), optional_auth));

    let user_routes = Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/auth/logout-all", post(auth::logout_all))
        .route("/user/profile", get(user::profile))
        .route("/user/update", put(user::update_profile))
        .route("/user/change-password", put(user::change_password))
        .route(
            "/user/cart",
            get(cart::get_cart).post(cart::add_item).delete(cart::clear),
        )
        .route(
            "/user/cart/{product_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/user/wishlist", get(wishlist::get_wishlist))
        .route("/user/wishlist/{product_id}", post(wishlist::toggle))
        .route("/user/wishlist/check/{product_id}", get(wishlist::check))
        .route("/user/orders", get(user::orders))
        .route("/user/orders/{order_id}", get(user::order))
        .route("/user/orders/{order_id}/cancel", put(user::cancel_order))
        .route("/orders", post(order::create))
        .route("/orders/{id}", get(order::get))
        .layer(from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route(
            "/products",
            get(admin::list_products_admin).post(admin::create_product),
        )
        .route(
            "/products/{id}",
            get(admin::get_product)
                .put(admin::update_product)
                .delete(admin::delete_product_admin),
        )
        .route(
            "/users",
            get(admin::list_users_admin).post(admin::create_user),
        )
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user_admin),
        )
        .route("/orders", get(admin::list_orders_admin))
        .route(
            "/orders/{id}",
            get(admin::get_order).delete(admin::delete_order_admin),
        )
        .route("/orders/{id}/status", put(admin::update_order_status))
        .layer(from_fn(require_admin))
        .layer(from_fn_with_state(state.clone(), require_auth));

    let api_routes = public_routes
        .merge(review_routes)
        .merge(user_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
