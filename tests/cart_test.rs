mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::setup_test_app;
use jewelry_shop::model::Category;

#[tokio::test]
async fn test_cart_requires_auth() {
    let t = setup_test_app();
    let (status, body) = t.send("GET", "/api/user/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_add_same_product_merges_quantities() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let ring = t.add_product("Silver Ring", 50.0, Category::Rings);

    let (status, _) = t
        .send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": ring, "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t
        .send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": ring, "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["name"], "Silver Ring");
    assert_eq!(body["data"]["total"], 250.0);
}

#[tokio::test]
async fn test_oversized_quantities_are_rejected() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let ring = t.add_product("Silver Ring", 50.0, Category::Rings);

    let (status, body) = t
        .send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": ring, "quantity": 5_000_000_000_i64 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity is too large");

    t.send(
        "POST",
        "/api/user/cart",
        Some(&token),
        Some(json!({ "productId": ring, "quantity": 2 })),
    )
    .await;
    let (status, body) = t
        .send(
            "PUT",
            &format!("/api/user/cart/{ring}"),
            Some(&token),
            Some(json!({ "quantity": 5_000_000_000_i64 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Quantity is too large");

    let (_, body) = t.send("GET", "/api/user/cart", Some(&token), None).await;
    assert_eq!(body["data"]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_add_defaults_to_one_and_validates_product() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let charm = t.add_product("Heart Charm", 20.0, Category::Charms);

    let (_, body) = t
        .send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": charm })),
        )
        .await;
    assert_eq!(body["data"]["items"][0]["quantity"], 1);

    let (status, body) = t
        .send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": "not-a-uuid" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid product ID");

    let (status, body) = t
        .send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn test_update_sets_absolute_quantity_and_zero_removes() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let ring = t.add_product("Silver Ring", 50.0, Category::Rings);
    let earrings = t.add_product("Gold Hoops", 80.0, Category::Earrings);

    for product in [ring, earrings] {
        t.send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": product, "quantity": 2 })),
        )
        .await;
    }

    let (status, body) = t
        .send(
            "PUT",
            &format!("/api/user/cart/{ring}"),
            Some(&token),
            Some(json!({ "quantity": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["quantity"], 7);

    let (status, body) = t
        .send(
            "PUT",
            &format!("/api/user/cart/{ring}"),
            Some(&token),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["productId"], earrings.to_string());
}

#[tokio::test]
async fn test_update_missing_item_is_not_found_but_remove_is_noop() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let ring = t.add_product("Silver Ring", 50.0, Category::Rings);

    let (status, body) = t
        .send(
            "PUT",
            &format!("/api/user/cart/{ring}"),
            Some(&token),
            Some(json!({ "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Item not found in cart");

    let (status, body) = t
        .send("DELETE", &format!("/api/user/cart/{ring}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_cart_shows_current_prices_and_skips_deleted_products() {
    let t = setup_test_app();
    let admin = t.admin_token().await;
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let ring = t.add_product("Silver Ring", 50.0, Category::Rings);
    let bracelet = t.add_product("Tennis Bracelet", 120.0, Category::Bracelets);

    for product in [ring, bracelet] {
        t.send(
            "POST",
            "/api/user/cart",
            Some(&token),
            Some(json!({ "productId": product })),
        )
        .await;
    }

    t.update_product(ring, |p| p.price = 65.0);
    let (status, _) = t
        .send("DELETE", &format!("/api/admin/products/{bracelet}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = t.send("GET", "/api/user/cart", Some(&token), None).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["price"], 65.0);
    assert_eq!(body["data"]["total"], 65.0);
}

#[tokio::test]
async fn test_clear_cart() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let ring = t.add_product("Silver Ring", 50.0, Category::Rings);
    t.send(
        "POST",
        "/api/user/cart",
        Some(&token),
        Some(json!({ "productId": ring })),
    )
    .await;

    let (status, body) = t.send("DELETE", "/api/user/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["total"], 0.0);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let t = setup_test_app();
    let (hana, _) = t.register("Hana", "hana@example.com").await;
    let (sami, _) = t.register("Sami", "sami@example.com").await;
    let ring = t.add_product("Silver Ring", 50.0, Category::Rings);

    t.send(
        "POST",
        "/api/user/cart",
        Some(&hana),
        Some(json!({ "productId": ring })),
    )
    .await;

    let (_, body) = t.send("GET", "/api/user/cart", Some(&sami), None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_wishlist_toggle_twice_restores_membership() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    let necklace = t.add_product("Pearl Necklace", 150.0, Category::Necklaces);
    let uri = format!("/api/user/wishlist/{necklace}");
    let check_uri = format!("/api/user/wishlist/check/{necklace}");

    let (_, body) = t.send("GET", &check_uri, Some(&token), None).await;
    assert_eq!(body["data"]["isInWishlist"], false);

    let (status, body) = t.send("POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isInWishlist"], true);
    assert_eq!(body["data"]["wishlist"][0]["name"], "Pearl Necklace");

    let (_, body) = t.send("GET", &check_uri, Some(&token), None).await;
    assert_eq!(body["data"]["isInWishlist"], true);

    let (_, body) = t.send("POST", &uri, Some(&token), None).await;
    assert_eq!(body["data"]["isInWishlist"], false);
    assert_eq!(body["data"]["wishlist"].as_array().unwrap().len(), 0);

    let (_, body) = t.send("GET", "/api/user/wishlist", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_wishlist_toggle_unknown_product() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;

    let (status, _) = t
        .send(
            "POST",
            &format!("/api/user/wishlist/{}", Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .send("POST", "/api/user/wishlist/bogus", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
