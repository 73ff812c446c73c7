mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::setup_test_app;

#[tokio::test]
async fn test_register_returns_token_and_hides_password() {
    let t = setup_test_app();

    let (status, body) = t
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Hana",
                "email": "  Hana@Example.com ",
                "password": "secret123"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].as_str().unwrap().split('.').count() == 3);
    let user = &body["data"]["user"];
    assert_eq!(user["email"], "hana@example.com");
    assert_eq!(user["role"], "customer");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_missing_fields() {
    let t = setup_test_app();

    let (status, body) = t
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "a@b.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Name, email, and password are required");
}

#[tokio::test]
async fn test_register_reports_every_violation() {
    let t = setup_test_app();

    let (status, body) = t
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "H",
                "email": "nope",
                "password": "123"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_register_duplicate_email_case_insensitive() {
    let t = setup_test_app();
    t.register("Hana", "hana@example.com").await;

    let (status, body) = t
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Other Hana",
                "email": "HANA@example.com",
                "password": "secret456"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_login_does_not_reveal_which_part_failed() {
    let t = setup_test_app();
    t.register("Hana", "hana@example.com").await;

    let (wrong_pw_status, wrong_pw) = t
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "hana@example.com", "password": "wrongpass" })),
        )
        .await;
    let (unknown_status, unknown) = t
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "secret123" })),
        )
        .await;

    assert_eq!(wrong_pw_status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_pw["message"], "Invalid credentials");
    assert_eq!(wrong_pw, unknown);
}

#[tokio::test]
async fn test_login_then_verify() {
    let t = setup_test_app();
    let (_, id) = t.register("Hana", "hana@example.com").await;

    let (status, body) = t
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "HANA@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = t.send("GET", "/api/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["name"], "Hana");
}

#[tokio::test]
async fn test_verify_requires_valid_token() {
    let t = setup_test_app();

    let (status, body) = t.send("GET", "/api/auth/verify", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, _) = t
        .send("GET", "/api/auth/verify", Some("abc.def.ghi"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_all_revokes_existing_tokens() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;

    let (status, _) = t.send("POST", "/api/auth/logout-all", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.send("GET", "/api/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found or token revoked");

    // A fresh login works again
    let (status, _) = t
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "hana@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_user_token_is_rejected() {
    let t = setup_test_app();
    let admin = t.admin_token().await;
    let (token, id) = t.register("Hana", "hana@example.com").await;

    let (status, _) = t
        .send("DELETE", &format!("/api/admin/users/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.send("GET", "/api/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_and_password_change() {
    let t = setup_test_app();
    let (token, _) = t.register("Hana", "hana@example.com").await;
    t.register("Sami", "sami@example.com").await;

    let (status, body) = t
        .send(
            "PUT",
            "/api/user/update",
            Some(&token),
            Some(json!({ "email": "sami@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email is already in use");

    let (status, body) = t
        .send(
            "PUT",
            "/api/user/update",
            Some(&token),
            Some(json!({ "name": "Hana Tesfaye", "email": "hana.t@example.com", "phone": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Hana Tesfaye");
    assert_eq!(body["data"]["email"], "hana.t@example.com");
    assert_eq!(body["data"]["phone"], "+251912345678");

    let (status, body) = t
        .send(
            "PUT",
            "/api/user/change-password",
            Some(&token),
            Some(json!({ "currentPassword": "wrong", "newPassword": "newsecret" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect current password");

    let (status, _) = t
        .send(
            "PUT",
            "/api/user/change-password",
            Some(&token),
            Some(json!({ "currentPassword": "secret123", "newPassword": "newsecret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "hana.t@example.com", "password": "newsecret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "hana@example.com", "password": "newsecret" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_and_unknown_route_use_envelope() {
    let t = setup_test_app();

    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;
        t.app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap()
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::response_json(response.into_body()).await;
    assert_eq!(body["success"], false);

    let (status, body) = t.send("GET", "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");

    let (status, body) = t.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}
