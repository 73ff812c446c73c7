//! Shared setup for the integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use redb::ReadableDatabase;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;
use uuid::Uuid;

use jewelry_shop::auth::hash_password;
use jewelry_shop::config::Config;
use jewelry_shop::database::{
    find_order, find_product, init_db, insert_user, save_order, save_product, AppState,
};
use jewelry_shop::model::{Cart, Category, Order, Product, Role, User, Wishlist};
use jewelry_shop::route::create_app;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub upload_dir: TempDir,
    _db: NamedTempFile,
}

/// Creates an app backed by a temporary database and upload directory
pub fn setup_test_app() -> TestApp {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();
    let db = init_db(db_path).expect("Failed to initialize test database");
    let upload_dir = TempDir::new().expect("Failed to create upload dir");

    let config = Config {
        bcrypt_cost: 4,
        upload_dir: upload_dir.path().to_path_buf(),
        ..Config::default()
    };
    let state = AppState::new(db, config);

    TestApp {
        app: create_app(state.clone()),
        state,
        upload_dir,
        _db: temp_db,
    }
}

/// Helper function to parse response body as JSON
pub async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

impl TestApp {
    /// Sends a request and returns the status with the parsed JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, response_json(response.into_body()).await)
    }

    /// Registers a customer and returns `(token, user id)`
    pub async fn register(&self, name: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "secret123",
                    "address": "Bole Road, Addis Ababa",
                    "phone": "+251912345678"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["data"]["token"].as_str().unwrap().to_string(),
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Stores an admin directly and logs in, returning the token
    pub async fn admin_token(&self) -> String {
        let now = Utc::now();
        let admin = User {
            id: Uuid::new_v4(),
            name: "Store Admin".to_string(),
            email: "admin@shop.com".to_string(),
            password_hash: hash_password("adminpass".to_string(), 4).await.unwrap(),
            phone: None,
            address: None,
            role: Role::Admin,
            joined: now,
            cart: Cart::default(),
            wishlist: Wishlist::default(),
            reviews: Vec::new(),
            token_version: 0,
            updated_at: now,
        };
        let txn = self.state.db.begin_write().unwrap();
        insert_user(&txn, &admin).unwrap();
        txn.commit().unwrap();

        let (status, body) = self
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": "admin@shop.com", "password": "adminpass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Stores a product directly and returns its id
    pub fn add_product(&self, name: &str, price: f64, category: Category) -> Uuid {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            original_price: None,
            stock: 10,
            category,
            on_sale: false,
            images: vec![format!("/uploads/{}.jpg", name.to_lowercase().replace(' ', "-"))],
            description: format!("{name} handcrafted in sterling silver"),
            rating: 0.0,
            review_count: 0,
            sales: 0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let txn = self.state.db.begin_write().unwrap();
        save_product(&txn, &product).unwrap();
        txn.commit().unwrap();
        product.id
    }

    pub fn product(&self, id: Uuid) -> Option<Product> {
        find_product(&self.state.db.begin_read().unwrap(), id).unwrap()
    }

    pub fn order(&self, id: Uuid) -> Order {
        find_order(&self.state.db.begin_read().unwrap(), id)
            .unwrap()
            .unwrap()
    }

    /// Rewrites a stored order, e.g. to move its creation time
    pub fn update_order(&self, id: Uuid, change: impl FnOnce(&mut Order)) {
        let txn = self.state.db.begin_write().unwrap();
        let mut order = find_order(&txn, id).unwrap().unwrap();
        change(&mut order);
        save_order(&txn, &order).unwrap();
        txn.commit().unwrap();
    }

    pub fn update_product(&self, id: Uuid, change: impl FnOnce(&mut Product)) {
        let txn = self.state.db.begin_write().unwrap();
        let mut product = find_product(&txn, id).unwrap().unwrap();
        change(&mut product);
        save_product(&txn, &product).unwrap();
        txn.commit().unwrap();
    }
}
