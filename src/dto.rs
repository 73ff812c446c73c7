//! Request payloads, their validation, and response views
//!
//! Each request struct deserializes leniently (every field optional) and is
//! then validated into a typed draft. Validation collects every violation
//! so the client receives them all in a single 400 response.
//!
//! Views are the only shapes that leave the server. There is one view per
//! entity per audience; none of them carries a password hash.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::{
    Cart, Category, DeliveryMethod, LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus,
    Product, Review, Role, User, Wishlist,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("valid email pattern")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("valid phone pattern"));

const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

// ---------------- envelope ----------------

/// Success envelope: `{"success": true, "message"?: "...", "data": ...}`
#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

// ---------------- validation ----------------

/// Accumulates constraint violations.
#[derive(Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.0.push(message.into());
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn finish<T>(self, value: T) -> AppResult<T> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_name(v: &mut Violations, name: &str) {
    let len = name.chars().count();
    v.check(len >= 2, "Name must be at least 2 characters long");
    v.check(len <= 100, "Name cannot exceed 100 characters");
}

fn check_email(v: &mut Violations, email: &str) {
    v.check(EMAIL_RE.is_match(email), "Please provide a valid email address");
}

fn check_password(v: &mut Violations, password: &str) {
    v.check(
        password.chars().count() >= 6,
        "Password must be at least 6 characters long",
    );
}

fn check_phone(v: &mut Violations, phone: &str) {
    v.check(
        PHONE_RE.is_match(phone),
        "Please provide a valid phone number (e.g., +251912345678)",
    );
}

fn check_address(v: &mut Violations, address: &str) {
    let len = address.chars().count();
    v.check(len >= 5, "Address must be at least 5 characters long");
    v.check(len <= 200, "Address cannot exceed 200 characters");
}

// ---------------- auth & profile requests ----------------

#[derive(Deserialize, Debug, Default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// A validated registration. `email` is normalized.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> AppResult<NewUser> {
        let name = non_empty(self.name);
        let email = non_empty(self.email).map(|e| normalize_email(&e));
        let password = self.password.filter(|p| !p.is_empty());
        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(AppError::validation(
                "Name, email, and password are required",
            ));
        };
        let address = non_empty(self.address);
        let phone = non_empty(self.phone);

        let mut v = Violations::default();
        check_name(&mut v, &name);
        check_email(&mut v, &email);
        check_password(&mut v, &password);
        if let Some(address) = &address {
            check_address(&mut v, address);
        }
        if let Some(phone) = &phone {
            check_phone(&mut v, phone);
        }

        v.finish(NewUser {
            name,
            email,
            password,
            address,
            phone,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns the normalized email and the password.
    pub fn validate(self) -> AppResult<(String, String)> {
        match (non_empty(self.email), self.password.filter(|p| !p.is_empty())) {
            (Some(email), Some(password)) => Ok((normalize_email(&email), password)),
            _ => Err(AppError::validation("Email and password are required")),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl UpdateProfileRequest {
    /// Applies every provided, non-empty field to `user` after validating it.
    pub fn apply(self, user: &mut User) -> AppResult<()> {
        let mut v = Violations::default();
        let name = non_empty(self.name);
        let email = non_empty(self.email).map(|e| normalize_email(&e));
        let phone = non_empty(self.phone);
        let address = non_empty(self.address);

        if let Some(name) = &name {
            check_name(&mut v, name);
        }
        if let Some(email) = &email {
            check_email(&mut v, email);
        }
        if let Some(phone) = &phone {
            check_phone(&mut v, phone);
        }
        if let Some(address) = &address {
            check_address(&mut v, address);
        }
        v.finish(())?;

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if phone.is_some() {
            user.phone = phone;
        }
        if address.is_some() {
            user.address = address;
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl ChangePasswordRequest {
    /// Returns `(current, new)`.
    pub fn validate(self) -> AppResult<(String, String)> {
        let (Some(current), Some(new)) = (
            self.current_password.filter(|p| !p.is_empty()),
            self.new_password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::validation(
                "Both current and new passwords are required",
            ));
        };
        let mut v = Violations::default();
        check_password(&mut v, &new);
        v.finish((current, new))
    }
}

// ---------------- cart requests ----------------

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateCartRequest {
    pub quantity: Option<i64>,
}

// ---------------- order requests ----------------

#[derive(Deserialize, Debug, Clone)]
pub struct OrderItemRequest {
    #[serde(alias = "productId")]
    pub product: String,
    pub quantity: i64,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: Option<String>,
    /// When absent, the caller's cart is checked out
    pub items: Option<Vec<OrderItemRequest>>,
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
}

/// Validated order fields apart from the product lines.
#[derive(Debug)]
pub struct CheckoutDetails {
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
}

impl CreateOrderRequest {
    pub fn checkout_details(&self) -> AppResult<CheckoutDetails> {
        let mut v = Violations::default();

        let shipping_address = self
            .shipping_address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        v.check(!shipping_address.is_empty(), "Shipping address is required");

        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => PaymentMethod::default(),
            Some(raw) => match raw.parse() {
                Ok(method) => method,
                Err(_) => {
                    v.push(format!("{raw} is not a supported payment method"));
                    PaymentMethod::default()
                }
            },
        };

        if let Some(items) = &self.items {
            v.check(!items.is_empty(), "Order must contain at least one item");
            for item in items {
                v.check(
                    item.quantity >= 1,
                    format!("Quantity for product {} must be at least 1", item.product),
                );
                v.check(
                    item.quantity <= i64::from(u32::MAX),
                    format!("Quantity for product {} is too large", item.product),
                );
            }
        }

        v.finish(CheckoutDetails {
            shipping_address,
            payment_method,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

impl StatusUpdateRequest {
    pub fn validate(self) -> AppResult<OrderStatus> {
        self.status
            .as_deref()
            .ok_or_else(|| AppError::validation("Invalid status"))?
            .parse()
    }
}

// ---------------- review requests ----------------

#[derive(Deserialize, Debug, Default)]
pub struct ReviewRequest {
    /// Kept untyped so a non-numeric rating is a validation error, not a parse failure
    pub rating: Option<serde_json::Value>,
    pub comment: Option<String>,
}

impl ReviewRequest {
    pub fn validate(self) -> AppResult<(u8, String)> {
        let mut v = Violations::default();
        let rating = match self.rating.as_ref().and_then(serde_json::Value::as_f64) {
            Some(r) if (1.0..=5.0).contains(&r) && r.fract() == 0.0 => r as u8,
            _ => {
                v.push("Rating must be a whole number between 1 and 5");
                0
            }
        };
        let comment = self.comment.unwrap_or_default().trim().to_string();
        v.check(
            comment.chars().count() <= 500,
            "Comment cannot exceed 500 characters",
        );
        v.finish((rating, comment))
    }
}

// ---------------- product requests ----------------

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub on_sale: Option<bool>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
}

/// Validated catalog fields, shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub stock: u32,
    pub category: Category,
    pub on_sale: bool,
    pub images: Vec<String>,
    pub description: String,
}

impl ProductDraft {
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price,
            original_price: product.original_price,
            stock: product.stock,
            category: product.category,
            on_sale: product.on_sale,
            images: product.images.clone(),
            description: product.description.clone(),
        }
    }

    /// A new catalog record with empty review aggregates.
    pub fn into_product(self, now: DateTime<Utc>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: self.name,
            price: self.price,
            original_price: self.original_price,
            stock: self.stock,
            category: self.category,
            on_sale: self.on_sale,
            images: self.images,
            description: self.description,
            rating: 0.0,
            review_count: 0,
            sales: 0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(self, product: &mut Product) {
        product.name = self.name;
        product.price = self.price;
        product.original_price = self.original_price;
        product.stock = self.stock;
        product.category = self.category;
        product.on_sale = self.on_sale;
        product.images = self.images;
        product.description = self.description;
    }
}

impl ProductRequest {
    /// Validates a full product for creation; all catalog fields are required.
    pub fn validate_new(self) -> AppResult<ProductDraft> {
        let missing = self.name.is_none()
            || self.price.is_none()
            || self.stock.is_none()
            || self.category.is_none()
            || self.description.is_none();
        if missing {
            return Err(AppError::validation("Missing required fields"));
        }
        self.merge_into(None)
    }

    /// Overlays the provided fields on `current`, then validates the result.
    /// An explicit `onSale: false` clears the original price.
    pub fn validate_update(self, current: &Product) -> AppResult<ProductDraft> {
        self.merge_into(Some(ProductDraft::from_product(current)))
    }

    fn merge_into(self, base: Option<ProductDraft>) -> AppResult<ProductDraft> {
        let mut v = Violations::default();

        let name = non_empty(self.name)
            .or_else(|| base.as_ref().map(|b| b.name.clone()))
            .unwrap_or_default();
        let len = name.chars().count();
        v.check(len >= 3, "Product name must be at least 3 characters long");
        v.check(len <= 100, "Product name cannot exceed 100 characters");

        let price = self
            .price
            .or_else(|| base.as_ref().map(|b| b.price))
            .unwrap_or_default();
        v.check(
            price.is_finite() && price >= 0.0,
            "Product price cannot be negative",
        );

        let stock = match self.stock {
            Some(s) if s < 0 => {
                v.push("Stock cannot be negative");
                0
            }
            Some(s) => u32::try_from(s).unwrap_or_else(|_| {
                v.push("Stock is too large");
                0
            }),
            None => base.as_ref().map(|b| b.stock).unwrap_or_default(),
        };

        let category = match self.category.as_deref().map(str::trim) {
            Some(raw) => match raw.parse::<Category>() {
                Ok(c) => Some(c),
                Err(err) => {
                    v.push(err.to_string());
                    None
                }
            },
            None => base.as_ref().map(|b| b.category),
        };

        let on_sale = self
            .on_sale
            .or_else(|| base.as_ref().map(|b| b.on_sale))
            .unwrap_or(false);
        let original_price = if on_sale {
            self.original_price
                .or_else(|| base.as_ref().and_then(|b| b.original_price))
        } else {
            None
        };
        if let Some(original) = original_price {
            v.check(
                original.is_finite() && original >= 0.0,
                "Original price cannot be negative",
            );
            v.check(
                original >= price,
                "Original price must be equal to or greater than the price",
            );
        }

        let images: Vec<String> = self
            .images
            .map(|imgs| {
                imgs.into_iter()
                    .map(|i| i.trim().to_string())
                    .filter(|i| !i.is_empty())
                    .collect()
            })
            .or_else(|| base.as_ref().map(|b| b.images.clone()))
            .unwrap_or_default();
        v.check(!images.is_empty(), "At least one image is required");

        let description = non_empty(self.description)
            .or_else(|| base.as_ref().map(|b| b.description.clone()))
            .unwrap_or_default();
        let len = description.chars().count();
        v.check(len >= 10, "Description must be at least 10 characters long");
        v.check(len <= 1000, "Description cannot exceed 1000 characters");

        v.finish(())?;
        let Some(category) = category else {
            return Err(AppError::validation("Category is required"));
        };

        Ok(ProductDraft {
            name,
            price,
            original_price,
            stock,
            category,
            on_sale,
            images,
            description,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SortedQuery {
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
    pub category: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Orderings offered by the sorted product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    Bestsellers,
    Latest,
    Rating,
    PriceAsc,
    PriceDesc,
}

impl std::str::FromStr for ProductSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bestsellers" => Ok(ProductSort::Bestsellers),
            "latest" => Ok(ProductSort::Latest),
            "rating" => Ok(ProductSort::Rating),
            "price-asc" => Ok(ProductSort::PriceAsc),
            "price-desc" => Ok(ProductSort::PriceDesc),
            other => Err(AppError::validation(format!("Unknown sortBy value: {other}"))),
        }
    }
}

impl ProductSort {
    pub fn sort(&self, products: &mut [Product]) {
        match self {
            ProductSort::Bestsellers => products.sort_by(|a, b| b.sales.cmp(&a.sales)),
            ProductSort::Latest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::Rating => products.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
            ProductSort::PriceAsc => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
            ProductSort::PriceDesc => products.sort_by(|a, b| b.price.total_cmp(&a.price)),
        }
    }
}

// ---------------- admin user requests ----------------

#[derive(Deserialize, Debug, Default)]
pub struct AdminCreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl AdminCreateUserRequest {
    pub fn validate(self) -> AppResult<(NewUser, Role)> {
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => Role::default(),
            Some(raw) => raw.parse()?,
        };
        let new_user = RegisterRequest {
            name: self.name,
            email: self.email,
            password: self.password,
            address: None,
            phone: None,
        }
        .validate()?;
        Ok((new_user, role))
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AdminUpdateUserRequest {
    pub fn apply(self, user: &mut User) -> AppResult<()> {
        let mut v = Violations::default();
        let name = non_empty(self.name);
        let email = non_empty(self.email).map(|e| normalize_email(&e));
        if let Some(name) = &name {
            check_name(&mut v, name);
        }
        if let Some(email) = &email {
            check_email(&mut v, email);
        }
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => Some(role),
                Err(err) => {
                    v.push(err.to_string());
                    None
                }
            },
        };
        v.finish(())?;

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(role) = role {
            user.role = role;
        }
        Ok(())
    }
}

// ---------------- views ----------------

/// Profile view of an identity, used for the owner and for auth responses.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub joined: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            role: user.role,
            joined: user.joined,
        }
    }
}

/// Admin view of an identity.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    #[serde(flatten)]
    pub profile: UserView,
    pub cart_items: usize,
    pub wishlist_items: usize,
    pub review_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for AdminUserView {
    fn from(user: &User) -> Self {
        Self {
            profile: UserView::from(user),
            cart_items: user.cart.items.len(),
            wishlist_items: user.wishlist.0.len(),
            review_count: user.reviews.len(),
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct AuthView {
    pub token: String,
    pub user: UserView,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    /// User id, or "Anonymous"
    pub user: String,
    pub product: Uuid,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            user: review
                .user
                .map(|u| u.to_string())
                .unwrap_or_else(|| "Anonymous".to_string()),
            product: review.product,
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: review.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCreatedView {
    pub review: ReviewView,
    pub rating: f64,
    pub review_count: u32,
}

/// Public listing view of a product: no description or reviews.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductListingView {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub category: Category,
    pub images: Vec<String>,
    pub rating: f64,
    pub review_count: u32,
    pub stock: u32,
    pub on_sale: bool,
}

impl From<&Product> for ProductListingView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: p.price,
            original_price: p.original_price,
            category: p.category,
            images: p.images.clone(),
            rating: p.rating,
            review_count: p.review_count,
            stock: p.stock,
            on_sale: p.on_sale,
        }
    }
}

/// Public detail view of a product, including its reviews newest first.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub category: Category,
    pub on_sale: bool,
    pub images: Vec<String>,
    pub image_url: String,
    pub stock: u32,
    pub rating: f64,
    pub review_count: u32,
    pub reviews: Vec<ReviewView>,
}

impl ProductDetailView {
    pub fn new(p: &Product, mut reviews: Vec<Review>) -> Self {
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            original_price: p.original_price,
            category: p.category,
            on_sale: p.on_sale,
            images: p.images.clone(),
            image_url: first_image(p),
            stock: p.stock,
            rating: p.rating,
            review_count: p.review_count,
            reviews: reviews.iter().map(ReviewView::from).collect(),
        }
    }
}

/// Admin view of a product: every stored field except the review id list.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductAdminView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub category: Category,
    pub on_sale: bool,
    pub images: Vec<String>,
    pub stock: u32,
    pub rating: f64,
    pub review_count: u32,
    pub sales: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductAdminView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            original_price: p.original_price,
            category: p.category,
            on_sale: p.on_sale,
            images: p.images.clone(),
            stock: p.stock,
            rating: p.rating,
            review_count: p.review_count,
            sales: p.sales,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn first_image(p: &Product) -> String {
    p.images
        .first()
        .cloned()
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

/// A cart line joined with the product's current catalog data.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: Uuid,
    pub name: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub images: Vec<String>,
    pub category: Category,
    pub quantity: u32,
    pub subtotal: f64,
}

#[derive(Serialize, Debug)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    /// Derived from current prices; never stored
    pub total: f64,
}

impl CartView {
    /// Joins the cart with live products. Lines whose product no longer exists are dropped.
    pub fn new(cart: &Cart, products: &HashMap<Uuid, Product>) -> Self {
        let items: Vec<CartLineView> = cart
            .items
            .iter()
            .filter_map(|item| {
                let p = products.get(&item.product)?;
                Some(CartLineView {
                    product_id: p.id,
                    name: p.name.clone(),
                    price: p.price,
                    original_price: p.original_price,
                    images: p.images.clone(),
                    category: p.category,
                    quantity: item.quantity,
                    subtotal: p.price * f64::from(item.quantity),
                })
            })
            .collect();
        let total = items.iter().map(|line| line.subtotal).sum();
        Self { items, total }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemView {
    pub product_id: Uuid,
    pub name: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub images: Vec<String>,
    pub image_url: String,
    pub category: Category,
    pub rating: f64,
    pub review_count: u32,
}

/// Joins the wishlist with live products, dropping dangling entries.
pub fn wishlist_view(
    wishlist: &Wishlist,
    products: &HashMap<Uuid, Product>,
) -> Vec<WishlistItemView> {
    wishlist
        .products()
        .filter_map(|id| products.get(&id))
        .map(|p| WishlistItemView {
            product_id: p.id,
            name: p.name.clone(),
            price: p.price,
            original_price: p.original_price,
            images: p.images.clone(),
            image_url: first_image(p),
            category: p.category,
            rating: p.rating,
            review_count: p.review_count,
        })
        .collect()
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WishlistToggleView {
    pub is_in_wishlist: bool,
    pub wishlist: Vec<WishlistItemView>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WishlistCheckView {
    pub is_in_wishlist: bool,
}

#[derive(Serialize, Debug)]
pub struct PurchaserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    pub product: Uuid,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub subtotal: f64,
}

impl From<&LineItem> for LineItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            product: item.product,
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal(),
        }
    }
}

/// The single order view, for owners and admins alike.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub user: Uuid,
    /// Absent when the purchaser has since been deleted
    pub purchaser: Option<PurchaserView>,
    pub items: Vec<LineItemView>,
    pub total: f64,
    pub shipping_address: String,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn new(order: &Order, purchaser: Option<&User>) -> Self {
        Self {
            id: order.id,
            user: order.user,
            purchaser: purchaser.map(|u| PurchaserView {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            }),
            items: order.items.iter().map(LineItemView::from).collect(),
            total: order.total,
            shipping_address: order.shipping_address.clone(),
            delivery_method: order.delivery_method(),
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            status: order.status,
            delivery_date: order.delivery_date,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
