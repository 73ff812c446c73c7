//! Persisted records for the storefront
//!
//! These structures are what the redb tables hold (serialized as JSON). They
//! never leave the process directly: outward shapes live in [`crate::dto`].
//! The state transitions that carry the business rules (cart merging,
//! wishlist toggling, order status changes, rating aggregation) are plain
//! methods here so they can be exercised without a database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// How long after creation an owner may still cancel a pending order.
pub const CANCELLATION_WINDOW: Duration = Duration::hours(24);

/// Shipping addresses starting with this marker are store pickups.
pub const PICKUP_PREFIX: &str = "PICKUP:";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::validation(format!("{other} is not a valid role"))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product: Uuid,
    pub quantity: u32,
}

/// A user's cart, keyed by product: one line item per product.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Adds `quantity` of a product, merging into an existing line item.
    pub fn add(&mut self, product: Uuid, quantity: u32) -> AppResult<()> {
        match self.items.iter_mut().find(|item| item.product == product) {
            Some(item) => {
                item.quantity = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| AppError::validation("Quantity is too large"))?;
            }
            None => self.items.push(CartItem { product, quantity }),
        }
        Ok(())
    }

    /// Sets an absolute quantity; zero or less removes the line item.
    pub fn set_quantity(&mut self, product: Uuid, quantity: i64) -> AppResult<()> {
        let idx = self
            .items
            .iter()
            .position(|item| item.product == product)
            .ok_or_else(|| AppError::NotFound("Item not found in cart".to_string()))?;

        if quantity <= 0 {
            self.items.remove(idx);
        } else {
            self.items[idx].quantity = u32::try_from(quantity)
                .map_err(|_| AppError::validation("Quantity is too large"))?;
        }
        Ok(())
    }

    /// Removes a product; absent products are a no-op. Returns whether anything changed.
    pub fn remove(&mut self, product: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product != product);
        before != self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WishlistItem {
    pub product: Uuid,
}

/// A user's wishlist. A product appears at most once.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Wishlist(pub Vec<WishlistItem>);

impl Wishlist {
    pub fn contains(&self, product: Uuid) -> bool {
        self.0.iter().any(|item| item.product == product)
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, product: Uuid) -> bool {
        if let Some(idx) = self.0.iter().position(|item| item.product == product) {
            self.0.remove(idx);
            false
        } else {
            self.0.push(WishlistItem { product });
            true
        }
    }

    pub fn products(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.0.iter().map(|item| item.product)
    }
}

/// Identity record. `password_hash` never appears in any response view.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored trimmed and lowercased
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub joined: DateTime<Utc>,
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub wishlist: Wishlist,
    #[serde(default)]
    pub reviews: Vec<Uuid>,
    /// Bumped to revoke every token issued before the bump
    #[serde(default)]
    pub token_version: u32,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Bracelets,
    Charms,
    Earrings,
    Rings,
    Necklaces,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Bracelets,
        Category::Charms,
        Category::Earrings,
        Category::Rings,
        Category::Necklaces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bracelets => "Bracelets",
            Category::Charms => "Charms",
            Category::Earrings => "Earrings",
            Category::Rings => "Rings",
            Category::Necklaces => "Necklaces",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("{s} is not a valid category")))
    }
}

/// Catalog record. `rating` and `review_count` are derived from `reviews`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub stock: u32,
    pub category: Category,
    #[serde(default)]
    pub on_sale: bool,
    pub images: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    /// Units sold, used for bestseller ranking
    #[serde(default)]
    pub sales: u64,
    #[serde(default)]
    pub reviews: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Replaces the aggregate fields with values computed from the full rating list.
    pub fn apply_ratings(&mut self, ratings: &[u8]) {
        let (rating, count) = aggregate_rating(ratings);
        self.rating = rating;
        self.review_count = count;
    }
}

/// Mean of all ratings rounded to one decimal, and the number of ratings.
pub fn aggregate_rating(ratings: &[u8]) -> (f64, u32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    ((mean * 10.0).round() / 10.0, ratings.len() as u32)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    /// `None` for anonymous reviews
    pub user: Option<Uuid>,
    pub product: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(AppError::validation("Invalid status")),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "Pay on Delivery")]
    PayOnDelivery,
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pay on Delivery" => Ok(PaymentMethod::PayOnDelivery),
            other => Err(AppError::validation(format!(
                "{other} is not a supported payment method"
            ))),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    Pickup,
    Delivery,
}

/// Line item captured at checkout. Never re-derived from the live product.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product: Uuid,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl LineItem {
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product: product.id,
            name: product.name.clone(),
            quantity,
            price: product.price,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user: Uuid,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending order from already-resolved line items.
    pub fn new(
        user: Uuid,
        items: Vec<LineItem>,
        shipping_address: String,
        payment_method: PaymentMethod,
        delivery_estimate: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let total = items.iter().map(LineItem::subtotal).sum();
        Self {
            id: Uuid::new_v4(),
            user,
            items,
            total,
            shipping_address,
            payment_method,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            delivery_date: Some(now + delivery_estimate),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn delivery_method(&self) -> DeliveryMethod {
        if self.shipping_address.starts_with(PICKUP_PREFIX) {
            DeliveryMethod::Pickup
        } else {
            DeliveryMethod::Delivery
        }
    }

    /// Owner-initiated cancellation, allowed only while pending and within
    /// [`CANCELLATION_WINDOW`] of creation (the boundary itself is allowed).
    pub fn cancel(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        match self.status {
            OrderStatus::Cancelled => {
                return Err(AppError::Conflict("Order already cancelled".to_string()))
            }
            OrderStatus::Delivered => {
                return Err(AppError::Conflict(
                    "Delivered orders cannot be cancelled".to_string(),
                ))
            }
            OrderStatus::Pending => {}
        }

        if now - self.created_at > CANCELLATION_WINDOW {
            return Err(AppError::Conflict(
                "Cancellation window expired (24h)".to_string(),
            ));
        }

        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Admin status change. Re-applying the current status is a no-op and
    /// returns `false`; leaving a terminal status is a conflict.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) -> AppResult<bool> {
        if status == self.status {
            return Ok(false);
        }
        if self.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Order is already {} and cannot change status",
                self.status.as_str().to_lowercase()
            )));
        }

        self.status = status;
        if status == OrderStatus::Delivered && self.delivery_date.is_none() {
            self.delivery_date = Some(now);
        }
        self.updated_at = now;
        Ok(true)
    }
}
