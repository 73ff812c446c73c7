//! Database initialization, table definitions and record access
//!
//! All records live in the embedded redb database as JSON strings keyed by
//! their UUID. Secondary index tables map emails to user ids and users to
//! their orders. Every read-modify-write in the handlers happens inside one
//! redb write transaction; redb admits a single writer at a time, so two
//! concurrent updates of the same record cannot overwrite each other.

use std::sync::Arc;

use chrono::Utc;
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition,
    WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::{Cart, Order, Product, Review, Role, User, Wishlist};

pub type JsonTable = TableDefinition<'static, &'static str, &'static str>;

/// Identity records
///
/// Key: user id, Value: JSON-serialized [`User`]
pub const TABLE_USERS: JsonTable = TableDefinition::new("users_v1");

/// Unique email index
///
/// Key: normalized email, Value: JSON-encoded user id
pub const TABLE_USER_EMAILS: JsonTable = TableDefinition::new("user_email_index_v1");

/// Catalog records
///
/// Key: product id, Value: JSON-serialized [`Product`]
pub const TABLE_PRODUCTS: JsonTable = TableDefinition::new("products_v1");

/// Order records
///
/// Key: order id, Value: JSON-serialized [`Order`]
pub const TABLE_ORDERS: JsonTable = TableDefinition::new("orders_v1");

/// Per-user order index
///
/// Key: "{user_id}:{created_at_micros:020}:{order_id}", Value: JSON-encoded order id.
/// The zero-padded timestamp keeps a user's orders in chronological order.
pub const TABLE_ORDER_USER_INDEX: JsonTable = TableDefinition::new("order_user_index_v1");

/// Review records
///
/// Key: review id, Value: JSON-serialized [`Review`]
pub const TABLE_REVIEWS: JsonTable = TableDefinition::new("reviews_v1");

const ALL_TABLES: [JsonTable; 6] = [
    TABLE_USERS,
    TABLE_USER_EMAILS,
    TABLE_PRODUCTS,
    TABLE_ORDERS,
    TABLE_ORDER_USER_INDEX,
    TABLE_REVIEWS,
];

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database
    pub db: Arc<Database>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}

/// Creates or opens the database file and makes sure every table exists.
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        for table in ALL_TABLES {
            write_txn.open_table(table)?;
        }
    }
    write_txn.commit()?;

    Ok(db)
}

/// Read access shared by read and write transactions.
pub trait RecordReader {
    fn get_record<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> AppResult<Option<T>>;

    fn scan_records<T: DeserializeOwned>(&self, table: JsonTable) -> AppResult<Vec<T>>;

    /// Records of every key in `[start, end)`, in key order.
    fn range_records<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        start: &str,
        end: &str,
    ) -> AppResult<Vec<T>>;
}

fn get_from<T, Tbl>(table: &Tbl, key: &str) -> AppResult<Option<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static str>,
{
    match table.get(key)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

fn scan_from<T, Tbl>(table: &Tbl) -> AppResult<Vec<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static str>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(serde_json::from_str(value.value())?);
    }
    Ok(records)
}

fn range_from<T, Tbl>(table: &Tbl, start: &str, end: &str) -> AppResult<Vec<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static str>,
{
    let mut records = Vec::new();
    for entry in table.range(start..end)? {
        let (_, value) = entry?;
        records.push(serde_json::from_str(value.value())?);
    }
    Ok(records)
}

impl RecordReader for ReadTransaction {
    fn get_record<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> AppResult<Option<T>> {
        get_from(&self.open_table(table)?, key)
    }

    fn scan_records<T: DeserializeOwned>(&self, table: JsonTable) -> AppResult<Vec<T>> {
        scan_from(&self.open_table(table)?)
    }

    fn range_records<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        start: &str,
        end: &str,
    ) -> AppResult<Vec<T>> {
        range_from(&self.open_table(table)?, start, end)
    }
}

impl RecordReader for WriteTransaction {
    fn get_record<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> AppResult<Option<T>> {
        get_from(&self.open_table(table)?, key)
    }

    fn scan_records<T: DeserializeOwned>(&self, table: JsonTable) -> AppResult<Vec<T>> {
        scan_from(&self.open_table(table)?)
    }

    fn range_records<T: DeserializeOwned>(
        &self,
        table: JsonTable,
        start: &str,
        end: &str,
    ) -> AppResult<Vec<T>> {
        range_from(&self.open_table(table)?, start, end)
    }
}

fn put_record<T: Serialize>(
    txn: &WriteTransaction,
    table: JsonTable,
    key: &str,
    record: &T,
) -> AppResult<()> {
    let json = serde_json::to_string(record)?;
    let mut table = txn.open_table(table)?;
    table.insert(key, json.as_str())?;
    Ok(())
}

fn delete_key(txn: &WriteTransaction, table: JsonTable, key: &str) -> AppResult<bool> {
    let mut table = txn.open_table(table)?;
    let removed = table.remove(key)?.is_some();
    Ok(removed)
}

/// Parses a client-supplied identifier, reporting a malformed one as a validation error.
pub fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation(format!("Invalid {what} ID")))
}

// ---------------- identities ----------------

pub fn find_user(tx: &impl RecordReader, id: Uuid) -> AppResult<Option<User>> {
    tx.get_record(TABLE_USERS, &id.to_string())
}

pub fn require_user(tx: &impl RecordReader, id: Uuid) -> AppResult<User> {
    find_user(tx, id)?.ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Looks a user up by email; the caller passes the normalized form.
pub fn find_user_by_email(tx: &impl RecordReader, email: &str) -> AppResult<Option<User>> {
    match tx.get_record::<Uuid>(TABLE_USER_EMAILS, email)? {
        Some(id) => find_user(tx, id),
        None => Ok(None),
    }
}

pub fn list_users(tx: &impl RecordReader) -> AppResult<Vec<User>> {
    let mut users: Vec<User> = tx.scan_records(TABLE_USERS)?;
    users.sort_by_key(|u| u.joined);
    Ok(users)
}

/// Stores a new identity, enforcing email uniqueness.
pub fn insert_user(txn: &WriteTransaction, user: &User) -> AppResult<()> {
    if find_user_by_email(txn, &user.email)?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }
    put_record(txn, TABLE_USER_EMAILS, &user.email, &user.id)?;
    put_record(txn, TABLE_USERS, &user.id.to_string(), user)
}

/// Persists an existing identity, moving its email index entry when the email changed.
pub fn save_user(txn: &WriteTransaction, user: &User, previous_email: &str) -> AppResult<()> {
    if user.email != previous_email {
        if let Some(other) = find_user_by_email(txn, &user.email)? {
            if other.id != user.id {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }
        delete_key(txn, TABLE_USER_EMAILS, previous_email)?;
        put_record(txn, TABLE_USER_EMAILS, &user.email, &user.id)?;
    }
    put_record(txn, TABLE_USERS, &user.id.to_string(), user)
}

pub fn delete_user(txn: &WriteTransaction, id: Uuid) -> AppResult<Option<User>> {
    let Some(user) = find_user(txn, id)? else {
        return Ok(None);
    };
    delete_key(txn, TABLE_USER_EMAILS, &user.email)?;
    delete_key(txn, TABLE_USERS, &id.to_string())?;
    Ok(Some(user))
}

// ---------------- catalog ----------------

pub fn find_product(tx: &impl RecordReader, id: Uuid) -> AppResult<Option<Product>> {
    tx.get_record(TABLE_PRODUCTS, &id.to_string())
}

pub fn require_product(tx: &impl RecordReader, id: Uuid) -> AppResult<Product> {
    find_product(tx, id)?.ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

pub fn list_products(tx: &impl RecordReader) -> AppResult<Vec<Product>> {
    let mut products: Vec<Product> = tx.scan_records(TABLE_PRODUCTS)?;
    products.sort_by_key(|p| p.created_at);
    Ok(products)
}

pub fn save_product(txn: &WriteTransaction, product: &Product) -> AppResult<()> {
    put_record(txn, TABLE_PRODUCTS, &product.id.to_string(), product)
}

/// Removes the product together with its review records.
pub fn delete_product(txn: &WriteTransaction, id: Uuid) -> AppResult<Option<Product>> {
    let Some(product) = find_product(txn, id)? else {
        return Ok(None);
    };
    for review in &product.reviews {
        delete_key(txn, TABLE_REVIEWS, &review.to_string())?;
    }
    delete_key(txn, TABLE_PRODUCTS, &id.to_string())?;
    Ok(Some(product))
}

// ---------------- reviews ----------------

pub fn save_review(txn: &WriteTransaction, review: &Review) -> AppResult<()> {
    put_record(txn, TABLE_REVIEWS, &review.id.to_string(), review)
}

/// Loads the given reviews, skipping ids that no longer resolve.
pub fn reviews_by_ids(tx: &impl RecordReader, ids: &[Uuid]) -> AppResult<Vec<Review>> {
    let mut reviews = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(review) = tx.get_record::<Review>(TABLE_REVIEWS, &id.to_string())? {
            reviews.push(review);
        }
    }
    Ok(reviews)
}

// ---------------- orders ----------------

fn order_index_key(order: &Order) -> String {
    format!(
        "{}:{:020}:{}",
        order.user,
        order.created_at.timestamp_micros().max(0),
        order.id
    )
}

pub fn find_order(tx: &impl RecordReader, id: Uuid) -> AppResult<Option<Order>> {
    tx.get_record(TABLE_ORDERS, &id.to_string())
}

pub fn require_order(tx: &impl RecordReader, id: Uuid) -> AppResult<Order> {
    find_order(tx, id)?.ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Writes a newly created order together with its per-user index entry.
pub fn insert_order(txn: &WriteTransaction, order: &Order) -> AppResult<()> {
    put_record(txn, TABLE_ORDER_USER_INDEX, &order_index_key(order), &order.id)?;
    save_order(txn, order)
}

pub fn save_order(txn: &WriteTransaction, order: &Order) -> AppResult<()> {
    put_record(txn, TABLE_ORDERS, &order.id.to_string(), order)
}

pub fn delete_order(txn: &WriteTransaction, id: Uuid) -> AppResult<Option<Order>> {
    let Some(order) = find_order(txn, id)? else {
        return Ok(None);
    };
    delete_key(txn, TABLE_ORDER_USER_INDEX, &order_index_key(&order))?;
    delete_key(txn, TABLE_ORDERS, &id.to_string())?;
    Ok(Some(order))
}

/// A user's orders, newest first.
pub fn orders_for_user(tx: &impl RecordReader, user: Uuid) -> AppResult<Vec<Order>> {
    // ';' sorts right after ':' so this covers every "{user}:" key
    let start = format!("{user}:");
    let end = format!("{user};");
    let mut orders = Vec::new();
    let ids: Vec<Uuid> = tx.range_records(TABLE_ORDER_USER_INDEX, &start, &end)?;
    for id in ids.into_iter().rev() {
        if let Some(order) = find_order(tx, id)? {
            orders.push(order);
        }
    }
    Ok(orders)
}

pub fn list_orders(tx: &impl RecordReader) -> AppResult<Vec<Order>> {
    let mut orders: Vec<Order> = tx.scan_records(TABLE_ORDERS)?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
}

// ---------------- bootstrap ----------------

/// Creates the configured admin account unless its email is already registered.
pub async fn bootstrap_admin(state: &AppState) -> AppResult<()> {
    let Some(seed) = state.config.admin_seed.clone() else {
        return Ok(());
    };
    let email = seed.email.trim().to_lowercase();

    if find_user_by_email(&state.db.begin_read()?, &email)?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(seed.password, state.config.bcrypt_cost).await?;
    let now = Utc::now();
    let admin = User {
        id: Uuid::new_v4(),
        name: seed.name,
        email,
        password_hash,
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

    let write_txn = state.db.begin_write()?;
    insert_user(&write_txn, &admin)?;
    write_txn.commit()?;

    info!(email = %admin.email, "seeded admin account");
    Ok(())
}
