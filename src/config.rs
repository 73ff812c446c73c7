//! Runtime configuration loaded from the environment
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file by [`dotenvy`] in `main`. Every setting has a default so the
//! server can start with an empty environment.

use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use chrono::Duration;
use rand::{distr::Alphanumeric, Rng};
use tracing::warn;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
const MAX_DELIVERY_DAYS: i64 = 365;
const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Credentials for the admin account created at startup when absent.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Application configuration shared by every handler through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port number (`PORT`, default 5000)
    pub port: u16,

    /// Path to the redb file (`DATABASE_URL`, default "data.db")
    pub database_url: String,

    /// HMAC key used to sign bearer tokens (`JWT_SECRET`)
    pub jwt_secret: String,

    /// Lifetime of issued tokens (`JWT_EXPIRES_IN`, at most one year, default one day)
    pub token_ttl: Duration,

    /// bcrypt work factor (`BCRYPT_COST`, default 10)
    pub bcrypt_cost: u32,

    /// Directory holding uploaded product images (`UPLOAD_DIR`)
    pub upload_dir: PathBuf,

    /// Days added to the order creation time for the default delivery date
    /// (`DELIVERY_DAYS`, 0 to 365, default 7)
    pub delivery_days: i64,

    /// Optional admin account seeded at startup
    pub admin_seed: Option<AdminSeed>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "data.db".to_string(),
            jwt_secret: random_secret(),
            token_ttl: Duration::days(1),
            bcrypt_cost: 10,
            upload_dir: PathBuf::from("uploads"),
            delivery_days: 7,
            admin_seed: None,
        }
    }
}

impl Config {
    /// Builds the configuration from environment variables.
    ///
    /// Unparseable values are reported with a warning and replaced by the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET is not set; using a random secret, tokens will not survive a restart");
                defaults.jwt_secret
            }
        };

        let token_ttl = match env::var("JWT_EXPIRES_IN") {
            Ok(raw) => parse_duration(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "invalid or out of range JWT_EXPIRES_IN, falling back to 1d");
                defaults.token_ttl
            }),
            Err(_) => defaults.token_ttl,
        };

        let bcrypt_cost = within(
            "BCRYPT_COST",
            parse_var("BCRYPT_COST", defaults.bcrypt_cost),
            MIN_BCRYPT_COST..=MAX_BCRYPT_COST,
            defaults.bcrypt_cost,
        );
        let delivery_days = within(
            "DELIVERY_DAYS",
            parse_var("DELIVERY_DAYS", defaults.delivery_days),
            0..=MAX_DELIVERY_DAYS,
            defaults.delivery_days,
        );

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed {
                    name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                    email,
                    password,
                })
            }
            _ => None,
        };

        Self {
            port: parse_var("PORT", defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret,
            token_ttl,
            bcrypt_cost,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            delivery_days,
            admin_seed,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Returns `value` when it lies in `range`, otherwise warns and returns `default`.
fn within<T>(name: &str, value: T, range: RangeInclusive<T>, default: T) -> T
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        value
    } else {
        warn!(
            variable = name,
            value = %value,
            min = %range.start(),
            max = %range.end(),
            "value out of range, using default"
        );
        default
    }
}

/// Parses `<n>[s|m|h|d]`; a bare number is read as seconds.
///
/// Lifetimes above one year are rejected.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&raw[..idx], c),
        _ => (raw, 's'),
    };
    let amount: i64 = digits.parse().ok()?;
    if amount <= 0 {
        return None;
    }
    let ttl = match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => None,
    }?;
    (ttl <= Duration::days(MAX_TOKEN_TTL_DAYS)).then_some(ttl)
}

fn random_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
