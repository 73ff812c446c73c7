//! Library exports for the jewelry storefront API
//!
//! The binary only wires configuration, storage and the router together;
//! everything else lives here so integration tests can drive the real app.

pub mod auth;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
