//! Shopping list backend library
//!
//! Multi-user shopping list REST service: credential storage, bearer token
//! authentication, and item CRUD scoped to the authenticated owner.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{Config, ShopError};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
