pub mod shop_items;
pub mod system;

pub use shop_items::*;
pub use system::*;

use crate::auth::{PasswordHasher, TokenService};
use crate::core::config::SecurityConfig;
use crate::db::repository::{ShopItemRepository, UserRepository};
use crate::db::DatabaseManager;
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<UserRepository>,
    pub item_repo: Arc<ShopItemRepository>,
    pub tokens: TokenService,
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Wire repositories and credential services over one database
    pub fn new(db: Arc<DatabaseManager>, security: &SecurityConfig) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(db.clone())),
            item_repo: Arc::new(ShopItemRepository::new(db)),
            tokens: TokenService::new(security.signing_secret()),
            hasher: PasswordHasher::new(security.bcrypt_cost),
        }
    }
}
