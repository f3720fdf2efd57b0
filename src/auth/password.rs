//! Password hashing and verification using bcrypt

use crate::core::error::{Result, ShopError};
use tokio::task;

/// Salted, adaptive password hashing with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher using the given bcrypt cost
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Verify a password against a stored hash
    ///
    /// A wrong password is `Ok(false)`. A stored hash that cannot be parsed
    /// is an internal error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let hasher = *self;
        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ShopError::TaskError(format!("Hashing task panicked: {}", e)))?
    }

    /// Verify on the blocking pool
    pub async fn verify_async(&self, password: String, hash: String) -> Result<bool> {
        let hasher = *self;
        task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| ShopError::TaskError(format!("Verification task panicked: {}", e)))?
    }
}
