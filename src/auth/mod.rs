//! Authentication module
//!
//! This module provides authentication functionality including:
//! - User registration and login
//! - JWT token generation and validation
//! - Password hashing and verification
//! - Authentication middleware

pub mod jwt;
pub mod password;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use jwt::{Claims, TokenService};
pub use password::PasswordHasher;
pub use middleware::{authenticate, parse_bearer, CallerIdentity};
pub use handlers::{register, login, get_me};
