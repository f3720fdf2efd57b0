//! Core application layer
//!
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system

pub mod config;
pub mod logging;
pub mod error;

pub use config::Config;
pub use logging::Logger;
pub use error::{current_trace_id, AuthFailure, ShopError, ErrorResponse, Result, REQUEST_TRACE_ID};
