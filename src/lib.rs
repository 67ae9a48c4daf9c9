//! Trendwear Commerce
//!
//! Self-hosted clothing e-commerce backend.
//!
//! ## Features
//! - Product catalog with categories, subcategories and per-size stock
//! - Shopping cart with transactional stock reservation
//! - Order placement and status tracking
//! - Razorpay payment integration with HMAC signature verification
//! - JWT accounts with user/admin roles and address books

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod response;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
