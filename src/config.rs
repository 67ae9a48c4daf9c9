//! Application configuration
//!
//! Everything the process needs from the environment is collected here once
//! at startup and handed to request handlers through `AppState`, instead of
//! being read ad hoc at call sites.

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_base_url: String,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8083".to_string())
                .parse()
                .context("PORT must be a number")?,
            jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET is required")?,
            razorpay_key_id: std::env::var("RAZORPAY_KEY_ID")
                .context("RAZORPAY_KEY_ID is required")?,
            razorpay_key_secret: std::env::var("RAZORPAY_KEY_SECRET")
                .context("RAZORPAY_KEY_SECRET is required")?,
            razorpay_base_url: std::env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "INR".to_string()),
        })
    }
}
