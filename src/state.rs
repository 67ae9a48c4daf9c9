//! Shared request state

use std::sync::Arc;

use crate::config::AppConfig;
use crate::gateway::razorpay::RazorpayClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<AppConfig>,
    pub gateway: RazorpayClient,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: AppConfig) -> Self {
        let gateway = RazorpayClient::new(
            &config.razorpay_base_url,
            &config.razorpay_key_id,
            &config.razorpay_key_secret,
        );
        Self { db, config: Arc::new(config), gateway }
    }
}
