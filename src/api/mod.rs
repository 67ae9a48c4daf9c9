//! HTTP surface
//!
//! Route table and the shared bits handlers use. All endpoints answer with
//! the `ApiResponse` envelope and the `ApiError` taxonomy.

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domain::events::DomainEvent;
use crate::state::AppState;

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/user/profile", get(auth::profile))
        .route("/api/user/addresses", get(addresses::list).post(addresses::create))
        .route("/api/user/addresses/:id", axum::routing::put(addresses::update).delete(addresses::remove))
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/:id", get(products::get_one).put(products::update).delete(products::remove))
        .route("/api/categories", get(categories::list).post(categories::create))
        .route("/api/categories/:id", delete(categories::remove))
        .route("/api/categories/:id/subcategories", post(categories::add_subcategories))
        .route("/api/categories/:id/subcategories/:sid", delete(categories::remove_subcategory))
        .route("/api/user/cart", get(cart::get_cart))
        .route("/api/user/cart/add", post(cart::add))
        .route("/api/user/cart/update", post(cart::update))
        .route("/api/user/cart/remove", post(cart::remove))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/:id", get(orders::get_one).put(orders::update_status).delete(orders::remove))
        .route("/api/payments/razorpay/create-order", post(payments::create_gateway_order))
        .route("/api/payments/razorpay/verify", post(payments::verify))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "trendwear-commerce"}))
}

/// Drains aggregate events into the log.
pub(crate) fn log_events(events: Vec<DomainEvent>) {
    for event in events {
        tracing::info!(?event, "domain event");
    }
}
