//! Payment endpoints
//!
//! A gateway order is created first; once the client completes payment,
//! `verify` checks the callback signature and only then places the order,
//! already marked PAID, together with its payment audit row in one
//! transaction. A bad signature creates nothing.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::orders::{place_order_tx, OrderItemRequest};
use crate::auth::AuthUser;
use crate::domain::aggregates::PaymentStatus;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGatewayOrderRequest {
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrderPayload {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

pub async fn create_gateway_order(
    State(state): State<AppState>,
    Json(req): Json<CreateGatewayOrderRequest>,
) -> ApiResult<ApiResponse<GatewayOrderPayload>> {
    let amount = req.amount.ok_or_else(|| ApiError::validation("amount is required"))?;
    if amount <= 0 {
        return Err(ApiError::validation("amount must be positive"));
    }

    let order = state
        .gateway
        .create_order(amount, &state.config.currency)
        .await
        .map_err(ApiError::Gateway)?;
    tracing::info!(gateway_order_id = %order.id, amount, "gateway order created");
    Ok(ApiResponse::ok(
        "Gateway order created",
        GatewayOrderPayload { order_id: order.id, amount: order.amount, currency: order.currency },
    ))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_payment_id: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_signature: Option<String>,
    #[serde(flatten)]
    pub order: VerifyOrderBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOrderBody {
    pub items: Option<Vec<OrderItemRequest>>,
    pub total_amount: Option<i64>,
}

fn required(field: Option<String>, name: &str) -> ApiResult<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::validation(format!("{name} is required"))),
    }
}

pub async fn verify(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<ApiResponse<crate::api::orders::OrderPayload>> {
    let payment_id = required(req.razorpay_payment_id, "razorpay_payment_id")?;
    let order_id = required(req.razorpay_order_id, "razorpay_order_id")?;
    let signature = required(req.razorpay_signature, "razorpay_signature")?;
    let items = req.order.items.ok_or_else(|| ApiError::validation("items is required"))?;
    let total = req
        .order
        .total_amount
        .ok_or_else(|| ApiError::validation("totalAmount is required"))?;

    if !state.gateway.verify_signature(&order_id, &payment_id, &signature) {
        tracing::warn!(gateway_order_id = %order_id, "payment signature mismatch");
        return Err(ApiError::SignatureMismatch);
    }

    let mut tx = state.db.begin().await?;
    let order = place_order_tx(
        &mut tx, user.user_id, &items, total, "RAZORPAY", PaymentStatus::Paid,
        &state.config.currency,
    )
    .await?;
    sqlx::query(
        "INSERT INTO payments (id, order_id, gateway_order_id, gateway_payment_id,
                               gateway_signature, amount, status)
         VALUES ($1, $2, $3, $4, $5, $6, 'SUCCESS')",
    )
    .bind(Uuid::now_v7())
    .bind(order.id())
    .bind(&order_id)
    .bind(&payment_id)
    .bind(&signature)
    .bind(order.total())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(order_id = %order.id(), gateway_payment_id = %payment_id, "payment verified");
    Ok(ApiResponse::ok(
        "Payment verified",
        crate::api::orders::OrderPayload::from_aggregate(&order),
    ))
}
