//! Order endpoints
//!
//! Checkout and the payment-verification flow both place orders through
//! `place_order_tx`, so every order is constructed the same way regardless
//! of how it is paid. Placing an order clears the user's cart in the same
//! transaction; stock was already reserved at add-to-cart time, so nothing
//! is decremented again here.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::api::log_events;
use crate::auth::{AdminUser, AuthUser, Role};
use crate::domain::aggregates::{Order, OrderLine, OrderStatus, PaymentStatus};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub total: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderItemRow {
    product_id: Uuid,
    name: String,
    quantity: i32,
    unit_price: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub items: Vec<OrderLinePayload>,
    pub total: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderPayload {
    pub(crate) fn from_aggregate(order: &Order) -> Self {
        Self {
            id: order.id(),
            order_number: order.order_number().to_string(),
            user_id: order.user_id(),
            status: order.status().as_str().to_string(),
            payment_method: order.payment_method().to_string(),
            payment_status: order.payment_status().as_str().to_string(),
            items: order
                .items()
                .iter()
                .map(|i| OrderLinePayload {
                    product_id: i.product_id,
                    name: i.name.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
            total: order.total(),
            currency: order.currency().to_string(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }

    fn from_row(row: OrderRow, items: Vec<OrderItemRow>) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            status: row.status,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            items: items
                .into_iter()
                .map(|i| OrderLinePayload {
                    product_id: i.product_id,
                    name: i.name,
                    quantity: i.quantity.max(0) as u32,
                    unit_price: i.unit_price,
                })
                .collect(),
            total: row.total,
            currency: row.currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Option<Vec<OrderItemRequest>>,
    pub total_amount: Option<i64>,
    pub payment_method: Option<String>,
}

/// The single order-placement path. Captures name and price from the live
/// product rows, places the aggregate, persists it, and empties the user's
/// cart, all inside the caller's transaction.
pub(crate) async fn place_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    items: &[OrderItemRequest],
    total_amount: i64,
    payment_method: &str,
    payment_status: PaymentStatus,
    currency: &str,
) -> ApiResult<Order> {
    if items.is_empty() {
        return Err(ApiError::validation("items must not be empty"));
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT name, price FROM products WHERE id = $1")
                .bind(item.product_id)
                .fetch_optional(&mut **tx)
                .await?;
        let (name, price) = row.ok_or_else(|| ApiError::not_found("Product not found"))?;
        lines.push(OrderLine {
            product_id: item.product_id,
            name,
            quantity: item.quantity,
            unit_price: price,
        });
    }

    let order_number = format!("ORD-{:08}", rand::thread_rng().gen::<u32>());
    let mut order = Order::place(order_number, user_id, lines, payment_method, payment_status, currency)?;
    if order.total() != total_amount {
        return Err(ApiError::validation("totalAmount does not match order items"));
    }

    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, status, payment_method, payment_status,
                             total, currency, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(order.id())
    .bind(order.order_number())
    .bind(order.user_id())
    .bind(order.status().as_str())
    .bind(order.payment_method())
    .bind(order.payment_status().as_str())
    .bind(order.total())
    .bind(order.currency())
    .bind(order.created_at())
    .bind(order.updated_at())
    .execute(&mut **tx)
    .await?;

    for line in order.items() {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, name, quantity, unit_price)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::now_v7())
        .bind(order.id())
        .bind(line.product_id)
        .bind(&line.name)
        .bind(line.quantity as i32)
        .bind(line.unit_price)
        .execute(&mut **tx)
        .await?;
    }

    // Only the ordered lines leave the cart; their add-to-cart reservation
    // carries over into the order. Other lines keep theirs.
    if let Some(mut cart) = crate::api::cart::lock_user_cart(tx, user_id).await? {
        let cleared = cart.clear_lines(order.items().iter().map(|i| i.product_id));
        for product_id in &cleared {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
                .bind(cart.id())
                .bind(product_id)
                .execute(&mut **tx)
                .await?;
        }
        if !cleared.is_empty() {
            sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
                .bind(cart.id())
                .execute(&mut **tx)
                .await?;
        }
    }

    log_events(order.take_events());
    Ok(order)
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<ApiResponse<OrderPayload>> {
    let items = req.items.ok_or_else(|| ApiError::validation("items is required"))?;
    let total = req.total_amount.ok_or_else(|| ApiError::validation("totalAmount is required"))?;
    let method = req.payment_method.ok_or_else(|| ApiError::validation("paymentMethod is required"))?;

    let mut tx = state.db.begin().await?;
    let order = place_order_tx(
        &mut tx, user.user_id, &items, total, &method, PaymentStatus::Pending,
        &state.config.currency,
    )
    .await?;
    tx.commit().await?;

    Ok(ApiResponse::created("Order placed", OrderPayload::from_aggregate(&order)))
}

async fn order_items(state: &AppState, order_id: Uuid) -> Result<Vec<OrderItemRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderItemRow>(
        "SELECT product_id, name, quantity, unit_price FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&state.db)
    .await
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<OrderPayload>>> {
    let rows = if user.role == Role::Admin {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?
    } else {
        sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.user_id)
        .fetch_all(&state.db)
        .await?
    };

    let mut payload = Vec::with_capacity(rows.len());
    for row in rows {
        let items = order_items(&state, row.id).await?;
        payload.push(OrderPayload::from_row(row, items));
    }
    Ok(ApiResponse::ok("Orders fetched", payload))
}

pub async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<OrderPayload>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    if user.role != Role::Admin && row.user_id != user.user_id {
        return Err(ApiError::Forbidden);
    }
    let items = order_items(&state, row.id).await?;
    Ok(ApiResponse::ok("Order fetched", OrderPayload::from_row(row, items)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<ApiResponse<OrderPayload>> {
    let next = req
        .status
        .ok_or_else(|| ApiError::validation("status is required"))?
        .parse::<OrderStatus>()?;

    let mut tx = state.db.begin().await?;
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT product_id, name, quantity, unit_price FROM order_items WHERE order_id = $1",
    )
    .bind(row.id)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|i| OrderLine {
        product_id: i.product_id,
        name: i.name,
        quantity: i.quantity.max(0) as u32,
        unit_price: i.unit_price,
    })
    .collect();

    let mut order = Order::from_parts(
        row.id, row.order_number, row.user_id, row.status.parse()?, row.payment_method,
        row.payment_status.parse()?, items, row.total, row.currency, row.created_at,
        row.updated_at,
    );
    order.transition(next)?;

    sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(order.id())
        .bind(order.status().as_str())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;
    log_events(order.take_events());
    tx.commit().await?;

    Ok(ApiResponse::ok("Order status updated", OrderPayload::from_aggregate(&order)))
}

/// Admin delete. Inventory is not restored; the snapshot simply goes away.
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Order not found"));
    }
    tracing::info!(order_id = %id, "order deleted");
    Ok(ApiResponse::ok("Order deleted", serde_json::json!({})))
}
