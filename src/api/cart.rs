//! Cart endpoints
//!
//! Stock reconciliation lives here. Every mutation locks the product row,
//! runs the cart aggregate against it, and persists both sides in a single
//! transaction, so two requests racing for the last unit serialize instead
//! of overselling.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::api::log_events;
use crate::auth::AuthUser;
use crate::domain::aggregates::{Cart, CartItem, Product};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    product_id: Uuid,
    quantity: i32,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLinePayload {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub currency: String,
    pub images: Vec<String>,
    pub in_stock: bool,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub id: Option<Uuid>,
    pub items: Vec<CartLinePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationRequest {
    pub product_id: Option<Uuid>,
    pub quantity: Option<u32>,
}

impl CartMutationRequest {
    fn product_id(&self) -> ApiResult<Uuid> {
        self.product_id.ok_or_else(|| ApiError::validation("productId is required"))
    }
    fn quantity(&self) -> ApiResult<u32> {
        self.quantity.ok_or_else(|| ApiError::validation("quantity is required"))
    }
}

/// Locks the product row for the rest of the transaction.
async fn lock_product(tx: &mut Transaction<'_, Postgres>, product_id: Uuid) -> ApiResult<Product> {
    let row = sqlx::query_as::<_, super::products::ProductRow>(
        "SELECT * FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(Product::from_parts(
        row.id, row.name, row.description, row.price, row.currency, row.category_id,
        row.subcategory_id, row.stock.max(0) as u32, vec![], row.images,
        row.created_at, row.updated_at,
    ))
}

async fn load_cart(tx: &mut Transaction<'_, Postgres>, row: CartRow) -> ApiResult<Cart> {
    let items = sqlx::query_as::<_, CartItemRow>(
        "SELECT product_id, quantity FROM cart_items WHERE cart_id = $1 ORDER BY created_at",
    )
    .bind(row.id)
    .fetch_all(&mut **tx)
    .await?
    .into_iter()
    .map(|i| CartItem { product_id: i.product_id, quantity: i.quantity.max(0) as u32 })
    .collect();
    Ok(Cart::from_parts(row.id, row.user_id, items, row.created_at, row.updated_at))
}

/// Fetches the user's cart, creating it lazily on first use. The insert is
/// conflict-safe so two racing first-adds both land on the same row, and the
/// re-select takes the row lock either way.
async fn lock_or_create_cart(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> ApiResult<Cart> {
    sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(Uuid::now_v7())
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
    load_cart(tx, row).await
}

/// Locks the user's cart if they have one.
pub(crate) async fn lock_user_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> ApiResult<Option<Cart>> {
    let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    match row {
        Some(row) => Ok(Some(load_cart(tx, row).await?)),
        None => Ok(None),
    }
}

/// Fetches the user's cart or fails; mutations other than add never create one.
async fn lock_cart(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> ApiResult<Cart> {
    lock_user_cart(tx, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart not found"))
}

async fn persist_stock(tx: &mut Transaction<'_, Postgres>, product: &Product) -> ApiResult<()> {
    sqlx::query("UPDATE products SET stock = $2, in_stock = $3, updated_at = NOW() WHERE id = $1")
        .bind(product.id())
        .bind(product.stock() as i32)
        .bind(product.is_in_stock())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn persist_line(tx: &mut Transaction<'_, Postgres>, cart: &Cart, product_id: Uuid) -> ApiResult<()> {
    match cart.quantity_of(product_id) {
        Some(qty) => {
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, $4)
                 ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
            )
            .bind(Uuid::now_v7())
            .bind(cart.id())
            .bind(product_id)
            .bind(qty as i32)
            .execute(&mut **tx)
            .await?;
        }
        None => {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
                .bind(cart.id())
                .bind(product_id)
                .execute(&mut **tx)
                .await?;
        }
    }
    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart.id())
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn cart_payload(state: &AppState, user_id: Uuid) -> ApiResult<CartPayload> {
    let cart_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;
    let Some(cart_id) = cart_id else {
        return Ok(CartPayload { id: None, items: vec![] });
    };
    let items = sqlx::query_as::<_, CartLinePayload>(
        "SELECT ci.product_id, p.name, p.price, p.currency, p.images, p.in_stock, ci.quantity
         FROM cart_items ci JOIN products p ON p.id = ci.product_id
         WHERE ci.cart_id = $1 ORDER BY ci.created_at",
    )
    .bind(cart_id)
    .fetch_all(&state.db)
    .await?;
    Ok(CartPayload { id: Some(cart_id), items })
}

pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<CartPayload>> {
    let payload = cart_payload(&state, user.user_id).await?;
    Ok(ApiResponse::ok("Cart fetched", payload))
}

pub async fn add(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CartMutationRequest>,
) -> ApiResult<ApiResponse<CartPayload>> {
    let product_id = req.product_id()?;
    let qty = req.quantity()?;

    let mut tx = state.db.begin().await?;
    let mut product = lock_product(&mut tx, product_id).await?;
    let mut cart = lock_or_create_cart(&mut tx, user.user_id).await?;
    cart.add_item(&mut product, qty)?;
    persist_stock(&mut tx, &product).await?;
    persist_line(&mut tx, &cart, product_id).await?;
    log_events(product.take_events());
    tx.commit().await?;

    let payload = cart_payload(&state, user.user_id).await?;
    Ok(ApiResponse::ok("Item added to cart", payload))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CartMutationRequest>,
) -> ApiResult<ApiResponse<CartPayload>> {
    let product_id = req.product_id()?;
    let qty = req.quantity()?;

    let mut tx = state.db.begin().await?;
    let mut product = lock_product(&mut tx, product_id).await?;
    let mut cart = lock_cart(&mut tx, user.user_id).await?;
    cart.update_quantity(&mut product, qty)?;
    persist_stock(&mut tx, &product).await?;
    persist_line(&mut tx, &cart, product_id).await?;
    log_events(product.take_events());
    tx.commit().await?;

    let payload = cart_payload(&state, user.user_id).await?;
    Ok(ApiResponse::ok("Cart updated", payload))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CartMutationRequest>,
) -> ApiResult<ApiResponse<CartPayload>> {
    let product_id = req.product_id()?;

    let mut tx = state.db.begin().await?;
    let mut product = lock_product(&mut tx, product_id).await?;
    let mut cart = lock_cart(&mut tx, user.user_id).await?;
    let restored = cart.remove_item(&mut product)?;
    persist_stock(&mut tx, &product).await?;
    persist_line(&mut tx, &cart, product_id).await?;
    log_events(product.take_events());
    tx.commit().await?;

    tracing::debug!(%product_id, restored, "cart line removed");
    let payload = cart_payload(&state, user.user_id).await?;
    Ok(ApiResponse::ok("Item removed from cart", payload))
}
