//! Catalog endpoints
//!
//! Listing and lookup are public; create, update, and delete are admin-only.
//! Writes go through the Product aggregate so the aggregate stock always
//! matches the per-size breakdown.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminUser;
use crate::domain::aggregates::{Product, SizeStock};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub in_stock: bool,
    pub stock: i32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SizeRow {
    pub label: String,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub currency: String,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub in_stock: bool,
    pub stock: i32,
    pub sizes: Vec<SizeStock>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductPayload {
    fn new(row: ProductRow, sizes: Vec<SizeStock>) -> Self {
        Self {
            id: row.id, name: row.name, description: row.description, price: row.price,
            currency: row.currency, category_id: row.category_id,
            subcategory_id: row.subcategory_id, in_stock: row.in_stock, stock: row.stock,
            sizes, images: row.images, created_at: row.created_at, updated_at: row.updated_at,
        }
    }
}

pub(crate) async fn load_sizes<'e, E>(executor: E, product_id: Uuid) -> Result<Vec<SizeStock>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, SizeRow>(
        "SELECT label, stock FROM product_sizes WHERE product_id = $1 ORDER BY position",
    )
    .bind(product_id)
    .fetch_all(executor)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| SizeStock { label: r.label, stock: r.stock.max(0) as u32 })
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub subcategory: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedProducts {
    pub products: Vec<ProductPayload>,
    pub total: i64,
    pub page: u32,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<PaginatedProducts>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).min(100);

    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT * FROM products
         WHERE ($1::uuid IS NULL OR category_id = $1)
           AND ($2::uuid IS NULL OR subcategory_id = $2)
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(params.category)
    .bind(params.subcategory)
    .bind(per_page as i64)
    .bind(page_offset(page, per_page))
    .fetch_all(&state.db)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products
         WHERE ($1::uuid IS NULL OR category_id = $1)
           AND ($2::uuid IS NULL OR subcategory_id = $2)",
    )
    .bind(params.category)
    .bind(params.subcategory)
    .fetch_one(&state.db)
    .await?;

    let mut products = Vec::with_capacity(rows.len());
    for row in rows {
        let sizes = load_sizes(&state.db, row.id).await?;
        products.push(ProductPayload::new(row, sizes));
    }
    Ok(ApiResponse::ok("Products fetched", PaginatedProducts { products, total: total.0, page }))
}

/// OFFSET for a 1-based page. Widened before multiplying so an absurd
/// `page` query value cannot overflow.
fn page_offset(page: u32, per_page: u32) -> i64 {
    (i64::from(page) - 1) * i64::from(per_page)
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<ProductPayload>> {
    let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    let sizes = load_sizes(&state.db, id).await?;
    Ok(ApiResponse::ok("Product fetched", ProductPayload::new(row, sizes)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub stock: Option<u32>,
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductRequest {
    /// Builds the aggregate, letting the domain reject bad input and derive
    /// the aggregate stock when sizes are given.
    fn into_aggregate(self, currency: &str) -> Result<Product, ApiError> {
        let mut product = Product::create(self.name, self.price, currency)?;
        product.set_description(self.description);
        product.set_category(self.category_id, self.subcategory_id);
        product.set_images(self.images);
        if self.sizes.is_empty() {
            product.set_stock(self.stock.unwrap_or(0))?;
        } else {
            product.set_sizes(self.sizes);
        }
        Ok(product)
    }
}

async fn persist_sizes(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    product_id: Uuid,
    sizes: &[SizeStock],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM product_sizes WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
    for (position, size) in sizes.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_sizes (id, product_id, label, stock, position) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::now_v7())
        .bind(product_id)
        .bind(&size.label)
        .bind(size.stock as i32)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<ProductRequest>,
) -> ApiResult<ApiResponse<ProductPayload>> {
    req.validate().map_err(|e| ApiError::validation(e.to_string()))?;
    let product = req.into_aggregate(&state.config.currency)?;

    let mut tx = state.db.begin().await?;
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (id, name, description, price, currency, category_id, subcategory_id,
                               in_stock, stock, images, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
    )
    .bind(product.id())
    .bind(product.name())
    .bind(product.description())
    .bind(product.price())
    .bind(product.currency())
    .bind(product.category_id())
    .bind(product.subcategory_id())
    .bind(product.is_in_stock())
    .bind(product.stock() as i32)
    .bind(product.images())
    .bind(product.created_at())
    .bind(product.updated_at())
    .fetch_one(&mut *tx)
    .await?;
    persist_sizes(&mut tx, product.id(), product.sizes()).await?;
    tx.commit().await?;

    tracing::info!(product_id = %product.id(), "product created");
    Ok(ApiResponse::created("Product created", ProductPayload::new(row, product.sizes().to_vec())))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductRequest>,
) -> ApiResult<ApiResponse<ProductPayload>> {
    req.validate().map_err(|e| ApiError::validation(e.to_string()))?;
    let product = req.into_aggregate(&state.config.currency)?;

    let mut tx = state.db.begin().await?;
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET name = $2, description = $3, price = $4, category_id = $5,
                subcategory_id = $6, in_stock = $7, stock = $8, images = $9, updated_at = NOW()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(product.name())
    .bind(product.description())
    .bind(product.price())
    .bind(product.category_id())
    .bind(product.subcategory_id())
    .bind(product.is_in_stock())
    .bind(product.stock() as i32)
    .bind(product.images())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Product not found"))?;
    persist_sizes(&mut tx, id, product.sizes()).await?;
    tx.commit().await?;

    Ok(ApiResponse::ok("Product updated", ProductPayload::new(row, product.sizes().to_vec())))
}

/// Hard delete. Open orders keep their own item snapshot, so nothing is
/// checked or restored here.
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found"));
    }
    tracing::info!(product_id = %id, "product deleted");
    Ok(ApiResponse::ok("Product deleted", serde_json::json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
    }

    #[test]
    fn test_page_offset_handles_huge_page_numbers() {
        assert_eq!(
            page_offset(u32::MAX, 100),
            (i64::from(u32::MAX) - 1) * 100
        );
    }
}
