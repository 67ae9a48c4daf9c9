//! Category / subcategory taxonomy
//!
//! Two levels only. Subcategory creation and removal run inside one
//! transaction so a failure can never leave orphaned subcategory rows.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryRow {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub id: Uuid,
    pub name: String,
    pub sub_categories: Vec<SubCategoryRow>,
    pub created_at: DateTime<Utc>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<CategoryPayload>>> {
    let categories = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    let mut payload = Vec::with_capacity(categories.len());
    for category in categories {
        let subs = sqlx::query_as::<_, SubCategoryRow>(
            "SELECT * FROM subcategories WHERE category_id = $1 ORDER BY created_at",
        )
        .bind(category.id)
        .fetch_all(&state.db)
        .await?;
        payload.push(CategoryPayload {
            id: category.id,
            name: category.name,
            sub_categories: subs,
            created_at: category.created_at,
        });
    }
    Ok(ApiResponse::ok("Categories fetched", payload))
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<ApiResponse<CategoryRow>> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Category name is required"));
    }
    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::validation("Category already exists"));
    }
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .fetch_one(&state.db)
    .await?;
    Ok(ApiResponse::created("Category created", row))
}

/// Deletes the category; its subcategories are detached, not deleted.
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Category not found"));
    }
    Ok(ApiResponse::ok("Category deleted", serde_json::json!({})))
}

#[derive(Debug, Deserialize)]
pub struct AddSubCategoriesRequest {
    pub names: Vec<String>,
}

pub async fn add_subcategories(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddSubCategoriesRequest>,
) -> ApiResult<ApiResponse<Vec<SubCategoryRow>>> {
    let names: Vec<&str> = req.names.iter().map(|n| n.trim()).collect();
    if names.is_empty() || names.iter().any(|n| n.is_empty()) {
        return Err(ApiError::validation("names must be a non-empty array of non-empty strings"));
    }

    let mut tx = state.db.begin().await?;
    let category = sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    let mut created = Vec::with_capacity(names.len());
    for name in names {
        let row = sqlx::query_as::<_, SubCategoryRow>(
            "INSERT INTO subcategories (id, category_id, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(category)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;
        created.push(row);
    }
    tx.commit().await?;

    Ok(ApiResponse::created("Subcategories added", created))
}

pub async fn remove_subcategory(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((id, sid)): Path<(Uuid, Uuid)>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM subcategories WHERE id = $1 AND category_id = $2")
        .bind(sid)
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Subcategory not found in this category"));
    }
    Ok(ApiResponse::ok("Subcategory deleted", serde_json::json!({})))
}
