//! Shipping address book
//!
//! Each address belongs to exactly one user and carries a HOME/WORK/OTHER tag.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AddressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(min = 1, message = "Address line is required"))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1, message = "Zip is required"))]
    pub zip: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    pub phone: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String { "HOME".to_string() }

fn validate_kind(kind: &str) -> Result<String, ApiError> {
    let kind = kind.to_uppercase();
    match kind.as_str() {
        "HOME" | "WORK" | "OTHER" => Ok(kind),
        _ => Err(ApiError::validation("Address type must be HOME, WORK or OTHER")),
    }
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<AddressRow>>> {
    let rows = sqlx::query_as::<_, AddressRow>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;
    Ok(ApiResponse::ok("Addresses fetched", rows))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddressRequest>,
) -> ApiResult<ApiResponse<AddressRow>> {
    req.validate().map_err(|e| ApiError::validation(e.to_string()))?;
    let kind = validate_kind(&req.kind)?;
    let row = sqlx::query_as::<_, AddressRow>(
        "INSERT INTO addresses (id, user_id, line1, line2, city, state, zip, country, phone, kind)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user.user_id)
    .bind(&req.line1)
    .bind(&req.line2)
    .bind(&req.city)
    .bind(&req.state)
    .bind(&req.zip)
    .bind(&req.country)
    .bind(&req.phone)
    .bind(&kind)
    .fetch_one(&state.db)
    .await?;
    Ok(ApiResponse::created("Address added", row))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddressRequest>,
) -> ApiResult<ApiResponse<AddressRow>> {
    req.validate().map_err(|e| ApiError::validation(e.to_string()))?;
    let kind = validate_kind(&req.kind)?;
    let row = sqlx::query_as::<_, AddressRow>(
        "UPDATE addresses SET line1 = $3, line2 = $4, city = $5, state = $6, zip = $7,
                country = $8, phone = $9, kind = $10
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user.user_id)
    .bind(&req.line1)
    .bind(&req.line2)
    .bind(&req.city)
    .bind(&req.state)
    .bind(&req.zip)
    .bind(&req.country)
    .bind(&req.phone)
    .bind(&kind)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Address not found"))?;
    Ok(ApiResponse::ok("Address updated", row))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Address not found"));
    }
    Ok(ApiResponse::ok("Address removed", serde_json::json!({})))
}
