//! Account endpoints: register, login, profile

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{issue_token, AuthUser, Role};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserPayload {
    fn from(row: UserRow) -> Self {
        Self { id: row.id, name: row.name, email: row.email, role: row.role, created_at: row.created_at }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserPayload,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    req.validate().map_err(|e| ApiError::validation(e.to_string()))?;

    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::validation("Email already registered"));
    }

    let hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(e.into()))?;
    let user = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, 'user') RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.name)
    .bind(&req.email)
    .bind(&hash)
    .fetch_one(&state.db)
    .await?;

    let token = issue_token(user.id, Role::User, &state.config.jwt_secret)?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::created("Account created", AuthPayload { token, user: user.into() }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    let matches = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !matches {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let role = user.role.parse::<Role>().unwrap_or(Role::User);
    let token = issue_token(user.id, role, &state.config.jwt_secret)?;
    Ok(ApiResponse::ok("Logged in", AuthPayload { token, user: user.into() }))
}

pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<UserPayload>> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::ok("Profile fetched", row.into()))
}
