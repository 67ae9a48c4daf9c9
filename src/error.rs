//! API error taxonomy
//!
//! Handlers return `ApiError`; the `IntoResponse` impl maps each class to a
//! status code and renders the uniform envelope. Server-side causes are
//! logged and replaced with a generic message before leaving the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::domain::aggregates::{CartError, OrderError, ProductError};
use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid signature")]
    SignatureMismatch,

    #[error("{0}")]
    InvalidStatusTransition(String),

    #[error("Payment gateway error")]
    Gateway(#[source] anyhow::Error),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self { Self::NotFound(what.into()) }
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::InsufficientStock
            | ApiError::SignatureMismatch
            | ApiError::InvalidStatusTransition(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Gateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Gateway(cause) => {
                tracing::error!(%cause, "gateway call failed");
                self.to_string()
            }
            ApiError::Internal(cause) => {
                tracing::error!(%cause, "unhandled error");
                self.to_string()
            }
            _ => self.to_string(),
        };
        ApiResponse::failure(status, message).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<ProductError> for ApiError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::InsufficientStock => ApiError::InsufficientStock,
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound => ApiError::not_found("Item not found in cart"),
            CartError::InsufficientStock => ApiError::InsufficientStock,
            CartError::InvalidQuantity => ApiError::validation(e.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidStatusTransition { .. } => {
                ApiError::InvalidStatusTransition(e.to_string())
            }
            other => ApiError::Validation(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::InsufficientStock.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("Product not found").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::SignatureMismatch.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_domain_errors_map_to_api_classes() {
        let e: ApiError = CartError::InsufficientStock.into();
        assert!(matches!(e, ApiError::InsufficientStock));
        let e: ApiError = OrderError::InvalidStatusTransition { from: "DELIVERED", to: "PENDING" }.into();
        assert!(matches!(e, ApiError::InvalidStatusTransition(_)));
    }

    #[test]
    fn test_internal_message_is_generic() {
        let e = ApiError::Internal(anyhow::anyhow!("connection refused"));
        assert_eq!(e.to_string(), "Internal server error");
    }
}
