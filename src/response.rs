//! Uniform response envelope
//!
//! Every endpoint answers `{ status, error, message, data }`, success and
//! failure alike, so clients parse one shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub error: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { status: 200, error: false, message: message.into(), data: Some(data) }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self { status: 201, error: false, message: message.into(), data: Some(data) }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status: status.as_u16(), error: true, message: message.into(), data: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let code = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::ok("Cart fetched", serde_json::json!({"items": []}))).unwrap();
        assert_eq!(body["status"], 200);
        assert_eq!(body["error"], false);
        assert_eq!(body["message"], "Cart fetched");
        assert!(body["data"]["items"].is_array());
    }

    #[test]
    fn test_failure_has_no_data() {
        let body = serde_json::to_value(ApiResponse::failure(StatusCode::NOT_FOUND, "Product not found")).unwrap();
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], true);
        assert!(body["data"].is_null());
    }
}
