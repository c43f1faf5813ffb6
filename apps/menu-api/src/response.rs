//! Success envelope: `{"success": true, "data": ..., "count"?: n, "message"?: ...}`.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data,
            count: None,
            message: None,
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data,
            count: None,
            message: Some(message.into()),
        })
    }

    /// A well-formed answer that the request could not be honoured, sent
    /// with HTTP 200.
    pub fn declined(data: T, message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: false,
            data,
            count: None,
            message: Some(message.into()),
        })
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            count: Some(data.len()),
            data,
            message: None,
        })
    }
}
