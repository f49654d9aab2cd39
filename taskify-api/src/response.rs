/// Uniform response envelope
///
/// Every endpoint, success or failure, responds with the same JSON shape:
///
/// ```json
/// {
///   "code": 200,
///   "success": true,
///   "message": "Tasks retrieved successfully",
///   "data": { ... },
///   "err": null
/// }
/// ```
///
/// `code` mirrors the HTTP status, `data` is null on failure, and `err`
/// carries a machine-oriented detail string on failure (null on success).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// The envelope body
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: u16,
    pub success: bool,
    pub message: String,
    pub data: Option<JsonValue>,
    pub err: Option<String>,
}

/// Builds a success response with the given status
pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let body = Envelope {
        code: status.as_u16(),
        success: true,
        message: message.to_string(),
        data: Some(serde_json::to_value(data).unwrap_or(JsonValue::Null)),
        err: None,
    };

    (status, Json(body)).into_response()
}

/// 200 OK with data
pub fn ok<T: Serialize>(message: &str, data: T) -> Response {
    success(StatusCode::OK, message, data)
}

/// 201 Created with data
pub fn created<T: Serialize>(message: &str, data: T) -> Response {
    success(StatusCode::CREATED, message, data)
}

/// Builds a failure response with the given status
pub fn failure(status: StatusCode, message: &str, err: Option<String>) -> Response {
    let body = Envelope {
        code: status.as_u16(),
        success: false,
        message: message.to_string(),
        data: None,
        err,
    };

    (status, Json(body)).into_response()
}
