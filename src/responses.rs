use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::forms::FieldErrors;

/// Uniform JSON envelope. Errors carry `error`, informational successes carry
/// `message`, and whichever side is unused stays out of the payload.
#[derive(Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonResponse {
    fn ok(msg: &str) -> Self {
        JsonResponse {
            success: true,
            message: Some(msg.to_string()),
            error: None,
        }
    }

    fn err(msg: &str) -> Self {
        JsonResponse {
            success: false,
            message: None,
            error: Some(msg.to_string()),
        }
    }

    pub fn success(msg: &str) -> impl IntoResponse {
        (StatusCode::OK, Json(JsonResponse::ok(msg)))
    }

    /// Rejected input. Forms on the other side read the `success` flag rather
    /// than the HTTP status, so these go out as 200.
    pub fn ok_error(msg: &str) -> impl IntoResponse {
        (StatusCode::OK, Json(JsonResponse::err(msg)))
    }

    /// Per-field validation messages, also a 200 for the same reason as
    /// [`JsonResponse::ok_error`].
    pub fn field_errors(errors: &FieldErrors) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(json!({ "success": false, "errors": errors })),
        )
    }

    pub fn unauthorized(msg: &str) -> impl IntoResponse {
        (StatusCode::UNAUTHORIZED, Json(JsonResponse::err(msg)))
    }

    pub fn forbidden(msg: &str) -> impl IntoResponse {
        (StatusCode::FORBIDDEN, Json(JsonResponse::err(msg)))
    }

    pub fn not_found(msg: &str) -> impl IntoResponse {
        (StatusCode::NOT_FOUND, Json(JsonResponse::err(msg)))
    }

    pub fn server_error(msg: &str) -> impl IntoResponse {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(JsonResponse::err(msg)),
        )
    }

    pub fn too_many_requests(msg: &str) -> impl IntoResponse {
        (StatusCode::TOO_MANY_REQUESTS, Json(JsonResponse::err(msg)))
    }

    /// 303 to an in-app page with the message in the query string, for
    /// browser-navigation endpoints where a JSON error would render as bare
    /// text.
    pub fn redirect_with_error(path: &str, msg: &str) -> impl IntoResponse {
        let url = format!("{}?error={}", path, urlencoding::encode(msg));
        Redirect::to(&url).into_response()
    }
}
