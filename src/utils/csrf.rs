use axum::{
    body::Body,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::Cookie;
use base64::{self, prelude::BASE64_URL_SAFE_NO_PAD, Engine};
use rand_core::RngCore;
use serde_json::json;

use crate::responses::JsonResponse;
use crate::state::AppState;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Double-submit check: unsafe methods must echo the csrftoken cookie in the
/// X-CSRFToken header. Safe methods pass through untouched.
pub async fn validate_csrf(req: Request<Body>, next: Next) -> Response {
    if matches!(
        req.method(),
        &Method::POST | &Method::PUT | &Method::DELETE | &Method::PATCH
    ) {
        let headers = req.headers();

        let token_header = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());

        let cookie_header = headers
            .get_all("cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        if let Some(csrf_token) = token_header {
            if let Some(cookie_token) = extract_csrf_from_cookie(&cookie_header) {
                if csrf_token == cookie_token {
                    return next.run(req).await;
                }
            }
        }
        JsonResponse::forbidden("CSRF token missing or incorrect.").into_response()
    } else {
        next.run(req).await
    }
}

fn extract_csrf_from_cookie(cookie_str: &str) -> Option<String> {
    for cookie in cookie_str.split(';') {
        if let Ok(parsed) = Cookie::parse_encoded(cookie.trim()) {
            if parsed.name() == CSRF_COOKIE {
                return Some(parsed.value().to_string());
            }
        }
    }
    None
}

pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32]; // 256-bit token
    rand_core::OsRng.fill_bytes(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Mints the csrftoken cookie. Deliberately not HttpOnly: browser code reads
/// it back to fill the X-CSRFToken header.
pub async fn get_csrf_token(State(state): State<AppState>) -> Response {
    let token = generate_csrf_token();

    let mut set_cookie_value = format!("{CSRF_COOKIE}={token}; Path=/; SameSite=Lax");
    if state.config.cookie_secure {
        set_cookie_value.push_str("; Secure");
    }

    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(&set_cookie_value) {
        Ok(value) => {
            headers.insert(SET_COOKIE, value);
        }
        Err(_) => {
            return JsonResponse::server_error("Failed to issue CSRF token").into_response();
        }
    }

    (StatusCode::OK, headers, Json(json!({ "csrf_token": token }))).into_response()
}
