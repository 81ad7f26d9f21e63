use crate::routes::auth::claims::{Claims, REMEMBER_SESSION_TTL, SESSION_TTL};
use crate::routes::auth::session::{session_claims, session_cookie};
use crate::{
    responses::JsonResponse,
    state::AppState,
    utils::{jwt::create_jwt, password::verify_password},
};

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize, Serialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// GET /login/. Already-authenticated callers are bounced to the dashboard.
pub async fn login_page(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    if session_claims(&jar, &app_state.jwt_keys).is_some() {
        return Redirect::to("/dashboard/").into_response();
    }
    Json(json!({ "success": true })).into_response()
}

pub async fn handle_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let username = payload.username.trim();
    if username.is_empty() {
        return JsonResponse::ok_error("Username is required. Please enter your username.")
            .into_response();
    }
    if payload.password.is_empty() {
        return JsonResponse::ok_error("Password is required. Please enter your password.")
            .into_response();
    }

    let user = match app_state.users.find_user_by_username(username).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return JsonResponse::ok_error(
                "Invalid username or password. Please check your credentials and try again.",
            )
            .into_response()
        }
        Err(e) => {
            tracing::error!("DB error during login: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {
            if !user.is_active {
                return JsonResponse::ok_error(
                    "Your account is inactive. Please contact administrator.",
                )
                .into_response();
            }

            let ttl = if payload.remember {
                REMEMBER_SESSION_TTL
            } else {
                SESSION_TTL
            };
            let claims = Claims::for_user(&user, ttl);

            match create_jwt(&claims, &app_state.jwt_keys) {
                Ok(token) => {
                    let cookie = session_cookie(token, ttl, app_state.config.cookie_secure);

                    let mut headers = HeaderMap::new();
                    headers.insert(
                        header::SET_COOKIE,
                        HeaderValue::from_str(&cookie.to_string()).unwrap(),
                    );
                    (
                        StatusCode::OK,
                        headers,
                        Json(json!({
                            "success": true,
                            "redirect": "/dashboard/"
                        })),
                    )
                        .into_response()
                }
                Err(e) => {
                    tracing::error!("JWT error: {:?}", e);
                    JsonResponse::server_error("Token generation failed").into_response()
                }
            }
        }
        Ok(false) => {
            JsonResponse::ok_error("Invalid password. Please check your password and try again.")
                .into_response()
        }
        Err(e) => {
            tracing::error!("Password verification error: {:?}", e);
            JsonResponse::server_error("Internal error").into_response()
        }
    }
}
