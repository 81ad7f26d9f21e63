use crate::models::forms::{FieldErrors, RegistrationForm};
use crate::routes::auth::claims::{Claims, SESSION_TTL};
use crate::routes::auth::session::{session_claims, session_cookie};
use crate::{
    responses::JsonResponse,
    state::AppState,
    utils::{jwt::create_jwt, password::hash_password},
};

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

/// GET /register/. Mirrors the login page: authenticated callers go straight
/// to the dashboard.
pub async fn register_page(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    if session_claims(&jar, &app_state.jwt_keys).is_some() {
        return Redirect::to("/dashboard/").into_response();
    }
    Json(json!({ "success": true })).into_response()
}

pub async fn handle_register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegistrationForm>,
) -> Response {
    let new_user = match payload.validate() {
        Ok(valid) => valid,
        Err(errors) => return JsonResponse::field_errors(&errors).into_response(),
    };

    match app_state.users.is_username_taken(&new_user.username).await {
        Ok(false) => {}
        Ok(true) => {
            let mut errors = FieldErrors::default();
            errors.add("username", "A user with that username already exists.");
            return JsonResponse::field_errors(&errors).into_response();
        }
        Err(e) => {
            tracing::error!("DB error checking username: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    }

    let password_hash = match hash_password(&payload.password1) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Password hashing error: {:?}", e);
            return JsonResponse::server_error("Internal error").into_response();
        }
    };

    let user = match app_state.users.create_user(&new_user, &password_hash).await {
        Ok(user) => user,
        // Two concurrent registrations can both pass the availability check;
        // the unique index settles the race.
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let mut errors = FieldErrors::default();
            errors.add("username", "A user with that username already exists.");
            return JsonResponse::field_errors(&errors).into_response();
        }
        Err(e) => {
            tracing::error!("DB error during registration: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    // New accounts are logged in right away.
    let claims = Claims::for_user(&user, SESSION_TTL);
    match create_jwt(&claims, &app_state.jwt_keys) {
        Ok(token) => {
            let cookie = session_cookie(token, SESSION_TTL, app_state.config.cookie_secure);

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
