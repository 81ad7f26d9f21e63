use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::responses::JsonResponse;
use crate::routes::auth::claims::Claims;
use crate::state::AppState;
use crate::utils::jwt::{decode_jwt, JwtKeys};

pub const SESSION_COOKIE: &str = "session_token";

/// The authenticated caller, pulled from the session cookie. Handlers take
/// this as an argument; requests without a valid session never reach them.
#[derive(Debug)]
pub struct AuthSession(pub Claims);

/// Claims from the session cookie, if present and still valid.
pub fn session_claims(jar: &CookieJar, keys: &JwtKeys) -> Option<Claims> {
    let token = jar.get(SESSION_COOKIE)?;
    decode_jwt(token.value(), keys).ok().map(|data| data.claims)
}

pub fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(ttl)
        .build()
}

pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

impl<S> FromRequestParts<S> for AuthSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        session_claims(&jar, &app.jwt_keys)
            .map(AuthSession)
            .ok_or_else(|| JsonResponse::unauthorized("Authentication required").into_response())
    }
}
