use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect},
};

use crate::routes::auth::session::clear_session_cookie;
use crate::state::AppState;

/// GET /logout/. Expires the session cookie and sends the browser back to the
/// login page. Safe to call without a session.
pub async fn handle_logout(State(app_state): State<AppState>) -> impl IntoResponse {
    let expired_cookie = clear_session_cookie(app_state.config.cookie_secure);

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&expired_cookie.to_string()).unwrap(),
    );

    (headers, Redirect::to("/login/"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt; // for `app.oneshot(...)`

    use crate::db::mock_db::MockDb;
    use crate::routes::auth::logout::handle_logout;
    use crate::state::test_support::state_with_db;

    #[tokio::test]
    async fn logout_clears_session_cookie_and_redirects_to_login() {
        let app = Router::new()
            .route("/logout/", get(handle_logout))
            .with_state(state_with_db(Arc::new(MockDb::default())));

        let res = app
            .oneshot(Request::get("/logout/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get("location").unwrap(), "/login/");

        let set_cookie_header = res.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(set_cookie_header.contains("session_token="));
        assert!(set_cookie_header.contains("Max-Age=0"));
        assert!(set_cookie_header.contains("HttpOnly"));
        assert!(set_cookie_header.contains("SameSite=Lax"));
    }
}
