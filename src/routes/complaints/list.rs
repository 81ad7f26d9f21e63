use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::routes::complaints::helpers::{ListQuery, PAGE_SIZE};
use crate::state::AppState;

/// GET /complaints/. Staff see every complaint, everyone else only the ones
/// they filed. Search, status, priority, and page all come from the query
/// string; the active filters are echoed back for the filter bar.
pub async fn complaint_list(
    State(app_state): State<AppState>,
    session: AuthSession,
    Query(query): Query<ListQuery>,
) -> Response {
    let claims = session.0;

    let page = match app_state
        .complaints
        .list_page(claims.scope(), &query.filter(), query.page(), PAGE_SIZE)
        .await
    {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("DB error listing complaints: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let categories = match app_state.categories.list_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::error!("DB error loading categories: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    Json(json!({
        "complaints": page.complaints,
        "page": page.page,
        "num_pages": page.num_pages,
        "total": page.total,
        "categories": categories,
        "current_status": query.status.map(|s| s.as_str()).unwrap_or(""),
        "current_priority": query.priority.map(|p| p.as_str()).unwrap_or(""),
        "search_query": query.search.as_deref().unwrap_or(""),
        "is_staff": claims.is_staff,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::{header, StatusCode},
        routing::get,
        Router,
    };
    use time::OffsetDateTime;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        db::{complaint_repository::ComplaintRepository, mock_db::MockDb},
        models::complaint::{ComplaintStatus, NewComplaint},
        models::user::User,
        state::test_support::{auth_cookie_for, state_with_db},
        state::AppState,
    };

    use super::complaint_list;

    fn test_user(username: &str, is_staff: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: "unused".into(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            is_active: true,
            date_joined: OffsetDateTime::now_utc(),
        }
    }

    fn new_complaint(title: &str) -> NewComplaint {
        NewComplaint {
            title: title.into(),
            description: "details".into(),
            ..Default::default()
        }
    }

    fn build_app(state: AppState) -> Router {
        Router::new()
            .route("/complaints/", get(complaint_list))
            .with_state(state)
    }

    async fn get_list(app: Router, uri: &str, cookie: &str) -> serde_json::Value {
        let res = app
            .oneshot(
                Request::get(uri)
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn non_staff_only_see_their_own_complaints() {
        let alice = test_user("alice", false);
        let bob = test_user("bob", false);
        let db = Arc::new(
            MockDb::default()
                .with_user(alice.clone())
                .with_user(bob.clone()),
        );
        db.create_complaint(alice.id, &new_complaint("from alice"))
            .await
            .unwrap();
        db.create_complaint(bob.id, &new_complaint("from bob"))
            .await
            .unwrap();
        let state = state_with_db(db);

        let json = get_list(
            build_app(state.clone()),
            "/complaints/",
            &auth_cookie_for(&state, &alice),
        )
        .await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["complaints"][0]["title"], "from alice");
        assert_eq!(json["complaints"][0]["created_by"], "alice");
        assert_eq!(json["is_staff"], false);
    }

    #[tokio::test]
    async fn staff_see_everything() {
        let alice = test_user("alice", false);
        let staff = test_user("supervisor", true);
        let db = Arc::new(
            MockDb::default()
                .with_user(alice.clone())
                .with_user(staff.clone()),
        );
        db.create_complaint(alice.id, &new_complaint("from alice"))
            .await
            .unwrap();
        db.create_complaint(staff.id, &new_complaint("from staff"))
            .await
            .unwrap();
        let state = state_with_db(db);

        let json = get_list(
            build_app(state.clone()),
            "/complaints/",
            &auth_cookie_for(&state, &staff),
        )
        .await;
        assert_eq!(json["total"], 2);
        assert_eq!(json["is_staff"], true);
    }

    #[tokio::test]
    async fn status_filter_narrows_and_is_echoed() {
        let alice = test_user("alice", false);
        let db = Arc::new(MockDb::default().with_user(alice.clone()));
        let open = db
            .create_complaint(alice.id, &new_complaint("still open"))
            .await
            .unwrap();
        let done = db
            .create_complaint(alice.id, &new_complaint("all fixed"))
            .await
            .unwrap();
        db.update_status(done.id, ComplaintStatus::Resolved, None)
            .await
            .unwrap();
        let state = state_with_db(db);

        let json = get_list(
            build_app(state.clone()),
            "/complaints/?status=resolved",
            &auth_cookie_for(&state, &alice),
        )
        .await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["complaints"][0]["title"], "all fixed");
        assert_eq!(json["current_status"], "resolved");
        assert_eq!(json["current_priority"], "");
        assert!(json["complaints"]
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["ticket_number"] != open.ticket_number));
    }

    #[tokio::test]
    async fn search_matches_ticket_numbers() {
        let alice = test_user("alice", false);
        let db = Arc::new(MockDb::default().with_user(alice.clone()));
        db.create_complaint(alice.id, &new_complaint("first"))
            .await
            .unwrap();
        let second = db
            .create_complaint(alice.id, &new_complaint("second"))
            .await
            .unwrap();
        let state = state_with_db(db);

        let json = get_list(
            build_app(state.clone()),
            &format!("/complaints/?search={}", second.ticket_number),
            &auth_cookie_for(&state, &alice),
        )
        .await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["complaints"][0]["ticket_number"], second.ticket_number);
        assert_eq!(json["search_query"], second.ticket_number);
    }

    #[tokio::test]
    async fn out_of_range_pages_clamp_instead_of_erroring() {
        let alice = test_user("alice", false);
        let db = Arc::new(MockDb::default().with_user(alice.clone()));
        for i in 0..25 {
            db.create_complaint(alice.id, &new_complaint(&format!("complaint {i}")))
                .await
                .unwrap();
        }
        let state = state_with_db(db);
        let cookie = auth_cookie_for(&state, &alice);

        let json = get_list(build_app(state.clone()), "/complaints/?page=99", &cookie).await;
        assert_eq!(json["num_pages"], 2);
        assert_eq!(json["page"], 2);
        assert_eq!(json["complaints"].as_array().unwrap().len(), 5);

        let json = get_list(build_app(state.clone()), "/complaints/?page=abc", &cookie).await;
        assert_eq!(json["page"], 1);
        assert_eq!(json["complaints"].as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_a_400() {
        let alice = test_user("alice", false);
        let state = state_with_db(Arc::new(MockDb::default().with_user(alice.clone())));
        let res = build_app(state.clone())
            .oneshot(
                Request::get("/complaints/?status=shipped")
                    .header(header::COOKIE, auth_cookie_for(&state, &alice))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn anonymous_callers_get_a_401() {
        let state = state_with_db(Arc::new(MockDb::default()));
        let res = build_app(state)
            .oneshot(Request::get("/complaints/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn db_error_is_a_500() {
        let alice = test_user("alice", false);
        let state = state_with_db(Arc::new(MockDb::failing().with_user(alice.clone())));
        let res = build_app(state.clone())
            .oneshot(
                Request::get("/complaints/")
                    .header(header::COOKIE, auth_cookie_for(&state, &alice))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
