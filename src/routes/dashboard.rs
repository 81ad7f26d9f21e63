use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::state::AppState;

const RECENT_LIMIT: i64 = 10;

/// GET /dashboard/. Headline stats, the ten newest complaints, and a grouped
/// status breakdown, all scoped to the caller.
pub async fn dashboard(State(app_state): State<AppState>, session: AuthSession) -> Response {
    let claims = session.0;
    let scope = claims.scope();

    let counts = match app_state.complaints.status_counts(scope).await {
        Ok(counts) => counts,
        Err(e) => {
            tracing::error!("DB error computing dashboard stats: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let recent = match app_state.complaints.list_recent(scope, RECENT_LIMIT).await {
        Ok(recent) => recent,
        Err(e) => {
            tracing::error!("DB error loading recent complaints: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    // Grouped counts; statuses with no complaints do not appear.
    let status_distribution: Vec<_> = counts
        .by_status()
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| json!({ "status": status, "count": count }))
        .collect();

    Json(json!({
        "stats": {
            "total": counts.total,
            "pending": counts.pending,
            "in_progress": counts.in_progress,
            "resolved": counts.resolved,
            "urgent": counts.urgent,
        },
        "recent_complaints": recent,
        "status_distribution": status_distribution,
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
        models::complaint::{ComplaintPriority, ComplaintStatus, NewComplaint},
        models::user::User,
        state::test_support::{auth_cookie_for, state_with_db},
        state::AppState,
    };

    use super::dashboard;

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

    fn build_app(state: AppState) -> Router {
        Router::new()
            .route("/dashboard/", get(dashboard))
            .with_state(state)
    }

    async fn get_dashboard(app: Router, cookie: &str) -> serde_json::Value {
        let res = app
            .oneshot(
                Request::get("/dashboard/")
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
    async fn dashboard_is_scoped_and_skips_empty_statuses() {
        let alice = test_user("alice", false);
        let bob = test_user("bob", false);
        let db = Arc::new(
            MockDb::default()
                .with_user(alice.clone())
                .with_user(bob.clone()),
        );
        db.create_complaint(
            alice.id,
            &NewComplaint {
                title: "urgent leak".into(),
                description: "d".into(),
                priority: ComplaintPriority::Urgent,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let fixed = db
            .create_complaint(
                alice.id,
                &NewComplaint {
                    title: "fixed already".into(),
                    description: "d".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        db.update_status(fixed.id, ComplaintStatus::Resolved, None)
            .await
            .unwrap();
        db.create_complaint(
            bob.id,
            &NewComplaint {
                title: "from bob".into(),
                description: "d".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let state = state_with_db(db);

        let json = get_dashboard(build_app(state.clone()), &auth_cookie_for(&state, &alice)).await;

        assert_eq!(json["stats"]["total"], 2);
        assert_eq!(json["stats"]["pending"], 1);
        assert_eq!(json["stats"]["resolved"], 1);
        assert_eq!(json["stats"]["urgent"], 1);
        assert_eq!(json["stats"].as_object().unwrap().len(), 5);
        assert_eq!(json["is_staff"], false);
        assert_eq!(json["recent_complaints"].as_array().unwrap().len(), 2);

        let distribution = json["status_distribution"].as_array().unwrap();
        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution[0]["status"], "pending");
        assert_eq!(distribution[0]["count"], 1);
        assert_eq!(distribution[1]["status"], "resolved");
    }

    #[tokio::test]
    async fn staff_dashboard_counts_every_complaint() {
        let alice = test_user("alice", false);
        let staff = test_user("supervisor", true);
        let db = Arc::new(
            MockDb::default()
                .with_user(alice.clone())
                .with_user(staff.clone()),
        );
        for title in ["one", "two", "three"] {
            db.create_complaint(
                alice.id,
                &NewComplaint {
                    title: title.into(),
                    description: "d".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        let state = state_with_db(db);

        let json = get_dashboard(build_app(state.clone()), &auth_cookie_for(&state, &staff)).await;
        assert_eq!(json["stats"]["total"], 3);
        assert_eq!(json["is_staff"], true);
    }

    #[tokio::test]
    async fn recent_complaints_are_capped_at_ten_newest_first() {
        let alice = test_user("alice", false);
        let db = Arc::new(MockDb::default().with_user(alice.clone()));
        for i in 0..12 {
            db.create_complaint(
                alice.id,
                &NewComplaint {
                    title: format!("complaint {i}"),
                    description: "d".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        let state = state_with_db(db);

        let json = get_dashboard(build_app(state.clone()), &auth_cookie_for(&state, &alice)).await;
        let recent = json["recent_complaints"].as_array().unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0]["title"], "complaint 11");
    }

    #[tokio::test]
    async fn anonymous_callers_get_a_401() {
        let state = state_with_db(Arc::new(MockDb::default()));
        let res = build_app(state)
            .oneshot(Request::get("/dashboard/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
