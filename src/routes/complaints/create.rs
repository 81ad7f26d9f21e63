use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::forms::{ComplaintForm, FieldErrors, UploadedFile};
use crate::models::history::NewHistoryEntry;
use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::routes::complaints::helpers::record_history;
use crate::state::AppState;

/// GET /complaint/create/. The create-form context.
pub async fn submit_page(State(app_state): State<AppState>, _session: AuthSession) -> Response {
    match app_state.categories.list_categories().await {
        Ok(categories) => Json(json!({ "categories": categories })).into_response(),
        Err(e) => {
            tracing::error!("DB error loading categories: {:?}", e);
            JsonResponse::server_error("Database error").into_response()
        }
    }
}

fn invalid_submission() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": "Invalid form submission." })),
    )
        .into_response()
}

/// POST /complaint/create/. Multipart because of the optional attachment;
/// text fields are collected into a `ComplaintForm` and validated as one unit
/// so every problem is reported in a single response.
pub async fn handle_submit(
    State(app_state): State<AppState>,
    session: AuthSession,
    mut multipart: Multipart,
) -> Response {
    let claims = session.0;

    let mut form = ComplaintForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed complaint submission: {:?}", e);
                return invalid_submission();
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "attachment" {
            // Browsers send the part even when no file was chosen; an empty
            // filename means "no attachment".
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to read attachment: {:?}", e);
                    return invalid_submission();
                }
            };
            if !file_name.is_empty() && !bytes.is_empty() {
                form.attachment = Some(UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            match field.text().await {
                Ok(value) => form.set_field(&name, value),
                Err(e) => {
                    tracing::warn!("Malformed complaint field {name}: {:?}", e);
                    return invalid_submission();
                }
            }
        }
    }

    let mut new_complaint = match form.validate() {
        Ok(payload) => payload,
        Err(errors) => return JsonResponse::field_errors(&errors).into_response(),
    };

    if let Some(category_id) = new_complaint.category_id {
        match app_state.categories.find_category_by_id(category_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let mut errors = FieldErrors::default();
                errors.add(
                    "category",
                    "Select a valid choice. That choice is not one of the available choices.",
                );
                return JsonResponse::field_errors(&errors).into_response();
            }
            Err(e) => {
                tracing::error!("DB error checking category: {:?}", e);
                return JsonResponse::server_error("Database error").into_response();
            }
        }
    }

    if let Some(upload) = form.attachment.as_ref() {
        match app_state
            .attachments
            .save(&upload.file_name, &upload.bytes)
            .await
        {
            Ok(path) => new_complaint.attachment = Some(path),
            Err(e) => {
                tracing::error!("Failed to store attachment: {:?}", e);
                return JsonResponse::server_error("Failed to save attachment").into_response();
            }
        }
    }

    // A failed insert is reported the way a form error is, so the browser
    // side renders it inline instead of a blank 500 page.
    let complaint = match app_state
        .complaints
        .create_complaint(claims.sub, &new_complaint)
        .await
    {
        Ok(complaint) => complaint,
        Err(e) => {
            tracing::error!("DB error creating complaint: {:?}", e);
            return Json(json!({
                "success": false,
                "error": "An error occurred: Database error",
                "errors": { "__all__": ["Database error"] },
            }))
            .into_response();
        }
    };

    record_history(
        &app_state,
        NewHistoryEntry {
            complaint_id: complaint.id,
            changed_by: Some(claims.sub),
            field_name: "created".into(),
            old_value: String::new(),
            new_value: "Complaint created".into(),
        },
    )
    .await;

    let ticket_number = complaint.ticket_number;
    Json(json!({
        "success": true,
        "ticket_number": ticket_number,
        "redirect": format!("/complaint/{ticket_number}/"),
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
        db::mock_db::MockDb,
        models::category::Category,
        models::complaint::ComplaintPriority,
        models::user::User,
        state::test_support::{auth_cookie_for, state_with_db},
        state::AppState,
    };

    use super::{handle_submit, submit_page};

    const BOUNDARY: &str = "----compdesk-test-boundary";

    fn test_user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: "unused".into(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_active: true,
            date_joined: OffsetDateTime::now_utc(),
        }
    }

    fn test_category(name: &str) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn build_app(state: AppState) -> Router {
        Router::new()
            .route("/complaint/create/", get(submit_page).post(handle_submit))
            .with_state(state)
    }

    fn multipart_body(fields: &[(&str, &str)], attachment: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = attachment {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"attachment\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_submit(app: Router, cookie: &str, body: Vec<u8>) -> axum::response::Response {
        app.oneshot(
            Request::post("/complaint/create/")
                .header(header::COOKIE, cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn valid_submission_creates_ticket_and_history() {
        let user = test_user("alice");
        let category = test_category("Plumbing");
        let db = Arc::new(
            MockDb::default()
                .with_user(user.clone())
                .with_category(category.clone()),
        );
        let state = state_with_db(db.clone());

        let body = multipart_body(
            &[
                ("title", "Leaking pipe"),
                ("description", "Water everywhere in the basement"),
                ("category", &category.id.to_string()),
                ("priority", "high"),
                ("location", "Building B"),
                ("contact_email", "alice@example.com"),
                ("csrfmiddlewaretoken", "ignored"),
            ],
            None,
        );
        let res = post_submit(
            build_app(state.clone()),
            &auth_cookie_for(&state, &user),
            body,
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["ticket_number"], "COMP-000001");
        assert_eq!(json["redirect"], "/complaint/COMP-000001/");

        {
            let complaints = db.complaints.lock().unwrap();
            let stored = &complaints[0];
            assert_eq!(stored.priority, ComplaintPriority::High);
            assert_eq!(stored.category_id, Some(category.id));
            assert_eq!(stored.created_by, user.id);
        }

        let history = db.history_rows();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].field_name, "created");
        assert_eq!(history[0].new_value, "Complaint created");
        assert_eq!(history[0].changed_by, Some(user.id));
    }

    #[tokio::test]
    async fn missing_required_fields_come_back_as_field_errors() {
        let user = test_user("alice");
        let state = state_with_db(Arc::new(MockDb::default().with_user(user.clone())));

        let body = multipart_body(&[("priority", "low")], None);
        let res = post_submit(
            build_app(state.clone()),
            &auth_cookie_for(&state, &user),
            body,
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"]["title"][0], "This field is required.");
        assert_eq!(json["errors"]["description"][0], "This field is required.");
    }

    #[tokio::test]
    async fn unknown_category_is_a_choice_error() {
        let user = test_user("alice");
        let state = state_with_db(Arc::new(MockDb::default().with_user(user.clone())));

        let body = multipart_body(
            &[
                ("title", "t"),
                ("description", "d"),
                ("category", &Uuid::new_v4().to_string()),
            ],
            None,
        );
        let res = post_submit(
            build_app(state.clone()),
            &auth_cookie_for(&state, &user),
            body,
        )
        .await;

        let json = body_json(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(
            json["errors"]["category"][0],
            "Select a valid choice. That choice is not one of the available choices."
        );
    }

    #[tokio::test]
    async fn attachment_lands_on_disk_with_a_unique_name() {
        let user = test_user("alice");
        let db = Arc::new(MockDb::default().with_user(user.clone()));
        let state = state_with_db(db.clone());

        let payload = b"\x89PNG fake image bytes";
        let body = multipart_body(
            &[("title", "Broken window"), ("description", "Third floor")],
            Some(("photo.png", payload)),
        );
        let res = post_submit(
            build_app(state.clone()),
            &auth_cookie_for(&state, &user),
            body,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let stored_path = db.complaints.lock().unwrap()[0]
            .attachment
            .clone()
            .expect("attachment path should be recorded");
        assert!(stored_path.starts_with("complaint_attachments/"));
        assert!(stored_path.ends_with("-photo.png"));

        let on_disk = std::fs::read(state.config.attachment_dir.join(&stored_path)).unwrap();
        assert_eq!(on_disk, payload);

        std::fs::remove_dir_all(&state.config.attachment_dir).unwrap();
    }

    #[tokio::test]
    async fn empty_attachment_part_is_ignored() {
        let user = test_user("alice");
        let db = Arc::new(MockDb::default().with_user(user.clone()));
        let state = state_with_db(db.clone());

        let body = multipart_body(
            &[("title", "No file"), ("description", "Just text")],
            Some(("", b"")),
        );
        let res = post_submit(
            build_app(state.clone()),
            &auth_cookie_for(&state, &user),
            body,
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(db.complaints.lock().unwrap()[0].attachment, None);
    }

    #[tokio::test]
    async fn anonymous_callers_get_a_401() {
        let state = state_with_db(Arc::new(MockDb::default()));
        let res = build_app(state)
            .oneshot(
                Request::post("/complaint/create/")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(multipart_body(&[("title", "t")], None)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn insert_failure_is_reported_as_a_form_error() {
        let user = test_user("alice");
        let state = state_with_db(Arc::new(MockDb::failing().with_user(user.clone())));

        let body = multipart_body(&[("title", "t"), ("description", "d")], None);
        let res = post_submit(
            build_app(state.clone()),
            &auth_cookie_for(&state, &user),
            body,
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "An error occurred: Database error");
        assert_eq!(json["errors"]["__all__"][0], "Database error");
    }

    #[tokio::test]
    async fn submit_page_lists_categories() {
        let user = test_user("alice");
        let state = state_with_db(Arc::new(
            MockDb::default()
                .with_user(user.clone())
                .with_category(test_category("Roads"))
                .with_category(test_category("Water")),
        ));

        let res = build_app(state.clone())
            .oneshot(
                Request::get("/complaint/create/")
                    .header(header::COOKIE, auth_cookie_for(&state, &user))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["categories"].as_array().unwrap().len(), 2);
        assert_eq!(json["categories"][0]["name"], "Roads");
    }
}
