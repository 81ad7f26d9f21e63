use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::state::AppState;

#[derive(Deserialize, Serialize)]
pub struct CommentPayload {
    pub comment: String,
    #[serde(default)]
    pub is_internal: bool,
}

/// POST /api/complaint/{ticket_number}/comment/. Open to the complaint's
/// owner and to staff. Only staff can mark a comment internal; the flag is
/// silently dropped for everyone else.
pub async fn add_comment(
    State(app_state): State<AppState>,
    session: AuthSession,
    Path(ticket_number): Path<String>,
    Json(payload): Json<CommentPayload>,
) -> Response {
    let claims = session.0;

    let complaint = match app_state.complaints.find_by_ticket(&ticket_number).await {
        Ok(Some(complaint)) => complaint,
        Ok(None) => return JsonResponse::not_found("Complaint not found").into_response(),
        Err(e) => {
            tracing::error!("DB error loading complaint {ticket_number}: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    if !claims.is_staff && complaint.created_by != claims.sub {
        return JsonResponse::forbidden("Permission denied").into_response();
    }

    let text = payload.comment.trim();
    if text.is_empty() {
        return JsonResponse::ok_error("Comment cannot be empty").into_response();
    }

    let is_internal = payload.is_internal && claims.is_staff;
    let comment = match app_state
        .complaints
        .insert_comment(complaint.id, claims.sub, text, is_internal)
        .await
    {
        Ok(comment) => comment,
        Err(e) => {
            tracing::error!("DB error adding comment to {ticket_number}: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    Json(json!({
        "success": true,
        "comment": comment.into_view(&claims.username),
    }))
    .into_response()
}
