use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::routes::complaints::helpers::{
    priority_choices, status_choices, DETAIL_HISTORY_LIMIT,
};
use crate::state::AppState;

/// GET /complaint/{ticket_number}/. Owners and staff only; anyone else is
/// bounced back to the list with an error banner rather than told the ticket
/// exists.
pub async fn complaint_detail(
    State(app_state): State<AppState>,
    session: AuthSession,
    Path(ticket_number): Path<String>,
) -> Response {
    let claims = session.0;

    let complaint = match app_state
        .complaints
        .find_detail_by_ticket(&ticket_number)
        .await
    {
        Ok(Some(complaint)) => complaint,
        Ok(None) => return JsonResponse::not_found("Complaint not found").into_response(),
        Err(e) => {
            tracing::error!("DB error loading complaint {ticket_number}: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    if !claims.is_staff && complaint.created_by_id != claims.sub {
        return JsonResponse::redirect_with_error(
            "/complaints/",
            "You do not have permission to view this complaint.",
        )
        .into_response();
    }

    // Internal notes stay between staff.
    let comments = match app_state
        .complaints
        .list_comments(complaint.id, claims.is_staff)
        .await
    {
        Ok(comments) => comments,
        Err(e) => {
            tracing::error!("DB error loading comments for {ticket_number}: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let history = match app_state
        .complaints
        .list_history(complaint.id, DETAIL_HISTORY_LIMIT)
        .await
    {
        Ok(history) => history,
        Err(e) => {
            tracing::error!("DB error loading history for {ticket_number}: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let can_edit = claims.is_staff || complaint.created_by_id == claims.sub;
    Json(json!({
        "complaint": complaint,
        "comments": comments,
        "history": history,
        "is_staff": claims.is_staff,
        "can_edit": can_edit,
        "status_choices": status_choices(),
        "priority_choices": priority_choices(),
    }))
    .into_response()
}
