use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::history::NewHistoryEntry;
use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::routes::complaints::helpers::record_history;
use crate::state::AppState;

const UNASSIGNED: &str = "Unassigned";

#[derive(Deserialize, Serialize)]
pub struct AssignPayload {
    /// `null` or absent unassigns the complaint.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// POST /api/complaint/{ticket_number}/assign/. Staff only. History records
/// the change by username so the audit trail survives user deletion.
pub async fn assign_complaint(
    State(app_state): State<AppState>,
    session: AuthSession,
    Path(ticket_number): Path<String>,
    Json(payload): Json<AssignPayload>,
) -> Response {
    let claims = session.0;
    if !claims.is_staff {
        return JsonResponse::forbidden("Permission denied").into_response();
    }

    let complaint = match app_state.complaints.find_by_ticket(&ticket_number).await {
        Ok(Some(complaint)) => complaint,
        Ok(None) => return JsonResponse::not_found("Complaint not found").into_response(),
        Err(e) => {
            tracing::error!("DB error loading complaint {ticket_number}: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let new_name = match payload.user_id {
        Some(user_id) => match app_state.users.find_public_user_by_id(user_id).await {
            Ok(Some(user)) => Some(user.username),
            Ok(None) => return JsonResponse::not_found("User not found").into_response(),
            Err(e) => {
                tracing::error!("DB error loading assignee {user_id}: {:?}", e);
                return JsonResponse::server_error("Database error").into_response();
            }
        },
        None => None,
    };

    let old_name = match complaint.assigned_to {
        Some(old_id) => match app_state.users.find_public_user_by_id(old_id).await {
            Ok(Some(user)) => user.username,
            Ok(None) => UNASSIGNED.to_string(),
            Err(e) => {
                tracing::error!("DB error loading previous assignee: {:?}", e);
                return JsonResponse::server_error("Database error").into_response();
            }
        },
        None => UNASSIGNED.to_string(),
    };

    if let Err(e) = app_state
        .complaints
        .update_assignee(complaint.id, payload.user_id)
        .await
    {
        tracing::error!("DB error assigning {ticket_number}: {:?}", e);
        return JsonResponse::server_error("Database error").into_response();
    }

    record_history(
        &app_state,
        NewHistoryEntry {
            complaint_id: complaint.id,
            changed_by: Some(claims.sub),
            field_name: "assigned_to".into(),
            old_value: old_name,
            new_value: new_name.unwrap_or_else(|| UNASSIGNED.to_string()),
        },
    )
    .await;

    Json(json!({ "success": true })).into_response()
}
