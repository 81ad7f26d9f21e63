use std::str::FromStr;

use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::complaint::ComplaintStatus;
use crate::models::history::NewHistoryEntry;
use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::routes::complaints::helpers::record_history;
use crate::state::AppState;

#[derive(Deserialize, Serialize)]
pub struct UpdateStatusPayload {
    pub status: String,
    #[serde(default)]
    pub resolution_notes: Option<String>,
}

/// POST /api/complaint/{ticket_number}/status/. Staff only. Setting the
/// status to resolved stamps `resolved_at` once; moving it anywhere else
/// clears the stamp. Blank resolution notes leave the stored notes alone.
pub async fn update_status(
    State(app_state): State<AppState>,
    session: AuthSession,
    Path(ticket_number): Path<String>,
    Json(payload): Json<UpdateStatusPayload>,
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

    let new_status = match ComplaintStatus::from_str(payload.status.trim()) {
        Ok(status) => status,
        Err(_) => return JsonResponse::ok_error("Invalid status").into_response(),
    };

    let notes = payload
        .resolution_notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty());

    let old_status = complaint.status;
    let updated = match app_state
        .complaints
        .update_status(complaint.id, new_status, notes)
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            tracing::error!("DB error updating status of {ticket_number}: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    record_history(
        &app_state,
        NewHistoryEntry {
            complaint_id: complaint.id,
            changed_by: Some(claims.sub),
            field_name: "status".into(),
            old_value: old_status.as_str().to_string(),
            new_value: new_status.as_str().to_string(),
        },
    )
    .await;

    Json(json!({
        "success": true,
        "status": updated.status,
    }))
    .into_response()
}
