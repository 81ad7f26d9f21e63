use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::responses::JsonResponse;
use crate::routes::auth::AuthSession;
use crate::routes::complaints::helpers::{ListQuery, API_COMPLAINTS_LIMIT};
use crate::state::AppState;

/// GET /api/complaints/. Flat scoped listing for widgets and polling; search
/// here matches ticket numbers and titles but not descriptions, and there is
/// no pagination, just a cap.
pub async fn api_complaints(
    State(app_state): State<AppState>,
    session: AuthSession,
    Query(query): Query<ListQuery>,
) -> Response {
    let claims = session.0;
    match app_state
        .complaints
        .list_filtered(claims.scope(), &query.filter(), API_COMPLAINTS_LIMIT)
        .await
    {
        Ok(complaints) => Json(json!({ "complaints": complaints })).into_response(),
        Err(e) => {
            tracing::error!("DB error listing complaints for API: {:?}", e);
            JsonResponse::server_error("Database error").into_response()
        }
    }
}

/// GET /api/stats/. Counts for the caller's scope.
pub async fn api_stats(State(app_state): State<AppState>, session: AuthSession) -> Response {
    let claims = session.0;
    match app_state.complaints.status_counts(claims.scope()).await {
        Ok(counts) => Json(json!({
            "total": counts.total,
            "pending": counts.pending,
            "in_progress": counts.in_progress,
            "resolved": counts.resolved,
            "closed": counts.closed,
            "urgent": counts.urgent,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("DB error computing stats: {:?}", e);
            JsonResponse::server_error("Database error").into_response()
        }
    }
}
