use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::models::timestamps;

#[derive(Debug, FromRow, Serialize, Clone)]
pub struct HistoryEntry {
    pub id: uuid::Uuid,
    pub complaint_id: uuid::Uuid,
    pub changed_by: Option<uuid::Uuid>,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    #[serde(with = "time::serde::rfc3339")]
    pub changed_at: OffsetDateTime,
}

/// One audit row to append. `changed_by` is optional so rows survive the
/// deleting of the acting account.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub complaint_id: uuid::Uuid,
    pub changed_by: Option<uuid::Uuid>,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
}

/// History row with the actor's username joined in, newest first on the
/// detail page.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct HistoryView {
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_by: Option<String>,
    #[serde(with = "timestamps::plain")]
    pub changed_at: OffsetDateTime,
}
