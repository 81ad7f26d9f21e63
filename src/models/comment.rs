use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::models::timestamps;

#[derive(Debug, FromRow, Serialize, Clone)]
pub struct Comment {
    pub id: uuid::Uuid,
    pub complaint_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub comment: String,
    pub is_internal: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Comment with the author's username joined in, as rendered on the detail
/// page and echoed by the comment endpoint.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct CommentView {
    pub id: uuid::Uuid,
    pub comment: String,
    pub user: String,
    #[serde(with = "timestamps::plain")]
    pub created_at: OffsetDateTime,
    pub is_internal: bool,
}

impl Comment {
    pub fn into_view(self, username: &str) -> CommentView {
        CommentView {
            id: self.id,
            comment: self.comment,
            user: username.to_string(),
            created_at: self.created_at,
            is_internal: self.is_internal,
        }
    }
}
