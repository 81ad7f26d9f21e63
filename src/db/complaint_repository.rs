use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::models::comment::{Comment, CommentView};
use crate::models::complaint::{
    Complaint, ComplaintDetail, ComplaintPriority, ComplaintStatus, ComplaintSummary,
    NewComplaint, StatusCounts,
};
use crate::models::history::{HistoryView, NewHistoryEntry};

/// Which complaints a caller may see. Staff read everything, everyone else is
/// limited to complaints they filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintScope {
    All,
    CreatedBy(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    pub search: Option<String>,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplaintPage {
    pub complaints: Vec<ComplaintSummary>,
    pub total: i64,
    pub page: i64,
    pub num_pages: i64,
}

/// Page arithmetic shared by the Postgres and in-memory implementations. An
/// empty result set still has one (empty) page.
pub fn page_count(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    async fn create_complaint(
        &self,
        created_by: Uuid,
        data: &NewComplaint,
    ) -> Result<Complaint, sqlx::Error>;
    async fn find_by_ticket(&self, ticket_number: &str) -> Result<Option<Complaint>, sqlx::Error>;
    async fn find_detail_by_ticket(
        &self,
        ticket_number: &str,
    ) -> Result<Option<ComplaintDetail>, sqlx::Error>;
    async fn list_page(
        &self,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        page: i64,
        per_page: i64,
    ) -> Result<ComplaintPage, sqlx::Error>;
    async fn list_recent(
        &self,
        scope: ComplaintScope,
        limit: i64,
    ) -> Result<Vec<ComplaintSummary>, sqlx::Error>;
    async fn list_filtered(
        &self,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        limit: i64,
    ) -> Result<Vec<ComplaintSummary>, sqlx::Error>;
    async fn update_status(
        &self,
        id: Uuid,
        status: ComplaintStatus,
        resolution_notes: Option<&str>,
    ) -> Result<Complaint, sqlx::Error>;
    async fn update_assignee(
        &self,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<(), sqlx::Error>;
    async fn insert_comment(
        &self,
        complaint_id: Uuid,
        user_id: Uuid,
        comment: &str,
        is_internal: bool,
    ) -> Result<Comment, sqlx::Error>;
    async fn list_comments(
        &self,
        complaint_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<CommentView>, sqlx::Error>;
    async fn insert_history(&self, entry: &NewHistoryEntry) -> Result<(), sqlx::Error>;
    async fn list_history(
        &self,
        complaint_id: Uuid,
        limit: i64,
    ) -> Result<Vec<HistoryView>, sqlx::Error>;
    async fn status_counts(&self, scope: ComplaintScope) -> Result<StatusCounts, sqlx::Error>;
}
