use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::complaint_repository::{
    page_count, ComplaintFilter, ComplaintPage, ComplaintRepository, ComplaintScope,
};
use crate::models::comment::{Comment, CommentView};
use crate::models::complaint::{
    Complaint, ComplaintDetail, ComplaintStatus, ComplaintSummary, NewComplaint, StatusCounts,
};
use crate::models::history::{HistoryView, NewHistoryEntry};
use crate::utils::ticket::format_ticket_number;

pub struct PostgresComplaintRepository {
    pub pool: PgPool,
}

const SUMMARY_SELECT: &str = "SELECT c.id, c.ticket_number, c.title, c.status, c.priority, \
     u.username AS created_by, au.username AS assigned_to, cat.name AS category, c.created_at \
     FROM complaints c \
     JOIN users u ON u.id = c.created_by \
     LEFT JOIN users au ON au.id = c.assigned_to \
     LEFT JOIN categories cat ON cat.id = c.category_id \
     WHERE TRUE";

/// Appends scope and filter conditions. Only `complaints c` columns are
/// referenced so the same fragment works for joined selects and bare counts.
fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: ComplaintScope,
    filter: &ComplaintFilter,
    search_description: bool,
) {
    if let ComplaintScope::CreatedBy(user_id) = scope {
        qb.push(" AND c.created_by = ").push_bind(user_id);
    }

    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            let pattern = format!("%{search}%");
            qb.push(" AND (c.ticket_number ILIKE ")
                .push_bind(pattern.clone());
            qb.push(" OR c.title ILIKE ").push_bind(pattern.clone());
            if search_description {
                qb.push(" OR c.description ILIKE ").push_bind(pattern);
            }
            qb.push(")");
        }
    }

    if let Some(status) = filter.status {
        qb.push(" AND c.status = ").push_bind(status);
    }

    if let Some(priority) = filter.priority {
        qb.push(" AND c.priority = ").push_bind(priority);
    }
}

#[async_trait]
impl ComplaintRepository for PostgresComplaintRepository {
    async fn create_complaint(
        &self,
        created_by: Uuid,
        data: &NewComplaint,
    ) -> Result<Complaint, sqlx::Error> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('complaint_ticket_seq')")
            .fetch_one(&self.pool)
            .await?;
        let ticket_number = format_ticket_number(seq);

        sqlx::query_as::<_, Complaint>(
            "INSERT INTO complaints \
             (ticket_number, title, description, category_id, priority, created_by, \
              location, contact_email, contact_phone, attachment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING *",
        )
        .bind(&ticket_number)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.category_id)
        .bind(data.priority)
        .bind(created_by)
        .bind(&data.location)
        .bind(&data.contact_email)
        .bind(&data.contact_phone)
        .bind(data.attachment.as_deref())
        .fetch_one(&self.pool)
        .await
    }

    async fn find_by_ticket(&self, ticket_number: &str) -> Result<Option<Complaint>, sqlx::Error> {
        sqlx::query_as::<_, Complaint>("SELECT * FROM complaints WHERE ticket_number = $1")
            .bind(ticket_number)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_detail_by_ticket(
        &self,
        ticket_number: &str,
    ) -> Result<Option<ComplaintDetail>, sqlx::Error> {
        sqlx::query_as::<_, ComplaintDetail>(
            "SELECT c.id, c.ticket_number, c.title, c.description, cat.name AS category, \
             c.status, c.priority, u.username AS created_by, c.created_by AS created_by_id, \
             au.username AS assigned_to, c.assigned_to AS assigned_to_id, \
             c.location, c.contact_email, c.contact_phone, c.attachment, \
             c.resolution_notes, c.resolved_at, c.created_at, c.updated_at \
             FROM complaints c \
             JOIN users u ON u.id = c.created_by \
             LEFT JOIN users au ON au.id = c.assigned_to \
             LEFT JOIN categories cat ON cat.id = c.category_id \
             WHERE c.ticket_number = $1",
        )
        .bind(ticket_number)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_page(
        &self,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        page: i64,
        per_page: i64,
    ) -> Result<ComplaintPage, sqlx::Error> {
        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM complaints c WHERE TRUE");
        push_filters(&mut count_query, scope, filter, true);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        // Out-of-range pages fold back into range, like a paginator's get_page.
        let num_pages = page_count(total, per_page);
        let page = page.clamp(1, num_pages);

        let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filters(&mut query, scope, filter, true);
        query
            .push(" ORDER BY c.created_at DESC LIMIT ")
            .push_bind(per_page);
        query.push(" OFFSET ").push_bind((page - 1) * per_page);
        let complaints = query
            .build_query_as::<ComplaintSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ComplaintPage {
            complaints,
            total,
            page,
            num_pages,
        })
    }

    async fn list_recent(
        &self,
        scope: ComplaintScope,
        limit: i64,
    ) -> Result<Vec<ComplaintSummary>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filters(&mut query, scope, &ComplaintFilter::default(), true);
        query
            .push(" ORDER BY c.created_at DESC LIMIT ")
            .push_bind(limit);
        query
            .build_query_as::<ComplaintSummary>()
            .fetch_all(&self.pool)
            .await
    }

    async fn list_filtered(
        &self,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        limit: i64,
    ) -> Result<Vec<ComplaintSummary>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filters(&mut query, scope, filter, false);
        query
            .push(" ORDER BY c.created_at DESC LIMIT ")
            .push_bind(limit);
        query
            .build_query_as::<ComplaintSummary>()
            .fetch_all(&self.pool)
            .await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ComplaintStatus,
        resolution_notes: Option<&str>,
    ) -> Result<Complaint, sqlx::Error> {
        // resolved_at mirrors the status: first entry into resolved stamps it,
        // staying resolved keeps it, leaving resolved clears it.
        sqlx::query_as::<_, Complaint>(
            "UPDATE complaints SET \
             status = $2, \
             resolution_notes = COALESCE($3, resolution_notes), \
             resolved_at = CASE \
                 WHEN $2 = 'resolved'::complaint_status THEN COALESCE(resolved_at, now()) \
                 ELSE NULL \
             END, \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(resolution_notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_assignee(
        &self,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE complaints SET assigned_to = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(assigned_to)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_comment(
        &self,
        complaint_id: Uuid,
        user_id: Uuid,
        comment: &str,
        is_internal: bool,
    ) -> Result<Comment, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (complaint_id, user_id, comment, is_internal) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(complaint_id)
        .bind(user_id)
        .bind(comment)
        .bind(is_internal)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_comments(
        &self,
        complaint_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        sqlx::query_as::<_, CommentView>(
            "SELECT cm.id, cm.comment, u.username AS \"user\", cm.created_at, cm.is_internal \
             FROM comments cm \
             JOIN users u ON u.id = cm.user_id \
             WHERE cm.complaint_id = $1 AND ($2 OR cm.is_internal = FALSE) \
             ORDER BY cm.created_at",
        )
        .bind(complaint_id)
        .bind(include_internal)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_history(&self, entry: &NewHistoryEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO complaint_history \
             (complaint_id, changed_by, field_name, old_value, new_value) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.complaint_id)
        .bind(entry.changed_by)
        .bind(&entry.field_name)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_history(
        &self,
        complaint_id: Uuid,
        limit: i64,
    ) -> Result<Vec<HistoryView>, sqlx::Error> {
        sqlx::query_as::<_, HistoryView>(
            "SELECT h.field_name, h.old_value, h.new_value, u.username AS changed_by, h.changed_at \
             FROM complaint_history h \
             LEFT JOIN users u ON u.id = h.changed_by \
             WHERE h.complaint_id = $1 \
             ORDER BY h.changed_at DESC \
             LIMIT $2",
        )
        .bind(complaint_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn status_counts(&self, scope: ComplaintScope) -> Result<StatusCounts, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE c.status = 'pending') AS pending, \
             COUNT(*) FILTER (WHERE c.status = 'in_progress') AS in_progress, \
             COUNT(*) FILTER (WHERE c.status = 'resolved') AS resolved, \
             COUNT(*) FILTER (WHERE c.status = 'closed') AS closed, \
             COUNT(*) FILTER (WHERE c.status = 'rejected') AS rejected, \
             COUNT(*) FILTER (WHERE c.priority = 'urgent' \
                 AND c.status IN ('pending', 'in_progress')) AS urgent \
             FROM complaints c WHERE TRUE",
        );
        push_filters(&mut query, scope, &ComplaintFilter::default(), true);
        query
            .build_query_as::<StatusCounts>()
            .fetch_one(&self.pool)
            .await
    }
}
