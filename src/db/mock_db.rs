use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::category_repository::CategoryRepository;
use crate::db::complaint_repository::{
    page_count, ComplaintFilter, ComplaintPage, ComplaintRepository, ComplaintScope,
};
use crate::db::user_repository::UserRepository;
use crate::models::category::Category;
use crate::models::comment::{Comment, CommentView};
use crate::models::complaint::{
    resolution_timestamp, Complaint, ComplaintDetail, ComplaintPriority, ComplaintStatus,
    ComplaintSummary, NewComplaint, StatusCounts,
};
use crate::models::history::{HistoryEntry, HistoryView, NewHistoryEntry};
use crate::models::user::{NewUser, PublicUser, User};
use crate::utils::ticket::{format_ticket_number, TICKET_PREFIX};

/// In-memory stand-in for the Postgres repositories. Behaves like the real
/// thing for everything handlers observe: scoping, filtering, ordering,
/// pagination, ticket numbering, and the resolved_at rule.
#[derive(Default)]
pub struct MockDb {
    pub users: Mutex<Vec<User>>,
    pub categories: Mutex<Vec<Category>>,
    pub complaints: Mutex<Vec<Complaint>>,
    pub comments: Mutex<Vec<Comment>>,
    pub history: Mutex<Vec<HistoryEntry>>,
    pub ticket_seq: AtomicI64,
    pub should_fail: bool,
}

impl MockDb {
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().push(user);
        self
    }

    pub fn with_category(self, category: Category) -> Self {
        self.categories.lock().unwrap().push(category);
        self
    }

    /// Seeds a complaint and advances the ticket sequence past its number so
    /// later creates do not collide.
    pub fn with_complaint(self, complaint: Complaint) -> Self {
        if let Some(seq) = complaint
            .ticket_number
            .strip_prefix(TICKET_PREFIX)
            .and_then(|digits| digits.parse::<i64>().ok())
        {
            self.ticket_seq.fetch_max(seq, Ordering::SeqCst);
        }
        self.complaints.lock().unwrap().push(complaint);
        self
    }

    pub fn history_rows(&self) -> Vec<HistoryEntry> {
        self.history.lock().unwrap().clone()
    }

    fn fail_check(&self) -> Result<(), sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(())
    }

    fn username_for(&self, user_id: Uuid) -> String {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn category_name_for(&self, category_id: Option<Uuid>) -> Option<String> {
        let category_id = category_id?;
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.clone())
    }

    fn summary_for(&self, complaint: &Complaint) -> ComplaintSummary {
        ComplaintSummary {
            id: complaint.id,
            ticket_number: complaint.ticket_number.clone(),
            title: complaint.title.clone(),
            status: complaint.status,
            priority: complaint.priority,
            created_by: self.username_for(complaint.created_by),
            assigned_to: complaint.assigned_to.map(|id| self.username_for(id)),
            category: self.category_name_for(complaint.category_id),
            created_at: complaint.created_at,
        }
    }

    fn matches(
        complaint: &Complaint,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        search_description: bool,
    ) -> bool {
        if let ComplaintScope::CreatedBy(user_id) = scope {
            if complaint.created_by != user_id {
                return false;
            }
        }

        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let needle = search.to_lowercase();
                let mut hit = complaint.ticket_number.to_lowercase().contains(&needle)
                    || complaint.title.to_lowercase().contains(&needle);
                if search_description {
                    hit = hit || complaint.description.to_lowercase().contains(&needle);
                }
                if !hit {
                    return false;
                }
            }
        }

        if let Some(status) = filter.status {
            if complaint.status != status {
                return false;
            }
        }

        if let Some(priority) = filter.priority {
            if complaint.priority != priority {
                return false;
            }
        }

        true
    }

    fn filtered_newest_first(
        &self,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        search_description: bool,
    ) -> Vec<Complaint> {
        let mut rows: Vec<Complaint> = self
            .complaints
            .lock()
            .unwrap()
            .iter()
            .filter(|c| Self::matches(c, scope, filter, search_description))
            .cloned()
            .collect();
        // Newest first; ticket number breaks created_at ties.
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.ticket_number.cmp(&a.ticket_number))
        });
        rows
    }
}

#[async_trait]
impl UserRepository for MockDb {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        self.fail_check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_public_user_by_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PublicUser>, sqlx::Error> {
        self.fail_check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| PublicUser {
                id: u.id,
                username: u.username.clone(),
                email: u.email.clone(),
                first_name: u.first_name.clone(),
                last_name: u.last_name.clone(),
                is_staff: u.is_staff,
            }))
    }

    async fn is_username_taken(&self, username: &str) -> Result<bool, sqlx::Error> {
        self.fail_check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.username == username))
    }

    async fn create_user(
        &self,
        payload: &NewUser,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        self.fail_check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == payload.username) {
            return Err(sqlx::Error::Protocol("duplicate username".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: payload.username.clone(),
            email: payload.email.clone(),
            password_hash: password_hash.to_string(),
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
            is_staff: false,
            is_active: true,
            date_joined: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CategoryRepository for MockDb {
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        self.fail_check()?;
        let mut categories = self.categories.lock().unwrap().clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
        self.fail_check()?;
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }
}

#[async_trait]
impl ComplaintRepository for MockDb {
    async fn create_complaint(
        &self,
        created_by: Uuid,
        data: &NewComplaint,
    ) -> Result<Complaint, sqlx::Error> {
        self.fail_check()?;
        let seq = self.ticket_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let now = OffsetDateTime::now_utc();
        let complaint = Complaint {
            id: Uuid::new_v4(),
            ticket_number: format_ticket_number(seq),
            title: data.title.clone(),
            description: data.description.clone(),
            category_id: data.category_id,
            status: ComplaintStatus::Pending,
            priority: data.priority,
            created_by,
            assigned_to: None,
            location: data.location.clone(),
            contact_email: data.contact_email.clone(),
            contact_phone: data.contact_phone.clone(),
            attachment: data.attachment.clone(),
            resolution_notes: String::new(),
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        self.complaints.lock().unwrap().push(complaint.clone());
        Ok(complaint)
    }

    async fn find_by_ticket(&self, ticket_number: &str) -> Result<Option<Complaint>, sqlx::Error> {
        self.fail_check()?;
        Ok(self
            .complaints
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.ticket_number == ticket_number)
            .cloned())
    }

    async fn find_detail_by_ticket(
        &self,
        ticket_number: &str,
    ) -> Result<Option<ComplaintDetail>, sqlx::Error> {
        self.fail_check()?;
        let complaint = match self.find_by_ticket(ticket_number).await? {
            Some(c) => c,
            None => return Ok(None),
        };
        Ok(Some(ComplaintDetail {
            id: complaint.id,
            ticket_number: complaint.ticket_number.clone(),
            title: complaint.title.clone(),
            description: complaint.description.clone(),
            category: self.category_name_for(complaint.category_id),
            status: complaint.status,
            priority: complaint.priority,
            created_by: self.username_for(complaint.created_by),
            created_by_id: complaint.created_by,
            assigned_to: complaint.assigned_to.map(|id| self.username_for(id)),
            assigned_to_id: complaint.assigned_to,
            location: complaint.location.clone(),
            contact_email: complaint.contact_email.clone(),
            contact_phone: complaint.contact_phone.clone(),
            attachment: complaint.attachment.clone(),
            resolution_notes: complaint.resolution_notes.clone(),
            resolved_at: complaint.resolved_at,
            created_at: complaint.created_at,
            updated_at: complaint.updated_at,
        }))
    }

    async fn list_page(
        &self,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        page: i64,
        per_page: i64,
    ) -> Result<ComplaintPage, sqlx::Error> {
        self.fail_check()?;
        let rows = self.filtered_newest_first(scope, filter, true);
        let total = rows.len() as i64;
        let num_pages = page_count(total, per_page);
        let page = page.clamp(1, num_pages);
        let complaints = rows
            .iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .map(|c| self.summary_for(c))
            .collect();
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
        self.fail_check()?;
        Ok(self
            .filtered_newest_first(scope, &ComplaintFilter::default(), true)
            .iter()
            .take(limit as usize)
            .map(|c| self.summary_for(c))
            .collect())
    }

    async fn list_filtered(
        &self,
        scope: ComplaintScope,
        filter: &ComplaintFilter,
        limit: i64,
    ) -> Result<Vec<ComplaintSummary>, sqlx::Error> {
        self.fail_check()?;
        Ok(self
            .filtered_newest_first(scope, filter, false)
            .iter()
            .take(limit as usize)
            .map(|c| self.summary_for(c))
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ComplaintStatus,
        resolution_notes: Option<&str>,
    ) -> Result<Complaint, sqlx::Error> {
        self.fail_check()?;
        let mut complaints = self.complaints.lock().unwrap();
        let complaint = complaints
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;
        let now = OffsetDateTime::now_utc();
        complaint.status = status;
        complaint.resolved_at = resolution_timestamp(status, complaint.resolved_at, now);
        if let Some(notes) = resolution_notes {
            complaint.resolution_notes = notes.to_string();
        }
        complaint.updated_at = now;
        Ok(complaint.clone())
    }

    async fn update_assignee(
        &self,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<(), sqlx::Error> {
        self.fail_check()?;
        let mut complaints = self.complaints.lock().unwrap();
        let complaint = complaints
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;
        complaint.assigned_to = assigned_to;
        complaint.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn insert_comment(
        &self,
        complaint_id: Uuid,
        user_id: Uuid,
        comment: &str,
        is_internal: bool,
    ) -> Result<Comment, sqlx::Error> {
        self.fail_check()?;
        let comment = Comment {
            id: Uuid::new_v4(),
            complaint_id,
            user_id,
            comment: comment.to_string(),
            is_internal,
            created_at: OffsetDateTime::now_utc(),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(
        &self,
        complaint_id: Uuid,
        include_internal: bool,
    ) -> Result<Vec<CommentView>, sqlx::Error> {
        self.fail_check()?;
        let mut rows: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.complaint_id == complaint_id && (include_internal || !c.is_internal))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows
            .into_iter()
            .map(|c| {
                let username = self.username_for(c.user_id);
                c.into_view(&username)
            })
            .collect())
    }

    async fn insert_history(&self, entry: &NewHistoryEntry) -> Result<(), sqlx::Error> {
        self.fail_check()?;
        self.history.lock().unwrap().push(HistoryEntry {
            id: Uuid::new_v4(),
            complaint_id: entry.complaint_id,
            changed_by: entry.changed_by,
            field_name: entry.field_name.clone(),
            old_value: entry.old_value.clone(),
            new_value: entry.new_value.clone(),
            changed_at: OffsetDateTime::now_utc(),
        });
        Ok(())
    }

    async fn list_history(
        &self,
        complaint_id: Uuid,
        limit: i64,
    ) -> Result<Vec<HistoryView>, sqlx::Error> {
        self.fail_check()?;
        let mut rows: Vec<HistoryEntry> = self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.complaint_id == complaint_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|h| HistoryView {
                field_name: h.field_name,
                old_value: h.old_value,
                new_value: h.new_value,
                changed_by: h.changed_by.map(|id| self.username_for(id)),
                changed_at: h.changed_at,
            })
            .collect())
    }

    async fn status_counts(&self, scope: ComplaintScope) -> Result<StatusCounts, sqlx::Error> {
        self.fail_check()?;
        let rows = self.filtered_newest_first(scope, &ComplaintFilter::default(), true);
        let by_status = |status: ComplaintStatus| -> i64 {
            rows.iter().filter(|c| c.status == status).count() as i64
        };
        Ok(StatusCounts {
            total: rows.len() as i64,
            pending: by_status(ComplaintStatus::Pending),
            in_progress: by_status(ComplaintStatus::InProgress),
            resolved: by_status(ComplaintStatus::Resolved),
            closed: by_status(ComplaintStatus::Closed),
            rejected: by_status(ComplaintStatus::Rejected),
            urgent: rows
                .iter()
                .filter(|c| {
                    c.priority == ComplaintPriority::Urgent
                        && matches!(
                            c.status,
                            ComplaintStatus::Pending | ComplaintStatus::InProgress
                        )
                })
                .count() as i64,
        })
    }
}
