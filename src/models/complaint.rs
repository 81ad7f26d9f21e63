use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::Type, FromRow};
use time::OffsetDateTime;

use crate::models::timestamps;

#[derive(sqlx::Type, Debug, Deserialize, Serialize, PartialEq, Eq, Copy, Clone)]
#[sqlx(type_name = "complaint_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 5] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Closed,
        ComplaintStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Closed => "closed",
            ComplaintStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Closed => "Closed",
            ComplaintStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown complaint status")]
pub struct ParseStatusError;

impl FromStr for ComplaintStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ComplaintStatus::Pending),
            "in_progress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            "closed" => Ok(ComplaintStatus::Closed),
            "rejected" => Ok(ComplaintStatus::Rejected),
            _ => Err(ParseStatusError),
        }
    }
}

#[derive(Type, Debug, Deserialize, Serialize, PartialEq, Eq, Copy, Clone)]
#[sqlx(type_name = "complaint_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl ComplaintPriority {
    pub const ALL: [ComplaintPriority; 4] = [
        ComplaintPriority::Low,
        ComplaintPriority::Medium,
        ComplaintPriority::High,
        ComplaintPriority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintPriority::Low => "low",
            ComplaintPriority::Medium => "medium",
            ComplaintPriority::High => "high",
            ComplaintPriority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComplaintPriority::Low => "Low",
            ComplaintPriority::Medium => "Medium",
            ComplaintPriority::High => "High",
            ComplaintPriority::Urgent => "Urgent",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown complaint priority")]
pub struct ParsePriorityError;

impl FromStr for ComplaintPriority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ComplaintPriority::Low),
            "medium" => Ok(ComplaintPriority::Medium),
            "high" => Ok(ComplaintPriority::High),
            "urgent" => Ok(ComplaintPriority::Urgent),
            _ => Err(ParsePriorityError),
        }
    }
}

/// Full complaint row as stored.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct Complaint {
    pub id: uuid::Uuid,
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub category_id: Option<uuid::Uuid>,
    pub status: ComplaintStatus,
    pub priority: ComplaintPriority,
    pub created_by: uuid::Uuid,
    pub assigned_to: Option<uuid::Uuid>,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub attachment: Option<String>,
    pub resolution_notes: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub resolved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row shape for list views and the read API: usernames and the category are
/// already joined in.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct ComplaintSummary {
    pub id: uuid::Uuid,
    pub ticket_number: String,
    pub title: String,
    pub status: ComplaintStatus,
    pub priority: ComplaintPriority,
    pub created_by: String,
    pub assigned_to: Option<String>,
    pub category: Option<String>,
    #[serde(with = "timestamps::plain")]
    pub created_at: OffsetDateTime,
}

/// Complaint with joined display fields for the detail view. `created_by_id`
/// stays alongside the username so handlers can run ownership checks without a
/// second lookup.
#[derive(Debug, FromRow, Serialize, Clone)]
pub struct ComplaintDetail {
    pub id: uuid::Uuid,
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub status: ComplaintStatus,
    pub priority: ComplaintPriority,
    pub created_by: String,
    pub created_by_id: uuid::Uuid,
    pub assigned_to: Option<String>,
    pub assigned_to_id: Option<uuid::Uuid>,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub attachment: Option<String>,
    pub resolution_notes: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub resolved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated complaint input. `attachment` is filled in by the handler once
/// the upload has been written to disk.
#[derive(Debug, Clone, Default)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category_id: Option<uuid::Uuid>,
    pub priority: ComplaintPriority,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub attachment: Option<String>,
}

impl Default for ComplaintPriority {
    fn default() -> Self {
        ComplaintPriority::Medium
    }
}

/// Per-status complaint tallies for one caller's scope. `urgent` counts open
/// complaints (pending or in progress) with urgent priority, not a status.
#[derive(Debug, FromRow, Serialize, Clone, Copy)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub rejected: i64,
    pub urgent: i64,
}

impl StatusCounts {
    /// (status, count) pairs in declaration order, for grouped charts.
    pub fn by_status(&self) -> [(ComplaintStatus, i64); 5] {
        [
            (ComplaintStatus::Pending, self.pending),
            (ComplaintStatus::InProgress, self.in_progress),
            (ComplaintStatus::Resolved, self.resolved),
            (ComplaintStatus::Closed, self.closed),
            (ComplaintStatus::Rejected, self.rejected),
        ]
    }
}

/// Resolution timestamp rule: a complaint carries `resolved_at` exactly while
/// it sits in `Resolved`. The first transition in stamps `now`, staying in
/// `Resolved` keeps the original stamp, and any transition out clears it.
pub fn resolution_timestamp(
    status: ComplaintStatus,
    current: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Option<OffsetDateTime> {
    if status == ComplaintStatus::Resolved {
        Some(current.unwrap_or(now))
    } else {
        None
    }
}
