use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::db::complaint_repository::ComplaintFilter;
use crate::models::complaint::{ComplaintPriority, ComplaintStatus};
use crate::models::history::NewHistoryEntry;
use crate::state::AppState;

pub const PAGE_SIZE: i64 = 20;
pub const DETAIL_HISTORY_LIMIT: i64 = 20;
pub const API_COMPLAINTS_LIMIT: i64 = 100;

/// Deserializes `""` as `None` so blank query-string filters behave like
/// absent ones. Forms submit empty selects as empty strings.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Common list/API query string: free-text search plus status and priority
/// filters. The page number parses leniently; garbage falls back to page 1.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<ComplaintStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub priority: Option<ComplaintPriority>,
    #[serde(default)]
    pub page: Option<String>,
}

impl ListQuery {
    pub fn filter(&self) -> ComplaintFilter {
        ComplaintFilter {
            search: self.search.clone(),
            status: self.status,
            priority: self.priority,
        }
    }

    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or(1)
    }
}

pub fn status_choices() -> Vec<Value> {
    ComplaintStatus::ALL
        .iter()
        .map(|s| json!({ "value": s.as_str(), "label": s.label() }))
        .collect()
}

pub fn priority_choices() -> Vec<Value> {
    ComplaintPriority::ALL
        .iter()
        .map(|p| json!({ "value": p.as_str(), "label": p.label() }))
        .collect()
}

/// Appends one audit row. The primary mutation has already committed by the
/// time this runs, so a failed insert is logged rather than failing the
/// request.
pub async fn record_history(app_state: &AppState, entry: NewHistoryEntry) {
    if let Err(e) = app_state.complaints.insert_history(&entry).await {
        tracing::error!(
            "failed to record history for complaint {}: {:?}",
            entry.complaint_id,
            e
        );
    }
}
