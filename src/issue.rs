//! Issue entity

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio_postgres::Row;
use uuid::Uuid;

/// A stored issue
///
/// Optional text columns stay `None` internally; on the wire they are always a
/// string, empty when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Storage generated identifier
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Project bucket
    pub project: String,
    /// Title
    pub issue_title: String,
    /// Body text
    pub issue_text: String,
    /// Author
    pub created_by: String,
    /// Assignee
    #[serde(serialize_with = "empty_when_unset")]
    pub assigned_to: Option<String>,
    /// Free-form status
    #[serde(serialize_with = "empty_when_unset")]
    pub status_text: Option<String>,
    /// Creation time
    pub created_on: DateTime<Utc>,
    /// Last update time
    pub updated_on: DateTime<Utc>,
    /// Open/closed flag
    pub open: bool,
}

impl Issue {
    /// Decode a row selected with [`crate::query::ISSUE_COLUMNS`]
    pub fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("_id")?,
            project: row.try_get("project")?,
            issue_title: row.try_get("issue_title")?,
            issue_text: row.try_get("issue_text")?,
            created_by: row.try_get("created_by")?,
            assigned_to: row.try_get("assigned_to")?,
            status_text: row.try_get("status_text")?,
            created_on: row.try_get("created_on")?,
            updated_on: row.try_get("updated_on")?,
            open: row.try_get("open")?,
        })
    }
}

fn empty_when_unset<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}
