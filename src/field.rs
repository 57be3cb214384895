//! Issue column allowlist
//!
//! Every identifier that reaches generated SQL comes from [`IssueField::column`].
//! Caller-supplied names are checked against `[A-Za-z_]+` first and then mapped
//! onto this closed set; anything else is rejected before a statement exists.

use crate::error::QueryError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]+$").expect("field name pattern is valid"));

/// Columns of the `issues` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    /// Storage generated identifier
    Id,
    /// Project bucket
    Project,
    /// Title
    IssueTitle,
    /// Body text
    IssueText,
    /// Author
    CreatedBy,
    /// Assignee, nullable
    AssignedTo,
    /// Free-form status, nullable
    StatusText,
    /// Creation timestamp
    CreatedOn,
    /// Last update timestamp
    UpdatedOn,
    /// Open/closed flag
    Open,
}

impl IssueField {
    /// All columns in table order
    pub const ALL: [Self; 10] = [
        Self::Id,
        Self::Project,
        Self::IssueTitle,
        Self::IssueText,
        Self::CreatedBy,
        Self::AssignedTo,
        Self::StatusText,
        Self::CreatedOn,
        Self::UpdatedOn,
        Self::Open,
    ];

    /// Columns a client may change through an update
    pub const MUTABLE: [Self; 6] = [
        Self::IssueTitle,
        Self::IssueText,
        Self::CreatedBy,
        Self::AssignedTo,
        Self::StatusText,
        Self::Open,
    ];

    /// Columns that make an update worth running
    ///
    /// `open` is mutable but only rides along with one of these.
    pub const UPDATE_TRIGGERS: [Self; 5] = [
        Self::IssueTitle,
        Self::IssueText,
        Self::CreatedBy,
        Self::AssignedTo,
        Self::StatusText,
    ];

    /// Parse a caller-supplied field name
    ///
    /// Fails with [`QueryError::InvalidFieldName`] when the name contains anything
    /// but ASCII letters and underscores, and with [`QueryError::UnknownField`]
    /// when it is well formed but not a column.
    pub fn parse(name: &str) -> Result<Self, QueryError> {
        if !is_valid_field_name(name) {
            return Err(QueryError::InvalidFieldName {
                field: name.to_string(),
            });
        }

        Self::ALL
            .into_iter()
            .find(|field| field.column() == name)
            .ok_or_else(|| QueryError::UnknownField {
                field: name.to_string(),
            })
    }

    /// Column name as written in SQL
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "_id",
            Self::Project => "project",
            Self::IssueTitle => "issue_title",
            Self::IssueText => "issue_text",
            Self::CreatedBy => "created_by",
            Self::AssignedTo => "assigned_to",
            Self::StatusText => "status_text",
            Self::CreatedOn => "created_on",
            Self::UpdatedOn => "updated_on",
            Self::Open => "open",
        }
    }

    /// Whether an update may set this column
    #[must_use]
    pub fn is_mutable(self) -> bool {
        Self::MUTABLE.contains(&self)
    }

    /// Whether updates skip this column silently instead of rejecting it
    #[must_use]
    pub const fn is_update_managed(self) -> bool {
        matches!(self, Self::Id | Self::CreatedOn | Self::UpdatedOn)
    }
}

impl fmt::Display for IssueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Check a field name against `[A-Za-z_]+`
#[must_use]
pub fn is_valid_field_name(name: &str) -> bool {
    FIELD_NAME.is_match(name)
}
