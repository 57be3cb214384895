use crate::database::DatabaseError;
use thiserror::Error;

/// Client input errors raised while turning a request into a statement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Field name contains characters outside `[A-Za-z_]`
    #[error("Not a valid Key: {field}")]
    InvalidFieldName {
        /// The rejected field name
        field: String,
    },

    /// Field name is well formed but does not name an issue column
    #[error("Unknown issue field: {field}")]
    UnknownField {
        /// The rejected field name
        field: String,
    },

    /// Field exists but may not be written through an update
    #[error("Field cannot be updated: {field}")]
    ImmutableField {
        /// The rejected field name
        field: String,
    },

    /// One of `issue_title`, `issue_text`, `created_by` is absent or empty
    #[error("required field(s) missing")]
    MissingRequiredField,

    /// Update or delete without an `_id`
    #[error("missing _id")]
    MissingId,

    /// Update carries no non-empty mutable field
    #[error("no update field(s) sent")]
    NoUpdateFields,
}

impl QueryError {
    /// Whether this error comes from field-name validation or the column allowlist
    #[must_use]
    pub const fn is_field_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidFieldName { .. } | Self::UnknownField { .. } | Self::ImmutableField { .. }
        )
    }
}

/// Outcome errors of an issue operation against storage
#[derive(Error, Debug)]
pub enum IssueError {
    /// The request could not be turned into a statement
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The pool or the driver failed
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Row could not be decoded into an issue
    #[error("Failed to decode issue row: {0}")]
    Decode(#[source] tokio_postgres::Error),

    /// Insert succeeded but the row could not be read back
    #[error("Created issue could not be read back")]
    NotCreated,

    /// Update affected no row
    #[error("Update affected {rows} rows for _id {id}")]
    UpdateFailed {
        /// Identifier sent by the client
        id: String,
        /// Rows reported by the driver
        rows: u64,
    },

    /// Delete affected no row
    #[error("Delete affected {rows} rows for _id {id}")]
    DeleteFailed {
        /// Identifier sent by the client
        id: String,
        /// Rows reported by the driver
        rows: u64,
    },
}

/// Result type alias for issue operations
pub type Result<T> = std::result::Result<T, IssueError>;
