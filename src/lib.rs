//! `issue-tracker` - a project-scoped issue tracking REST API
//!
//! Requests are parsed into typed filters and changes, turned into
//! parameterized statements by [`QueryBuilder`], and run on a pooled
//! `PostgreSQL` connection.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/// HTTP routes and handlers
pub mod api;
pub mod cli;
/// Command handlers for the CLI
pub mod commands;
/// Configuration management
pub mod config;
/// Database connection and pooling
pub mod database;
/// Error types
pub mod error;
pub mod field;
pub mod issue;
pub mod query;
pub mod repository;
pub mod request;
pub mod value;

pub use api::{router, AppState};
pub use config::Config;
pub use database::DatabasePool;
pub use error::{IssueError, QueryError};
pub use field::IssueField;
pub use issue::Issue;
pub use query::{QueryBuilder, Statement};
pub use repository::IssueRepository;
pub use request::{IssueId, IssueUpdate, NewIssue, RequestFields};
pub use value::FieldValue;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
