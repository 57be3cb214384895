//! Issue persistence
//!
//! Runs the statements built by [`QueryBuilder`] on the injected pool and applies
//! the success criteria of each operation.

use crate::database::DatabasePool;
use crate::error::{IssueError, Result};
use crate::issue::Issue;
use crate::query::QueryBuilder;
use crate::request::{Filter, IssueId, IssueUpdate, NewIssue};
use chrono::Utc;
use tracing::{debug, info};

/// Issue operations against the `issues` table
#[derive(Clone)]
pub struct IssueRepository {
    pool: DatabasePool,
}

impl IssueRepository {
    /// Wrap a connection pool
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Issues of `project` matching every filter
    pub async fn list(&self, project: &str, filters: &[Filter]) -> Result<Vec<Issue>> {
        let statement = QueryBuilder::select_issues(project, filters);
        let rows = self.pool.fetch(&statement).await?;
        debug!("Project {} matched {} issue(s)", project, rows.len());

        rows.iter()
            .map(|row| Issue::from_row(row).map_err(IssueError::Decode))
            .collect()
    }

    /// Insert an issue and read it back
    pub async fn create(&self, project: &str, issue: &NewIssue) -> Result<Issue> {
        self.pool
            .run(&QueryBuilder::insert_issue(project, issue))
            .await?;

        let rows = self
            .pool
            .fetch(&QueryBuilder::select_created(project, issue))
            .await?;
        let created = rows
            .first()
            .ok_or(IssueError::NotCreated)
            .and_then(|row| Issue::from_row(row).map_err(IssueError::Decode))?;

        info!("Created issue {} in project {}", created.id, project);
        Ok(created)
    }

    /// Apply an update; exactly one row must change
    pub async fn update(&self, update: &IssueUpdate) -> Result<()> {
        let rows = self
            .pool
            .run(&QueryBuilder::update_issue(update, Utc::now()))
            .await?;

        if rows != 1 {
            return Err(IssueError::UpdateFailed {
                id: update.id.as_str().to_string(),
                rows,
            });
        }

        info!("Updated issue {}", update.id.as_str());
        Ok(())
    }

    /// Delete an issue; exactly one row must go
    pub async fn delete(&self, id: &IssueId) -> Result<()> {
        let rows = self.pool.run(&QueryBuilder::delete_issue(id)).await?;

        if rows != 1 {
            return Err(IssueError::DeleteFailed {
                id: id.as_str().to_string(),
                rows,
            });
        }

        info!("Deleted issue {}", id.as_str());
        Ok(())
    }
}
