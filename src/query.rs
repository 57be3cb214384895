//! Query building utilities
//!
//! Produces parameterized statements for the `issues` table. Identifiers come
//! only from [`IssueField::column`]; every value is a `$n` placeholder with the
//! matching entry in [`Statement::params`].

use crate::field::IssueField;
use crate::request::{Filter, IssueId, IssueUpdate, NewIssue};
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use tokio_postgres::types::ToSql;

/// Table holding issues
pub const ISSUES_TABLE: &str = "issues";

/// Columns returned by every read, in table order
pub const ISSUE_COLUMNS: &str = "_id, project, issue_title, issue_text, created_by, assigned_to, status_text, created_on, updated_on, open";

/// A SQL string together with its positional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<FieldValue>,
}

impl Statement {
    /// The SQL text
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameters in placeholder order
    #[must_use]
    pub fn params(&self) -> &[FieldValue] {
        &self.params
    }

    /// Parameters as driver bind references
    #[must_use]
    pub fn bind_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param as &(dyn ToSql + Sync))
            .collect()
    }
}

/// Query builder for constructing parameterized statements
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    sql: String,
    params: Vec<FieldValue>,
    has_where: bool,
}

impl QueryBuilder {
    /// Create a new query builder starting from a fixed SQL prefix
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            sql: prefix.to_string(),
            params: Vec::new(),
            has_where: false,
        }
    }

    /// Bind a value and return its placeholder number
    fn bind(&mut self, value: FieldValue) -> usize {
        self.params.push(value);
        self.params.len()
    }

    fn push_condition_keyword(&mut self) {
        let keyword = if self.has_where { " AND " } else { " WHERE " };
        if self.sql.is_empty() {
            self.sql.push_str(keyword.trim_start());
        } else {
            self.sql.push_str(keyword);
        }
        self.has_where = true;
    }

    /// Add `<column> = $n`
    #[must_use]
    pub fn where_eq(mut self, field: IssueField, value: FieldValue) -> Self {
        self.push_condition_keyword();
        let placeholder = self.bind(value);
        let _ = write!(self.sql, "{} = ${placeholder}", field.column());
        self
    }

    /// Add `<column> IS NULL`
    #[must_use]
    pub fn where_null(mut self, field: IssueField) -> Self {
        self.push_condition_keyword();
        let _ = write!(self.sql, "{} IS NULL", field.column());
        self
    }

    /// Append `ORDER BY <column> DESC`
    #[must_use]
    pub fn order_by_desc(mut self, field: IssueField) -> Self {
        let _ = write!(self.sql, " ORDER BY {} DESC", field.column());
        self
    }

    /// Append `LIMIT <n>`
    #[must_use]
    pub fn limit(mut self, rows: u32) -> Self {
        let _ = write!(self.sql, " LIMIT {rows}");
        self
    }

    /// Build the final statement
    #[must_use]
    pub fn build(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }

    /// Build `WHERE project = $1 [AND <field> = $k]...`
    ///
    /// The project is always the first parameter, filters follow in the order
    /// given.
    #[must_use]
    pub fn filter_clause(project: &str, filters: &[Filter]) -> Statement {
        Self::scoped(Self::new(""), project, filters).build()
    }

    /// Build the read for a project with optional filters
    #[must_use]
    pub fn select_issues(project: &str, filters: &[Filter]) -> Statement {
        let clause = Self::filter_clause(project, filters);
        Statement {
            sql: format!("SELECT {ISSUE_COLUMNS} FROM {ISSUES_TABLE} {}", clause.sql),
            params: clause.params,
        }
    }

    /// Build the read that finds a just-inserted issue again
    ///
    /// Matches on every supplied field; optional fields that were not supplied
    /// must be NULL. Newest row first.
    #[must_use]
    pub fn select_created(project: &str, issue: &NewIssue) -> Statement {
        let filters = [
            (
                IssueField::IssueTitle,
                FieldValue::Text(issue.issue_title.clone()),
            ),
            (
                IssueField::IssueText,
                FieldValue::Text(issue.issue_text.clone()),
            ),
            (
                IssueField::CreatedBy,
                FieldValue::Text(issue.created_by.clone()),
            ),
        ];

        let mut builder = Self::scoped(Self::select_prefix(), project, &filters);
        for (field, value) in [
            (IssueField::AssignedTo, &issue.assigned_to),
            (IssueField::StatusText, &issue.status_text),
        ] {
            builder = match value {
                Some(text) => builder.where_eq(field, FieldValue::Text(text.clone())),
                None => builder.where_null(field),
            };
        }

        builder.order_by_desc(IssueField::CreatedOn).limit(1).build()
    }

    /// Build the six-value insert
    #[must_use]
    pub fn insert_issue(project: &str, issue: &NewIssue) -> Statement {
        Statement {
            sql: format!(
                "INSERT INTO {ISSUES_TABLE}(project, issue_title, issue_text, created_by, assigned_to, status_text) VALUES($1, $2, $3, $4, $5, $6)"
            ),
            params: vec![
                FieldValue::Text(project.to_string()),
                FieldValue::Text(issue.issue_title.clone()),
                FieldValue::Text(issue.issue_text.clone()),
                FieldValue::Text(issue.created_by.clone()),
                FieldValue::text_or_null(issue.assigned_to.as_deref()),
                FieldValue::text_or_null(issue.status_text.as_deref()),
            ],
        }
    }

    /// Build `UPDATE issues SET f1 = $1[, ...], updated_on = $k WHERE _id = $(k+1)`
    #[must_use]
    pub fn update_issue(update: &IssueUpdate, now: DateTime<Utc>) -> Statement {
        let mut builder = Self::new(&format!("UPDATE {ISSUES_TABLE} SET "));

        let assignments = update
            .changes
            .iter()
            .map(|(field, value)| (*field, value.clone()))
            .chain(std::iter::once((
                IssueField::UpdatedOn,
                FieldValue::timestamp(now),
            )));
        for (index, (field, value)) in assignments.enumerate() {
            if index > 0 {
                builder.sql.push_str(", ");
            }
            let placeholder = builder.bind(value);
            let _ = write!(builder.sql, "{} = ${placeholder}", field.column());
        }

        builder
            .where_eq(IssueField::Id, FieldValue::Text(update.id.as_str().to_string()))
            .build()
    }

    /// Build `DELETE FROM issues WHERE _id = $1`
    #[must_use]
    pub fn delete_issue(id: &IssueId) -> Statement {
        Self::new(&format!("DELETE FROM {ISSUES_TABLE}"))
            .where_eq(IssueField::Id, FieldValue::Text(id.as_str().to_string()))
            .build()
    }

    fn select_prefix() -> Self {
        Self::new(&format!("SELECT {ISSUE_COLUMNS} FROM {ISSUES_TABLE}"))
    }

    fn scoped(builder: Self, project: &str, filters: &[Filter]) -> Self {
        filters.iter().fold(
            builder.where_eq(IssueField::Project, FieldValue::Text(project.to_string())),
            |builder, (field, value)| builder.where_eq(*field, value.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{parse_filters, RequestFields};
    use chrono::TimeZone;

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    fn new_issue(assigned_to: Option<&str>, status_text: Option<&str>) -> NewIssue {
        NewIssue {
            issue_title: "Title".to_string(),
            issue_text: "Text".to_string(),
            created_by: "Created".to_string(),
            assigned_to: assigned_to.map(str::to_string),
            status_text: status_text.map(str::to_string),
        }
    }

    #[test]
    fn test_filter_clause_project_only() {
        let statement = QueryBuilder::filter_clause("apitest", &[]);
        assert_eq!(statement.sql(), "WHERE project = $1");
        assert_eq!(statement.params(), &[text("apitest")]);
    }

    #[test]
    fn test_filter_clause_follows_filter_order() {
        let filters = parse_filters(&RequestFields::new(vec![
            ("open".to_string(), "false".to_string()),
            ("issue_title".to_string(), "Title".to_string()),
        ]))
        .unwrap();

        let statement = QueryBuilder::filter_clause("apitest", &filters);
        assert_eq!(
            statement.sql(),
            "WHERE project = $1 AND open = $2 AND issue_title = $3"
        );
        assert_eq!(
            statement.params(),
            &[text("apitest"), FieldValue::Bool(false), text("Title")]
        );
    }

    #[test]
    fn test_select_issues_values_never_inlined() {
        let hostile = "x' OR '1'='1";
        let statement =
            QueryBuilder::select_issues("apitest", &[(IssueField::IssueText, text(hostile))]);
        assert!(statement
            .sql()
            .starts_with("SELECT _id, project, issue_title"));
        assert!(statement
            .sql()
            .ends_with("FROM issues WHERE project = $1 AND issue_text = $2"));
        assert!(!statement.sql().contains(hostile));
        assert_eq!(statement.bind_params().len(), 2);
    }

    #[test]
    fn test_insert_binds_null_for_missing_optionals() {
        let statement = QueryBuilder::insert_issue("apitest", &new_issue(None, Some("Open")));
        assert_eq!(
            statement.sql(),
            "INSERT INTO issues(project, issue_title, issue_text, created_by, assigned_to, status_text) VALUES($1, $2, $3, $4, $5, $6)"
        );
        assert_eq!(
            statement.params(),
            &[
                text("apitest"),
                text("Title"),
                text("Text"),
                text("Created"),
                FieldValue::Null,
                text("Open"),
            ]
        );
    }

    #[test]
    fn test_select_created_uses_is_null_for_missing_optionals() {
        let statement = QueryBuilder::select_created("apitest", &new_issue(Some("Joe"), None));
        assert!(statement.sql().ends_with(
            "WHERE project = $1 AND issue_title = $2 AND issue_text = $3 AND created_by = $4 AND assigned_to = $5 AND status_text IS NULL ORDER BY created_on DESC LIMIT 1"
        ));
        assert_eq!(statement.params().len(), 5);
        assert_eq!(statement.params()[4], text("Joe"));
    }

    #[test]
    fn test_update_statement_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let update = IssueUpdate::from_fields(&RequestFields::new(vec![
            ("_id".to_string(), "5b0c7f4e-1f7a-4a53-9c63-1f0f3d7a9b10".to_string()),
            ("issue_title".to_string(), "New".to_string()),
            ("open".to_string(), "false".to_string()),
        ]))
        .unwrap();

        let statement = QueryBuilder::update_issue(&update, now);
        assert_eq!(
            statement.sql(),
            "UPDATE issues SET issue_title = $1, open = $2, updated_on = $3 WHERE _id = $4"
        );
        assert_eq!(
            statement.params(),
            &[
                text("New"),
                FieldValue::Bool(false),
                FieldValue::timestamp(now),
                text("5b0c7f4e-1f7a-4a53-9c63-1f0f3d7a9b10"),
            ]
        );
    }

    #[test]
    fn test_delete_statement_shape() {
        let id = IssueId::from_fields(&RequestFields::new(vec![(
            "_id".to_string(),
            "invalidId".to_string(),
        )]))
        .unwrap();
        let statement = QueryBuilder::delete_issue(&id);
        assert_eq!(statement.sql(), "DELETE FROM issues WHERE _id = $1");
        assert_eq!(statement.params(), &[text("invalidId")]);
    }
}
