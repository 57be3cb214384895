//! Request parsing boundary
//!
//! Turns untyped key/value pairs from a query string or request body into the
//! typed inputs the query builder consumes. Field names are validated and values
//! coerced here, and nowhere else.

use crate::error::QueryError;
use crate::field::IssueField;
use crate::value::FieldValue;
use serde_json::Value;
use tracing::debug;

/// Raw key/value pairs from a query string, form or JSON body
///
/// Query strings and forms keep their wire order. JSON object keys come out
/// sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    entries: Vec<(String, String)>,
}

impl RequestFields {
    /// Wrap already decoded pairs, keeping their order
    #[must_use]
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Flatten a JSON object into string pairs, ordered by key
    ///
    /// Strings are taken as is, other scalars by their JSON text, `null` as the
    /// empty string. Anything that is not an object yields no fields.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let raw = match value {
                    Value::String(text) => text,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, raw)
            })
            .collect();

        Self { entries }
    }

    /// Last value sent for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Value sent for `key` if present and non-empty
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// Iterate over the pairs in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Whether no pair was sent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A validated filter condition
pub type Filter = (IssueField, FieldValue);

/// Parse query-string filters for a read
///
/// The first bad field name aborts the whole parse.
pub fn parse_filters(fields: &RequestFields) -> Result<Vec<Filter>, QueryError> {
    fields
        .iter()
        .map(|(name, raw)| {
            let field = IssueField::parse(name)?;
            Ok::<_, QueryError>((field, FieldValue::coerce_filter(raw)))
        })
        .collect()
}

/// Identifier of an existing issue, exactly as the client sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueId(String);

impl IssueId {
    /// Extract `_id` from a request body
    pub fn from_fields(fields: &RequestFields) -> Result<Self, QueryError> {
        fields
            .non_empty(IssueField::Id.column())
            .map(|id| Self(id.to_string()))
            .ok_or(QueryError::MissingId)
    }

    /// The raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated input for creating an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    /// Title, non-empty
    pub issue_title: String,
    /// Text, non-empty
    pub issue_text: String,
    /// Author, non-empty
    pub created_by: String,
    /// Assignee when one was sent
    pub assigned_to: Option<String>,
    /// Status text when one was sent
    pub status_text: Option<String>,
}

impl NewIssue {
    /// Validate a creation body
    ///
    /// Required fields are checked before any field name, so an empty body always
    /// reports [`QueryError::MissingRequiredField`].
    pub fn from_fields(fields: &RequestFields) -> Result<Self, QueryError> {
        let required = |field: IssueField| {
            fields
                .non_empty(field.column())
                .map(str::to_string)
                .ok_or(QueryError::MissingRequiredField)
        };

        let issue_title = required(IssueField::IssueTitle)?;
        let issue_text = required(IssueField::IssueText)?;
        let created_by = required(IssueField::CreatedBy)?;

        for (name, _) in fields.iter() {
            IssueField::parse(name)?;
        }

        Ok(Self {
            issue_title,
            issue_text,
            created_by,
            assigned_to: fields
                .non_empty(IssueField::AssignedTo.column())
                .map(str::to_string),
            status_text: fields
                .non_empty(IssueField::StatusText.column())
                .map(str::to_string),
        })
    }
}

/// Validated input for updating an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueUpdate {
    /// Target issue
    pub id: IssueId,
    /// Columns to set, in the order they were sent
    pub changes: Vec<Filter>,
}

impl IssueUpdate {
    /// Validate an update body
    ///
    /// Order of checks: `_id` present, then at least one non-empty field of
    /// [`IssueField::UPDATE_TRIGGERS`], then every remaining field name. `_id`,
    /// `created_on` and `updated_on` are dropped from the change set without
    /// complaint, as are empty values.
    pub fn from_fields(fields: &RequestFields) -> Result<Self, QueryError> {
        let id = IssueId::from_fields(fields)?;

        let has_change = IssueField::UPDATE_TRIGGERS
            .iter()
            .any(|field| fields.non_empty(field.column()).is_some());
        if !has_change {
            return Err(QueryError::NoUpdateFields);
        }

        let mut changes: Vec<Filter> = Vec::new();
        for (name, raw) in fields.iter() {
            if raw.is_empty() {
                continue;
            }

            let field = IssueField::parse(name)?;
            if field.is_update_managed() {
                continue;
            }
            if !field.is_mutable() {
                return Err(QueryError::ImmutableField {
                    field: name.to_string(),
                });
            }

            let value = FieldValue::coerce_update(raw);
            match changes.iter_mut().find(|(existing, _)| *existing == field) {
                Some(slot) => slot.1 = value,
                None => changes.push((field, value)),
            }
        }

        debug!(
            "Parsed update for _id {} with {} change(s)",
            id.as_str(),
            changes.len()
        );
        Ok(Self { id, changes })
    }
}
