//! HTTP surface
//!
//! `GET|POST|PUT|DELETE /api/issues/{project}` plus a plain-text 404 for
//! everything else. Write verbs always answer 200 with a JSON body; only reads
//! use HTTP error statuses.

use crate::database::DatabasePool;
use crate::error::{IssueError, QueryError};
use crate::field::IssueField;
use crate::repository::IssueRepository;
use crate::request::{parse_filters, IssueId, IssueUpdate, NewIssue, RequestFields};
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::json;
use tracing::{error, warn};

/// Plain-text body for a rejected filter key
pub const NOT_A_VALID_KEY: &str = "Not a valid Key";

/// Plain-text body for unmatched routes
pub const NOT_FOUND: &str = "Not Found";

const REQUIRED_FIELDS_MISSING: &str = "required field(s) missing";
const COULD_NOT_CREATE: &str = "could not create";
const MISSING_ID: &str = "missing _id";
const NO_UPDATE_FIELDS: &str = "no update field(s) sent";
const COULD_NOT_UPDATE: &str = "could not update";
const SUCCESSFULLY_UPDATED: &str = "successfully updated";
const COULD_NOT_DELETE: &str = "could not delete";
const SUCCESSFULLY_DELETED: &str = "successfully deleted";

/// Shared handler dependencies
#[derive(Clone)]
pub struct AppState {
    issues: IssueRepository,
}

impl AppState {
    /// Build the state around a connection pool
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            issues: IssueRepository::new(pool),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/issues/{project}",
            get(list_issues)
                .post(create_issue)
                .put(update_issue)
                .delete(delete_issue)
                .fallback(not_found),
        )
        .fallback(not_found)
        .with_state(state)
}

/// Request body decoded from JSON or an urlencoded form
///
/// Any other content type, or none, is treated as an empty body.
#[derive(Debug, Clone, Default)]
pub struct RequestBody(pub RequestFields);

impl<S> FromRequest<S> for RequestBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<serde_json::Value>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self(RequestFields::from_json(value)));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self(RequestFields::new(pairs)));
        }

        Ok(Self::default())
    }
}

async fn list_issues(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    let filters = match parse_filters(&RequestFields::new(query)) {
        Ok(filters) => filters,
        Err(e) => {
            warn!("Rejected filter for project {}: {}", project, e);
            return (StatusCode::BAD_REQUEST, NOT_A_VALID_KEY).into_response();
        }
    };

    match state.issues.list(&project, &filters).await {
        Ok(issues) => Json(issues).into_response(),
        Err(e) => {
            error!("Failed to list issues for project {}: {}", project, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn create_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    RequestBody(fields): RequestBody,
) -> Response {
    let issue = match NewIssue::from_fields(&fields) {
        Ok(issue) => issue,
        Err(QueryError::MissingRequiredField) => return error_json(REQUIRED_FIELDS_MISSING),
        Err(e) => {
            warn!("Rejected new issue for project {}: {}", project, e);
            return error_json(COULD_NOT_CREATE);
        }
    };

    match state.issues.create(&project, &issue).await {
        Ok(created) => Json(created).into_response(),
        Err(e) => {
            error!("Failed to create issue in project {}: {}", project, e);
            error_json(COULD_NOT_CREATE)
        }
    }
}

async fn update_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    RequestBody(fields): RequestBody,
) -> Response {
    let update = match IssueUpdate::from_fields(&fields) {
        Ok(update) => update,
        Err(QueryError::MissingId) => return error_json(MISSING_ID),
        Err(e) => {
            let id = sent_id(&fields);
            if e == QueryError::NoUpdateFields {
                return error_json_with_id(NO_UPDATE_FIELDS, id);
            }
            warn!("Rejected update of {} in project {}: {}", id, project, e);
            return error_json_with_id(COULD_NOT_UPDATE, id);
        }
    };

    let id = update.id.as_str();
    match state.issues.update(&update).await {
        Ok(()) => result_json(SUCCESSFULLY_UPDATED, id),
        Err(e) => {
            log_write_failure("update", id, &e);
            error_json_with_id(COULD_NOT_UPDATE, id)
        }
    }
}

async fn delete_issue(State(state): State<AppState>, RequestBody(fields): RequestBody) -> Response {
    let id = match IssueId::from_fields(&fields) {
        Ok(id) => id,
        Err(_) => return error_json(MISSING_ID),
    };

    match state.issues.delete(&id).await {
        Ok(()) => result_json(SUCCESSFULLY_DELETED, id.as_str()),
        Err(e) => {
            log_write_failure("delete", id.as_str(), &e);
            error_json_with_id(COULD_NOT_DELETE, id.as_str())
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND).into_response()
}

fn sent_id(fields: &RequestFields) -> &str {
    fields.get(IssueField::Id.column()).unwrap_or_default()
}

fn log_write_failure(operation: &str, id: &str, e: &IssueError) {
    match e {
        IssueError::UpdateFailed { .. } | IssueError::DeleteFailed { .. } => {
            warn!("Could not {} issue {}: {}", operation, id, e);
        }
        _ => error!("Failed to {} issue {}: {}", operation, id, e),
    }
}

fn error_json(message: &str) -> Response {
    Json(json!({ "error": message })).into_response()
}

fn error_json_with_id(message: &str, id: &str) -> Response {
    Json(json!({ "error": message, "_id": id })).into_response()
}

fn result_json(message: &str, id: &str) -> Response {
    Json(json!({ "result": message, "_id": id })).into_response()
}
