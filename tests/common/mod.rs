//! Shared test utilities for issue-tracker integration tests
#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use issue_tracker::database::DatabasePool;
use issue_tracker::{router, AppState};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

/// Admin connection URL for database-backed tests; those tests skip when unset
pub const TEST_DATABASE_URL_ENV: &str = "ISSUE_TRACKER_TEST_DATABASE_URL";

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Test database manager that ensures unique database names
pub struct TestDatabase {
    pub name: String,
    pub pool: DatabasePool,
    pub admin_pool: DatabasePool,
}

impl TestDatabase {
    /// Create a unique test database with the issues schema applied
    ///
    /// Returns `None` when no admin URL is configured.
    pub async fn create_unique(base_name: &str) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        let Ok(admin_url) = std::env::var(TEST_DATABASE_URL_ENV) else {
            eprintln!("Skipping: {TEST_DATABASE_URL_ENV} is not set");
            return Ok(None);
        };

        // Generate unique database name using UUID
        let unique_id = Uuid::new_v4().simple().to_string();
        let unique_name = format!("test_{base_name}_{unique_id}");

        let admin_pool = DatabasePool::new(&admin_url).await?;
        admin_pool.create_database(&unique_name).await?;

        let mut test_url = Url::parse(&admin_url)?;
        test_url.set_path(&format!("/{unique_name}"));
        let pool = DatabasePool::new(test_url.as_str()).await?;
        pool.execute_sql_content(SCHEMA).await?;

        Ok(Some(Self {
            name: unique_name,
            pool,
            admin_pool,
        }))
    }

    /// Router over this database
    pub fn router(&self) -> Router {
        router(AppState::new(self.pool.clone()))
    }

    /// Drop the database, closing any connection still open on it
    pub async fn cleanup(self) {
        let Self {
            name,
            pool,
            admin_pool,
        } = self;
        drop(pool);

        let sql = format!("DROP DATABASE IF EXISTS {name} WITH (FORCE)");
        if let Err(e) = admin_pool.execute(&sql, &[]).await {
            eprintln!("Warning: Failed to cleanup test database '{name}': {e}");
        }
    }
}

/// Router whose pool points at a closed port, so every statement fails fast
pub async fn unreachable_router() -> Router {
    let pool = DatabasePool::with_limits(
        "postgresql://postgres@127.0.0.1:1/issues",
        1,
        Duration::from_millis(200),
    )
    .await
    .expect("pool creation does not connect");
    router(AppState::new(pool))
}

/// Send a request with an optional JSON body
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    send_request(app, request).await
}

/// Send an already built request
pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("readable body");
    (status, String::from_utf8(bytes.to_vec()).expect("UTF-8 body"))
}

/// Send a request and decode the JSON answer
pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, text) = send(app, method, uri, body).await;
    let value = serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("response body is not JSON: {e}; body={text}"));
    (status, value)
}
