//! HTTP surface of the memo server.
//!
//! The router mirrors the Memos v1 REST layout:
//!
//! - `GET /docs`: Route catalog; doubles as the client's health probe.
//! - `/api/v1/memos`: Memo CRUD with a case-insensitive `filter` on content.
//! - `/api/v1/users`: User CRUD, `users:search`, `users:stats` and per-user access tokens.
//! - `/api/v1/attachments`: Attachment metadata, multipart upload and deletion.
//! - `/api/v1/activities`: Read-only activity feed.
//! - `/api/v1/auth`: Sign in with the development credentials, session status, sign out.
//!
//! All state lives in one [`AppStorage`] behind a `tokio` read/write lock. Failures are
//! reported as `{"detail": "..."}` bodies.

mod activities;
mod attachments;
mod auth;
mod memos;
mod users;

use crate::storage::AppStorage;
use axum::{
    Json, Router,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};

/// Storage shared by every handler.
pub type SharedStorage = Arc<RwLock<AppStorage>>;

/// Path prefix of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// Largest `page_size` accepted by list endpoints.
const MAX_PAGE_SIZE: u32 = 1000;

/// Fresh storage with the seeded admin user, ready to hand to [`create_router`].
pub fn new_storage() -> SharedStorage {
    Arc::new(RwLock::new(AppStorage::new()))
}

/// Build the HTTP router over `storage`.
pub fn create_router(storage: SharedStorage) -> Router {
    let v1 = Router::new()
        .merge(memos::routes())
        .merge(users::routes())
        .merge(attachments::routes())
        .merge(activities::routes())
        .merge(auth::routes());

    Router::new()
        .route("/docs", get(get_docs))
        .nest(API_PREFIX, v1)
        .with_state(storage)
}

/// Serve the router on `listener` until the process stops.
pub async fn serve(listener: TcpListener, storage: SharedStorage) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Memo server listening");
    }
    axum::serve(listener, create_router(storage)).await
}

/// Handler failures, rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    /// The addressed resource does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The request was understood but carries no usable input.
    #[error("{0}")]
    BadRequest(String),
    /// Credentials were rejected or no session is open.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// The body or query failed to parse or validate.
    #[error("{0}")]
    Unprocessable(String),
    /// The feature is recognised but not available.
    #[error("{0}")]
    NotImplemented(&'static str),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "Request failed");
        } else {
            tracing::debug!(%status, error = %self, "Request rejected");
        }
        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Unprocessable(rejection.body_text())
    }
}

/// Confirmation body returned by delete and sign-out endpoints.
#[derive(Serialize)]
pub(crate) struct MessageResponse {
    message: &'static str,
}

impl MessageResponse {
    pub(crate) fn new(message: &'static str) -> Json<Self> {
        Json(Self { message })
    }
}

/// Reject `page_size` values outside `1..=1000`. Paging itself is not implemented.
pub(crate) fn check_page_size(page_size: Option<u32>) -> Result<(), AppError> {
    match page_size {
        Some(size) if size == 0 || size > MAX_PAGE_SIZE => Err(AppError::Unprocessable(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        ))),
        _ => Ok(()),
    }
}

/// Descriptor for a single route in the catalog.
#[derive(Serialize)]
struct RouteDescriptor {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

/// Response body for `GET /docs`.
#[derive(Serialize)]
struct DocsResponse {
    title: &'static str,
    version: &'static str,
    routes: Vec<RouteDescriptor>,
}

const ROUTES: &[(&str, &str, &str)] = &[
    ("GET", "/api/v1/memos", "List memos; `filter` matches content case-insensitively."),
    ("POST", "/api/v1/memos", "Create a memo from `{ \"memo\": {...} }`."),
    ("GET", "/api/v1/memos/{id}", "Fetch one memo."),
    ("PATCH", "/api/v1/memos/{id}", "Replace a memo from `{ \"memo\": {...} }`."),
    ("DELETE", "/api/v1/memos/{id}", "Delete a memo."),
    ("GET", "/api/v1/users", "List users."),
    ("POST", "/api/v1/users", "Create a user from `{ \"user\": {...} }`."),
    ("GET", "/api/v1/users/{id}", "Fetch one user."),
    ("PATCH", "/api/v1/users/{id}", "Replace a user from `{ \"user\": {...} }`."),
    ("DELETE", "/api/v1/users/{id}", "Delete a user."),
    ("GET", "/api/v1/users:search", "Search users by username, display name or email."),
    ("GET", "/api/v1/users:stats", "Per-user memo counters."),
    ("GET", "/api/v1/users/{id}/accessTokens", "List a user's access tokens."),
    ("POST", "/api/v1/users/{id}/accessTokens", "Issue an access token."),
    ("DELETE", "/api/v1/users/{id}/accessTokens/{token_id}", "Revoke an access token."),
    ("GET", "/api/v1/attachments", "List attachments; `filter` matches the filename."),
    ("POST", "/api/v1/attachments", "Create attachment metadata."),
    ("POST", "/api/v1/attachments/upload", "Upload a file as multipart field `file`."),
    ("GET", "/api/v1/attachments/{id}", "Fetch one attachment."),
    ("DELETE", "/api/v1/attachments/{id}", "Delete an attachment."),
    ("GET", "/api/v1/activities", "List the activity feed."),
    ("POST", "/api/v1/auth/signin", "Open a session with password credentials."),
    ("GET", "/api/v1/auth/status", "Return the open session."),
    ("POST", "/api/v1/auth/signout", "Close every session."),
];

async fn get_docs() -> Json<DocsResponse> {
    Json(DocsResponse {
        title: "Memotic API",
        version: env!("CARGO_PKG_VERSION"),
        routes: ROUTES
            .iter()
            .map(|&(method, path, description)| RouteDescriptor {
                method,
                path,
                description,
            })
            .collect(),
    })
}
