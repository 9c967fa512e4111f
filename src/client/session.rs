//! Async client session for the memo server.

use super::error::{MemosError, Result};
use super::request::{ApiRequest, ApiResponse, classify_status};
use super::retry::{Sleeper, TokioSleeper, run_with_retry};
use crate::config::ClientConfig;
use crate::models::{
    Activity, Attachment, CreateMemoRequest, CreateSessionRequest, CreateUserRequest,
    ListActivitiesResponse, ListAttachmentsResponse, ListMemosResponse, ListUsersResponse, Memo,
    PasswordCredentials, SessionResponse, UpdateMemoRequest, UpdateUserRequest, User,
};
use futures_util::future::BoxFuture;
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const USER_AGENT: &str = concat!("memotic/", env!("CARGO_PKG_VERSION"));
/// Path probed by [`MemosClient::connect`] and [`MemosClient::health_check`].
pub const HEALTH_PATH: &str = "/docs";
const MEMOS_PATH: &str = "/api/v1/memos";
const USERS_PATH: &str = "/api/v1/users";

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No transport is held.
    #[default]
    Disconnected,
    /// `connect` is building the transport and probing the server.
    Connecting,
    /// The probe succeeded; requests may be executed.
    Connected,
}

/// Snapshot of the session's connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Server root the session talks to.
    pub base_url: String,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Version reported by the health probe, when the server advertises one.
    pub server_version: Option<String>,
    /// Message of the last failed `connect`.
    pub last_error: Option<String>,
}

impl ConnectionInfo {
    /// Whether requests may be executed.
    pub fn connected(&self) -> bool {
        self.state == SessionState::Connected
    }
}

/// Async client holding at most one open HTTP transport.
///
/// Every request goes through [`MemosClient::execute`], which retries transient failures with
/// capped exponential backoff. The configuration is fixed for the lifetime of the client.
pub struct MemosClient {
    config: ClientConfig,
    base_url: String,
    http: Option<Client>,
    info: ConnectionInfo,
    sleeper: Arc<dyn Sleeper>,
}

impl MemosClient {
    /// Disconnected client for `config`.
    pub fn new(config: ClientConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            info: ConnectionInfo {
                base_url: base_url.clone(),
                ..ConnectionInfo::default()
            },
            base_url,
            config,
            http: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the backoff sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current connection snapshot.
    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// Whether requests may be executed.
    pub fn is_connected(&self) -> bool {
        self.info.connected()
    }

    /// Build the transport and probe `GET /docs`; a no-op when already connected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.info.state = SessionState::Connecting;
        match self.open().await {
            Ok((http, server_version)) => {
                self.http = Some(http);
                self.info.state = SessionState::Connected;
                self.info.server_version = server_version;
                self.info.last_error = None;
                tracing::info!(
                    url = %self.base_url,
                    server_version = ?self.info.server_version,
                    "Connected to memo server"
                );
                Ok(())
            }
            Err(err) => {
                self.http = None;
                self.info.state = SessionState::Disconnected;
                self.info.last_error = Some(err.to_string());
                tracing::warn!(url = %self.base_url, error = %err, "Failed to connect");
                Err(err)
            }
        }
    }

    async fn open(&self) -> Result<(Client, Option<String>)> {
        self.config
            .validate()
            .map_err(|err| MemosError::Connection(err.to_string()))?;
        let base_url = normalize_base_url(&self.base_url)
            .map_err(|err| MemosError::Connection(format!("Invalid base URL: {err}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| MemosError::Connection(format!("Invalid token: {err}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(self.config.timeout)
            .build()?;

        let response = http
            .get(format_endpoint(&base_url, HEALTH_PATH))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(MemosError::Connection(format!(
                "Health check failed with status {}",
                response.status()
            )));
        }
        let server_version = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("version")?.as_str().map(str::to_string));
        Ok((http, server_version))
    }

    /// Release the transport. Safe to call any number of times.
    pub fn disconnect(&mut self) {
        if self.http.take().is_some() {
            tracing::debug!(url = %self.base_url, "Disconnected from memo server");
        }
        self.info.state = SessionState::Disconnected;
    }

    /// Single unretried probe of `GET /docs`; `false` when disconnected or unhealthy.
    pub async fn health_check(&self) -> bool {
        let Some(http) = self.transport() else {
            return false;
        };
        match http
            .get(format_endpoint(&self.base_url, HEALTH_PATH))
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(err) => {
                tracing::debug!(error = %err, "Health check failed");
                false
            }
        }
    }

    fn transport(&self) -> Option<&Client> {
        self.http.as_ref().filter(|_| self.is_connected())
    }

    /// Send `request`, retrying transient failures up to the configured attempt budget.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let http = self.transport().ok_or(MemosError::NotConnected)?;
        let label = format!("{} {}", request.method, request.path);
        run_with_retry(
            self.config.max_attempts(),
            self.sleeper.as_ref(),
            &label,
            move |attempt| self.send_once(http, request, attempt),
        )
        .await
    }

    async fn send_once(
        &self,
        http: &Client,
        request: &ApiRequest,
        attempt: u32,
    ) -> Result<ApiResponse> {
        let mut builder = http.request(
            request.method.clone(),
            format_endpoint(&self.base_url, &request.path),
        );
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            attempt,
            "Sending request"
        );

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if (200..300).contains(&status) {
            Ok(ApiResponse { status, body })
        } else {
            Err(classify_status(status, &body, &request.path))
        }
    }

    /// Connect, run `op`, then disconnect whatever `op` returned. The client stays usable and
    /// can open another session afterwards.
    pub async fn run_in_session<T, F>(&mut self, op: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a MemosClient) -> BoxFuture<'a, Result<T>>,
    {
        self.connect().await?;
        let result = op(&*self).await;
        self.disconnect();
        result
    }

    /// Scoped session: a fresh client for `config`, connected for the duration of `op`.
    pub async fn scoped<T, F>(config: ClientConfig, op: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a MemosClient) -> BoxFuture<'a, Result<T>>,
    {
        let mut client = Self::new(config);
        client.run_in_session(op).await
    }

    /// Create a memo; the server assigns its name.
    pub async fn create_memo(&self, memo: Memo) -> Result<Memo> {
        let body = json_body(&CreateMemoRequest { memo, memo_id: None })?;
        self.execute(&ApiRequest::post(MEMOS_PATH, body))
            .await?
            .json()
    }

    /// Fetch the memo with identifier `memo_id`.
    pub async fn get_memo(&self, memo_id: &str) -> Result<Memo> {
        self.execute(&ApiRequest::get(format!("{MEMOS_PATH}/{memo_id}")))
            .await?
            .json()
    }

    /// List memos, optionally filtered on content.
    pub async fn list_memos(
        &self,
        filter: Option<&str>,
        page_size: Option<u32>,
    ) -> Result<Vec<Memo>> {
        let mut request = ApiRequest::get(MEMOS_PATH);
        if let Some(filter) = filter {
            request = request.with_query("filter", filter);
        }
        if let Some(page_size) = page_size {
            request = request.with_query("page_size", page_size);
        }
        let response: ListMemosResponse = self.execute(&request).await?.json()?;
        Ok(response.memos)
    }

    /// Replace the memo with identifier `memo_id`.
    pub async fn update_memo(&self, memo_id: &str, memo: Memo) -> Result<Memo> {
        let body = json_body(&UpdateMemoRequest { memo })?;
        self.execute(&ApiRequest::patch(format!("{MEMOS_PATH}/{memo_id}"), body))
            .await?
            .json()
    }

    /// Delete the memo with identifier `memo_id`.
    pub async fn delete_memo(&self, memo_id: &str) -> Result<()> {
        self.execute(&ApiRequest::delete(format!("{MEMOS_PATH}/{memo_id}")))
            .await?;
        Ok(())
    }

    /// Create a user; the server assigns its name.
    pub async fn create_user(&self, user: User) -> Result<User> {
        let body = json_body(&CreateUserRequest { user, user_id: None })?;
        self.execute(&ApiRequest::post(USERS_PATH, body))
            .await?
            .json()
    }

    /// Fetch the user with identifier `user_id`.
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.execute(&ApiRequest::get(format!("{USERS_PATH}/{user_id}")))
            .await?
            .json()
    }

    /// List every user.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let response: ListUsersResponse = self
            .execute(&ApiRequest::get(USERS_PATH))
            .await?
            .json()?;
        Ok(response.users)
    }

    /// Replace the user with identifier `user_id`.
    pub async fn update_user(&self, user_id: &str, user: User) -> Result<User> {
        let body = json_body(&UpdateUserRequest { user })?;
        self.execute(&ApiRequest::patch(format!("{USERS_PATH}/{user_id}"), body))
            .await?
            .json()
    }

    /// Delete the user with identifier `user_id`.
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.execute(&ApiRequest::delete(format!("{USERS_PATH}/{user_id}")))
            .await?;
        Ok(())
    }

    /// Open a server-side session with password credentials.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SessionResponse> {
        let body = json_body(&CreateSessionRequest {
            password_credentials: Some(PasswordCredentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            sso_credentials: None,
        })?;
        self.execute(&ApiRequest::post("/api/v1/auth/signin", body))
            .await?
            .json()
    }

    /// Close the server-side session.
    pub async fn sign_out(&self) -> Result<()> {
        self.execute(&ApiRequest::new(reqwest::Method::POST, "/api/v1/auth/signout"))
            .await?;
        Ok(())
    }

    /// List attachments, optionally filtered on filename.
    pub async fn list_attachments(&self, filter: Option<&str>) -> Result<Vec<Attachment>> {
        let mut request = ApiRequest::get("/api/v1/attachments");
        if let Some(filter) = filter {
            request = request.with_query("filter", filter);
        }
        let response: ListAttachmentsResponse = self.execute(&request).await?.json()?;
        Ok(response.attachments)
    }

    /// List the activity feed.
    pub async fn list_activities(&self) -> Result<Vec<Activity>> {
        let response: ListActivitiesResponse = self
            .execute(&ApiRequest::get("/api/v1/activities"))
            .await?
            .json()?;
        Ok(response.activities)
    }
}

impl Drop for MemosClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn json_body<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|err| MemosError::Validation {
        message: err.to_string(),
    })
}

fn normalize_base_url(url: &str) -> std::result::Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
