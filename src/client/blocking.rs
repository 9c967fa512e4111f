//! Blocking facade over [`MemosClient`].

use super::error::{MemosError, Result};
use super::session::MemosClient;
use crate::config::ClientConfig;
use crate::models::{Activity, Attachment, Memo, SessionResponse, User, Visibility};
use futures_util::{FutureExt, future::BoxFuture};
use tokio::runtime::{Builder, Runtime};

/// Synchronous client. Every call opens a session, performs one operation and closes it.
///
/// Owns a current-thread runtime, so it must not be used from inside another tokio runtime.
pub struct SyncMemosClient {
    config: ClientConfig,
    runtime: Runtime,
}

impl SyncMemosClient {
    /// Client for `config` with its own runtime.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| MemosError::Runtime(err.to_string()))?;
        Ok(Self { config, runtime })
    }

    /// Configuration every session is opened with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn call<T, F>(&self, op: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a MemosClient) -> BoxFuture<'a, Result<T>>,
    {
        self.runtime
            .block_on(MemosClient::scoped(self.config.clone(), op))
    }

    /// Whether the server answers the health probe.
    pub fn health_check(&self) -> bool {
        self.call(|client| async move { Ok::<_, MemosError>(client.health_check().await) }.boxed())
            .unwrap_or(false)
    }

    /// Create a memo.
    pub fn create_memo(&self, memo: Memo) -> Result<Memo> {
        self.call(move |client| client.create_memo(memo).boxed())
    }

    /// Fetch a memo.
    pub fn get_memo(&self, memo_id: &str) -> Result<Memo> {
        let memo_id = memo_id.to_string();
        self.call(move |client| async move { client.get_memo(&memo_id).await }.boxed())
    }

    /// List memos, optionally filtered on content.
    pub fn list_memos(&self, filter: Option<&str>, page_size: Option<u32>) -> Result<Vec<Memo>> {
        let filter = filter.map(str::to_string);
        self.call(move |client| {
            async move { client.list_memos(filter.as_deref(), page_size).await }.boxed()
        })
    }

    /// Replace a memo.
    pub fn update_memo(&self, memo_id: &str, memo: Memo) -> Result<Memo> {
        let memo_id = memo_id.to_string();
        self.call(move |client| async move { client.update_memo(&memo_id, memo).await }.boxed())
    }

    /// Delete a memo.
    pub fn delete_memo(&self, memo_id: &str) -> Result<()> {
        let memo_id = memo_id.to_string();
        self.call(move |client| async move { client.delete_memo(&memo_id).await }.boxed())
    }

    /// Create a user.
    pub fn create_user(&self, user: User) -> Result<User> {
        self.call(move |client| client.create_user(user).boxed())
    }

    /// Fetch a user.
    pub fn get_user(&self, user_id: &str) -> Result<User> {
        let user_id = user_id.to_string();
        self.call(move |client| async move { client.get_user(&user_id).await }.boxed())
    }

    /// List every user.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.call(|client| client.list_users().boxed())
    }

    /// Replace a user.
    pub fn update_user(&self, user_id: &str, user: User) -> Result<User> {
        let user_id = user_id.to_string();
        self.call(move |client| async move { client.update_user(&user_id, user).await }.boxed())
    }

    /// Delete a user.
    pub fn delete_user(&self, user_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        self.call(move |client| async move { client.delete_user(&user_id).await }.boxed())
    }

    /// Open a server-side session with password credentials.
    pub fn sign_in(&self, username: &str, password: &str) -> Result<SessionResponse> {
        let (username, password) = (username.to_string(), password.to_string());
        self.call(move |client| {
            async move { client.sign_in(&username, &password).await }.boxed()
        })
    }

    /// Close the server-side session.
    pub fn sign_out(&self) -> Result<()> {
        self.call(|client| client.sign_out().boxed())
    }

    /// List attachments, optionally filtered on filename.
    pub fn list_attachments(&self, filter: Option<&str>) -> Result<Vec<Attachment>> {
        let filter = filter.map(str::to_string);
        self.call(move |client| {
            async move { client.list_attachments(filter.as_deref()).await }.boxed()
        })
    }

    /// List the activity feed.
    pub fn list_activities(&self) -> Result<Vec<Activity>> {
        self.call(|client| client.list_activities().boxed())
    }
}

/// Create one memo through a throwaway blocking client.
pub fn quick_memo_sync(
    config: ClientConfig,
    content: &str,
    visibility: Visibility,
) -> Result<Memo> {
    SyncMemosClient::new(config)?.create_memo(Memo::new(content).with_visibility(visibility))
}
