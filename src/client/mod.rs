//! HTTP client for the memo server.
//!
//! [`MemosClient`] is the async session: `connect` builds the transport and probes
//! `GET /docs`, `execute` runs one request with bounded retries, and the typed operations
//! (`create_memo`, `list_users`, ...) sit on top of it. [`SyncMemosClient`] wraps it for
//! callers without a runtime, opening a fresh session per call.

mod blocking;
mod error;
mod request;
mod retry;
mod session;

pub use blocking::{SyncMemosClient, quick_memo_sync};
pub use error::{MemosError, Result};
pub use request::{ApiRequest, ApiResponse, classify_status, resource_info};
pub use retry::{Sleeper, TokioSleeper, backoff_delay};
pub use session::{ConnectionInfo, HEALTH_PATH, MemosClient, SessionState};

use crate::config::ClientConfig;
use crate::models::{Memo, Visibility};
use futures_util::FutureExt;

/// Create one memo in a scoped session.
pub async fn quick_memo(
    config: ClientConfig,
    content: &str,
    visibility: Visibility,
) -> Result<Memo> {
    let memo = Memo::new(content).with_visibility(visibility);
    MemosClient::scoped(config, move |client| client.create_memo(memo).boxed()).await
}
