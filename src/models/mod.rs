//! Resource records shared by the HTTP server and the client.
//!
//! Resource models serialize with camelCase keys and accept the snake_case spelling on input,
//! so payloads written by either side round-trip. Envelopes defined next to the auth and
//! activity routes keep snake_case keys.

pub mod activity;
pub mod memo;
pub mod user;

pub use activity::{Activity, ActivityMemoCommentPayload, ActivityPayload, ListActivitiesResponse};
pub use memo::{
    Attachment, CreateAttachmentRequest, CreateMemoRequest, ListAttachmentsResponse,
    ListMemosResponse, Memo, MemoRelation, Reaction, RelationType, UpdateMemoRequest, Visibility,
};
pub use user::{
    CreateSessionRequest, CreateUserAccessTokenRequest, CreateUserRequest,
    ListAllUserStatsResponse, ListUserAccessTokensResponse, ListUsersResponse,
    PasswordCredentials, SearchUsersResponse, SessionResponse, SsoCredentials,
    UpdateUserRequest, User, UserAccessToken, UserRole, UserStats,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle state shared by memos and users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Active resource.
    #[default]
    Normal,
    /// Resource hidden from default listings.
    Archived,
}

/// Trailing identifier of a resource name such as `memos/12`.
pub fn resource_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
