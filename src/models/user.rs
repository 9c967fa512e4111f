//! User, access token and session records.

use super::{State, resource_id};
use serde::{Deserialize, Serialize};

/// Privilege level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Instance owner.
    Host,
    /// Administrator.
    Admin,
    /// Regular user.
    #[default]
    User,
}

/// An account on the memo server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Resource name, `users/{id}`, assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unique login name.
    pub username: String,
    /// Privilege level.
    #[serde(default)]
    pub role: UserRole,
    /// Contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Human readable name.
    #[serde(default, alias = "display_name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Avatar location.
    #[serde(default, alias = "avatar_url", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Profile text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
    /// RFC3339 creation time.
    #[serde(default, alias = "create_time", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// RFC3339 time of the last update.
    #[serde(default, alias = "update_time", skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl User {
    /// Regular user with only a username set.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            name: None,
            username: username.into(),
            role: UserRole::default(),
            email: None,
            display_name: None,
            avatar_url: None,
            description: None,
            state: State::default(),
            create_time: None,
            update_time: None,
        }
    }

    /// Set the email; also derives a title-cased display name when none is set.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        if self.display_name.is_none() {
            self.display_name = Some(title_case(&self.username));
        }
        self
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Identifier part of the resource name, once the server has assigned one.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().map(resource_id)
    }

    /// Case-insensitive match of `needle` (already lower-cased) against username, display name
    /// and email.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        let contains = |value: &str| value.to_lowercase().contains(needle);
        contains(self.username.as_str())
            || self.display_name.as_deref().is_some_and(contains)
            || self.email.as_deref().is_some_and(contains)
    }
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Personal API token issued to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccessToken {
    /// Resource name, `users/{uid}/accessTokens/{tid}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Secret token value.
    #[serde(alias = "access_token")]
    pub access_token: String,
    /// Free-form purpose of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// RFC3339 issue time.
    #[serde(default, alias = "issued_at", skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<String>,
    /// RFC3339 expiry time.
    #[serde(default, alias = "expires_at", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Per-user counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Resource name of the user.
    pub name: String,
    /// Number of memos whose creator is this user.
    #[serde(default, alias = "total_memo_count")]
    pub total_memo_count: usize,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// User to store.
    pub user: User,
    /// Explicit identifier; the server assigns one when absent.
    #[serde(default, alias = "user_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Body of `PATCH /users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    /// Replacement user.
    pub user: User,
}

/// Response of `GET /users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    /// Users in insertion order.
    #[serde(default)]
    pub users: Vec<User>,
    /// Always absent; paging is not implemented.
    #[serde(default, alias = "next_page_token", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Response of `GET /users:search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsersResponse {
    /// Users matching the query.
    #[serde(default)]
    pub users: Vec<User>,
    /// Always absent; paging is not implemented.
    #[serde(default, alias = "next_page_token", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Response of `GET /users:stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAllUserStatsResponse {
    /// One entry per user.
    #[serde(default)]
    pub stats: Vec<UserStats>,
}

/// Body of `POST /users/{id}/accessTokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserAccessTokenRequest {
    /// Token to store.
    #[serde(alias = "access_token")]
    pub access_token: UserAccessToken,
    /// Explicit identifier; the server assigns one when absent.
    #[serde(default, alias = "access_token_id", skip_serializing_if = "Option::is_none")]
    pub access_token_id: Option<String>,
}

/// Response of `GET /users/{id}/accessTokens`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUserAccessTokensResponse {
    /// Tokens issued to the user.
    #[serde(default, alias = "access_tokens")]
    pub access_tokens: Vec<UserAccessToken>,
}

/// Username and password pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordCredentials {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Single sign-on callback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoCredentials {
    /// Identity provider identifier.
    pub idp_id: String,
    /// Authorization code returned by the provider.
    pub code: String,
    /// Redirect URI used in the authorization request.
    pub redirect_uri: String,
}

/// Body of `POST /auth/signin`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Password sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_credentials: Option<PasswordCredentials>,
    /// Single sign-on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso_credentials: Option<SsoCredentials>,
}

/// Session returned by `POST /auth/signin` and `GET /auth/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Signed-in user.
    pub user: User,
    /// RFC3339 time the session was last used.
    pub last_accessed_at: String,
}
