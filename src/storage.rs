//! In-memory storage maps behind the HTTP routers.
//!
//! Every resource type lives in its own [`IndexMap`] keyed by the string identifier that appears
//! in the resource name (`memos/{id}`), so listings keep insertion order. Identifiers come from a
//! per-type counter unless the caller supplies one; the counter skips ids already taken.

use indexmap::IndexMap;

use crate::models::{
    Activity, Attachment, Memo, SessionResponse, User, UserAccessToken, UserStats,
    current_timestamp_rfc3339,
};

/// Next free identifier: the first counter value not already taken by an explicit id.
fn next_id<T>(rows: &IndexMap<String, T>, counter: &mut u64) -> String {
    loop {
        *counter += 1;
        let candidate = counter.to_string();
        if !rows.contains_key(&candidate) {
            return candidate;
        }
    }
}

/// Memo table.
#[derive(Debug, Default)]
pub struct MemoStorage {
    memos: IndexMap<String, Memo>,
    counter: u64,
}

impl MemoStorage {
    /// Store a memo under `memo_id`, or under the next counter value when absent.
    pub fn create(&mut self, mut memo: Memo, memo_id: Option<String>) -> Memo {
        let memo_id = memo_id.unwrap_or_else(|| next_id(&self.memos, &mut self.counter));
        let now = current_timestamp_rfc3339();
        memo.name = Some(format!("memos/{memo_id}"));
        memo.create_time.get_or_insert_with(|| now.clone());
        memo.update_time = Some(now);
        self.memos.insert(memo_id, memo.clone());
        memo
    }

    /// Memo stored under `memo_id`.
    pub fn get(&self, memo_id: &str) -> Option<&Memo> {
        self.memos.get(memo_id)
    }

    /// Memos whose content contains `filter`, ignoring case; all memos without a filter.
    pub fn list(&self, filter: Option<&str>) -> Vec<Memo> {
        let needle = filter.filter(|f| !f.is_empty()).map(str::to_lowercase);
        self.memos
            .values()
            .filter(|memo| match &needle {
                Some(needle) => memo.content.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Replace the memo stored under `memo_id`; `None` when it does not exist.
    pub fn update(&mut self, memo_id: &str, mut memo: Memo) -> Option<Memo> {
        let existing = self.memos.get(memo_id)?;
        memo.name = Some(format!("memos/{memo_id}"));
        if memo.create_time.is_none() {
            memo.create_time = existing.create_time.clone();
        }
        memo.update_time = Some(current_timestamp_rfc3339());
        self.memos.insert(memo_id.to_string(), memo.clone());
        Some(memo)
    }

    /// Remove the memo stored under `memo_id`.
    pub fn delete(&mut self, memo_id: &str) -> bool {
        self.memos.shift_remove(memo_id).is_some()
    }

    /// Number of memos created by the user named `creator`.
    pub fn count_by_creator(&self, creator: &str) -> usize {
        self.memos
            .values()
            .filter(|memo| memo.creator.as_deref() == Some(creator))
            .count()
    }
}

/// User table plus the access tokens and the single sign-in session.
#[derive(Debug)]
pub struct UserStorage {
    users: IndexMap<String, User>,
    access_tokens: IndexMap<String, UserAccessToken>,
    session: Option<SessionResponse>,
    counter: u64,
    token_counter: u64,
}

/// Username accepted by [`UserStorage::authenticate`].
pub const SEED_USERNAME: &str = "admin";
const SEED_PASSWORD: &str = "password";

impl Default for UserStorage {
    fn default() -> Self {
        let mut storage = Self {
            users: IndexMap::new(),
            access_tokens: IndexMap::new(),
            session: None,
            counter: 0,
            token_counter: 0,
        };
        storage.seed_admin();
        storage
    }
}

impl UserStorage {
    fn seed_admin(&mut self) {
        let mut admin = User::new(SEED_USERNAME)
            .with_display_name("Admin User")
            .with_email("admin@example.com");
        admin.name = Some("users/1".to_string());
        admin.create_time = Some(current_timestamp_rfc3339());
        self.users.insert("1".to_string(), admin);
        self.counter = 1;
    }

    /// Store a user under `user_id`, or under the next counter value when absent.
    pub fn create(&mut self, mut user: User, user_id: Option<String>) -> User {
        let user_id = user_id.unwrap_or_else(|| next_id(&self.users, &mut self.counter));
        let now = current_timestamp_rfc3339();
        user.name = Some(format!("users/{user_id}"));
        user.create_time.get_or_insert_with(|| now.clone());
        user.update_time = Some(now);
        self.users.insert(user_id, user.clone());
        user
    }

    /// User stored under `user_id`.
    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// All users in insertion order.
    pub fn list(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }

    /// Users whose username, display name or email contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<User> {
        let needle = query.to_lowercase();
        self.users
            .values()
            .filter(|user| user.matches(&needle))
            .cloned()
            .collect()
    }

    /// Replace the user stored under `user_id`; `None` when it does not exist.
    pub fn update(&mut self, user_id: &str, mut user: User) -> Option<User> {
        let existing = self.users.get(user_id)?;
        user.name = Some(format!("users/{user_id}"));
        if user.create_time.is_none() {
            user.create_time = existing.create_time.clone();
        }
        user.update_time = Some(current_timestamp_rfc3339());
        self.users.insert(user_id.to_string(), user.clone());
        Some(user)
    }

    /// Remove the user stored under `user_id`.
    pub fn delete(&mut self, user_id: &str) -> bool {
        self.users.shift_remove(user_id).is_some()
    }

    /// Check the hardcoded development credentials and open the session on success.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Option<SessionResponse> {
        if username != SEED_USERNAME || password != SEED_PASSWORD {
            return None;
        }
        let user = self.users.get("1")?.clone();
        let session = SessionResponse {
            user,
            last_accessed_at: current_timestamp_rfc3339(),
        };
        self.session = Some(session.clone());
        Some(session)
    }

    /// The open session, if any.
    pub fn current_session(&self) -> Option<&SessionResponse> {
        self.session.as_ref()
    }

    /// Close every session.
    pub fn clear_sessions(&mut self) {
        self.session = None;
    }

    /// Store an access token for `user_id` under `token_id`, or under the next free number.
    pub fn create_access_token(
        &mut self,
        user_id: &str,
        mut token: UserAccessToken,
        token_id: Option<String>,
    ) -> UserAccessToken {
        let token_id =
            token_id.unwrap_or_else(|| next_id(&self.access_tokens, &mut self.token_counter));
        token.name = Some(format!("users/{user_id}/accessTokens/{token_id}"));
        token.issued_at.get_or_insert_with(current_timestamp_rfc3339);
        self.access_tokens.insert(token_id, token.clone());
        token
    }

    /// Tokens issued to `user_id`.
    pub fn list_access_tokens(&self, user_id: &str) -> Vec<UserAccessToken> {
        let prefix = format!("users/{user_id}/");
        self.access_tokens
            .values()
            .filter(|token| {
                token
                    .name
                    .as_deref()
                    .is_some_and(|name| name.starts_with(&prefix))
            })
            .cloned()
            .collect()
    }

    /// Remove the token stored under `token_id`.
    pub fn delete_access_token(&mut self, token_id: &str) -> bool {
        self.access_tokens.shift_remove(token_id).is_some()
    }

    /// One stats entry per user; memo counts come from `memos`.
    pub fn stats(&self, memos: &MemoStorage) -> Vec<UserStats> {
        self.users
            .keys()
            .map(|user_id| {
                let name = format!("users/{user_id}");
                UserStats {
                    total_memo_count: memos.count_by_creator(&name),
                    name,
                }
            })
            .collect()
    }
}

/// Attachment table.
#[derive(Debug, Default)]
pub struct AttachmentStorage {
    attachments: IndexMap<String, Attachment>,
    counter: u64,
}

impl AttachmentStorage {
    /// Store an attachment under the next counter value.
    pub fn create(&mut self, mut attachment: Attachment) -> Attachment {
        let attachment_id = next_id(&self.attachments, &mut self.counter);
        attachment.name = Some(format!("attachments/{attachment_id}"));
        attachment
            .create_time
            .get_or_insert_with(current_timestamp_rfc3339);
        self.attachments.insert(attachment_id, attachment.clone());
        attachment
    }

    /// Attachment stored under `attachment_id`.
    pub fn get(&self, attachment_id: &str) -> Option<&Attachment> {
        self.attachments.get(attachment_id)
    }

    /// Attachments whose filename contains `filter`, ignoring case.
    pub fn list(&self, filter: Option<&str>) -> Vec<Attachment> {
        let needle = filter.filter(|f| !f.is_empty()).map(str::to_lowercase);
        self.attachments
            .values()
            .filter(|attachment| match &needle {
                Some(needle) => attachment.filename.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Remove the attachment stored under `attachment_id`.
    pub fn delete(&mut self, attachment_id: &str) -> bool {
        self.attachments.shift_remove(attachment_id).is_some()
    }
}

/// Activity feed.
#[derive(Debug, Default)]
pub struct ActivityStorage {
    activities: IndexMap<String, Activity>,
    counter: u64,
}

impl ActivityStorage {
    /// Append an activity under the next counter value.
    pub fn create(&mut self, mut activity: Activity) -> Activity {
        let activity_id = next_id(&self.activities, &mut self.counter);
        activity.name = Some(format!("activities/{activity_id}"));
        activity
            .create_time
            .get_or_insert_with(current_timestamp_rfc3339);
        self.activities.insert(activity_id, activity.clone());
        activity
    }

    /// All activities in creation order.
    pub fn list(&self) -> Vec<Activity> {
        self.activities.values().cloned().collect()
    }
}

/// Every storage map the server owns.
#[derive(Debug, Default)]
pub struct AppStorage {
    /// Memos.
    pub memos: MemoStorage,
    /// Users, tokens and the session.
    pub users: UserStorage,
    /// Attachments.
    pub attachments: AttachmentStorage,
    /// Activity feed.
    pub activities: ActivityStorage,
}

impl AppStorage {
    /// Empty storage with the seeded admin user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all data and restore the seeded state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_memo() -> Memo {
        Memo::new("This is a test memo")
    }

    #[test]
    fn memo_create_assigns_sequential_names() {
        let mut storage = AppStorage::new();
        let first = storage.memos.create(sample_memo(), None);
        let second = storage.memos.create(sample_memo(), None);
        assert_eq!(first.name.as_deref(), Some("memos/1"));
        assert_eq!(second.name.as_deref(), Some("memos/2"));
        assert!(first.create_time.is_some());
        assert_eq!(storage.memos.get("1").unwrap().content, "This is a test memo");
    }

    #[test]
    fn memo_create_honours_explicit_id() {
        let mut storage = MemoStorage::default();
        let memo = storage.create(sample_memo(), Some("custom".to_string()));
        assert_eq!(memo.name.as_deref(), Some("memos/custom"));
        assert!(storage.get("custom").is_some());
    }

    #[test]
    fn memo_create_skips_explicitly_taken_ids() {
        let mut storage = MemoStorage::default();
        storage.create(Memo::new("explicit"), Some("1".to_string()));
        let generated = storage.create(Memo::new("generated"), None);

        assert_eq!(generated.name.as_deref(), Some("memos/2"));
        assert_eq!(storage.get("1").unwrap().content, "explicit");
        assert_eq!(storage.list(None).len(), 2);
    }

    #[test]
    fn memo_delete_keeps_remaining_order() {
        let mut storage = MemoStorage::default();
        for content in ["first", "second", "third"] {
            storage.create(Memo::new(content), None);
        }
        assert!(storage.delete("1"));
        storage.update("3", Memo::new("third, edited"));

        let contents: Vec<_> = storage
            .list(None)
            .into_iter()
            .map(|memo| memo.content)
            .collect();
        assert_eq!(contents, vec!["second", "third, edited"]);
    }

    #[test]
    fn memo_list_filters_case_insensitively() {
        let mut storage = MemoStorage::default();
        storage.create(Memo::new("Python programming"), None);
        storage.create(Memo::new("JavaScript tutorial"), None);

        let filtered = storage.list(Some("python"));
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].content.contains("Python"));
        assert_eq!(storage.list(None).len(), 2);
        assert_eq!(storage.list(Some("")).len(), 2);
    }

    #[test]
    fn memo_update_keeps_name_and_create_time() {
        let mut storage = MemoStorage::default();
        let created = storage.create(sample_memo(), None);

        let updated = storage
            .update("1", Memo::new("Updated content"))
            .expect("memo exists");
        assert_eq!(updated.content, "Updated content");
        assert_eq!(updated.name.as_deref(), Some("memos/1"));
        assert_eq!(updated.create_time, created.create_time);
        assert!(storage.update("404", Memo::new("nope")).is_none());
    }

    #[test]
    fn memo_delete_removes_row() {
        let mut storage = MemoStorage::default();
        storage.create(sample_memo(), None);
        assert!(storage.delete("1"));
        assert!(storage.get("1").is_none());
        assert!(!storage.delete("1"));
    }

    #[test]
    fn users_start_with_seeded_admin() {
        let storage = UserStorage::default();
        let users = storage.list();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
        assert_eq!(users[0].name.as_deref(), Some("users/1"));
    }

    #[test]
    fn user_create_continues_after_seed() {
        let mut storage = UserStorage::default();
        let created = storage.create(
            User::new("testuser").with_email("test@example.com"),
            None,
        );
        assert_eq!(created.name.as_deref(), Some("users/2"));
        assert_eq!(storage.get("2").unwrap().username, "testuser");
    }

    #[test]
    fn user_create_skips_explicitly_taken_ids() {
        let mut storage = UserStorage::default();
        storage.create(User::new("explicit"), Some("2".to_string()));
        let generated = storage.create(User::new("generated"), None);

        assert_eq!(generated.name.as_deref(), Some("users/3"));
        assert_eq!(storage.get("2").unwrap().username, "explicit");
        assert_eq!(storage.list().len(), 3);
    }

    #[test]
    fn user_search_matches_any_field() {
        let mut storage = UserStorage::default();
        storage.create(User::new("testuser").with_display_name("Test User"), None);
        let results = storage.search("TEST");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].username, "testuser");
        assert_eq!(storage.search("example.com").len(), 1);
    }

    #[test]
    fn authenticate_accepts_only_seed_credentials() {
        let mut storage = UserStorage::default();
        assert!(storage.authenticate("admin", "wrongpass").is_none());
        assert!(storage.current_session().is_none());

        let session = storage.authenticate("admin", "password").expect("session");
        assert_eq!(session.user.username, "admin");
        assert!(storage.current_session().is_some());

        storage.clear_sessions();
        assert!(storage.current_session().is_none());
    }

    #[test]
    fn access_tokens_are_scoped_to_users() {
        let mut storage = UserStorage::default();
        let token = UserAccessToken {
            name: None,
            access_token: "test-token-123".into(),
            description: None,
            issued_at: None,
            expires_at: None,
        };
        let created = storage.create_access_token("1", token.clone(), None);
        assert_eq!(created.name.as_deref(), Some("users/1/accessTokens/1"));
        storage.create_access_token("12", token, None);

        assert_eq!(storage.list_access_tokens("1").len(), 1);
        assert!(storage.delete_access_token("1"));
        assert!(storage.list_access_tokens("1").is_empty());
    }

    #[test]
    fn access_token_ids_are_not_reused_after_delete() {
        let mut storage = UserStorage::default();
        let token = UserAccessToken {
            name: None,
            access_token: "secret".into(),
            description: None,
            issued_at: None,
            expires_at: None,
        };
        storage.create_access_token("1", token.clone(), None);
        storage.create_access_token("2", token.clone(), None);
        assert!(storage.delete_access_token("1"));

        let reissued = storage.create_access_token("1", token, None);
        assert_eq!(reissued.name.as_deref(), Some("users/1/accessTokens/3"));
        assert_eq!(storage.list_access_tokens("1").len(), 1);
        let kept = storage.list_access_tokens("2");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name.as_deref(), Some("users/2/accessTokens/2"));
    }

    #[test]
    fn stats_count_memos_per_creator() {
        let mut storage = AppStorage::new();
        let mut memo = sample_memo();
        memo.creator = Some("users/1".to_string());
        storage.memos.create(memo, None);
        storage.memos.create(sample_memo(), None);

        let stats = storage.users.stats(&storage.memos);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "users/1");
        assert_eq!(stats[0].total_memo_count, 1);
    }

    #[test]
    fn attachment_list_filters_by_filename() {
        let mut storage = AttachmentStorage::default();
        let pdf = Attachment {
            name: None,
            filename: "document.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 1024,
            content: None,
            external_link: None,
            memo: None,
            create_time: None,
        };
        let jpg = Attachment {
            filename: "image.jpg".into(),
            mime_type: "image/jpeg".into(),
            ..pdf.clone()
        };
        let created = storage.create(pdf);
        storage.create(jpg);

        assert_eq!(created.name.as_deref(), Some("attachments/1"));
        let filtered = storage.list(Some("PDF"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].filename, "document.pdf");
        assert!(storage.delete("2"));
        assert!(storage.get("2").is_none());
    }

    #[test]
    fn activities_get_sequential_names() {
        let mut storage = ActivityStorage::default();
        let activity = storage.create(Activity::memo_comment(
            "users/1".into(),
            "memos/2".into(),
            "memos/1".into(),
        ));
        assert_eq!(activity.name.as_deref(), Some("activities/1"));
        assert_eq!(storage.list().len(), 1);
    }

    #[test]
    fn reset_restores_seeded_state() {
        let mut storage = AppStorage::new();
        storage.memos.create(sample_memo(), None);
        storage.users.create(User::new("other"), None);
        assert_eq!(storage.memos.list(None).len(), 1);

        storage.reset();
        assert!(storage.memos.list(None).is_empty());
        assert_eq!(storage.users.list().len(), 1);
        let memo = storage.memos.create(sample_memo(), None);
        assert_eq!(memo.name.as_deref(), Some("memos/1"));
    }
}
