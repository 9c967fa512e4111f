//! Activity feed records.

use serde::{Deserialize, Serialize};

/// Activity type recorded when a memo comments on another memo.
pub const MEMO_COMMENT: &str = "MEMO_COMMENT";

/// Comment link carried by a `MEMO_COMMENT` activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMemoCommentPayload {
    /// The commenting memo.
    pub memo: String,
    /// The memo being commented on.
    pub related_memo: String,
}

/// Type-specific activity data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPayload {
    /// Present for `MEMO_COMMENT` activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo_comment: Option<ActivityMemoCommentPayload>,
}

/// Entry of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Resource name, `activities/{id}`, assigned by storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource name of the acting user.
    pub creator: String,
    /// Activity type, e.g. `MEMO_COMMENT`.
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Severity level, e.g. `INFO`.
    pub level: String,
    /// Type-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ActivityPayload>,
    /// RFC3339 creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

impl Activity {
    /// `MEMO_COMMENT` activity linking `memo` to the memo it comments on.
    pub fn memo_comment(creator: String, memo: String, related_memo: String) -> Self {
        Self {
            name: None,
            creator,
            activity_type: MEMO_COMMENT.to_string(),
            level: "INFO".to_string(),
            payload: Some(ActivityPayload {
                memo_comment: Some(ActivityMemoCommentPayload { memo, related_memo }),
            }),
            create_time: None,
        }
    }
}

/// Response of `GET /activities`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListActivitiesResponse {
    /// Activities in creation order.
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Always absent; paging is not implemented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memo_comment_serializes_snake_case_payload() {
        let activity = Activity::memo_comment(
            "users/1".into(),
            "memos/2".into(),
            "memos/1".into(),
        );
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["type"], MEMO_COMMENT);
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["payload"]["memo_comment"]["related_memo"], "memos/1");
    }
}
