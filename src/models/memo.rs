//! Memo, attachment, reaction and relation records.

use super::{State, resource_id};
use serde::{Deserialize, Serialize};

/// Audience allowed to read a memo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Only the creator.
    #[default]
    Private,
    /// Signed-in users.
    Protected,
    /// Everyone.
    Public,
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PRIVATE" => Ok(Self::Private),
            "PROTECTED" => Ok(Self::Protected),
            "PUBLIC" => Ok(Self::Public),
            other => Err(format!("unknown visibility '{other}'")),
        }
    }
}

/// A single note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    /// Resource name, `memos/{id}`, assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource name of the creating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Markdown body of the memo.
    pub content: String,
    /// Audience of the memo.
    #[serde(default)]
    pub visibility: Visibility,
    /// Lifecycle state.
    #[serde(default)]
    pub state: State,
    /// Whether the memo is pinned to the top of listings.
    #[serde(default)]
    pub pinned: bool,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Attachments linked to the memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    /// Links to other memos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<MemoRelation>>,
    /// Reactions left on the memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<Reaction>>,
    /// RFC3339 creation time.
    #[serde(default, alias = "create_time", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// RFC3339 time of the last update.
    #[serde(default, alias = "update_time", skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Memo {
    /// Private, unpinned memo with the given body.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            name: None,
            creator: None,
            content: content.into(),
            visibility: Visibility::default(),
            state: State::default(),
            pinned: false,
            tags: None,
            attachments: None,
            relations: None,
            reactions: None,
            create_time: None,
            update_time: None,
        }
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Set the tag list; an empty list clears it.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.tags = (!tags.is_empty()).then_some(tags);
        self
    }

    /// Identifier part of the resource name, once the server has assigned one.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref().map(resource_id)
    }

    /// First relation of type `COMMENT`, if the memo is a comment on another memo.
    pub fn comment_relation(&self) -> Option<&MemoRelation> {
        self.relations
            .as_deref()?
            .iter()
            .find(|relation| relation.relation_type == RelationType::Comment)
    }
}

/// Kind of link between two memos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// Plain reference.
    #[default]
    Reference,
    /// The memo comments on the related memo.
    Comment,
}

/// Directed link from one memo to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoRelation {
    /// Source memo name.
    pub memo: String,
    /// Target memo name.
    #[serde(alias = "related_memo")]
    pub related_memo: String,
    /// Link kind.
    #[serde(rename = "type", default)]
    pub relation_type: RelationType,
}

/// Reaction left by a user on a memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Resource name assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource name of the reacting user.
    pub creator: String,
    /// Reaction encoding, e.g. `EMOJI`.
    #[serde(alias = "content_type")]
    pub content_type: String,
    /// Reaction payload.
    pub content: String,
}

/// File attached to a memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Resource name, `attachments/{id}`, assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Original file name.
    pub filename: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Raw bytes, base64 on the wire.
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    /// External location of the file when the bytes are not stored inline.
    #[serde(default, alias = "external_link", skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
    /// Memo the attachment belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// RFC3339 creation time.
    #[serde(default, alias = "create_time", skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

/// Body of `POST /memos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoRequest {
    /// Memo to store.
    pub memo: Memo,
    /// Explicit identifier; the server assigns one when absent.
    #[serde(default, alias = "memo_id", skip_serializing_if = "Option::is_none")]
    pub memo_id: Option<String>,
}

/// Body of `PATCH /memos/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemoRequest {
    /// Replacement memo.
    pub memo: Memo,
}

/// Response of `GET /memos`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMemosResponse {
    /// Matching memos in insertion order.
    #[serde(default)]
    pub memos: Vec<Memo>,
    /// Always absent; paging is not implemented.
    #[serde(default, alias = "next_page_token", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Body of `POST /attachments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachmentRequest {
    /// Attachment to store.
    pub attachment: Attachment,
}

/// Response of `GET /attachments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAttachmentsResponse {
    /// Matching attachments in insertion order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Always absent; paging is not implemented.
    #[serde(default, alias = "next_page_token", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
