use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A direct-message thread summary as supplied by the store.
///
/// The widget treats this as an immutable prop snapshot: it is compared
/// structurally to decide whether a re-render is needed and is never
/// mutated by the widget itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub last_status: Option<Status>,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub scroll_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub acct: String,
    /// Pre-sanitized markup owned by the store.
    #[serde(default)]
    pub display_name_html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub account: Account,
    pub created_at: Timestamp,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub spoiler_text: String,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
    /// Content collapsed behind its warning.
    #[serde(default)]
    pub hidden: bool,
    /// Conversation-level mute, carried on the last status.
    #[serde(default)]
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Gifv,
    Audio,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaAttachment {
    /// Short name for compact listings: the description if any, else the
    /// last path segment of the URL.
    pub fn label(&self) -> &str {
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            return description;
        }
        self.url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.id)
    }
}
