use std::collections::HashMap;

/// Localized strings the conversation item consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    More,
    Open,
    Reply,
    MarkAsRead,
    Delete,
    MuteConversation,
    UnmuteConversation,
    With,
}

impl MessageKey {
    pub const ALL: [MessageKey; 8] = [
        MessageKey::More,
        MessageKey::Open,
        MessageKey::Reply,
        MessageKey::MarkAsRead,
        MessageKey::Delete,
        MessageKey::MuteConversation,
        MessageKey::UnmuteConversation,
        MessageKey::With,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MessageKey::More => "status.more",
            MessageKey::Open => "conversation.open",
            MessageKey::Reply => "status.reply",
            MessageKey::MarkAsRead => "conversation.mark_as_read",
            MessageKey::Delete => "conversation.delete",
            MessageKey::MuteConversation => "status.mute_conversation",
            MessageKey::UnmuteConversation => "status.unmute_conversation",
            MessageKey::With => "conversation.with",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            MessageKey::More => "More",
            MessageKey::Open => "View conversation",
            MessageKey::Reply => "Reply",
            MessageKey::MarkAsRead => "Mark as read",
            MessageKey::Delete => "Delete conversation",
            MessageKey::MuteConversation => "Mute conversation",
            MessageKey::UnmuteConversation => "Unmute conversation",
            MessageKey::With => "With {names}",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.id() == id)
    }
}

pub trait LabelResolver {
    fn resolve(&self, key: MessageKey) -> String;
}

/// Default English strings, optionally overridden per key.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    overrides: HashMap<MessageKey, String>,
}

impl Labels {
    /// Builds a resolver from `message id -> text` pairs. Unknown ids are
    /// returned so the caller can report them.
    pub fn with_overrides<'a, I>(entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut overrides = HashMap::new();
        let mut unknown = Vec::new();
        for (id, text) in entries {
            match MessageKey::from_id(id) {
                Some(key) => {
                    overrides.insert(key, text.clone());
                }
                None => unknown.push(id.clone()),
            }
        }
        (Self { overrides }, unknown)
    }
}

/// Splits a `conversation.with` template around its `{names}` placeholder.
/// Without the placeholder the names go last.
pub fn split_names_template(template: &str) -> (&str, &str) {
    template.split_once("{names}").unwrap_or((template, ""))
}

impl LabelResolver for Labels {
    fn resolve(&self, key: MessageKey) -> String {
        self.overrides
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.default_message().to_string())
    }
}
