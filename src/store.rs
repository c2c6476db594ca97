use crate::conversation::{Conversation, Status};
use crate::ui::actions::{ConversationActions, Navigator};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

pub const COMPOSE_PATH: &str = "/publish";

/// A reply being written, started from a conversation item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub in_reply_to: String,
    pub text: String,
}

/// In-memory store behind the direct timeline. Owns the conversations, the
/// focus order and the reply draft; items only ever see snapshots.
#[derive(Debug, Clone, Default)]
pub struct DirectTimeline {
    conversations: Vec<Conversation>,
    focused: Option<String>,
    draft: Option<Draft>,
}

impl DirectTimeline {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        let focused = conversations
            .iter()
            .find(|c| is_focusable(c))
            .map(|c| c.id.clone());
        Self {
            conversations,
            focused,
            draft: None,
        }
    }

    /// Reads a JSON array of conversations, as returned by
    /// `GET /api/v1/conversations`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read conversations: {}", path.display()))?;
        let conversations: Vec<Conversation> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse conversations: {}", path.display()))?;
        info!("loaded {} conversations", conversations.len());
        Ok(Self::new(conversations))
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.conversations.iter().filter(|c| c.unread).count()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn focus(&mut self, id: &str) {
        if self.get(id).is_some_and(is_focusable) {
            self.focused = Some(id.to_string());
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    pub fn discard_draft(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    fn focus_index(&mut self, idx: usize) {
        self.focused = Some(self.conversations[idx].id.clone());
    }

    fn status_mut(&mut self, status_id: &str) -> Option<&mut Status> {
        self.conversations
            .iter_mut()
            .filter_map(|c| c.last_status.as_mut())
            .find(|s| s.id == status_id)
    }
}

/// Conversations without a last status render nothing, so they never take
/// focus.
fn is_focusable(conversation: &Conversation) -> bool {
    conversation.last_status.is_some()
}

impl ConversationActions for DirectTimeline {
    fn move_up(&mut self, conversation_id: &str) {
        let Some(idx) = self.position(conversation_id) else {
            return;
        };
        if let Some(target) = self.conversations[..idx].iter().rposition(is_focusable) {
            self.focus_index(target);
        }
    }

    fn move_down(&mut self, conversation_id: &str) {
        let Some(idx) = self.position(conversation_id) else {
            return;
        };
        if let Some(offset) = self.conversations[idx + 1..].iter().position(is_focusable) {
            self.focus_index(idx + 1 + offset);
        }
    }

    fn mark_read(&mut self, conversation_id: &str) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            conversation.unread = false;
        }
    }

    fn delete(&mut self, conversation_id: &str) {
        let Some(idx) = self.position(conversation_id) else {
            return;
        };
        self.conversations.remove(idx);
        debug!("deleted conversation {}", conversation_id);

        if self.focused.as_deref() == Some(conversation_id) {
            let after = self.conversations[idx..].iter().position(is_focusable);
            let before = self.conversations[..idx].iter().rposition(is_focusable);
            self.focused = after
                .map(|offset| idx + offset)
                .or(before)
                .map(|next| self.conversations[next].id.clone());
        }
    }

    fn mute(&mut self, status: &Status) {
        if let Some(stored) = self.status_mut(&status.id) {
            stored.muted = !stored.muted;
        }
    }

    fn toggle_hidden(&mut self, status: &Status) {
        if let Some(stored) = self.status_mut(&status.id) {
            stored.hidden = !stored.hidden;
        }
    }

    fn reply(&mut self, status: &Status, navigator: Option<&mut dyn Navigator>) {
        self.draft = Some(Draft {
            in_reply_to: status.id.clone(),
            text: format!("@{} ", status.account.acct),
        });
        if let Some(navigator) = navigator {
            navigator.push(COMPOSE_PATH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Account;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_conversation(id: &str, unread: bool) -> Conversation {
        let account = Account {
            id: format!("a{}", id),
            acct: format!("user{}", id),
            display_name_html: String::new(),
        };
        Conversation {
            id: id.to_string(),
            accounts: vec![account.clone()],
            last_status: Some(Status {
                id: format!("s{}", id),
                account,
                created_at: "2024-03-10T12:00:00Z".parse().unwrap(),
                content: String::new(),
                spoiler_text: String::new(),
                media_attachments: Vec::new(),
                hidden: false,
                muted: false,
            }),
            unread,
            scroll_key: None,
        }
    }

    fn make_timeline() -> DirectTimeline {
        DirectTimeline::new(vec![
            make_conversation("1", true),
            make_conversation("2", false),
            make_conversation("3", true),
        ])
    }

    struct Router(Vec<String>);

    impl Navigator for Router {
        fn push(&mut self, path: &str) {
            self.0.push(path.to_string());
        }
    }

    #[test]
    fn test_focus_moves_within_bounds() {
        let mut timeline = make_timeline();
        assert_eq!(timeline.focused(), Some("1"));

        timeline.move_up("1");
        assert_eq!(timeline.focused(), Some("1"));
        timeline.move_down("1");
        assert_eq!(timeline.focused(), Some("2"));
        timeline.move_down("3");
        assert_eq!(timeline.focused(), Some("3"));
        timeline.move_up("3");
        assert_eq!(timeline.focused(), Some("2"));
    }

    #[test]
    fn test_focus_skips_conversations_without_status() {
        let mut empty = make_conversation("0", false);
        empty.last_status = None;
        let mut gap = make_conversation("2", false);
        gap.last_status = None;
        let mut timeline = DirectTimeline::new(vec![
            empty,
            make_conversation("1", true),
            gap,
            make_conversation("3", true),
        ]);
        assert_eq!(timeline.focused(), Some("1"));

        timeline.move_down("1");
        assert_eq!(timeline.focused(), Some("3"));
        timeline.move_down("3");
        assert_eq!(timeline.focused(), Some("3"));
        timeline.move_up("3");
        assert_eq!(timeline.focused(), Some("1"));
        timeline.move_up("1");
        assert_eq!(timeline.focused(), Some("1"));

        timeline.focus("2");
        assert_eq!(timeline.focused(), Some("1"));

        timeline.delete("1");
        assert_eq!(timeline.focused(), Some("3"));
        timeline.delete("3");
        assert_eq!(timeline.focused(), None);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut timeline = make_timeline();
        assert_eq!(timeline.unread_count(), 2);
        timeline.mark_read("1");
        timeline.mark_read("1");
        assert!(!timeline.get("1").unwrap().unread);
        assert_eq!(timeline.unread_count(), 1);
    }

    #[test]
    fn test_delete_refocuses_neighbor() {
        let mut timeline = make_timeline();
        timeline.focus("3");
        timeline.delete("3");
        assert_eq!(timeline.conversations().len(), 2);
        assert_eq!(timeline.focused(), Some("2"));

        timeline.delete("missing");
        assert_eq!(timeline.conversations().len(), 2);
    }

    #[test]
    fn test_mute_and_hidden_flip_status_flags() {
        let mut timeline = make_timeline();
        let status = timeline.get("2").unwrap().last_status.clone().unwrap();

        timeline.mute(&status);
        timeline.toggle_hidden(&status);
        let stored = timeline.get("2").unwrap().last_status.as_ref().unwrap();
        assert!(stored.muted);
        assert!(stored.hidden);

        timeline.mute(&status);
        assert!(!timeline.get("2").unwrap().last_status.as_ref().unwrap().muted);
    }

    #[test]
    fn test_reply_starts_draft_and_opens_compose() {
        let mut timeline = make_timeline();
        let status = timeline.get("1").unwrap().last_status.clone().unwrap();
        let mut router = Router(Vec::new());

        timeline.reply(&status, Some(&mut router));
        assert_eq!(
            timeline.draft(),
            Some(&Draft {
                in_reply_to: "s1".to_string(),
                text: "@user1 ".to_string(),
            })
        );
        assert_eq!(router.0, vec![COMPOSE_PATH.to_string()]);

        assert!(timeline.discard_draft().is_some());
        assert!(timeline.draft().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&vec![make_conversation("9", true)]).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let timeline = DirectTimeline::load(file.path()).unwrap();
        assert_eq!(timeline.conversations().len(), 1);
        assert_eq!(timeline.focused(), Some("9"));
    }
}
