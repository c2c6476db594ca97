use crate::conversation::Status;
use crate::ui::actions::ActionContext;
use tracing::debug;

/// Read state as seen by one item. Owned by the store; the item only asks
/// for the unread -> read transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Unread,
    Read,
}

impl ReadState {
    pub fn from_unread(unread: bool) -> Self {
        if unread {
            ReadState::Unread
        } else {
            ReadState::Read
        }
    }

    /// Requests the read transition if there is one to make. Returns whether
    /// a request went out.
    pub fn request_read(self, conversation_id: &str, ctx: &mut ActionContext<'_>) -> bool {
        match self {
            ReadState::Unread => {
                debug!("marking conversation {} as read", conversation_id);
                ctx.actions.mark_read(conversation_id);
                true
            }
            ReadState::Read => false,
        }
    }
}

/// Route of a status page: `/@{acct}/{id}`, verbatim.
pub fn status_path(status: &Status) -> String {
    format!("/@{}/{}", status.account.acct, status.id)
}

/// Route of an account page: `/@{acct}`.
pub fn account_path(acct: &str) -> String {
    format!("/@{}", acct)
}

/// Click and reply handling for a conversation item, bound to one prop
/// snapshot.
#[derive(Debug, Clone, Copy)]
pub struct NavigationController<'a> {
    conversation_id: &'a str,
    last_status: &'a Status,
    read_state: ReadState,
}

impl<'a> NavigationController<'a> {
    pub fn new(conversation_id: &'a str, last_status: &'a Status, unread: bool) -> Self {
        Self {
            conversation_id,
            last_status,
            read_state: ReadState::from_unread(unread),
        }
    }

    /// Opens the conversation. Ignored without a navigator; otherwise marks
    /// it read (when unread) strictly before navigating.
    pub fn handle_click(&self, ctx: &mut ActionContext<'_>) {
        if ctx.navigator.is_none() {
            debug!(
                "ignoring open of {}: no navigator available",
                self.conversation_id
            );
            return;
        }

        self.read_state.request_read(self.conversation_id, ctx);

        let path = status_path(self.last_status);
        if let Some(navigator) = ctx.navigator() {
            debug!("navigating to {}", path);
            navigator.push(&path);
        }
    }

    pub fn handle_reply(&self, ctx: &mut ActionContext<'_>) {
        debug!("reply to status {}", self.last_status.id);
        let (actions, navigator) = ctx.split();
        actions.reply(self.last_status, navigator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Account;
    use crate::ui::actions::testing::{Call, LogActions, LogNavigator};
    use std::cell::RefCell;

    fn status(id: &str, acct: &str) -> Status {
        Status {
            id: id.to_string(),
            account: Account {
                id: "1".to_string(),
                acct: acct.to_string(),
                display_name_html: String::new(),
            },
            created_at: "2024-03-01T12:00:00Z".parse().unwrap(),
            content: String::new(),
            spoiler_text: String::new(),
            media_attachments: Vec::new(),
            hidden: false,
            muted: false,
        }
    }

    #[test]
    fn test_status_path_is_verbatim() {
        assert_eq!(status_path(&status("100", "alice")), "/@alice/100");
        assert_eq!(
            status_path(&status("7", "bob@remote.example")),
            "/@bob@remote.example/7"
        );
        assert_eq!(account_path("carol"), "/@carol");
    }

    #[test]
    fn test_click_unread_marks_read_then_navigates() {
        let log = RefCell::new(Vec::new());
        let mut actions = LogActions { log: &log };
        let mut nav = LogNavigator { log: &log };
        let mut ctx = ActionContext::new(&mut actions, Some(&mut nav));

        let status = status("100", "alice");
        NavigationController::new("42", &status, true).handle_click(&mut ctx);

        assert_eq!(
            log.into_inner(),
            vec![
                Call::MarkRead("42".to_string()),
                Call::Navigate("/@alice/100".to_string()),
            ]
        );
    }

    #[test]
    fn test_click_read_only_navigates() {
        let log = RefCell::new(Vec::new());
        let mut actions = LogActions { log: &log };
        let mut nav = LogNavigator { log: &log };
        let mut ctx = ActionContext::new(&mut actions, Some(&mut nav));

        let status = status("100", "alice");
        NavigationController::new("42", &status, false).handle_click(&mut ctx);

        assert_eq!(
            log.into_inner(),
            vec![Call::Navigate("/@alice/100".to_string())]
        );
    }

    #[test]
    fn test_click_without_navigator_is_ignored() {
        let log = RefCell::new(Vec::new());
        let mut actions = LogActions { log: &log };
        let mut ctx = ActionContext::new(&mut actions, None);

        let status = status("100", "alice");
        NavigationController::new("42", &status, true).handle_click(&mut ctx);

        assert!(log.into_inner().is_empty());
    }

    #[test]
    fn test_reply_delegates_with_navigator() {
        let log = RefCell::new(Vec::new());
        let mut actions = LogActions { log: &log };
        let mut nav = LogNavigator { log: &log };
        let status = status("100", "alice");

        {
            let mut ctx = ActionContext::new(&mut actions, Some(&mut nav));
            NavigationController::new("42", &status, true).handle_reply(&mut ctx);
        }
        {
            let mut ctx = ActionContext::new(&mut actions, None);
            NavigationController::new("42", &status, true).handle_reply(&mut ctx);
        }

        assert_eq!(
            log.into_inner(),
            vec![
                Call::Reply {
                    status_id: "100".to_string(),
                    routable: true,
                },
                Call::Reply {
                    status_id: "100".to_string(),
                    routable: false,
                },
            ]
        );
    }

    #[test]
    fn test_read_state_only_transitions_from_unread() {
        let log = RefCell::new(Vec::new());
        let mut actions = LogActions { log: &log };
        let mut ctx = ActionContext::new(&mut actions, None);

        assert!(ReadState::Unread.request_read("1", &mut ctx));
        assert!(!ReadState::Read.request_read("1", &mut ctx));
        assert_eq!(log.into_inner(), vec![Call::MarkRead("1".to_string())]);
    }
}
