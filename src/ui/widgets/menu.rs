use crate::i18n::{LabelResolver, MessageKey};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

/// What a menu entry does once chosen. Resolved against the owning item's
/// current props at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Open,
    ToggleMute,
    MarkAsRead,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Action { label: String, action: MenuAction },
    Separator,
}

impl MenuItem {
    fn action(labels: &dyn LabelResolver, key: MessageKey, action: MenuAction) -> Self {
        MenuItem::Action {
            label: labels.resolve(key),
            action,
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, MenuItem::Separator)
    }
}

/// Builds the "more" menu for a conversation. Pure: the result depends only
/// on the arguments.
///
/// Order is fixed: open, separator, mute/unmute, then "mark as read" and a
/// separator only while unread, and delete last.
pub fn build_menu(unread: bool, muted: bool, labels: &dyn LabelResolver) -> Vec<MenuItem> {
    let mut menu = vec![
        MenuItem::action(labels, MessageKey::Open, MenuAction::Open),
        MenuItem::Separator,
    ];

    let mute_key = if muted {
        MessageKey::UnmuteConversation
    } else {
        MessageKey::MuteConversation
    };
    menu.push(MenuItem::action(labels, mute_key, MenuAction::ToggleMute));

    if unread {
        menu.push(MenuItem::action(
            labels,
            MessageKey::MarkAsRead,
            MenuAction::MarkAsRead,
        ));
        menu.push(MenuItem::Separator);
    }

    menu.push(MenuItem::action(labels, MessageKey::Delete, MenuAction::Delete));
    menu
}

/// An open dropdown for one conversation. Selection skips separators.
#[derive(Debug, Clone)]
pub struct MenuPopup {
    conversation_id: String,
    items: Vec<MenuItem>,
    state: ListState,
}

impl MenuPopup {
    pub fn new(conversation_id: impl Into<String>, items: Vec<MenuItem>) -> Self {
        let mut state = ListState::default();
        state.select(items.iter().position(|item| !item.is_separator()));
        Self {
            conversation_id: conversation_id.into(),
            items,
            state,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn selected_action(&self) -> Option<MenuAction> {
        match self.items.get(self.state.selected()?)? {
            MenuItem::Action { action, .. } => Some(*action),
            MenuItem::Separator => None,
        }
    }

    pub fn select_next(&mut self) {
        let Some(current) = self.state.selected() else {
            return;
        };
        if let Some(offset) = self.items[current + 1..]
            .iter()
            .position(|item| !item.is_separator())
        {
            self.state.select(Some(current + 1 + offset));
        }
    }

    pub fn select_previous(&mut self) {
        let Some(current) = self.state.selected() else {
            return;
        };
        if let Some(index) = self.items[..current]
            .iter()
            .rposition(|item| !item.is_separator())
        {
            self.state.select(Some(index));
        }
    }

    /// Draws the popup anchored below-left of `anchor`, clamped to `bounds`.
    pub fn render(&self, frame: &mut Frame, anchor: Rect, bounds: Rect, title: &str) {
        let width = self
            .items
            .iter()
            .map(|item| match item {
                MenuItem::Action { label, .. } => label.chars().count(),
                MenuItem::Separator => 0,
            })
            .max()
            .unwrap_or(0)
            .max(title.chars().count()) as u16
            + 4;
        let height = self.items.len() as u16 + 2;

        let x = anchor
            .right()
            .saturating_sub(width)
            .max(bounds.x)
            .min(bounds.right().saturating_sub(width));
        let y = (anchor.y + 1).min(bounds.bottom().saturating_sub(height));
        let area = Rect::new(x, y, width, height).intersection(bounds);

        let inner_width = area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| match item {
                MenuItem::Action { label, .. } => ListItem::new(format!(" {}", label)),
                MenuItem::Separator => ListItem::new("─".repeat(inner_width))
                    .style(Style::default().fg(Color::DarkGray)),
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(format!(" {} ", title)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = self.state.clone();
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }
}
