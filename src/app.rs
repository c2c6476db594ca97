use crate::config::Config;
use crate::i18n::{LabelResolver, Labels, MessageKey};
use crate::store::{DirectTimeline, COMPOSE_PATH};
use crate::ui::actions::{ActionContext, Navigator};
use crate::ui::emoji::Hover;
use crate::ui::hotkeys::{HotkeyRegistration, HotkeyRegistry, Keymap};
use crate::ui::widgets::{ConversationItem, ItemLayout, MenuPopup, RenderSettings};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use jiff::{tz::TimeZone, Timestamp};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::rc::Rc;
use tracing::debug;

/// Route history for the timeline. The current route is shown in the
/// footer; there are no other screens to render.
#[derive(Debug, Clone, Default)]
pub struct Router {
    history: Vec<String>,
}

impl Router {
    pub fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn back(&mut self) -> Option<String> {
        self.history.pop()
    }
}

impl Navigator for Router {
    fn push(&mut self, path: &str) {
        self.history.push(path.to_string());
    }
}

/// The direct timeline: a focusable list of conversation items over a
/// [`DirectTimeline`] store.
pub struct App {
    title: String,
    timeline: DirectTimeline,
    router: Router,
    items: Vec<ConversationItem>,
    keymap: Rc<Keymap>,
    labels: Labels,
    autoplay: bool,
    registry: HotkeyRegistry,
    registration: Option<HotkeyRegistration>,
    menu: Option<MenuPopup>,
    layouts: Vec<(String, ItemLayout)>,
    hovered: Option<String>,
    scroll: usize,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, timeline: DirectTimeline) -> Result<Self> {
        let mut app = Self {
            title: config.general.title.clone(),
            timeline,
            router: Router::default(),
            items: Vec::new(),
            keymap: Rc::new(config.keymap()?),
            labels: config.labels(),
            autoplay: config.general.autoplay,
            registry: HotkeyRegistry::new(),
            registration: None,
            menu: None,
            layouts: Vec::new(),
            hovered: None,
            scroll: 0,
            should_quit: false,
        };
        app.sync();
        Ok(app)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn timeline(&self) -> &DirectTimeline {
        &self.timeline
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn menu(&self) -> Option<&MenuPopup> {
        self.menu.as_ref()
    }

    /// Re-derives item props from the store. Items whose conversation is
    /// gone are unmounted; the focused item holds the hotkey scope.
    fn sync(&mut self) {
        let mut previous = std::mem::take(&mut self.items);
        for conversation in self.timeline.conversations() {
            match previous.iter().position(|item| item.id() == conversation.id) {
                Some(idx) => {
                    let mut item = previous.swap_remove(idx);
                    item.set_props(conversation.clone());
                    self.items.push(item);
                }
                None => self.items.push(ConversationItem::new(
                    conversation.clone(),
                    Rc::clone(&self.keymap),
                )),
            }
        }
        for gone in previous {
            debug!("unmounted conversation {}", gone.id());
        }

        if let Some(menu) = &self.menu {
            if self.timeline.get(menu.conversation_id()).is_none() {
                self.menu = None;
            }
        }

        let focused = self.timeline.focused().map(str::to_string);
        if self.registry.active_scope() != focused || self.registration.is_none() {
            self.registration = None;
            self.registration = focused
                .as_deref()
                .and_then(|id| self.items.iter().find(|item| item.id() == id))
                .and_then(|item| item.activate(&self.registry));
        }
    }

    fn with_item<F>(&mut self, id: &str, f: F)
    where
        F: FnOnce(&ConversationItem, &mut ActionContext<'_>),
    {
        if let Some(item) = self.items.iter().find(|item| item.id() == id) {
            let mut ctx = ActionContext::new(&mut self.timeline, Some(&mut self.router));
            f(item, &mut ctx);
        }
        self.sync();
    }

    fn focused_index(&self) -> Option<usize> {
        let focused = self.timeline.focused()?;
        self.items.iter().position(|item| item.id() == focused)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.timeline.draft().is_some() {
            self.handle_draft_key(key);
            return;
        }
        if self.menu.is_some() {
            self.handle_menu_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('m') => self.open_menu(),
            KeyCode::Esc | KeyCode::Backspace => {
                if let Some(path) = self.router.back() {
                    debug!("left {}", path);
                }
            }
            _ => match self.registry.route(&key) {
                Some(routed) => self.with_item(&routed.conversation_id, |item, ctx| {
                    item.handle_hotkey(routed.action, ctx)
                }),
                None => debug!("unbound key {:?}", key.code),
            },
        }
    }

    fn handle_draft_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if let Some(draft) = self.timeline.discard_draft() {
                    debug!("reply to {} cancelled", draft.in_reply_to);
                }
                self.leave_compose();
            }
            KeyCode::Enter => {
                if let Some(draft) = self.timeline.discard_draft() {
                    debug!("reply to {} finished: {:?}", draft.in_reply_to, draft.text);
                }
                self.leave_compose();
            }
            KeyCode::Backspace => {
                if let Some(draft) = self.timeline.draft_mut() {
                    draft.text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(draft) = self.timeline.draft_mut() {
                    draft.text.push(c);
                }
            }
            _ => {}
        }
    }

    fn leave_compose(&mut self) {
        if self.router.current() == Some(COMPOSE_PATH) {
            self.router.back();
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        let Some(menu) = self.menu.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => menu.select_next(),
            KeyCode::Char('k') | KeyCode::Up => menu.select_previous(),
            KeyCode::Enter => {
                if let Some(menu) = self.menu.take() {
                    if let Some(action) = menu.selected_action() {
                        self.with_item(menu.conversation_id(), |item, ctx| {
                            item.handle_menu_action(action, ctx)
                        });
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('m') => self.menu = None,
            _ => {}
        }
    }

    fn open_menu(&mut self) {
        let Some(idx) = self.focused_index() else {
            return;
        };
        let item = &self.items[idx];
        self.menu = item
            .menu(&self.labels)
            .map(|items| MenuPopup::new(item.id(), items));
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved => self.update_hover(position),
            MouseEventKind::Down(MouseButton::Left) => {
                if self.menu.is_some() || self.timeline.draft().is_some() {
                    return;
                }
                let Some((id, layout)) = self
                    .layouts
                    .iter()
                    .find(|(_, layout)| layout.area.contains(position))
                    .cloned()
                else {
                    return;
                };

                self.timeline.focus(&id);
                if layout.reply.contains(position) {
                    self.with_item(&id, |item, ctx| item.handle_reply(ctx));
                } else if layout.menu.contains(position) {
                    self.sync();
                    self.open_menu();
                } else if layout.avatar.contains(position) || layout.body.contains(position) {
                    self.with_item(&id, |item, ctx| item.handle_click(ctx));
                } else {
                    self.sync();
                }
            }
            MouseEventKind::ScrollDown => self.scroll_focus(true),
            MouseEventKind::ScrollUp => self.scroll_focus(false),
            _ => {}
        }
    }

    fn scroll_focus(&mut self, down: bool) {
        if let Some(id) = self.timeline.focused().map(str::to_string) {
            self.with_item(&id, |item, ctx| {
                if down {
                    ctx.actions.move_down(item.id());
                } else {
                    ctx.actions.move_up(item.id());
                }
            });
        }
    }

    fn update_hover(&mut self, position: Position) {
        let over = self
            .layouts
            .iter()
            .find(|(_, layout)| layout.names.contains(position))
            .map(|(id, _)| id.clone());
        if over == self.hovered {
            return;
        }

        let autoplay = self.autoplay;
        if let Some(previous) = self.hovered.take() {
            if let Some(item) = self.items.iter_mut().find(|item| item.id() == previous) {
                item.hover_names(Hover::Leave, autoplay);
            }
        }
        if let Some(current) = &over {
            if let Some(item) = self.items.iter_mut().find(|item| item.id() == current) {
                item.hover_names(Hover::Enter, autoplay);
            }
        }
        self.hovered = over;
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());

        let unread = self.timeline.unread_count();
        let title = if unread > 0 {
            format!(" {} ({} unread) ", self.title, unread)
        } else {
            format!(" {} ", self.title)
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));
        let list_area = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);

        let settings = RenderSettings {
            labels: &self.labels,
            autoplay: self.autoplay,
            now: Timestamp::now(),
            tz: TimeZone::system(),
        };

        self.layouts.clear();
        if self.items.is_empty() {
            frame.render_widget(
                Paragraph::new("No conversations.").alignment(Alignment::Center),
                list_area,
            );
        } else {
            let focused = self.focused_index();
            let heights: Vec<u16> = self
                .items
                .iter_mut()
                .map(|item| item.height(list_area.width, &settings))
                .collect();

            if let Some(focused) = focused {
                self.scroll = self.scroll.min(focused);
                let fits = |from: usize| -> bool {
                    heights[from..=focused].iter().map(|h| u32::from(*h)).sum::<u32>()
                        <= u32::from(list_area.height)
                };
                while self.scroll < focused && !fits(self.scroll) {
                    self.scroll += 1;
                }
            }

            let mut y = list_area.y;
            for (idx, item) in self.items.iter_mut().enumerate().skip(self.scroll) {
                let height = heights[idx];
                if height == 0 {
                    continue;
                }
                if y >= list_area.bottom() {
                    break;
                }
                let area = Rect::new(
                    list_area.x,
                    y,
                    list_area.width,
                    height.min(list_area.bottom() - y),
                );
                if let Some(layout) = item.render(frame, area, focused == Some(idx), &settings) {
                    self.layouts.push((item.id().to_string(), layout));
                }
                y += height;
            }
        }

        frame.render_widget(Paragraph::new(self.footer()), chunks[1]);

        if let Some(menu) = &self.menu {
            let anchor = self
                .layouts
                .iter()
                .find(|(id, _)| id == menu.conversation_id())
                .map(|(_, layout)| layout.menu)
                .unwrap_or(list_area);
            menu.render(
                frame,
                anchor,
                frame.area(),
                &self.labels.resolve(MessageKey::More),
            );
        }
    }

    fn footer(&self) -> Line<'static> {
        if let Some(draft) = self.timeline.draft() {
            return Line::from(vec![
                Span::styled(
                    format!("{}: ", self.labels.resolve(MessageKey::Reply)),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{}_", draft.text)),
                Span::styled(
                    "  Enter send | Esc cancel",
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
        }

        let route = self.router.current().unwrap_or("/conversations").to_string();
        Line::from(vec![
            Span::styled(route, Style::default().fg(Color::Yellow)),
            Span::styled(
                "  q quit | m menu | r reply | o open | j/k move | x show more",
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Account, Conversation, Status};
    use crate::ui::html::Inline;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn make_conversation(id: &str, unread: bool) -> Conversation {
        let account = Account {
            id: format!("a{}", id),
            acct: format!("user{}", id),
            display_name_html: format!("User {}", id),
        };
        Conversation {
            id: id.to_string(),
            accounts: vec![account.clone()],
            last_status: Some(Status {
                id: format!("s{}", id),
                account,
                created_at: "2024-03-10T12:00:00Z".parse().unwrap(),
                content: format!("<p>message {}</p>", id),
                spoiler_text: String::new(),
                media_attachments: Vec::new(),
                hidden: false,
                muted: false,
            }),
            unread,
            scroll_key: None,
        }
    }

    fn make_app() -> App {
        let timeline = DirectTimeline::new(vec![
            make_conversation("1", true),
            make_conversation("2", false),
        ]);
        App::new(&Config::default(), timeline).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_focused_item_holds_hotkey_scope() {
        let mut app = make_app();
        assert_eq!(app.registry.active_scope(), Some("1".to_string()));

        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.timeline().focused(), Some("2"));
        assert_eq!(app.registry.active_scope(), Some("2".to_string()));
    }

    #[test]
    fn test_focus_moves_across_conversation_without_status() {
        let mut gap = make_conversation("2", false);
        gap.last_status = None;
        let timeline = DirectTimeline::new(vec![
            make_conversation("1", true),
            gap,
            make_conversation("3", false),
        ]);
        let mut app = App::new(&Config::default(), timeline).unwrap();

        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.timeline().focused(), Some("3"));
        assert_eq!(app.registry.active_scope(), Some("3".to_string()));

        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.timeline().focused(), Some("1"));
        assert_eq!(app.registry.active_scope(), Some("1".to_string()));
    }

    fn with_emoji_name(id: &str, emoji: &str) -> Conversation {
        let mut conversation = make_conversation(id, false);
        conversation.accounts[0].display_name_html = format!(
            r#"User <img class="custom-emoji" alt=":{0}:" src="{0}.png" data-original="{0}.gif" data-static="{0}.png">"#,
            emoji
        );
        conversation
    }

    fn emoji_sources(app: &mut App, idx: usize) -> Vec<String> {
        let labels = app.labels.clone();
        let settings = RenderSettings {
            labels: &labels,
            autoplay: false,
            now: Timestamp::now(),
            tz: TimeZone::UTC,
        };
        let Some(view) = app.items[idx].view(&settings) else {
            return Vec::new();
        };
        view.names
            .links
            .iter()
            .flat_map(|link| link.display_name.iter())
            .filter_map(|run| match run {
                Inline::Emoji(emoji) => Some(emoji.src.clone()),
                Inline::Text(_) => None,
            })
            .collect()
    }

    fn move_to(app: &mut App, column: u16, row: u16) {
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
    }

    #[test]
    fn test_hover_only_animates_the_hovered_item() {
        let timeline = DirectTimeline::new(vec![
            with_emoji_name("1", "blob"),
            with_emoji_name("2", "cat"),
        ]);
        let mut app = App::new(&Config::default(), timeline).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        let names = app.layouts[0].1.names;
        move_to(&mut app, names.x, names.y);
        assert_eq!(emoji_sources(&mut app, 0), vec!["blob.gif".to_string()]);
        assert_eq!(emoji_sources(&mut app, 1), vec!["cat.png".to_string()]);

        let names = app.layouts[1].1.names;
        move_to(&mut app, names.x, names.y);
        assert_eq!(emoji_sources(&mut app, 0), vec!["blob.png".to_string()]);
        assert_eq!(emoji_sources(&mut app, 1), vec!["cat.gif".to_string()]);

        move_to(&mut app, 0, 0);
        assert_eq!(emoji_sources(&mut app, 0), vec!["blob.png".to_string()]);
        assert_eq!(emoji_sources(&mut app, 1), vec!["cat.png".to_string()]);
    }

    #[test]
    fn test_open_hotkey_marks_read_and_navigates() {
        let mut app = make_app();
        press(&mut app, KeyCode::Enter);

        assert!(!app.timeline().get("1").unwrap().unread);
        assert_eq!(app.router().current(), Some("/@user1/s1"));
        assert!(!app.items[0].props().unread);
    }

    #[test]
    fn test_menu_delete_unmounts_item() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('m'));
        assert!(app.menu().is_some());

        // open, mute, mark as read, delete
        for _ in 0..3 {
            press(&mut app, KeyCode::Char('j'));
        }
        press(&mut app, KeyCode::Enter);

        assert!(app.menu().is_none());
        assert!(app.timeline().get("1").is_none());
        assert_eq!(app.items.len(), 1);
        assert_eq!(app.registry.active_scope(), Some("2".to_string()));
    }

    #[test]
    fn test_reply_draft_captures_typing() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.timeline().draft().unwrap().text, "@user1 ");

        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.timeline().draft().unwrap().text, "@user1 hi");

        assert_eq!(app.router().current(), Some(COMPOSE_PATH));

        press(&mut app, KeyCode::Esc);
        assert!(app.timeline().draft().is_none());
        assert_eq!(app.router().current(), None);
        // Typing no longer lands in a draft.
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_draw_records_layouts() {
        let mut app = make_app();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        assert_eq!(app.layouts.len(), 2);
        assert_eq!(app.layouts[0].0, "1");
        assert!(app.layouts[1].1.area.y > app.layouts[0].1.area.y);
    }

    #[test]
    fn test_click_on_body_opens_conversation() {
        let mut app = make_app();
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        let body = app.layouts[1].1.body;
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: body.x,
            row: body.y,
            modifiers: KeyModifiers::NONE,
        });

        assert_eq!(app.timeline().focused(), Some("2"));
        assert_eq!(app.router().current(), Some("/@user2/s2"));
    }
}
