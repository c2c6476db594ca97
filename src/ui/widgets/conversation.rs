use crate::conversation::{Conversation, MediaAttachment, MediaKind, Status};
use crate::i18n::{split_names_template, LabelResolver, MessageKey};
use crate::ui::actions::ActionContext;
use crate::ui::emoji::{toggle_custom_emoji, EmojiSubtree, Hover};
use crate::ui::hotkeys::{HotkeyAction, HotkeyRegistration, HotkeyRegistry, Keymap};
use crate::ui::html::{parse_display_name, status_text, CustomEmoji, Inline};
use crate::ui::memo::Memo;
use crate::ui::navigation::{account_path, NavigationController};
use crate::ui::timestamp;
use crate::ui::widgets::menu::{build_menu, MenuAction, MenuItem};
use jiff::{tz::TimeZone, Timestamp};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::rc::Rc;
use tracing::debug;

pub const AVATAR_SIZE: u16 = 48;
const AVATAR_COLUMNS: u16 = 4;
const MENU_GLYPH: &str = " ⋯ ";

/// Everything a render depends on besides the props.
pub struct RenderSettings<'a> {
    pub labels: &'a dyn LabelResolver,
    pub autoplay: bool,
    pub now: Timestamp,
    pub tz: TimeZone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationView {
    pub conversation_id: String,
    pub classes: Vec<&'static str>,
    pub avatar: AvatarComposite,
    pub unread: bool,
    pub created_at: Timestamp,
    pub names: NamesRegion,
    pub body: StatusBody,
    pub attachments: Option<AttachmentList>,
    pub reply_title: String,
    pub menu: MenuAffordance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarComposite {
    pub accts: Vec<String>,
    pub size: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameLink {
    pub href: String,
    pub title: String,
    pub display_name: Vec<Inline>,
}

/// The "With {names}" line. Pointer enter/leave over it swaps emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamesRegion {
    pub template: String,
    pub links: Vec<NameLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBody {
    pub spoiler_text: String,
    pub text: String,
    pub expanded: bool,
    pub collapsible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentList {
    pub compact: bool,
    pub media: Vec<MediaAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuAffordance {
    pub title: String,
    pub scroll_key: Option<String>,
    pub status_id: String,
    pub items: Vec<MenuItem>,
}

/// Screen regions of a drawn item, for routing mouse input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemLayout {
    pub area: Rect,
    pub avatar: Rect,
    pub names: Rect,
    pub body: Rect,
    pub reply: Rect,
    pub menu: Rect,
}

impl EmojiSubtree for NamesRegion {
    fn for_each_custom_emoji(&mut self, f: &mut dyn FnMut(&mut CustomEmoji)) {
        for link in &mut self.links {
            link.display_name.for_each_custom_emoji(f);
        }
    }
}

impl EmojiSubtree for ConversationView {
    fn for_each_custom_emoji(&mut self, f: &mut dyn FnMut(&mut CustomEmoji)) {
        self.names.for_each_custom_emoji(f);
    }
}

impl AvatarComposite {
    /// Up to four initials, one per participant, in display order.
    pub fn initials(&self) -> Vec<char> {
        self.accts
            .iter()
            .take(4)
            .map(|acct| {
                acct.chars()
                    .find(|c| c.is_alphanumeric())
                    .map(|c| c.to_uppercase().next().unwrap_or(c))
                    .unwrap_or('?')
            })
            .collect()
    }
}

impl StatusBody {
    pub fn has_content_warning(&self) -> bool {
        !self.spoiler_text.trim().is_empty()
    }

    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = usize::from(width.max(1));
        let mut lines = Vec::new();

        if self.has_content_warning() {
            for row in textwrap::wrap(&self.spoiler_text, width) {
                lines.push(Line::from(Span::styled(
                    row.into_owned(),
                    Style::default().fg(Color::Yellow),
                )));
            }
            let toggle = if self.expanded {
                "[x] Show less"
            } else {
                "[x] Show more"
            };
            lines.push(Line::from(Span::styled(
                toggle,
                Style::default().fg(Color::DarkGray),
            )));
            if !self.expanded && self.collapsible {
                return lines;
            }
        }

        for row in textwrap::wrap(&self.text, width) {
            lines.push(Line::from(row.into_owned()));
        }
        lines
    }
}

fn media_glyph(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "▣",
        MediaKind::Video => "▶",
        MediaKind::Gifv => "◎",
        MediaKind::Audio => "♪",
        MediaKind::Unknown => "▢",
    }
}

/// Props snapshot a cached render was built from.
#[derive(Debug, Clone, PartialEq)]
struct RenderKey {
    props: Conversation,
    autoplay: bool,
}

/// Borrowed form of [`RenderKey`], compared against the cache before any
/// clone is made.
struct RenderInput<'a> {
    props: &'a Conversation,
    autoplay: bool,
}

impl PartialEq<RenderInput<'_>> for RenderKey {
    fn eq(&self, other: &RenderInput<'_>) -> bool {
        self.autoplay == other.autoplay && self.props == *other.props
    }
}

impl From<RenderInput<'_>> for RenderKey {
    fn from(input: RenderInput<'_>) -> Self {
        Self {
            props: input.props.clone(),
            autoplay: input.autoplay,
        }
    }
}

/// One conversation summary in the direct timeline.
///
/// Holds no state of its own beyond the current props and the memoized
/// render output; every handler reads the props it was given and forwards
/// intent to the collaborators in [`ActionContext`].
#[derive(Debug)]
pub struct ConversationItem {
    props: Conversation,
    keymap: Rc<Keymap>,
    rendered: Memo<RenderKey, Option<ConversationView>>,
}

impl ConversationItem {
    pub fn new(props: Conversation, keymap: Rc<Keymap>) -> Self {
        Self {
            props,
            keymap,
            rendered: Memo::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.props.id
    }

    pub fn props(&self) -> &Conversation {
        &self.props
    }

    pub fn set_props(&mut self, props: Conversation) {
        self.props = props;
    }

    fn last_status(&self) -> Option<&Status> {
        self.props.last_status.as_ref()
    }

    /// Render output for the current props, or `None` when there is no
    /// last status to show.
    pub fn view(&mut self, settings: &RenderSettings<'_>) -> Option<&mut ConversationView> {
        let input = RenderInput {
            props: &self.props,
            autoplay: settings.autoplay,
        };
        self.rendered
            .get_or_render(input, |key| {
                build_view(&key.props, key.autoplay, settings.labels)
            })
            .as_mut()
    }

    pub fn menu(&self, labels: &dyn LabelResolver) -> Option<Vec<MenuItem>> {
        let status = self.last_status()?;
        Some(build_menu(self.props.unread, status.muted, labels))
    }

    fn navigation(&self) -> Option<NavigationController<'_>> {
        let status = self.last_status()?;
        Some(NavigationController::new(
            &self.props.id,
            status,
            self.props.unread,
        ))
    }

    pub fn handle_click(&self, ctx: &mut ActionContext<'_>) {
        if let Some(nav) = self.navigation() {
            nav.handle_click(ctx);
        }
    }

    pub fn handle_reply(&self, ctx: &mut ActionContext<'_>) {
        if let Some(nav) = self.navigation() {
            nav.handle_reply(ctx);
        }
    }

    pub fn handle_menu_action(&self, action: MenuAction, ctx: &mut ActionContext<'_>) {
        debug!("menu action {:?} on conversation {}", action, self.props.id);
        match action {
            MenuAction::Open => self.handle_click(ctx),
            MenuAction::ToggleMute => {
                if let Some(status) = self.last_status() {
                    ctx.actions.mute(status);
                }
            }
            MenuAction::MarkAsRead => ctx.actions.mark_read(&self.props.id),
            MenuAction::Delete => ctx.actions.delete(&self.props.id),
        }
    }

    pub fn handle_hotkey(&self, action: HotkeyAction, ctx: &mut ActionContext<'_>) {
        debug!("hotkey {} on conversation {}", action, self.props.id);
        match action {
            HotkeyAction::Reply => self.handle_reply(ctx),
            HotkeyAction::Open => self.handle_click(ctx),
            HotkeyAction::MoveUp => ctx.actions.move_up(&self.props.id),
            HotkeyAction::MoveDown => ctx.actions.move_down(&self.props.id),
            HotkeyAction::ToggleHidden => {
                if let Some(status) = self.last_status() {
                    ctx.actions.toggle_hidden(status);
                }
            }
        }
    }

    /// Swaps emoji in this item's names region. Only touches output this
    /// item has already rendered.
    pub fn hover_names(&mut self, hover: Hover, autoplay: bool) -> usize {
        match self.rendered.cached_mut() {
            Some(Some(view)) => toggle_custom_emoji(&mut view.names, hover, autoplay),
            _ => 0,
        }
    }

    /// Makes this item's hotkeys live. Items that render nothing register
    /// nothing.
    pub fn activate(&self, registry: &HotkeyRegistry) -> Option<HotkeyRegistration> {
        self.last_status()?;
        Some(registry.register(&self.props.id, Rc::clone(&self.keymap)))
    }

    /// Rows needed to draw this item at `width`, borders included.
    pub fn height(&mut self, width: u16, settings: &RenderSettings<'_>) -> u16 {
        let Some(view) = self.view(settings) else {
            return 0;
        };
        let content_width = width.saturating_sub(2 + AVATAR_COLUMNS);
        let body = view.body.lines(content_width).len() as u16;
        let attachments = view
            .attachments
            .as_ref()
            .map_or(0, |list| list.media.len() as u16);
        2 + 1 + body + attachments + 1
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        selected: bool,
        settings: &RenderSettings<'_>,
    ) -> Option<ItemLayout> {
        let now = settings.now;
        let tz = settings.tz.clone();
        let view = self.view(settings)?;
        Some(draw_view(view, frame, area, selected, now, &tz))
    }
}

fn build_view(
    props: &Conversation,
    autoplay: bool,
    labels: &dyn LabelResolver,
) -> Option<ConversationView> {
    let status = props.last_status.as_ref()?;

    let mut classes = vec!["conversation", "focusable"];
    // `muted` follows the conversation mute flag.
    if status.muted {
        classes.push("muted");
    }
    if props.unread {
        classes.push("conversation--unread");
    }

    let links = props
        .accounts
        .iter()
        .map(|account| {
            let mut display_name = parse_display_name(&account.display_name_html, autoplay);
            if display_name.is_empty() {
                display_name.push(Inline::Text(account.acct.clone()));
            }
            NameLink {
                href: account_path(&account.acct),
                title: account.acct.clone(),
                display_name,
            }
        })
        .collect();

    let attachments = (!status.media_attachments.is_empty()).then(|| AttachmentList {
        compact: true,
        media: status.media_attachments.clone(),
    });

    Some(ConversationView {
        conversation_id: props.id.clone(),
        classes,
        avatar: AvatarComposite {
            accts: props.accounts.iter().map(|a| a.acct.clone()).collect(),
            size: AVATAR_SIZE,
        },
        unread: props.unread,
        created_at: status.created_at,
        names: NamesRegion {
            template: labels.resolve(MessageKey::With),
            links,
        },
        body: StatusBody {
            spoiler_text: status.spoiler_text.clone(),
            text: status_text(&status.content),
            expanded: !status.hidden,
            collapsible: true,
        },
        attachments,
        reply_title: labels.resolve(MessageKey::Reply),
        menu: MenuAffordance {
            title: labels.resolve(MessageKey::More),
            scroll_key: props.scroll_key.clone(),
            status_id: status.id.clone(),
            items: build_menu(props.unread, status.muted, labels),
        },
    })
}

fn names_line(names: &NamesRegion, base: Style) -> Line<'static> {
    let (prefix, suffix) = split_names_template(&names.template);

    let mut spans = vec![Span::styled(prefix.to_string(), base)];
    for (idx, link) in names.links.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(", ", base));
        }
        for run in &link.display_name {
            match run {
                Inline::Text(text) => spans.push(Span::styled(
                    text.clone(),
                    base.add_modifier(Modifier::BOLD),
                )),
                Inline::Emoji(emoji) => {
                    let mut style = Style::default().fg(Color::Magenta);
                    if emoji.is_animated() {
                        style = style.add_modifier(Modifier::ITALIC | Modifier::SLOW_BLINK);
                    }
                    spans.push(Span::styled(emoji.shortcode.clone(), style));
                }
            }
        }
    }
    spans.push(Span::styled(suffix.to_string(), base));
    Line::from(spans)
}

fn draw_view(
    view: &ConversationView,
    frame: &mut Frame,
    area: Rect,
    selected: bool,
    now: Timestamp,
    tz: &TimeZone,
) -> ItemLayout {
    let mut border_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };
    if view.unread {
        border_style = border_style.add_modifier(Modifier::BOLD);
    }
    let text_style = if view.classes.contains(&"muted") {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(AVATAR_COLUMNS), Constraint::Min(1)])
        .split(inner);
    let (avatar_area, content) = (columns[0], columns[1]);

    let body_lines = view.body.lines(content.width);
    let attachment_rows = view
        .attachments
        .as_ref()
        .map_or(0, |list| list.media.len() as u16);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(body_lines.len() as u16),
            Constraint::Length(attachment_rows),
            Constraint::Length(1),
        ])
        .split(content);

    // Avatar: initials in a 2x2 grid.
    let initials = view.avatar.initials();
    let avatar_lines: Vec<Line> = initials
        .chunks(2)
        .map(|pair| {
            Line::from(Span::styled(
                pair.iter().collect::<String>(),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(avatar_lines), avatar_area);

    // Info row: unread dot + relative time, then the names.
    let relative = timestamp::relative(view.created_at, now, tz);
    let time_text = if view.unread {
        format!("● {} ", relative)
    } else {
        format!("{} ", relative)
    };
    let info = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(time_text.chars().count() as u16),
            Constraint::Min(1),
        ])
        .split(rows[0]);
    let time_style = if view.unread {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(Paragraph::new(Span::styled(time_text, time_style)), info[0]);
    frame.render_widget(Paragraph::new(names_line(&view.names, text_style)), info[1]);

    frame.render_widget(
        Paragraph::new(body_lines).style(text_style),
        rows[1],
    );

    if let Some(list) = &view.attachments {
        let lines: Vec<Line> = list
            .media
            .iter()
            .map(|media| {
                Line::from(vec![
                    Span::styled(
                        format!("{} ", media_glyph(media.kind)),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::styled(media.label().to_string(), Style::default().fg(Color::Gray)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), rows[2]);
    }

    // Action bar: reply on the left, the "more" menu on the right.
    let reply_text = format!("↩ {}", view.reply_title);
    let bar = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(reply_text.chars().count() as u16),
            Constraint::Min(0),
            Constraint::Length(MENU_GLYPH.chars().count() as u16),
        ])
        .split(rows[3]);
    frame.render_widget(
        Paragraph::new(Span::styled(reply_text, Style::default().fg(Color::Gray))),
        bar[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(MENU_GLYPH, Style::default().fg(Color::Gray))),
        bar[2],
    );

    ItemLayout {
        area,
        avatar: avatar_area,
        names: info[1],
        body: rows[1],
        reply: bar[0],
        menu: bar[2],
    }
}
