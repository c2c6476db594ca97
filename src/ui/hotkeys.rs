//! Keyboard shortcuts for conversation items.
//!
//! A [`Keymap`] maps key presses to named [`HotkeyAction`]s. Only one item
//! (the focused one) has its bindings live at a time: it registers a scope
//! with the [`HotkeyRegistry`] and receives a [`HotkeyRegistration`] guard.
//! Dropping the guard releases the scope, so bindings never outlive the
//! item that owns them.

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    Reply,
    Open,
    MoveUp,
    MoveDown,
    ToggleHidden,
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HotkeyAction::Reply => "reply",
            HotkeyAction::Open => "open",
            HotkeyAction::MoveUp => "moveUp",
            HotkeyAction::MoveDown => "moveDown",
            HotkeyAction::ToggleHidden => "toggleHidden",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Parses strings like `"x"`, `"enter"`, `"up"`, `"ctrl+r"`.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            bail!("empty key binding");
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut parts: Vec<&str> = spec.split('+').collect();
        // A lone "+" (or a trailing "ctrl++") names the plus key itself.
        let key = if spec.ends_with("++") || spec == "+" {
            parts.truncate(parts.len().saturating_sub(2));
            "+"
        } else {
            parts.pop().unwrap_or_default()
        };

        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "meta" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                other => bail!("unknown modifier `{}` in `{}`", other, spec),
            }
        }

        let code = match key.to_ascii_lowercase().as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "tab" => KeyCode::Tab,
            "space" => KeyCode::Char(' '),
            "backspace" => KeyCode::Backspace,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => bail!("unknown key `{}` in `{}`", key, spec),
                }
            }
        };

        Ok(Self::new(code, modifiers))
    }

    /// Whether a terminal key event triggers this binding. Shift is implied
    /// by the character itself, so it is ignored for character keys.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        match (self.code, event.code) {
            (KeyCode::Char(a), KeyCode::Char(b)) => {
                let strip = |m: KeyModifiers| m - KeyModifiers::SHIFT;
                a == b && strip(self.modifiers) == strip(event.modifiers)
            }
            (a, b) => a == b && self.modifiers == event.modifiers,
        }
    }
}

/// Table of key bindings to actions. Several keys may share an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<(KeyBinding, HotkeyAction)>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        keymap.bind(KeyBinding::plain(KeyCode::Char('r')), HotkeyAction::Reply);
        keymap.bind(KeyBinding::plain(KeyCode::Char('o')), HotkeyAction::Open);
        keymap.bind(KeyBinding::plain(KeyCode::Enter), HotkeyAction::Open);
        keymap.bind(KeyBinding::plain(KeyCode::Char('k')), HotkeyAction::MoveUp);
        keymap.bind(KeyBinding::plain(KeyCode::Up), HotkeyAction::MoveUp);
        keymap.bind(KeyBinding::plain(KeyCode::Char('j')), HotkeyAction::MoveDown);
        keymap.bind(KeyBinding::plain(KeyCode::Down), HotkeyAction::MoveDown);
        keymap.bind(
            KeyBinding::plain(KeyCode::Char('x')),
            HotkeyAction::ToggleHidden,
        );
        keymap
    }
}

impl Keymap {
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn bind(&mut self, binding: KeyBinding, action: HotkeyAction) {
        self.bindings.retain(|(existing, _)| *existing != binding);
        self.bindings.push((binding, action));
    }

    /// Drops every binding for `action`.
    pub fn clear(&mut self, action: HotkeyAction) {
        self.bindings.retain(|(_, bound)| *bound != action);
    }

    pub fn lookup(&self, event: &KeyEvent) -> Option<HotkeyAction> {
        self.bindings
            .iter()
            .find(|(binding, _)| binding.matches(event))
            .map(|(_, action)| *action)
    }
}

#[derive(Debug)]
struct ActiveScope {
    token: u64,
    conversation_id: String,
    keymap: Rc<Keymap>,
}

#[derive(Debug, Default)]
struct RegistryState {
    active: Option<ActiveScope>,
    next_token: u64,
}

/// Hotkey routing for a list of conversation items. Single-threaded: lives
/// on the UI thread alongside the items.
#[derive(Debug, Clone, Default)]
pub struct HotkeyRegistry {
    state: Rc<RefCell<RegistryState>>,
}

/// A key press resolved to the item that owns the live bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedHotkey {
    pub conversation_id: String,
    pub action: HotkeyAction,
}

impl HotkeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `keymap` the live bindings for `conversation_id`, replacing any
    /// previous scope. The scope lasts until the returned guard is dropped.
    pub fn register(&self, conversation_id: &str, keymap: Rc<Keymap>) -> HotkeyRegistration {
        let mut state = self.state.borrow_mut();
        state.next_token += 1;
        let token = state.next_token;
        if let Some(previous) = state.active.replace(ActiveScope {
            token,
            conversation_id: conversation_id.to_string(),
            keymap,
        }) {
            debug!(
                "hotkey scope for {} replaced by {}",
                previous.conversation_id, conversation_id
            );
        }
        debug!("registered hotkeys for conversation {}", conversation_id);

        HotkeyRegistration {
            registry: Rc::downgrade(&self.state),
            token,
        }
    }

    pub fn active_scope(&self) -> Option<String> {
        self.state
            .borrow()
            .active
            .as_ref()
            .map(|scope| scope.conversation_id.clone())
    }

    pub fn route(&self, event: &KeyEvent) -> Option<RoutedHotkey> {
        let state = self.state.borrow();
        let scope = state.active.as_ref()?;
        let action = scope.keymap.lookup(event)?;
        Some(RoutedHotkey {
            conversation_id: scope.conversation_id.clone(),
            action,
        })
    }
}

/// Keeps one item's bindings live; releases them on drop.
#[derive(Debug)]
pub struct HotkeyRegistration {
    registry: Weak<RefCell<RegistryState>>,
    token: u64,
}

impl Drop for HotkeyRegistration {
    fn drop(&mut self) {
        let Some(state) = self.registry.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        // A newer registration may already have taken over the scope.
        if state.active.as_ref().map(|scope| scope.token) == Some(self.token) {
            if let Some(scope) = state.active.take() {
                debug!("released hotkeys for conversation {}", scope.conversation_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_default_keymap() {
        let keymap = Keymap::default();
        assert_eq!(keymap.lookup(&key(KeyCode::Char('r'))), Some(HotkeyAction::Reply));
        assert_eq!(keymap.lookup(&key(KeyCode::Enter)), Some(HotkeyAction::Open));
        assert_eq!(keymap.lookup(&key(KeyCode::Char('o'))), Some(HotkeyAction::Open));
        assert_eq!(keymap.lookup(&key(KeyCode::Up)), Some(HotkeyAction::MoveUp));
        assert_eq!(keymap.lookup(&key(KeyCode::Char('j'))), Some(HotkeyAction::MoveDown));
        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('x'))),
            Some(HotkeyAction::ToggleHidden)
        );
        assert_eq!(keymap.lookup(&key(KeyCode::Char('q'))), None);
    }

    #[test]
    fn test_parse_bindings() {
        assert_eq!(
            KeyBinding::parse("x").unwrap(),
            KeyBinding::plain(KeyCode::Char('x'))
        );
        assert_eq!(
            KeyBinding::parse("Enter").unwrap(),
            KeyBinding::plain(KeyCode::Enter)
        );
        assert_eq!(
            KeyBinding::parse("ctrl+r").unwrap(),
            KeyBinding::new(KeyCode::Char('r'), KeyModifiers::CONTROL)
        );
        assert_eq!(
            KeyBinding::parse("ctrl++").unwrap(),
            KeyBinding::new(KeyCode::Char('+'), KeyModifiers::CONTROL)
        );
        assert!(KeyBinding::parse("").is_err());
        assert!(KeyBinding::parse("hyper+x").is_err());
        assert!(KeyBinding::parse("banana").is_err());
    }

    #[test]
    fn test_shift_ignored_for_characters() {
        let binding = KeyBinding::plain(KeyCode::Char('R'));
        assert!(binding.matches(&KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT)));

        let ctrl = KeyBinding::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert!(!ctrl.matches(&key(KeyCode::Char('r'))));
        assert!(ctrl.matches(&KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_rebinding_replaces_previous_action() {
        let mut keymap = Keymap::default();
        keymap.clear(HotkeyAction::Reply);
        keymap.bind(KeyBinding::plain(KeyCode::Char('x')), HotkeyAction::Reply);
        assert_eq!(keymap.lookup(&key(KeyCode::Char('r'))), None);
        assert_eq!(keymap.lookup(&key(KeyCode::Char('x'))), Some(HotkeyAction::Reply));
    }

    #[test]
    fn test_routing_requires_live_registration() {
        let registry = HotkeyRegistry::new();
        assert!(registry.route(&key(KeyCode::Char('r'))).is_none());

        let registration = registry.register("42", Rc::new(Keymap::default()));
        assert_eq!(
            registry.route(&key(KeyCode::Char('j'))),
            Some(RoutedHotkey {
                conversation_id: "42".to_string(),
                action: HotkeyAction::MoveDown,
            })
        );

        drop(registration);
        assert!(registry.route(&key(KeyCode::Char('j'))).is_none());
        assert_eq!(registry.active_scope(), None);
    }

    #[test]
    fn test_stale_guard_does_not_release_newer_scope() {
        let registry = HotkeyRegistry::new();
        let keymap = Rc::new(Keymap::default());

        let first = registry.register("1", keymap.clone());
        let second = registry.register("2", keymap);
        drop(first);
        assert_eq!(registry.active_scope(), Some("2".to_string()));

        drop(second);
        assert_eq!(registry.active_scope(), None);
    }
}
