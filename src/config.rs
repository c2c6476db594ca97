use crate::i18n::Labels;
use crate::ui::hotkeys::{HotkeyAction, KeyBinding, Keymap};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    /// Message id -> text, e.g. `"conversation.open" = "Open"`.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Play animated custom emoji without hovering.
    #[serde(default)]
    pub autoplay: bool,
    /// Conversations file used when none is given on the command line.
    #[serde(default)]
    pub conversations: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            autoplay: false,
            conversations: None,
        }
    }
}

fn default_title() -> String {
    "Direct messages".to_string()
}

/// Key overrides. An action left out keeps its default keys; an empty list
/// unbinds it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeysConfig {
    pub reply: Option<Vec<String>>,
    pub open: Option<Vec<String>>,
    pub move_up: Option<Vec<String>>,
    pub move_down: Option<Vec<String>>,
    pub toggle_hidden: Option<Vec<String>>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dmtui").join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads `path`, or the default location when `path` is `None`. A
    /// missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn keymap(&self) -> Result<Keymap> {
        let mut keymap = Keymap::default();
        let overrides = [
            (HotkeyAction::Reply, &self.keys.reply),
            (HotkeyAction::Open, &self.keys.open),
            (HotkeyAction::MoveUp, &self.keys.move_up),
            (HotkeyAction::MoveDown, &self.keys.move_down),
            (HotkeyAction::ToggleHidden, &self.keys.toggle_hidden),
        ];

        for (action, keys) in overrides {
            let Some(keys) = keys else {
                continue;
            };
            keymap.clear(action);
            for key in keys {
                let binding = KeyBinding::parse(key)
                    .with_context(|| format!("Invalid key binding for {}: `{}`", action, key))?;
                keymap.bind(binding, action);
            }
        }

        Ok(keymap)
    }

    pub fn labels(&self) -> Labels {
        let (labels, unknown) = Labels::with_overrides(&self.labels);
        for id in unknown {
            warn!("ignoring unknown label id `{}` in config", id);
        }
        labels
    }
}
