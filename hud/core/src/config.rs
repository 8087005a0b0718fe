//! Overlay options and the on-disk config file.
//!
//! The coordinator itself consumes a plain [`HudOptions`]; hosts that
//! want a config file load [`HudConfig`] from
//! `~/.config/cobble/hud.toml` and merge it over the defaults. Every
//! field is optional, a missing file is not an error, and layout fields
//! exist so the terminal binding can swap the pixel-unit defaults for
//! cell-friendly ones.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Widest chat window the layout supports.
pub const MAX_CHAT_LINES: usize = 30;

/// Most client-status channels a log may be built with.
pub const MAX_CLIENT_STATUS_SLOTS: usize = 8;

/// Errors from loading or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config from {path}: {source}")]
    ReadError {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is outside its legal range.
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Runtime options for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudOptions {
    /// Capacity of the normal chat window. Zero hides chat entirely.
    pub chat_lines: usize,
    /// Whether clicking a chat line pastes it into the console.
    pub clickable_chat: bool,
    /// Number of client-status channels.
    pub client_status_slots: usize,
    /// Inset of anchored windows from the screen edges.
    pub edge_margin: i32,
    /// Base height of the chat stack above the bottom edge.
    pub bottom_offset: i32,
    /// Inset of the input console from the bottom-left corner.
    pub input_margin: i32,
    /// Vertical space reserved above the open console.
    pub input_gap: i32,
    /// Padding of the backdrop quad around the chat text.
    pub background_pad: u16,
}

impl Default for HudOptions {
    fn default() -> Self {
        Self {
            chat_lines: 12,
            clickable_chat: true,
            client_status_slots: 3,
            edge_margin: 5,
            bottom_offset: 15,
            input_margin: 5,
            input_gap: 20,
            background_pad: 5,
        }
    }
}

/// The `[chat]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    /// Overrides [`HudOptions::chat_lines`].
    pub lines: Option<usize>,
    /// Overrides [`HudOptions::clickable_chat`].
    pub clickable: Option<bool>,
    /// Overrides [`HudOptions::client_status_slots`].
    pub client_status_slots: Option<usize>,
}

/// The `[layout]` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    /// Overrides [`HudOptions::edge_margin`].
    pub edge_margin: Option<i32>,
    /// Overrides [`HudOptions::bottom_offset`].
    pub bottom_offset: Option<i32>,
    /// Overrides [`HudOptions::input_margin`].
    pub input_margin: Option<i32>,
    /// Overrides [`HudOptions::input_gap`].
    pub input_gap: Option<i32>,
    /// Overrides [`HudOptions::background_pad`].
    pub background_pad: Option<u16>,
}

/// The parsed config file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    /// Chat behaviour.
    pub chat: ChatSection,
    /// Spacing overrides.
    pub layout: LayoutSection,
}

impl HudConfig {
    /// Loads from the default XDG location. A missing file yields the
    /// defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads and validates a specific file. A missing file yields the
    /// defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The XDG path this config lives at, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cobble").join("hud.toml"))
    }

    /// Merges the file over `base`, keeping `base` for absent fields.
    pub fn apply(self, base: HudOptions) -> HudOptions {
        HudOptions {
            chat_lines: self.chat.lines.unwrap_or(base.chat_lines),
            clickable_chat: self.chat.clickable.unwrap_or(base.clickable_chat),
            client_status_slots: self
                .chat
                .client_status_slots
                .unwrap_or(base.client_status_slots),
            edge_margin: self.layout.edge_margin.unwrap_or(base.edge_margin),
            bottom_offset: self.layout.bottom_offset.unwrap_or(base.bottom_offset),
            input_margin: self.layout.input_margin.unwrap_or(base.input_margin),
            input_gap: self.layout.input_gap.unwrap_or(base.input_gap),
            background_pad: self.layout.background_pad.unwrap_or(base.background_pad),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(lines) = self.chat.lines {
            if lines > MAX_CHAT_LINES {
                return Err(ConfigError::ValidationError(format!(
                    "chat.lines must be at most {MAX_CHAT_LINES}, got {lines}"
                )));
            }
        }
        if let Some(slots) = self.chat.client_status_slots {
            if slots == 0 || slots > MAX_CLIENT_STATUS_SLOTS {
                return Err(ConfigError::ValidationError(format!(
                    "chat.client_status_slots must be 1 to {MAX_CLIENT_STATUS_SLOTS}, got {slots}"
                )));
            }
        }
        Ok(())
    }
}
