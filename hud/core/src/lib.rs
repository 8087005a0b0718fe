//! HUD Core - Headless Chat Display and Input for Cobble
//!
//! This crate is the chat half of a classic voxel client's HUD: the
//! scrolling message window, the fixed status and bottom-right rows,
//! client-status lines, the big centred announcement, and the typing
//! console with history, paging, and the special-character overlay. It
//! is completely independent of any rendering backend; the same
//! coordinator drives a GPU client, a terminal preview, or a headless
//! test.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Host                             │
//! │   owns ChatLog + ColorPalette + Events, implements Gfx   │
//! │                                                          │
//! │   ChatLog::push ──► EventBus ──► ChatScreen subscriptions│
//! │   key/char/mouse ─────────────► ChatScreen handle_*      │
//! │   ChatScreen::drain_events ──► SubmitChat / UrlPrompt /  │
//! │                                 SetKeyRepeat             │
//! └──────────────────────────┬───────────────────────────────┘
//!                            │ update / render (Gfx)
//! ┌──────────────────────────┴───────────────────────────────┐
//! │                       ChatScreen                         │
//! │  ┌───────────┐ ┌──────────────┐ ┌──────────┐ ┌────────┐  │
//! │  │TextWindow │ │ ScrollCursor │ │InputLine │ │Overlay │  │
//! │  │ x4 slots  │ │  over log    │ │ console  │ │ picker │  │
//! │  └───────────┘ └──────────────┘ └──────────┘ └────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatScreen`]: the coordinator, driven once per frame
//! - [`ChatLog`]: persistent message state owned by the host
//! - [`Events`]: the broadcast buses connecting the two
//! - [`Gfx`]: the surface trait a backend implements
//! - [`ColorPalette`]: colour escape codes, classic and extended
//! - [`HudConfig`]: on-disk options layered over defaults
//!
//! # Module Overview
//!
//! - [`config`]: options file loading and validation
//! - [`events`]: broadcast buses and event payloads
//! - [`gfx`]: geometry, colours, and the backend trait
//! - [`input`]: the console line editor and its history
//! - [`keys`]: backend-neutral key and mouse model
//! - [`log`]: the persistent chat log and its channels
//! - [`overlay`]: the special-character picker
//! - [`palette`]: colour code table and escape parsing
//! - [`progress`]: texture pack download status rows
//! - [`screen`]: the coordinator itself
//! - [`scroll`]: the cursor over the chat history
//! - [`window`]: fixed-capacity anchored text columns
//!
//! # Headless Discipline
//!
//! Nothing in this crate reads the clock, spawns a thread, or touches a
//! UI framework. Every time-sensitive entry point takes `now` as a
//! parameter, so the ten second chat fade and the five second
//! announcement window are plain assertions in tests rather than
//! sleeps.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod events;
pub mod gfx;
pub mod input;
pub mod keys;
pub mod log;
pub mod overlay;
pub mod palette;
pub mod progress;
pub mod screen;
pub mod scroll;
pub mod window;

#[cfg(test)]
pub(crate) mod testgfx;

// Re-exports for convenience
pub use config::{HudConfig, HudOptions};
pub use events::{ChatPush, ContextEvent, EventBus, Events, Subscription};
pub use gfx::{Anchor, FontKind, Gfx, Rect, Rgba, Size, Texture};
pub use input::InputLine;
pub use keys::{Bindings, Key, MouseButton};
pub use log::{ChatLog, MessageChannel};
pub use palette::ColorPalette;
pub use progress::{Progress, ProgressSource};
pub use screen::{ChatScreen, ScreenEvent};
