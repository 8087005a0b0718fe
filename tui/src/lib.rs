//! Terminal preview client for the cobble chat overlay.
//!
//! Binds the headless coordinator in `hud-core` to a ratatui terminal:
//! crossterm events come in through `keymap`, styled cell rows go out
//! through `gfx`, and `feed` stands in for the server. `app` wires the
//! pieces together and owns the event loop.

pub mod app;
pub mod feed;
pub mod gfx;
pub mod keymap;

pub use app::App;
