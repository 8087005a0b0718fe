//! The upstream chat store.
//!
//! The game owns one [`ChatLog`]; the display coordinator only reads it.
//! Normal chat accumulates forever, while the fixed channels (status,
//! bottom-right, client-status, announcement) each hold a single current
//! line. Filing a message stamps its receipt time and publishes a
//! [`ChatPush`](crate::events::ChatPush), which is how the coordinator
//! hears about it; if the coordinator is mid context loss it drops the
//! push and repopulates from here afterwards, so nothing is ever lost.

use std::rc::Rc;
use std::time::Instant;

use tracing::warn;

use crate::events::{ChatPush, Events};

/// Number of general-purpose status channels (top-right rows 2 to 4).
pub const STATUS_CHANNELS: u8 = 3;

/// Number of bottom-right channels.
pub const BOTTOM_RIGHT_CHANNELS: u8 = 3;

/// Where a message is displayed.
///
/// Fixed channels are numbered from 1, the way servers address them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageChannel {
    /// Scrolling chat history.
    Normal,
    /// Top-right status rows, channels 1 to 3.
    Status(u8),
    /// Bottom-right rows, channels 1 to 3.
    BottomRight(u8),
    /// The large centred line with the five second display window.
    Announcement,
    /// Client-generated state lines above the chat input, from 1.
    ClientStatus(u8),
}

/// One line of chat and when it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Raw text, colour escapes included.
    pub text: String,
    /// Receipt time; drives the recent-chat and announcement windows.
    pub received: Instant,
}

impl ChatLine {
    fn new(text: String, received: Instant) -> Self {
        Self { text, received }
    }
}

/// Persistent chat state, owned by the game host.
pub struct ChatLog {
    events: Rc<Events>,
    log: Vec<ChatLine>,
    status: [Option<ChatLine>; STATUS_CHANNELS as usize],
    bottom_right: [Option<ChatLine>; BOTTOM_RIGHT_CHANNELS as usize],
    client_status: Vec<Option<ChatLine>>,
    announcement: Option<ChatLine>,
}

impl ChatLog {
    /// Creates an empty log publishing on `events`, with room for
    /// `client_status_slots` client-status channels.
    pub fn new(events: Rc<Events>, client_status_slots: usize) -> Self {
        Self {
            events,
            log: Vec::new(),
            status: Default::default(),
            bottom_right: Default::default(),
            client_status: vec![None; client_status_slots],
            announcement: None,
        }
    }

    /// Files a message under a channel, stamping `now` as its receipt
    /// time, and publishes it to subscribers.
    ///
    /// On a fixed channel, empty text clears the current line (the clear
    /// is still published). A channel number out of range is logged and
    /// dropped without publishing.
    pub fn push(&mut self, text: impl Into<String>, channel: MessageChannel, now: Instant) {
        let text = text.into();
        match channel {
            MessageChannel::Normal => {
                self.log.push(ChatLine::new(text.clone(), now));
            }
            MessageChannel::Status(n) => {
                let Some(cell) = checked_cell(&mut self.status, n) else {
                    warn!(channel = n, "status channel out of range");
                    return;
                };
                *cell = non_empty(&text).map(|t| ChatLine::new(t, now));
            }
            MessageChannel::BottomRight(n) => {
                let Some(cell) = checked_cell(&mut self.bottom_right, n) else {
                    warn!(channel = n, "bottom-right channel out of range");
                    return;
                };
                *cell = non_empty(&text).map(|t| ChatLine::new(t, now));
            }
            MessageChannel::Announcement => {
                self.announcement = non_empty(&text).map(|t| ChatLine::new(t, now));
            }
            MessageChannel::ClientStatus(n) => {
                let Some(cell) = checked_cell(&mut self.client_status, n) else {
                    warn!(channel = n, "client-status channel out of range");
                    return;
                };
                *cell = non_empty(&text).map(|t| ChatLine::new(t, now));
            }
        }
        self.events.chat.publish(ChatPush { text, channel });
    }

    /// Number of normal chat lines filed so far.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether no normal chat has been filed.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// A normal chat line by log index. Negative and past-the-end
    /// indices read as absent, which scroll maths leans on.
    pub fn normal(&self, index: i32) -> Option<&ChatLine> {
        let index = usize::try_from(index).ok()?;
        self.log.get(index)
    }

    /// The current line of a status channel (1-based).
    pub fn status(&self, channel: u8) -> Option<&ChatLine> {
        checked_line(&self.status, channel)
    }

    /// The current line of a bottom-right channel (1-based).
    pub fn bottom_right(&self, channel: u8) -> Option<&ChatLine> {
        checked_line(&self.bottom_right, channel)
    }

    /// The current line of a client-status channel (1-based).
    pub fn client_status(&self, channel: u8) -> Option<&ChatLine> {
        checked_line(&self.client_status, channel)
    }

    /// Number of client-status channels this log was built with.
    pub fn client_status_slots(&self) -> usize {
        self.client_status.len()
    }

    /// The current announcement, if one has been filed.
    pub fn announcement(&self) -> Option<&ChatLine> {
        self.announcement.as_ref()
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn checked_cell<'a>(
    cells: &'a mut [Option<ChatLine>],
    channel: u8,
) -> Option<&'a mut Option<ChatLine>> {
    let index = usize::from(channel.checked_sub(1)?);
    cells.get_mut(index)
}

fn checked_line(cells: &[Option<ChatLine>], channel: u8) -> Option<&ChatLine> {
    let index = usize::from(channel.checked_sub(1)?);
    cells.get(index)?.as_ref()
}
