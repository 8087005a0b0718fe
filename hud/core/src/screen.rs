//! The chat screen coordinator.
//!
//! One [`ChatScreen`] owns everything the player sees of chat: the four
//! text windows, the scroll cursor over the persistent log, the input
//! console with its special-character overlay, the announcement line,
//! and the lifecycle glue that survives graphics context loss.
//!
//! # Design
//!
//! The screen is a frame-driven state machine. The host calls
//! [`ChatScreen::update`] once per frame to drain event subscriptions
//! and route messages, then [`ChatScreen::render`] to draw; input
//! arrives through the `handle_*` methods between frames. Nothing here
//! blocks, spawns, or reads the clock: time comes in as parameters,
//! which keeps every timer testable.
//!
//! Anything the screen wants *from* the host (submitting a typed line,
//! prompting before a URL opens, holding key repeat) goes out through
//! [`ScreenEvent`]s drained by the host, never through callbacks.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::HudOptions;
use crate::events::{ChatPush, ContextEvent, Events, Subscription};
use crate::gfx::{anchored, Anchor, FontKind, Gfx, Rect, Rgba, Size, Texture};
use crate::input::{InputLine, CHARS_PER_ROW};
use crate::keys::{Bindings, Key, MouseButton};
use crate::log::{ChatLog, MessageChannel, BOTTOM_RIGHT_CHANNELS, STATUS_CHANNELS};
use crate::overlay::{CharOverlay, OverlayAction};
use crate::palette::ColorPalette;
use crate::progress::{FetchStatus, ProgressSource};
use crate::scroll::ScrollCursor;
use crate::window::{Growth, TextWindow};

/// How long a chat line stays visible after receipt in passive mode.
pub const RECENT_WINDOW: Duration = Duration::from_secs(10);

/// How long the announcement stays up.
pub const ANNOUNCEMENT_WINDOW: Duration = Duration::from_secs(5);

// Status window layout: two reserved rows, then the three channels.
const STATUS_ROWS: usize = 2 + STATUS_CHANNELS as usize;
const DOWNLOAD_ROW: usize = 1;

const CHAT_BACKGROUND: Rgba = Rgba::new(0, 0, 0, 127);

/// A request from the coordinator to its host, drained per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    /// The player submitted a line; send it upstream.
    SubmitChat(String),
    /// A URL in chat was clicked; confirm before opening it.
    OpenUrlPrompt(String),
    /// The console wants key repeat on or off while it is open.
    SetKeyRepeat(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Ready,
    ContextLost,
}

/// The display-and-input coordinator.
pub struct ChatScreen {
    options: HudOptions,
    bindings: Bindings,
    log: Rc<RefCell<ChatLog>>,
    palette: Rc<RefCell<ColorPalette>>,

    chat_events: Subscription<ChatPush>,
    font_events: Subscription<()>,
    color_events: Subscription<char>,
    context_events: Subscription<ContextEvent>,

    status: TextWindow,
    bottom_right: TextWindow,
    normal_chat: TextWindow,
    client_status: TextWindow,
    announcement_texture: Option<Texture>,
    input: InputLine,
    overlay: CharOverlay,
    cursor: ScrollCursor,

    state: Lifecycle,
    active: bool,
    suppress_next_press: bool,
    preserved_input: Option<String>,
    seen_count: usize,
    wheel_accum: f32,
    stack_key: (i32, u16),
    line_height: u16,
    screen_size: Size,
    fetch: FetchStatus,
    progress: Option<Box<dyn ProgressSource>>,
    out: Vec<ScreenEvent>,
}

impl ChatScreen {
    /// Builds the screen and registers its event subscriptions. Call
    /// [`ChatScreen::init`] before the first frame.
    pub fn new(
        options: HudOptions,
        bindings: Bindings,
        log: Rc<RefCell<ChatLog>>,
        palette: Rc<RefCell<ColorPalette>>,
        events: &Events,
    ) -> Self {
        let margin = options.edge_margin;
        let bottom = options.bottom_offset;

        let mut status = TextWindow::new(
            STATUS_ROWS,
            FontKind::Chat,
            Growth::Downward,
            Anchor::Max,
            Anchor::Min,
            margin,
            margin,
        );
        // The reserved rows collapse while empty instead of leaving a
        // hole above the status channels.
        status.set_placeholder(0, false);
        status.set_placeholder(1, false);

        let bottom_right = TextWindow::new(
            BOTTOM_RIGHT_CHANNELS as usize,
            FontKind::Chat,
            Growth::Upward,
            Anchor::Max,
            Anchor::Max,
            margin,
            bottom,
        );
        let normal_chat = TextWindow::new(
            options.chat_lines,
            FontKind::Chat,
            Growth::Upward,
            Anchor::Min,
            Anchor::Max,
            margin,
            bottom,
        );
        let client_status = TextWindow::new(
            options.client_status_slots,
            FontKind::Chat,
            Growth::Upward,
            Anchor::Min,
            Anchor::Max,
            margin,
            bottom,
        );

        Self {
            cursor: ScrollCursor::new(options.chat_lines),
            options,
            bindings,
            log,
            palette,
            chat_events: events.chat.subscribe(),
            font_events: events.font_changed.subscribe(),
            color_events: events.color_code_changed.subscribe(),
            context_events: events.context.subscribe(),
            status,
            bottom_right,
            normal_chat,
            client_status,
            announcement_texture: None,
            input: InputLine::new(),
            overlay: CharOverlay::new(),
            state: Lifecycle::Uninitialized,
            active: false,
            suppress_next_press: false,
            preserved_input: None,
            seen_count: 0,
            wheel_accum: 0.0,
            stack_key: (0, 0),
            line_height: 0,
            screen_size: Size::default(),
            fetch: FetchStatus::new(),
            progress: None,
            out: Vec::new(),
        }
    }

    /// Seeds the display from the log and marks the screen ready.
    pub fn init(&mut self, screen: Size) {
        self.screen_size = screen;
        self.state = Lifecycle::Ready;
        self.seed_from_log();
        debug!(
            chat_lines = self.options.chat_lines,
            "chat screen initialised"
        );
    }

    /// Whether the console is open and capturing input.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Installs the download status source polled each frame.
    pub fn set_progress_source(&mut self, source: Box<dyn ProgressSource>) {
        self.progress = Some(source);
    }

    /// Takes the requests queued for the host since the last drain.
    pub fn drain_events(&mut self) -> Vec<ScreenEvent> {
        std::mem::take(&mut self.out)
    }

    // ===== Per-frame driving =====

    /// Drains subscriptions, routes messages, and polls the downloader.
    /// Routing is deferred while the context is lost; the reseed on
    /// recreation picks the messages up from the log instead.
    pub fn update<G: Gfx>(&mut self, gfx: &G) {
        if self.state == Lifecycle::Uninitialized {
            return;
        }

        let transitions: Vec<ContextEvent> = self.context_events.drain().collect();
        for event in transitions {
            match event {
                ContextEvent::Lost => self.on_context_lost(),
                ContextEvent::Recreated => self.on_context_recreated(),
            }
        }

        if gfx.context_lost() {
            let deferred = self.chat_events.drain().count();
            let _ = self.color_events.drain().count();
            let _ = self.font_events.drain().count();
            if deferred > 0 {
                debug!(deferred, "context lost, deferring chat to the reseed");
            }
        } else {
            let codes: Vec<char> = self.color_events.drain().collect();
            for code in codes {
                self.on_color_code_changed(code);
            }
            if self.font_events.drain().count() > 0 {
                self.on_font_changed();
            }
            let pushes: Vec<ChatPush> = self.chat_events.drain().collect();
            for push in pushes {
                self.route(push);
            }
        }

        self.poll_download();
    }

    /// Draws one frame. Does nothing while the context is lost.
    pub fn render<G: Gfx>(&mut self, gfx: &mut G, now: Instant) {
        if self.state != Lifecycle::Ready || gfx.context_lost() {
            return;
        }
        self.line_height = gfx.line_height(FontKind::Chat);
        let screen = self.screen_size;

        self.status.prepare(gfx, screen);
        self.status.render(gfx);
        self.bottom_right.prepare(gfx, screen);
        self.bottom_right.render(gfx);

        if self.active {
            self.input.prepare(gfx);
        }
        // Client-status rasterises before the restack so its height is
        // current when chat stacks on top of it.
        self.client_status.prepare(gfx, screen);
        self.update_chat_y_offset(false);
        self.client_status.render(gfx);

        self.normal_chat.prepare(gfx, screen);
        if self.active {
            self.render_chat_background(gfx);
            self.normal_chat.render(gfx);
        } else {
            self.render_recent(gfx, now);
        }

        self.render_announcement(gfx, now);

        if self.active {
            let rect = self.input_rect();
            gfx.fill_rect(rect.expanded(self.options.background_pad), CHAT_BACKGROUND);
            self.input.render(gfx, rect.x, rect.y);
            if self.overlay.is_open() {
                // Lay out once to learn the size, then place above the
                // console.
                self.overlay.prepare(gfx, rect.x, 0);
                let overlay_y = rect.y
                    - i32::from(self.options.background_pad)
                    - i32::from(self.overlay.bounds().height);
                self.overlay.prepare(gfx, rect.x, overlay_y);
                self.overlay.render(gfx);
            }
        }
    }

    /// Repositions every widget for a new screen size. Textures are
    /// kept; nothing re-rasterises.
    pub fn resize(&mut self, screen: Size) {
        self.screen_size = screen;
        self.status.reposition(screen);
        self.bottom_right.reposition(screen);
        self.client_status.reposition(screen);
        self.normal_chat.reposition(screen);
        debug!(
            width = screen.width,
            height = screen.height,
            "repositioned for resize"
        );
    }

    // ===== Input handling =====

    /// Feeds a key press. Returns whether it was consumed.
    pub fn handle_key_down(&mut self, key: Key) -> bool {
        if self.state == Lifecycle::Uninitialized {
            return false;
        }
        if !self.active {
            if key == self.bindings.open_chat {
                self.open_input("");
                return true;
            }
            if key == Key::Char('/') {
                self.open_input("/");
                return true;
            }
            return false;
        }

        // A character event is always preceded by its key-down, so the
        // one-shot suppression can only ever eat the opening keystroke.
        self.suppress_next_press = false;

        if key == self.bindings.send_chat || key == Key::KeypadEnter {
            self.submit();
            return true;
        }
        if key == self.bindings.cancel {
            self.cancel();
            return true;
        }

        match key {
            Key::PageUp => self.scroll_history(-to_i32(self.normal_chat.capacity())),
            Key::PageDown => self.scroll_history(to_i32(self.normal_chat.capacity())),
            Key::Up => self.input.history_prev(),
            Key::Down => self.input.history_next(),
            Key::Left => self.input.move_left(),
            Key::Right => self.input.move_right(),
            Key::Home => self.input.move_home(),
            Key::End => self.input.move_end(),
            Key::Backspace => self.input.backspace(),
            Key::Delete => self.input.delete(),
            _ => {}
        }

        // Function keys fall through to client-level binds even with
        // the console open.
        !key.is_function()
    }

    /// Feeds a key release. Only the overlay toggle acts on release, so
    /// holding the bind does not flap the picker.
    pub fn handle_key_up(&mut self, key: Key) -> bool {
        if self.active && key == self.bindings.toggle_overlay {
            self.overlay.toggle();
            if self.overlay.is_open() {
                self.overlay.set_palette(&self.palette.borrow());
            }
            self.update_chat_y_offset(true);
            return true;
        }
        false
    }

    /// Feeds a typed character. Returns whether it was consumed.
    pub fn handle_char(&mut self, ch: char) -> bool {
        if !self.active {
            return false;
        }
        if self.suppress_next_press {
            self.suppress_next_press = false;
            return true;
        }
        if ch.is_control() {
            return false;
        }
        self.input.insert_char(ch);
        true
    }

    /// Feeds pasted text into the console.
    pub fn handle_paste(&mut self, text: &str) -> bool {
        if !self.active {
            return false;
        }
        let cleaned: String = text.chars().filter(|c| !c.is_control()).collect();
        self.input.append(&cleaned);
        true
    }

    /// Feeds a mouse wheel movement. Fractional deltas accumulate and
    /// whole steps scroll the history, wheel-up going back in time.
    pub fn handle_mouse_scroll(&mut self, delta: f32) -> bool {
        if !self.active {
            return false;
        }
        self.wheel_accum += delta;
        let steps = self.wheel_accum.trunc();
        self.wheel_accum -= steps;
        #[allow(clippy::cast_possible_truncation)]
        let steps = steps as i32;
        if steps != 0 {
            self.scroll_history(-steps);
        }
        true
    }

    /// Feeds a mouse press. Resolves overlay cells, chat lines (URL
    /// prompt or click-to-insert), and caret placement in the console.
    pub fn handle_mouse_down<G: Gfx>(
        &mut self,
        gfx: &G,
        button: MouseButton,
        x: i32,
        y: i32,
    ) -> bool {
        if !self.active || button != MouseButton::Left {
            return false;
        }
        if let Some(action) = self.overlay.click(x, y) {
            if let OverlayAction::Insert(text) = action {
                self.input.append(&text);
            }
            return true;
        }
        if let Some((index, _)) = self.normal_chat.line_at(x, y) {
            self.chat_click(gfx, index, x);
            return true;
        }
        if self.input_rect().contains(x, y) {
            self.click_input(gfx, x, y);
            return true;
        }
        false
    }

    // ===== Message routing =====

    fn route(&mut self, push: ChatPush) {
        match push.channel {
            MessageChannel::Normal => {
                let pinned = self.cursor.is_pinned(self.seen_count);
                self.seen_count += 1;
                if pinned {
                    self.cursor.advance();
                    self.normal_chat.push_up(&push.text);
                } else {
                    debug!("scrolled back, new line held out of view");
                }
            }
            MessageChannel::Status(n) => match status_slot(n) {
                Some(slot) => self.status.set_slot(slot, &push.text),
                None => warn!(channel = n, "unroutable status channel"),
            },
            MessageChannel::BottomRight(n) => match bottom_right_slot(n) {
                Some(slot) => self.bottom_right.set_slot(slot, &push.text),
                None => warn!(channel = n, "unroutable bottom-right channel"),
            },
            MessageChannel::Announcement => {
                self.announcement_texture = None;
            }
            MessageChannel::ClientStatus(n) => {
                let slot = usize::from(n).wrapping_sub(1);
                if slot < self.client_status.capacity() {
                    self.client_status.set_slot(slot, &push.text);
                    // Visibility feeds the stack height immediately.
                    self.update_chat_y_offset(true);
                } else {
                    warn!(channel = n, "unroutable client-status channel");
                }
            }
        }
    }

    fn poll_download(&mut self) {
        let Some(source) = self.progress.as_mut() else {
            return;
        };
        let polled = source.poll();
        if let Some(row) = self.fetch.row_update(polled) {
            self.status.set_slot(DOWNLOAD_ROW, &row);
        }
    }

    // ===== Lifecycle =====

    fn on_context_lost(&mut self) {
        if self.state == Lifecycle::ContextLost {
            return;
        }
        self.preserved_input = self.active.then(|| self.input.text().to_string());
        self.state = Lifecycle::ContextLost;
        debug!(
            preserved = self.preserved_input.is_some(),
            "graphics context lost"
        );

        self.status.invalidate_all();
        self.bottom_right.invalidate_all();
        self.normal_chat.invalidate_all();
        self.client_status.invalidate_all();
        self.announcement_texture = None;
        self.input.invalidate();
        self.overlay.invalidate();
    }

    fn on_context_recreated(&mut self) {
        if self.state != Lifecycle::ContextLost {
            warn!("context recreated without a loss, reseeding anyway");
        }
        self.state = Lifecycle::Ready;
        debug!("graphics context recreated");
        self.seed_from_log();
    }

    fn on_font_changed(&mut self) {
        debug!("chat font changed, re-rasterising");
        self.status.invalidate_all();
        self.bottom_right.invalidate_all();
        self.normal_chat.invalidate_all();
        self.client_status.invalidate_all();
        self.announcement_texture = None;
        self.input.invalidate();
        self.overlay.invalidate();
        self.update_chat_y_offset(true);
    }

    fn on_color_code_changed(&mut self, code: char) {
        debug!(code = %code, "colour code redefined");
        self.status.invalidate_matching(code);
        self.bottom_right.invalidate_matching(code);
        self.normal_chat.invalidate_matching(code);
        self.client_status.invalidate_matching(code);

        let needle = format!("&{code}");
        let announcement_hit = self
            .log
            .borrow()
            .announcement()
            .is_some_and(|line| line.text.contains(&needle));
        if announcement_hit {
            self.announcement_texture = None;
        }

        // The console may contain the escape, and the overlay's Colours
        // section lists live codes.
        self.input.invalidate();
        self.overlay.set_palette(&self.palette.borrow());
        self.overlay.invalidate();
    }

    /// Rebuilds every window from the log: the one true repopulation
    /// path, shared by init and context recreation.
    fn seed_from_log(&mut self) {
        // Anything still queued is already in the log we are about to
        // read.
        let flushed = self.chat_events.drain().count();
        if flushed > 0 {
            debug!(flushed, "flushed queued chat covered by the reseed");
        }
        let _ = self.color_events.drain().count();
        let _ = self.font_events.drain().count();

        let count = self.log.borrow().len();
        self.seen_count = count;
        self.cursor.jump_to_tail(count);
        self.reset_window();

        {
            let log = self.log.borrow();
            for n in 1..=STATUS_CHANNELS {
                if let Some(slot) = status_slot(n) {
                    let text = log.status(n).map_or("", |line| line.text.as_str());
                    self.status.set_slot(slot, text);
                }
            }
            for n in 1..=BOTTOM_RIGHT_CHANNELS {
                if let Some(slot) = bottom_right_slot(n) {
                    let text = log.bottom_right(n).map_or("", |line| line.text.as_str());
                    self.bottom_right.set_slot(slot, text);
                }
            }
            for slot in 0..self.client_status.capacity() {
                #[allow(clippy::cast_possible_truncation)]
                let n = (slot + 1) as u8;
                let text = log.client_status(n).map_or("", |line| line.text.as_str());
                self.client_status.set_slot(slot, text);
            }
        }

        let download_row = self.fetch.current_row().unwrap_or_default();
        self.status.set_slot(DOWNLOAD_ROW, &download_row);

        self.announcement_texture = None;
        self.overlay.set_palette(&self.palette.borrow());

        if let Some(text) = self.preserved_input.take() {
            debug!("restoring preserved console text");
            self.open_input(&text);
        }
        self.update_chat_y_offset(true);
    }

    // ===== Scrolling =====

    fn scroll_history(&mut self, delta: i32) {
        let count = self.log.borrow().len();
        if self.cursor.scroll_by(delta, count) {
            self.reset_window();
        }
    }

    /// Refills the chat window from the cursor: slot `i` shows the log
    /// line at `offset + capacity - 1 - i`, so slot 0 is the newest
    /// visible line.
    fn reset_window(&mut self) {
        let capacity = self.normal_chat.capacity();
        let log = self.log.borrow();
        for i in 0..capacity {
            let index = self.cursor.offset() + to_i32(capacity - 1 - i);
            let text = log.normal(index).map_or("", |line| line.text.as_str());
            self.normal_chat.set_slot(i, text);
        }
    }

    // ===== Console state machine =====

    fn open_input(&mut self, initial: &str) {
        self.active = true;
        self.suppress_next_press = true;
        self.input.set_text(initial);
        self.out.push(ScreenEvent::SetKeyRepeat(true));
        self.update_chat_y_offset(true);
        debug!(seeded = !initial.is_empty(), "console opened");
    }

    fn close_input(&mut self) {
        self.active = false;
        self.overlay.close();
        self.out.push(ScreenEvent::SetKeyRepeat(false));

        let count = self.log.borrow().len();
        if !self.cursor.is_pinned(count) {
            self.cursor.jump_to_tail(count);
            self.reset_window();
        }
        self.update_chat_y_offset(true);
        debug!("console closed");
    }

    fn submit(&mut self) {
        let text = self.input.take_submit();
        if !text.is_empty() {
            self.out.push(ScreenEvent::SubmitChat(text));
        }
        self.close_input();
    }

    fn cancel(&mut self) {
        self.input.clear();
        self.close_input();
    }

    // ===== Layout =====

    /// Vertical space the console column occupies above the bottom
    /// edge, overlay included. Zero while passive.
    fn input_used_height(&self) -> i32 {
        if !self.active {
            return 0;
        }
        let mut used =
            to_i32(self.input.row_count()) * i32::from(self.line_height) + self.options.input_gap;
        if self.overlay.is_open() {
            used += i32::from(self.overlay.bounds().height);
        }
        used
    }

    /// Restacks client-status and chat above the console whenever the
    /// console's height or the client-status height changed (or
    /// unconditionally when forced).
    fn update_chat_y_offset(&mut self, force: bool) {
        let input_height = self.input_used_height();
        let key = (input_height, self.client_status.used_height());
        if !force && key == self.stack_key {
            return;
        }
        self.stack_key = key;

        let offset = input_height.max(self.options.bottom_offset);
        self.client_status.set_y_offset(offset);
        self.client_status.reposition(self.screen_size);

        let chat_offset = offset + i32::from(self.client_status.used_height());
        self.normal_chat.set_y_offset(chat_offset);
        self.normal_chat.reposition(self.screen_size);
    }

    fn input_rect(&self) -> Rect {
        let rows = to_i32(self.input.row_count());
        let height = rows * i32::from(self.line_height);
        let width =
            i32::from(self.screen_size.width).saturating_sub(self.options.input_margin * 2);
        let y = i32::from(self.screen_size.height) - self.options.input_margin - height;
        Rect::new(
            self.options.input_margin,
            y,
            clamp_u16(width),
            clamp_u16(height),
        )
    }

    // ===== Rendering helpers =====

    /// Passive-mode chat: only lines received within the recent window
    /// are drawn, and only where the cursor maps to a real log line.
    fn render_recent<G: Gfx>(&self, gfx: &mut G, now: Instant) {
        let capacity = self.normal_chat.capacity();
        let log = self.log.borrow();
        for i in 0..capacity {
            let index = self.cursor.offset() + to_i32(capacity - 1 - i);
            let Some(line) = log.normal(index) else {
                continue;
            };
            if now.duration_since(line.received) <= RECENT_WINDOW {
                self.normal_chat.render_slot(gfx, i);
            }
        }
    }

    fn render_chat_background<G: Gfx>(&self, gfx: &mut G) {
        let used = self.normal_chat.used_height();
        if used == 0 {
            return;
        }
        let bounds = self.normal_chat.bounds();
        let y = bounds.y + i32::from(bounds.height) - i32::from(used);
        let rect = Rect::new(bounds.x, y, bounds.width, used);
        gfx.fill_rect(rect.expanded(self.options.background_pad), CHAT_BACKGROUND);
    }

    /// The announcement draws centred, a quarter screen above centre,
    /// and only while its receipt is within the display window. The
    /// expiry check runs before the draw, so a stale line never
    /// reappears, not even after a context recreation.
    fn render_announcement<G: Gfx>(&mut self, gfx: &mut G, now: Instant) {
        let line = self.log.borrow().announcement().cloned();
        let Some(line) = line else {
            self.announcement_texture = None;
            return;
        };
        if now.duration_since(line.received) > ANNOUNCEMENT_WINDOW {
            self.announcement_texture = None;
            return;
        }
        if self.announcement_texture.is_none() {
            self.announcement_texture = Some(gfx.make_text(&line.text, FontKind::Announcement));
        }
        if let Some(texture) = &self.announcement_texture {
            let x = anchored(Anchor::Centre, 0, texture.width(), self.screen_size.width);
            let quarter = i32::from(self.screen_size.height) / 4;
            let y = anchored(
                Anchor::Centre,
                -quarter,
                texture.height(),
                self.screen_size.height,
            );
            gfx.draw_texture(texture, x, y);
        }
    }

    // ===== Mouse resolution =====

    fn chat_click<G: Gfx>(&mut self, gfx: &G, index: usize, x: i32) {
        let Some(rect) = self.normal_chat.slot_rect(index) else {
            return;
        };
        let Some(line) = self.normal_chat.slot_text(index) else {
            return;
        };
        let line = line.to_string();
        let local = x - rect.x;

        if let Some(word) = word_at(gfx, &line, local) {
            let word = self.palette.borrow().strip(&word);
            if is_url(&word) {
                debug!(url = %word, "chat link clicked");
                self.out.push(ScreenEvent::OpenUrlPrompt(word));
                return;
            }
        }
        if self.options.clickable_chat {
            let plain = self.palette.borrow().strip(&line);
            self.input.append(&plain);
        }
    }

    fn click_input<G: Gfx>(&mut self, gfx: &G, x: i32, y: i32) {
        let rect = self.input_rect();
        let line_height = i32::from(self.line_height).max(1);
        let row = usize::try_from((y - rect.y) / line_height).unwrap_or(0);
        let row_text = self
            .input
            .rows()
            .get(row)
            .copied()
            .unwrap_or_default()
            .to_string();

        let local = x - rect.x;
        let mut column = row_text.chars().count();
        let mut prefix = String::new();
        for (i, ch) in row_text.chars().enumerate() {
            let before = i32::from(gfx.measure(&prefix, FontKind::Chat).width);
            prefix.push(ch);
            let after = i32::from(gfx.measure(&prefix, FontKind::Chat).width);
            if local < (before + after) / 2 {
                column = i;
                break;
            }
        }
        self.input.set_caret(row * CHARS_PER_ROW + column);
    }
}

fn status_slot(channel: u8) -> Option<usize> {
    if (1..=STATUS_CHANNELS).contains(&channel) {
        Some(usize::from(channel) + 1)
    } else {
        None
    }
}

/// Bottom-right channels fill their window in reverse so the three
/// read top-to-bottom in channel order.
fn bottom_right_slot(channel: u8) -> Option<usize> {
    if (1..=BOTTOM_RIGHT_CHANNELS).contains(&channel) {
        Some(usize::from(BOTTOM_RIGHT_CHANNELS - channel))
    } else {
        None
    }
}

fn is_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

fn word_at<G: Gfx>(gfx: &G, line: &str, local_x: i32) -> Option<String> {
    let mut index = 0;
    while index < line.len() {
        let rest = &line[index..];
        let skip = rest.find(|c| c != ' ').unwrap_or(rest.len());
        let word_start = index + skip;
        if word_start >= line.len() {
            break;
        }
        let word_len = line[word_start..]
            .find(' ')
            .unwrap_or(line.len() - word_start);
        let word_end = word_start + word_len;

        let from = i32::from(gfx.measure(&line[..word_start], FontKind::Chat).width);
        let to = i32::from(gfx.measure(&line[..word_end], FontKind::Chat).width);
        if local_x >= from && local_x < to {
            return Some(line[word_start..word_end].to_string());
        }
        index = word_end;
    }
    None
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn clamp_u16(value: i32) -> u16 {
    u16::try_from(value.max(0)).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgfx::FakeGfx;
    use pretty_assertions::assert_eq;

    const SCREEN: Size = Size::new(640, 480);

    struct Rig {
        events: Rc<Events>,
        log: Rc<RefCell<ChatLog>>,
        palette: Rc<RefCell<ColorPalette>>,
        screen: ChatScreen,
        gfx: FakeGfx,
        now: Instant,
    }

    impl Rig {
        fn new(chat_lines: usize) -> Self {
            let options = HudOptions {
                chat_lines,
                ..HudOptions::default()
            };
            let events = Rc::new(Events::new());
            let log = Rc::new(RefCell::new(ChatLog::new(
                Rc::clone(&events),
                options.client_status_slots,
            )));
            let palette = Rc::new(RefCell::new(ColorPalette::new()));
            let mut screen = ChatScreen::new(
                options,
                Bindings::default(),
                Rc::clone(&log),
                Rc::clone(&palette),
                &events,
            );
            screen.init(SCREEN);
            Self {
                events,
                log,
                palette,
                screen,
                gfx: FakeGfx::new(),
                now: Instant::now(),
            }
        }

        fn push(&mut self, text: &str, channel: MessageChannel) {
            self.log.borrow_mut().push(text, channel, self.now);
        }

        fn frame(&mut self) {
            self.screen.update(&self.gfx);
            self.screen.render(&mut self.gfx, self.now);
        }
    }

    #[test]
    fn test_normal_messages_fill_from_the_bottom() {
        let mut rig = Rig::new(4);
        rig.push("first", MessageChannel::Normal);
        rig.push("second", MessageChannel::Normal);
        rig.frame();

        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("second"));
        assert_eq!(rig.screen.normal_chat.slot_text(1), Some("first"));
        assert_eq!(rig.screen.normal_chat.slot_text(2), None);
    }

    #[test]
    fn test_scrolled_back_reader_keeps_their_place() {
        let mut rig = Rig::new(2);
        for i in 0..6 {
            rig.push(&format!("line {i}"), MessageChannel::Normal);
        }
        rig.frame();
        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("line 5"));

        rig.screen.handle_key_down(Key::Char('t'));
        rig.screen.handle_key_down(Key::PageUp);
        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("line 3"));

        rig.push("line 6", MessageChannel::Normal);
        rig.frame();
        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("line 3"));
        assert_eq!(rig.screen.cursor.offset(), 2);
    }

    #[test]
    fn test_closing_the_console_snaps_back_to_the_tail() {
        let mut rig = Rig::new(2);
        for i in 0..6 {
            rig.push(&format!("line {i}"), MessageChannel::Normal);
        }
        rig.frame();

        rig.screen.handle_key_down(Key::Char('t'));
        rig.screen.handle_key_down(Key::PageUp);
        rig.screen.handle_key_down(Key::Escape);

        assert!(!rig.screen.is_active());
        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("line 5"));
    }

    #[test]
    fn test_status_channels_map_past_the_reserved_rows() {
        let mut rig = Rig::new(4);
        rig.push("one", MessageChannel::Status(1));
        rig.push("three", MessageChannel::Status(3));
        rig.frame();

        assert_eq!(rig.screen.status.slot_text(2), Some("one"));
        assert_eq!(rig.screen.status.slot_text(4), Some("three"));
        assert_eq!(rig.screen.status.slot_text(0), None);
    }

    #[test]
    fn test_bottom_right_channels_reverse() {
        let mut rig = Rig::new(4);
        rig.push("br1", MessageChannel::BottomRight(1));
        rig.push("br2", MessageChannel::BottomRight(2));
        rig.push("br3", MessageChannel::BottomRight(3));
        rig.frame();

        assert_eq!(rig.screen.bottom_right.slot_text(2), Some("br1"));
        assert_eq!(rig.screen.bottom_right.slot_text(1), Some("br2"));
        assert_eq!(rig.screen.bottom_right.slot_text(0), Some("br3"));
    }

    #[test]
    fn test_open_keystroke_character_is_suppressed_once() {
        let mut rig = Rig::new(4);
        assert!(rig.screen.handle_key_down(Key::Char('t')));
        assert!(rig.screen.is_active());

        assert!(rig.screen.handle_char('t'));
        assert_eq!(rig.screen.input.text(), "");

        rig.screen.handle_key_down(Key::Char('h'));
        rig.screen.handle_char('h');
        assert_eq!(rig.screen.input.text(), "h");
    }

    #[test]
    fn test_slash_opens_seeded() {
        let mut rig = Rig::new(4);
        rig.screen.handle_key_down(Key::Char('/'));
        assert!(rig.screen.is_active());
        assert_eq!(rig.screen.input.text(), "/");

        rig.screen.handle_char('/');
        assert_eq!(rig.screen.input.text(), "/");
    }

    #[test]
    fn test_submit_emits_and_closes() {
        let mut rig = Rig::new(4);
        rig.screen.handle_key_down(Key::Char('t'));
        rig.screen.handle_char('t');
        for ch in "hello".chars() {
            rig.screen.handle_key_down(Key::Char(ch));
            rig.screen.handle_char(ch);
        }
        rig.screen.handle_key_down(Key::Enter);

        let events = rig.screen.drain_events();
        assert!(events.contains(&ScreenEvent::SetKeyRepeat(true)));
        assert!(events.contains(&ScreenEvent::SubmitChat("hello".to_string())));
        assert!(events.contains(&ScreenEvent::SetKeyRepeat(false)));
        assert!(!rig.screen.is_active());
    }

    #[test]
    fn test_empty_submit_emits_nothing() {
        let mut rig = Rig::new(4);
        rig.screen.handle_key_down(Key::Char('t'));
        rig.screen.handle_key_down(Key::Enter);

        let events = rig.screen.drain_events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, ScreenEvent::SubmitChat(_))));
    }

    #[test]
    fn test_function_keys_fall_through_while_active() {
        let mut rig = Rig::new(4);
        rig.screen.handle_key_down(Key::Char('t'));
        assert!(!rig.screen.handle_key_down(Key::F(2)));
        assert!(rig.screen.handle_key_down(Key::Char('x')));
    }

    #[test]
    fn test_context_loss_preserves_console_text_once() {
        let mut rig = Rig::new(4);
        rig.screen.handle_key_down(Key::Char('t'));
        rig.screen.handle_char('t');
        for ch in "draft".chars() {
            rig.screen.handle_key_down(Key::Char(ch));
            rig.screen.handle_char(ch);
        }

        rig.gfx.lost = true;
        rig.events.context.publish(ContextEvent::Lost);
        rig.frame();
        assert_eq!(rig.screen.preserved_input.as_deref(), Some("draft"));

        rig.gfx.lost = false;
        rig.events.context.publish(ContextEvent::Recreated);
        rig.frame();

        assert!(rig.screen.is_active());
        assert_eq!(rig.screen.input.text(), "draft");
        assert_eq!(rig.screen.preserved_input, None);
    }

    #[test]
    fn test_passive_context_loss_preserves_nothing() {
        let mut rig = Rig::new(4);
        rig.gfx.lost = true;
        rig.events.context.publish(ContextEvent::Lost);
        rig.frame();

        assert_eq!(rig.screen.preserved_input, None);

        rig.gfx.lost = false;
        rig.events.context.publish(ContextEvent::Recreated);
        rig.frame();
        assert!(!rig.screen.is_active());
    }

    #[test]
    fn test_messages_during_loss_surface_after_recreation() {
        let mut rig = Rig::new(4);
        rig.push("before", MessageChannel::Normal);
        rig.frame();

        rig.gfx.lost = true;
        rig.events.context.publish(ContextEvent::Lost);
        rig.frame();

        rig.push("during", MessageChannel::Normal);
        rig.push("status", MessageChannel::Status(1));
        rig.frame();
        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("before"));

        rig.gfx.lost = false;
        rig.events.context.publish(ContextEvent::Recreated);
        rig.frame();

        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("during"));
        assert_eq!(rig.screen.normal_chat.slot_text(1), Some("before"));
        assert_eq!(rig.screen.status.slot_text(2), Some("status"));
    }

    #[test]
    fn test_zero_capacity_chat_still_tracks_the_log() {
        let mut rig = Rig::new(0);
        rig.push("unseen", MessageChannel::Normal);
        rig.frame();

        assert_eq!(rig.screen.cursor.offset(), 1);
        assert_eq!(rig.screen.normal_chat.used_height(), 0);
    }

    #[test]
    fn test_client_status_forces_restack() {
        let mut rig = Rig::new(4);
        rig.frame();
        let before = rig.screen.normal_chat.y_offset();

        rig.push("Connecting..", MessageChannel::ClientStatus(1));
        rig.frame();

        let after = rig.screen.normal_chat.y_offset();
        assert!(after > before);
        assert_eq!(rig.screen.client_status.slot_text(0), Some("Connecting.."));
    }

    #[test]
    fn test_announcement_expires_after_its_window() {
        let mut rig = Rig::new(4);
        rig.push("Server restarting soon", MessageChannel::Announcement);
        rig.frame();
        assert!(rig.screen.announcement_texture.is_some());

        let later = rig.now + Duration::from_secs(6);
        rig.screen.update(&rig.gfx);
        rig.screen.render(&mut rig.gfx, later);
        assert_eq!(rig.screen.announcement_texture, None);
    }

    #[test]
    fn test_replacement_announcement_rerasterises() {
        let mut rig = Rig::new(4);
        rig.push("first notice", MessageChannel::Announcement);
        rig.frame();
        rig.push("second notice", MessageChannel::Announcement);
        rig.frame();

        assert_eq!(rig.gfx.made_texts().last().copied(), Some("second notice"));
    }

    #[test]
    fn test_passive_chat_fades_after_ten_seconds() {
        let mut rig = Rig::new(4);
        rig.push("old news", MessageChannel::Normal);
        rig.frame();
        let drawn = rig.gfx.draws.len();

        let later = rig.now + Duration::from_secs(11);
        rig.screen.update(&rig.gfx);
        rig.screen.render(&mut rig.gfx, later);
        assert_eq!(rig.gfx.draws.len(), drawn);

        // The console still shows the full backlog.
        rig.screen.handle_key_down(Key::Char('t'));
        rig.screen.update(&rig.gfx);
        rig.screen.render(&mut rig.gfx, later);
        assert!(rig.gfx.draws.len() > drawn);
    }

    #[test]
    fn test_font_change_rerasterises_everything() {
        let mut rig = Rig::new(4);
        rig.push("body line", MessageChannel::Normal);
        rig.push("&etitle", MessageChannel::Status(1));
        rig.frame();
        let baseline = rig.gfx.made.len();

        rig.events.font_changed.publish(());
        rig.frame();

        assert_eq!(rig.gfx.made.len(), baseline * 2);
    }

    #[test]
    fn test_colour_redefinition_rebuilds_only_matching_lines() {
        let mut rig = Rig::new(4);
        rig.push("&fplain", MessageChannel::Normal);
        rig.push("uses &zcustom", MessageChannel::Normal);
        rig.frame();
        let baseline = rig.gfx.made.len();

        assert!(rig
            .palette
            .borrow_mut()
            .define('z', Rgba::new(10, 20, 30, 255)));
        rig.events.color_code_changed.publish('z');
        rig.frame();

        assert_eq!(rig.gfx.made.len(), baseline + 1);
        assert_eq!(rig.gfx.made_texts().last().copied(), Some("uses &zcustom"));
    }

    #[test]
    fn test_wheel_accumulates_fractions() {
        let mut rig = Rig::new(2);
        for i in 0..8 {
            rig.push(&format!("line {i}"), MessageChannel::Normal);
        }
        rig.frame();
        rig.screen.handle_key_down(Key::Char('t'));

        rig.screen.handle_mouse_scroll(0.4);
        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("line 7"));
        rig.screen.handle_mouse_scroll(0.7);
        assert_eq!(rig.screen.normal_chat.slot_text(0), Some("line 6"));
    }

    #[test]
    fn test_url_click_prompts_instead_of_inserting() {
        let mut rig = Rig::new(4);
        rig.push("see &9https://example.net for more", MessageChannel::Normal);
        rig.frame();

        rig.screen.handle_key_down(Key::Char('t'));
        rig.frame();

        let rect = rig.screen.normal_chat.slot_rect(0).expect("rect");
        // The URL starts after "see " (4 visible chars at 8 wide).
        let x = rect.x + 4 * 8 + 4;
        let handled = rig
            .screen
            .handle_mouse_down(&rig.gfx, MouseButton::Left, x, rect.y + 1);

        assert!(handled);
        let events = rig.screen.drain_events();
        assert!(events.contains(&ScreenEvent::OpenUrlPrompt(
            "https://example.net".to_string()
        )));
    }

    #[test]
    fn test_plain_line_click_inserts_stripped_text() {
        let mut rig = Rig::new(4);
        rig.push("&avote yes", MessageChannel::Normal);
        rig.frame();

        rig.screen.handle_key_down(Key::Char('t'));
        rig.screen.handle_char('t');
        rig.frame();

        let rect = rig.screen.normal_chat.slot_rect(0).expect("rect");
        rig.screen
            .handle_mouse_down(&rig.gfx, MouseButton::Left, rect.x + 2, rect.y + 1);

        assert_eq!(rig.screen.input.text(), "vote yes");
    }

    #[test]
    fn test_overlay_toggles_on_key_release() {
        let mut rig = Rig::new(4);
        rig.screen.handle_key_down(Key::Char('t'));

        rig.screen.handle_key_down(Key::Tab);
        assert!(!rig.screen.overlay.is_open());
        rig.screen.handle_key_up(Key::Tab);
        assert!(rig.screen.overlay.is_open());

        rig.screen.handle_key_down(Key::Escape);
        assert!(!rig.screen.overlay.is_open());
    }

    #[test]
    fn test_resize_repositions_without_rasterising() {
        let mut rig = Rig::new(4);
        rig.push("steady", MessageChannel::Normal);
        rig.frame();
        let made = rig.gfx.made.len();

        rig.screen.resize(Size::new(320, 240));
        rig.frame();

        assert_eq!(rig.gfx.made.len(), made);
        let rect = rig.screen.normal_chat.slot_rect(0).expect("rect");
        assert!(rect.y < 240);
    }

    #[test]
    fn test_download_row_dedupes() {
        struct Scripted(Vec<Option<crate::progress::Progress>>);
        impl ProgressSource for Scripted {
            fn poll(&mut self) -> Option<crate::progress::Progress> {
                self.0.pop().flatten()
            }
        }

        let mut rig = Rig::new(4);
        rig.screen.set_progress_source(Box::new(Scripted(vec![
            Some(crate::progress::Progress::Percent(50)),
            Some(crate::progress::Progress::Percent(50)),
        ])));

        rig.frame();
        let after_first = rig.gfx.made.len();
        rig.frame();

        assert_eq!(
            rig.screen.status.slot_text(DOWNLOAD_ROW),
            Some("&eDownloading texture pack (&750&e%)")
        );
        assert_eq!(rig.gfx.made.len(), after_first);
    }
}
