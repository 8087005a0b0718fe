//! The preview application.
//!
//! Plays the part the game client plays around the chat coordinator: it
//! owns the log, the palette, and the event buses, translates terminal
//! input, scripts the server side, and draws whatever the coordinator
//! rasterised. The loop is frame-driven like a game: drain input,
//! advance the feed, update the screen, render.
//!
//! With the console closed, `t` or `/` opens it, `q` quits, and `F8`
//! simulates a graphics context loss (and restore). `Ctrl+C` always
//! quits. Everything else goes to the coordinator.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Alignment;
use ratatui::layout::Rect as TermRect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use tracing::{debug, trace, warn};

use hud_core::{
    Bindings, ChatLog, ChatScreen, ColorPalette, ContextEvent, Events, HudConfig, HudOptions,
    ScreenEvent, Size,
};

use crate::feed::{DownloadSim, Feed};
use crate::gfx::TermGfx;
use crate::keymap::{translate_button, translate_key, typed_char};

/// Chat is not an animation-heavy surface; 20 FPS is plenty.
const FRAME_BUDGET: Duration = Duration::from_millis(50);

/// Main application state.
pub struct App {
    /// Is the app still running?
    running: bool,
    /// The display coordinator under preview.
    screen: ChatScreen,
    /// Game-side chat state, shared with the coordinator.
    log: Rc<RefCell<ChatLog>>,
    /// Colour code table, shared with the coordinator and the backend.
    palette: Rc<RefCell<ColorPalette>>,
    /// Event buses between the pieces.
    events: Rc<Events>,
    /// Cell-based graphics backend.
    gfx: TermGfx,
    /// The scripted server.
    feed: Feed,
    /// URL awaiting a keyboard confirmation, shown as a bottom bar.
    url_prompt: Option<String>,
}

impl App {
    /// Wires the log, palette, coordinator, backend, and feed together.
    pub fn new() -> anyhow::Result<Self> {
        let (width, height) = crossterm::terminal::size()?;

        let options = match HudConfig::load() {
            Ok(config) => config.apply(terminal_options()),
            Err(err) => {
                warn!("ignoring config: {err}");
                terminal_options()
            }
        };

        let events = Rc::new(Events::new());
        let palette = Rc::new(RefCell::new(ColorPalette::new()));
        let log = Rc::new(RefCell::new(ChatLog::new(
            Rc::clone(&events),
            options.client_status_slots,
        )));

        let mut screen = ChatScreen::new(
            options,
            Bindings::default(),
            Rc::clone(&log),
            Rc::clone(&palette),
            &events,
        );
        screen.init(Size::new(width, height));

        let started = Instant::now();
        screen.set_progress_source(Box::new(DownloadSim::new(started)));

        Ok(Self {
            running: true,
            screen,
            log,
            palette: Rc::clone(&palette),
            events,
            gfx: TermGfx::new(palette),
            feed: Feed::new(started),
            url_prompt: None,
        })
    }

    /// Main event loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // First frame before any input arrives.
        self.draw(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Terminals repeat presses and never report
                            // releases; releases are synthesised below.
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key);
                            }
                            Event::Mouse(mouse) => self.handle_mouse(&mouse),
                            Event::Paste(text) => {
                                self.screen.handle_paste(&text);
                            }
                            Event::Resize(width, height) => {
                                self.screen.resize(Size::new(width, height));
                            }
                            _ => {}
                        }
                    }
                }

                () = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            let now = Instant::now();
            self.feed.tick(
                &mut self.log.borrow_mut(),
                &mut self.palette.borrow_mut(),
                &self.events,
                now,
            );
            self.screen.update(&self.gfx);
            self.process_screen_events(now);
            self.draw(terminal)?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < FRAME_BUDGET {
                tokio::time::sleep(FRAME_BUDGET - elapsed).await;
            }
        }

        Ok(())
    }

    /// Acts on the requests the coordinator queued this frame.
    fn process_screen_events(&mut self, now: Instant) {
        for event in self.screen.drain_events() {
            match event {
                ScreenEvent::SubmitChat(text) => {
                    self.feed.player_said(&mut self.log.borrow_mut(), &text, now);
                }
                ScreenEvent::OpenUrlPrompt(url) => {
                    debug!(url = %url, "link clicked");
                    self.url_prompt = Some(url);
                }
                // The terminal has key repeat regardless; a real client
                // forwards this to the windowing layer.
                ScreenEvent::SetKeyRepeat(enabled) => {
                    trace!(enabled, "key repeat request");
                }
            }
        }
    }

    /// Handle keyboard input.
    fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }

        if self.url_prompt.is_some() {
            self.answer_url_prompt(key.code);
            return;
        }

        match key.code {
            KeyCode::Char('q') if !self.screen.is_active() => {
                self.running = false;
                return;
            }
            KeyCode::F(8) => {
                self.toggle_context_loss();
                return;
            }
            _ => {}
        }

        let Some(translated) = translate_key(key.code) else {
            return;
        };
        self.screen.handle_key_down(translated);
        if let Some(ch) = typed_char(&key) {
            self.screen.handle_char(ch);
        }
        // The synthesised release; drives the binds that act on key-up.
        self.screen.handle_key_up(translated);
    }

    /// Handle mouse input. Crossterm reports cell coordinates, which are
    /// exactly the backend's surface units.
    fn handle_mouse(&mut self, mouse: &crossterm::event::MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(button) => {
                self.screen.handle_mouse_down(
                    &self.gfx,
                    translate_button(button),
                    i32::from(mouse.column),
                    i32::from(mouse.row),
                );
            }
            MouseEventKind::ScrollUp => {
                self.screen.handle_mouse_scroll(1.0);
            }
            MouseEventKind::ScrollDown => {
                self.screen.handle_mouse_scroll(-1.0);
            }
            _ => {}
        }
    }

    /// Confirms or dismisses the URL bar.
    fn answer_url_prompt(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(url) = self.url_prompt.take() {
                    // A real client hands the URL to the OS here.
                    debug!(url = %url, "url confirmed");
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.url_prompt = None;
            }
            _ => {}
        }
    }

    /// Flips the simulated graphics context and tells the coordinator.
    fn toggle_context_loss(&mut self) {
        let lost = !self.gfx.is_lost();
        self.gfx.set_lost(lost);
        self.events.context.publish(if lost {
            ContextEvent::Lost
        } else {
            ContextEvent::Recreated
        });
        debug!(lost, "simulated context toggled");
    }

    /// Renders one frame: coordinator first, then host-side chrome.
    fn draw(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let now = Instant::now();
        self.gfx.begin_frame();
        self.screen.render(&mut self.gfx, now);

        terminal.draw(|frame| {
            self.gfx.blit(frame);
            if self.gfx.is_lost() {
                draw_context_banner(frame);
            }
            if let Some(url) = &self.url_prompt {
                draw_url_prompt(frame, url);
            }
        })?;
        Ok(())
    }
}

/// Cell-friendly spacing; the pixel defaults assume a game window.
fn terminal_options() -> HudOptions {
    HudOptions {
        chat_lines: 10,
        edge_margin: 1,
        bottom_offset: 3,
        input_margin: 1,
        input_gap: 1,
        background_pad: 0,
        ..HudOptions::default()
    }
}

/// What a player of the real client sees during a context loss: nothing,
/// except here there is a hint for getting back out.
fn draw_context_banner(frame: &mut Frame<'_>) {
    let area = frame.area();
    if area.height < 2 {
        return;
    }
    let row = TermRect::new(0, area.height / 2, area.width, 1);
    frame.render_widget(
        Paragraph::new("graphics context lost, press F8 to restore")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        row,
    );
}

/// Bottom-row confirmation bar for a clicked URL.
fn draw_url_prompt(frame: &mut Frame<'_>, url: &str) {
    let area = frame.area();
    if area.height == 0 {
        return;
    }
    let bar = TermRect::new(0, area.height - 1, area.width, 1);
    frame.render_widget(
        Paragraph::new(format!(" open {url} in a browser? [y/n]"))
            .style(Style::default().fg(Color::Black).bg(Color::Yellow)),
        bar,
    );
}
