//! Scripted server traffic for the preview client.
//!
//! There is no real server behind the preview, so this module plays
//! one: a welcome burst, idle player chatter, live status rows, a
//! texture pack download, a mid-session colour redefinition, and canned
//! replies to whatever the player submits. Long lines are split at the
//! classic 64 character protocol width before they enter the log, the
//! way a server would split them on the wire.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

use hud_core::{ChatLog, ColorPalette, Events, MessageChannel, Progress, ProgressSource, Rgba};

/// Classic servers hard-wrap chat at this many characters.
const PROTOCOL_LINE_CHARS: usize = 64;

const CHATTER_NAMES: &[&str] = &[
    "miner42",
    "Redstone_Kate",
    "oak_log",
    "pixel_pete",
    "deepslate_dan",
];

const CHATTER_LINES: &[&str] = &[
    "anyone got spare oak?",
    "the creeper blew up my porch again",
    "selling &e64 cobblestone&f at spawn, cheap",
    "who built the giant chicken outside the east gate",
    "found a double cave system under the lake, bring torches and at \
     least two stacks of planks because the drop near the entrance is \
     genuinely ridiculous",
    "lag spike anyone?",
];

const REPLY_LINES: &[&str] = &[
    "nice one",
    "agreed",
    "meet me at spawn?",
    "&7(pixel_pete nods silently)",
    "same here honestly",
];

enum Entry {
    Line(MessageChannel, &'static str),
    DefineColor(char, Rgba),
}

/// The scripted feed, advanced once per frame.
pub struct Feed {
    started: Instant,
    script: VecDeque<(Duration, Entry)>,
    replies: VecDeque<(Duration, String)>,
    next_chatter: Duration,
    next_fps: Duration,
}

impl Feed {
    pub fn new(started: Instant) -> Self {
        let script = VecDeque::from([
            (
                Duration::from_millis(500),
                Entry::Line(
                    MessageChannel::Status(1),
                    "&eCobble Creative &7- classic build server",
                ),
            ),
            (
                Duration::from_millis(700),
                Entry::Line(MessageChannel::Status(2), "&a3/16 players online"),
            ),
            (
                Duration::from_millis(900),
                Entry::Line(MessageChannel::Normal, "&eWelcome to Cobble Creative!"),
            ),
            (
                Duration::from_millis(1100),
                Entry::Line(
                    MessageChannel::Normal,
                    "&7Press T to chat, / for commands, Tab for symbols.",
                ),
            ),
            (
                Duration::from_millis(1500),
                Entry::Line(
                    MessageChannel::ClientStatus(1),
                    "&7Loading world: plains_spawn",
                ),
            ),
            (
                Duration::from_millis(2000),
                Entry::Line(MessageChannel::Announcement, "&eWelcome to Cobble!"),
            ),
            (
                Duration::from_millis(3500),
                Entry::Line(MessageChannel::ClientStatus(1), ""),
            ),
            (
                Duration::from_secs(8),
                Entry::Line(MessageChannel::BottomRight(2), "&7Held block: stone"),
            ),
            (
                Duration::from_secs(20),
                Entry::DefineColor('z', Rgba::opaque(255, 0, 200)),
            ),
            (
                Duration::from_millis(20500),
                Entry::Line(
                    MessageChannel::Normal,
                    "&z[team] fuchsia squad now speaks in style",
                ),
            ),
            // Redefining a classic code repaints every line using it.
            (
                Duration::from_secs(35),
                Entry::DefineColor('e', Rgba::opaque(255, 170, 30)),
            ),
            (
                Duration::from_millis(35200),
                Entry::Line(MessageChannel::Normal, "&7(the server just warmed up &eyellow&7)"),
            ),
            (
                Duration::from_secs(45),
                Entry::Line(MessageChannel::Announcement, "&cArena opens in one minute!"),
            ),
        ]);

        Self {
            started,
            script,
            replies: VecDeque::new(),
            next_chatter: Duration::from_secs(6),
            next_fps: Duration::from_secs(1),
        }
    }

    /// Plays everything due by `now` into the log and palette.
    pub fn tick(
        &mut self,
        log: &mut ChatLog,
        palette: &mut ColorPalette,
        events: &Events,
        now: Instant,
    ) {
        let elapsed = now.duration_since(self.started);

        while let Some(entry) = pop_due(&mut self.script, elapsed) {
            match entry {
                Entry::Line(channel, text) => push_wrapped(log, text, channel, now),
                Entry::DefineColor(code, color) => {
                    debug!(code = %code, "scripted colour definition");
                    palette.define(code, color);
                    events.color_code_changed.publish(code);
                }
            }
        }

        while let Some(line) = pop_due(&mut self.replies, elapsed) {
            push_wrapped(log, &line, MessageChannel::Normal, now);
        }

        if elapsed >= self.next_chatter {
            let mut rng = rand::thread_rng();
            let name = CHATTER_NAMES[rng.gen_range(0..CHATTER_NAMES.len())];
            let line = CHATTER_LINES[rng.gen_range(0..CHATTER_LINES.len())];
            push_wrapped(log, &format!("&f<{name}> {line}"), MessageChannel::Normal, now);
            self.next_chatter = elapsed + Duration::from_secs_f32(rng.gen_range(4.0..11.0));
        }

        if elapsed >= self.next_fps {
            let fps = rand::thread_rng().gen_range(55..61);
            log.push(
                format!("&7FPS: {fps}"),
                MessageChannel::BottomRight(1),
                now,
            );
            self.next_fps = elapsed + Duration::from_secs(1);
        }
    }

    /// Handles a line the player submitted: commands get answered,
    /// plain chat is echoed and sometimes draws a reply.
    pub fn player_said(&mut self, log: &mut ChatLog, text: &str, now: Instant) {
        if let Some(command) = text.strip_prefix('/') {
            match command.split_whitespace().next().unwrap_or("") {
                "help" => {
                    push_wrapped(
                        log,
                        "&eCommands: /help, /list, /rules",
                        MessageChannel::Normal,
                        now,
                    );
                }
                "list" => {
                    push_wrapped(
                        log,
                        "&eOnline: &fyou, miner42, Redstone_Kate, oak_log",
                        MessageChannel::Normal,
                        now,
                    );
                }
                "rules" => {
                    push_wrapped(
                        log,
                        "&eRule one: no griefing. Rule two: see rule one.",
                        MessageChannel::Normal,
                        now,
                    );
                }
                other => {
                    push_wrapped(
                        log,
                        &format!("&cUnknown command: &f/{other}"),
                        MessageChannel::Normal,
                        now,
                    );
                }
            }
            return;
        }

        push_wrapped(log, &format!("&f<you> {text}"), MessageChannel::Normal, now);

        let mut rng = rand::thread_rng();
        if rng.gen_bool(0.6) {
            let name = CHATTER_NAMES[rng.gen_range(0..CHATTER_NAMES.len())];
            let line = REPLY_LINES[rng.gen_range(0..REPLY_LINES.len())];
            let due = now.duration_since(self.started)
                + Duration::from_secs_f32(rng.gen_range(1.0..3.5));
            self.replies.push_back((due, format!("&f<{name}> {line}")));
        }
    }
}

/// The front entry of a timed queue, if its moment has come.
fn pop_due<T>(queue: &mut VecDeque<(Duration, T)>, elapsed: Duration) -> Option<T> {
    if queue.front()?.0 <= elapsed {
        queue.pop_front().map(|(_, entry)| entry)
    } else {
        None
    }
}

/// Splits at the protocol width and pushes each piece as its own line.
fn push_wrapped(log: &mut ChatLog, text: &str, channel: MessageChannel, now: Instant) {
    if text.len() <= PROTOCOL_LINE_CHARS {
        log.push(text, channel, now);
        return;
    }
    for piece in textwrap::wrap(text, PROTOCOL_LINE_CHARS) {
        log.push(piece.into_owned(), channel, now);
    }
}

/// A pretend texture pack fetch that runs off the wall clock.
pub struct DownloadSim {
    started: Instant,
}

impl DownloadSim {
    pub fn new(started: Instant) -> Self {
        Self { started }
    }
}

impl ProgressSource for DownloadSim {
    fn poll(&mut self) -> Option<Progress> {
        let secs = self.started.elapsed().as_secs();
        match secs {
            0..=4 => None,
            5..=6 => Some(Progress::Checking),
            7..=8 => Some(Progress::Fetching),
            9..=18 => Some(Progress::Percent(
                u8::try_from((secs - 9) * 10).unwrap_or(99),
            )),
            _ => None,
        }
    }
}
