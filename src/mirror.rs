//! Presentation mirror for the notifier node.
//!
//! The notifier owns no durable state. It keeps the most recent value of
//! each message kind and derives everything it shows from those four
//! fields. The buzzer pattern runs on the notifier's own clock: GRACE
//! toggles the buzzer every `buzzer_blink_interval_ms` from the moment it
//! is received until the next OFF or CONSTANT.

use core::fmt::Write as _;

use crate::config::SystemConfig;
use crate::protocol::{BuzzerMode, Message, NO_NAME, Name, Status};

/// Panel width in pixels.
pub const DISPLAY_WIDTH_PX: i32 = 128;
/// Glyph advance of the panel's built-in font.
pub const GLYPH_WIDTH_PX: i32 = 8;
/// Characters of the last cleaner's name that fit after `"Last: "`.
const LAST_NAME_CHARS: usize = 10;

// ---------------------------------------------------------------------------
// Display layout
// ---------------------------------------------------------------------------

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub x: i32,
    pub y: i32,
    pub text: heapless::String<40>,
}

/// A full screen: every line to draw after clearing the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub lines: heapless::Vec<DisplayLine, 6>,
}

impl DisplayFrame {
    /// Lay out the notifier screen.
    ///
    /// ```text
    ///  y=0   DishDuty
    ///  y=12  Status: OK | DISHES | ALERT!
    ///  y=24  ----------------
    ///  y=32  Next Up:
    ///  y=44      <name, centred>
    ///  y=56  Last: <first 10 chars>
    /// ```
    pub fn render(status: Status, next_up: &str, last_cleaner: &str) -> Self {
        let status_text = match status {
            Status::Green => "Status: OK",
            Status::Yellow => "Status: DISHES",
            Status::Red => "Status: ALERT!",
        };
        let name = if next_up.is_empty() { NO_NAME } else { next_up };
        let mut last = heapless::String::<40>::new();
        let _ = last.push_str("Last: ");
        for c in last_cleaner.chars().take(LAST_NAME_CHARS) {
            let _ = last.push(c);
        }

        let mut frame = Self {
            lines: heapless::Vec::new(),
        };
        frame.line(0, 0, "DishDuty");
        frame.line(0, 12, status_text);
        frame.line(0, 24, "----------------");
        frame.line(0, 32, "Next Up:");
        frame.line(centred_x(name), 44, name);
        frame.line(0, 56, &last);
        frame
    }

    fn line(&mut self, x: i32, y: i32, text: &str) {
        let mut s = heapless::String::new();
        for c in text.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        let _ = self.lines.push(DisplayLine { x, y, text: s });
    }

    /// Text of the line drawn at `y`, if any.
    pub fn text_at(&self, y: i32) -> Option<&str> {
        self.lines.iter().find(|l| l.y == y).map(|l| l.text.as_str())
    }
}

impl core::fmt::Display for DisplayFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            f.write_str(&line.text)?;
        }
        Ok(())
    }
}

/// Left edge that centres `text` on the panel, clamped at zero.
pub fn centred_x(text: &str) -> i32 {
    let width = text.chars().count() as i32 * GLYPH_WIDTH_PX;
    ((DISPLAY_WIDTH_PX - width) / 2).max(0)
}

// ---------------------------------------------------------------------------
// Buzzer timer
// ---------------------------------------------------------------------------

/// Local buzzer pattern generator.
#[derive(Debug, Clone)]
pub struct BuzzerTimer {
    mode: BuzzerMode,
    on: bool,
    last_toggle_ms: Option<u64>,
    interval_ms: u64,
}

impl BuzzerTimer {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            mode: BuzzerMode::Off,
            on: false,
            last_toggle_ms: None,
            interval_ms: u64::from(interval_ms),
        }
    }

    /// Switch pattern. Repeating the current mode keeps the blink phase.
    pub fn set_mode(&mut self, mode: BuzzerMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.last_toggle_ms = None;
        self.on = mode == BuzzerMode::Constant;
    }

    /// Advance to `now_ms` and return the buzzer level to drive.
    pub fn update(&mut self, now_ms: u64) -> bool {
        match self.mode {
            BuzzerMode::Off => self.on = false,
            BuzzerMode::Constant => self.on = true,
            BuzzerMode::Grace => {
                let due = self
                    .last_toggle_ms
                    .is_none_or(|last| now_ms.saturating_sub(last) >= self.interval_ms);
                if due {
                    self.on = !self.on;
                    self.last_toggle_ms = Some(now_ms);
                }
            }
        }
        self.on
    }

    pub fn mode(&self) -> BuzzerMode {
        self.mode
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

/// What applying one message changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorChange {
    /// The status LEDs must be rewritten.
    pub status: bool,
    /// The screen must be redrawn.
    pub display: bool,
}

/// Latest value of each message kind, as seen by the notifier.
#[derive(Debug, Clone)]
pub struct PresentationMirror {
    status: Status,
    last_cleaner: Name,
    next_up: Name,
    buzzer: BuzzerTimer,
}

impl PresentationMirror {
    /// Boot state: GREEN, no names, buzzer off.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            status: Status::Green,
            last_cleaner: Message::name(None),
            next_up: Message::name(None),
            buzzer: BuzzerTimer::new(config.buzzer_blink_interval_ms),
        }
    }

    /// Fold one decoded message into the mirror.
    pub fn apply(&mut self, msg: &Message) -> MirrorChange {
        let mut change = MirrorChange::default();
        match msg {
            Message::Status(s) => {
                if *s != self.status {
                    self.status = *s;
                    change.status = true;
                    change.display = true;
                }
            }
            Message::Record(name) => {
                if *name != self.last_cleaner {
                    self.last_cleaner = name.clone();
                    change.display = true;
                }
            }
            Message::NextUp(name) => {
                if *name != self.next_up {
                    self.next_up = name.clone();
                    change.display = true;
                }
            }
            Message::Buzzer(mode) => self.buzzer.set_mode(*mode),
        }
        change
    }

    /// Advance the buzzer pattern; returns the level to drive.
    pub fn update_buzzer(&mut self, now_ms: u64) -> bool {
        self.buzzer.update(now_ms)
    }

    pub fn frame(&self) -> DisplayFrame {
        DisplayFrame::render(self.status, &self.next_up, &self.last_cleaner)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn last_cleaner(&self) -> &str {
        &self.last_cleaner
    }

    pub fn next_up(&self) -> &str {
        &self.next_up
    }

    pub fn buzzer_mode(&self) -> BuzzerMode {
        self.buzzer.mode()
    }

    /// One-line summary for the console.
    pub fn summary(&self) -> heapless::String<128> {
        let mut s = heapless::String::new();
        let _ = write!(
            s,
            "status={} next={} last={} buzzer={}",
            self.status.as_str(),
            self.next_up,
            self.last_cleaner,
            self.buzzer.mode().as_str()
        );
        s
    }
}
