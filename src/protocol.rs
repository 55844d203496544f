//! Node-to-node message protocol.
//!
//! Wire format: ASCII `"<kind>|<payload>"`, one message per radio frame.
//!
//! | Kind | Meaning        | Payload                      |
//! |------|----------------|------------------------------|
//! | `S`  | Status colour  | `GREEN` / `YELLOW` / `RED`   |
//! | `R`  | Last cleaner   | person name                  |
//! | `N`  | Next up        | person name                  |
//! | `B`  | Buzzer mode    | `OFF` / `GRACE` / `CONSTANT` |
//!
//! Frames carry no sequence number and are never acknowledged. The
//! receiver parses into [`Message`] at the boundary; anything that does
//! not parse is dropped by the caller.

use core::fmt;

use log::warn;

use crate::app::ports::LinkPort;

/// Largest frame either node sends or accepts.
pub const MAX_FRAME_LEN: usize = 64;

/// Longest person name carried in a RECORD/NEXT payload.
pub const MAX_NAME_LEN: usize = 32;

/// Placeholder shown and sent when no name is available.
pub const NO_NAME: &str = "---";

/// One raw radio frame.
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// Person name as carried on the wire.
pub type Name = heapless::String<MAX_NAME_LEN>;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Traffic-light status shown on the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Green,
    Yellow,
    Red,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        }
    }

    fn parse(payload: &str) -> Option<Self> {
        match payload {
            "GREEN" => Some(Self::Green),
            "YELLOW" => Some(Self::Yellow),
            "RED" => Some(Self::Red),
            _ => None,
        }
    }
}

/// Buzzer urgency. Doubles as the alert's buzzer submode, where `Off`
/// plays the role of "no submode".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuzzerMode {
    Off,
    /// Intermittent beeping while the grace period runs.
    Grace,
    /// Continuous tone.
    Constant,
}

impl BuzzerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Grace => "GRACE",
            Self::Constant => "CONSTANT",
        }
    }

    fn parse(payload: &str) -> Option<Self> {
        match payload {
            "OFF" => Some(Self::Off),
            "GRACE" => Some(Self::Grace),
            "CONSTANT" => Some(Self::Constant),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Status(Status),
    Record(Name),
    NextUp(Name),
    Buzzer(BuzzerMode),
}

/// Why a frame was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame bytes are not valid UTF-8.
    NotText,
    /// No `|` separator.
    MissingDelimiter,
    /// Kind field is not one of `S`, `R`, `N`, `B`.
    UnknownKind,
    /// Kind is known but the payload is not valid for it.
    InvalidPayload,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotText => write!(f, "frame is not text"),
            Self::MissingDelimiter => write!(f, "missing '|' delimiter"),
            Self::UnknownKind => write!(f, "unknown message kind"),
            Self::InvalidPayload => write!(f, "invalid payload"),
        }
    }
}

impl Message {
    /// Build a RECORD/NEXT name payload, falling back to [`NO_NAME`] when
    /// `name` is absent, and truncating on a char boundary if too long.
    pub fn name(name: Option<&str>) -> Name {
        let mut out = Name::new();
        for c in name.unwrap_or(NO_NAME).chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        out
    }

    pub fn record(name: &str) -> Self {
        Self::Record(Self::name(Some(name)))
    }

    pub fn next_up(name: Option<&str>) -> Self {
        Self::NextUp(Self::name(name))
    }

    /// Encode into a wire frame.
    pub fn encode(&self) -> Frame {
        let (kind, payload): (u8, &str) = match self {
            Self::Status(s) => (b'S', s.as_str()),
            Self::Record(n) => (b'R', n.as_str()),
            Self::NextUp(n) => (b'N', n.as_str()),
            Self::Buzzer(m) => (b'B', m.as_str()),
        };
        let mut frame = Frame::new();
        // Longest possible frame is 2 + MAX_NAME_LEN bytes, well under capacity.
        let _ = frame.push(kind);
        let _ = frame.push(b'|');
        let _ = frame.extend_from_slice(payload.as_bytes());
        frame
    }

    /// Decode one wire frame.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let text = core::str::from_utf8(frame).map_err(|_| ProtocolError::NotText)?;
        let (kind, payload) = text.split_once('|').ok_or(ProtocolError::MissingDelimiter)?;
        match kind {
            "S" => Status::parse(payload)
                .map(Self::Status)
                .ok_or(ProtocolError::InvalidPayload),
            "B" => BuzzerMode::parse(payload)
                .map(Self::Buzzer)
                .ok_or(ProtocolError::InvalidPayload),
            "R" => parse_name(payload).map(Self::Record),
            "N" => parse_name(payload).map(Self::NextUp),
            _ => Err(ProtocolError::UnknownKind),
        }
    }
}

fn parse_name(payload: &str) -> Result<Name, ProtocolError> {
    if payload.is_empty() || payload.chars().any(char::is_control) {
        return Err(ProtocolError::InvalidPayload);
    }
    Name::try_from(payload).map_err(|_| ProtocolError::InvalidPayload)
}

// ---------------------------------------------------------------------------
// Sending side
// ---------------------------------------------------------------------------

/// Best-effort sender. Failures are logged and forgotten: the next state
/// change re-sends the current value.
#[derive(Debug, Default)]
pub struct MessageChannel {
    sent: u32,
    failed: u32,
}

impl MessageChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and send `msg`. Returns whether the radio accepted it.
    pub fn send(&mut self, link: &mut impl LinkPort, msg: &Message) -> bool {
        match link.send(&msg.encode()) {
            Ok(()) => {
                self.sent += 1;
                true
            }
            Err(e) => {
                self.failed += 1;
                warn!("Link: send of {:?} failed: {}", msg, e);
                false
            }
        }
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }
}
