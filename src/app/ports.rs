//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SensorService / NotifierService (domain)
//! ```
//!
//! Driven adapters (sensors, radio, indicators, storage) implement these
//! traits. The services consume them via generics, so the domain core
//! never touches hardware directly.
//!
//! Every sensor port returns `Option`: a device that does not answer within
//! its bound is "no reading", never an error the loop has to handle.

use std::collections::BTreeMap;

use crate::config::SystemConfig;
use crate::mirror::DisplayFrame;
use crate::protocol::{Frame, Status};
use crate::registry::TagId;
use crate::sensors::presence::Zone;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Echo-ranging proximity sensors, one per [`Zone`].
pub trait ProximityPort {
    /// Measure the distance (cm) seen by `zone`. `None` on echo timeout.
    fn distance_cm(&mut self, zone: Zone) -> Option<f32>;
}

/// Soap-bottle load cell.
pub trait WeightPort {
    /// Current weight in grams, dead-band applied. `None` if the
    /// converter was not ready within its bound.
    fn read_grams(&mut self) -> Option<f32>;
}

/// Identity-tag scanner.
pub trait TagReaderPort {
    /// Non-blocking poll for a tag in the field.
    fn poll_tag(&mut self) -> Option<TagId>;
}

// ───────────────────────────────────────────────────────────────
// Wireless link (driven adapter: domain ↔ radio)
// ───────────────────────────────────────────────────────────────

/// Unacknowledged point-to-point datagram link between the two nodes.
pub trait LinkPort {
    /// Hand one frame to the radio. No retry, no delivery guarantee.
    fn send(&mut self, frame: &[u8]) -> Result<(), LinkError>;

    /// Pop the next received frame, if any. Never blocks.
    fn try_recv(&mut self) -> Option<Frame>;
}

// ───────────────────────────────────────────────────────────────
// Presentation outputs (driven adapters: domain → notifier hardware)
// ───────────────────────────────────────────────────────────────

/// Traffic-light LEDs and buzzer on the notifier node.
pub trait IndicatorPort {
    /// Light exactly the LED matching `status`.
    fn show_status(&mut self, status: Status);

    /// Drive the buzzer level.
    fn set_buzzer(&mut self, on: bool);
}

/// Text display on the notifier node.
pub trait DisplayPort {
    fn show(&mut self, frame: &DisplayFrame);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Persistence ports
// ───────────────────────────────────────────────────────────────

/// Durable home of the duty ledger.
///
/// Loads return `Ok(None)` when nothing has been stored yet. Writes are
/// best-effort: the caller logs a failure and keeps its in-memory state.
pub trait LedgerStore {
    fn load_counts(&self) -> Result<Option<BTreeMap<String, u32>>, StorageError>;
    fn save_counts(&mut self, counts: &BTreeMap<String, u32>) -> Result<(), StorageError>;
    fn load_rotation(&self) -> Result<Option<Vec<String>>, StorageError>;
    fn save_rotation(&mut self, rotation: &[String]) -> Result<(), StorageError>;
}

/// Startup configuration source.
pub trait ConfigPort {
    /// Load configuration. Returns [`SystemConfig::default()`] if no stored
    /// config exists; rejects stored values that fail validation.
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`LedgerStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Stored document is not valid JSON of the expected shape.
    Corrupted,
    /// Serialization failed.
    Encode,
    /// Generic I/O error.
    Io,
}

/// Errors from [`LinkPort::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The radio driver rejected the frame.
    SendFailed,
    /// Frame exceeds the link MTU.
    TooLong,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "stored data corrupted"),
            Self::Encode => write!(f, "encode failed"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SendFailed => write!(f, "send failed"),
            Self::TooLong => write!(f, "frame too long"),
        }
    }
}
