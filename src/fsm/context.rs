//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct the alert handlers read from and
//! write to: the tick's time and occupancy, the open alert session, the
//! last status colour announced to the notifier, and the outbox of
//! messages to send once the tick is over.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::protocol::{BuzzerMode, Message, Status};
use crate::sensors::presence::Occupancy;

/// Outbound messages queued within one tick.
pub const OUTBOX_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Alert session
// ---------------------------------------------------------------------------

/// State that exists only while the coordinator is in ALERT.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSession {
    /// Alert start, or the last grace-period restart.
    pub start_ms: u64,
    /// Person identified by the most recent scan in this session.
    pub scanned: Option<String>,
    pub scan_ms: Option<u64>,
    /// Soap use attributed after the scan.
    pub soap_used: bool,
    /// Buzzer submode; `Off` means no submode.
    pub buzzer: BuzzerMode,
}

impl AlertSession {
    pub fn open(now_ms: u64) -> Self {
        Self {
            start_ms: now_ms,
            scanned: None,
            scan_ms: None,
            soap_used: false,
            buzzer: BuzzerMode::Grace,
        }
    }

    /// Resolution guard: someone scanned and then used soap.
    pub fn is_resolvable(&self) -> bool {
        self.scanned.is_some() && self.soap_used
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic milliseconds at the start of the current tick.
    pub now_ms: u64,

    // -- Inputs --
    /// Fused zone occupancy.  Updated before each FSM tick.
    pub occupancy: Occupancy,

    // -- Alert state --
    /// Open session; `Some` exactly while in ALERT.
    pub session: Option<AlertSession>,
    /// Name credited by the last ALERT -> IDLE transition, for the
    /// service to apply to the ledger.
    pub resolution: Option<String>,

    // -- Outputs --
    /// Status colour last broadcast to the notifier.
    pub announced: Status,
    /// Messages to send after this tick, in order.
    pub outbox: heapless::Vec<Message, OUTBOX_CAPACITY>,

    // -- Configuration --
    pub config: SystemConfig,
}

impl FsmContext {
    /// Create a new context. The notifier boots showing GREEN, so that is
    /// the initial announced colour.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            occupancy: Occupancy::Clear,
            session: None,
            resolution: None,
            announced: Status::Green,
            outbox: heapless::Vec::new(),
            config,
        }
    }

    /// Queue a message. A full outbox drops it; the next change re-sends.
    pub fn push(&mut self, msg: Message) {
        if let Err(msg) = self.outbox.push(msg) {
            warn!("FSM: outbox full, dropping {:?}", msg);
        }
    }

    /// Broadcast `status` if it differs from the last one announced.
    pub fn announce_status(&mut self, status: Status) {
        if status != self.announced {
            self.announced = status;
            self.push(Message::Status(status));
        }
    }

    /// Broadcast `status` even if it was already announced.
    pub fn reannounce_status(&mut self, status: Status) {
        self.announced = status;
        self.push(Message::Status(status));
    }

    /// Change the session's buzzer submode, broadcasting on change only.
    pub fn set_buzzer(&mut self, mode: BuzzerMode) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.buzzer != mode {
            info!("ALERT: buzzer {:?} -> {:?}", session.buzzer, mode);
            session.buzzer = mode;
            self.push(Message::Buzzer(mode));
        }
    }

    /// Record an identity scan in the open session: the latest scan wins,
    /// the buzzer is silenced and the scan-grace timer restarts.
    /// BUZZER(OFF) goes out only if the buzzer was sounding.
    /// Returns `false` when no alert is active.
    pub fn record_scan(&mut self, name: &str) -> bool {
        let now = self.now_ms;
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.scanned = Some(name.to_string());
        session.scan_ms = Some(now);
        self.set_buzzer(BuzzerMode::Off);
        true
    }

    /// Attribute soap use to the open session. Only counts after a scan.
    pub fn record_soap_use(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) if session.scanned.is_some() => {
                session.soap_used = true;
                true
            }
            _ => false,
        }
    }

    /// Whether weight changes should currently be attributed.
    pub fn should_track_soap(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.scanned.is_some())
    }

    /// Current buzzer submode, `Off` outside an alert.
    pub fn buzzer(&self) -> BuzzerMode {
        self.session.as_ref().map_or(BuzzerMode::Off, |s| s.buzzer)
    }

    /// Take the queued messages, leaving the outbox empty.
    pub fn drain_outbox(&mut self) -> heapless::Vec<Message, OUTBOX_CAPACITY> {
        core::mem::take(&mut self.outbox)
    }
}
