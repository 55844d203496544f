//! Sensor-node application service — the hexagonal core.
//!
//! [`SensorService`] owns the alert coordinator (FSM + context), both
//! detectors, the duty ledger and the identity registry.  All I/O flows
//! through port traits injected at call sites, so the whole service is
//! testable with mock adapters.
//!
//! ```text
//!  ProximityPort ─┐
//!  WeightPort ────┼─▶ ┌──────────────────────────┐ ──▶ LinkPort
//!  TagReaderPort ─┘   │      SensorService        │ ──▶ EventSink
//!                     │ Presence · Soap · FSM     │
//!  AppCommand ──────▶ │ Ledger · Registry         │ ◀─▶ LedgerStore
//!                     └──────────────────────────┘
//! ```

use log::{debug, info};

use crate::config::SystemConfig;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::ledger::DutyLedger;
use crate::protocol::{BuzzerMode, Message, MessageChannel, Status};
use crate::registry::{IdentityRegistry, TagId};
use crate::sensors::presence::PresenceDetector;
use crate::sensors::soap::{SoapEvent, SoapUsageDetector};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{EventSink, LedgerStore, LinkPort, ProximityPort, TagReaderPort, WeightPort};

// ───────────────────────────────────────────────────────────────
// SensorService
// ───────────────────────────────────────────────────────────────

/// The sensor node's application service.
pub struct SensorService {
    fsm: Fsm,
    ctx: FsmContext,
    presence: PresenceDetector,
    soap: SoapUsageDetector,
    ledger: DutyLedger,
    registry: IdentityRegistry,
    channel: MessageChannel,
    last_cleaner: Option<String>,
    /// Last accepted tag read, for debouncing a card resting on the reader.
    last_tag: Option<(TagId, u64)>,
    last_weight_log_ms: Option<u64>,
}

impl SensorService {
    /// Construct the service. Does **not** start the FSM; call [`start`](Self::start).
    pub fn new(config: SystemConfig, registry: IdentityRegistry, ledger: DutyLedger) -> Self {
        let presence = PresenceDetector::new(&config);
        let soap = SoapUsageDetector::new(&config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Self {
            fsm,
            ctx,
            presence,
            soap,
            ledger,
            registry,
            channel: MessageChannel::new(),
            last_cleaner: None,
            last_tag: None,
            last_weight_log_ms: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the coordinator and tell the notifier who is up next.
    pub fn start(&mut self, now_ms: u64, link: &mut impl LinkPort, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        self.ctx.push(Message::next_up(self.ledger.next_up()));
        self.flush(link);

        sink.emit(&AppEvent::Started {
            state: self.fsm.current_state(),
            next_up: self.next_up(),
        });
        info!(
            "SensorService started, counts={:?}, order={:?}",
            self.ledger.counts(),
            self.ledger.rotation()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration: tag poll → weight → due zones → FSM →
    /// outbound messages.
    ///
    /// `hw` satisfies every sensor port at once, keeping the borrow
    /// single while the port boundary stays explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl ProximityPort + WeightPort + TagReaderPort),
        link: &mut impl LinkPort,
        store: &mut impl LedgerStore,
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;

        // 1. Identity scan
        if let Some(tag) = hw.poll_tag() {
            self.handle_command(AppCommand::TagScanned(tag), link, store, sink);
        }

        // 2. Weight
        if let Some(grams) = hw.read_grams() {
            self.observe_weight(grams, now_ms, sink);
        }

        // 3. Proximity zones that are due
        self.ctx.occupancy = self.presence.poll(now_ms, hw);

        // 4. Coordinator
        let prev = self.fsm.current_state();
        self.fsm.tick(&mut self.ctx);
        let state = self.fsm.current_state();
        if state != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to: state });
        }
        if let Some(name) = self.ctx.resolution.take() {
            self.resolve(&name, store, sink);
        }

        // 5. Radio
        self.flush(link);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command. Uses the time of the current tick.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        link: &mut impl LinkPort,
        store: &mut impl LedgerStore,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::TagScanned(tag) => self.on_tag(tag, sink),
            AppCommand::ResetCounts => {
                self.ledger.reset_counts(store);
                self.ctx.push(Message::next_up(self.ledger.next_up()));
                sink.emit(&AppEvent::CountsReset {
                    next_up: self.next_up(),
                });
            }
        }
        self.flush(link);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn ledger(&self) -> &DutyLedger {
        &self.ledger
    }

    pub fn last_cleaner(&self) -> Option<&str> {
        self.last_cleaner.as_deref()
    }

    pub fn next_up(&self) -> Option<String> {
        self.ledger.next_up().map(str::to_string)
    }

    /// Current buzzer submode (`Off` outside an alert).
    pub fn buzzer(&self) -> BuzzerMode {
        self.ctx.buzzer()
    }

    /// Status colour last announced to the notifier.
    pub fn status(&self) -> Status {
        self.ctx.announced
    }

    pub fn context(&self) -> &FsmContext {
        &self.ctx
    }

    /// Frames sent and frames the radio refused, since startup.
    pub fn link_stats(&self) -> (u32, u32) {
        (self.channel.sent(), self.channel.failed())
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_tag(&mut self, tag: TagId, sink: &mut impl EventSink) {
        let now = self.ctx.now_ms;
        let debounce = u64::from(self.ctx.config.scan_debounce_ms);
        if let Some((last, at)) = &self.last_tag {
            if *last == tag && now.saturating_sub(*at) < debounce {
                debug!("Tag {} still on reader, ignored", tag);
                return;
            }
        }
        self.last_tag = Some((tag.clone(), now));

        let name = self.registry.lookup(&tag);
        let recorded = match name {
            Some(name) => {
                let recorded = self.ctx.record_scan(name);
                if recorded {
                    info!("Scan by {} recorded during alert", name);
                } else {
                    info!("Scan by {} outside alert, ignored", name);
                }
                recorded
            }
            None => {
                info!("Unknown tag {}, ignored", tag);
                false
            }
        };
        sink.emit(&AppEvent::TagScanned { tag, name, recorded });
    }

    fn observe_weight(&mut self, grams: f32, now_ms: u64, sink: &mut impl EventSink) {
        let out = self.soap.step(grams, self.ctx.should_track_soap(), now_ms);
        if out.usage {
            self.ctx.record_soap_use();
        }
        if let Some(SoapEvent::Used { grams, tracked }) = out.event {
            sink.emit(&AppEvent::SoapUsed { grams, tracked });
        }
        if let Some(baseline_g) = out.low_bottle {
            sink.emit(&AppEvent::LowBottle { baseline_g });
        }

        let interval = u64::from(self.ctx.config.weight_log_interval_ms);
        let due = self
            .last_weight_log_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= interval);
        if due {
            self.last_weight_log_ms = Some(now_ms);
            sink.emit(&AppEvent::WeightSample {
                grams,
                baseline_g: self.soap.baseline(),
                phase: self.soap.phase(),
            });
        }
    }

    /// Credit the resolving person and queue the resolution broadcast:
    /// RECORD, NEXT, STATUS(GREEN), BUZZER(OFF).
    fn resolve(&mut self, name: &str, store: &mut impl LedgerStore, sink: &mut impl EventSink) {
        self.ledger.credit(name, store);
        self.last_cleaner = Some(name.to_string());

        self.ctx.push(Message::record(name));
        self.ctx.push(Message::next_up(self.ledger.next_up()));
        self.ctx.reannounce_status(Status::Green);
        self.ctx.push(Message::Buzzer(BuzzerMode::Off));

        sink.emit(&AppEvent::Resolved {
            name: name.to_string(),
            count: self.ledger.count(name),
            next_up: self.next_up(),
        });
    }

    fn flush(&mut self, link: &mut impl LinkPort) {
        for msg in self.ctx.drain_outbox() {
            self.channel.send(link, &msg);
        }
    }
}
