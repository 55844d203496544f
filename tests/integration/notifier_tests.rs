//! Integration tests for the notifier pipeline: radio frames →
//! NotifierService → mirror → LEDs, buzzer and screen.
//!
//! The bridge tests wire a live sensor service to the notifier through
//! mock links, delivering every frame within the same tick.

use super::mock_hw::{MemStore, MockLink, MockOutputs, MockSensors, RecordingSink};

use dishduty::app::events::AppEvent;
use dishduty::app::notifier::NotifierService;
use dishduty::app::service::SensorService;
use dishduty::config::SystemConfig;
use dishduty::ledger::DutyLedger;
use dishduty::protocol::{BuzzerMode, ProtocolError, Status};
use dishduty::registry::IdentityRegistry;

const STEP_MS: u64 = 50;

fn notifier() -> (NotifierService, MockLink, MockOutputs, RecordingSink) {
    let mut svc = NotifierService::new(&SystemConfig::default());
    let mut out = MockOutputs::new();
    svc.start(&mut out);
    (svc, MockLink::new(), out, RecordingSink::new())
}

// ── Notifier alone ────────────────────────────────────────────

#[test]
fn boot_shows_green_and_placeholders() {
    let (svc, _, out, _) = notifier();
    assert_eq!(out.statuses, vec![Status::Green]);
    assert!(!out.buzzer);
    let screen = out.screen().unwrap();
    assert_eq!(screen.text_at(12), Some("Status: OK"));
    assert_eq!(screen.text_at(44), Some("---"));
    assert_eq!(screen.text_at(56), Some("Last: ---"));
    assert_eq!(svc.stats(), (0, 0));
}

#[test]
fn malformed_frames_leave_mirror_untouched() {
    let (mut svc, mut link, mut out, mut sink) = notifier();
    link.inject(b"X|foo");
    link.inject(b"S|PURPLE");
    link.inject(b"no delimiter");
    link.inject(&[0xFF, 0xFE, b'|']);
    svc.poll(0, &mut link, &mut out, &mut sink);

    assert_eq!(svc.stats(), (0, 4));
    assert_eq!(svc.mirror().status(), Status::Green);
    assert_eq!(svc.mirror().next_up(), "---");
    assert_eq!(svc.mirror().buzzer_mode(), BuzzerMode::Off);
    assert_eq!(out.statuses.len(), 1, "LEDs not rewritten");
    assert_eq!(out.frames.len(), 1, "screen not redrawn");
    assert_eq!(
        sink.events,
        vec![
            AppEvent::MessageRejected(ProtocolError::UnknownKind),
            AppEvent::MessageRejected(ProtocolError::InvalidPayload),
            AppEvent::MessageRejected(ProtocolError::MissingDelimiter),
            AppEvent::MessageRejected(ProtocolError::NotText),
        ]
    );
}

#[test]
fn only_changes_relight_or_redraw() {
    let (mut svc, mut link, mut out, mut sink) = notifier();
    link.inject(b"S|RED");
    link.inject(b"S|RED");
    link.inject(b"N|Svanik");
    link.inject(b"N|Svanik");
    svc.poll(0, &mut link, &mut out, &mut sink);

    assert_eq!(out.statuses, vec![Status::Green, Status::Red]);
    // Several changes in one poll share one redraw.
    assert_eq!(out.frames.len(), 2);
    let screen = out.screen().unwrap();
    assert_eq!(screen.text_at(12), Some("Status: ALERT!"));
    assert_eq!(screen.text_at(44), Some("Svanik"));
    assert_eq!(svc.stats(), (4, 0));
}

#[test]
fn repeated_grace_keeps_blink_phase() {
    let (mut svc, mut link, mut out, mut sink) = notifier();
    link.inject(b"B|GRACE");
    svc.poll(0, &mut link, &mut out, &mut sink);
    assert!(out.buzzer);

    link.inject(b"B|GRACE");
    svc.poll(200, &mut link, &mut out, &mut sink);
    assert!(out.buzzer);
    svc.poll(450, &mut link, &mut out, &mut sink);
    assert!(out.buzzer);
    svc.poll(500, &mut link, &mut out, &mut sink);
    assert!(!out.buzzer);
    svc.poll(1_000, &mut link, &mut out, &mut sink);
    assert!(out.buzzer);
}

#[test]
fn constant_and_off_take_effect_on_arrival() {
    let (mut svc, mut link, mut out, mut sink) = notifier();
    link.inject(b"B|GRACE");
    svc.poll(0, &mut link, &mut out, &mut sink);
    svc.poll(500, &mut link, &mut out, &mut sink);
    assert!(!out.buzzer);

    link.inject(b"B|CONSTANT");
    svc.poll(550, &mut link, &mut out, &mut sink);
    assert!(out.buzzer);
    svc.poll(5_000, &mut link, &mut out, &mut sink);
    assert!(out.buzzer);

    link.inject(b"B|OFF");
    svc.poll(5_050, &mut link, &mut out, &mut sink);
    assert!(!out.buzzer);
}

// ── Sensor → notifier bridge ──────────────────────────────────

struct Bridge {
    sensor: SensorService,
    hw: MockSensors,
    uplink: MockLink,
    store: MemStore,
    notifier: NotifierService,
    downlink: MockLink,
    out: MockOutputs,
    sink: RecordingSink,
    now: u64,
}

impl Bridge {
    fn new() -> Self {
        let registry = IdentityRegistry::household();
        let store = MemStore::new();
        let ledger = DutyLedger::load(&registry, &store);
        let mut sensor = SensorService::new(SystemConfig::default(), registry, ledger);
        let (notifier, downlink, out, mut sink) = notifier();
        let mut uplink = MockLink::new();
        sensor.start(0, &mut uplink, &mut sink);
        let mut bridge = Self {
            sensor,
            hw: MockSensors::new(),
            uplink,
            store,
            notifier,
            downlink,
            out,
            sink,
            now: 0,
        };
        bridge.deliver();
        bridge
    }

    fn deliver(&mut self) {
        self.uplink.deliver_to(&mut self.downlink);
        self.notifier
            .poll(self.now, &mut self.downlink, &mut self.out, &mut self.sink);
    }

    fn step(&mut self) {
        self.sensor.tick(
            self.now,
            &mut self.hw,
            &mut self.uplink,
            &mut self.store,
            &mut self.sink,
        );
        self.deliver();
        self.now += STEP_MS;
    }

    fn run_to(&mut self, t: u64) {
        while self.now <= t {
            self.step();
        }
    }

    fn screen_line(&self, y: i32) -> Option<String> {
        self.out.screen().and_then(|f| f.text_at(y)).map(str::to_string)
    }
}

#[test]
fn notifier_mirrors_a_full_session() {
    let mut b = Bridge::new();
    assert_eq!(b.screen_line(44).as_deref(), Some("Paul"));

    // Alert opens at 250 ms with the grace pattern.
    b.hw.block_both();
    b.run_to(300);
    assert_eq!(b.out.lit(), Some(Status::Red));
    assert_eq!(b.notifier.mirror().buzzer_mode(), BuzzerMode::Grace);

    let edges_before = b.out.buzzer_edges.len();
    b.run_to(2_300);
    assert!(
        b.out.buzzer_edges.len() >= edges_before + 3,
        "grace pattern blinks on the notifier clock"
    );

    // Escalation: continuous tone.
    b.run_to(15_300);
    assert_eq!(b.notifier.mirror().buzzer_mode(), BuzzerMode::Constant);
    let edges = b.out.buzzer_edges.len();
    b.run_to(16_300);
    assert!(b.out.buzzer);
    assert_eq!(b.out.buzzer_edges.len(), edges, "no blinking in constant");

    // Scan silences, soap plus clearing resolves.
    b.hw.present("A169BBA3");
    b.run_to(16_400);
    assert!(!b.out.buzzer);
    assert_eq!(b.notifier.mirror().buzzer_mode(), BuzzerMode::Off);

    b.hw.weight = Some(0.0);
    b.run_to(16_700);
    b.hw.weight = Some(140.0);
    b.run_to(17_000);
    b.hw.clear_both();
    b.run_to(18_000);

    let mirror = b.notifier.mirror();
    assert_eq!(mirror.status(), Status::Green);
    assert_eq!(mirror.last_cleaner(), "Paul");
    assert_eq!(mirror.next_up(), "Pranav");
    assert_eq!(b.out.lit(), Some(Status::Green));
    assert!(!b.out.buzzer);
    assert_eq!(b.screen_line(12).as_deref(), Some("Status: OK"));
    assert_eq!(b.screen_line(44).as_deref(), Some("Pranav"));
    assert_eq!(b.screen_line(56).as_deref(), Some("Last: Paul"));

    let (applied, rejected) = b.notifier.stats();
    assert_eq!(rejected, 0);
    assert_eq!(applied, b.sensor.link_stats().0);
}

#[test]
fn lost_frames_converge_on_the_next_change() {
    let mut b = Bridge::new();
    b.uplink.fail = true;
    b.hw.block_both();
    b.run_to(1_000);
    assert_eq!(b.out.lit(), Some(Status::Green), "alert frames lost");

    b.uplink.fail = false;
    b.run_to(15_300);
    assert_eq!(
        b.notifier.mirror().buzzer_mode(),
        BuzzerMode::Constant,
        "escalation still reaches the notifier"
    );
    assert_eq!(b.notifier.stats().0, b.sensor.link_stats().0);
}

#[test]
fn resolution_restores_green_after_a_lost_frame() {
    let mut b = Bridge::new();
    b.hw.block_both();
    b.run_to(1_000);
    b.hw.present("A169BBA3");
    b.run_to(1_100);

    // The clear goes out while the radio is down.
    b.uplink.fail = true;
    b.hw.clear_both();
    b.run_to(1_600);
    assert_eq!(b.sensor.status(), Status::Green);
    assert_eq!(b.out.lit(), Some(Status::Red));

    b.uplink.fail = false;
    b.hw.weight = Some(0.0);
    b.run_to(1_900);
    b.hw.weight = Some(140.0);
    b.run_to(2_200);

    assert_eq!(b.sensor.ledger().count("Paul"), 1);
    assert_eq!(b.out.lit(), Some(Status::Green));
    assert_eq!(b.notifier.mirror().last_cleaner(), "Paul");
}
