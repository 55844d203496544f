//! Integration tests for the sensor pipeline: mock sensors → SensorService
//! → FSM → ledger → radio frames.
//!
//! The loop is driven at the firmware's 50 ms cadence on a virtual clock.
//! Zone A is first measured at t=0 and zone B at t=250, each then every
//! 500 ms, so an alert opens at t=250 when both zones start blocked.

use super::mock_hw::{MemStore, MockLink, MockSensors, RecordingSink};

use dishduty::adapters::file_store::{COUNTS_FILE, FileStore};
use dishduty::app::commands::AppCommand;
use dishduty::app::events::AppEvent;
use dishduty::app::service::SensorService;
use dishduty::config::SystemConfig;
use dishduty::fsm::StateId;
use dishduty::ledger::DutyLedger;
use dishduty::protocol::{BuzzerMode, Status};
use dishduty::registry::{IdentityRegistry, TagId};
use dishduty::sensors::presence::Zone;
use dishduty::status_page;

const PAUL: &str = "A169BBA3";
const PAUL_FOB: &str = "F9ABA011";
const PRANAV: &str = "F1589C7B";
const STRANGER: &str = "DEADBEEF";

const STEP_MS: u64 = 50;

struct Rig {
    app: SensorService,
    hw: MockSensors,
    link: MockLink,
    store: MemStore,
    sink: RecordingSink,
    /// Time of the next tick.
    now: u64,
}

impl Rig {
    fn new() -> Self {
        Self::with_store(MemStore::new())
    }

    fn with_store(store: MemStore) -> Self {
        let registry = IdentityRegistry::household();
        let ledger = DutyLedger::load(&registry, &store);
        let mut app = SensorService::new(SystemConfig::default(), registry, ledger);
        let mut link = MockLink::new();
        let mut sink = RecordingSink::new();
        app.start(0, &mut link, &mut sink);
        Self {
            app,
            hw: MockSensors::new(),
            link,
            store,
            sink,
            now: 0,
        }
    }

    fn step(&mut self) {
        self.app.tick(
            self.now,
            &mut self.hw,
            &mut self.link,
            &mut self.store,
            &mut self.sink,
        );
        self.now += STEP_MS;
    }

    /// Tick up to and including `t`.
    fn run_to(&mut self, t: u64) {
        while self.now <= t {
            self.step();
        }
    }

    fn advance(&mut self, ms: u64) {
        let end = self.now + ms;
        while self.now < end {
            self.step();
        }
    }

    fn command(&mut self, cmd: AppCommand) {
        self.app
            .handle_command(cmd, &mut self.link, &mut self.store, &mut self.sink);
    }

    /// Lift the bottle and put it back `grams` lighter.
    fn use_soap(&mut self, grams: f32) {
        let before = self.hw.weight.expect("bottle on scale");
        self.hw.weight = Some(0.0);
        self.advance(200);
        self.hw.weight = Some(before - grams);
        self.advance(200);
    }

    /// A complete session from idle: block, scan, soap, clear.
    fn clean_cycle(&mut self, tag: &str) {
        self.hw.block_both();
        self.advance(1_000);
        assert_eq!(self.app.state(), StateId::Alert);
        self.hw.present(tag);
        self.advance(100);
        self.use_soap(5.0);
        self.hw.clear_both();
        self.advance(1_000);
        assert_eq!(self.app.state(), StateId::Idle);
    }

    fn wire(&self) -> Vec<String> {
        self.link.wire()
    }

    fn wire_tail(&self, n: usize) -> Vec<String> {
        let wire = self.wire();
        wire[wire.len().saturating_sub(n)..].to_vec()
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_announces_next_up_and_stays_idle() {
    let rig = Rig::new();
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.wire(), vec!["N|Paul"]);
    assert_eq!(
        rig.sink.events[0],
        AppEvent::Started {
            state: StateId::Idle,
            next_up: Some("Paul".into())
        }
    );
}

#[test]
fn zones_are_polled_on_staggered_schedules() {
    let mut rig = Rig::new();
    rig.run_to(200);
    assert_eq!(rig.hw.zone_reads, [1, 0]);
    rig.run_to(250);
    assert_eq!(rig.hw.zone_reads, [1, 1]);
    rig.run_to(1_000);
    // A at 0, 500, 1000; B at 250, 750.
    assert_eq!(rig.hw.zone_reads, [3, 2]);
}

// ── Idle status ───────────────────────────────────────────────

#[test]
fn one_blocked_zone_shows_yellow_without_alert() {
    let mut rig = Rig::new();
    rig.hw.block(Zone::A);
    rig.run_to(2_000);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.app.status(), Status::Yellow);

    rig.hw.clear(Zone::A);
    rig.run_to(3_000);
    assert_eq!(rig.wire(), vec!["N|Paul", "S|YELLOW", "S|GREEN"]);
}

// ── Grace and escalation ──────────────────────────────────────

#[test]
fn full_occupancy_escalates_to_constant_after_grace() {
    let mut rig = Rig::new();
    rig.hw.block_both();

    rig.run_to(250);
    assert_eq!(rig.app.state(), StateId::Alert);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Grace);

    rig.run_to(15_200);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Grace);
    rig.run_to(15_250);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Constant);

    rig.run_to(20_000);
    assert_eq!(
        rig.wire(),
        vec!["N|Paul", "S|YELLOW", "B|GRACE", "S|RED", "B|CONSTANT"]
    );
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::StateChanged { from: StateId::Idle, to: StateId::Alert }
        )),
        1
    );
}

#[test]
fn clearing_inside_grace_restarts_the_window() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(10_000);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Grace);

    rig.hw.clear(Zone::B);
    rig.run_to(10_250);
    assert_eq!(rig.app.state(), StateId::Alert);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Off);
    assert_eq!(
        rig.app.context().session.as_ref().map(|s| s.start_ms),
        Some(10_250)
    );
    assert_eq!(rig.wire_tail(2), vec!["S|YELLOW", "B|OFF"]);

    // Partial occupancy never escalates on its own.
    rig.run_to(30_000);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Off);

    // Blocked again: a fresh grace window from the last clear tick.
    rig.hw.block(Zone::B);
    rig.run_to(30_250);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Grace);
    rig.run_to(45_150);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Grace);
    rig.run_to(45_200);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Constant);
}

#[test]
fn constant_without_scan_survives_clearing() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(16_000);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Constant);

    rig.hw.clear_both();
    rig.run_to(20_000);
    assert_eq!(rig.app.state(), StateId::Alert);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Constant);
    assert_eq!(rig.app.status(), Status::Red, "constant forces red");
}

// ── Scanning ──────────────────────────────────────────────────

#[test]
fn scan_during_constant_silences_then_soap_and_clear_resolve() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(20_000);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Constant);

    rig.hw.present(PAUL);
    rig.run_to(20_050);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Off);
    assert_eq!(rig.wire().last().map(String::as_str), Some("B|OFF"));
    assert!(rig.sink.events.contains(&AppEvent::TagScanned {
        tag: TagId::parse(PAUL).unwrap(),
        name: Some("Paul"),
        recorded: true,
    }));

    rig.hw.weight = Some(0.0);
    rig.run_to(21_000);
    rig.hw.weight = Some(130.0);
    rig.run_to(21_100);
    assert!(rig.sink.events.contains(&AppEvent::SoapUsed {
        grams: 20.0,
        tracked: true
    }));
    assert_eq!(rig.app.state(), StateId::Alert, "still blocked");

    rig.hw.clear_both();
    rig.run_to(21_250);
    assert_eq!(rig.app.status(), Status::Yellow);
    rig.run_to(21_500);

    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(
        rig.wire_tail(5),
        vec!["S|YELLOW", "R|Paul", "N|Pranav", "S|GREEN", "B|OFF"]
    );
    assert_eq!(rig.app.ledger().count("Paul"), 1);
    assert_eq!(rig.app.last_cleaner(), Some("Paul"));
    assert_eq!(rig.app.next_up().as_deref(), Some("Pranav"));
    assert!(rig.sink.events.contains(&AppEvent::Resolved {
        name: "Paul".into(),
        count: 1,
        next_up: Some("Pranav".into()),
    }));

    let counts = rig.store.counts.as_ref().unwrap();
    assert_eq!(counts.get("Paul"), Some(&1));
    assert_eq!(
        rig.store.rotation.as_deref().unwrap(),
        ["Pranav", "Svanik", "Paul"]
    );
}

#[test]
fn soap_used_before_scan_is_not_credited() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(1_000);

    rig.use_soap(20.0);
    assert!(rig.sink.events.contains(&AppEvent::SoapUsed {
        grams: 20.0,
        tracked: false
    }));

    rig.hw.present(PAUL);
    rig.advance(100);
    rig.hw.clear_both();
    rig.advance(1_500);
    assert_eq!(rig.app.state(), StateId::Alert, "no soap after the scan");
    assert_eq!(rig.app.status(), Status::Green);
    assert_eq!(rig.app.ledger().count("Paul"), 0);

    // Baseline moved with the untracked use: the next drop is measured from 130 g.
    rig.use_soap(10.0);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.app.ledger().count("Paul"), 1);
    // GREEN was already announced; resolution still sends the full burst.
    assert_eq!(
        rig.wire_tail(4),
        vec!["R|Paul", "N|Pranav", "S|GREEN", "B|OFF"]
    );
}

#[test]
fn resting_card_does_not_repeat_buzzer_off() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(1_000);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Grace);

    for _ in 0..4 {
        rig.hw.present(PAUL);
        rig.advance(1_100);
    }
    let offs = rig.wire().iter().filter(|f| f.as_str() == "B|OFF").count();
    assert_eq!(offs, 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::TagScanned { recorded: true, .. })),
        4
    );
}

#[test]
fn latest_scan_in_a_session_gets_the_credit() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(1_000);

    rig.hw.present(PAUL);
    rig.advance(2_000);
    rig.hw.present(PRANAV);
    rig.advance(100);
    rig.use_soap(20.0);
    rig.hw.clear_both();
    rig.advance(1_000);

    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.app.ledger().count("Pranav"), 1);
    assert_eq!(rig.app.ledger().count("Paul"), 0);
    assert_eq!(rig.app.last_cleaner(), Some("Pranav"));
}

#[test]
fn second_tag_of_a_person_credits_the_same_name() {
    let mut rig = Rig::new();
    rig.clean_cycle(PAUL_FOB);
    assert_eq!(rig.app.ledger().count("Paul"), 1);
}

#[test]
fn unknown_and_idle_scans_are_ignored() {
    let mut rig = Rig::new();
    rig.hw.present(PAUL);
    rig.run_to(100);
    assert!(rig.sink.events.contains(&AppEvent::TagScanned {
        tag: TagId::parse(PAUL).unwrap(),
        name: Some("Paul"),
        recorded: false,
    }));

    rig.hw.block_both();
    rig.run_to(1_000);
    rig.hw.present(STRANGER);
    rig.run_to(1_050);
    assert!(rig.sink.events.contains(&AppEvent::TagScanned {
        tag: TagId::parse(STRANGER).unwrap(),
        name: None,
        recorded: false,
    }));
    assert_eq!(rig.app.buzzer(), BuzzerMode::Grace, "unknown tag does not silence");
    assert!(rig.app.context().session.as_ref().unwrap().scanned.is_none());
}

#[test]
fn card_resting_on_reader_is_debounced() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(1_000);

    rig.hw.present(PAUL);
    rig.run_to(1_050);
    rig.run_to(1_500);
    rig.hw.present(PAUL);
    rig.run_to(1_550);
    let scans = |rig: &Rig| rig.sink.count(|e| matches!(e, AppEvent::TagScanned { .. }));
    assert_eq!(scans(&rig), 1);

    rig.run_to(2_100);
    rig.hw.present(PAUL);
    rig.run_to(2_150);
    assert_eq!(scans(&rig), 2);
}

#[test]
fn blocked_sink_after_scan_grace_escalates() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(1_000);
    rig.hw.present(PAUL);
    rig.run_to(1_050);

    rig.run_to(31_000);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Off);
    rig.run_to(31_050);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Constant);
}

#[test]
fn unresolved_session_escalates_after_scan_timeout() {
    let mut rig = Rig::new();
    rig.hw.block_both();
    rig.run_to(1_000);
    rig.hw.present(PAUL);
    rig.run_to(1_050);
    rig.hw.clear(Zone::B);

    // Partial between scan grace and timeout stays quiet.
    rig.run_to(61_000);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Off);
    assert_eq!(rig.app.status(), Status::Yellow);

    rig.run_to(61_050);
    assert_eq!(rig.app.buzzer(), BuzzerMode::Constant);
    rig.run_to(61_100);
    assert_eq!(rig.app.status(), Status::Red);
}

// ── Ledger, commands and persistence ──────────────────────────

#[test]
fn repeated_sessions_rotate_duty() {
    let mut rig = Rig::new();
    assert_eq!(rig.app.next_up().as_deref(), Some("Paul"));
    rig.clean_cycle(PAUL);
    assert_eq!(rig.app.next_up().as_deref(), Some("Pranav"));
    rig.clean_cycle(PRANAV);
    assert_eq!(rig.app.next_up().as_deref(), Some("Svanik"));
    rig.clean_cycle(PAUL);

    assert_eq!(rig.app.ledger().count("Paul"), 2);
    assert_eq!(rig.app.ledger().total(), 3);
    assert_eq!(rig.app.ledger().rotation(), ["Svanik", "Pranav", "Paul"]);
    assert_eq!(rig.app.next_up().as_deref(), Some("Svanik"));
}

#[test]
fn reset_command_zeroes_counts_and_rebroadcasts_next_up() {
    let store = MemStore {
        counts: Some(
            [("Paul".to_string(), 3), ("Pranav".to_string(), 1), ("Svanik".to_string(), 2)].into(),
        ),
        rotation: Some(vec!["Svanik".into(), "Pranav".into(), "Paul".into()]),
        ..MemStore::default()
    };
    let mut rig = Rig::with_store(store);
    assert_eq!(rig.wire(), vec!["N|Pranav"]);

    rig.command(AppCommand::ResetCounts);

    assert_eq!(rig.app.ledger().total(), 0);
    assert_eq!(rig.wire().last().map(String::as_str), Some("N|Svanik"));
    assert!(rig.store.counts.as_ref().unwrap().values().all(|&c| c == 0));
    assert_eq!(
        rig.store.rotation.as_deref().unwrap(),
        ["Svanik", "Pranav", "Paul"]
    );
    assert!(rig.sink.events.contains(&AppEvent::CountsReset {
        next_up: Some("Svanik".into())
    }));
}

#[test]
fn store_failure_keeps_memory_state() {
    let mut rig = Rig::with_store(MemStore {
        fail: true,
        ..MemStore::default()
    });
    rig.clean_cycle(PAUL);
    assert_eq!(rig.app.ledger().count("Paul"), 1);
    assert!(rig.store.counts.is_none());

    // The next mutation writes the whole ledger once the store recovers.
    rig.store.fail = false;
    rig.clean_cycle(PRANAV);
    let counts = rig.store.counts.as_ref().unwrap();
    assert_eq!(counts.get("Paul"), Some(&1));
    assert_eq!(counts.get("Pranav"), Some(&1));
}

#[test]
fn radio_failures_do_not_stop_the_loop() {
    let mut rig = Rig::new();
    rig.link.fail = true;
    rig.hw.block_both();
    rig.run_to(1_000);
    assert_eq!(rig.app.state(), StateId::Alert);
    let (_, failed) = rig.app.link_stats();
    assert_eq!(failed, 3, "S|YELLOW, B|GRACE and S|RED refused");

    rig.link.fail = false;
    rig.hw.present(PAUL);
    rig.advance(100);
    assert_eq!(rig.wire().last().map(String::as_str), Some("B|OFF"));
}

#[test]
fn ledger_survives_reboot_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let registry = IdentityRegistry::household();
    let mut store = FileStore::new(dir.path());
    let ledger = DutyLedger::load(&registry, &store);
    let mut app = SensorService::new(SystemConfig::default(), registry, ledger);
    let (mut hw, mut link, mut sink) = (MockSensors::new(), MockLink::new(), RecordingSink::new());
    app.start(0, &mut link, &mut sink);

    let mut now = 0;
    let mut run = |app: &mut SensorService, hw: &mut MockSensors, ms: u64| {
        let end = now + ms;
        while now < end {
            app.tick(now, hw, &mut link, &mut store, &mut sink);
            now += STEP_MS;
        }
    };
    hw.block_both();
    run(&mut app, &mut hw, 1_000);
    hw.present(PRANAV);
    run(&mut app, &mut hw, 100);
    hw.weight = Some(0.0);
    run(&mut app, &mut hw, 200);
    hw.weight = Some(120.0);
    run(&mut app, &mut hw, 200);
    hw.clear_both();
    run(&mut app, &mut hw, 1_000);
    assert_eq!(app.ledger().count("Pranav"), 1);
    assert!(dir.path().join(COUNTS_FILE).exists());

    let reloaded = DutyLedger::load(&IdentityRegistry::household(), &FileStore::new(dir.path()));
    assert_eq!(reloaded.count("Pranav"), 1);
    assert_eq!(reloaded.rotation(), ["Paul", "Svanik", "Pranav"]);
    assert_eq!(reloaded.next_up(), Some("Paul"));
}

#[test]
fn status_page_reflects_the_live_ledger() {
    let mut rig = Rig::new();
    rig.clean_cycle(PAUL);
    let body = status_page::render_body(rig.app.ledger(), rig.app.last_cleaner());
    assert!(body.contains("<td>Paul</td><td>1</td>"));
    assert!(body.contains("Next up: <strong>Pranav</strong>"));
    assert!(body.contains("Last: <strong>Paul</strong>"));
}
