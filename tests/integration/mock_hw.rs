//! Mock adapters for integration tests.
//!
//! Sensors are plain settable fields, the radio records every frame and
//! the notifier outputs record every call, so tests can assert on the
//! full history without touching GPIO or the radio.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};

use dishduty::app::events::AppEvent;
use dishduty::app::ports::{
    DisplayPort, EventSink, IndicatorPort, LedgerStore, LinkError, LinkPort, ProximityPort,
    StorageError, TagReaderPort, WeightPort,
};
use dishduty::mirror::DisplayFrame;
use dishduty::protocol::{Frame, Message, Status};
use dishduty::registry::TagId;
use dishduty::sensors::presence::Zone;

/// A distance well inside the occupied window.
pub const NEAR_CM: f32 = 4.0;
/// A distance beyond the window.
pub const FAR_CM: f32 = 40.0;

// ── MockSensors ───────────────────────────────────────────────

/// Sensor-node inputs. `tags` are handed out one per poll.
pub struct MockSensors {
    pub zones: [Option<f32>; 2],
    pub weight: Option<f32>,
    pub tags: VecDeque<TagId>,
    pub zone_reads: [u32; 2],
}

impl MockSensors {
    /// Nothing near either zone, a full bottle on the scale.
    pub fn new() -> Self {
        Self {
            zones: [Some(FAR_CM); 2],
            weight: Some(150.0),
            tags: VecDeque::new(),
            zone_reads: [0; 2],
        }
    }

    pub fn block(&mut self, zone: Zone) {
        self.zones[zone.index()] = Some(NEAR_CM);
    }

    pub fn clear(&mut self, zone: Zone) {
        self.zones[zone.index()] = Some(FAR_CM);
    }

    pub fn block_both(&mut self) {
        self.block(Zone::A);
        self.block(Zone::B);
    }

    pub fn clear_both(&mut self) {
        self.clear(Zone::A);
        self.clear(Zone::B);
    }

    pub fn present(&mut self, tag: &str) {
        self.tags.push_back(TagId::parse(tag).expect("valid tag id"));
    }
}

impl Default for MockSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityPort for MockSensors {
    fn distance_cm(&mut self, zone: Zone) -> Option<f32> {
        self.zone_reads[zone.index()] += 1;
        self.zones[zone.index()]
    }
}

impl WeightPort for MockSensors {
    fn read_grams(&mut self) -> Option<f32> {
        self.weight
    }
}

impl TagReaderPort for MockSensors {
    fn poll_tag(&mut self) -> Option<TagId> {
        self.tags.pop_front()
    }
}

// ── MockLink ──────────────────────────────────────────────────

/// Records sent frames; serves `inbox` to `try_recv`.
#[derive(Default)]
pub struct MockLink {
    pub sent: Vec<Frame>,
    pub inbox: VecDeque<Frame>,
    pub fail: bool,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame sent so far, decoded.
    pub fn messages(&self) -> Vec<Message> {
        self.sent
            .iter()
            .map(|f| Message::decode(f).expect("sensor sent an invalid frame"))
            .collect()
    }

    /// Sent frames as text, for compact assertions.
    pub fn wire(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect()
    }

    /// Move everything sent into `other`'s inbox, as the radio would.
    pub fn deliver_to(&mut self, other: &mut MockLink) -> usize {
        let n = self.sent.len();
        other.inbox.extend(self.sent.drain(..));
        n
    }

    pub fn inject(&mut self, bytes: &[u8]) {
        self.inbox
            .push_back(Frame::from_slice(bytes).expect("frame fits"));
    }
}

impl LinkPort for MockLink {
    fn send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        if self.fail {
            return Err(LinkError::SendFailed);
        }
        let frame = Frame::from_slice(frame).map_err(|_| LinkError::TooLong)?;
        self.sent.push(frame);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<Frame> {
        self.inbox.pop_front()
    }
}

// ── MemStore ──────────────────────────────────────────────────

/// In-memory ledger store. With `fail` set every save errors and the
/// stored values stay as they were.
#[derive(Default)]
pub struct MemStore {
    pub counts: Option<BTreeMap<String, u32>>,
    pub rotation: Option<Vec<String>>,
    pub saves: u32,
    pub fail: bool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemStore {
    fn load_counts(&self) -> Result<Option<BTreeMap<String, u32>>, StorageError> {
        Ok(self.counts.clone())
    }

    fn save_counts(&mut self, counts: &BTreeMap<String, u32>) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Io);
        }
        self.saves += 1;
        self.counts = Some(counts.clone());
        Ok(())
    }

    fn load_rotation(&self) -> Result<Option<Vec<String>>, StorageError> {
        Ok(self.rotation.clone())
    }

    fn save_rotation(&mut self, rotation: &[String]) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Io);
        }
        self.saves += 1;
        self.rotation = Some(rotation.to_vec());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockOutputs ───────────────────────────────────────────────

/// Notifier outputs: LEDs, buzzer and screen.
#[derive(Default)]
pub struct MockOutputs {
    pub statuses: Vec<Status>,
    pub buzzer: bool,
    /// Buzzer level after every `set_buzzer` call, with repeats collapsed.
    pub buzzer_edges: Vec<bool>,
    pub frames: Vec<DisplayFrame>,
}

impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lit(&self) -> Option<Status> {
        self.statuses.last().copied()
    }

    pub fn screen(&self) -> Option<&DisplayFrame> {
        self.frames.last()
    }
}

impl IndicatorPort for MockOutputs {
    fn show_status(&mut self, status: Status) {
        self.statuses.push(status);
    }

    fn set_buzzer(&mut self, on: bool) {
        if self.buzzer_edges.last() != Some(&on) {
            self.buzzer_edges.push(on);
        }
        self.buzzer = on;
    }
}

impl DisplayPort for MockOutputs {
    fn show(&mut self, frame: &DisplayFrame) {
        self.frames.push(frame.clone());
    }
}
