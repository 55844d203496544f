//! Two-zone presence detection.
//!
//! Each zone has an echo-ranging sensor. The two are never fired at the
//! same time: zone A is measured every `zone_poll_interval_ms`, zone B on
//! the same interval shifted by `zone_b_offset_ms`, so one sensor's ping
//! cannot be heard as the other's echo.
//!
//! Between measurements each zone keeps its last result. Occupancy is
//! recomputed from those cached results on every loop tick.

use log::debug;

use crate::app::ports::ProximityPort;
use crate::config::SystemConfig;
use crate::protocol::Status;

/// One of the two sensing regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    A,
    B,
}

impl Zone {
    pub const ALL: [Zone; 2] = [Zone::A, Zone::B];

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// How many zones currently see an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Clear,
    Partial,
    Full,
}

impl Occupancy {
    pub fn from_zones(a: bool, b: bool) -> Self {
        match (a, b) {
            (true, true) => Self::Full,
            (false, false) => Self::Clear,
            _ => Self::Partial,
        }
    }

    /// Traffic-light colour for this occupancy.
    pub fn status(self) -> Status {
        match self {
            Self::Clear => Status::Green,
            Self::Partial => Status::Yellow,
            Self::Full => Status::Red,
        }
    }
}

/// Staggered two-zone poller with cached per-zone results.
#[derive(Debug, Clone)]
pub struct PresenceDetector {
    min_cm: f32,
    max_cm: f32,
    interval_ms: u64,
    offset_ms: u64,
    /// Next due time per zone; `None` until the first poll anchors the schedule.
    next_due: Option<[u64; 2]>,
    occupied: [bool; 2],
}

impl PresenceDetector {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            min_cm: config.proximity_min_cm,
            max_cm: config.proximity_max_cm,
            interval_ms: u64::from(config.zone_poll_interval_ms),
            offset_ms: u64::from(config.zone_b_offset_ms),
            next_due: None,
            occupied: [false; 2],
        }
    }

    /// Whether a measured distance lies strictly inside the window.
    /// No echo counts as nothing detected.
    pub fn in_window(&self, distance_cm: Option<f32>) -> bool {
        distance_cm.is_some_and(|d| d > self.min_cm && d < self.max_cm)
    }

    /// Measure every zone that is due at `now_ms`, then return the fused
    /// occupancy. Zones that are not due keep their cached result.
    pub fn poll(&mut self, now_ms: u64, sensors: &mut impl ProximityPort) -> Occupancy {
        let due = *self
            .next_due
            .get_or_insert([now_ms, now_ms + self.offset_ms]);
        let mut next = due;

        for zone in Zone::ALL {
            let i = zone.index();
            if now_ms < due[i] {
                continue;
            }
            let distance = sensors.distance_cm(zone);
            self.occupied[i] = self.in_window(distance);
            next[i] = now_ms + self.interval_ms;
            debug!("Presence: zone {:?} -> {:?} cm (occupied={})", zone, distance, self.occupied[i]);
        }

        self.next_due = Some(next);
        self.occupancy()
    }

    /// Occupancy from the cached zone results, without measuring.
    pub fn occupancy(&self) -> Occupancy {
        Occupancy::from_zones(self.occupied[0], self.occupied[1])
    }
}
