//! Soap-bottle usage detection from load-cell weight.
//!
//! Soap use is only visible as a lift/replace cycle: the bottle leaves
//! the scale (weight under the presence threshold), is used, and comes
//! back lighter. The detector compares the weight on return against the
//! baseline recorded the last time the bottle was put down.
//!
//! ```text
//!   REMOVED ──[w >= PRESENT]──▶ PRESENT
//!      ▲                           │
//!      └──────[w < PRESENT]────────┘
//! ```
//!
//! Everything interesting happens on the REMOVED → PRESENT edge:
//!
//! | Condition on return            | Baseline      | Usage reported        |
//! |--------------------------------|---------------|-----------------------|
//! | no baseline yet                | set to `w`    | no                    |
//! | `w - baseline < -USE`          | set to `w`    | only if `should_track`|
//! | `abs(w - baseline) > NEW_DELTA`| set to `w`    | no (bottle swap)      |
//! | otherwise                      | kept          | no                    |

use log::{debug, info, warn};

use crate::config::SystemConfig;

/// Whether the bottle is currently on the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapPhase {
    Removed,
    Present,
}

/// What one observation concluded, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoapEvent {
    /// Bottle lifted off the scale.
    Lifted,
    /// First placement; baseline recorded.
    Calibrated { baseline: f32 },
    /// Bottle came back lighter. `tracked` is false for movement before a scan.
    Used { grams: f32, tracked: bool },
    /// Bottle swap; baseline replaced.
    NewBottle { weight: f32 },
    /// Returned without a significant change.
    Unchanged { delta: f32 },
}

/// Full result of [`SoapUsageDetector::step`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SoapOutcome {
    /// Attributed usage: a tracked lighter return.
    pub usage: bool,
    pub event: Option<SoapEvent>,
    /// Set when the low-bottle diagnostic is due; carries the baseline.
    pub low_bottle: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct SoapUsageDetector {
    present_g: f32,
    use_g: f32,
    empty_g: f32,
    new_bottle_g: f32,
    warn_interval_ms: u64,

    phase: SoapPhase,
    baseline: Option<f32>,
    last_low_warning_ms: Option<u64>,
}

impl SoapUsageDetector {
    /// Starts in [`SoapPhase::Removed`] with no baseline, so the first
    /// reading at or above the presence threshold calibrates.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            present_g: config.soap_present_threshold_g,
            use_g: config.soap_use_threshold_g,
            empty_g: config.soap_empty_threshold_g,
            new_bottle_g: config.soap_new_bottle_delta_g,
            warn_interval_ms: u64::from(config.low_bottle_warning_interval_ms),
            phase: SoapPhase::Removed,
            baseline: None,
            last_low_warning_ms: None,
        }
    }

    /// Feed one weight reading. Returns `true` only for attributed usage.
    pub fn observe(&mut self, weight_g: f32, should_track: bool, now_ms: u64) -> bool {
        self.step(weight_g, should_track, now_ms).usage
    }

    /// [`observe`](Self::observe) with the diagnostic detail.
    pub fn step(&mut self, weight_g: f32, should_track: bool, now_ms: u64) -> SoapOutcome {
        let mut out = SoapOutcome::default();
        let was = self.phase;

        if weight_g < self.present_g {
            self.phase = SoapPhase::Removed;
            if was == SoapPhase::Present {
                debug!("Soap: bottle lifted ({:.1} g)", weight_g);
                out.event = Some(SoapEvent::Lifted);
            }
            return out;
        }

        if was == SoapPhase::Present {
            out.low_bottle = self.low_bottle_due(now_ms);
            return out;
        }

        // REMOVED -> PRESENT
        self.phase = SoapPhase::Present;
        let Some(baseline) = self.baseline else {
            self.baseline = Some(weight_g);
            info!("Soap: baseline set to {:.1} g", weight_g);
            out.event = Some(SoapEvent::Calibrated { baseline: weight_g });
            return out;
        };

        let delta = weight_g - baseline;
        if delta < -self.use_g {
            self.baseline = Some(weight_g);
            let grams = -delta;
            if should_track {
                info!("Soap: {:.1} g used", grams);
                out.usage = true;
                if weight_g < self.empty_g {
                    self.last_low_warning_ms = Some(now_ms);
                    out.low_bottle = Some(weight_g);
                }
            } else {
                info!("Soap: {:.1} g movement before scan, not counted", grams);
            }
            out.event = Some(SoapEvent::Used { grams, tracked: should_track });
        } else if delta.abs() > self.new_bottle_g {
            self.baseline = Some(weight_g);
            info!("Soap: new bottle detected ({:.1} g)", weight_g);
            out.event = Some(SoapEvent::NewBottle { weight: weight_g });
        } else {
            debug!("Soap: returned, delta {:.1} g", delta);
            out.event = Some(SoapEvent::Unchanged { delta });
        }
        out
    }

    fn low_bottle_due(&mut self, now_ms: u64) -> Option<f32> {
        let baseline = self.baseline.filter(|b| *b < self.empty_g)?;
        let due = self
            .last_low_warning_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.warn_interval_ms);
        if !due {
            return None;
        }
        self.last_low_warning_ms = Some(now_ms);
        warn!("Soap: bottle nearly empty ({:.1} g)", baseline);
        Some(baseline)
    }

    pub fn phase(&self) -> SoapPhase {
        self.phase
    }

    /// Baseline, meaningful only while the bottle is present.
    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }
}
