//! System configuration parameters
//!
//! Every tunable constant for both nodes. Resolved once at startup
//! (defaults, optionally overridden by `config.json` on the sensor node)
//! and never changed while the loop runs.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Proximity zones ---
    /// Lower distance bound (cm, exclusive) for a zone to count as occupied
    pub proximity_min_cm: f32,
    /// Upper distance bound (cm, exclusive)
    pub proximity_max_cm: f32,
    /// Poll interval of each zone (milliseconds)
    pub zone_poll_interval_ms: u32,
    /// Stagger of zone B relative to zone A (milliseconds)
    pub zone_b_offset_ms: u32,
    /// Echo wait bound for one measurement (microseconds)
    pub echo_timeout_us: u32,

    // --- Soap scale ---
    /// Below this weight (g) the bottle is considered lifted off the scale
    pub soap_present_threshold_g: f32,
    /// Minimum weight drop (g) counted as soap use
    pub soap_use_threshold_g: f32,
    /// Baseline below this weight (g) raises the low-bottle diagnostic
    pub soap_empty_threshold_g: f32,
    /// Weight change (g) treated as a bottle swap
    pub soap_new_bottle_delta_g: f32,
    /// Load-cell calibration factor (raw counts per gram)
    pub load_cell_scale: f32,
    /// Raw samples averaged per weight reading
    pub load_cell_samples: u8,
    /// Readings within ±this many grams are clamped to zero
    pub load_cell_deadband_g: f32,

    // --- Alert timers ---
    /// Grace period before an unscanned alert escalates (milliseconds)
    pub grace_period_ms: u32,
    /// Buzzer silence after a scan (milliseconds)
    pub scan_grace_ms: u32,
    /// After this long since the scan, any non-green status escalates
    pub scan_timeout_ms: u32,
    /// A repeat read of the same tag within this window is ignored
    pub scan_debounce_ms: u32,

    // --- Notifier ---
    /// Buzzer on/off toggle interval in GRACE mode (milliseconds)
    pub buzzer_blink_interval_ms: u32,

    // --- Loop / diagnostics ---
    /// Idle sleep at the end of each loop iteration (milliseconds)
    pub loop_interval_ms: u32,
    /// Weight diagnostic log interval (milliseconds)
    pub weight_log_interval_ms: u32,
    /// Minimum spacing of low-bottle warnings (milliseconds)
    pub low_bottle_warning_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Proximity
            proximity_min_cm: 1.0,
            proximity_max_cm: 7.0,
            zone_poll_interval_ms: 500,
            zone_b_offset_ms: 250,
            echo_timeout_us: 30_000,

            // Soap scale
            soap_present_threshold_g: 100.0,
            soap_use_threshold_g: 3.0,
            soap_empty_threshold_g: 75.0,
            soap_new_bottle_delta_g: 300.0,
            load_cell_scale: 1143.3771,
            load_cell_samples: 6,
            load_cell_deadband_g: 0.5,

            // Alert timers
            grace_period_ms: 15_000,
            scan_grace_ms: 30_000,
            scan_timeout_ms: 60_000,
            scan_debounce_ms: 1_000,

            // Notifier
            buzzer_blink_interval_ms: 500,

            // Loop / diagnostics
            loop_interval_ms: 50,
            weight_log_interval_ms: 5_000,
            low_bottle_warning_interval_ms: 30_000,
        }
    }
}

impl SystemConfig {
    /// Range-check the configuration. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.proximity_min_cm >= 0.0 && self.proximity_min_cm < self.proximity_max_cm) {
            return Err(ConfigError::ValidationFailed(
                "proximity window must satisfy 0 <= min < max",
            ));
        }
        if self.zone_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("zone_poll_interval_ms must be > 0"));
        }
        if self.zone_b_offset_ms >= self.zone_poll_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "zone_b_offset_ms must be < zone_poll_interval_ms",
            ));
        }
        if self.echo_timeout_us == 0 {
            return Err(ConfigError::ValidationFailed("echo_timeout_us must be > 0"));
        }
        if !(self.soap_use_threshold_g > 0.0
            && self.soap_use_threshold_g < self.soap_present_threshold_g)
        {
            return Err(ConfigError::ValidationFailed(
                "soap_use_threshold_g must be in (0, soap_present_threshold_g)",
            ));
        }
        if self.soap_new_bottle_delta_g <= self.soap_use_threshold_g {
            return Err(ConfigError::ValidationFailed(
                "soap_new_bottle_delta_g must exceed soap_use_threshold_g",
            ));
        }
        if self.load_cell_scale == 0.0 || self.load_cell_samples == 0 {
            return Err(ConfigError::ValidationFailed(
                "load cell scale and sample count must be non-zero",
            ));
        }
        if self.scan_grace_ms >= self.scan_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "scan_grace_ms must be < scan_timeout_ms",
            ));
        }
        if self.grace_period_ms == 0 || self.buzzer_blink_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "grace_period_ms and buzzer_blink_interval_ms must be > 0",
            ));
        }
        if !(10..=1000).contains(&self.loop_interval_ms) {
            return Err(ConfigError::ValidationFailed("loop_interval_ms must be 10–1000"));
        }
        Ok(())
    }
}
