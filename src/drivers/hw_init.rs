//! One-shot platform initialization and low-level helpers.
//!
//! Mounts the SPIFFS partition that holds the ledger files, switches the
//! serial console to non-blocking reads, and exposes a microsecond clock
//! for the echo-ranging driver. Uses raw ESP-IDF sys calls on the device
//! and host equivalents elsewhere. Called once from `main()` before the
//! event loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot platform initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    StorageMountFailed(i32),
    ConsoleConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::StorageMountFailed(rc) => write!(f, "SPIFFS mount failed (rc={})", rc),
            Self::ConsoleConfigFailed(rc) => write!(f, "console fcntl failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(_: HwInitError) -> Self {
        Self::Init("platform initialization failed")
    }
}

// ── Storage ───────────────────────────────────────────────────

/// Mount point of the data partition on the device.
pub const STORAGE_BASE: &str = "/spiffs";

/// Mount the SPIFFS data partition at [`STORAGE_BASE`], formatting it on
/// first boot.
#[cfg(target_os = "espidf")]
pub fn init_storage() -> Result<(), HwInitError> {
    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 5,
        format_if_mount_failed: true,
    };
    // SAFETY: conf and its string outlive the call; registration copies them.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::StorageMountFailed(ret));
    }
    info!("hw_init: SPIFFS mounted at {}", STORAGE_BASE);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_storage() -> Result<(), HwInitError> {
    info!("hw_init(sim): storage mount skipped");
    Ok(())
}

// ── Console ───────────────────────────────────────────────────

/// Put stdin into non-blocking mode so the loop can poll for reset keys.
#[cfg(target_os = "espidf")]
pub fn init_console() -> Result<(), HwInitError> {
    // SAFETY: fcntl on fd 0, which the VFS console driver owns for the
    // lifetime of the program.
    let ret = unsafe {
        let flags = fcntl(0, F_GETFL as i32);
        fcntl(0, F_SETFL as i32, flags | O_NONBLOCK as i32)
    };
    if ret < 0 {
        return Err(HwInitError::ConsoleConfigFailed(ret));
    }
    info!("hw_init: console in non-blocking mode");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_console() -> Result<(), HwInitError> {
    info!("hw_init(sim): console uses the injected byte queue");
    Ok(())
}

// ── Clock ─────────────────────────────────────────────────────

/// Microseconds since boot (monotonic).
#[cfg(target_os = "espidf")]
pub fn micros() -> u64 {
    // SAFETY: esp_timer_get_time is a read of the high-resolution timer.
    (unsafe { esp_timer_get_time() }) as u64
}

/// Microseconds since first call (monotonic).
#[cfg(not(target_os = "espidf"))]
pub fn micros() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_micros() as u64
}
