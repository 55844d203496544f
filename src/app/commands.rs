//! Inbound commands to the sensor service.
//!
//! These represent actions requested by the outside world (tag reader,
//! serial console) that the [`SensorService`](super::service::SensorService)
//! interprets and acts upon.

use crate::registry::TagId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// An identity tag was presented to the reader.
    TagScanned(TagId),

    /// Zero every cleaning count (serial console `r`/`R`).
    ResetCounts,
}

impl AppCommand {
    /// Map one console byte to a command. Anything but `r`/`R` is ignored.
    pub fn from_console_byte(byte: u8) -> Option<Self> {
        match byte {
            b'r' | b'R' => Some(Self::ResetCounts),
            _ => None,
        }
    }
}
