//! Serial console command input.
//!
//! Polls the console for a single byte without blocking and maps it to an
//! [`AppCommand`]. On the device stdin is the UART VFS, switched to
//! non-blocking mode by `hw_init::init_console`. On the host the bytes
//! come from a static queue filled by [`sim_type`].

use log::debug;

use crate::app::commands::AppCommand;

#[cfg(not(target_os = "espidf"))]
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

#[cfg(not(target_os = "espidf"))]
static SIM_INPUT: Channel<CriticalSectionRawMutex, u8, 16> = Channel::new();

/// Simulation: queue keystrokes for the next polls.
#[cfg(not(target_os = "espidf"))]
pub fn sim_type(bytes: &[u8]) {
    for &b in bytes {
        let _ = SIM_INPUT.try_send(b);
    }
}

#[derive(Default)]
pub struct Console;

impl Console {
    pub fn new() -> Self {
        Self
    }

    /// One byte of pending input, if any.
    #[cfg(target_os = "espidf")]
    fn read_byte(&mut self) -> Option<u8> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match std::io::stdin().lock().read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_byte(&mut self) -> Option<u8> {
        SIM_INPUT.try_receive().ok()
    }

    /// Consume at most one byte and translate it. Unmapped bytes are
    /// discarded.
    pub fn poll(&mut self) -> Option<AppCommand> {
        let byte = self.read_byte()?;
        let cmd = AppCommand::from_console_byte(byte);
        if cmd.is_none() {
            debug!("Console: ignoring byte 0x{:02X}", byte);
        }
        cmd
    }
}
