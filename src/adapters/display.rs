//! Console display adapter.
//!
//! Implements [`DisplayPort`] by writing each frame to the log, one line
//! per redraw. The notifier's OLED panel is driven from the same
//! [`DisplayFrame`]; pixel rendering is left to the panel driver.

use log::info;

use crate::app::ports::DisplayPort;
use crate::mirror::DisplayFrame;

#[derive(Default)]
pub struct LogDisplay {
    redraws: u32,
    last: Option<DisplayFrame>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redraws(&self) -> u32 {
        self.redraws
    }

    /// The frame most recently shown.
    pub fn last(&self) -> Option<&DisplayFrame> {
        self.last.as_ref()
    }
}

impl DisplayPort for LogDisplay {
    fn show(&mut self, frame: &DisplayFrame) {
        self.redraws += 1;
        info!("OLED | {}", frame);
        self.last = Some(frame.clone());
    }
}
