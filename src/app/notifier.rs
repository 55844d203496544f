//! Notifier-node application service.
//!
//! Drains the radio inbox, folds each decoded message into the
//! [`PresentationMirror`], and drives the LEDs, buzzer and screen from it.
//! Frames that do not decode are dropped with a diagnostic and leave the
//! mirror untouched.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::mirror::PresentationMirror;
use crate::protocol::Message;

use super::events::AppEvent;
use super::ports::{DisplayPort, EventSink, IndicatorPort, LinkPort};

/// The notifier node's application service.
pub struct NotifierService {
    mirror: PresentationMirror,
    applied: u32,
    rejected: u32,
}

impl NotifierService {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            mirror: PresentationMirror::new(config),
            applied: 0,
            rejected: 0,
        }
    }

    /// Draw the boot state: green LED, placeholder names, buzzer off.
    pub fn start(&mut self, out: &mut (impl IndicatorPort + DisplayPort)) {
        out.show_status(self.mirror.status());
        out.set_buzzer(false);
        out.show(&self.mirror.frame());
        info!("Notifier ready, waiting for messages");
    }

    /// One loop iteration: apply every pending frame, then advance the
    /// buzzer pattern.
    pub fn poll(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkPort,
        out: &mut (impl IndicatorPort + DisplayPort),
        sink: &mut impl EventSink,
    ) {
        let mut redraw = false;
        while let Some(frame) = link.try_recv() {
            match Message::decode(&frame) {
                Ok(msg) => {
                    let change = self.mirror.apply(&msg);
                    if change.status {
                        out.show_status(self.mirror.status());
                    }
                    redraw |= change.display;
                    self.applied += 1;
                    sink.emit(&AppEvent::MessageApplied(msg));
                }
                Err(e) => {
                    self.rejected += 1;
                    warn!("Notifier: dropped frame {:02X?}: {}", frame.as_slice(), e);
                    sink.emit(&AppEvent::MessageRejected(e));
                }
            }
        }

        if redraw {
            out.show(&self.mirror.frame());
        }
        let level = self.mirror.update_buzzer(now_ms);
        out.set_buzzer(level);
    }

    pub fn mirror(&self) -> &PresentationMirror {
        &self.mirror
    }

    /// Frames applied and frames rejected, since startup.
    pub fn stats(&self) -> (u32, u32) {
        (self.applied, self.rejected)
    }
}
