//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART console in production), one pipe-delimited
//! line per event.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::protocol::NO_NAME;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn or_none(name: Option<&str>) -> &str {
    name.unwrap_or(NO_NAME)
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { state, next_up } => {
                info!(
                    "START | initial_state={:?} | next_up={}",
                    state,
                    or_none(next_up.as_deref())
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::TagScanned {
                tag,
                name: Some(name),
                recorded,
            } => {
                info!(
                    "SCAN | uid={} | name={} | {}",
                    tag,
                    name,
                    if *recorded {
                        "recorded during alert"
                    } else {
                        "outside alert"
                    }
                );
            }
            AppEvent::TagScanned { tag, name: None, .. } => {
                warn!("SCAN | uid={} | unknown tag", tag);
            }
            AppEvent::SoapUsed { grams, tracked } => {
                info!(
                    "SOAP | used {:.1} g | {}",
                    grams,
                    if *tracked { "tracked" } else { "not tracked" }
                );
            }
            AppEvent::Resolved {
                name,
                count,
                next_up,
            } => {
                info!(
                    "CLEAN | credited {} (count={}) | next_up={}",
                    name,
                    count,
                    or_none(next_up.as_deref())
                );
            }
            AppEvent::CountsReset { next_up } => {
                info!(
                    "RESET | all counts zeroed | next_up={}",
                    or_none(next_up.as_deref())
                );
            }
            AppEvent::LowBottle { baseline_g } => {
                warn!("SOAP | bottle low: baseline {:.1} g", baseline_g);
            }
            AppEvent::WeightSample {
                grams,
                baseline_g,
                phase,
            } => match baseline_g {
                Some(b) => info!(
                    "WEIGHT | {:.1} g | baseline={:.1} g | phase={:?}",
                    grams, b, phase
                ),
                None => info!(
                    "WEIGHT | {:.1} g | baseline=none | phase={:?}",
                    grams, phase
                ),
            },
            AppEvent::MessageApplied(msg) => {
                let frame = msg.encode();
                info!(
                    "RECV | {}",
                    core::str::from_utf8(&frame).unwrap_or("<binary>")
                );
            }
            AppEvent::MessageRejected(e) => {
                warn!("RECV | dropped: {}", e);
            }
        }
    }
}
