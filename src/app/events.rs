//! Outbound application events.
//!
//! Both services emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them; the
//! firmware logs them to the serial console.

use crate::fsm::StateId;
use crate::protocol::{Message, ProtocolError};
use crate::registry::TagId;
use crate::sensors::soap::SoapPhase;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The sensor service has started (carries initial state and next-up).
    Started { state: StateId, next_up: Option<String> },

    /// The coordinator transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A tag was read. `name` is `None` for unregistered tags;
    /// `recorded` says whether it counted toward an open alert.
    TagScanned { tag: TagId, name: Option<&'static str>, recorded: bool },

    /// The bottle came back lighter.
    SoapUsed { grams: f32, tracked: bool },

    /// An alert was resolved and `name` credited.
    Resolved { name: String, count: u32, next_up: Option<String> },

    /// All cleaning counts were zeroed.
    CountsReset { next_up: Option<String> },

    /// The bottle baseline is below the empty threshold.
    LowBottle { baseline_g: f32 },

    /// Periodic load-cell diagnostic.
    WeightSample { grams: f32, baseline_g: Option<f32>, phase: SoapPhase },

    /// Notifier: a frame decoded and was applied.
    MessageApplied(Message),

    /// Notifier: a frame was dropped.
    MessageRejected(ProtocolError),
}
