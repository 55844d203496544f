//! Sensor fusion on the sensor node.
//!
//! Raw readings arrive through the port traits in [`crate::app::ports`];
//! the types here turn them into domain facts:
//!
//! - [`presence::PresenceDetector`] — two staggered proximity zones fused
//!   into an [`presence::Occupancy`] classification.
//! - [`soap::SoapUsageDetector`] — weight deltas across lift/replace
//!   cycles attributed as soap use.

pub mod presence;
pub mod soap;

pub use presence::{Occupancy, PresenceDetector, Zone};
pub use soap::{SoapPhase, SoapUsageDetector};
