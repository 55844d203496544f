//! DishDuty firmware library.
//!
//! Shared by both node binaries and exposed for integration testing. The
//! domain core (coordinator, detectors, ledger, wire protocol, mirror) is
//! pure logic behind the port traits in [`app::ports`]. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each adapter and driver.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod ledger;
pub mod mirror;
pub mod pins;
pub mod protocol;
pub mod registry;
pub mod status_page;

pub mod adapters;
pub mod drivers;
pub mod sensors;
