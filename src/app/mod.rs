//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for both DishDuty nodes:
//! the sensor node's alert coordination and duty crediting, and the
//! notifier node's presentation mirror. All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod notifier;
pub mod ports;
pub mod service;
