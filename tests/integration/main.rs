//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one node's pipeline
//! against mock adapters. All tests run on the host (x86_64) with no
//! real hardware or radio.

mod mock_hw;
mod notifier_tests;
mod sensor_service_tests;
