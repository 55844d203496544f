//! Peripheral drivers and one-shot hardware initialisation.
//!
//! Sensor and indicator drivers are generic over `embedded-hal` 1.0 so
//! they run against `esp-idf-hal` pins on the device and against mock
//! pins in host tests.

pub mod buzzer;
pub mod hw_init;
pub mod hx711;
pub mod mfrc522;
pub mod traffic_light;
pub mod ultrasonic;
