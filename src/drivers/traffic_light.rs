//! Three-LED status light on the notifier node.
//!
//! Exactly one LED is lit at a time; the other two are switched off
//! before the new one is switched on.

use embedded_hal::digital::OutputPin;

use crate::error::SensorError;
use crate::protocol::Status;

pub struct TrafficLight<G, Y, R> {
    green: G,
    yellow: Y,
    red: R,
    lit: Option<Status>,
}

impl<G, Y, R> TrafficLight<G, Y, R>
where
    G: OutputPin,
    Y: OutputPin,
    R: OutputPin,
{
    pub fn new(green: G, yellow: Y, red: R) -> Self {
        Self {
            green,
            yellow,
            red,
            lit: None,
        }
    }

    pub fn show(&mut self, status: Status) -> Result<(), SensorError> {
        match status {
            Status::Green => {
                self.red.set_low().map_err(gpio)?;
                self.yellow.set_low().map_err(gpio)?;
                self.green.set_high().map_err(gpio)?;
            }
            Status::Yellow => {
                self.red.set_low().map_err(gpio)?;
                self.green.set_low().map_err(gpio)?;
                self.yellow.set_high().map_err(gpio)?;
            }
            Status::Red => {
                self.green.set_low().map_err(gpio)?;
                self.yellow.set_low().map_err(gpio)?;
                self.red.set_high().map_err(gpio)?;
            }
        }
        self.lit = Some(status);
        Ok(())
    }

    /// The colour last shown, if any.
    pub fn lit(&self) -> Option<Status> {
        self.lit
    }
}

fn gpio<E>(_: E) -> SensorError {
    SensorError::Gpio
}
