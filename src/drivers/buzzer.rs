//! Active buzzer on a single GPIO.

use embedded_hal::digital::OutputPin;

use crate::error::SensorError;

pub struct Buzzer<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Buzzer<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, on: false }
    }

    /// Drive the pin; writes only when the level changes.
    pub fn set(&mut self, on: bool) -> Result<(), SensorError> {
        if on == self.on {
            return Ok(());
        }
        let r = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        r.map_err(|_| SensorError::Gpio)?;
        self.on = on;
        Ok(())
    }

    /// Force the pin low regardless of the cached level.
    pub fn silence(&mut self) -> Result<(), SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Gpio)?;
        self.on = false;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
