//! HC-SR04 style echo ranger.
//!
//! A 10 µs trigger pulse starts a measurement; the sensor then holds its
//! echo line high for the round-trip time of the ping. Both waits (for the
//! rising edge and for the falling edge) are bounded so a missing or
//! unplugged sensor costs at most two timeouts per poll.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

/// Speed of sound in cm/µs at room temperature.
const SOUND_CM_PER_US: f32 = 0.0343;

/// One trigger/echo pin pair.
pub struct EchoRanger<T, E, D> {
    trig: T,
    echo: E,
    delay: D,
    clock: fn() -> u64,
    timeout_us: u64,
}

impl<T, E, D> EchoRanger<T, E, D>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
{
    /// `clock` returns monotonic microseconds; the edge waits poll it.
    pub fn new(trig: T, echo: E, delay: D, clock: fn() -> u64, timeout_us: u32) -> Self {
        Self {
            trig,
            echo,
            delay,
            clock,
            timeout_us: u64::from(timeout_us),
        }
    }

    /// Drive the trigger low so the first measurement starts clean.
    pub fn settle(&mut self) -> Result<(), SensorError> {
        self.trig.set_low().map_err(|_| SensorError::Gpio)
    }

    /// Fire one ping and return the distance in centimetres.
    pub fn measure_cm(&mut self) -> Result<f32, SensorError> {
        self.trig.set_low().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(2);
        self.trig.set_high().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(10);
        self.trig.set_low().map_err(|_| SensorError::Gpio)?;

        self.wait_for(true)?;
        let rise = (self.clock)();
        self.wait_for(false)?;
        let duration_us = (self.clock)().saturating_sub(rise);

        Ok(duration_cm(duration_us))
    }

    fn wait_for(&mut self, level: bool) -> Result<(), SensorError> {
        let start = (self.clock)();
        loop {
            let high = self.echo.is_high().map_err(|_| SensorError::Gpio)?;
            if high == level {
                return Ok(());
            }
            if (self.clock)().saturating_sub(start) > self.timeout_us {
                return Err(SensorError::Timeout);
            }
        }
    }
}

/// Convert an echo pulse width to a one-way distance.
pub fn duration_cm(duration_us: u64) -> f32 {
    duration_us as f32 * SOUND_CM_PER_US / 2.0
}
