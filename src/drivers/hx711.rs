//! HX711 24-bit load-cell ADC, bit-banged over two GPIOs.
//!
//! DOUT falls when a conversion is ready. Each of the 24 data bits is
//! clocked out MSB first by a pulse on PD_SCK and sampled after the
//! falling edge; 1–3 extra pulses select the gain and channel of the
//! *next* conversion.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

/// Ready-wait bound, in 1 ms polls. The chip converts at 10 Hz.
const READY_POLLS: u32 = 200;
/// Gap between averaged samples.
const SAMPLE_GAP_MS: u32 = 10;

/// Channel/gain of the next conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    /// Channel A, gain 128.
    #[default]
    A128,
    /// Channel A, gain 64.
    A64,
    /// Channel B, gain 32.
    B32,
}

impl Gain {
    /// Extra SCK pulses after the data bits.
    pub fn pulses(self) -> u8 {
        match self {
            Self::A128 => 1,
            Self::A64 => 3,
            Self::B32 => 2,
        }
    }
}

pub struct Hx711<DT, SCK, D> {
    dout: DT,
    sck: SCK,
    delay: D,
    gain: Gain,
    offset: f32,
}

impl<DT, SCK, D> Hx711<DT, SCK, D>
where
    DT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    pub fn new(dout: DT, sck: SCK, delay: D, gain: Gain) -> Self {
        Self {
            dout,
            sck,
            delay,
            gain,
            offset: 0.0,
        }
    }

    /// Wake the chip and discard one conversion so `gain` takes effect.
    pub fn power_up(&mut self) -> Result<(), SensorError> {
        self.sck.set_low().map_err(|_| SensorError::Gpio)?;
        self.read_raw().map(|_| ())
    }

    pub fn is_ready(&mut self) -> Result<bool, SensorError> {
        self.dout.is_low().map_err(|_| SensorError::Gpio)
    }

    /// One signed 24-bit conversion.
    pub fn read_raw(&mut self) -> Result<i32, SensorError> {
        let mut polls = 0;
        while !self.is_ready()? {
            if polls >= READY_POLLS {
                return Err(SensorError::Timeout);
            }
            polls += 1;
            self.delay.delay_ms(1);
        }

        let mut data: u32 = 0;
        for _ in 0..24 {
            self.pulse()?;
            data <<= 1;
            if self.dout.is_high().map_err(|_| SensorError::Gpio)? {
                data |= 1;
            }
        }
        for _ in 0..self.gain.pulses() {
            self.pulse()?;
        }

        Ok(sign_extend_24(data))
    }

    fn pulse(&mut self) -> Result<(), SensorError> {
        self.sck.set_high().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(1);
        self.sck.set_low().map_err(|_| SensorError::Gpio)?;
        self.delay.delay_us(1);
        Ok(())
    }

    /// Mean of `times` conversions, 10 ms apart.
    pub fn read_average(&mut self, times: u8) -> Result<f32, SensorError> {
        let times = times.max(1);
        let mut total: i64 = 0;
        for _ in 0..times {
            total += i64::from(self.read_raw()?);
            self.delay.delay_ms(SAMPLE_GAP_MS);
        }
        Ok(total as f32 / f32::from(times))
    }

    /// Record the current average as the zero offset.
    pub fn tare(&mut self, times: u8) -> Result<f32, SensorError> {
        self.offset = self.read_average(times)?;
        Ok(self.offset)
    }

    /// Offset-corrected average divided by `scale` (counts per unit).
    pub fn get_units(&mut self, scale: f32, times: u8) -> Result<f32, SensorError> {
        Ok((self.read_average(times)? - self.offset) / scale)
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }
}

/// Interpret the low 24 bits of `raw` as two's complement.
pub fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}
