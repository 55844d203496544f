//! Hardware adapters: bridge the drivers to the domain port traits.
//!
//! [`SensorHardware`] owns the two echo rangers, the load cell and the tag
//! reader and exposes them through [`ProximityPort`], [`WeightPort`] and
//! [`TagReaderPort`]. [`NotifierHardware`] owns the traffic light, the
//! buzzer and the display behind [`IndicatorPort`] and [`DisplayPort`].
//!
//! Driver faults never reach the service: a failed measurement reads as
//! "no reading" and is logged once per fault episode.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;
use log::{debug, info, warn};

use crate::app::ports::{DisplayPort, IndicatorPort, ProximityPort, TagReaderPort, WeightPort};
use crate::config::SystemConfig;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::hx711::Hx711;
use crate::drivers::mfrc522::Mfrc522;
use crate::drivers::traffic_light::TrafficLight;
use crate::drivers::ultrasonic::EchoRanger;
use crate::error::{Result, SensorError};
use crate::mirror::DisplayFrame;
use crate::protocol::Status;
use crate::registry::TagId;
use crate::sensors::presence::Zone;

/// Raw-count averaging used for the one-off tare at boot.
const TARE_SAMPLES: u8 = 15;

/// Clamp readings within ±`band` grams to exactly zero.
pub fn apply_deadband(grams: f32, band: f32) -> f32 {
    if grams.abs() < band { 0.0 } else { grams }
}

// ── Sensor node ───────────────────────────────────────────────

pub struct SensorHardware<O, I, D, S> {
    rangers: [EchoRanger<O, I, D>; 2],
    scale: Hx711<I, O, D>,
    reader: Mfrc522<S, D>,
    scale_factor: f32,
    samples: u8,
    deadband_g: f32,
    scale_fault: bool,
}

impl<O, I, D, S> SensorHardware<O, I, D, S>
where
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
    S: SpiDevice,
{
    pub fn new(
        zone_a: EchoRanger<O, I, D>,
        zone_b: EchoRanger<O, I, D>,
        scale: Hx711<I, O, D>,
        reader: Mfrc522<S, D>,
        config: &SystemConfig,
    ) -> Self {
        Self {
            rangers: [zone_a, zone_b],
            scale,
            reader,
            scale_factor: config.load_cell_scale,
            samples: config.load_cell_samples,
            deadband_g: config.load_cell_deadband_g,
            scale_fault: false,
        }
    }

    /// Bring every device to a known state and tare the empty scale.
    /// Must run with nothing on the load cell.
    pub fn init(&mut self) -> Result<()> {
        for ranger in &mut self.rangers {
            ranger.settle()?;
        }
        let version = self.reader.init()?;
        info!("Hardware: tag reader version 0x{:02X}", version);

        self.scale.power_up()?;
        let offset = self.scale.tare(TARE_SAMPLES)?;
        info!("Hardware: load cell tared (offset {:.0})", offset);
        Ok(())
    }
}

impl<O, I, D, S> ProximityPort for SensorHardware<O, I, D, S>
where
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
    S: SpiDevice,
{
    fn distance_cm(&mut self, zone: Zone) -> Option<f32> {
        match self.rangers[zone.index()].measure_cm() {
            Ok(cm) => Some(cm),
            Err(e) => {
                debug!("Hardware: zone {:?} no echo ({})", zone, e);
                None
            }
        }
    }
}

impl<O, I, D, S> WeightPort for SensorHardware<O, I, D, S>
where
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
    S: SpiDevice,
{
    fn read_grams(&mut self) -> Option<f32> {
        match self.scale.get_units(self.scale_factor, self.samples) {
            Ok(grams) => {
                if self.scale_fault {
                    info!("Hardware: load cell recovered");
                    self.scale_fault = false;
                }
                Some(apply_deadband(grams, self.deadband_g))
            }
            Err(e) => {
                if !self.scale_fault {
                    warn!("Hardware: load cell read failed ({})", e);
                    self.scale_fault = true;
                }
                None
            }
        }
    }
}

impl<O, I, D, S> TagReaderPort for SensorHardware<O, I, D, S>
where
    O: OutputPin,
    I: InputPin,
    D: DelayNs,
    S: SpiDevice,
{
    fn poll_tag(&mut self) -> Option<TagId> {
        match self.reader.read_uid() {
            Ok(Some(uid)) => TagId::from_uid(&uid),
            Ok(None) => None,
            Err(e) => {
                debug!("Hardware: tag read incomplete ({})", e);
                None
            }
        }
    }
}

// ── Notifier node ─────────────────────────────────────────────

pub struct NotifierHardware<O, P> {
    light: TrafficLight<O, O, O>,
    buzzer: Buzzer<O>,
    display: P,
}

impl<O: OutputPin, P: DisplayPort> NotifierHardware<O, P> {
    pub fn new(light: TrafficLight<O, O, O>, buzzer: Buzzer<O>, display: P) -> Self {
        Self {
            light,
            buzzer,
            display,
        }
    }

    pub fn display(&self) -> &P {
        &self.display
    }

    pub fn lit(&self) -> Option<Status> {
        self.light.lit()
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer.is_on()
    }
}

impl<O: OutputPin, P: DisplayPort> IndicatorPort for NotifierHardware<O, P> {
    fn show_status(&mut self, status: Status) {
        if let Err(e) = self.light.show(status) {
            warn!("Hardware: status LEDs: {}", e);
        }
    }

    fn set_buzzer(&mut self, on: bool) {
        let r = if on { self.buzzer.set(true) } else { self.buzzer.silence() };
        if let Err(e) = r {
            warn!("Hardware: buzzer: {}", e);
        }
    }
}

impl<O: OutputPin, P: DisplayPort> DisplayPort for NotifierHardware<O, P> {
    fn show(&mut self, frame: &DisplayFrame) {
        self.display.show(frame);
    }
}
