//! DishDuty notifier node: main entry point.
//!
//! Receives status messages from the sensor node over ESP-NOW and mirrors
//! them onto the traffic light, the buzzer and the display. Holds no
//! durable state; a reboot returns it to GREEN / `---` / silent until the
//! next message arrives.
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use dishduty::adapters::display::LogDisplay;
use dishduty::adapters::espnow_link::EspNowLink;
use dishduty::adapters::hardware::NotifierHardware;
use dishduty::adapters::log_sink::LogEventSink;
use dishduty::adapters::time::Esp32TimeAdapter;
use dishduty::adapters::wifi::WifiStation;
use dishduty::app::notifier::NotifierService;
use dishduty::config::SystemConfig;
use dishduty::drivers::buzzer::Buzzer;
use dishduty::drivers::traffic_light::TrafficLight;
use dishduty::pins;

fn output(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, Output>> {
    // SAFETY: every GPIO number in `pins` is claimed exactly once per node.
    Ok(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  DishDuty notifier v{}            ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let clock = Esp32TimeAdapter::new();
    let config = SystemConfig::default();

    // ── 2. Radio: station mode only, never associates ─────────
    let _wifi = WifiStation::start(peripherals.modem, sysloop, EspDefaultNvsPartition::take().ok())
        .map_err(|e| anyhow::anyhow!("WiFi start failed: {}", e))?;
    let mut link = EspNowLink::new(pins::SENSOR_MAC)?;

    // ── 3. Outputs ────────────────────────────────────────────
    let light = TrafficLight::new(
        output(pins::LED_GREEN_GPIO)?,
        output(pins::LED_YELLOW_GPIO)?,
        output(pins::LED_RED_GPIO)?,
    );
    let buzzer = Buzzer::new(output(pins::BUZZER_GPIO)?);
    let mut hw = NotifierHardware::new(light, buzzer, LogDisplay::new());

    // ── 4. Application core ───────────────────────────────────
    let mut service = NotifierService::new(&config);
    let mut sink = LogEventSink::new();
    service.start(&mut hw);

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        service.poll(clock.uptime_ms(), &mut link, &mut hw, &mut sink);
        FreeRtos::delay_ms(config.loop_interval_ms);
    }
}
