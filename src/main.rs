//! DishDuty sensor node: main entry point.
//!
//! Hexagonal architecture with a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHardware     EspNowLink    FileStore      LogEventSink  │
//! │  (Proximity+Weight  (LinkPort)    (LedgerStore   (EventSink)   │
//! │   +TagReader)                      +ConfigPort)                │
//! │  Console            StatusServer  WifiStation    Esp32Time     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             SensorService (pure logic)                 │    │
//! │  │  Presence · Soap · Alert FSM · Ledger · Registry       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Delay, FreeRtos};
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, PinDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::spi::{SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use dishduty::adapters::console::Console;
use dishduty::adapters::espnow_link::EspNowLink;
use dishduty::adapters::file_store::FileStore;
use dishduty::adapters::hardware::SensorHardware;
use dishduty::adapters::http::StatusServer;
use dishduty::adapters::log_sink::LogEventSink;
use dishduty::adapters::time::Esp32TimeAdapter;
use dishduty::adapters::wifi::{JoinPolicy, WifiCredentials, WifiStation};
use dishduty::app::ports::ConfigPort;
use dishduty::app::service::SensorService;
use dishduty::config::SystemConfig;
use dishduty::drivers::hw_init;
use dishduty::drivers::hx711::{Gain, Hx711};
use dishduty::drivers::mfrc522::Mfrc522;
use dishduty::drivers::ultrasonic::EchoRanger;
use dishduty::ledger::DutyLedger;
use dishduty::pins;
use dishduty::registry::IdentityRegistry;

/// Output pin by number from [`pins`].
fn output(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, esp_idf_svc::hal::gpio::Output>> {
    // SAFETY: every GPIO number in `pins` is claimed exactly once per node.
    Ok(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?)
}

/// Input pin by number from [`pins`].
fn input(gpio: i32) -> Result<PinDriver<'static, AnyInputPin, esp_idf_svc::hal::gpio::Input>> {
    // SAFETY: as for `output`.
    Ok(PinDriver::input(unsafe { AnyInputPin::new(gpio) })?)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  DishDuty sensor node v{}         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let clock = Esp32TimeAdapter::new();

    // ── 2. Storage + config ───────────────────────────────────
    if let Err(e) = hw_init::init_storage() {
        error!("{}; counts will not survive a reboot", e);
    }
    if let Err(e) = hw_init::init_console() {
        warn!("{}; console reset key disabled", e);
    }

    let mut store = FileStore::new(hw_init::STORAGE_BASE);
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Radio: station mode, optional AP join, ESP-NOW peer ─
    let mut wifi = WifiStation::start(peripherals.modem, sysloop, EspDefaultNvsPartition::take().ok())
        .map_err(|e| anyhow::anyhow!("WiFi start failed: {}", e))?;
    let mut http = None;
    match WifiCredentials::from_build_env() {
        Some(Ok(creds)) => match wifi.join(&creds, JoinPolicy::default()) {
            Ok(ip) => {
                info!("Open http://{}/ to view DishDuty stats", ip);
                http = StatusServer::bind(pins::HTTP_PORT)
                    .map_err(|e| warn!("HTTP bind failed: {}", e))
                    .ok();
            }
            Err(e) => warn!("WiFi: {}; status page disabled", e),
        },
        Some(Err(e)) => warn!("WiFi credentials rejected: {}", e),
        None => info!("WiFi: no credentials built in, status page disabled"),
    }
    let mut link = EspNowLink::new(pins::NOTIFIER_MAC)?;

    // ── 4. Sensors ────────────────────────────────────────────
    let delay = Delay::new_default();
    let zone_a = EchoRanger::new(
        output(pins::TRIG_A_GPIO)?,
        input(pins::ECHO_A_GPIO)?,
        delay,
        hw_init::micros,
        config.echo_timeout_us,
    );
    let zone_b = EchoRanger::new(
        output(pins::TRIG_B_GPIO)?,
        input(pins::ECHO_B_GPIO)?,
        delay,
        hw_init::micros,
        config.echo_timeout_us,
    );
    let scale = Hx711::new(
        input(pins::HX711_DT_GPIO)?,
        output(pins::HX711_SCK_GPIO)?,
        delay,
        Gain::A128,
    );

    let mut rfid_rst = output(pins::RFID_RST_GPIO)?;
    rfid_rst.set_high()?;
    let spi = SpiDriver::new(
        peripherals.spi2,
        // SAFETY: as for `output`.
        unsafe { AnyOutputPin::new(pins::RFID_SCK_GPIO) },
        unsafe { AnyOutputPin::new(pins::RFID_MOSI_GPIO) },
        Some(unsafe { AnyIOPin::new(pins::RFID_MISO_GPIO) }),
        &SpiDriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        spi,
        Some(unsafe { AnyOutputPin::new(pins::RFID_CS_GPIO) }),
        &SpiConfig::new().baudrate(Hertz(pins::RFID_SPI_HZ)),
    )?;
    let reader = Mfrc522::new(spi, delay);

    let mut hw = SensorHardware::new(zone_a, zone_b, scale, reader, &config);
    FreeRtos::delay_ms(200);
    info!("Taring load cell...");
    FreeRtos::delay_ms(2_000);
    if let Err(e) = hw.init() {
        error!("Sensor init incomplete: {}; continuing with missing readings", e);
    }

    // ── 5. Application core ───────────────────────────────────
    let registry = IdentityRegistry::household();
    let ledger = DutyLedger::load(&registry, &store);
    let mut service = SensorService::new(config.clone(), registry, ledger);
    let mut sink = LogEventSink::new();
    let mut console = Console::new();

    service.start(clock.uptime_ms(), &mut link, &mut sink);
    info!("System ready. Entering main loop.");

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        if let Some(server) = http.as_mut() {
            server.poll(service.ledger(), service.last_cleaner());
        }
        if let Some(cmd) = console.poll() {
            service.handle_command(cmd, &mut link, &mut store, &mut sink);
        }

        service.tick(clock.uptime_ms(), &mut hw, &mut link, &mut store, &mut sink);

        FreeRtos::delay_ms(config.loop_interval_ms);
    }
}
