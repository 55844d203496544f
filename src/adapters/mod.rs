//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                    | Connects to                |
//! |---------------|-------------------------------|----------------------------|
//! | `hardware`    | ProximityPort, WeightPort     | HC-SR04 ×2, HX711          |
//! |               | TagReaderPort                 | MFRC522 (SPI)              |
//! |               | IndicatorPort, DisplayPort    | LEDs, buzzer, panel        |
//! | `espnow_link` | LinkPort                      | ESP-NOW, one fixed peer    |
//! | `file_store`  | LedgerStore, ConfigPort       | JSON files on SPIFFS       |
//! | `log_sink`    | EventSink                     | Serial log output          |
//! | `display`     | DisplayPort                   | Serial log output          |
//! | `console`     | (AppCommand source)           | UART stdin                 |
//! | `http`        | (status page)                 | TCP port 80                |
//! | `time`        | (monotonic clock)             | ESP32 system timer         |
//! | `wifi`        | (radio bring-up)              | ESP-IDF WiFi STA           |

pub mod console;
pub mod display;
pub mod espnow_link;
pub mod file_store;
pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod time;
pub mod wifi;
