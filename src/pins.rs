//! GPIO / peripheral pin assignments for both DishDuty boards.
//!
//! Single source of truth: the node binaries build every pin from these
//! numbers rather than hard-coding them. Both boards are plain ESP32
//! DevKit modules.

// ═══════════════════════════════════════════════════════════════
// Sensor node
// ═══════════════════════════════════════════════════════════════

// ---------------------------------------------------------------------------
// Ultrasonic rangers (HC-SR04), one per sink zone
// ---------------------------------------------------------------------------

/// Zone A trigger (output).
pub const TRIG_A_GPIO: i32 = 32;
/// Zone A echo (input, 5 V → 3.3 V divider on the board).
pub const ECHO_A_GPIO: i32 = 33;
/// Zone B trigger (output).
pub const TRIG_B_GPIO: i32 = 27;
/// Zone B echo (input).
pub const ECHO_B_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Load cell ADC (HX711) under the soap bottle
// ---------------------------------------------------------------------------

pub const HX711_DT_GPIO: i32 = 12;
pub const HX711_SCK_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Tag reader (MFRC522) on SPI2
// ---------------------------------------------------------------------------

pub const RFID_SCK_GPIO: i32 = 5;
pub const RFID_MOSI_GPIO: i32 = 19;
pub const RFID_MISO_GPIO: i32 = 21;
pub const RFID_CS_GPIO: i32 = 26;
/// Held high; pulling it low powers the reader down.
pub const RFID_RST_GPIO: i32 = 25;
/// SPI clock for the reader.
pub const RFID_SPI_HZ: u32 = 2_500_000;

/// TCP port of the status page.
pub const HTTP_PORT: u16 = 80;

// ═══════════════════════════════════════════════════════════════
// Notifier node
// ═══════════════════════════════════════════════════════════════

pub const LED_GREEN_GPIO: i32 = 14;
pub const LED_RED_GPIO: i32 = 26;
pub const LED_YELLOW_GPIO: i32 = 27;
/// Active buzzer, driven directly (HIGH = sounding).
pub const BUZZER_GPIO: i32 = 33;

/// OLED panel (SSD1306, 128×64) on I2C0.
pub const OLED_SCL_GPIO: i32 = 32;
pub const OLED_SDA_GPIO: i32 = 15;
pub const OLED_I2C_ADDR: u8 = 0x3D;

// ═══════════════════════════════════════════════════════════════
// Radio peers
// ═══════════════════════════════════════════════════════════════

/// Station MAC of the notifier node (the sensor node's only peer).
pub const NOTIFIER_MAC: [u8; 6] = [0xF4, 0x65, 0x0B, 0x34, 0x1A, 0x84];
/// Station MAC of the sensor node (the notifier's only peer).
pub const SENSOR_MAC: [u8; 6] = [0xF4, 0x65, 0x0B, 0x30, 0x1A, 0x84];
