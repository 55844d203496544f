//! MFRC522 13.56 MHz reader: just enough ISO 14443-A to read a card UID.
//!
//! `read_uid` sends REQA, and if a card answers runs one cascade level of
//! anticollision, returning the 4-byte UID after checking its BCC.
//! Authentication and block access are not implemented.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::error::SensorError;

// ── Registers ─────────────────────────────────────────────────

const COMMAND_REG: u8 = 0x01;
const COM_IEN_REG: u8 = 0x02;
const COM_IRQ_REG: u8 = 0x04;
const ERROR_REG: u8 = 0x06;
const FIFO_DATA_REG: u8 = 0x09;
const FIFO_LEVEL_REG: u8 = 0x0A;
const CONTROL_REG: u8 = 0x0C;
const BIT_FRAMING_REG: u8 = 0x0D;
const MODE_REG: u8 = 0x11;
const TX_CONTROL_REG: u8 = 0x14;
const TX_ASK_REG: u8 = 0x15;
const T_MODE_REG: u8 = 0x2A;
const T_PRESCALER_REG: u8 = 0x2B;
const T_RELOAD_REG_H: u8 = 0x2C;
const T_RELOAD_REG_L: u8 = 0x2D;
const VERSION_REG: u8 = 0x37;

// ── PCD commands ──────────────────────────────────────────────

const PCD_IDLE: u8 = 0x00;
const PCD_TRANSCEIVE: u8 = 0x0C;
const PCD_SOFT_RESET: u8 = 0x0F;

// ── PICC commands ─────────────────────────────────────────────

/// REQA: wake cards in IDLE state.
pub const PICC_REQIDL: u8 = 0x26;
/// SEL, cascade level 1.
pub const PICC_ANTICOLL: u8 = 0x93;

/// Interrupts enabled for a transceive: everything but HiAlert.
const IRQ_EN: u8 = 0x77;
/// RxIRq | IdleIRq.
const IRQ_DONE: u8 = 0x30;
/// TimerIRq.
const IRQ_TIMER: u8 = 0x01;
/// BufferOvfl | ParityErr | ProtocolErr | CollErr.
const ERR_MASK: u8 = 0x1B;
/// ComIrqReg polls before giving up on a transceive.
const IRQ_POLLS: u16 = 2000;

/// SPI address byte for a register write.
pub fn write_addr(reg: u8) -> u8 {
    (reg << 1) & 0x7E
}

/// SPI address byte for a register read.
pub fn read_addr(reg: u8) -> u8 {
    write_addr(reg) | 0x80
}

/// Block check character over the four UID bytes.
pub fn bcc(uid: &[u8; 4]) -> u8 {
    uid.iter().fold(0, |acc, b| acc ^ b)
}

/// Valid bits received, from the FIFO level and `ControlReg.RxLastBits`.
pub fn received_bits(fifo_level: u8, last_bits: u8) -> u16 {
    let level = u16::from(fifo_level);
    match last_bits & 0x07 {
        0 => level * 8,
        lb => level.saturating_sub(1) * 8 + u16::from(lb),
    }
}

/// Outcome of one PCD_TRANSCEIVE.
enum Transceive {
    /// The card answered; `bits` of `data` are valid.
    Data { data: heapless::Vec<u8, 16>, bits: u16 },
    /// Nothing answered before the timer expired.
    NoTag,
    /// The reader flagged a framing, parity or collision error.
    Error,
}

pub struct Mfrc522<SPI, D> {
    spi: SPI,
    delay: D,
}

impl<SPI, D> Mfrc522<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    pub fn new(spi: SPI, delay: D) -> Self {
        Self { spi, delay }
    }

    /// Soft-reset, program the timer and turn the antenna on.
    /// Returns the chip version byte.
    pub fn init(&mut self) -> Result<u8, SensorError> {
        self.write(COMMAND_REG, PCD_SOFT_RESET)?;
        self.delay.delay_ms(50);

        self.write(T_MODE_REG, 0x8D)?;
        self.write(T_PRESCALER_REG, 0x3E)?;
        self.write(T_RELOAD_REG_L, 30)?;
        self.write(T_RELOAD_REG_H, 0)?;
        self.write(TX_ASK_REG, 0x40)?;
        self.write(MODE_REG, 0x3D)?;
        self.antenna_on()?;

        let version = self.read(VERSION_REG)?;
        debug!("MFRC522 version 0x{:02X}", version);
        Ok(version)
    }

    /// Poll for a card. `Ok(None)` when no card is in the field.
    pub fn read_uid(&mut self) -> Result<Option<[u8; 4]>, SensorError> {
        if !self.request(PICC_REQIDL)? {
            return Ok(None);
        }
        self.anticoll().map(Some)
    }

    fn request(&mut self, mode: u8) -> Result<bool, SensorError> {
        self.write(BIT_FRAMING_REG, 0x07)?;
        Ok(matches!(
            self.transceive(&[mode])?,
            Transceive::Data { bits: 0x10, .. }
        ))
    }

    fn anticoll(&mut self) -> Result<[u8; 4], SensorError> {
        self.write(BIT_FRAMING_REG, 0x00)?;
        match self.transceive(&[PICC_ANTICOLL, 0x20])? {
            Transceive::Data { data, .. } if data.len() == 5 => {
                let uid = [data[0], data[1], data[2], data[3]];
                if bcc(&uid) == data[4] {
                    Ok(uid)
                } else {
                    Err(SensorError::Checksum)
                }
            }
            Transceive::NoTag => Err(SensorError::Timeout),
            _ => Err(SensorError::Checksum),
        }
    }

    fn transceive(&mut self, tx: &[u8]) -> Result<Transceive, SensorError> {
        self.write(COM_IEN_REG, IRQ_EN | 0x80)?;
        self.clear_bits(COM_IRQ_REG, 0x80)?;
        self.set_bits(FIFO_LEVEL_REG, 0x80)?;
        self.write(COMMAND_REG, PCD_IDLE)?;

        for &b in tx {
            self.write(FIFO_DATA_REG, b)?;
        }
        self.write(COMMAND_REG, PCD_TRANSCEIVE)?;
        self.set_bits(BIT_FRAMING_REG, 0x80)?;

        let mut irq = 0;
        let mut polls = IRQ_POLLS;
        while polls > 0 {
            irq = self.read(COM_IRQ_REG)?;
            if irq & (IRQ_TIMER | IRQ_DONE) != 0 {
                break;
            }
            polls -= 1;
        }
        self.clear_bits(BIT_FRAMING_REG, 0x80)?;

        if polls == 0 {
            return Ok(Transceive::NoTag);
        }
        if self.read(ERROR_REG)? & ERR_MASK != 0 {
            return Ok(Transceive::Error);
        }
        if irq & IRQ_EN & IRQ_TIMER != 0 {
            return Ok(Transceive::NoTag);
        }

        let level = self.read(FIFO_LEVEL_REG)?;
        let bits = received_bits(level, self.read(CONTROL_REG)?);
        let mut data = heapless::Vec::new();
        for _ in 0..level.clamp(1, 16) {
            let _ = data.push(self.read(FIFO_DATA_REG)?);
        }
        Ok(Transceive::Data { data, bits })
    }

    fn antenna_on(&mut self) -> Result<(), SensorError> {
        if self.read(TX_CONTROL_REG)? & 0x03 != 0x03 {
            self.set_bits(TX_CONTROL_REG, 0x03)?;
        }
        Ok(())
    }

    fn read(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [read_addr(reg), 0];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[1])
    }

    fn write(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.spi
            .write(&[write_addr(reg), value])
            .map_err(|_| SensorError::Bus)
    }

    fn set_bits(&mut self, reg: u8, mask: u8) -> Result<(), SensorError> {
        let v = self.read(reg)?;
        self.write(reg, v | mask)
    }

    fn clear_bits(&mut self, reg: u8, mask: u8) -> Result<(), SensorError> {
        let v = self.read(reg)?;
        self.write(reg, v & !mask)
    }
}
