//! `AT86RF212` Sub-GHz Transceiver Driver
//!
//! Drives the transceiver's continuous transmission test mode (CTTM): an
//! unmodulated carrier on a fixed channel and power until stopped.
//!
//! Register access over SPI:
//!
//! ```text
//! write: [0xC0 | addr] [value]
//! read:  [0x80 | addr] [dummy] -> value in second byte
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::config::PLL_LOCK_ATTEMPTS;
use crate::jammer::emission::Transceiver;
use crate::types::{ChannelCode, TxPower};

/// `AT86RF212` register addresses
mod reg {
    pub const TRX_STATUS: u8 = 0x01;
    pub const TRX_STATE: u8 = 0x02;
    pub const PHY_TX_PWR: u8 = 0x05;
    pub const IRQ_MASK: u8 = 0x0E;
    pub const IRQ_STATUS: u8 = 0x0F;
    pub const CC_CTRL_0: u8 = 0x13;
    pub const CC_CTRL_1: u8 = 0x14;
    pub const PART_NUM: u8 = 0x1C;
    pub const TST_CTRL_DIGI: u8 = 0x36;
}

/// TRX_STATE commands
mod cmd {
    pub const TX_START: u8 = 0x02;
    pub const FORCE_TRX_OFF: u8 = 0x03;
    pub const PLL_ON: u8 = 0x09;
}

const SPI_WRITE: u8 = 0xC0;
const SPI_READ: u8 = 0x80;

const TRX_STATUS_MASK: u8 = 0x1F;
const STATUS_TRX_OFF: u8 = 0x08;
const IRQ_PLL_LOCK: u8 = 0x01;

/// CC_BAND selecting 857.0 - 882.5 MHz in 100 kHz steps
const CC_BAND_857: u8 = 0x02;

/// TST_CTRL_DIGI value enabling continuous transmission
const CTTM_ENABLE: u8 = 0x0F;

/// Expected PART_NUM
pub const PART_NUM_AT86RF212: u8 = 0x07;

/// Driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rf212Error<E> {
    /// SPI transfer failed
    Spi(E),
    /// Chip select could not be driven
    ChipSelect,
    /// Transceiver did not reach TRX_OFF
    NotIdle(u8),
    /// PLL did not lock in time
    PllLock,
    /// Unexpected part number
    WrongPart(u8),
}

impl<E> Rf212Error<E> {
    /// Short description for logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spi(_) => "spi transfer failed",
            Self::ChipSelect => "chip select failed",
            Self::NotIdle(_) => "transceiver not in TRX_OFF",
            Self::PllLock => "pll lock timeout",
            Self::WrongPart(_) => "unexpected part number",
        }
    }
}

/// Driver result type
pub type Rf212Result<T, E> = Result<T, Rf212Error<E>>;

/// `AT86RF212` driver
pub struct At86rf212<SPI, CS> {
    spi: SPI,
    cs: CS,
    emitting: bool,
    fault: Option<&'static str>,
}

impl<SPI, CS> At86rf212<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    /// Create a new driver; the transceiver is not touched yet
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self {
            spi,
            cs,
            emitting: false,
            fault: None,
        }
    }

    /// Check the part number and force the transceiver off
    pub fn init(&mut self) -> Rf212Result<(), SPI::Error> {
        let part = self.read_reg(reg::PART_NUM)?;
        if part != PART_NUM_AT86RF212 {
            return Err(Rf212Error::WrongPart(part));
        }
        self.force_off()
    }

    /// Check if continuous emission is active
    #[must_use]
    pub const fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Last fault seen through the `Transceiver` entry points
    #[must_use]
    pub const fn fault(&self) -> Option<&'static str> {
        self.fault
    }

    /// Release the bus and chip select
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    /// Enter continuous transmission on a channel and power
    pub fn start_cttm(&mut self, power: TxPower, channel: ChannelCode) -> Rf212Result<(), SPI::Error> {
        self.force_off()?;

        self.write_reg(reg::IRQ_MASK, IRQ_PLL_LOCK)?;
        // Reading IRQ_STATUS clears stale flags
        self.read_reg(reg::IRQ_STATUS)?;

        self.write_reg(reg::CC_CTRL_1, CC_BAND_857)?;
        self.write_reg(reg::CC_CTRL_0, channel.as_u8())?;
        self.write_reg(reg::PHY_TX_PWR, power.register_value())?;
        self.write_reg(reg::TST_CTRL_DIGI, CTTM_ENABLE)?;

        self.write_reg(reg::TRX_STATE, cmd::PLL_ON)?;
        self.wait_pll_lock()?;

        self.write_reg(reg::TRX_STATE, cmd::TX_START)?;
        self.emitting = true;
        Ok(())
    }

    /// Leave continuous transmission (idempotent)
    pub fn stop_cttm(&mut self) -> Rf212Result<(), SPI::Error> {
        self.write_reg(reg::TST_CTRL_DIGI, 0x00)?;
        self.write_reg(reg::TRX_STATE, cmd::FORCE_TRX_OFF)?;
        self.emitting = false;
        Ok(())
    }

    fn force_off(&mut self) -> Rf212Result<(), SPI::Error> {
        self.write_reg(reg::TRX_STATE, cmd::FORCE_TRX_OFF)?;
        let status = self.read_reg(reg::TRX_STATUS)? & TRX_STATUS_MASK;
        if status == STATUS_TRX_OFF {
            Ok(())
        } else {
            Err(Rf212Error::NotIdle(status))
        }
    }

    fn wait_pll_lock(&mut self) -> Rf212Result<(), SPI::Error> {
        for _ in 0..PLL_LOCK_ATTEMPTS {
            if self.read_reg(reg::IRQ_STATUS)? & IRQ_PLL_LOCK != 0 {
                return Ok(());
            }
        }
        Err(Rf212Error::PllLock)
    }

    /// Write a register
    pub fn write_reg(&mut self, addr: u8, value: u8) -> Rf212Result<(), SPI::Error> {
        let mut frame = [SPI_WRITE | addr, value];
        self.transfer(&mut frame)
    }

    /// Read a register
    pub fn read_reg(&mut self, addr: u8) -> Rf212Result<u8, SPI::Error> {
        let mut frame = [SPI_READ | addr, 0x00];
        self.transfer(&mut frame)?;
        Ok(frame[1])
    }

    fn transfer(&mut self, frame: &mut [u8]) -> Rf212Result<(), SPI::Error> {
        self.cs.set_low().map_err(|_| Rf212Error::ChipSelect)?;
        let result = self
            .spi
            .transfer_in_place(frame)
            .and_then(|()| self.spi.flush())
            .map_err(Rf212Error::Spi);
        // Deselect even when the transfer failed
        self.cs.set_high().map_err(|_| Rf212Error::ChipSelect)?;
        result
    }

    fn record(&mut self, result: Rf212Result<(), SPI::Error>) {
        if let Err(err) = result {
            #[cfg(feature = "embedded")]
            defmt::error!("at86rf212: {}", err.as_str());
            self.fault = Some(err.as_str());
        }
    }
}

impl<SPI, CS> Transceiver for At86rf212<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    fn start_continuous_emission(&mut self, power: TxPower, channel: ChannelCode) {
        let result = self.start_cttm(power, channel);
        self.record(result);
    }

    fn stop_continuous_emission(&mut self) {
        let result = self.stop_cttm();
        self.record(result);
    }
}
