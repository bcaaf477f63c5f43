//! System configuration and hardware constants
//!
//! Compile-time constants for the jammer node. Session defaults, protocol
//! limits and queue sizes are centralized here. Pin assignments live next to
//! the peripheral setup in `main.rs`.

use crate::types::TxPower;

/// Frequency of channel code 0 in kHz (857.0 MHz)
pub const BASE_FREQUENCY_KHZ: u32 = 857_000;

/// Spacing between adjacent channel codes in kHz
pub const CHANNEL_SPACING_KHZ: u32 = 100;

/// Default channel code (868.0 MHz)
pub const DEFAULT_CHANNEL: u8 = 110;

/// Default transmit power
pub const DEFAULT_POWER: TxPower = TxPower::Minus11;

/// Default session length (one hour)
pub const DEFAULT_DURATION_S: u32 = 60 * 60;

/// Maximum inbound command length in bytes
pub const MAX_COMMAND_LEN: usize = 64;

/// Maximum number of argument bytes considered when parsing a number
pub const MAX_ARGUMENT_LEN: usize = 10;

/// Maximum outbound acknowledgement length in bytes
pub const MAX_ACK_LEN: usize = 64;

/// Serial line buffer size
pub const SERIAL_BUFFER_SIZE: usize = 64;

/// Serial baud rate towards the host controller
pub const SERIAL_BAUD_RATE: u32 = 115_200;

/// Pending control requests (interpreter to emission controller)
///
/// The input task waits for each request to be applied, so one slot is
/// enough.
pub const CONTROL_QUEUE_DEPTH: usize = 1;

/// Pending acknowledgements waiting for the serial writer
pub const ACK_QUEUE_DEPTH: usize = 8;

/// Countdown granularity for runtimes without a cancellable timer
pub const POLL_INTERVAL_MS: u32 = 100;

/// SPI clock for the transceiver
pub const RF_SPI_FREQUENCY_HZ: u32 = 4_000_000;

/// Status register polls before giving up on PLL lock
pub const PLL_LOCK_ATTEMPTS: u32 = 1_000;

/// Build the startup session configuration
#[must_use]
pub const fn default_session() -> crate::types::SessionConfig {
    crate::types::SessionConfig::DEFAULT
}
