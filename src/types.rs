//! Shared types used across the jammer firmware
//!
//! Domain types for the emission session: channel codes, their derived
//! frequencies, transmit power settings and the session configuration.

use core::fmt;

use crate::config::{
    BASE_FREQUENCY_KHZ, CHANNEL_SPACING_KHZ, DEFAULT_CHANNEL, DEFAULT_DURATION_S, DEFAULT_POWER,
};

/// Channel code selecting a physical frequency
///
/// The transceiver's 8-bit channel number register covers the whole
/// 857.0 - 882.5 MHz band in 100 kHz steps, so every `u8` is a valid code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChannelCode(u8);

impl ChannelCode {
    /// Lowest channel (857.0 MHz)
    pub const MIN: Self = Self(0);

    /// Highest channel (882.5 MHz)
    pub const MAX: Self = Self(u8::MAX);

    /// Create a channel code
    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Create a channel code from an unchecked integer, saturating to the
    /// representable range
    #[must_use]
    pub const fn saturating_from(value: i64) -> Self {
        if value < 0 {
            Self::MIN
        } else if value > u8::MAX as i64 {
            Self::MAX
        } else {
            Self(value as u8)
        }
    }

    /// Get the raw channel code
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Physical frequency selected by this code
    #[must_use]
    pub const fn frequency(self) -> Frequency {
        Frequency::from_khz(BASE_FREQUENCY_KHZ + CHANNEL_SPACING_KHZ * self.0 as u32)
    }
}

impl fmt::Debug for ChannelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelCode({})", self.0)
    }
}

impl fmt::Display for ChannelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ChannelCode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CC{}", self.0);
    }
}

/// Frequency stored in kHz
///
/// Channel frequencies fall on 100 kHz steps, so kHz keeps the mapping exact.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u32);

impl Frequency {
    /// Create a frequency from kHz
    #[must_use]
    pub const fn from_khz(khz: u32) -> Self {
        Self(khz)
    }

    /// Get the frequency in kHz
    #[must_use]
    pub const fn as_khz(self) -> u32 {
        self.0
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u64 {
        self.0 as u64 * 1000
    }

    /// Get the frequency in MHz as floating point
    #[must_use]
    pub fn as_mhz_f32(self) -> f32 {
        self.0 as f32 / 1000.0
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} kHz)", self.0)
    }
}

/// Formats as `868.0 MHz`
impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} MHz", self.0 / 1000, (self.0 % 1000) / 100)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{} MHz", self.0 / 1000, (self.0 % 1000) / 100);
    }
}

/// Transmit power setting of the transceiver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxPower {
    /// +2 dBm
    Plus2,
    /// +1 dBm
    Plus1,
    /// 0 dBm
    Zero,
    /// -1 dBm
    Minus1,
    /// -2 dBm
    Minus2,
    /// -3 dBm
    Minus3,
    /// -4 dBm
    Minus4,
    /// -5 dBm
    Minus5,
    /// -6 dBm
    Minus6,
    /// -7 dBm
    Minus7,
    /// -8 dBm
    Minus8,
    /// -9 dBm
    Minus9,
    /// -10 dBm
    Minus10,
    /// -11 dBm (lowest)
    Minus11,
}

impl TxPower {
    /// All settings from strongest to weakest
    pub const ALL: [Self; 14] = [
        Self::Plus2,
        Self::Plus1,
        Self::Zero,
        Self::Minus1,
        Self::Minus2,
        Self::Minus3,
        Self::Minus4,
        Self::Minus5,
        Self::Minus6,
        Self::Minus7,
        Self::Minus8,
        Self::Minus9,
        Self::Minus10,
        Self::Minus11,
    ];

    /// Nominal output power in dBm
    #[must_use]
    pub const fn as_dbm(self) -> i8 {
        match self {
            Self::Plus2 => 2,
            Self::Plus1 => 1,
            Self::Zero => 0,
            Self::Minus1 => -1,
            Self::Minus2 => -2,
            Self::Minus3 => -3,
            Self::Minus4 => -4,
            Self::Minus5 => -5,
            Self::Minus6 => -6,
            Self::Minus7 => -7,
            Self::Minus8 => -8,
            Self::Minus9 => -9,
            Self::Minus10 => -10,
            Self::Minus11 => -11,
        }
    }

    /// Closest setting for a requested dBm value, clamped to the supported range
    #[must_use]
    pub const fn from_dbm(dbm: i8) -> Self {
        let index = if dbm >= 2 {
            0
        } else if dbm <= -11 {
            13
        } else {
            (2 - dbm) as usize
        };
        Self::ALL[index]
    }

    /// PHY_TX_PWR register value (PA boost off, 868 MHz band)
    #[must_use]
    pub const fn register_value(self) -> u8 {
        match self {
            Self::Plus2 => 0x84,
            Self::Plus1 => 0x85,
            Self::Zero => 0x86,
            Self::Minus1 => 0x87,
            Self::Minus2 => 0x88,
            Self::Minus3 => 0x89,
            Self::Minus4 => 0x8A,
            Self::Minus5 => 0x8B,
            Self::Minus6 => 0x8C,
            Self::Minus7 => 0x8D,
            Self::Minus8 => 0x8E,
            Self::Minus9 => 0x8F,
            Self::Minus10 => 0x90,
            Self::Minus11 => 0x91,
        }
    }
}

impl Default for TxPower {
    fn default() -> Self {
        DEFAULT_POWER
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxPower {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} dBm", self.as_dbm());
    }
}

/// Parameters of an emission session
///
/// Owned by the command interpreter; the emission controller receives a copy
/// when a session starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Channel to emit on
    pub channel: ChannelCode,
    /// Transmit power
    pub power: TxPower,
    /// Session length in seconds
    pub duration_s: u32,
}

impl SessionConfig {
    /// Compiled-in startup configuration
    pub const DEFAULT: Self = Self {
        channel: ChannelCode::new(DEFAULT_CHANNEL),
        power: DEFAULT_POWER,
        duration_s: DEFAULT_DURATION_S,
    };

    /// Session length in milliseconds
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_s as u64 * 1000
    }

    /// Frequency the session emits on
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.channel.frequency()
    }

    /// Set duration (returns new config)
    #[must_use]
    pub const fn with_duration(self, duration_s: u32) -> Self {
        Self { duration_s, ..self }
    }

    /// Set channel (returns new config)
    #[must_use]
    pub const fn with_channel(self, channel: ChannelCode) -> Self {
        Self { channel, ..self }
    }

    /// Set power (returns new config)
    #[must_use]
    pub const fn with_power(self, power: TxPower) -> Self {
        Self { power, ..self }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SessionConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Session({}, {}, {}s)",
            self.channel,
            self.power,
            self.duration_s
        );
    }
}
