//! Communication Protocols
//!
//! Single-character command tags from the host controller and the
//! acknowledgement lines sent back.
//!
//! | Inbound | Meaning |
//! |---------|---------|
//! | `>` | start emission |
//! | `=` | stop emission |
//! | `&<digits>` | set duration in seconds |
//! | `?<digits>` | set channel code |

use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::config::{MAX_ACK_LEN, MAX_ARGUMENT_LEN};
use crate::types::ChannelCode;

/// Start emission tag
pub const TAG_START: u8 = b'>';

/// Stop emission tag
pub const TAG_STOP: u8 = b'=';

/// Set duration tag
pub const TAG_DURATION: u8 = b'&';

/// Set channel tag
pub const TAG_CHANNEL: u8 = b'?';

/// Command parsed from one serial line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start an emission session
    Start,
    /// Stop the active emission session
    Stop,
    /// Set session duration in seconds
    SetDuration(u32),
    /// Set session channel
    SetChannel(ChannelCode),
    /// Unrecognized tag (`None` for an empty message)
    Unknown(Option<u8>),
}

impl Command {
    /// Parse a command message
    ///
    /// Only the first byte selects the command. Numeric arguments are parsed
    /// best effort and never rejected, see [`parse_decimal`].
    #[must_use]
    pub fn parse(message: &[u8]) -> Self {
        let Some((&tag, argument)) = message.split_first() else {
            return Self::Unknown(None);
        };

        match tag {
            TAG_START => Self::Start,
            TAG_STOP => Self::Stop,
            TAG_DURATION => {
                let seconds = parse_decimal(argument).clamp(0, i64::from(u32::MAX));
                Self::SetDuration(seconds as u32)
            }
            TAG_CHANNEL => Self::SetChannel(ChannelCode::saturating_from(parse_decimal(argument))),
            other => Self::Unknown(Some(other)),
        }
    }

    /// Get the tag byte of this command
    #[must_use]
    pub const fn tag(&self) -> Option<u8> {
        match self {
            Self::Start => Some(TAG_START),
            Self::Stop => Some(TAG_STOP),
            Self::SetDuration(_) => Some(TAG_DURATION),
            Self::SetChannel(_) => Some(TAG_CHANNEL),
            Self::Unknown(tag) => *tag,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Start => defmt::write!(f, "Start"),
            Self::Stop => defmt::write!(f, "Stop"),
            Self::SetDuration(s) => defmt::write!(f, "SetDuration({}s)", s),
            Self::SetChannel(cc) => defmt::write!(f, "SetChannel({})", cc),
            Self::Unknown(Some(tag)) => defmt::write!(f, "Unknown({})", tag),
            Self::Unknown(None) => defmt::write!(f, "Unknown(empty)"),
        }
    }
}

/// Best-effort decimal parsing
///
/// Skips leading whitespace, accepts one optional sign and consumes digits up
/// to the first non-digit. Anything unparsable yields 0. Only the first
/// [`MAX_ARGUMENT_LEN`] bytes are looked at; overflow saturates.
#[must_use]
pub fn parse_decimal(argument: &[u8]) -> i64 {
    let argument = &argument[..argument.len().min(MAX_ARGUMENT_LEN)];
    let mut bytes = argument
        .iter()
        .copied()
        .skip_while(u8::is_ascii_whitespace)
        .peekable();

    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let magnitude = bytes
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Outbound acknowledgement line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    /// Emission session began
    Started,
    /// Emission session ended (explicit stop or expiry)
    Stopped,
    /// Duration was set
    Duration(u32),
    /// Channel was set
    Channel(ChannelCode),
    /// Command was not understood
    Unknown,
}

impl Ack {
    const DURATION_PREFIX: &'static str = "App duration ";
    const CHANNEL_PREFIX: &'static str = "Selected CC number: ";
    const CHANNEL_INFIX: &'static str = " and freq: ";
    const UNKNOWN_TEXT: &'static str = "Unknown cmd";

    /// Render the acknowledgement into a fixed-capacity string
    #[must_use]
    pub fn to_line(&self) -> String<MAX_ACK_LEN> {
        let mut line = String::new();
        // Longest ack is well under MAX_ACK_LEN
        let _ = write!(line, "{self}");
        line
    }

    /// Classify a line received from the device
    ///
    /// Used on the host side; trailing CR/LF and whitespace are ignored.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        if line == ">" {
            return Some(Self::Started);
        }
        if line == "=" {
            return Some(Self::Stopped);
        }
        if line == Self::UNKNOWN_TEXT {
            return Some(Self::Unknown);
        }
        if let Some(rest) = line.strip_prefix(Self::DURATION_PREFIX) {
            return rest.trim().parse().ok().map(Self::Duration);
        }
        if let Some(rest) = line.strip_prefix(Self::CHANNEL_PREFIX) {
            let (code, _freq) = rest.split_once(Self::CHANNEL_INFIX)?;
            return code.trim().parse().ok().map(|cc| Self::Channel(ChannelCode::new(cc)));
        }

        None
    }

    /// Check if this ack reports the end of a session
    #[must_use]
    pub const fn is_session_end(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str(">"),
            Self::Stopped => f.write_str("="),
            Self::Duration(seconds) => write!(f, "{}{seconds}", Self::DURATION_PREFIX),
            Self::Channel(cc) => write!(
                f,
                "{}{cc}{}{}",
                Self::CHANNEL_PREFIX,
                Self::CHANNEL_INFIX,
                cc.frequency()
            ),
            Self::Unknown => f.write_str(Self::UNKNOWN_TEXT),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Ack {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Started => defmt::write!(f, "Ack(started)"),
            Self::Stopped => defmt::write!(f, "Ack(stopped)"),
            Self::Duration(s) => defmt::write!(f, "Ack(duration {}s)", s),
            Self::Channel(cc) => defmt::write!(f, "Ack({} @ {})", cc, cc.frequency()),
            Self::Unknown => defmt::write!(f, "Ack(unknown)"),
        }
    }
}

/// Destination for acknowledgements
///
/// Fire-and-forget: no ack expects a response and sinks never report failure.
pub trait AckSink {
    /// Emit one acknowledgement
    fn send(&mut self, ack: Ack);
}

impl<S: AckSink + ?Sized> AckSink for &mut S {
    fn send(&mut self, ack: Ack) {
        (**self).send(ack);
    }
}

/// Collects acks in order, dropping them once full
impl<const N: usize> AckSink for Vec<Ack, N> {
    fn send(&mut self, ack: Ack) {
        let _ = self.push(ack);
    }
}

/// Discards every ack
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AckSink for NullSink {
    fn send(&mut self, _ack: Ack) {}
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl AckSink for std::vec::Vec<Ack> {
    fn send(&mut self, ack: Ack) {
        self.push(ack);
    }
}
