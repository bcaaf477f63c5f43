//! Serial line framing
//!
//! Host commands arrive as CR/LF terminated lines; acknowledgements leave the
//! same way. Both buffers are fixed-size so they can live in task statics.

use heapless::Vec;

use crate::config::{SERIAL_BAUD_RATE, SERIAL_BUFFER_SIZE};
use crate::protocol::{Ack, AckSink};

const fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Inbound line accumulator
///
/// Lines longer than the buffer are dropped whole: once an overflow is
/// detected everything up to the next terminator is discarded.
pub struct LineReader {
    buffer: [u8; SERIAL_BUFFER_SIZE],
    read_pos: usize,
    write_pos: usize,
    discarding: bool,
}

impl LineReader {
    /// Create an empty reader
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; SERIAL_BUFFER_SIZE],
            read_pos: 0,
            write_pos: 0,
            discarding: false,
        }
    }

    /// Push received bytes, returns how many were consumed
    ///
    /// Stops early only when the buffer is full and still holds a complete
    /// line; drain it with [`read_line`](Self::read_line) and push the rest.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let mut consumed = 0;
        for &byte in data {
            if self.discarding {
                self.discarding = !is_terminator(byte);
                consumed += 1;
                continue;
            }

            if self.write_pos == SERIAL_BUFFER_SIZE {
                self.skip_blank();
                self.compact();
            }
            if self.write_pos == SERIAL_BUFFER_SIZE {
                if self.has_line() {
                    break;
                }
                #[cfg(feature = "embedded")]
                defmt::warn!("serial line overflow, discarding line");
                self.clear();
                self.discarding = !is_terminator(byte);
                consumed += 1;
                continue;
            }

            self.buffer[self.write_pos] = byte;
            self.write_pos += 1;
            consumed += 1;
        }
        consumed
    }

    /// Take the next non-empty line, without its terminator
    ///
    /// Blank lines carry no command and are skipped, which also covers a CR
    /// and its LF arriving in separate reads.
    pub fn read_line(&mut self) -> Option<Vec<u8, SERIAL_BUFFER_SIZE>> {
        self.skip_blank();

        let pending = &self.buffer[self.read_pos..self.write_pos];
        let end = self.read_pos + pending.iter().position(|&b| is_terminator(b))?;

        let mut line = Vec::new();
        // Cannot overflow: the line came out of a buffer of the same capacity
        let _ = line.extend_from_slice(&self.buffer[self.read_pos..end]);
        self.read_pos = end + 1;

        if self.read_pos >= SERIAL_BUFFER_SIZE / 2 {
            self.compact();
        }

        Some(line)
    }

    fn skip_blank(&mut self) {
        while self.read_pos < self.write_pos && is_terminator(self.buffer[self.read_pos]) {
            self.read_pos += 1;
        }
    }

    fn has_line(&self) -> bool {
        self.buffer[self.read_pos..self.write_pos]
            .iter()
            .any(|&b| is_terminator(b))
    }

    fn compact(&mut self) {
        if self.read_pos > 0 {
            let remaining = self.write_pos - self.read_pos;
            self.buffer.copy_within(self.read_pos..self.write_pos, 0);
            self.read_pos = 0;
            self.write_pos = remaining;
        }
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.discarding = false;
    }

    /// Check if the rest of an overlong line is being dropped
    #[must_use]
    pub const fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Get buffered byte count
    #[must_use]
    pub const fn available(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Get free space
    #[must_use]
    pub const fn free(&self) -> usize {
        SERIAL_BUFFER_SIZE - self.write_pos + self.read_pos
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound line buffer
pub struct LineWriter {
    buffer: [u8; SERIAL_BUFFER_SIZE],
    len: usize,
}

impl LineWriter {
    /// Create an empty writer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0; SERIAL_BUFFER_SIZE],
            len: 0,
        }
    }

    /// Append bytes, truncating at capacity
    pub fn write(&mut self, data: &[u8]) -> usize {
        let to_write = data.len().min(SERIAL_BUFFER_SIZE - self.len);
        self.buffer[self.len..self.len + to_write].copy_from_slice(&data[..to_write]);
        self.len += to_write;
        to_write
    }

    /// Append a string
    pub fn write_str(&mut self, s: &str) -> usize {
        self.write(s.as_bytes())
    }

    /// Append bytes followed by CR LF
    pub fn writeln(&mut self, data: &[u8]) -> usize {
        let mut written = self.write(data);
        written += self.write(b"\r\n");
        written
    }

    /// Append one acknowledgement line
    pub fn write_ack(&mut self, ack: &Ack) -> usize {
        self.writeln(ack.to_line().as_bytes())
    }

    /// Get buffer contents
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Get used length
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for LineWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl AckSink for LineWriter {
    fn send(&mut self, ack: Ack) {
        self.write_ack(&ack);
    }
}

/// Line coding of the host link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCoding {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits
    pub data_bits: DataBits,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
}

impl Default for LineCoding {
    fn default() -> Self {
        Self {
            baud_rate: SERIAL_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Data bits per character
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataBits {
    /// 8 data bits
    #[default]
    Eight,
    /// 9 data bits
    Nine,
}

/// Parity configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parity {
    /// No parity
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// Stop bits configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}
