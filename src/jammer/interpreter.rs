//! Command Interpreter
//!
//! Turns one complete serial message into one effect: a configuration
//! change or a lifecycle request for the emission controller. Every message
//! produces exactly one acknowledgement, except a start request, which is
//! acknowledged by the controller once the session actually begins.

use crate::protocol::{Ack, AckSink, Command};
use crate::types::SessionConfig;

/// Lifecycle request for the emission controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlRequest {
    /// Start a session with this configuration snapshot
    Start(SessionConfig),
    /// Stop the active session
    Stop,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ControlRequest {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Start(config) => defmt::write!(f, "Start({})", config),
            Self::Stop => defmt::write!(f, "Stop"),
        }
    }
}

/// Command interpreter
///
/// Sole owner of the session configuration.
#[derive(Clone, Debug, Default)]
pub struct CommandInterpreter {
    config: SessionConfig,
}

impl CommandInterpreter {
    /// Create an interpreter with a starting configuration
    #[must_use]
    pub const fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration
    #[must_use]
    pub const fn config(&self) -> SessionConfig {
        self.config
    }

    /// Handle one message
    ///
    /// Never fails; unknown tags are acknowledged as such and ignored.
    pub fn handle(&mut self, message: &[u8], acks: &mut impl AckSink) -> Option<ControlRequest> {
        let command = Command::parse(message);

        #[cfg(feature = "embedded")]
        defmt::debug!("command: {}", command);

        match command {
            Command::Start => Some(ControlRequest::Start(self.config)),
            Command::Stop => {
                // Confirm before the stop reaches the controller
                acks.send(Ack::Stopped);
                Some(ControlRequest::Stop)
            }
            Command::SetDuration(seconds) => {
                self.config = self.config.with_duration(seconds);
                acks.send(Ack::Duration(seconds));
                None
            }
            Command::SetChannel(channel) => {
                self.config = self.config.with_channel(channel);
                acks.send(Ack::Channel(channel));
                None
            }
            Command::Unknown(_tag) => {
                #[cfg(feature = "embedded")]
                defmt::warn!("unrecognized command tag {}", _tag);
                acks.send(Ack::Unknown);
                None
            }
        }
    }
}
