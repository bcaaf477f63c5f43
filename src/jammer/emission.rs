//! Emission Controller
//!
//! Owns the transceiver's continuous-emission entry points and at most one
//! emission session. Cycles Idle ↔ Transmitting for the life of the device.

use crate::protocol::{Ack, AckSink};
use crate::types::{ChannelCode, SessionConfig, TxPower};

use super::interpreter::ControlRequest;

/// Transceiver operations consumed by the controller
///
/// Both calls are treated as non-failing at this layer. Faults are the
/// driver's business.
pub trait Transceiver {
    /// Begin unmodulated continuous emission
    fn start_continuous_emission(&mut self, power: TxPower, channel: ChannelCode);

    /// Halt continuous emission (idempotent)
    fn stop_continuous_emission(&mut self);
}

impl<T: Transceiver + ?Sized> Transceiver for &mut T {
    fn start_continuous_emission(&mut self, power: TxPower, channel: ChannelCode) {
        (**self).start_continuous_emission(power, channel);
    }

    fn stop_continuous_emission(&mut self) {
        (**self).stop_continuous_emission();
    }
}

/// Emission state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EmissionState {
    /// Radio is quiet
    #[default]
    Idle,
    /// Radio is emitting
    Transmitting,
}

#[cfg(feature = "embedded")]
impl defmt::Format for EmissionState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "IDLE"),
            Self::Transmitting => defmt::write!(f, "TX"),
        }
    }
}

/// Result of a start request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session began
    Started,
    /// A session was already running; the request was dropped
    AlreadyTransmitting,
}

/// Why a session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopCause {
    /// Host sent a stop command (already acknowledged by the interpreter)
    Requested,
    /// Duration elapsed
    Expired,
}

#[cfg(feature = "embedded")]
impl defmt::Format for StopCause {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Requested => defmt::write!(f, "requested"),
            Self::Expired => defmt::write!(f, "expired"),
        }
    }
}

/// Active emission session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    /// Configuration captured at start
    config: SessionConfig,
    /// Countdown to natural expiry
    remaining_ms: u64,
}

impl Session {
    fn new(config: SessionConfig) -> Self {
        Self {
            config,
            remaining_ms: config.duration_ms(),
        }
    }

    /// Configuration the session was started with
    #[must_use]
    pub const fn config(&self) -> SessionConfig {
        self.config
    }

    /// Milliseconds left before expiry
    #[must_use]
    pub const fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Milliseconds already spent emitting
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.config.duration_ms() - self.remaining_ms
    }

    /// Check if the countdown reached zero
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.remaining_ms == 0
    }
}

/// Emission controller
///
/// Entry order: started ack, then driver start. Exit order: driver stop, then
/// (on expiry only) stopped ack. An explicit stop was acknowledged by the
/// interpreter before it got here.
#[derive(Debug)]
pub struct EmissionController<R> {
    radio: R,
    session: Option<Session>,
}

impl<R: Transceiver> EmissionController<R> {
    /// Create an idle controller around a transceiver
    #[must_use]
    pub const fn new(radio: R) -> Self {
        Self {
            radio,
            session: None,
        }
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> EmissionState {
        if self.session.is_some() {
            EmissionState::Transmitting
        } else {
            EmissionState::Idle
        }
    }

    /// Check if transmitting
    #[must_use]
    pub const fn is_transmitting(&self) -> bool {
        self.session.is_some()
    }

    /// Get the active session, if any
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Borrow the transceiver
    #[must_use]
    pub const fn radio(&self) -> &R {
        &self.radio
    }

    /// Mutably borrow the transceiver
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Consume the controller, returning the transceiver
    pub fn into_radio(self) -> R {
        self.radio
    }

    /// Begin a session with a configuration snapshot
    ///
    /// A start while already transmitting is dropped without ack or driver call.
    pub fn start(&mut self, config: SessionConfig, acks: &mut impl AckSink) -> StartOutcome {
        if self.session.is_some() {
            #[cfg(feature = "embedded")]
            defmt::debug!("start ignored, session already active");
            return StartOutcome::AlreadyTransmitting;
        }

        acks.send(Ack::Started);
        self.radio
            .start_continuous_emission(config.power, config.channel);
        self.session = Some(Session::new(config));

        #[cfg(feature = "embedded")]
        defmt::info!("emission started: {}", config);

        StartOutcome::Started
    }

    /// End the active session
    ///
    /// Returns `false` when idle; nothing is sent to the driver in that case.
    pub fn stop(&mut self, cause: StopCause, acks: &mut impl AckSink) -> bool {
        if self.session.take().is_none() {
            return false;
        }

        self.radio.stop_continuous_emission();
        if cause == StopCause::Expired {
            acks.send(Ack::Stopped);
        }

        #[cfg(feature = "embedded")]
        defmt::info!("emission stopped ({})", cause);

        true
    }

    /// Advance the countdown (polling runtimes)
    ///
    /// Expires the session once the configured duration has elapsed.
    pub fn tick(&mut self, elapsed_ms: u32, acks: &mut impl AckSink) -> EmissionState {
        let expired = match self.session.as_mut() {
            Some(session) => {
                session.remaining_ms = session.remaining_ms.saturating_sub(u64::from(elapsed_ms));
                session.is_expired()
            }
            None => false,
        };

        if expired {
            self.stop(StopCause::Expired, acks);
        }

        self.state()
    }

    /// Dispatch a request from the command interpreter
    pub fn apply(&mut self, request: ControlRequest, acks: &mut impl AckSink) {
        match request {
            ControlRequest::Start(config) => {
                self.start(config, acks);
            }
            ControlRequest::Stop => {
                self.stop(StopCause::Requested, acks);
            }
        }
    }
}
