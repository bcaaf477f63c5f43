//! Tick-driven jammer
//!
//! Interpreter and controller composed in one struct for runtimes that poll
//! instead of awaiting a cancellable timer. Requests take effect as soon as
//! their message is handled; `tick` drives the session countdown.

use crate::protocol::AckSink;
use crate::types::SessionConfig;

use super::emission::{EmissionController, EmissionState, Transceiver};
use super::interpreter::CommandInterpreter;

/// Jammer node with a polled countdown
#[derive(Debug)]
pub struct Jammer<R> {
    interpreter: CommandInterpreter,
    controller: EmissionController<R>,
}

impl<R: Transceiver> Jammer<R> {
    /// Create a jammer with the compiled-in defaults
    #[must_use]
    pub fn new(radio: R) -> Self {
        Self::with_config(radio, SessionConfig::default())
    }

    /// Create a jammer with a starting configuration
    #[must_use]
    pub fn with_config(radio: R, config: SessionConfig) -> Self {
        Self {
            interpreter: CommandInterpreter::new(config),
            controller: EmissionController::new(radio),
        }
    }

    /// Handle one inbound message
    pub fn handle(&mut self, message: &[u8], acks: &mut impl AckSink) {
        if let Some(request) = self.interpreter.handle(message, acks) {
            self.controller.apply(request, acks);
        }
    }

    /// Advance time
    pub fn tick(&mut self, elapsed_ms: u32, acks: &mut impl AckSink) -> EmissionState {
        self.controller.tick(elapsed_ms, acks)
    }

    /// Get current emission state
    #[must_use]
    pub const fn state(&self) -> EmissionState {
        self.controller.state()
    }

    /// Get the configuration the next session will use
    #[must_use]
    pub const fn config(&self) -> SessionConfig {
        self.interpreter.config()
    }

    /// Borrow the emission controller
    #[must_use]
    pub const fn controller(&self) -> &EmissionController<R> {
        &self.controller
    }

    /// Borrow the transceiver
    #[must_use]
    pub const fn radio(&self) -> &R {
        self.controller.radio()
    }
}
