//! Jammer Node Firmware Library
//!
//! Firmware for a testbed node that drives an `AT86RF212` sub-GHz
//! transceiver into continuous emission on command from a host controller
//! over a serial link. A session emits on one channel at one power for a
//! bounded number of seconds, or until the host stops it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Command Interpreter  │  Emission Controller  │  Protocol    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   DRIVER / FRAMING LAYER                     │
//! │  AT86RF212 (SPI)  │  Serial line framing                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Command Set
//!
//! | Line | Effect | Reply |
//! |------|--------|-------|
//! | `>` | start emission | `>` once emitting |
//! | `=` | stop emission | `=` |
//! | `&<s>` | set duration | `App duration <s>` |
//! | `?<cc>` | set channel | `Selected CC number: <cc> and freq: <MHz> MHz` |
//!
//! A session that runs out its duration reports `=` on its own.
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: interpreter and controller are
//!   plain state machines; embassy tasks only move bytes and wait
//! - **Single owner**: the interpreter owns the configuration, the controller
//!   owns the transceiver
//! - **No unsafe in application code**

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Peripheral Drivers
///
/// `AT86RF212` transceiver over `embedded-hal` SPI.
pub mod drivers;

/// Jammer Control Logic
///
/// Command interpreter, emission controller and the tick-driven composition.
pub mod jammer;

/// Communication Protocols
///
/// Command tags, argument parsing and acknowledgement lines.
pub mod protocol;

/// Serial line framing
pub mod serial;

/// Embassy tasks wiring the control logic to hardware
#[cfg(feature = "embedded")]
pub mod runtime;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::jammer::device::Jammer;
    pub use crate::jammer::emission::{EmissionController, EmissionState, Transceiver};
    pub use crate::jammer::input::{CommandInput, RequestPort};
    pub use crate::jammer::interpreter::{CommandInterpreter, ControlRequest};
    pub use crate::protocol::{Ack, AckSink, Command};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
