//! Jammer Control Logic
//!
//! Command input, interpretation and the emission session state machine.
//! Pure logic: hardware is reached only through the `Transceiver` trait and
//! acknowledgements leave through `AckSink`.

pub mod interpreter;
pub mod emission;
pub mod device;
pub mod input;
