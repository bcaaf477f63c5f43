//! Peripheral Drivers
//!
//! Drivers for external ICs, written against `embedded-hal` traits so they
//! run on the target and against mock buses on the host.

pub mod at86rf212;
