//! Build script for the jammer firmware
//!
//! Handles:
//! - Linker scripts for the Cortex-M target (cortex-m-rt and defmt)
//!
//! Host builds (tests, tooling) need no linker arguments.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let embedded = env::var_os("CARGO_FEATURE_EMBEDDED").is_some();
    let arm = env::var("CARGO_CFG_TARGET_ARCH").is_ok_and(|arch| arch == "arm");

    if embedded && arm {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
