//! Core governor for a DC motor speed loop on no-std embedded platforms.
//!
//! For a runnable host simulation, see the `ms-app/mock-mcu` binary.
#![no_std]

pub mod utils;
