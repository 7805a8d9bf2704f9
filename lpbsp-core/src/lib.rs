//! Board-agnostic core logic for the LaunchPad board support
//!
//! This crate contains the logic that does not depend on a specific chip:
//!
//! - Polled, blocking I2C transaction engine (burst roles, FIFO handling,
//!   bounded waits, failure classification)
//! - Exclusive burst chains and mutex-shared bus ownership
//! - Fixed-width decimal formatting for character displays

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod format;

pub use bus::{I2cEngine, I2cError, SharedI2c, Transaction};
pub use format::{format_u16, format_u32, format_u8, hex_digit};
