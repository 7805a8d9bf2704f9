//! Device drivers
//!
//! Drivers in this crate talk to their peripherals through the burst-level
//! [`lpbsp_hal::I2cBus`] trait, so they run unchanged on the polled
//! engine, a mutex-shared handle or a test double:
//!
//! - Character LCD (HD44780 behind a PCF8574 I/O expander)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod lcd;

pub use lcd::{Lcd1602, LcdConfig, LcdError};
