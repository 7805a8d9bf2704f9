//! LaunchPad Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that are implemented
//! by chip-specific code (register access) and consumed by the board-agnostic
//! bus engine and device drivers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Device drivers (lpbsp-drivers)         │
//! └─────────────────────────────────────────┘
//!                     │ I2cBus
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Transaction engine (lpbsp-core)        │
//! └─────────────────────────────────────────┘
//!                     │ I2cController, DelayNs, Clock
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Chip registers (MSPM0 I2C controller)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`controller::I2cController`] - Register-level bus controller
//! - [`i2c::I2cBus`] - Burst-level I2C master operations
//! - [`time::Clock`] - Monotonic microsecond clock

#![no_std]
#![deny(unsafe_code)]

pub mod controller;
pub mod i2c;
pub mod time;

// Re-export key traits at crate root for convenience
pub use controller::{BurstControl, ControllerStatus, I2cController};
pub use i2c::{BurstRole, Direction, I2cBus, I2cConfig, FIFO_DEPTH, MAX_ADDRESS};
pub use time::{Clock, DelayNs};
