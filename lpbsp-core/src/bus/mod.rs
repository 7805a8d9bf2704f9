//! I2C transaction engine
//!
//! Executes one addressed burst per call on top of an
//! [`I2cController`](lpbsp_hal::I2cController):
//!
//! ```text
//!  Normal/Start            Continue/End
//!      │                        │
//!  wait idle ──────────────────►│
//!      │                        │
//!  flush FIFO ◄─────────────────┘
//!      │
//!  load TX / set address / launch
//!      │
//!  wait !busy ─► arbitration? nack? ─► drain RX (reads)
//! ```
//!
//! The engine keeps no state between calls. Chaining bursts into one
//! exchange is the caller's job, made safe by [`Transaction`] and
//! [`SharedI2c`].

mod deadline;
mod engine;
mod error;
mod shared;
mod transaction;

#[cfg(test)]
mod sim;

pub use deadline::Deadline;
pub use engine::I2cEngine;
pub use error::I2cError;
pub use shared::{SharedEngine, SharedI2c};
pub use transaction::Transaction;
