//! Character LCD over an I2C I/O expander
//!
//! ```text
//!   write_char('A')
//!        │
//!        ▼
//!   send(0x41, Data)            one logical byte
//!        │
//!        ├─ upper nibble: setup, EN high, EN low
//!        ├─ lower nibble: setup, EN high, EN low
//!        └─ park expander (RW), settle
//!        │
//!        ▼
//!   I2cBus::write1 × 7          one Normal burst each
//! ```

pub mod command;
mod lcd1602;
pub mod status;

pub use command::Register;
pub use lcd1602::{DisplaySession, Font, Lcd1602, LcdConfig, Timing, DEFAULT_ADDRESS};
pub use status::{legacy_code, LcdError, SendStatus, Step};
