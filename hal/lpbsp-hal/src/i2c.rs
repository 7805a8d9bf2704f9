//! I2C bus abstractions
//!
//! Provides the burst-level master interface consumed by device drivers.
//! A burst moves 1..=[`FIFO_DEPTH`] bytes to or from one addressed
//! peripheral. Several bursts can be chained into one logical exchange
//! with [`BurstRole`] without releasing the bus in between.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hardware FIFO depth of the bus controller (bytes per burst)
pub const FIFO_DEPTH: usize = 8;

/// Highest valid 7-bit slave address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Position of a burst within a (possibly multi-part) exchange
///
/// A multi-part exchange is `Start`, zero or more `Continue`, then `End`,
/// with no unrelated traffic in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstRole {
    /// Standalone transfer: START, address, data, STOP
    Normal,
    /// Opens an exchange: START, bus stays claimed afterwards
    Start,
    /// Middle segment: repeated START, no STOP
    Continue,
    /// Closes an exchange: repeated START, data, STOP
    End,
}

impl BurstRole {
    /// Whether the bus must be seen idle before this burst may begin
    ///
    /// `Continue` and `End` run on a bus this master already holds.
    pub const fn waits_for_idle(self) -> bool {
        matches!(self, BurstRole::Normal | BurstRole::Start)
    }

    /// Whether a STOP condition follows the last byte
    pub const fn issues_stop(self) -> bool {
        matches!(self, BurstRole::Normal | BurstRole::End)
    }
}

/// Transfer direction, as encoded in the address phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master transmits (R/W bit = 0)
    Write,
    /// Master receives (R/W bit = 1)
    Read,
}

/// I2C bus master
///
/// Burst-level read/write operations. Implementations block until the
/// burst completes, fails, or the configured timeout expires.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write one burst to the device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write (1..=[`FIFO_DEPTH`])
    /// * `role` - Framing of this burst
    fn write(&mut self, address: u8, data: &[u8], role: BurstRole) -> Result<(), Self::Error>;

    /// Read one burst from the device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to fill (1..=[`FIFO_DEPTH`] bytes)
    /// * `role` - Framing of this burst
    fn read(&mut self, address: u8, buf: &mut [u8], role: BurstRole) -> Result<(), Self::Error>;

    /// Standalone write
    fn write_normal(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.write(address, data, BurstRole::Normal)
    }

    /// Write that opens a multi-part exchange
    fn write_start(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.write(address, data, BurstRole::Start)
    }

    /// Write in the middle of a multi-part exchange
    fn write_continue(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.write(address, data, BurstRole::Continue)
    }

    /// Write that closes a multi-part exchange
    fn write_end(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.write(address, data, BurstRole::End)
    }

    /// Standalone read
    fn read_normal(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.read(address, buf, BurstRole::Normal)
    }

    /// Read that opens a multi-part exchange
    fn read_start(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.read(address, buf, BurstRole::Start)
    }

    /// Read in the middle of a multi-part exchange
    fn read_continue(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.read(address, buf, BurstRole::Continue)
    }

    /// Read that closes a multi-part exchange
    fn read_end(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.read(address, buf, BurstRole::End)
    }

    /// Write a single byte as a standalone transfer
    fn write1(&mut self, address: u8, byte: u8) -> Result<(), Self::Error> {
        self.write(address, &[byte], BurstRole::Normal)
    }

    /// Read a single byte as a standalone transfer
    fn read1(&mut self, address: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read(address, &mut buf, BurstRole::Normal)?;
        Ok(buf[0])
    }

    /// Write then read in a single exchange (repeated start)
    ///
    /// This is commonly used to write a register pointer then read its
    /// value without letting another master in between.
    ///
    /// If the write fails the exchange is left open; the controller's
    /// own STOP-on-error handling is relied upon to release the bus.
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.write(address, write_data, BurstRole::Start)?;
        self.read(address, read_buf, BurstRole::End)
    }
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8], role: BurstRole) -> Result<(), Self::Error> {
        T::write(self, address, data, role)
    }

    fn read(&mut self, address: u8, buf: &mut [u8], role: BurstRole) -> Result<(), Self::Error> {
        T::read(self, address, buf, role)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        T::write_read(self, address, write_data, read_buf)
    }
}

/// I2C configuration
///
/// All waits are bounded by `timeout_us` of monotonic time rather than
/// by an iteration count, so the budget does not depend on the CPU clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct I2cConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
    /// Upper bound for any single status wait (µs)
    pub timeout_us: u32,
    /// Pause between consecutive status polls (µs)
    pub poll_interval_us: u32,
    /// Pause after draining each received byte (µs)
    pub rx_byte_delay_us: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        timeout_us: 2_000_000,
        poll_interval_us: 10,
        rx_byte_delay_us: 30,
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: 400_000,
        ..Self::STANDARD
    };

    /// Controller timer period for the given functional clock
    ///
    /// SCL = clock / (10 × (1 + period)); the result is clamped to the
    /// 7-bit register range with a minimum of 1.
    pub fn timer_period(&self, bus_clock_hz: u32) -> u8 {
        let divisor = self.frequency.saturating_mul(10).max(1);
        let period = (bus_clock_hz / divisor).saturating_sub(1);
        period.clamp(1, 0x7F) as u8
    }
}
