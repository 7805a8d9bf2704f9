//! Register-level I2C controller abstraction
//!
//! Mirrors the master-side register block of the bus controller: a status
//! register, a TX and an RX FIFO with flush control, the slave address
//! register and the burst control register. The transaction engine drives
//! a burst entirely through this trait and never touches registers itself.

use crate::i2c::{BurstRole, Direction, FIFO_DEPTH};

/// Snapshot of the master status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerStatus {
    /// Controller is still shifting the current burst
    pub busy: bool,
    /// Another master won arbitration during the last burst
    pub arbitration_lost: bool,
    /// Address or data byte was not acknowledged during the last burst
    pub error: bool,
}

/// Value written to the burst control register to launch a burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BurstControl {
    /// Generate START (repeated START if the bus is already held)
    pub start: bool,
    /// Generate STOP after the last byte
    pub stop: bool,
    /// Acknowledge received bytes (reads only)
    pub ack: bool,
    /// Number of bytes in the burst
    pub length: u8,
}

impl BurstControl {
    /// Control word for a burst of `length` bytes with the given framing
    ///
    /// Every role asserts START; `Continue` and `End` become a repeated
    /// START on the wire because the bus is still held.
    pub fn new(role: BurstRole, direction: Direction, length: u8) -> Self {
        Self {
            start: true,
            stop: role.issues_stop(),
            ack: direction == Direction::Read,
            length,
        }
    }
}

/// Master-mode I2C controller registers
///
/// Implementations are thin register wrappers; reads of the status
/// register may have side effects on real hardware, hence `&mut self`.
pub trait I2cController {
    /// Depth of each hardware FIFO in bytes
    const FIFO_DEPTH: usize = FIFO_DEPTH;

    /// Configure the SCL timer period and enable the master
    fn enable(&mut self, timer_period: u8);

    /// Read the bus IDLE bit (no START seen without a matching STOP)
    fn bus_idle(&mut self) -> bool;

    /// Read the burst status bits of the master status register
    fn status(&mut self) -> ControllerStatus;

    /// Assert or release the TX FIFO flush bit
    fn set_tx_flush(&mut self, flush: bool);

    /// Number of free slots in the TX FIFO
    fn tx_fifo_free(&mut self) -> usize;

    /// Queue one byte for transmission
    fn push_tx(&mut self, byte: u8);

    /// Assert or release the RX FIFO flush bit
    fn set_rx_flush(&mut self, flush: bool);

    /// Number of received bytes waiting in the RX FIFO
    fn rx_fifo_len(&mut self) -> usize;

    /// Pop one received byte
    fn pop_rx(&mut self) -> u8;

    /// Load the slave address register
    fn set_target(&mut self, address: u8, direction: Direction);

    /// Write the burst control register, launching the burst
    fn launch(&mut self, control: BurstControl);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_control_framing() {
        let normal = BurstControl::new(BurstRole::Normal, Direction::Write, 3);
        assert!(normal.start && normal.stop && !normal.ack);
        assert_eq!(normal.length, 3);

        let start = BurstControl::new(BurstRole::Start, Direction::Write, 1);
        assert!(start.start && !start.stop);

        let cont = BurstControl::new(BurstRole::Continue, Direction::Read, 2);
        assert!(cont.start && !cont.stop && cont.ack);

        let end = BurstControl::new(BurstRole::End, Direction::Read, 8);
        assert!(end.start && end.stop && end.ack);
    }
}
