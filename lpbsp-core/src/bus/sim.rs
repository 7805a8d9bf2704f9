//! Simulated bus controller and clock for engine tests
//!
//! The controller hosts one echo peripheral: a read returns the bytes of
//! the last write, padded with 0xFF. Idle-bit reads are counted per burst
//! so tests can tell whether an idle wait ran before a launch.

use core::cell::Cell;

use heapless::{Deque, Vec};
use lpbsp_hal::{
    BurstControl, Clock, ControllerStatus, DelayNs, Direction, I2cController, FIFO_DEPTH,
};

/// Simulated time, advanced only by delays
pub struct SimClock {
    now_ns: Cell<u64>,
}

impl SimClock {
    pub const fn new() -> Self {
        Self {
            now_ns: Cell::new(0),
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.now_ns.get() / 1_000
    }
}

impl Clock for &SimClock {
    fn now_us(&mut self) -> u64 {
        self.elapsed_us()
    }
}

impl DelayNs for &SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns.set(self.now_ns.get() + u64::from(ns));
    }
}

/// Injected hardware misbehaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// Bus never goes idle and bursts never finish
    StuckBusy,
    /// Bursts complete but report lost arbitration
    ArbitrationLost,
    /// Bursts complete but the device does not acknowledge
    Nack,
    /// Reads complete but the RX FIFO never fills
    RxStall,
}

pub struct SimController {
    pub device_address: u8,
    pub fault: Fault,
    /// Status reads that still report busy after each launch
    pub busy_polls: u32,
    /// Bus held by another master for this many idle-bit reads
    pub foreign_hold_reads: u32,

    tx: Deque<u8, FIFO_DEPTH>,
    rx: Deque<u8, FIFO_DEPTH>,
    target: Option<(u8, Direction)>,
    memory: Vec<u8, FIFO_DEPTH>,
    held: bool,
    busy_reads_left: u32,
    arbitration_lost: bool,
    nack: bool,

    pub timer_period: Option<u8>,
    pub status_reads: u32,
    idle_reads_since_launch: u32,
    pub reads_before_launch: Vec<u32, 64>,
    pub launches: Vec<BurstControl, 64>,
    pub tx_flushes: u32,
    pub rx_flushes: u32,
    /// Every byte the peripheral accepted, in wire order
    pub wire: Vec<u8, 128>,
}

impl SimController {
    pub fn new(device_address: u8) -> Self {
        Self {
            device_address,
            fault: Fault::None,
            busy_polls: 1,
            foreign_hold_reads: 0,
            tx: Deque::new(),
            rx: Deque::new(),
            target: None,
            memory: Vec::new(),
            held: false,
            busy_reads_left: 0,
            arbitration_lost: false,
            nack: false,
            timer_period: None,
            status_reads: 0,
            idle_reads_since_launch: 0,
            reads_before_launch: Vec::new(),
            launches: Vec::new(),
            tx_flushes: 0,
            rx_flushes: 0,
            wire: Vec::new(),
        }
    }

    /// Leave bytes behind in both FIFOs, as a failed burst would
    pub fn leave_stale_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let _ = self.tx.push_back(b);
            let _ = self.rx.push_back(b);
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn tx_len(&self) -> usize {
        self.tx.len()
    }

    fn reject(&mut self) {
        self.held = false;
        self.tx.clear();
    }
}

impl I2cController for SimController {
    fn enable(&mut self, timer_period: u8) {
        self.timer_period = Some(timer_period);
    }

    fn bus_idle(&mut self) -> bool {
        self.idle_reads_since_launch += 1;

        if self.fault == Fault::StuckBusy {
            return false;
        }
        if self.foreign_hold_reads > 0 {
            self.foreign_hold_reads -= 1;
            return false;
        }
        !self.held && self.busy_reads_left == 0
    }

    fn status(&mut self) -> ControllerStatus {
        self.status_reads += 1;

        if self.fault == Fault::StuckBusy {
            return ControllerStatus {
                busy: true,
                arbitration_lost: false,
                error: false,
            };
        }

        let busy = self.busy_reads_left > 0;
        if busy {
            self.busy_reads_left -= 1;
        }

        ControllerStatus {
            busy,
            arbitration_lost: self.arbitration_lost,
            error: self.nack,
        }
    }

    fn set_tx_flush(&mut self, flush: bool) {
        if flush {
            self.tx.clear();
            self.tx_flushes += 1;
        }
    }

    fn tx_fifo_free(&mut self) -> usize {
        FIFO_DEPTH - self.tx.len()
    }

    fn push_tx(&mut self, byte: u8) {
        let _ = self.tx.push_back(byte);
    }

    fn set_rx_flush(&mut self, flush: bool) {
        if flush {
            self.rx.clear();
            self.rx_flushes += 1;
        }
    }

    fn rx_fifo_len(&mut self) -> usize {
        self.rx.len()
    }

    fn pop_rx(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn set_target(&mut self, address: u8, direction: Direction) {
        self.target = Some((address, direction));
    }

    fn launch(&mut self, control: BurstControl) {
        let _ = self.reads_before_launch.push(self.idle_reads_since_launch);
        self.idle_reads_since_launch = 0;
        let _ = self.launches.push(control);

        self.busy_reads_left = self.busy_polls;
        self.arbitration_lost = false;
        self.nack = false;

        match self.fault {
            Fault::StuckBusy => return,
            Fault::ArbitrationLost => {
                self.arbitration_lost = true;
                self.reject();
                return;
            }
            Fault::Nack => {
                self.nack = true;
                self.reject();
                return;
            }
            Fault::None | Fault::RxStall => {}
        }

        let Some((address, direction)) = self.target else {
            self.nack = true;
            self.reject();
            return;
        };
        if address != self.device_address {
            self.nack = true;
            self.reject();
            return;
        }

        match direction {
            Direction::Write => {
                self.memory.clear();
                for _ in 0..control.length {
                    if let Some(b) = self.tx.pop_front() {
                        let _ = self.memory.push(b);
                        let _ = self.wire.push(b);
                    }
                }
            }
            Direction::Read => {
                if self.fault != Fault::RxStall {
                    for i in 0..usize::from(control.length) {
                        let b = self.memory.get(i).copied().unwrap_or(0xFF);
                        let _ = self.rx.push_back(b);
                    }
                }
            }
        }

        self.held = !control.stop;
    }
}
