//! Polled burst engine

use embedded_hal::i2c::{ErrorType, Operation, SevenBitAddress};
use lpbsp_hal::{
    BurstControl, BurstRole, Clock, ControllerStatus, DelayNs, Direction, I2cBus, I2cConfig,
    I2cController, FIFO_DEPTH, MAX_ADDRESS,
};

use super::{Deadline, I2cError, Transaction};

/// Blocking I2C master built on a register-level controller
///
/// Owns the controller for the lifetime of the device. Each call runs one
/// burst to completion (or timeout) and reports exactly one outcome.
///
/// # Example
///
/// ```ignore
/// let mut i2c = I2cEngine::new(controller, delay, clock, I2cConfig::STANDARD);
/// i2c.init(bus_clock_hz);
///
/// // Register pointer write, then read, without releasing the bus
/// let mut value = [0u8; 2];
/// let mut tx = i2c.transaction();
/// tx.write(0x48, &[0x00])?;
/// tx.end_read(0x48, &mut value)?;
/// ```
pub struct I2cEngine<C, D, K> {
    controller: C,
    delay: D,
    clock: K,
    config: I2cConfig,
}

impl<C, D, K> I2cEngine<C, D, K>
where
    C: I2cController,
    D: DelayNs,
    K: Clock,
{
    /// Create a new engine
    ///
    /// The controller is not touched until [`init`](Self::init).
    pub fn new(controller: C, delay: D, clock: K, config: I2cConfig) -> Self {
        Self {
            controller,
            delay,
            clock,
            config,
        }
    }

    /// Program the SCL timer from the controller's functional clock and
    /// enable master mode
    pub fn init(&mut self, bus_clock_hz: u32) {
        let period = self.config.timer_period(bus_clock_hz);
        self.controller.enable(period);
    }

    /// Get the configuration
    pub fn config(&self) -> &I2cConfig {
        &self.config
    }

    /// Get access to the underlying controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Get mutable access to the underlying controller
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Release the controller, delay and clock
    pub fn free(self) -> (C, D, K) {
        (self.controller, self.delay, self.clock)
    }

    /// Begin a chained exchange (Start, Continue*, End)
    ///
    /// The returned handle borrows the engine exclusively, so no unrelated
    /// burst can slip in between the parts.
    pub fn transaction(&mut self) -> Transaction<'_, C, D, K> {
        Transaction::new(self)
    }

    /// Write one burst
    ///
    /// On success every byte was queued, shifted out and acknowledged.
    pub fn send(&mut self, address: u8, data: &[u8], role: BurstRole) -> Result<(), I2cError> {
        if data.is_empty() {
            return Err(I2cError::FifoLoadError);
        }
        self.write_burst(address, data, role)
    }

    /// Address-only write: the target is addressed and must acknowledge,
    /// but no data byte follows
    pub fn send_address_only(&mut self, address: u8, role: BurstRole) -> Result<(), I2cError> {
        self.write_burst(address, &[], role)
    }

    fn write_burst(&mut self, address: u8, data: &[u8], role: BurstRole) -> Result<(), I2cError> {
        if role.waits_for_idle() {
            self.wait_until(|c| c.bus_idle())?;
        }

        self.flush_tx()?;

        for &byte in data {
            if self.controller.tx_fifo_free() == 0 {
                self.abort(Direction::Write);
                return Err(I2cError::FifoLoadError);
            }
            self.controller.push_tx(byte);
        }

        self.controller.set_target(address & MAX_ADDRESS, Direction::Write);
        self.controller
            .launch(BurstControl::new(role, Direction::Write, data.len() as u8));

        self.complete(Direction::Write)
    }

    /// Read one burst into `buf`
    ///
    /// `buf` is only written on success.
    pub fn receive(&mut self, address: u8, buf: &mut [u8], role: BurstRole) -> Result<(), I2cError> {
        if buf.is_empty() || buf.len() > C::FIFO_DEPTH {
            return Err(I2cError::FifoLoadError);
        }

        if role.waits_for_idle() {
            self.wait_until(|c| c.bus_idle())?;
        }

        self.flush_rx()?;

        self.controller.set_target(address & MAX_ADDRESS, Direction::Read);
        self.controller
            .launch(BurstControl::new(role, Direction::Read, buf.len() as u8));

        self.complete(Direction::Read)?;

        let wanted = buf.len();
        if let Err(e) = self.wait_until(|c| c.rx_fifo_len() >= wanted) {
            self.abort(Direction::Read);
            return Err(e);
        }

        for slot in buf.iter_mut() {
            *slot = self.controller.pop_rx();
            self.delay.delay_us(self.config.rx_byte_delay_us);
        }

        Ok(())
    }

    /// Wait for the launched burst to finish and classify the result
    fn complete(&mut self, direction: Direction) -> Result<(), I2cError> {
        if let Err(e) = self.wait_for_status(|s| !s.busy) {
            self.abort(direction);
            return Err(e);
        }

        let status = self.controller.status();
        if status.arbitration_lost {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c: arbitration lost");
            self.abort(direction);
            return Err(I2cError::ArbitrationLost);
        }
        if status.error {
            self.abort(direction);
            return Err(I2cError::NotAcknowledged);
        }

        Ok(())
    }

    fn flush_tx(&mut self) -> Result<(), I2cError> {
        self.controller.set_tx_flush(true);
        let result = self.wait_until(|c| c.tx_fifo_free() >= C::FIFO_DEPTH);
        self.controller.set_tx_flush(false);
        result
    }

    fn flush_rx(&mut self) -> Result<(), I2cError> {
        self.controller.set_rx_flush(true);
        let result = self.wait_until(|c| c.rx_fifo_len() == 0);
        self.controller.set_rx_flush(false);
        result
    }

    /// Drop whatever the failed burst left in its FIFO
    fn abort(&mut self, direction: Direction) {
        match direction {
            Direction::Write => {
                self.controller.set_tx_flush(true);
                self.controller.set_tx_flush(false);
            }
            Direction::Read => {
                self.controller.set_rx_flush(true);
                self.controller.set_rx_flush(false);
            }
        }
    }

    fn wait_for_status(
        &mut self,
        mut ready: impl FnMut(ControllerStatus) -> bool,
    ) -> Result<(), I2cError> {
        self.wait_until(|c| ready(c.status()))
    }

    /// Poll `ready` every `poll_interval_us` until it holds or
    /// `timeout_us` of monotonic time has passed
    fn wait_until(&mut self, mut ready: impl FnMut(&mut C) -> bool) -> Result<(), I2cError> {
        let deadline = Deadline::after(&mut self.clock, self.config.timeout_us);
        loop {
            if ready(&mut self.controller) {
                return Ok(());
            }
            if deadline.expired(&mut self.clock) {
                #[cfg(feature = "defmt")]
                defmt::warn!("i2c: bus not ready after {} us", self.config.timeout_us);
                return Err(I2cError::Timeout);
            }
            self.delay.delay_us(self.config.poll_interval_us);
        }
    }
}

impl<C, D, K> I2cBus for I2cEngine<C, D, K>
where
    C: I2cController,
    D: DelayNs,
    K: Clock,
{
    type Error = I2cError;

    fn write(&mut self, address: u8, data: &[u8], role: BurstRole) -> Result<(), Self::Error> {
        self.send(address, data, role)
    }

    fn read(&mut self, address: u8, buf: &mut [u8], role: BurstRole) -> Result<(), Self::Error> {
        self.receive(address, buf, role)
    }
}

impl<C, D, K> ErrorType for I2cEngine<C, D, K> {
    type Error = I2cError;
}

/// Adjacent operations of the same direction are merged into one burst
/// while their combined length fits the FIFO; a direction change, or a
/// run that would overflow the FIFO, starts a new burst with a repeated
/// START. A zero-length write becomes an address-only burst.
impl<C, D, K> embedded_hal::i2c::I2c<SevenBitAddress> for I2cEngine<C, D, K>
where
    C: I2cController,
    D: DelayNs,
    K: Clock,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bursts = 0;
        let mut first = 0;
        while first < operations.len() {
            first = burst_span(operations, first).0;
            bursts += 1;
        }

        let mut first = 0;
        let mut index = 0;
        while first < operations.len() {
            let (end, total) = burst_span(operations, first);
            let role = chain_role(index, bursts);
            self.run_burst(address, &mut operations[first..end], total, role)?;
            first = end;
            index += 1;
        }
        Ok(())
    }
}

impl<C, D, K> I2cEngine<C, D, K>
where
    C: I2cController,
    D: DelayNs,
    K: Clock,
{
    /// Issue same-direction operations moving `total` bytes as one burst
    fn run_burst(
        &mut self,
        address: u8,
        run: &mut [Operation<'_>],
        total: usize,
        role: BurstRole,
    ) -> Result<(), I2cError> {
        if total > FIFO_DEPTH {
            // Only a lone oversized operation gets here; the burst path rejects it
            return match run {
                [Operation::Write(bytes)] => self.send(address, bytes, role),
                [Operation::Read(buf)] => self.receive(address, buf, role),
                _ => Err(I2cError::FifoLoadError),
            };
        }

        let mut staged = [0u8; FIFO_DEPTH];
        let staged = &mut staged[..total];
        let mut offset = 0;

        if let Some(Operation::Read(_)) = run.first() {
            self.receive(address, staged, role)?;
            for op in run.iter_mut() {
                if let Operation::Read(buf) = op {
                    let len = buf.len();
                    buf.copy_from_slice(&staged[offset..offset + len]);
                    offset += len;
                }
            }
            return Ok(());
        }

        for op in run.iter() {
            if let Operation::Write(bytes) = op {
                staged[offset..offset + bytes.len()].copy_from_slice(bytes);
                offset += bytes.len();
            }
        }
        if total == 0 {
            self.send_address_only(address, role)
        } else {
            self.send(address, staged, role)
        }
    }
}

/// End (exclusive) of the same-direction run starting at `first` that fits
/// one burst, and the bytes it moves
///
/// The run always holds at least the operation at `first`.
fn burst_span(operations: &[Operation<'_>], first: usize) -> (usize, usize) {
    let reading = matches!(operations.get(first), Some(Operation::Read(_)));
    let mut end = first;
    let mut total = 0;

    while let Some(op) = operations.get(end) {
        let (is_read, len) = match op {
            Operation::Read(buf) => (true, buf.len()),
            Operation::Write(bytes) => (false, bytes.len()),
        };
        if end > first && (is_read != reading || total + len > FIFO_DEPTH) {
            break;
        }
        total += len;
        end += 1;
    }
    (end, total)
}

/// Role of burst `index` in a chain of `count` bursts
fn chain_role(index: usize, count: usize) -> BurstRole {
    if count == 1 {
        BurstRole::Normal
    } else if index == 0 {
        BurstRole::Start
    } else if index + 1 == count {
        BurstRole::End
    } else {
        BurstRole::Continue
    }
}
