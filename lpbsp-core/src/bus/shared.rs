//! Shared bus ownership
//!
//! The engine itself is single-owner. When several drivers or contexts need
//! the bus, the engine lives in a blocking mutex and each user gets a
//! [`SharedI2c`] handle. The lock is held for a whole exchange, so the
//! sub-transactions of two exchanges can never interleave.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use lpbsp_hal::{BurstRole, Clock, DelayNs, I2cBus, I2cController};

use super::{I2cEngine, I2cError, Transaction};

/// Engine wrapped for sharing
pub type SharedEngine<M, C, D, K> = Mutex<M, RefCell<I2cEngine<C, D, K>>>;

/// Handle to a mutex-protected engine
///
/// # Example
///
/// ```ignore
/// static BUS: SharedEngine<CriticalSectionRawMutex, Ctl, Delay, Mono> =
///     Mutex::new(RefCell::new(engine));
///
/// let i2c = SharedI2c::new(&BUS);
/// i2c.transaction(|tx| {
///     tx.write(0x50, &[0x00, 0x10])?;
///     tx.end_read(0x50, &mut buf)
/// })?;
/// ```
pub struct SharedI2c<'a, M: RawMutex, C, D, K> {
    bus: &'a SharedEngine<M, C, D, K>,
}

impl<'a, M: RawMutex, C, D, K> Clone for SharedI2c<'a, M, C, D, K> {
    fn clone(&self) -> Self {
        Self { bus: self.bus }
    }
}

impl<'a, M, C, D, K> SharedI2c<'a, M, C, D, K>
where
    M: RawMutex,
    C: I2cController,
    D: DelayNs,
    K: Clock,
{
    /// Create a new handle
    pub fn new(bus: &'a SharedEngine<M, C, D, K>) -> Self {
        Self { bus }
    }

    /// Run a whole exchange with the bus locked
    ///
    /// The lock is taken once and released only after `f` returns.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut Transaction<'_, C, D, K>) -> R) -> R {
        self.bus.lock(|cell| {
            let mut engine = cell.borrow_mut();
            let mut transaction = engine.transaction();
            f(&mut transaction)
        })
    }

    /// Run `f` with exclusive access to the engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut I2cEngine<C, D, K>) -> R) -> R {
        self.bus.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Each call locks the bus for one burst. Chains built from individual
/// `Start`/`Continue`/`End` calls are therefore not protected; use
/// [`SharedI2c::transaction`] (or `write_read`) for those.
impl<'a, M, C, D, K> I2cBus for SharedI2c<'a, M, C, D, K>
where
    M: RawMutex,
    C: I2cController,
    D: DelayNs,
    K: Clock,
{
    type Error = I2cError;

    fn write(&mut self, address: u8, data: &[u8], role: BurstRole) -> Result<(), Self::Error> {
        self.with_engine(|engine| engine.send(address, data, role))
    }

    fn read(&mut self, address: u8, buf: &mut [u8], role: BurstRole) -> Result<(), Self::Error> {
        self.with_engine(|engine| engine.receive(address, buf, role))
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transaction(|tx| {
            tx.write(address, write_data)?;
            tx.end_read(address, read_buf)
        })
    }
}

#[cfg(test)]
mod tests {
    use core::cell::{Cell, RefCell};

    use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
    use embassy_sync::blocking_mutex::Mutex;
    use lpbsp_hal::{I2cBus, I2cConfig};

    use super::*;
    use crate::bus::sim::{SimClock, SimController};

    const SENSOR: u8 = 0x48;

    std::thread_local! {
        static LOCKS: Cell<u32> = const { Cell::new(0) };
    }

    /// Single-context mutex that counts how often it was taken
    struct CountingMutex;

    #[allow(unsafe_code)]
    unsafe impl RawMutex for CountingMutex {
        const INIT: Self = CountingMutex;

        fn lock<R>(&self, f: impl FnOnce() -> R) -> R {
            LOCKS.with(|locks| locks.set(locks.get() + 1));
            f()
        }
    }

    fn locks_taken() -> u32 {
        LOCKS.with(|locks| locks.get())
    }

    #[test]
    fn test_exchange_holds_one_lock() {
        let clock = SimClock::new();
        let engine = I2cEngine::new(
            SimController::new(SENSOR),
            &clock,
            &clock,
            I2cConfig::STANDARD,
        );
        let bus: SharedEngine<CountingMutex, _, _, _> = Mutex::new(RefCell::new(engine));
        let mut i2c = SharedI2c::new(&bus);

        let before = locks_taken();
        let mut buf = [0u8; 2];
        i2c.write_read(SENSOR, &[0x12, 0x34], &mut buf).unwrap();
        assert_eq!(buf, [0x12, 0x34]);
        // One lock for two bursts
        assert_eq!(locks_taken() - before, 1);

        i2c.write1(SENSOR, 0x01).unwrap();
        i2c.write1(SENSOR, 0x02).unwrap();
        assert_eq!(locks_taken() - before, 3);

        let launches = i2c.with_engine(|engine| engine.controller().launches.len());
        assert_eq!(launches, 4);
    }

    #[test]
    fn test_handles_share_one_engine() {
        let clock = SimClock::new();
        let engine = I2cEngine::new(
            SimController::new(SENSOR),
            &clock,
            &clock,
            I2cConfig::STANDARD,
        );
        let bus: SharedEngine<NoopRawMutex, _, _, _> = Mutex::new(RefCell::new(engine));

        let mut first = SharedI2c::new(&bus);
        let mut second = first.clone();

        first.write1(SENSOR, 0xA5).unwrap();
        assert_eq!(second.read1(SENSOR), Ok(0xA5));

        let chained = first.transaction(|tx| {
            tx.write(SENSOR, &[0x01])?;
            tx.write(SENSOR, &[0x02])?;
            tx.end_write(SENSOR, &[0x03])
        });
        assert_eq!(chained, Ok(()));

        let wire = second.with_engine(|engine| engine.controller().wire.clone());
        assert_eq!(&wire[..], &[0xA5, 0x01, 0x02, 0x03]);
    }
}
