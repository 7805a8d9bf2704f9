//! Exclusive burst chains

use lpbsp_hal::{BurstRole, Clock, DelayNs, I2cController};

use super::{I2cEngine, I2cError};

/// A multi-part exchange in progress
///
/// The first burst goes out as `Start`, later ones as `Continue`, and an
/// `end_*` call closes the exchange with `End`. An exchange that only ever
/// sees an `end_*` call degenerates to a single `Normal` burst.
///
/// Dropping an open transaction without ending it leaves the bus claimed
/// (and logs a warning under `defmt`); the next `Normal`/`Start` burst will
/// then time out waiting for idle.
#[must_use = "an open exchange keeps the bus claimed until ended"]
pub struct Transaction<'a, C, D, K> {
    engine: &'a mut I2cEngine<C, D, K>,
    open: bool,
}

impl<'a, C, D, K> Transaction<'a, C, D, K>
where
    C: I2cController,
    D: DelayNs,
    K: Clock,
{
    pub(super) fn new(engine: &'a mut I2cEngine<C, D, K>) -> Self {
        Self {
            engine,
            open: false,
        }
    }

    /// Whether a `Start` has gone out and no `End` yet
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Write a burst, keeping the bus claimed afterwards
    pub fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        let role = self.next_role();
        let result = self.engine.send(address, data, role);
        self.track(&result);
        result
    }

    /// Read a burst, keeping the bus claimed afterwards
    pub fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        let role = self.next_role();
        let result = self.engine.receive(address, buf, role);
        self.track(&result);
        result
    }

    /// Write the final burst and release the bus
    pub fn end_write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        let role = self.closing_role();
        let result = self.engine.send(address, data, role);
        self.close(&result);
        result
    }

    /// Read the final burst and release the bus
    pub fn end_read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        let role = self.closing_role();
        let result = self.engine.receive(address, buf, role);
        self.close(&result);
        result
    }

    fn next_role(&self) -> BurstRole {
        if self.open {
            BurstRole::Continue
        } else {
            BurstRole::Start
        }
    }

    fn closing_role(&self) -> BurstRole {
        if self.open {
            BurstRole::End
        } else {
            BurstRole::Normal
        }
    }

    /// A FIFO load error never reaches the wire, so the bus state is
    /// unchanged; any other failure ends the exchange.
    fn track(&mut self, result: &Result<(), I2cError>) {
        match result {
            Ok(()) => self.open = true,
            Err(I2cError::FifoLoadError) => {}
            Err(_) => self.open = false,
        }
    }

    fn close(&mut self, result: &Result<(), I2cError>) {
        if !matches!(result, Err(I2cError::FifoLoadError)) {
            self.open = false;
        }
    }
}

impl<C, D, K> Drop for Transaction<'_, C, D, K> {
    fn drop(&mut self) {
        if self.open {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c: exchange dropped while open, bus still claimed");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bus::sim::{Fault, SimClock, SimController};
    use crate::bus::{I2cEngine, I2cError};
    use lpbsp_hal::{BurstRole, I2cConfig};

    const EEPROM: u8 = 0x50;

    fn stops(engine: &I2cEngine<SimController, &SimClock, &SimClock>) -> heapless::Vec<bool, 8> {
        engine.controller().launches.iter().map(|c| c.stop).collect()
    }

    #[test]
    fn test_start_continue_end() {
        let clock = SimClock::new();
        let mut i2c = I2cEngine::new(
            SimController::new(EEPROM),
            &clock,
            &clock,
            I2cConfig::STANDARD,
        );

        {
            let mut tx = i2c.transaction();
            assert!(!tx.is_open());
            tx.write(EEPROM, &[0x00, 0x10]).unwrap();
            assert!(tx.is_open());
            tx.write(EEPROM, &[0xAB]).unwrap();
            let mut buf = [0u8; 1];
            tx.end_read(EEPROM, &mut buf).unwrap();
            assert_eq!(buf, [0xAB]);
            assert!(!tx.is_open());
        }

        assert_eq!(&stops(&i2c)[..], &[false, false, true]);
        // Only the opening burst waited for an idle bus
        assert_eq!(&i2c.controller().reads_before_launch[..], &[1, 0, 0]);
        assert!(!i2c.controller().is_held());
    }

    #[test]
    fn test_lone_end_is_normal() {
        let clock = SimClock::new();
        let mut i2c = I2cEngine::new(
            SimController::new(EEPROM),
            &clock,
            &clock,
            I2cConfig::STANDARD,
        );

        i2c.transaction().end_write(EEPROM, &[0x01]).unwrap();

        assert_eq!(&stops(&i2c)[..], &[true]);
        assert_eq!(&i2c.controller().reads_before_launch[..], &[1]);
    }

    #[test]
    fn test_oversized_burst_keeps_exchange_open() {
        let clock = SimClock::new();
        let mut i2c = I2cEngine::new(
            SimController::new(EEPROM),
            &clock,
            &clock,
            I2cConfig::STANDARD,
        );

        let mut tx = i2c.transaction();
        tx.write(EEPROM, &[0x00]).unwrap();
        assert_eq!(tx.write(EEPROM, &[0u8; 9]), Err(I2cError::FifoLoadError));
        assert!(tx.is_open());
        tx.end_write(EEPROM, &[0x01]).unwrap();
        assert!(!tx.is_open());
    }

    #[test]
    fn test_nack_closes_exchange() {
        let clock = SimClock::new();
        let mut i2c = I2cEngine::new(
            SimController::new(EEPROM),
            &clock,
            &clock,
            I2cConfig::STANDARD,
        );
        i2c.controller_mut().fault = Fault::Nack;

        let mut tx = i2c.transaction();
        assert_eq!(tx.write(EEPROM, &[0x00]), Err(I2cError::NotAcknowledged));
        assert!(!tx.is_open());
    }

    #[test]
    fn test_dropped_open_exchange_keeps_bus_claimed() {
        let clock = SimClock::new();
        let mut i2c = I2cEngine::new(
            SimController::new(EEPROM),
            &clock,
            &clock,
            I2cConfig {
                timeout_us: 1_000,
                ..I2cConfig::STANDARD
            },
        );

        {
            let mut tx = i2c.transaction();
            tx.write(EEPROM, &[0x00]).unwrap();
            assert!(tx.is_open());
        }

        assert!(i2c.controller().is_held());
        assert_eq!(i2c.send(EEPROM, &[0x01], BurstRole::Normal), Err(I2cError::Timeout));
    }
}
