//! Burst failure classification

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Error from a single burst
///
/// `Ok(())` from the engine is the success outcome; each variant here is
/// produced at most once per burst and always returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// Another master won arbitration (transient, retry the whole exchange)
    ArbitrationLost,
    /// Address or data byte not acknowledged (device absent or not ready)
    NotAcknowledged,
    /// Burst does not fit the hardware FIFO (caller bug, not transient)
    FifoLoadError,
    /// Bus never became ready within the configured timeout
    Timeout,
}

impl I2cError {
    /// Numeric status code
    ///
    /// Codes are 1..=4; 0 means success.
    pub const fn code(self) -> u32 {
        match self {
            I2cError::ArbitrationLost => 1,
            I2cError::NotAcknowledged => 2,
            I2cError::FifoLoadError => 3,
            I2cError::Timeout => 4,
        }
    }

    /// Whether retrying the whole exchange can reasonably succeed
    pub const fn is_transient(self) -> bool {
        matches!(self, I2cError::ArbitrationLost | I2cError::NotAcknowledged)
    }
}

impl embedded_hal::i2c::Error for I2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            I2cError::ArbitrationLost => ErrorKind::ArbitrationLoss,
            I2cError::NotAcknowledged => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            I2cError::FifoLoadError => ErrorKind::Overrun,
            I2cError::Timeout => ErrorKind::Other,
        }
    }
}
