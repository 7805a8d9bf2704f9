//! Outcome of a display operation
//!
//! One logical operation (a command, a character, the init script) is many
//! single-byte bus writes. A failed write does not stop the sequence, so the
//! operation can end with several failures; [`SendStatus`] keeps all of them
//! in summary form.

use embedded_hal::i2c::{Error, ErrorKind};

/// Position of a bus write within one byte send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Upper nibble, strobe low
    UpperSetup = 0,
    /// Upper nibble, strobe high
    UpperStrobe = 1,
    /// Upper nibble, strobe low again
    UpperHold = 2,
    /// Lower nibble, strobe low
    LowerSetup = 3,
    /// Lower nibble, strobe high
    LowerStrobe = 4,
    /// Lower nibble, strobe low again
    LowerHold = 5,
    /// Expander parked in read mode
    Release = 6,
    /// Standalone backlight update
    Backlight = 7,
}

impl Step {
    const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Numeric code of a bus failure (1..=4), ORed together across failures
pub fn legacy_code(kind: ErrorKind) -> u32 {
    match kind {
        ErrorKind::ArbitrationLoss => 1,
        ErrorKind::NoAcknowledge(_) => 2,
        ErrorKind::Overrun => 3,
        _ => 4,
    }
}

/// Accumulated result of the bus writes behind one display operation
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SendStatus<E> {
    writes: u16,
    failures: u16,
    failed_steps: u8,
    code: u32,
    first_error: Option<E>,
}

impl<E> Default for SendStatus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SendStatus<E> {
    /// Status with nothing recorded
    pub const fn new() -> Self {
        Self {
            writes: 0,
            failures: 0,
            failed_steps: 0,
            code: 0,
            first_error: None,
        }
    }

    /// Fold a later operation's status into this one
    pub fn merge(&mut self, other: SendStatus<E>) {
        self.writes = self.writes.saturating_add(other.writes);
        self.failures = self.failures.saturating_add(other.failures);
        self.failed_steps |= other.failed_steps;
        self.code |= other.code;
        if self.first_error.is_none() {
            self.first_error = other.first_error;
        }
    }

    /// Whether every bus write succeeded
    pub fn is_ok(&self) -> bool {
        self.failures == 0
    }

    /// Bus writes issued
    pub fn writes(&self) -> u16 {
        self.writes
    }

    /// Bus writes that failed
    pub fn failures(&self) -> u16 {
        self.failures
    }

    /// Whether `step` failed at least once
    pub fn failed(&self, step: Step) -> bool {
        self.failed_steps & step.mask() != 0
    }

    /// Bit `n` set when [`Step`] `n` failed at least once
    pub fn failed_steps(&self) -> u8 {
        self.failed_steps
    }

    /// OR of [`legacy_code`] over every failure; 0 on success
    pub fn legacy_code(&self) -> u32 {
        self.code
    }

    /// Earliest bus error, if any
    pub fn first_error(&self) -> Option<&E> {
        self.first_error.as_ref()
    }

    /// `Ok` when nothing failed, otherwise the summary as [`LcdError`]
    pub fn into_result(self) -> Result<(), LcdError<E>> {
        match self.first_error {
            None => Ok(()),
            Some(error) => Err(LcdError {
                error,
                failures: self.failures,
                failed_steps: self.failed_steps,
                code: self.code,
            }),
        }
    }
}

impl<E: Error> SendStatus<E> {
    /// Record the outcome of one bus write
    pub fn record(&mut self, step: Step, result: Result<(), E>) {
        self.writes = self.writes.saturating_add(1);
        if let Err(e) = result {
            self.failures = self.failures.saturating_add(1);
            self.failed_steps |= step.mask();
            self.code |= legacy_code(e.kind());
            if self.first_error.is_none() {
                self.first_error = Some(e);
            }
        }
    }
}

/// A display operation in which at least one bus write failed
///
/// The sequence ran to the end regardless, but the controller may have
/// latched only one nibble of a byte and be out of phase. Re-running the
/// init script resynchronises it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LcdError<E> {
    /// First bus error of the operation
    pub error: E,
    /// Number of failed bus writes
    pub failures: u16,
    /// Bit `n` set when [`Step`] `n` failed at least once
    pub failed_steps: u8,
    /// OR of [`legacy_code`] over every failure
    pub code: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpbsp_core::I2cError;

    #[test]
    fn test_empty_status_is_ok() {
        let status: SendStatus<I2cError> = SendStatus::new();
        assert!(status.is_ok());
        assert_eq!(status.legacy_code(), 0);
        assert_eq!(status.into_result(), Ok(()));
    }

    #[test]
    fn test_failures_accumulate() {
        let mut status = SendStatus::new();
        status.record(Step::UpperSetup, Ok(()));
        status.record(Step::UpperStrobe, Err(I2cError::ArbitrationLost));
        status.record(Step::LowerStrobe, Err(I2cError::Timeout));
        status.record(Step::Release, Ok(()));

        assert_eq!(status.writes(), 4);
        assert_eq!(status.failures(), 2);
        assert!(status.failed(Step::UpperStrobe));
        assert!(status.failed(Step::LowerStrobe));
        assert!(!status.failed(Step::Release));
        assert_eq!(status.legacy_code(), 1 | 4);
        assert_eq!(status.first_error(), Some(&I2cError::ArbitrationLost));

        let err = status.into_result().unwrap_err();
        assert_eq!(err.error, I2cError::ArbitrationLost);
        assert_eq!(err.failed_steps, 0b0001_0010);
    }

    #[test]
    fn test_merge_keeps_earliest_error() {
        let mut first = SendStatus::new();
        first.record(Step::Release, Ok(()));

        let mut second = SendStatus::new();
        second.record(Step::UpperHold, Err(I2cError::NotAcknowledged));
        let mut third = SendStatus::new();
        third.record(Step::Backlight, Err(I2cError::FifoLoadError));

        first.merge(second);
        first.merge(third);

        assert_eq!(first.writes(), 3);
        assert_eq!(first.first_error(), Some(&I2cError::NotAcknowledged));
        assert_eq!(first.legacy_code(), 2 | 3);
        assert!(first.failed(Step::Backlight));
    }

    #[test]
    fn test_legacy_codes_match_bus_errors() {
        for e in [
            I2cError::ArbitrationLost,
            I2cError::NotAcknowledged,
            I2cError::FifoLoadError,
            I2cError::Timeout,
        ] {
            assert_eq!(legacy_code(e.kind()), e.code());
        }
    }
}
