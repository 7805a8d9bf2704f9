//! Time abstractions
//!
//! Blocking delays come from [`embedded_hal::delay::DelayNs`]; this module
//! adds the monotonic clock used to bound status polling by elapsed time.

pub use embedded_hal::delay::DelayNs;

/// Monotonic microsecond clock
///
/// Must never go backwards. Wrap-around is not handled; a 64-bit
/// microsecond counter outlives the device.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin
    fn now_us(&mut self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_us(&mut self) -> u64 {
        T::now_us(self)
    }
}
