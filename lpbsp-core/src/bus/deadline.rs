//! Monotonic deadlines for bounded polling

use lpbsp_hal::Clock;

/// Point in monotonic time after which a wait gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    expires_at_us: u64,
}

impl Deadline {
    /// Deadline `timeout_us` from now
    pub fn after<K: Clock>(clock: &mut K, timeout_us: u32) -> Self {
        Self {
            expires_at_us: clock.now_us().saturating_add(u64::from(timeout_us)),
        }
    }

    /// Whether the deadline has passed
    pub fn expired<K: Clock>(&self, clock: &mut K) -> bool {
        clock.now_us() >= self.expires_at_us
    }

    /// Absolute expiry time in microseconds
    pub fn expires_at_us(&self) -> u64 {
        self.expires_at_us
    }
}
