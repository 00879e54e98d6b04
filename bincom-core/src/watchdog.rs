//! Heartbeat watchdog.
//!
//! Counts ticks since the last heartbeat and reports expiry once the count
//! exceeds the configured timeout. A timeout of 0 disarms it. The watchdog
//! only compares; halting the device is up to the caller.

/// Whether the watchdog can expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogState {
    /// `timeout_ticks > 0`.
    Armed,
    /// `timeout_ticks == 0`.
    Disarmed,
}

/// Tick counter with a heartbeat deadline.
///
/// # Example
///
/// ```
/// use bincom_core::Watchdog;
///
/// let mut watchdog = Watchdog::new(2);
/// watchdog.advance(2);
/// assert!(!watchdog.is_expired());
/// watchdog.tick();
/// assert!(watchdog.is_expired());
/// watchdog.heartbeat();
/// assert!(!watchdog.is_expired());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Watchdog {
    elapsed_ticks: u32,
    timeout_ticks: u32,
}

impl Watchdog {
    /// Watchdog expiring after `timeout_ticks` ticks without a heartbeat.
    #[must_use]
    pub const fn new(timeout_ticks: u32) -> Self {
        Self {
            elapsed_ticks: 0,
            timeout_ticks,
        }
    }

    #[must_use]
    pub const fn disarmed() -> Self {
        Self::new(0)
    }

    #[must_use]
    pub const fn state(&self) -> WatchdogState {
        if self.timeout_ticks == 0 {
            WatchdogState::Disarmed
        } else {
            WatchdogState::Armed
        }
    }

    #[inline]
    #[must_use]
    pub const fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    #[inline]
    #[must_use]
    pub const fn timeout_ticks(&self) -> u32 {
        self.timeout_ticks
    }

    #[inline]
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Add `ticks` to the elapsed count, saturating at `u32::MAX`.
    #[inline]
    pub fn advance(&mut self, ticks: u32) {
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(ticks);
    }

    /// Restart the count.
    #[inline]
    pub fn heartbeat(&mut self) {
        self.elapsed_ticks = 0;
    }

    /// Change the timeout. 0 disarms. The elapsed count is kept.
    pub fn set_timeout(&mut self, timeout_ticks: u32) {
        self.timeout_ticks = timeout_ticks;
    }

    /// `true` while armed and past the deadline. Stays `true` on every check
    /// until a heartbeat arrives or the watchdog is disarmed.
    #[inline]
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.timeout_ticks != 0 && self.elapsed_ticks > self.timeout_ticks
    }
}
