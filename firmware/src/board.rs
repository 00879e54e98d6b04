//! Board state shared with the command handlers.

use bincom_core::Device;
use defmt::warn;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Instant};

/// Milliseconds per watchdog tick.
pub const TICK_MS: u64 = 1;

/// On-board outputs plus the watchdog tick source.
///
/// # Pins
///
/// - GPIO 25: on-board LED (Pico)
/// - GPIO 15: actuator output
pub struct Board<'d> {
    led: Output<'d>,
    actuator: Output<'d>,
    last_tick: Instant,
    halted: bool,
}

impl<'d> Board<'d> {
    #[must_use]
    pub fn new(led: Output<'d>, actuator: Output<'d>) -> Self {
        Self {
            led,
            actuator,
            last_tick: Instant::now(),
            halted: false,
        }
    }

    pub fn set_led(&mut self, on: bool) {
        if on {
            self.led.set_high();
        } else {
            self.led.set_low();
        }
    }

    pub fn set_actuator(&mut self, on: bool) {
        if on {
            self.actuator.set_high();
        } else {
            self.actuator.set_low();
        }
    }

    /// `true` once [`Device::stop`] has run.
    #[inline]
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

impl Device for Board<'_> {
    fn take_ticks(&mut self) -> u32 {
        let ticks = (Instant::now() - self.last_tick).as_millis() / TICK_MS;
        // Leftover sub-tick time carries over to the next call
        self.last_tick += Duration::from_millis(ticks * TICK_MS);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }

    fn stop(&mut self) {
        self.led.set_low();
        self.actuator.set_low();
        if !self.halted {
            warn!("Heartbeat lost, outputs driven low");
        }
        self.halted = true;
    }
}
