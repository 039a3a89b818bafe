// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delays and tick counting
//!
//! [`Delay`] busy-waits on the SysTick down-counter. [`TickCounter`] is a
//! millisecond tick shared with the SysTick exception handler:
//!
//! ```ignore
//! static TICKS: TickCounter = TickCounter::new();
//!
//! #[exception]
//! fn SysTick() {
//!     TICKS.inc();
//! }
//!
//! let start = TICKS.now();
//! while TICKS.elapsed_since(start) < 500 {}
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use cast::u32;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::cmu::Clocks;
use crate::time::Hertz;

/// SysTick reload register is 24 bits wide
const MAX_RVR: u32 = 0x00FF_FFFF;

/// System timer (SysTick) as a delay provider
pub struct Delay {
    hclk: Hertz,
    syst: SYST,
}

impl Delay {
    /// Configures the system timer (SysTick) as a delay provider
    pub fn new(mut syst: SYST, clocks: Clocks) -> Self {
        syst.set_clock_source(SystClkSource::Core);

        Delay {
            syst,
            hclk: clocks.hclk(),
        }
    }

    /// Releases the system timer (SysTick) resource
    pub fn free(self) -> SYST {
        self.syst
    }
}

impl DelayMs<u32> for Delay {
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000_u32);
        }
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        self.delay_ms(u32(ms));
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        self.delay_ms(u32(ms));
    }
}

impl DelayUs<u32> for Delay {
    fn delay_us(&mut self, us: u32) {
        let mut total_rvr = reload_for(self.hclk, us);

        while total_rvr != 0 {
            let current_rvr = total_rvr.min(u64::from(MAX_RVR)) as u32;

            self.syst.set_reload(current_rvr);
            self.syst.clear_current();
            self.syst.enable_counter();

            total_rvr -= u64::from(current_rvr);

            while !self.syst.has_wrapped() {}

            self.syst.disable_counter();
        }
    }
}

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        self.delay_us(u32(us))
    }
}

impl DelayUs<u8> for Delay {
    fn delay_us(&mut self, us: u8) {
        self.delay_us(u32(us))
    }
}

/// SysTick counts needed for `us` microseconds at `hclk`
fn reload_for(hclk: Hertz, us: u32) -> u64 {
    u64::from(us) * u64::from(hclk.0 / 1_000_000)
}

/// Free-running tick count, advanced from an interrupt handler
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        TickCounter {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advances the count by one tick. Call from the tick interrupt.
    #[inline]
    pub fn inc(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks since `start`, correct across one wrap of the counter.
    pub fn elapsed_since(&self, start: u32) -> u32 {
        self.now().wrapping_sub(start)
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_scales_with_the_core_clock() {
        assert_eq!(reload_for(Hertz(32_000_000), 1_000), 32_000);
        assert_eq!(reload_for(Hertz(8_000_000), 0), 0);
    }

    #[test]
    fn elapsed_survives_wrapping() {
        let counter = TickCounter::new();
        assert_eq!(counter.now(), 0);

        counter.inc();
        counter.inc();
        assert_eq!(counter.elapsed_since(0), 2);
        assert_eq!(counter.elapsed_since(u32::MAX), 3);
    }
}
