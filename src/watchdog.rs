// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Special watchdog timer (SWDT)
//!
//! The SWDT runs from its own low-speed oscillator. Its period, refresh
//! window and reset-or-interrupt behaviour come from the ICG configuration
//! read at reset, so the driver can only feed it and inspect its status.

use core::ops::Deref;

use embedded_hal::watchdog::Watchdog;

use crate::error::Result;
use crate::pac::swdt::{RegisterBlock, Sr, REFRESH_KEY_END, REFRESH_KEY_START};
use crate::poll;

/// Default polling budget for clearing the status flags
pub const DEFAULT_TIMEOUT: u32 = 0x1000;

/// Status flags
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flag {
    /// The counter ran out
    Underflow,
    /// The counter was refreshed outside the allowed window
    RefreshError,
}

impl Flag {
    fn bits(self) -> Sr {
        match self {
            Flag::Underflow => Sr::UDF,
            Flag::RefreshError => Sr::REF,
        }
    }
}

pub struct Swdt<SWDT> {
    swdt: SWDT,
    timeout: u32,
}

impl<SWDT> Swdt<SWDT>
where
    SWDT: Deref<Target = RegisterBlock>,
{
    pub fn new(swdt: SWDT) -> Self {
        Swdt {
            swdt,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
    }

    /// Reloads the counter with the two-key refresh sequence.
    pub fn feed(&mut self) {
        self.swdt.rr.write(REFRESH_KEY_START);
        self.swdt.rr.write(REFRESH_KEY_END);
    }

    /// Current counter value.
    pub fn counter(&self) -> u16 {
        self.swdt.sr.read_field(Sr::CNT) as u16
    }

    pub fn status(&self, flag: Flag) -> bool {
        self.swdt.sr.is_set(flag.bits())
    }

    /// Clears `flag`, waiting until it reads back clear. The flag lives in
    /// the watchdog clock domain and takes a few of its cycles to drop.
    pub fn clear_status(&mut self, flag: Flag) -> Result<()> {
        let sr = &self.swdt.sr;
        sr.clear(flag.bits());
        poll::wait_inclusive(self.timeout, || !sr.is_set(flag.bits())).map_err(|e| {
            warn!("swdt: status flag did not clear");
            e
        })
    }

    pub fn free(self) -> SWDT {
        self.swdt
    }
}

impl<SWDT> Watchdog for Swdt<SWDT>
where
    SWDT: Deref<Target = RegisterBlock>,
{
    fn feed(&mut self) {
        Swdt::feed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::detached;

    #[test]
    fn feed_ends_with_the_second_key() {
        let regs: RegisterBlock = detached();
        let mut swdt = Swdt::new(&regs);

        Watchdog::feed(&mut swdt);
        assert_eq!(regs.rr.read(), REFRESH_KEY_END);
    }

    #[test]
    fn counter_and_status() {
        let regs: RegisterBlock = detached();
        regs.sr.write(0x0002_1234);
        let mut swdt = Swdt::new(&regs);

        assert_eq!(swdt.counter(), 0x1234);
        assert!(swdt.status(Flag::RefreshError));
        assert!(!swdt.status(Flag::Underflow));

        assert_eq!(swdt.clear_status(Flag::RefreshError), Ok(()));
        assert_eq!(swdt.counter(), 0x1234);
        assert!(!swdt.status(Flag::RefreshError));
    }
}
