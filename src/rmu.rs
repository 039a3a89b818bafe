// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reset cause

use core::ops::Deref;

use crate::error::Result;
use crate::pac::rmu::RegisterBlock;
use crate::poll;

/// Reset causes latched since the flags were last cleared
pub use crate::pac::rmu::Rstf0 as ResetCause;

/// Default polling budget for clearing the flags
pub const DEFAULT_TIMEOUT: u32 = 0x100;

pub struct Rmu<RMU> {
    rmu: RMU,
    timeout: u32,
}

impl<RMU> Rmu<RMU>
where
    RMU: Deref<Target = RegisterBlock>,
{
    pub fn new(rmu: RMU) -> Self {
        Rmu {
            rmu,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
    }

    /// Every latched cause. More than one can be set, with
    /// [`ResetCause::MULTIRF`] marking that several resets happened.
    pub fn status(&self) -> ResetCause {
        self.rmu.rstf0.flags::<ResetCause>() - ResetCause::CLRF
    }

    /// True if every cause in `cause` is latched.
    pub fn is_set(&self, cause: ResetCause) -> bool {
        self.status().contains(cause)
    }

    /// Clears all causes and waits until the register reads back clear.
    pub fn clear(&mut self) -> Result<()> {
        self.rmu.rstf0.set(ResetCause::CLRF);
        let rstf0 = &self.rmu.rstf0;
        poll::wait_inclusive(self.timeout, || {
            (rstf0.flags::<ResetCause>() - ResetCause::CLRF).is_empty()
        })
    }

    pub fn free(self) -> RMU {
        self.rmu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pac::detached;

    #[test]
    fn status_reports_latched_causes() {
        let regs: RegisterBlock = detached();
        regs.rstf0
            .write_flags(ResetCause::SWDRF | ResetCause::MULTIRF | ResetCause::PORF);
        let rmu = Rmu::new(&regs);

        assert!(rmu.is_set(ResetCause::SWDRF));
        assert!(rmu.is_set(ResetCause::SWDRF | ResetCause::PORF));
        assert!(!rmu.is_set(ResetCause::PINRF));
        assert_eq!(
            rmu.status(),
            ResetCause::SWDRF | ResetCause::MULTIRF | ResetCause::PORF
        );
    }

    #[test]
    fn clear_times_out_if_flags_stick() {
        let regs: RegisterBlock = detached();
        regs.rstf0.write_flags(ResetCause::PINRF);
        let mut rmu = Rmu::new(&regs);
        rmu.set_timeout(3);

        assert_eq!(rmu.clear(), Err(Error::Timeout));
        assert!(regs.rstf0.is_set(ResetCause::CLRF));
    }

    #[test]
    fn clear_succeeds_once_flags_drop() {
        let regs: RegisterBlock = detached();
        let mut rmu = Rmu::new(&regs);

        assert_eq!(rmu.clear(), Ok(()));
    }
}
