//! Bounded busy-waiting on hardware status
//!
//! Budgets are iteration counts, not time: one iteration is one evaluation of
//! the status condition. Two boundaries are in use and drivers keep the one
//! their hardware routine uses.
//!
//! | Helper             | Evaluations before `Timeout` | Used by                          |
//! |--------------------|------------------------------|----------------------------------|
//! | [`wait`]           | `budget`                     | SPI, USART, FCM, components      |
//! | [`wait_inclusive`] | `budget + 1`                 | I2C, SWDT and RMU flag clearing  |

use crate::error::{Error, Result};

/// Evaluates `ready` until it returns `true`, at most `budget` times.
///
/// A budget of zero times out without evaluating the condition.
#[inline]
pub fn wait(budget: u32, mut ready: impl FnMut() -> bool) -> Result<()> {
    for _ in 0..budget {
        if ready() {
            return Ok(());
        }
    }
    Err(Error::Timeout)
}

/// Like [`wait`], but the budget value itself is a valid last attempt: the
/// counter runs down to zero inclusive, so `ready` is evaluated up to
/// `budget + 1` times.
#[inline]
pub fn wait_inclusive(budget: u32, mut ready: impl FnMut() -> bool) -> Result<()> {
    let mut remaining = budget;
    loop {
        if ready() {
            return Ok(());
        }
        if remaining == 0 {
            return Err(Error::Timeout);
        }
        remaining -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(calls: &mut u32) -> impl FnMut() -> bool + '_ {
        move || {
            *calls += 1;
            false
        }
    }

    #[test]
    fn wait_times_out_after_exactly_budget_evaluations() {
        let mut calls = 0;
        assert_eq!(wait(1000, never(&mut calls)), Err(Error::Timeout));
        assert_eq!(calls, 1000);
    }

    #[test]
    fn wait_with_zero_budget_never_evaluates() {
        let mut calls = 0;
        assert_eq!(wait(0, never(&mut calls)), Err(Error::Timeout));
        assert_eq!(calls, 0);
    }

    #[test]
    fn wait_returns_as_soon_as_ready() {
        let mut calls = 0;
        let result = wait(10, || {
            calls += 1;
            calls == 3
        });
        assert_eq!(result, Ok(()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn wait_succeeds_on_last_allowed_evaluation() {
        let mut calls = 0;
        let result = wait(5, || {
            calls += 1;
            calls == 5
        });
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn inclusive_wait_allows_one_more_evaluation() {
        let mut calls = 0;
        assert_eq!(wait_inclusive(1000, never(&mut calls)), Err(Error::Timeout));
        assert_eq!(calls, 1001);

        let mut calls = 0;
        assert_eq!(wait_inclusive(0, never(&mut calls)), Err(Error::Timeout));
        assert_eq!(calls, 1);
    }
}
