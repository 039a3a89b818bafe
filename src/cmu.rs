// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Clock management and function clock gates
//!
//! The system clock source is selected by the ICG configuration read at
//! reset. This module records its frequency, programs the bus dividers and
//! opens or closes the per-peripheral function clock gates.
//!
//! ```ignore
//! let mut cmu = dp.CMU.constrain(dp.PWC);
//! let clocks = cmu.cfgr.pclk1_div(ClockDiv::Div2).freeze();
//! I2C::enable(&mut cmu.fcg);
//! ```

use crate::pac::cmu::Scfgr;
use crate::pac::pwc::{Fcg0, Fcg0pc, Fcg1, FCG0PC_KEY};
use crate::pac::{CMU, CRC, FCM, I2C, PWC, SPI, TMR0, TMRB, USART1, USART2, USART3, USART4};
use crate::time::Hertz;

/// Frequency of the internal high-speed RC oscillator, the clock source
/// after reset.
pub const HRC: Hertz = Hertz(32_000_000);

/// Extension trait that constrains the `CMU` peripheral
pub trait CmuExt {
    /// Constrains the `CMU` peripheral so it plays nicely with the other abstractions
    fn constrain(self, pwc: PWC) -> Cmu;
}

impl CmuExt for CMU {
    fn constrain(self, pwc: PWC) -> Cmu {
        Cmu {
            fcg: Fcg { pwc },
            cfgr: Cfgr {
                cmu: self,
                sysclk: HRC,
                hclk_div: ClockDiv::Div1,
                pclk1_div: ClockDiv::Div1,
                pclk4_div: ClockDiv::Div1,
            },
        }
    }
}

/// Constrained CMU peripheral
pub struct Cmu {
    /// Function clock gates
    pub fcg: Fcg,
    /// Clock configuration
    pub cfgr: Cfgr,
}

/// Function clock gates
pub struct Fcg {
    pwc: PWC,
}

impl Fcg {
    fn fcg0_modify(&mut self, f: impl FnOnce(&Self)) {
        self.pwc
            .fcg0pc
            .write((FCG0PC_KEY << 16) | Fcg0pc::PRT0.bits());
        f(self);
        self.pwc.fcg0pc.write(FCG0PC_KEY << 16);
    }
}

/// Peripherals whose function clock can be gated
pub trait Enable {
    /// Opens the function clock gate
    fn enable(fcg: &mut Fcg);

    /// Closes the function clock gate
    fn disable(fcg: &mut Fcg);

    /// True if the function clock is running
    fn is_enabled(fcg: &Fcg) -> bool;
}

macro_rules! fcg1 {
    ($($PER:ident: $bit:ident,)+) => {
        $(
            impl Enable for $PER {
                #[inline(always)]
                fn enable(fcg: &mut Fcg) {
                    fcg.pwc.fcg1.clear(Fcg1::$bit);
                }

                #[inline(always)]
                fn disable(fcg: &mut Fcg) {
                    fcg.pwc.fcg1.set(Fcg1::$bit);
                }

                #[inline(always)]
                fn is_enabled(fcg: &Fcg) -> bool {
                    !fcg.pwc.fcg1.is_set(Fcg1::$bit)
                }
            }
        )+
    };
}

fcg1! {
    TMR0: TMR0,
    TMRB: TMRB,
    FCM: FCM,
    I2C: I2C,
    SPI: SPI,
    USART1: USART1,
    USART2: USART2,
    USART3: USART3,
    USART4: USART4,
}

impl Enable for CRC {
    fn enable(fcg: &mut Fcg) {
        fcg.fcg0_modify(|fcg| fcg.pwc.fcg0.clear(Fcg0::CRC));
    }

    fn disable(fcg: &mut Fcg) {
        fcg.fcg0_modify(|fcg| fcg.pwc.fcg0.set(Fcg0::CRC));
    }

    fn is_enabled(fcg: &Fcg) -> bool {
        !fcg.pwc.fcg0.is_set(Fcg0::CRC)
    }
}

/// Bus clock divider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDiv {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
}

impl ClockDiv {
    /// Applies the divider to `clk`.
    pub fn divide(self, clk: Hertz) -> Hertz {
        Hertz(clk.0 >> (self as u32))
    }
}

/// Clock configuration
pub struct Cfgr {
    cmu: CMU,
    sysclk: Hertz,
    hclk_div: ClockDiv,
    pclk1_div: ClockDiv,
    pclk4_div: ClockDiv,
}

impl Cfgr {
    /// Frequency of the system clock source selected at reset. Defaults to
    /// [`HRC`].
    pub fn sysclk<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.sysclk = freq.into();
        self
    }

    /// Divider from the system clock to HCLK (core and AHB)
    pub fn hclk_div(mut self, div: ClockDiv) -> Self {
        self.hclk_div = div;
        self
    }

    /// Divider from the system clock to PCLK1 (communication peripherals
    /// and timers)
    pub fn pclk1_div(mut self, div: ClockDiv) -> Self {
        self.pclk1_div = div;
        self
    }

    /// Divider from the system clock to PCLK4 (system peripherals)
    pub fn pclk4_div(mut self, div: ClockDiv) -> Self {
        self.pclk4_div = div;
        self
    }

    /// Writes the dividers and freezes the resulting frequencies.
    pub fn freeze(self) -> Clocks {
        let scfgr = &self.cmu.scfgr;
        scfgr.write_field(Scfgr::HCLKS, self.hclk_div as u32);
        scfgr.write_field(Scfgr::PCLK1S, self.pclk1_div as u32);
        scfgr.write_field(Scfgr::PCLK4S, self.pclk4_div as u32);

        Clocks {
            sysclk: self.sysclk,
            hclk: self.hclk_div.divide(self.sysclk),
            pclk1: self.pclk1_div.divide(self.sysclk),
            pclk4: self.pclk4_div.divide(self.sysclk),
        }
    }
}

/// Frozen clock frequencies
///
/// The existence of this value indicates that the clock configuration can no longer be changed
#[derive(Clone, Copy, Debug)]
pub struct Clocks {
    pub(crate) sysclk: Hertz,
    pub(crate) hclk: Hertz,
    pub(crate) pclk1: Hertz,
    pub(crate) pclk4: Hertz,
}

impl Clocks {
    /// Returns the system (core) frequency
    pub fn sysclk(&self) -> Hertz {
        self.sysclk
    }

    /// Returns the frequency of the AHB
    pub fn hclk(&self) -> Hertz {
        self.hclk
    }

    /// Returns the frequency of PCLK1
    pub fn pclk1(&self) -> Hertz {
        self.pclk1
    }

    /// Returns the frequency of PCLK4
    pub fn pclk4(&self) -> Hertz {
        self.pclk4
    }
}

#[cfg(test)]
impl Clocks {
    /// Clocks with every bus at `freq`.
    pub(crate) fn uniform(freq: Hertz) -> Self {
        Clocks {
            sysclk: freq,
            hclk: freq,
            pclk1: freq,
            pclk4: freq,
        }
    }
}
