// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Timer0
//!
//! Two independent 16-bit channels counting up to a compare value. Each
//! channel runs from PCLK1 (synchronous) or from one of the 32.768 kHz
//! oscillators (asynchronous).
//!
//! ```ignore
//! TMR0::enable(&mut cmu.fcg);
//! let mut timer = Timer0::new(dp.TMR0, clocks);
//! timer.configure(Channel::A, Config::default().divider(Divider::Div64).compare(999));
//! timer.start(Channel::A);
//!
//! let mut ticker = timer.count_down(Channel::B);
//! ticker.start(10.hz());
//! nb::block!(ticker.wait()).unwrap();
//! ```

use core::ops::Deref;

use embedded_hal::timer::{Cancel, CountDown, Periodic};
use void::Void;

use crate::cmu::Clocks;
use crate::error::{Error, Result};
use crate::pac::tmr0::{Bconr, RegisterBlock, Stflr};
use crate::time::Hertz;

/// Frequency of the LRC and XTAL32 oscillators
pub const SLOW_CLOCK: Hertz = Hertz(32_768);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

impl Channel {
    fn shift(self) -> u32 {
        match self {
            Channel::A => 0,
            Channel::B => 16,
        }
    }

    fn compare_flag(self) -> Stflr {
        match self {
            Channel::A => Stflr::CMFA,
            Channel::B => Stflr::CMFB,
        }
    }
}

/// Counting clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// PCLK1, synchronous
    Pclk1,
    /// Internal low-speed RC, asynchronous
    Lrc,
    /// External 32.768 kHz crystal, asynchronous
    Xtal32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Divider {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
    Div256 = 8,
    Div512 = 9,
    Div1024 = 10,
}

impl Divider {
    const ALL: [Divider; 11] = [
        Divider::Div1,
        Divider::Div2,
        Divider::Div4,
        Divider::Div8,
        Divider::Div16,
        Divider::Div32,
        Divider::Div64,
        Divider::Div128,
        Divider::Div256,
        Divider::Div512,
        Divider::Div1024,
    ];
}

/// Channel function
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Function {
    /// Compare match on the compare value
    Compare,
    /// Capture the counter into the compare register on an input event
    Capture,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub clock: ClockSource,
    pub divider: Divider,
    pub compare: u16,
    pub function: Function,
}

impl Config {
    pub fn clock(mut self, clock: ClockSource) -> Self {
        self.clock = clock;
        self
    }

    pub fn divider(mut self, divider: Divider) -> Self {
        self.divider = divider;
        self
    }

    pub fn compare(mut self, compare: u16) -> Self {
        self.compare = compare;
        self
    }

    pub fn function(mut self, function: Function) -> Self {
        self.function = function;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock: ClockSource::Pclk1,
            divider: Divider::Div1,
            compare: 0xFFFF,
            function: Function::Compare,
        }
    }
}

/// Chooses the smallest divider for which `clk / freq` ticks fit the 16-bit
/// compare register. Returns the divider and the compare value.
pub fn compare_for(clk: Hertz, freq: Hertz) -> Result<(Divider, u16)> {
    if freq.0 == 0 {
        return Err(Error::InvalidParameter);
    }
    let ticks = clk.0 / freq.0;
    if ticks == 0 {
        return Err(Error::InvalidParameter);
    }
    for divider in Divider::ALL {
        let divided = ticks >> (divider as u32);
        if divided == 0 {
            break;
        }
        if let Ok(compare) = cast::u16(divided - 1) {
            return Ok((divider, compare));
        }
    }
    Err(Error::InvalidParameter)
}

/// Both Timer0 channels
pub struct Timer0<TMR0> {
    tmr0: TMR0,
    pclk1: Hertz,
    clocks: [ClockSource; 2],
}

impl<TMR0> Timer0<TMR0>
where
    TMR0: Deref<Target = RegisterBlock>,
{
    /// Stops both channels. The function clock must already be enabled.
    pub fn new(tmr0: TMR0, clocks: Clocks) -> Self {
        tmr0.bconr.write(0);
        tmr0.stflr.write(0);
        Timer0 {
            tmr0,
            pclk1: clocks.pclk1(),
            clocks: [ClockSource::Pclk1; 2],
        }
    }

    /// Stops the channel and applies `config`, resetting its counter.
    pub fn configure(&mut self, channel: Channel, config: Config) {
        self.stop(channel);

        let mut bits = Bconr::empty();
        match config.clock {
            ClockSource::Pclk1 => {}
            ClockSource::Lrc => bits |= Bconr::SYNS,
            ClockSource::Xtal32 => bits |= Bconr::SYNS | Bconr::ASYNCLK,
        }
        bits.set(Bconr::CAPMD, config.function == Function::Capture);
        let ckdiv = (config.divider as u32) << Bconr::CKDIV.bits().trailing_zeros();

        let mask = (Bconr::CKDIV | Bconr::SYNS | Bconr::SYNCLK | Bconr::ASYNCLK | Bconr::CAPMD)
            .bits()
            << channel.shift();
        self.tmr0
            .bconr
            .modify(|r| (r & !mask) | ((bits.bits() | ckdiv) << channel.shift()));

        self.set_compare(channel, config.compare);
        self.set_counter(channel, 0);
        self.clocks[channel as usize] = config.clock;
    }

    pub fn start(&mut self, channel: Channel) {
        self.modify_bconr(channel, Bconr::CST, true);
    }

    pub fn stop(&mut self, channel: Channel) {
        self.modify_bconr(channel, Bconr::CST, false);
    }

    /// True while the channel is counting.
    pub fn is_running(&self, channel: Channel) -> bool {
        self.tmr0.bconr.read() & (Bconr::CST.bits() << channel.shift()) != 0
    }

    pub fn counter(&self, channel: Channel) -> u16 {
        self.counter_reg(channel).read() as u16
    }

    /// Writes the counter. Asynchronous channels take the value a few
    /// counting clocks later.
    pub fn set_counter(&mut self, channel: Channel, value: u16) {
        self.counter_reg(channel).write(u32::from(value));
    }

    pub fn compare(&self, channel: Channel) -> u16 {
        self.compare_reg(channel).read() as u16
    }

    pub fn set_compare(&mut self, channel: Channel, value: u16) {
        self.compare_reg(channel).write(u32::from(value));
    }

    /// True once the counter has matched the compare value.
    pub fn is_compare_match(&self, channel: Channel) -> bool {
        self.tmr0.stflr.is_set(channel.compare_flag())
    }

    pub fn clear_compare_match(&mut self, channel: Channel) {
        self.tmr0.stflr.clear(channel.compare_flag());
    }

    /// Enables the compare-match interrupt request of the channel.
    pub fn listen(&mut self, channel: Channel) {
        self.modify_bconr(channel, Bconr::INTEN, true);
    }

    pub fn unlisten(&mut self, channel: Channel) {
        self.modify_bconr(channel, Bconr::INTEN, false);
    }

    /// Counting clock of the channel before division
    pub fn clock(&self, channel: Channel) -> Hertz {
        match self.clocks[channel as usize] {
            ClockSource::Pclk1 => self.pclk1,
            ClockSource::Lrc | ClockSource::Xtal32 => SLOW_CLOCK,
        }
    }

    /// Turns one channel into an `embedded-hal` periodic count-down timer.
    pub fn count_down(self, channel: Channel) -> Counter<TMR0> {
        Counter {
            timer: self,
            channel,
        }
    }

    pub fn free(self) -> TMR0 {
        self.tmr0.bconr.write(0);
        self.tmr0
    }

    fn modify_bconr(&self, channel: Channel, bits: Bconr, on: bool) {
        let mask = bits.bits() << channel.shift();
        self.tmr0
            .bconr
            .modify(|r| if on { r | mask } else { r & !mask });
    }

    fn counter_reg(&self, channel: Channel) -> &crate::pac::Reg<u32> {
        match channel {
            Channel::A => &self.tmr0.cntar,
            Channel::B => &self.tmr0.cntbr,
        }
    }

    fn compare_reg(&self, channel: Channel) -> &crate::pac::Reg<u32> {
        match channel {
            Channel::A => &self.tmr0.cmpar,
            Channel::B => &self.tmr0.cmpbr,
        }
    }
}

/// A Timer0 channel counting down periods of a frequency
pub struct Counter<TMR0> {
    timer: Timer0<TMR0>,
    channel: Channel,
}

impl<TMR0> Counter<TMR0>
where
    TMR0: Deref<Target = RegisterBlock>,
{
    /// Stops the channel and gives the timer back.
    pub fn release(mut self) -> Timer0<TMR0> {
        self.timer.stop(self.channel);
        self.timer
    }
}

impl<TMR0> CountDown for Counter<TMR0>
where
    TMR0: Deref<Target = RegisterBlock>,
{
    type Time = Hertz;

    /// Frequencies outside the reachable range are clamped.
    fn start<T>(&mut self, count: T)
    where
        T: Into<Hertz>,
    {
        let channel = self.channel;
        let clk = self.timer.clock(channel);
        let (divider, compare) = compare_for(clk, count.into()).unwrap_or_else(|_| {
            warn!("timer0: frequency out of range");
            (Divider::Div1024, 0xFFFF)
        });

        let clock = self.timer.clocks[channel as usize];
        self.timer.configure(
            channel,
            Config::default()
                .clock(clock)
                .divider(divider)
                .compare(compare),
        );
        self.timer.clear_compare_match(channel);
        self.timer.start(channel);
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.timer.is_compare_match(self.channel) {
            self.timer.clear_compare_match(self.channel);
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<TMR0> Periodic for Counter<TMR0> where TMR0: Deref<Target = RegisterBlock> {}

impl<TMR0> Cancel for Counter<TMR0>
where
    TMR0: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn cancel(&mut self) -> Result<()> {
        if !self.timer.is_running(self.channel) {
            return Err(Error::Uninitialized);
        }
        self.timer.stop(self.channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::detached;

    const PCLK: Hertz = Hertz(32_000_000);

    #[test]
    fn compare_uses_the_smallest_divider() {
        assert_eq!(compare_for(PCLK, Hertz(1_000)), Ok((Divider::Div1, 31_999)));
        assert_eq!(compare_for(PCLK, Hertz(100)), Ok((Divider::Div8, 39_999)));
        assert_eq!(compare_for(SLOW_CLOCK, Hertz(1)), Ok((Divider::Div1, 32_767)));
    }

    #[test]
    fn unreachable_frequencies_are_rejected() {
        assert_eq!(compare_for(PCLK, Hertz(0)), Err(Error::InvalidParameter));
        assert_eq!(
            compare_for(PCLK, Hertz(64_000_000)),
            Err(Error::InvalidParameter)
        );
        assert!(compare_for(Hertz(1_000_000_000), Hertz(1)).is_err());
    }

    #[test]
    fn channel_b_lives_in_the_upper_half() {
        let regs: RegisterBlock = detached();
        let mut timer = Timer0::new(&regs, Clocks::uniform(PCLK));

        timer.configure(
            Channel::B,
            Config::default()
                .clock(ClockSource::Xtal32)
                .divider(Divider::Div4)
                .compare(500),
        );
        timer.start(Channel::B);
        timer.listen(Channel::B);

        assert_eq!(regs.bconr.read() & 0xFFFF, 0);
        let high = Bconr::from_bits_truncate(regs.bconr.read() >> 16);
        assert!(high.contains(Bconr::CST | Bconr::INTEN | Bconr::SYNS | Bconr::ASYNCLK));
        assert_eq!((high & Bconr::CKDIV).bits() >> 4, Divider::Div4 as u32);
        assert_eq!(regs.cmpbr.read(), 500);
        assert_eq!(timer.clock(Channel::B), SLOW_CLOCK);
        assert!(!timer.is_running(Channel::A));
    }

    #[test]
    fn count_down_waits_for_compare_match() {
        let regs: RegisterBlock = detached();
        let mut ticker = Timer0::new(&regs, Clocks::uniform(PCLK)).count_down(Channel::A);

        ticker.start(Hertz(1_000));
        assert_eq!(regs.cmpar.read(), 31_999);
        assert!(matches!(ticker.wait(), Err(nb::Error::WouldBlock)));

        regs.stflr.write_flags(Stflr::CMFA);
        assert!(ticker.wait().is_ok());
        assert!(!regs.stflr.is_set(Stflr::CMFA));

        assert_eq!(ticker.cancel(), Ok(()));
        assert_eq!(ticker.cancel(), Err(Error::Uninitialized));
    }
}
