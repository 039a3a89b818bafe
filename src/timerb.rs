// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # TimerB
//!
//! A 16-bit up/down counter with a period register and four
//! compare/capture channels that can drive PWM outputs.
//!
//! ```ignore
//! TMRB::enable(&mut cmu.fcg);
//! let mut timer = TimerB::new(dp.TMRB, Config::default().divider(Divider::Div8).period(999));
//! let mut pwm = timer.pwm(Channel::Ch1);
//! pwm.set_duty(250);
//! pwm.enable();
//! timer.start();
//! ```

use core::ops::Deref;

use embedded_hal::PwmPin;

use crate::pac::tmrb::{Bcstr, Cconr, Channels, Pconr, RegisterBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
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

/// Counting waveform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountMode {
    /// Count in one direction and reload at the period (or zero)
    Sawtooth,
    /// Count up to the period, then back down to zero
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub divider: Divider,
    pub mode: CountMode,
    pub direction: Direction,
    pub period: u16,
}

impl Config {
    pub fn divider(mut self, divider: Divider) -> Self {
        self.divider = divider;
        self
    }

    pub fn mode(mut self, mode: CountMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn period(mut self, period: u16) -> Self {
        self.period = period;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            divider: Divider::Div1,
            mode: CountMode::Sawtooth,
            direction: Direction::Up,
            period: 0xFFFF,
        }
    }
}

/// Compare/capture channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Ch1 = 0,
    Ch2 = 1,
    Ch3 = 2,
    Ch4 = 3,
}

impl Channel {
    fn bit(self) -> Channels {
        Channels::from_bits_truncate(1 << (self as u32))
    }
}

/// Counter events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Counting up past the period
    Overflow,
    /// Counting down past zero
    Underflow,
}

impl Event {
    fn flag(self) -> Bcstr {
        match self {
            Event::Overflow => Bcstr::OVFF,
            Event::Underflow => Bcstr::UDFF,
        }
    }

    fn enable(self) -> Bcstr {
        match self {
            Event::Overflow => Bcstr::ITENOVF,
            Event::Underflow => Bcstr::ITENUDF,
        }
    }
}

/// Output port level programmed in PCONR
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low = 0b00,
    High = 0b01,
    Hold = 0b10,
    Invert = 0b11,
}

pub struct TimerB<TMRB> {
    tmrb: TMRB,
}

impl<TMRB> TimerB<TMRB>
where
    TMRB: Deref<Target = RegisterBlock>,
{
    /// Stops the counter and applies `config`. The function clock must
    /// already be enabled.
    pub fn new(tmrb: TMRB, config: Config) -> Self {
        tmrb.bcstr.write(0);

        let mut bcstr = Bcstr::empty();
        bcstr.set(Bcstr::DIR, config.direction == Direction::Up);
        bcstr.set(Bcstr::MODE, config.mode == CountMode::Triangle);
        tmrb.bcstr.write_flags(bcstr);
        tmrb.bcstr.write_field(Bcstr::CKDIV, config.divider as u32);

        tmrb.perar.write(u32::from(config.period));
        tmrb.cnter.write(match config.direction {
            Direction::Up => 0,
            Direction::Down => u32::from(config.period),
        });
        tmrb.stflr.write(0);

        TimerB { tmrb }
    }

    pub fn start(&mut self) {
        self.tmrb.bcstr.set(Bcstr::START);
    }

    pub fn stop(&mut self) {
        self.tmrb.bcstr.clear(Bcstr::START);
    }

    pub fn is_running(&self) -> bool {
        self.tmrb.bcstr.is_set(Bcstr::START)
    }

    pub fn counter(&self) -> u16 {
        self.tmrb.cnter.read() as u16
    }

    pub fn set_counter(&mut self, value: u16) {
        self.tmrb.cnter.write(u32::from(value));
    }

    pub fn period(&self) -> u16 {
        self.tmrb.perar.read() as u16
    }

    pub fn set_period(&mut self, value: u16) {
        self.tmrb.perar.write(u32::from(value));
    }

    pub fn compare(&self, channel: Channel) -> u16 {
        self.tmrb.cmpar[channel as usize].read() as u16
    }

    pub fn set_compare(&mut self, channel: Channel, value: u16) {
        self.tmrb.cmpar[channel as usize].write(u32::from(value));
    }

    /// Stop counting at the next overflow or underflow.
    pub fn one_shot(&mut self, enable: bool) {
        self.tmrb.bcstr.set_to(Bcstr::OVSTP, enable);
    }

    pub fn is_pending(&self, event: Event) -> bool {
        self.tmrb.bcstr.is_set(event.flag())
    }

    pub fn clear_pending(&mut self, event: Event) {
        self.tmrb.bcstr.clear(event.flag());
    }

    pub fn listen(&mut self, event: Event) {
        self.tmrb.bcstr.set(event.enable());
    }

    pub fn unlisten(&mut self, event: Event) {
        self.tmrb.bcstr.clear(event.enable());
    }

    /// True once the counter has matched the channel's compare value.
    pub fn is_compare_match(&self, channel: Channel) -> bool {
        self.tmrb.stflr.is_set(channel.bit())
    }

    pub fn clear_compare_match(&mut self, channel: Channel) {
        self.tmrb.stflr.clear(channel.bit());
    }

    /// Enables the compare-match interrupt request of `channel`.
    pub fn listen_compare(&mut self, channel: Channel) {
        self.tmrb.iconr.set(channel.bit());
    }

    pub fn unlisten_compare(&mut self, channel: Channel) {
        self.tmrb.iconr.clear(channel.bit());
    }

    /// Puts `channel` in compare-output mode and hands out a PWM pin for it.
    ///
    /// In sawtooth up-counting mode the output is high from the start of a
    /// period until the compare match.
    pub fn pwm(&mut self, channel: Channel) -> PwmChannel<'_> {
        let tmrb: &RegisterBlock = &self.tmrb;
        tmrb.cconr[channel as usize].clear(Cconr::CAPMD);

        let pconr = &tmrb.pconr[channel as usize];
        pconr.clear(Pconr::OUTEN);
        pconr.write_field(Pconr::STAC, Level::High as u32);
        pconr.write_field(Pconr::STPC, Level::Low as u32);
        pconr.write_field(Pconr::CMPC, Level::Low as u32);
        pconr.write_field(Pconr::PERC, Level::High as u32);

        PwmChannel { tmrb, channel }
    }

    pub fn free(self) -> TMRB {
        self.tmrb.bcstr.clear(Bcstr::START);
        self.tmrb
    }
}

/// A compare channel driving its output pin
pub struct PwmChannel<'a> {
    tmrb: &'a RegisterBlock,
    channel: Channel,
}

impl PwmChannel<'_> {
    /// Overrides the levels produced on the start, stop, compare and period
    /// events.
    pub fn set_levels(&mut self, start: Level, stop: Level, compare: Level, period: Level) {
        let pconr = &self.tmrb.pconr[self.channel as usize];
        pconr.write_field(Pconr::STAC, start as u32);
        pconr.write_field(Pconr::STPC, stop as u32);
        pconr.write_field(Pconr::CMPC, compare as u32);
        pconr.write_field(Pconr::PERC, period as u32);
    }
}

impl PwmPin for PwmChannel<'_> {
    type Duty = u16;

    fn disable(&mut self) {
        self.tmrb.pconr[self.channel as usize].clear(Pconr::OUTEN);
    }

    fn enable(&mut self) {
        self.tmrb.pconr[self.channel as usize].set(Pconr::OUTEN);
    }

    fn get_duty(&self) -> u16 {
        self.tmrb.cmpar[self.channel as usize].read() as u16
    }

    fn get_max_duty(&self) -> u16 {
        self.tmrb.perar.read() as u16
    }

    fn set_duty(&mut self, duty: u16) {
        self.tmrb.cmpar[self.channel as usize].write(u32::from(duty));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::detached;

    #[test]
    fn base_config_is_programmed() {
        let regs: RegisterBlock = detached();
        let mut timer = TimerB::new(
            &regs,
            Config::default()
                .divider(Divider::Div16)
                .mode(CountMode::Triangle)
                .period(1_000),
        );

        assert!(regs.bcstr.is_set(Bcstr::DIR | Bcstr::MODE));
        assert_eq!(regs.bcstr.read_field(Bcstr::CKDIV), 4);
        assert_eq!(timer.period(), 1_000);
        assert_eq!(timer.counter(), 0);
        assert!(!timer.is_running());

        timer.start();
        assert!(timer.is_running());
    }

    #[test]
    fn down_counting_starts_at_the_period() {
        let regs: RegisterBlock = detached();
        let timer = TimerB::new(&regs, Config::default().direction(Direction::Down).period(99));

        assert!(!regs.bcstr.is_set(Bcstr::DIR));
        assert_eq!(timer.counter(), 99);
    }

    #[test]
    fn events_and_compare_flags() {
        let regs: RegisterBlock = detached();
        let mut timer = TimerB::new(&regs, Config::default());

        timer.listen(Event::Underflow);
        assert!(regs.bcstr.is_set(Bcstr::ITENUDF));

        regs.bcstr.set(Bcstr::OVFF);
        assert!(timer.is_pending(Event::Overflow));
        timer.clear_pending(Event::Overflow);
        assert!(!timer.is_pending(Event::Overflow));

        timer.listen_compare(Channel::Ch3);
        assert_eq!(regs.iconr.read(), 0b100);

        regs.stflr.write(0b1010);
        assert!(timer.is_compare_match(Channel::Ch2));
        assert!(!timer.is_compare_match(Channel::Ch1));
        timer.clear_compare_match(Channel::Ch4);
        assert_eq!(regs.stflr.read(), 0b0010);
    }

    #[test]
    fn pwm_duty_follows_the_compare_register() {
        let regs: RegisterBlock = detached();
        let mut timer = TimerB::new(&regs, Config::default().period(400));
        let mut pwm = timer.pwm(Channel::Ch2);

        assert_eq!(pwm.get_max_duty(), 400);
        pwm.set_duty(100);
        pwm.enable();

        assert_eq!(regs.cmpar[1].read(), 100);
        assert_eq!(regs.pconr[1].read_field(Pconr::STAC), Level::High as u32);
        assert_eq!(regs.pconr[1].read_field(Pconr::CMPC), Level::Low as u32);
        assert!(regs.pconr[1].is_set(Pconr::OUTEN));

        pwm.disable();
        assert!(!regs.pconr[1].is_set(Pconr::OUTEN));
        assert_eq!(timer.compare(Channel::Ch2), 100);
    }
}
