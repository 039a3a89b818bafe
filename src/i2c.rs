// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Inter-integrated circuit (I2C) master
//!
//! Transfers are byte-oriented and blocking: every step (start condition,
//! address, data byte, stop condition) writes a register and then polls a
//! status flag. Each poll is bounded by the iteration budget in
//! [`Config::timeout`](field@Config::timeout); the counter runs down to zero
//! inclusive, so a budget of `n` allows `n + 1` looks at the flag.
//!
//! A not-acknowledged address or data byte yields [`Error::Error`]. Once a
//! start condition has been generated, a stop condition is always attempted
//! before the error is returned.

use core::ops::Deref;

use embedded_hal::blocking::i2c::{Read, Write, WriteRead};

use crate::cmu::Clocks;
use crate::error::{Error, Result};
use crate::pac::i2c::{Ccr, Cr1, Fltr, RegisterBlock, Slr, Sr};
use crate::poll;
use crate::time::Hertz;

/// Default polling budget
pub const DEFAULT_TIMEOUT: u32 = 0x4000;

/// Divider from PCLK1 to the I2C reference clock
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
    Div128 = 7,
}

/// Digital noise filter width, in reference clock cycles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DigitalFilter {
    Cycles1 = 0,
    Cycles2 = 1,
    Cycles3 = 2,
    Cycles4 = 3,
}

/// Transfer direction, the R/W bit following the address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Transmit = 0,
    Receive = 1,
}

/// What the master answers after a received byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    Ack,
    Nack,
}

/// Own address used when the peripheral is addressed as a slave
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveAddress {
    SevenBit(u8),
    TenBit(u16),
}

/// One of the two own-address slots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressSlot {
    Slot0,
    Slot1,
}

/// I2C configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub clock_div: ClockDiv,
    pub baudrate: Hertz,
    pub digital_filter: Option<DigitalFilter>,
    pub analog_filter: bool,
    /// Polling budget of every flag wait
    pub timeout: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock_div: ClockDiv::Div8,
            baudrate: Hertz(100_000),
            digital_filter: None,
            analog_filter: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    pub fn clock_div(mut self, clock_div: ClockDiv) -> Self {
        self.clock_div = clock_div;
        self
    }

    pub fn baudrate(mut self, baudrate: impl Into<Hertz>) -> Self {
        self.baudrate = baudrate.into();
        self
    }

    pub fn digital_filter(mut self, filter: Option<DigitalFilter>) -> Self {
        self.digital_filter = filter;
        self
    }

    pub fn analog_filter(mut self, enable: bool) -> Self {
        self.analog_filter = enable;
        self
    }

    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Widest SCL low or high phase, in reference clock cycles.
const MAX_WIDTH: u32 = 0x1F;

/// SCL low and high widths for `config` with PCLK1 at `pclk`.
///
/// Each half period loses a fixed number of cycles to synchronisation (one
/// more when the reference clock is undivided) and to the digital filter.
fn scl_widths(pclk: Hertz, config: &Config) -> Result<(u32, u32)> {
    if config.baudrate.0 == 0 {
        return Err(Error::InvalidParameter);
    }
    let fref = pclk.0 >> (config.clock_div as u32);
    let width_total = fref / config.baudrate.0;

    let sync = if config.clock_div == ClockDiv::Div1 { 3 } else { 2 };
    let filter = config.digital_filter.map_or(0, |f| f as u32 + 1);
    let overhead = 2 * (sync + filter);

    if width_total < overhead + 2 {
        // faster than the reference clock allows
        return Err(Error::InvalidParameter);
    }
    let width = width_total - overhead;
    let low = width / 2;
    let high = width - low;
    if high > MAX_WIDTH {
        // slower than this divider allows
        return Err(Error::InvalidParameter);
    }
    Ok((low, high))
}

/// I2C master abstraction
pub struct I2c<I2C> {
    i2c: I2C,
    timeout: u32,
}

impl<I2C> I2c<I2C>
where
    I2C: Deref<Target = RegisterBlock>,
{
    /// Resets and configures the peripheral, then enables it.
    ///
    /// The function clock must already be enabled. Returns
    /// [`Error::InvalidParameter`] if the requested baud rate cannot be
    /// produced from PCLK1 with the chosen divider.
    pub fn new(i2c: I2C, config: Config, clocks: Clocks) -> Result<Self> {
        let (low, high) = scl_widths(clocks.pclk1(), &config)?;

        i2c.cr1.clear(Cr1::PE);
        i2c.cr1.set(Cr1::SWRST);
        i2c.cr1.set(Cr1::PE);

        i2c.ccr.write_field(Ccr::FREQ, config.clock_div as u32);
        i2c.ccr.write_field(Ccr::SLOWW, low);
        i2c.ccr.write_field(Ccr::SHIGHW, high);

        match config.digital_filter {
            Some(filter) => {
                i2c.fltr.write_field(Fltr::DNF, filter as u32);
                i2c.fltr.set(Fltr::DNFEN);
            }
            None => i2c.fltr.clear(Fltr::DNFEN),
        }
        i2c.fltr.set_to(Fltr::ANFEN, config.analog_filter);

        i2c.cr1.clear(Cr1::SWRST);

        Ok(I2c {
            i2c,
            timeout: config.timeout,
        })
    }

    /// Changes the polling budget.
    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
    }

    /// Disables the peripheral and releases the register block.
    pub fn free(self) -> I2C {
        self.i2c.cr1.clear(Cr1::PE);
        self.i2c
    }

    fn wait(&self, flag: Sr, set: bool) -> Result<()> {
        let sr = &self.i2c.sr;
        poll::wait_inclusive(self.timeout, || sr.is_set(flag) == set)
    }

    /// Current status flags.
    pub fn flags(&self) -> Sr {
        self.i2c.sr.flags()
    }

    /// Clears status flags.
    pub fn clear_flags(&mut self, flags: Sr) {
        self.i2c.clr.write_flags(flags);
    }

    /// Enables the interrupts matching `flags`.
    pub fn listen(&mut self, flags: Sr) {
        self.i2c.cr2.set(flags);
    }

    /// Disables the interrupts matching `flags`.
    pub fn unlisten(&mut self, flags: Sr) {
        self.i2c.cr2.clear(flags);
    }

    /// Selects the answer to the next received byte.
    pub fn ack_config(&mut self, ack: Ack) {
        self.i2c.cr1.set_to(Cr1::ACK, ack == Ack::Nack);
    }

    /// Programs or disables one own-address slot.
    pub fn slave_address_config(&mut self, slot: AddressSlot, address: Option<SlaveAddress>) {
        let slr = match slot {
            AddressSlot::Slot0 => &self.i2c.slr0,
            AddressSlot::Slot1 => &self.i2c.slr1,
        };
        match address {
            None => slr.clear(Slr::SLADDREN),
            Some(SlaveAddress::SevenBit(addr)) => {
                slr.clear(Slr::ADDRMOD);
                slr.write_field(Slr::SLADDR, u32::from(addr) << 1);
                slr.set(Slr::SLADDREN);
            }
            Some(SlaveAddress::TenBit(addr)) => {
                slr.set(Slr::ADDRMOD);
                slr.write_field(Slr::SLADDR, u32::from(addr));
                slr.set(Slr::SLADDREN);
            }
        }
    }

    /// Generates a start condition once the bus is free.
    pub fn start(&mut self) -> Result<()> {
        self.wait(Sr::BUSY, false)?;
        self.i2c.cr1.set(Cr1::START);
        self.wait(Sr::STARTF, true)
    }

    /// Generates a repeated start condition.
    pub fn restart(&mut self) -> Result<()> {
        self.i2c.clr.write_flags(Sr::STARTF);
        self.i2c.cr1.set(Cr1::RESTART);
        self.wait(Sr::STARTF, true)
    }

    /// Generates a stop condition and waits for it to complete.
    pub fn stop(&mut self) -> Result<()> {
        self.i2c.clr.write_flags(Sr::STOPF);
        self.i2c.cr1.set(Cr1::STOP);
        self.wait(Sr::STOPF, true)
    }

    fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.wait(Sr::TEMPTYF, true)?;
        self.i2c.dtr.write(byte);
        self.wait(Sr::TENDF, true)?;
        if self.i2c.sr.is_set(Sr::ACKRF) {
            warn!("i2c: byte not acknowledged");
            return Err(Error::Error);
        }
        Ok(())
    }

    /// Sends a 7-bit address followed by the direction bit.
    pub fn send_address(&mut self, address: u8, direction: Direction) -> Result<()> {
        self.send_byte((address << 1) | direction as u8)
    }

    /// Sends `data`, stopping at the first byte that is not acknowledged.
    pub fn send_data(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.send_byte(byte)?;
        }
        Ok(())
    }

    /// Receives `buffer.len()` bytes, answering the last one with NACK.
    pub fn receive_data(&mut self, buffer: &mut [u8]) -> Result<()> {
        let last = buffer.len().saturating_sub(1);
        let mut result = Ok(());
        for (i, byte) in buffer.iter_mut().enumerate() {
            if let Err(e) = self.wait(Sr::RFULLF, true) {
                result = Err(e);
                break;
            }
            if i == last {
                self.ack_config(Ack::Nack);
            }
            *byte = self.i2c.drr.read();
        }
        self.ack_config(Ack::Ack);
        result
    }

    /// Runs `transfer` after a start condition and always finishes with a
    /// stop condition. The first error wins.
    fn framed(&mut self, transfer: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.start()?;
        let result = transfer(self);
        let stop = self.stop();
        result.and(stop)
    }

    /// Start, address (write), `data`, stop.
    pub fn master_transmit(&mut self, address: u8, data: &[u8]) -> Result<()> {
        self.framed(|i2c| {
            i2c.send_address(address, Direction::Transmit)?;
            i2c.send_data(data)
        })
    }

    /// Start, address (read), `buffer.len()` bytes, stop.
    pub fn master_receive(&mut self, address: u8, buffer: &mut [u8]) -> Result<()> {
        self.framed(|i2c| {
            i2c.send_address(address, Direction::Receive)?;
            i2c.receive_data(buffer)
        })
    }

    /// Start, address (write), `bytes`, repeated start, address (read),
    /// `buffer.len()` bytes, stop.
    pub fn master_write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<()> {
        self.framed(|i2c| {
            i2c.send_address(address, Direction::Transmit)?;
            i2c.send_data(bytes)?;
            i2c.restart()?;
            i2c.send_address(address, Direction::Receive)?;
            i2c.receive_data(buffer)
        })
    }
}

impl<I2C> Write for I2c<I2C>
where
    I2C: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<()> {
        self.master_transmit(address, bytes)
    }
}

impl<I2C> Read for I2c<I2C>
where
    I2C: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<()> {
        self.master_receive(address, buffer)
    }
}

impl<I2C> WriteRead for I2c<I2C>
where
    I2C: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<()> {
        self.master_write_read(address, bytes, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::detached;

    const PCLK: Hertz = Hertz(32_000_000);

    fn idle_bus() -> Sr {
        Sr::STARTF | Sr::TEMPTYF | Sr::TENDF | Sr::RFULLF | Sr::STOPF
    }

    fn i2c(regs: &RegisterBlock) -> I2c<&RegisterBlock> {
        I2c::new(regs, Config::default().timeout(8), Clocks::uniform(PCLK)).unwrap()
    }

    #[test]
    fn standard_mode_timing() {
        let regs: RegisterBlock = detached();
        i2c(&regs);
        // 32 MHz / 8 = 4 MHz reference, 40 cycles per bit, 4 lost to sync
        assert_eq!(regs.ccr.read_field(Ccr::FREQ), 3);
        assert_eq!(regs.ccr.read_field(Ccr::SLOWW), 18);
        assert_eq!(regs.ccr.read_field(Ccr::SHIGHW), 18);
        assert!(regs.cr1.is_set(Cr1::PE));
        assert!(!regs.cr1.is_set(Cr1::SWRST));
        assert!(regs.fltr.is_set(Fltr::ANFEN));
    }

    #[test]
    fn filter_cycles_shorten_the_phases() {
        let config = Config::default().digital_filter(Some(DigitalFilter::Cycles2));
        // 40 - 2 * (2 + 2)
        assert_eq!(scl_widths(PCLK, &config), Ok((16, 16)));
    }

    #[test]
    fn unreachable_rates_are_rejected() {
        let too_slow = Config::default().clock_div(ClockDiv::Div1);
        assert_eq!(scl_widths(PCLK, &too_slow), Err(Error::InvalidParameter));

        let too_fast = Config::default().baudrate(Hertz(1_000_000));
        assert_eq!(scl_widths(PCLK, &too_fast), Err(Error::InvalidParameter));

        let zero = Config::default().baudrate(Hertz(0));
        assert_eq!(scl_widths(PCLK, &zero), Err(Error::InvalidParameter));
    }

    #[test]
    fn transmit_sends_address_then_data_then_stops() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);
        regs.sr.write_flags(idle_bus());

        bus.master_transmit(0x50, &[0x10, 0xAB]).unwrap();

        assert_eq!(regs.dtr.read(), 0xAB);
        assert!(regs.cr1.is_set(Cr1::START | Cr1::STOP));
    }

    #[test]
    fn address_byte_carries_direction() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);
        regs.sr.write_flags(idle_bus());

        bus.send_address(0x50, Direction::Receive).unwrap();
        assert_eq!(regs.dtr.read(), 0xA1);
        bus.send_address(0x50, Direction::Transmit).unwrap();
        assert_eq!(regs.dtr.read(), 0xA0);
    }

    #[test]
    fn nack_aborts_but_still_stops() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);
        regs.sr.write_flags(idle_bus() | Sr::ACKRF);

        assert_eq!(bus.master_transmit(0x50, &[1, 2, 3]), Err(Error::Error));
        // only the address went out
        assert_eq!(regs.dtr.read(), 0xA0);
        assert!(regs.cr1.is_set(Cr1::STOP));
    }

    #[test]
    fn busy_bus_times_out_before_start() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);
        regs.sr.write_flags(idle_bus() | Sr::BUSY);

        assert_eq!(bus.master_transmit(0x50, &[1]), Err(Error::Timeout));
        assert!(!regs.cr1.is_set(Cr1::START));
        assert!(!regs.cr1.is_set(Cr1::STOP));
    }

    #[test]
    fn missing_start_flag_times_out() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);

        assert_eq!(bus.start(), Err(Error::Timeout));
    }

    #[test]
    fn receive_reads_every_byte_and_restores_ack() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);
        regs.sr.write_flags(idle_bus());
        regs.drr.write(0x5A);

        let mut buf = [0u8; 4];
        bus.master_write_read(0x50, &[0x00], &mut buf).unwrap();

        assert_eq!(buf, [0x5A; 4]);
        assert!(regs.cr1.is_set(Cr1::RESTART));
        assert!(!regs.cr1.is_set(Cr1::ACK));
    }

    #[test]
    fn receive_stops_at_missing_data() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);
        regs.sr.write_flags(Sr::TEMPTYF);
        regs.drr.write(0x77);

        let mut buf = [0u8; 2];
        assert_eq!(bus.receive_data(&mut buf), Err(Error::Timeout));
        assert_eq!(buf, [0, 0]);
        assert!(!regs.cr1.is_set(Cr1::ACK));
    }

    #[test]
    fn seven_bit_slave_address_is_left_aligned() {
        let regs: RegisterBlock = detached();
        let mut bus = i2c(&regs);

        bus.slave_address_config(AddressSlot::Slot1, Some(SlaveAddress::SevenBit(0x3C)));
        assert_eq!(regs.slr1.read_field(Slr::SLADDR), 0x78);
        assert!(regs.slr1.is_set(Slr::SLADDREN));
        assert!(!regs.slr1.is_set(Slr::ADDRMOD));

        bus.slave_address_config(AddressSlot::Slot1, None);
        assert!(!regs.slr1.is_set(Slr::SLADDREN));
    }
}
