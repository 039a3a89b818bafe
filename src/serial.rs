// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Serial Communication (USART)
//!
//! Asynchronous (UART) mode of the four USART channels. The blocking
//! [`Serial::transmit`] and [`Serial::receive`] bound every flag wait by
//! [`Config::timeout`](field@Config::timeout) iterations; the non-blocking
//! `embedded-hal` traits report `WouldBlock` instead.
//!
//! ```ignore
//! USART1::enable(&mut cmu.fcg);
//! let mut serial = Serial::new(dp.USART1, Config::default().baudrate(115_200.bps()), clocks)?;
//! serial.transmit(b"hello")?;
//! let (mut tx, mut rx) = serial.split();
//! ```

use core::fmt;
use core::ops::Deref;

use embedded_hal::blocking;
use embedded_hal::serial;

use crate::cmu::Clocks;
use crate::error::{Error, Result};
use crate::pac::usart::{Brr, Cr1, Cr2, Pr, RegisterBlock, Sr};
use crate::poll;
use crate::time::{Bps, Hertz, U32Ext};

/// Default polling budget
pub const DEFAULT_TIMEOUT: u32 = 0x8000;

/// Interrupt event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// New data has been received
    Rxne,
    /// New data can be sent
    Txe,
    /// The last frame has left the shift register
    Tc,
    /// The receive line stayed idle after a frame
    RxTimeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordLength {
    DataBits8,
    DataBits9,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    ParityNone,
    ParityEven,
    ParityOdd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[doc = "1 stop bit"]
    STOP1,
    #[doc = "2 stop bits"]
    STOP2,
}

/// Samples per bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    Over16,
    Over8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub baudrate: Bps,
    pub wordlength: WordLength,
    pub parity: Parity,
    pub stopbits: StopBits,
    pub oversampling: Oversampling,
    /// Allow the fractional divider to trim the baud rate
    pub fractional_baud: bool,
    pub noise_filter: bool,
    /// Polling budget of every flag wait
    pub timeout: u32,
}

impl Config {
    pub fn baudrate(mut self, baudrate: Bps) -> Self {
        self.baudrate = baudrate;
        self
    }

    pub fn parity_none(mut self) -> Self {
        self.parity = Parity::ParityNone;
        self
    }

    pub fn parity_even(mut self) -> Self {
        self.parity = Parity::ParityEven;
        self
    }

    pub fn parity_odd(mut self) -> Self {
        self.parity = Parity::ParityOdd;
        self
    }

    pub fn wordlength_8(mut self) -> Self {
        self.wordlength = WordLength::DataBits8;
        self
    }

    pub fn wordlength_9(mut self) -> Self {
        self.wordlength = WordLength::DataBits9;
        self
    }

    pub fn stopbits(mut self, stopbits: StopBits) -> Self {
        self.stopbits = stopbits;
        self
    }

    pub fn oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    pub fn fractional_baud(mut self, enable: bool) -> Self {
        self.fractional_baud = enable;
        self
    }

    pub fn noise_filter(mut self, enable: bool) -> Self {
        self.noise_filter = enable;
        self
    }

    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            baudrate: 115_200_u32.bps(),
            wordlength: WordLength::DataBits8,
            parity: Parity::ParityNone,
            stopbits: StopBits::STOP1,
            oversampling: Oversampling::Over16,
            fractional_baud: true,
            noise_filter: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Register values producing a baud rate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BaudRegisters {
    prescaler: u32,
    integer: u32,
    fraction: Option<u32>,
}

/// Finds the smallest prescaler whose integer divider fits, then the
/// fractional trim if allowed.
///
/// `rate = pclk / 4^prescaler / (8 * (2 - over8) * (integer + 1))`, and with
/// the fraction enabled `rate * (128 + fraction) / 256`.
fn baud_registers(
    pclk: Hertz,
    baudrate: Bps,
    oversampling: Oversampling,
    fractional: bool,
) -> Result<BaudRegisters> {
    if baudrate.0 == 0 {
        return Err(Error::InvalidParameter);
    }
    let samples: u64 = match oversampling {
        Oversampling::Over16 => 16,
        Oversampling::Over8 => 8,
    };
    let baud = u64::from(baudrate.0);

    for prescaler in 0..4u32 {
        let clk = u64::from(pclk.0) >> (2 * prescaler);
        let ratio = clk / (samples * baud);
        if ratio == 0 {
            return Err(Error::InvalidParameter);
        }
        if ratio > 256 {
            continue;
        }
        let integer = ratio - 1;

        let fraction = if fractional {
            let scaled = 256 * baud * samples * ratio;
            let trim = (scaled + clk / 2) / clk;
            trim.checked_sub(128).filter(|&f| f < 128)
        } else {
            None
        };

        return Ok(BaudRegisters {
            prescaler,
            integer: cast::u32(integer).map_err(|_| Error::InvalidParameter)?,
            fraction: fraction.map(|f| f as u32),
        });
    }
    Err(Error::InvalidParameter)
}

/// Serial abstraction
pub struct Serial<USART> {
    usart: USART,
    timeout: u32,
}

/// Serial transmitter
pub struct Tx<'a> {
    usart: &'a RegisterBlock,
    timeout: u32,
}

/// Serial receiver
pub struct Rx<'a> {
    usart: &'a RegisterBlock,
    timeout: u32,
}

impl<USART> Serial<USART>
where
    USART: Deref<Target = RegisterBlock>,
{
    /// Configures the channel for asynchronous mode and enables the
    /// transmitter and receiver.
    ///
    /// The function clock must already be enabled. Returns
    /// [`Error::InvalidParameter`] if the baud rate cannot be produced from
    /// PCLK1.
    pub fn new(usart: USART, config: Config, clocks: Clocks) -> Result<Self> {
        let baud = baud_registers(
            clocks.pclk1(),
            config.baudrate,
            config.oversampling,
            config.fractional_baud,
        )?;

        usart.cr1.write(0);
        usart.cr2.write(0);
        usart.cr3.write(0);

        let mut cr1 = Cr1::SBS;
        cr1.set(Cr1::OVER8, config.oversampling == Oversampling::Over8);
        cr1.set(Cr1::M, config.wordlength == WordLength::DataBits9);
        cr1.set(Cr1::PCE, config.parity != Parity::ParityNone);
        cr1.set(Cr1::PS, config.parity == Parity::ParityOdd);
        cr1.set(Cr1::NFE, config.noise_filter);
        cr1.set(Cr1::FBME, baud.fraction.is_some());
        usart.cr1.write_flags(cr1);

        usart.cr2.set_to(Cr2::STOP, config.stopbits == StopBits::STOP2);

        usart.pr.write_field(Pr::PSC, baud.prescaler);
        usart.brr.write_field(Brr::DIV_INTEGER, baud.integer);
        usart.brr.write_field(Brr::DIV_FRACTION, baud.fraction.unwrap_or(0));

        usart.cr1.set(Cr1::CPE | Cr1::CFE | Cr1::CORE | Cr1::CRTOF);
        usart.cr1.set(Cr1::TE | Cr1::RE);

        Ok(Serial {
            usart,
            timeout: config.timeout,
        })
    }

    /// Changes the polling budget.
    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
    }

    /// Current status flags.
    pub fn flags(&self) -> Sr {
        self.usart.sr.flags()
    }

    /// Clears the receive error and receive timeout flags in `flags`.
    pub fn clear_flags(&mut self, flags: Sr) {
        clear_flags(&self.usart, flags)
    }

    /// Starts listening for an interrupt event
    pub fn listen(&mut self, event: Event) {
        self.usart.cr1.set(event_bit(event));
    }

    /// Stops listening for an interrupt event
    pub fn unlisten(&mut self, event: Event) {
        self.usart.cr1.clear(event_bit(event));
    }

    /// Sends `data`, then waits for the last frame to leave the shift register.
    pub fn transmit(&mut self, data: &[u8]) -> Result<()> {
        transmit(&self.usart, self.timeout, data)
    }

    /// Fills `buffer`. A parity, framing or overrun error aborts with
    /// [`Error::Error`] after clearing the error flags.
    pub fn receive(&mut self, buffer: &mut [u8]) -> Result<()> {
        receive(&self.usart, self.timeout, buffer)
    }

    /// Splits the channel into a transmitter and a receiver
    pub fn split(&mut self) -> (Tx<'_>, Rx<'_>) {
        (
            Tx {
                usart: &*self.usart,
                timeout: self.timeout,
            },
            Rx {
                usart: &*self.usart,
                timeout: self.timeout,
            },
        )
    }

    /// Disables the channel and releases the register block.
    pub fn free(self) -> USART {
        self.usart.cr1.clear(Cr1::TE | Cr1::RE);
        self.usart
    }
}

fn event_bit(event: Event) -> Cr1 {
    match event {
        Event::Rxne => Cr1::RIE,
        Event::Txe => Cr1::TXEIE,
        Event::Tc => Cr1::TCIE,
        Event::RxTimeout => Cr1::RTOIE,
    }
}

const RX_ERRORS: Sr = Sr::PE.union(Sr::FE).union(Sr::ORE);

fn clear_flags(usart: &RegisterBlock, flags: Sr) {
    let mut clear = Cr1::empty();
    clear.set(Cr1::CPE, flags.contains(Sr::PE));
    clear.set(Cr1::CFE, flags.contains(Sr::FE));
    clear.set(Cr1::CORE, flags.contains(Sr::ORE));
    clear.set(Cr1::CRTOF, flags.contains(Sr::RTOF));
    usart.cr1.set(clear);
}

fn write_byte(usart: &RegisterBlock, byte: u8) -> nb::Result<(), Error> {
    if usart.sr.is_set(Sr::TXE) {
        usart.tdr.write(u16::from(byte));
        Ok(())
    } else {
        Err(nb::Error::WouldBlock)
    }
}

fn read_byte(usart: &RegisterBlock) -> nb::Result<u8, Error> {
    let sr: Sr = usart.sr.flags();
    if sr.intersects(RX_ERRORS) {
        clear_flags(usart, sr & RX_ERRORS);
        warn!("serial: receive error");
        Err(nb::Error::Other(Error::Error))
    } else if sr.contains(Sr::RXNE) {
        Ok(usart.rdr.read() as u8)
    } else {
        Err(nb::Error::WouldBlock)
    }
}

fn flush(usart: &RegisterBlock) -> nb::Result<(), Error> {
    if usart.sr.is_set(Sr::TC) {
        Ok(())
    } else {
        Err(nb::Error::WouldBlock)
    }
}

/// Retries `op` while it would block, at most `budget` times.
fn bounded<T>(budget: u32, mut op: impl FnMut() -> nb::Result<T, Error>) -> Result<T> {
    let mut outcome = Err(Error::Timeout);
    poll::wait(budget, || match op() {
        Err(nb::Error::WouldBlock) => false,
        Err(nb::Error::Other(e)) => {
            outcome = Err(e);
            true
        }
        Ok(value) => {
            outcome = Ok(value);
            true
        }
    })?;
    outcome
}

fn transmit(usart: &RegisterBlock, timeout: u32, data: &[u8]) -> Result<()> {
    for &byte in data {
        bounded(timeout, || write_byte(usart, byte))?;
    }
    bounded(timeout, || flush(usart))
}

fn receive(usart: &RegisterBlock, timeout: u32, buffer: &mut [u8]) -> Result<()> {
    for byte in buffer.iter_mut() {
        *byte = bounded(timeout, || read_byte(usart))?;
    }
    Ok(())
}

impl<USART> serial::Read<u8> for Serial<USART>
where
    USART: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        read_byte(&self.usart)
    }
}

impl<USART> serial::Write<u8> for Serial<USART>
where
    USART: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        write_byte(&self.usart, byte)
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        flush(&self.usart)
    }
}

impl<USART> blocking::serial::Write<u8> for Serial<USART>
where
    USART: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn bwrite_all(&mut self, buffer: &[u8]) -> Result<()> {
        self.transmit(buffer)
    }

    fn bflush(&mut self) -> Result<()> {
        bounded(self.timeout, || flush(&self.usart))
    }
}

impl Tx<'_> {
    /// Sends `data`, then waits for the last frame to leave the shift register.
    pub fn transmit(&mut self, data: &[u8]) -> Result<()> {
        transmit(self.usart, self.timeout, data)
    }
}

impl serial::Write<u8> for Tx<'_> {
    type Error = Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        write_byte(self.usart, byte)
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        flush(self.usart)
    }
}

impl blocking::serial::Write<u8> for Tx<'_> {
    type Error = Error;

    fn bwrite_all(&mut self, buffer: &[u8]) -> Result<()> {
        self.transmit(buffer)
    }

    fn bflush(&mut self) -> Result<()> {
        bounded(self.timeout, || flush(self.usart))
    }
}

impl fmt::Write for Tx<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.transmit(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl Rx<'_> {
    /// Fills `buffer`, aborting on the first receive error.
    pub fn receive(&mut self, buffer: &mut [u8]) -> Result<()> {
        receive(self.usart, self.timeout, buffer)
    }
}

impl serial::Read<u8> for Rx<'_> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        read_byte(self.usart)
    }
}
