// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Serial Peripheral Interface
//!
//! Eight-bit frames. Every frame is sent once the transmit buffer is empty;
//! in full-duplex mode the matching receive frame is read back (and dropped
//! when only transmitting). Each wait is bounded by
//! [`Config::timeout`](field@Config::timeout) iterations.

use core::ops::Deref;

use embedded_hal::blocking::spi::{Transfer, Write};
use embedded_hal::spi::{FullDuplex, Mode, Phase, Polarity, MODE_0};

use crate::error::{Error, Result};
use crate::pac::spi::{Cfg1, Cfg2, Cr1, RegisterBlock, Sr};
use crate::poll;

pub use embedded_hal::spi::{MODE_1, MODE_2, MODE_3};

/// Default polling budget
pub const DEFAULT_TIMEOUT: u32 = 0x4000;

/// Frame sent while receiving
const DUMMY: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Master,
    Slave,
}

/// Divider from PCLK1 to SCK
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudDiv {
    Div2 = 0,
    Div4 = 1,
    Div8 = 2,
    Div16 = 3,
    Div32 = 4,
    Div64 = 5,
    Div128 = 6,
    Div256 = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Pin usage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wire {
    /// SCK, MOSI, MISO and SS
    Four,
    /// SCK, MOSI and MISO; chip select is driven by software
    Three,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    FullDuplex,
    TransmitOnly,
}

/// SPI configuration
#[derive(Clone, Copy)]
pub struct Config {
    pub mode: Mode,
    pub role: Role,
    pub baud_div: BaudDiv,
    pub bit_order: BitOrder,
    pub wire: Wire,
    pub transfer_mode: TransferMode,
    /// Polling budget of every flag wait
    pub timeout: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: MODE_0,
            role: Role::Master,
            baud_div: BaudDiv::Div8,
            bit_order: BitOrder::MsbFirst,
            wire: Wire::Three,
            transfer_mode: TransferMode::FullDuplex,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn baud_div(mut self, baud_div: BaudDiv) -> Self {
        self.baud_div = baud_div;
        self
    }

    pub fn bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    pub fn wire(mut self, wire: Wire) -> Self {
        self.wire = wire;
        self
    }

    pub fn transfer_mode(mut self, transfer_mode: TransferMode) -> Self {
        self.transfer_mode = transfer_mode;
        self
    }

    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Error flags, cleared by writing zero
const ERRORS: Sr = Sr::OVRERF
    .union(Sr::MODFERF)
    .union(Sr::PERF)
    .union(Sr::UDRERF);

/// Value of CFG2.DSIZE for 8-bit frames
const DSIZE_8BIT: u32 = 0b0100;

/// SPI abstraction
pub struct Spi<SPI> {
    spi: SPI,
    timeout: u32,
    tx_only: bool,
}

impl<SPI> Spi<SPI>
where
    SPI: Deref<Target = RegisterBlock>,
{
    /// Configures the peripheral and enables it.
    ///
    /// The function clock must already be enabled.
    pub fn new(spi: SPI, config: Config) -> Self {
        spi.cr1.write(0);

        spi.cfg1.write(0);
        spi.cfg1.set(Cfg1::SPRDTD);

        spi.cfg2.write(0);
        spi.cfg2
            .set_to(Cfg2::CPHA, config.mode.phase == Phase::CaptureOnSecondTransition);
        spi.cfg2
            .set_to(Cfg2::CPOL, config.mode.polarity == Polarity::IdleHigh);
        spi.cfg2.write_field(Cfg2::MBR, config.baud_div as u32);
        spi.cfg2.write_field(Cfg2::DSIZE, DSIZE_8BIT);
        spi.cfg2.set_to(Cfg2::LSBF, config.bit_order == BitOrder::LsbFirst);

        let tx_only = config.transfer_mode == TransferMode::TransmitOnly;
        let mut cr1 = Cr1::empty();
        cr1.set(Cr1::SPIMDS, config.wire == Wire::Three);
        cr1.set(Cr1::TXMDS, tx_only);
        cr1.set(Cr1::MSTR, config.role == Role::Master);
        spi.cr1.write_flags(cr1);
        spi.cr1.set(Cr1::SPE);

        Spi {
            spi,
            timeout: config.timeout,
            tx_only,
        }
    }

    pub fn enable(&mut self) {
        self.spi.cr1.set(Cr1::SPE);
    }

    pub fn disable(&mut self) {
        self.spi.cr1.clear(Cr1::SPE);
    }

    /// Changes the polling budget.
    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
    }

    /// Disables the peripheral and releases the register block.
    pub fn free(self) -> SPI {
        self.spi.cr1.clear(Cr1::SPE);
        self.spi
    }

    /// Current status flags.
    pub fn flags(&self) -> Sr {
        self.spi.sr.flags()
    }

    /// Clears error flags. Buffer flags are managed by the hardware and are
    /// left untouched.
    pub fn clear_flags(&mut self, flags: Sr) {
        self.spi.sr.clear(flags & ERRORS);
    }

    /// Enables the error, transmit, receive and idle interrupts selected.
    pub fn listen(&mut self, irq: Cr1) {
        self.spi
            .cr1
            .set(irq & (Cr1::EIE | Cr1::TXIE | Cr1::RXIE | Cr1::IDIE));
    }

    pub fn unlisten(&mut self, irq: Cr1) {
        self.spi
            .cr1
            .clear(irq & (Cr1::EIE | Cr1::TXIE | Cr1::RXIE | Cr1::IDIE));
    }

    fn wait(&self, flag: Sr) -> Result<()> {
        let sr = &self.spi.sr;
        poll::wait(self.timeout, || sr.is_set(flag))
    }

    fn check_errors(&self) -> Result<()> {
        if self.spi.sr.flags::<Sr>().intersects(ERRORS) {
            warn!("spi: error flag set");
            return Err(Error::Error);
        }
        Ok(())
    }

    /// Sends one frame and returns the one clocked in alongside it.
    fn exchange(&mut self, byte: u8) -> Result<u8> {
        self.wait(Sr::TDEF)?;
        self.spi.dr.write(u32::from(byte));
        self.wait(Sr::RDFF)?;
        let received = self.spi.dr.read() as u8;
        self.check_errors()?;
        Ok(received)
    }

    /// Sends `data`. In full-duplex mode the received frames are discarded.
    pub fn transmit(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            if self.tx_only {
                self.wait(Sr::TDEF)?;
                self.spi.dr.write(u32::from(byte));
            } else {
                self.exchange(byte)?;
            }
        }
        Ok(())
    }

    /// Fills `buffer`, clocking out dummy frames.
    pub fn receive(&mut self, buffer: &mut [u8]) -> Result<()> {
        if self.tx_only {
            return Err(Error::Uninitialized);
        }
        for byte in buffer.iter_mut() {
            *byte = self.exchange(DUMMY)?;
        }
        Ok(())
    }

    /// Sends `buffer` and replaces each frame with the one received.
    pub fn transfer_in_place(&mut self, buffer: &mut [u8]) -> Result<()> {
        if self.tx_only {
            return Err(Error::Uninitialized);
        }
        for byte in buffer.iter_mut() {
            *byte = self.exchange(*byte)?;
        }
        Ok(())
    }
}

impl<SPI> FullDuplex<u8> for Spi<SPI>
where
    SPI: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        self.check_errors()?;
        if self.spi.sr.is_set(Sr::RDFF) {
            Ok(self.spi.dr.read() as u8)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn send(&mut self, byte: u8) -> nb::Result<(), Error> {
        self.check_errors()?;
        if self.spi.sr.is_set(Sr::TDEF) {
            self.spi.dr.write(u32::from(byte));
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<SPI> Transfer<u8> for Spi<SPI>
where
    SPI: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8]> {
        self.transfer_in_place(words)?;
        Ok(words)
    }
}

impl<SPI> Write<u8> for Spi<SPI>
where
    SPI: Deref<Target = RegisterBlock>,
{
    type Error = Error;

    fn write(&mut self, words: &[u8]) -> Result<()> {
        self.transmit(words)
    }
}
