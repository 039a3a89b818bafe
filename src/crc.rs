// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # CRC calculation unit
//!
//! CRC16 (X.25, polynomial 0x1021) and CRC32 (ISO 3309, polynomial
//! 0x04C11DB7), both with reflected input, reflected output and a final
//! inversion.
//!
//! ```ignore
//! CRC::enable(&mut cmu.fcg);
//! let mut crc = Crc::new(dp.CRC, Protocol::Crc32);
//! let sum = crc.calculate_u8(0xFFFF_FFFF, b"123456789");
//! assert!(crc.check_u8(0xFFFF_FFFF, b"123456789", sum));
//! ```

use core::ops::Deref;
use core::ptr;

use crate::pac::crc::{Cr, Flg, RegisterBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    Crc16,
    Crc32,
}

pub struct Crc<CRC> {
    crc: CRC,
    protocol: Protocol,
}

impl<CRC> Crc<CRC>
where
    CRC: Deref<Target = RegisterBlock>,
{
    /// The function clock must already be enabled.
    pub fn new(crc: CRC, protocol: Protocol) -> Self {
        Crc { crc, protocol }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// CRC of `data` fed byte by byte, starting from `init`.
    pub fn calculate_u8(&mut self, init: u32, data: &[u8]) -> u32 {
        self.begin(init);
        for &byte in data {
            self.write_u8(byte);
        }
        self.result()
    }

    /// CRC of `data` fed half-word by half-word, starting from `init`.
    pub fn calculate_u16(&mut self, init: u32, data: &[u16]) -> u32 {
        self.begin(init);
        for &half in data {
            self.write_u16(half);
        }
        self.result()
    }

    /// CRC of `data` fed word by word, starting from `init`.
    pub fn calculate_u32(&mut self, init: u32, data: &[u32]) -> u32 {
        self.begin(init);
        for &word in data {
            self.crc.dat.write(word);
        }
        self.result()
    }

    /// True if `expected` is the CRC of `data` from `init`.
    pub fn check_u8(&mut self, init: u32, data: &[u8], expected: u32) -> bool {
        self.begin(init);
        for &byte in data {
            self.write_u8(byte);
        }
        self.verify(expected)
    }

    pub fn check_u16(&mut self, init: u32, data: &[u16], expected: u32) -> bool {
        self.begin(init);
        for &half in data {
            self.write_u16(half);
        }
        self.verify(expected)
    }

    pub fn check_u32(&mut self, init: u32, data: &[u32], expected: u32) -> bool {
        self.begin(init);
        for &word in data {
            self.crc.dat.write(word);
        }
        self.verify(expected)
    }

    pub fn free(self) -> CRC {
        self.crc
    }

    fn begin(&mut self, init: u32) {
        let mut cr = Cr::REFIN | Cr::REFOUT | Cr::XOROUT;
        cr.set(Cr::CR, self.protocol == Protocol::Crc32);
        self.crc.cr.write_flags(cr);
        self.crc.reslt.write(self.mask(init));
    }

    fn result(&self) -> u32 {
        self.mask(self.crc.reslt.read())
    }

    /// Feeds the expected value after the data. The unit flags a zero
    /// residue.
    fn verify(&mut self, expected: u32) -> bool {
        match self.protocol {
            Protocol::Crc16 => self.write_u16(expected as u16),
            Protocol::Crc32 => self.crc.dat.write(expected),
        }
        self.crc.flg.is_set(Flg::FLAG)
    }

    fn mask(&self, value: u32) -> u32 {
        match self.protocol {
            Protocol::Crc16 => value & 0xFFFF,
            Protocol::Crc32 => value,
        }
    }

    fn write_u8(&mut self, byte: u8) {
        // SAFETY: DAT accepts byte writes at its base address.
        unsafe { ptr::write_volatile(self.crc.dat.as_ptr() as *mut u8, byte) }
    }

    fn write_u16(&mut self, half: u16) {
        // SAFETY: DAT accepts half-word writes at its base address.
        unsafe { ptr::write_volatile(self.crc.dat.as_ptr() as *mut u16, half) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::detached;

    #[test]
    fn protocol_selects_the_width() {
        let regs: RegisterBlock = detached();
        let mut crc = Crc::new(&regs, Protocol::Crc16);

        crc.calculate_u32(0xFFFF_FFFF, &[]);
        assert!(!regs.cr.is_set(Cr::CR));
        assert!(regs.cr.is_set(Cr::REFIN | Cr::REFOUT | Cr::XOROUT));
        assert_eq!(regs.reslt.read(), 0xFFFF);

        let mut crc = Crc::new(&regs, Protocol::Crc32);
        crc.calculate_u32(0xFFFF_FFFF, &[]);
        assert!(regs.cr.is_set(Cr::CR));
        assert_eq!(regs.reslt.read(), 0xFFFF_FFFF);
    }

    #[test]
    fn narrow_writes_land_in_the_data_register() {
        let regs: RegisterBlock = detached();
        let mut crc = Crc::new(&regs, Protocol::Crc32);

        crc.calculate_u16(0, &[0xBEEF]);
        assert_eq!(regs.dat.read().to_le_bytes()[..2], 0xBEEFu16.to_le_bytes());

        crc.calculate_u8(0, &[0x11, 0x5A]);
        assert_eq!(regs.dat.read().to_le_bytes()[0], 0x5A);

        crc.calculate_u32(0, &[0x1234_5678]);
        assert_eq!(regs.dat.read(), 0x1234_5678);
    }

    #[test]
    fn check_feeds_the_expected_value_and_reads_the_flag() {
        let regs: RegisterBlock = detached();
        let mut crc = Crc::new(&regs, Protocol::Crc16);

        assert!(!crc.check_u8(0xFFFF, b"abc", 0x1234));
        assert_eq!(regs.dat.read().to_le_bytes()[..2], 0x1234u16.to_le_bytes());

        regs.flg.write_flags(Flg::FLAG);
        assert!(crc.check_u16(0xFFFF, &[1, 2], 0x1234));
    }
}
