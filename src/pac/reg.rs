// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Volatile register access with named bit fields.
//!
//! Every register of every block is a [`Reg<T>`]. Bit sets and multi-bit
//! fields are described by `bitflags` types, so driver code names the bits
//! it touches instead of shifting raw masks:
//!
//! ```ignore
//! i2c.cr1.set(Cr1::PE);
//! i2c.ccr.write_field(Ccr::FREQ, 3);
//! let busy = i2c.sr.is_set(Sr::BUSY);
//! ```

use core::ops::{BitAnd, BitOr, Not, Shl, Shr};

use bitflags::Flags;
use vcell::VolatileCell;

/// Integer widths a register can have.
pub trait RegisterValue:
    Copy
    + PartialEq
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    const ZERO: Self;

    fn trailing_zeros(self) -> u32;
}

macro_rules! register_value {
    ($($t:ty),+) => {
        $(
            impl RegisterValue for $t {
                const ZERO: Self = 0;

                #[inline(always)]
                fn trailing_zeros(self) -> u32 {
                    <$t>::trailing_zeros(self)
                }
            }
        )+
    };
}

register_value!(u8, u16, u32);

/// A single memory-mapped register.
#[repr(transparent)]
pub struct Reg<T: Copy> {
    cell: VolatileCell<T>,
}

impl<T: Copy> Reg<T> {
    /// Volatile read of the whole register.
    #[inline(always)]
    pub fn read(&self) -> T {
        self.cell.get()
    }

    /// Volatile write of the whole register.
    #[inline(always)]
    pub fn write(&self, value: T) {
        self.cell.set(value)
    }

    /// Read-modify-write.
    #[inline(always)]
    pub fn modify(&self, f: impl FnOnce(T) -> T) {
        self.write(f(self.read()))
    }

    /// Raw pointer to the register, for accesses narrower than `T`.
    #[inline(always)]
    pub fn as_ptr(&self) -> *mut T {
        self.cell.as_ptr()
    }
}

impl<T: RegisterValue> Reg<T> {
    /// Reads the register as a typed bit set, dropping unknown bits.
    #[inline(always)]
    pub fn flags<F: Flags<Bits = T>>(&self) -> F {
        F::from_bits_truncate(self.read())
    }

    /// Writes exactly `flags`, clearing every other bit.
    #[inline(always)]
    pub fn write_flags<F: Flags<Bits = T>>(&self, flags: F) {
        self.write(flags.bits())
    }

    #[inline(always)]
    pub fn set<F: Flags<Bits = T>>(&self, flags: F) {
        self.modify(|r| r | flags.bits())
    }

    #[inline(always)]
    pub fn clear<F: Flags<Bits = T>>(&self, flags: F) {
        self.modify(|r| r & !flags.bits())
    }

    /// Sets or clears `flags` depending on `on`.
    #[inline(always)]
    pub fn set_to<F: Flags<Bits = T>>(&self, flags: F, on: bool) {
        if on {
            self.set(flags)
        } else {
            self.clear(flags)
        }
    }

    /// True if every bit of `flags` is set.
    #[inline(always)]
    pub fn is_set<F: Flags<Bits = T>>(&self, flags: F) -> bool {
        let mask = flags.bits();
        self.read() & mask == mask
    }

    /// Reads the multi-bit field described by `field`, shifted down to bit 0.
    #[inline(always)]
    pub fn read_field<F: Flags<Bits = T>>(&self, field: F) -> T {
        let mask = field.bits();
        (self.read() & mask) >> mask.trailing_zeros()
    }

    /// Replaces the multi-bit field described by `field` with `value`.
    ///
    /// Bits of `value` that do not fit in the field are discarded.
    #[inline(always)]
    pub fn write_field<F: Flags<Bits = T>>(&self, field: F, value: T) {
        let mask = field.bits();
        self.modify(|r| (r & !mask) | ((value << mask.trailing_zeros()) & mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitflags::bitflags;

    bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct Ctl: u32 {
            const EN = 1 << 0;
            const DIV = 0b111 << 4;
            const IE = 1 << 8;
        }
    }

    fn reg(value: u32) -> Reg<u32> {
        Reg {
            cell: VolatileCell::new(value),
        }
    }

    #[test]
    fn set_and_clear_leave_other_bits() {
        let r = reg(0x8000_0000);
        r.set(Ctl::EN | Ctl::IE);
        assert_eq!(r.read(), 0x8000_0101);
        r.clear(Ctl::EN);
        assert_eq!(r.read(), 0x8000_0100);
        assert!(r.is_set(Ctl::IE));
        assert!(!r.is_set(Ctl::EN | Ctl::IE));
    }

    #[test]
    fn fields_are_shifted_and_masked() {
        let r = reg(0xFFFF_FFFF);
        r.write_field(Ctl::DIV, 0b010);
        assert_eq!(r.read(), 0xFFFF_FFAF);
        assert_eq!(r.read_field(Ctl::DIV), 0b010);
        r.write_field(Ctl::DIV, 0xFF);
        assert_eq!(r.read_field(Ctl::DIV), 0b111);
    }

    #[test]
    fn flags_truncates_unknown_bits() {
        let r = reg(0xF101);
        let f: Ctl = r.flags();
        assert_eq!(f, Ctl::EN | Ctl::IE);
    }
}
