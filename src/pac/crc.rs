//! CRC register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control register
    pub cr: Reg<u32>,
    /// 0x04 - Result register, also written with the initial value
    pub reslt: Reg<u32>,
    _reserved0: [u8; 4],
    /// 0x0c - Check flag
    pub flg: Reg<u32>,
    _reserved1: [u8; 0x70],
    /// 0x80 - Data input; byte, half-word and word writes are all accepted
    pub dat: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr: u32 {
        /// CRC32 when set, CRC16 otherwise
        const CR = 1 << 1;
        const REFIN = 1 << 2;
        const REFOUT = 1 << 3;
        const XOROUT = 1 << 4;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flg: u32 {
        const FLAG = 1 << 0;
    }
}
