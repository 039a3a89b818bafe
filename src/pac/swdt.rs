//! SWDT register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    _reserved0: [u8; 4],
    /// 0x04 - Status register, counter value in the low half
    pub sr: Reg<u32>,
    /// 0x08 - Refresh register
    pub rr: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        const CNT = 0xFFFF;
        /// Counter underflow
        const UDF = 1 << 16;
        /// Refresh outside the allowed window
        const REF = 1 << 17;
    }
}

/// First refresh key.
pub const REFRESH_KEY_START: u32 = 0x0123;
/// Second refresh key.
pub const REFRESH_KEY_END: u32 = 0x3210;
