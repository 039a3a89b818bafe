//! FCM register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Lower limit
    pub lvr: Reg<u32>,
    /// 0x04 - Upper limit
    pub uvr: Reg<u32>,
    /// 0x08 - Counter
    pub cntr: Reg<u32>,
    /// 0x0c - Start register
    pub str: Reg<u32>,
    /// 0x10 - Measurement (target) clock control
    pub mccr: Reg<u32>,
    /// 0x14 - Reference clock control
    pub rccr: Reg<u32>,
    /// 0x18 - Interrupt and reset control
    pub rier: Reg<u32>,
    /// 0x1c - Status flags
    pub sr: Reg<u32>,
    /// 0x20 - Status flag clear
    pub clr: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Str: u32 {
        const START = 1 << 0;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Mccr: u32 {
        const MDIVS = 0b11;
        const MCKS = 0b1111 << 4;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Rccr: u32 {
        const DNFS = 0b11 << 0;
        const RCKS = 0b1111 << 4;
        const EXREFE = 1 << 8;
        const RDIVS = 0b11 << 12;
        /// Use the internal reference clock when set
        const INEXS = 1 << 15;
        const EDGES = 0b11 << 16;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Rier: u32 {
        const ERRIE = 1 << 0;
        const MENDIE = 1 << 1;
        const OVFIE = 1 << 2;
        /// Reset on error when set, interrupt otherwise
        const ERRINTRS = 1 << 4;
        const ERRE = 1 << 7;
    }

    /// Status bits, shared by SR and CLR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        const ERRF = 1 << 0;
        const MENDF = 1 << 1;
        const OVF = 1 << 2;
    }
}
