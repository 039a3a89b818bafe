//! Timer0 register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Channel A counter
    pub cntar: Reg<u32>,
    /// 0x04 - Channel B counter
    pub cntbr: Reg<u32>,
    /// 0x08 - Channel A compare value
    pub cmpar: Reg<u32>,
    /// 0x0c - Channel B compare value
    pub cmpbr: Reg<u32>,
    /// 0x10 - Basic control register, channel A in the low half and channel
    /// B in the high half
    pub bconr: Reg<u32>,
    /// 0x14 - Status flags
    pub stflr: Reg<u32>,
}

bitflags! {
    /// Channel A half of BCONR. Channel B uses the same layout shifted up
    /// by 16.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Bconr: u32 {
        const CST = 1 << 0;
        /// Capture input mode when set
        const CAPMD = 1 << 1;
        const INTEN = 1 << 2;
        const CKDIV = 0b1111 << 4;
        /// Asynchronous counting clock when set
        const SYNS = 1 << 8;
        /// Synchronous clock source: 0 = PCLK1, 1 = internal trigger event
        const SYNCLK = 1 << 9;
        /// Asynchronous clock source: 0 = LRC, 1 = XTAL32
        const ASYNCLK = 1 << 10;
        const HSTA = 1 << 12;
        const HSTP = 1 << 13;
        const HCLE = 1 << 14;
        const HICP = 1 << 15;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Stflr: u32 {
        const CMFA = 1 << 0;
        const CMFB = 1 << 16;
    }
}
