//! CMU register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - System clock divider configuration
    pub scfgr: Reg<u32>,
    /// 0x04 - System clock source switch
    pub ckswr: Reg<u8>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Scfgr: u32 {
        const PCLK1S = 0b111 << 4;
        const PCLK4S = 0b111 << 16;
        const HCLKS = 0b111 << 24;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ckswr: u8 {
        const CKSW = 0b111;
    }
}
