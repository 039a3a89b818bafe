//! RMU register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Reset flags
    pub rstf0: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Rstf0: u32 {
        const PORF = 1 << 0;
        const PINRF = 1 << 1;
        const BORF = 1 << 2;
        const LVRF = 1 << 3;
        const SWDRF = 1 << 6;
        const CKFERF = 1 << 8;
        const XTALERF = 1 << 9;
        const RAMPERF = 1 << 10;
        const SWRF = 1 << 11;
        const CPULKUPRF = 1 << 13;
        const MULTIRF = 1 << 30;
        /// Write 1 to clear every flag
        const CLRF = 1 << 31;
    }
}
