//! SPI register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Data register
    pub dr: Reg<u32>,
    /// 0x04 - Control register 1
    pub cr1: Reg<u32>,
    _reserved0: [u8; 4],
    /// 0x0c - Configuration register 1
    pub cfg1: Reg<u32>,
    _reserved1: [u8; 4],
    /// 0x14 - Status register
    pub sr: Reg<u32>,
    /// 0x18 - Configuration register 2
    pub cfg2: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr1: u32 {
        /// 3-wire (clock synchronous) mode
        const SPIMDS = 1 << 0;
        /// Transmit only
        const TXMDS = 1 << 1;
        const MSTR = 1 << 3;
        const SPLPBK = 1 << 4;
        const SPLPBK2 = 1 << 5;
        const SPE = 1 << 6;
        const CSUSPE = 1 << 7;
        const EIE = 1 << 8;
        const TXIE = 1 << 9;
        const RXIE = 1 << 10;
        const IDIE = 1 << 11;
        const MODFE = 1 << 12;
        const PATE = 1 << 13;
        const PAOE = 1 << 14;
        const PAE = 1 << 15;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cfg1: u32 {
        const FTHLV = 0b11;
        const SPRDTD = 1 << 6;
        const SS0PV = 1 << 8;
        const MSSI = 0b111 << 20;
        const MSSDL = 0b111 << 24;
        const MIDI = 0b111 << 28;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        const OVRERF = 1 << 0;
        const IDLNF = 1 << 1;
        const MODFERF = 1 << 2;
        const PERF = 1 << 3;
        const UDRERF = 1 << 4;
        const TDEF = 1 << 5;
        const RDFF = 1 << 7;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cfg2: u32 {
        const CPHA = 1 << 0;
        const CPOL = 1 << 1;
        const MBR = 0b111 << 2;
        const DSIZE = 0b1111 << 8;
        const LSBF = 1 << 12;
    }
}
