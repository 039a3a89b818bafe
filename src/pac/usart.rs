//! USART register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Status register
    pub sr: Reg<u32>,
    /// 0x04 - Transmit data register
    pub tdr: Reg<u16>,
    /// 0x06 - Receive data register
    pub rdr: Reg<u16>,
    /// 0x08 - Baud rate register
    pub brr: Reg<u32>,
    /// 0x0c - Control register 1
    pub cr1: Reg<u32>,
    /// 0x10 - Control register 2
    pub cr2: Reg<u32>,
    /// 0x14 - Control register 3
    pub cr3: Reg<u32>,
    /// 0x18 - Prescaler register
    pub pr: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        const PE = 1 << 0;
        const FE = 1 << 1;
        const ORE = 1 << 3;
        const RXNE = 1 << 5;
        const TC = 1 << 6;
        const TXE = 1 << 7;
        const RTOF = 1 << 8;
        const MPB = 1 << 16;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Brr: u32 {
        const DIV_FRACTION = 0x7F;
        const DIV_INTEGER = 0xFF << 8;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr1: u32 {
        const RTOE = 1 << 0;
        const RTOIE = 1 << 1;
        const RE = 1 << 2;
        const TE = 1 << 3;
        const SLME = 1 << 4;
        const RIE = 1 << 5;
        const TCIE = 1 << 6;
        const TXEIE = 1 << 7;
        /// Odd parity when set
        const PS = 1 << 9;
        const PCE = 1 << 10;
        /// 9 data bits when set
        const M = 1 << 12;
        const OVER8 = 1 << 15;
        const CPE = 1 << 16;
        const CFE = 1 << 17;
        const CORE = 1 << 19;
        const CRTOF = 1 << 20;
        const MS = 1 << 24;
        /// LSB first when clear
        const ML = 1 << 28;
        const FBME = 1 << 29;
        const NFE = 1 << 30;
        /// Start bit detected on falling edge when set
        const SBS = 1 << 31;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr2: u32 {
        const MPE = 1 << 0;
        const CLKC = 0b11 << 11;
        /// Two stop bits when set
        const STOP = 1 << 13;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr3: u32 {
        const HDSEL = 1 << 3;
        const CTSE = 1 << 9;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pr: u32 {
        const PSC = 0b11;
    }
}
