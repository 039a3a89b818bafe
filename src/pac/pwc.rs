//! PWC function clock gate registers
//!
//! A set bit stops the clock of the corresponding function.

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Function clock gate 0 (AHB functions)
    pub fcg0: Reg<u32>,
    /// 0x04 - Function clock gate 1 (APB functions)
    pub fcg1: Reg<u32>,
    _reserved0: [u8; 8],
    /// 0x10 - FCG0 write protection
    pub fcg0pc: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fcg0: u32 {
        const SRAM = 1 << 0;
        const DMA = 1 << 8;
        const CRC = 1 << 12;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fcg1: u32 {
        const ADC = 1 << 0;
        const CMP = 1 << 1;
        const TMR0 = 1 << 4;
        const TMRB = 1 << 5;
        const FCM = 1 << 8;
        const I2C = 1 << 12;
        const SPI = 1 << 14;
        const USART1 = 1 << 16;
        const USART2 = 1 << 17;
        const USART3 = 1 << 18;
        const USART4 = 1 << 19;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fcg0pc: u32 {
        const PRT0 = 1 << 0;
        const FCG0PCWE = 0xFFFF << 16;
    }
}

/// Key written to `FCG0PCWE` along with `PRT0`.
pub const FCG0PC_KEY: u32 = 0xA5A5;
