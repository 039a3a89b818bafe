//! INTC register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - NMI pin control
    pub nmicr: Reg<u32>,
    /// 0x04 - NMI source enable
    pub nmienr: Reg<u32>,
    /// 0x08 - NMI flags
    pub nmifr: Reg<u32>,
    /// 0x0c - NMI flag clear
    pub nmicfr: Reg<u32>,
    /// 0x10 - External interrupt control, channels 0 to 15
    pub eirqcr: [Reg<u32>; 16],
    /// 0x50 - Wakeup enable
    pub wupen: Reg<u32>,
    /// 0x54 - External interrupt flags
    pub eirqfr: Reg<u32>,
    /// 0x58 - External interrupt flag clear
    pub eirqcfr: Reg<u32>,
    /// 0x5c - Interrupt source selectors for IRQ000 to IRQ031
    pub sel: [Reg<u32>; 32],
    /// 0xdc - Software interrupt enable
    pub swier: Reg<u32>,
    /// 0xe0 - Event enable
    pub evter: Reg<u32>,
    /// 0xe4 - Interrupt enable (wakeup from sleep)
    pub ier: Reg<u32>,
}

bitflags! {
    /// NMI sources, shared by NMIENR, NMIFR and NMICFR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Nmi: u32 {
        const NMI_PIN = 1 << 0;
        const SWDT = 1 << 1;
        const LVD = 1 << 2;
        const XTAL_STOP = 1 << 5;
        const RAM_PARITY = 1 << 8;
        const BUS_ERROR = 1 << 10;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Nmicr: u32 {
        /// Rising edge when set
        const NMITRG = 1 << 0;
        const NSMPCLK = 0b11 << 4;
        const NFEN = 1 << 7;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Eirqcr: u32 {
        const EIRQTRG = 0b11;
        const EISMPCLK = 0b11 << 4;
        const EFEN = 1 << 7;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sel: u32 {
        const INTSEL = 0x1FF;
    }
}

/// Value of a selector that is not routed to any source.
pub const SEL_RESET_VALUE: u32 = 0x1FF;
