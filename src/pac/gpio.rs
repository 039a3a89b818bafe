//! GPIO register block

use super::Reg;
use bitflags::bitflags;

/// Data registers of one 8-pin port.
#[repr(C)]
pub struct Port {
    /// 0x00 - Input data
    pub pidr: Reg<u16>,
    _reserved0: [u8; 2],
    /// 0x04 - Output data
    pub podr: Reg<u16>,
    /// 0x06 - Output enable
    pub poer: Reg<u16>,
    /// 0x08 - Output set (write 1)
    pub posr: Reg<u16>,
    /// 0x0a - Output reset (write 1)
    pub porr: Reg<u16>,
    /// 0x0c - Output toggle (write 1)
    pub potr: Reg<u16>,
    _reserved1: [u8; 2],
}

/// Configuration registers of one pin.
#[repr(C)]
pub struct PinCfg {
    /// Pin control
    pub pcr: Reg<u16>,
    /// Function select
    pub pfsr: Reg<u16>,
}

#[repr(C)]
pub struct RegisterBlock {
    /// 0x000 - Port data registers, ports 0 to 7
    pub port: [Port; 8],
    _reserved0: [u8; 0x37C],
    /// 0x3fc - Write protection
    pub pwpr: Reg<u16>,
    _reserved1: [u8; 2],
    /// 0x400 - Pin configuration, indexed by port then pin
    pub pin: [[PinCfg; 8]; 8],
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pcr: u16 {
        const POUT = 1 << 0;
        const POUTE = 1 << 1;
        /// Open drain when set
        const NOD = 1 << 2;
        const DRV = 0b11 << 4;
        const PUU = 1 << 6;
        const PIN = 1 << 8;
        const INVE = 1 << 9;
        const INTE = 1 << 12;
        const LTE = 1 << 14;
        /// Digital input disabled (analog)
        const DDIS = 1 << 15;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pfsr: u16 {
        const FSEL = 0x3F;
        const BFE = 1 << 8;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pwpr: u16 {
        const WE = 1 << 0;
        const WP = 0xFF << 8;
    }
}

/// Key written to `WP` along with `WE`.
pub const PWPR_KEY: u16 = 0xA5;
