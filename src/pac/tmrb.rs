//! TimerB register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Counter
    pub cnter: Reg<u32>,
    /// 0x04 - Period value
    pub perar: Reg<u32>,
    _reserved0: [u8; 0x38],
    /// 0x40 - Compare values, channels 1 to 4
    pub cmpar: [Reg<u32>; 4],
    _reserved1: [u8; 0x30],
    /// 0x80 - Basic control and status
    pub bcstr: Reg<u32>,
    /// 0x84 - Hardware start/stop/clear events
    pub hconr: Reg<u32>,
    /// 0x88 - Hardware count-up events
    pub hcupr: Reg<u32>,
    /// 0x8c - Hardware count-down events
    pub hcdor: Reg<u32>,
    /// 0x90 - Compare interrupt enables
    pub iconr: Reg<u32>,
    /// 0x94 - Compare event enables
    pub econr: Reg<u32>,
    /// 0x98 - Input filter control
    pub fconr: Reg<u32>,
    /// 0x9c - Compare flags
    pub stflr: Reg<u32>,
    _reserved2: [u8; 0x60],
    /// 0x100 - Capture/compare control, channels 1 to 4
    pub cconr: [Reg<u32>; 4],
    _reserved3: [u8; 0x30],
    /// 0x140 - Port (PWM output) control, channels 1 to 4
    pub pconr: [Reg<u32>; 4],
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Bcstr: u32 {
        const START = 1 << 0;
        /// Count up when set
        const DIR = 1 << 1;
        /// Triangle wave when set
        const MODE = 1 << 2;
        const SYNST = 1 << 3;
        const CKDIV = 0b1111 << 4;
        /// Stop on overflow/underflow
        const OVSTP = 1 << 8;
        const ITENOVF = 1 << 12;
        const ITENUDF = 1 << 13;
        const OVFF = 1 << 14;
        const UDFF = 1 << 15;
    }

    /// Per-channel bits of ICONR, ECONR and STFLR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u32 {
        const CH1 = 1 << 0;
        const CH2 = 1 << 1;
        const CH3 = 1 << 2;
        const CH4 = 1 << 3;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cconr: u32 {
        /// Capture input mode when set, compare output otherwise
        const CAPMD = 1 << 0;
        const HICP0 = 1 << 4;
        const HICP1 = 1 << 5;
        const NOFIENCP = 1 << 12;
        const NOFICKCP = 0b11 << 13;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pconr: u32 {
        /// Port level when the counter starts
        const STAC = 0b11 << 0;
        /// Port level when the counter stops
        const STPC = 0b11 << 2;
        /// Port level on compare match
        const CMPC = 0b11 << 4;
        /// Port level on period match
        const PERC = 0b11 << 6;
        /// Force output level
        const FORC = 0b11 << 8;
        const OUTEN = 1 << 12;
    }
}
