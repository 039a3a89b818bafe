//! I2C register block

use super::Reg;
use bitflags::bitflags;

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control register 1
    pub cr1: Reg<u32>,
    /// 0x04 - Control register 2 (interrupt enables)
    pub cr2: Reg<u32>,
    /// 0x08 - Control register 3 (SCL timeout)
    pub cr3: Reg<u32>,
    /// 0x0c - Control register 4
    pub cr4: Reg<u32>,
    /// 0x10 - Slave address register 0
    pub slr0: Reg<u32>,
    /// 0x14 - Slave address register 1
    pub slr1: Reg<u32>,
    /// 0x18 - SCL timeout register
    pub sltr: Reg<u32>,
    /// 0x1c - Status register
    pub sr: Reg<u32>,
    /// 0x20 - Status clear register
    pub clr: Reg<u32>,
    /// 0x24 - Transmit data register
    pub dtr: Reg<u8>,
    _reserved0: [u8; 3],
    /// 0x28 - Receive data register
    pub drr: Reg<u8>,
    _reserved1: [u8; 3],
    /// 0x2c - Clock control register
    pub ccr: Reg<u32>,
    /// 0x30 - Filter control register
    pub fltr: Reg<u32>,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr1: u32 {
        const PE = 1 << 0;
        const SMBUS = 1 << 1;
        const SMBALRTEN = 1 << 2;
        const SMBDEFAULTEN = 1 << 3;
        const SMBHOSTEN = 1 << 4;
        const ENGC = 1 << 6;
        const RESTART = 1 << 7;
        const START = 1 << 8;
        const STOP = 1 << 9;
        const ACK = 1 << 10;
        const SWRST = 1 << 15;
    }

    /// Status bits, shared by SR, CLR (write 1 to clear) and CR2 (enable).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        const STARTF = 1 << 0;
        const SLADDR0F = 1 << 1;
        const SLADDR1F = 1 << 2;
        const TENDF = 1 << 3;
        const STOPF = 1 << 4;
        const RFULLF = 1 << 6;
        const TEMPTYF = 1 << 7;
        const ARLOF = 1 << 9;
        const ACKRF = 1 << 10;
        const NACKF = 1 << 12;
        const TMOUTF = 1 << 14;
        const MSL = 1 << 16;
        const BUSY = 1 << 17;
        const TRA = 1 << 18;
        const GENCALLF = 1 << 20;
        const SMBDEFAULTF = 1 << 21;
        const SMBHOSTF = 1 << 22;
        const SMBALRTF = 1 << 23;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Slr: u32 {
        const SLADDR = 0x3FF;
        const SLADDREN = 1 << 12;
        const ADDRMOD = 1 << 15;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ccr: u32 {
        const SLOWW = 0x1F;
        const SHIGHW = 0x1F << 8;
        const FREQ = 0b111 << 16;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fltr: u32 {
        const DNF = 0b11;
        const DNFEN = 1 << 4;
        const ANFEN = 1 << 5;
    }
}
