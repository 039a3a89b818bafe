// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Interrupt controller (INTC)
//!
//! Each of the 32 NVIC lines `IRQ000..IRQ031` is routed to one peripheral
//! event through a selector register. [`Intc`] keeps a table of which
//! source and handler own each line; the vector-table entry for a line
//! forwards to [`Intc::dispatch`].
//!
//! ```ignore
//! let mut intc = Intc::new(dp.INTC);
//! intc.register(IrqRegistration {
//!     irq: Interrupt::IRQ000,
//!     source: IntSource::TmrbOvf,
//!     callback: on_overflow,
//! })?;
//! unsafe { interrupt::unmask(Interrupt::IRQ000, 0x40, &mut cp.NVIC) };
//! ```

use core::ops::Deref;

use cortex_m::peripheral::NVIC;

use crate::error::{Error, Result};
use crate::pac::intc::{Eirqcr, Nmicr, RegisterBlock, Sel, SEL_RESET_VALUE};
use crate::pac::Interrupt;

pub use crate::pac::intc::Nmi as NmiSource;

/// Interrupt handler stored in the registration table
pub type Callback = fn();

/// Number of external interrupt channels
pub const EXT_INT_CHANNELS: u8 = 16;

/// Peripheral events that can be routed to an IRQ line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum IntSource {
    ExtInt0 = 0x00,
    ExtInt1 = 0x01,
    ExtInt2 = 0x02,
    ExtInt3 = 0x03,
    ExtInt4 = 0x04,
    ExtInt5 = 0x05,
    ExtInt6 = 0x06,
    ExtInt7 = 0x07,
    ExtInt8 = 0x08,
    ExtInt9 = 0x09,
    ExtInt10 = 0x0A,
    ExtInt11 = 0x0B,
    ExtInt12 = 0x0C,
    ExtInt13 = 0x0D,
    ExtInt14 = 0x0E,
    ExtInt15 = 0x0F,
    FcmErr = 0x20,
    FcmEnd = 0x21,
    FcmOvf = 0x22,
    SwdtRefUdf = 0x23,
    Tmr0CmpA = 0x30,
    Tmr0CmpB = 0x31,
    TmrbOvf = 0x40,
    TmrbUdf = 0x41,
    TmrbCmp = 0x42,
    Usart1Ei = 0x50,
    Usart1Ri = 0x51,
    Usart1Ti = 0x52,
    Usart1Tci = 0x53,
    Usart1Rto = 0x54,
    Usart2Ei = 0x58,
    Usart2Ri = 0x59,
    Usart2Ti = 0x5A,
    Usart2Tci = 0x5B,
    Usart2Rto = 0x5C,
    Usart3Ei = 0x60,
    Usart3Ri = 0x61,
    Usart3Ti = 0x62,
    Usart3Tci = 0x63,
    Usart3Rto = 0x64,
    Usart4Ei = 0x68,
    Usart4Ri = 0x69,
    Usart4Ti = 0x6A,
    Usart4Tci = 0x6B,
    Usart4Rto = 0x6C,
    SpiRi = 0x70,
    SpiTi = 0x71,
    SpiIi = 0x72,
    SpiEi = 0x73,
    I2cRxi = 0x78,
    I2cTxi = 0x79,
    I2cTei = 0x7A,
    I2cEei = 0x7B,
}

/// Binding of one IRQ line to an event source and its handler
#[derive(Clone, Copy)]
pub struct IrqRegistration {
    pub irq: Interrupt,
    pub source: IntSource,
    pub callback: Callback,
}

/// External interrupt trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    FallingEdge = 0b00,
    RisingEdge = 0b01,
    BothEdges = 0b10,
    LowLevel = 0b11,
}

/// Sampling clock of the input noise filter, as a division of PCLK
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterClock {
    Div1 = 0b00,
    Div8 = 0b01,
    Div32 = 0b10,
    Div64 = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtIntConfig {
    pub trigger: Trigger,
    /// Noise filter, disabled when `None`
    pub filter: Option<FilterClock>,
}

impl Default for ExtIntConfig {
    fn default() -> Self {
        ExtIntConfig {
            trigger: Trigger::FallingEdge,
            filter: None,
        }
    }
}

/// NMI pin configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NmiPinConfig {
    pub rising_edge: bool,
    pub filter: Option<FilterClock>,
}

/// Interrupt controller with its IRQ registration table
pub struct Intc<INTC> {
    intc: INTC,
    handlers: [Option<(IntSource, Callback)>; Interrupt::COUNT],
}

impl<INTC> Intc<INTC>
where
    INTC: Deref<Target = RegisterBlock>,
{
    /// Takes the controller with an empty table. Selectors already routed
    /// by earlier code stay routed and make `register` fail on that line.
    pub fn new(intc: INTC) -> Self {
        Intc {
            intc,
            handlers: [None; Interrupt::COUNT],
        }
    }

    /// Routes `registration.source` to `registration.irq` and records the
    /// handler.
    ///
    /// Returns [`Error::Error`] if the line is already routed to a source.
    pub fn register(&mut self, registration: IrqRegistration) -> Result<()> {
        let IrqRegistration {
            irq,
            source,
            callback,
        } = registration;
        let sel = &self.intc.sel[irq.index()];

        if sel.read_field(Sel::INTSEL) != SEL_RESET_VALUE {
            warn!("intc: IRQ line already in use");
            return Err(Error::Error);
        }
        sel.write_field(Sel::INTSEL, source as u32);
        self.handlers[irq.index()] = Some((source, callback));
        debug!("intc: routed source to IRQ line");
        Ok(())
    }

    /// Releases `irq`, restoring its selector. Returns the source it was
    /// routed to, if any was registered here.
    pub fn unregister(&mut self, irq: Interrupt) -> Option<IntSource> {
        self.intc.sel[irq.index()].write_field(Sel::INTSEL, SEL_RESET_VALUE);
        self.handlers[irq.index()].take().map(|(source, _)| source)
    }

    /// Source currently registered on `irq`
    pub fn source(&self, irq: Interrupt) -> Option<IntSource> {
        self.handlers[irq.index()].map(|(source, _)| source)
    }

    /// Runs the handler registered on `irq`. Returns `false` if there is
    /// none.
    pub fn dispatch(&self, irq: Interrupt) -> bool {
        match self.handlers[irq.index()] {
            Some((_, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Configures the trigger and filter of an external interrupt channel.
    pub fn ext_int_config(&mut self, channel: u8, config: ExtIntConfig) -> Result<()> {
        let eirqcr = self
            .intc
            .eirqcr
            .get(usize::from(channel))
            .ok_or(Error::InvalidParameter)?;

        eirqcr.write_field(Eirqcr::EIRQTRG, config.trigger as u32);
        match config.filter {
            Some(clock) => {
                eirqcr.write_field(Eirqcr::EISMPCLK, clock as u32);
                eirqcr.set(Eirqcr::EFEN);
            }
            None => eirqcr.clear(Eirqcr::EFEN),
        }
        Ok(())
    }

    /// True if the external interrupt channel has a pending request.
    pub fn ext_int_status(&self, channel: u8) -> bool {
        channel < EXT_INT_CHANNELS && self.intc.eirqfr.read() & (1 << channel) != 0
    }

    pub fn ext_int_clear(&mut self, channel: u8) {
        if channel < EXT_INT_CHANNELS {
            self.intc.eirqcfr.write(1 << channel);
        }
    }

    /// Lets the external interrupt channel wake the chip from stop mode.
    pub fn ext_int_wakeup(&mut self, channel: u8, enable: bool) {
        if channel < EXT_INT_CHANNELS {
            let bit = 1 << channel;
            self.intc
                .wupen
                .modify(|r| if enable { r | bit } else { r & !bit });
        }
    }

    pub fn nmi_pin_config(&mut self, config: NmiPinConfig) {
        let nmicr = &self.intc.nmicr;
        nmicr.set_to(Nmicr::NMITRG, config.rising_edge);
        match config.filter {
            Some(clock) => {
                nmicr.write_field(Nmicr::NSMPCLK, clock as u32);
                nmicr.set(Nmicr::NFEN);
            }
            None => nmicr.clear(Nmicr::NFEN),
        }
    }

    /// Enables NMI sources. NMI enables cannot be withdrawn until reset.
    pub fn nmi_enable(&mut self, sources: NmiSource) {
        self.intc.nmienr.set(sources);
    }

    /// True if any of `sources` raised an NMI.
    pub fn nmi_status(&self, sources: NmiSource) -> bool {
        let pending: NmiSource = self.intc.nmifr.flags();
        pending.intersects(sources)
    }

    pub fn nmi_clear(&mut self, sources: NmiSource) {
        self.intc.nmicfr.write_flags(sources);
    }

    /// Raises software interrupt `channel` (0 to 31). It stays pending
    /// until cleared.
    pub fn software_trigger(&mut self, channel: u8) -> Result<()> {
        let bit = software_bit(channel)?;
        self.intc.swier.modify(|r| r | bit);
        Ok(())
    }

    pub fn software_clear(&mut self, channel: u8) -> Result<()> {
        let bit = software_bit(channel)?;
        self.intc.swier.modify(|r| r & !bit);
        Ok(())
    }

    pub fn free(self) -> INTC {
        self.intc
    }
}

fn software_bit(channel: u8) -> Result<u32> {
    1u32.checked_shl(u32::from(channel))
        .ok_or(Error::InvalidParameter)
}

/// Sets the priority of `irq` and unmasks it in the NVIC.
///
/// # Safety
///
/// Unmasking can break mask-based critical sections.
pub unsafe fn unmask(irq: Interrupt, priority: u8, nvic: &mut NVIC) {
    nvic.set_priority(irq, priority);
    NVIC::unmask(irq);
}

/// Masks `irq` in the NVIC.
pub fn mask(irq: Interrupt) {
    NVIC::mask(irq);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::detached;
    use core::sync::atomic::{AtomicU32, Ordering};

    static CALLS: AtomicU32 = AtomicU32::new(0);

    fn handler() {
        CALLS.fetch_add(1, Ordering::Relaxed);
    }

    fn controller(regs: &RegisterBlock) -> Intc<&RegisterBlock> {
        for sel in regs.sel.iter() {
            sel.write(SEL_RESET_VALUE);
        }
        Intc::new(regs)
    }

    #[test]
    fn registration_routes_and_dispatches() {
        let regs: RegisterBlock = detached();
        let mut intc = controller(&regs);

        intc.register(IrqRegistration {
            irq: Interrupt::IRQ005,
            source: IntSource::TmrbOvf,
            callback: handler,
        })
        .unwrap();
        assert_eq!(regs.sel[5].read(), IntSource::TmrbOvf as u32);
        assert_eq!(intc.source(Interrupt::IRQ005), Some(IntSource::TmrbOvf));

        let before = CALLS.load(Ordering::Relaxed);
        assert!(intc.dispatch(Interrupt::IRQ005));
        assert_eq!(CALLS.load(Ordering::Relaxed), before + 1);
        assert!(!intc.dispatch(Interrupt::IRQ006));
    }

    #[test]
    fn occupied_lines_are_refused_until_released() {
        let regs: RegisterBlock = detached();
        let mut intc = controller(&regs);
        let registration = IrqRegistration {
            irq: Interrupt::IRQ031,
            source: IntSource::I2cRxi,
            callback: handler,
        };

        intc.register(registration).unwrap();
        assert_eq!(
            intc.register(IrqRegistration {
                source: IntSource::SpiRi,
                ..registration
            }),
            Err(Error::Error)
        );

        assert_eq!(intc.unregister(Interrupt::IRQ031), Some(IntSource::I2cRxi));
        assert_eq!(regs.sel[31].read(), SEL_RESET_VALUE);
        assert!(intc.register(registration).is_ok());
    }

    #[test]
    fn lines_routed_elsewhere_are_refused() {
        let regs: RegisterBlock = detached();
        let mut intc = Intc::new(&regs);

        let result = intc.register(IrqRegistration {
            irq: Interrupt::IRQ000,
            source: IntSource::ExtInt3,
            callback: handler,
        });
        assert_eq!(result, Err(Error::Error));
        assert_eq!(intc.source(Interrupt::IRQ000), None);
    }

    #[test]
    fn external_interrupt_channels() {
        let regs: RegisterBlock = detached();
        let mut intc = controller(&regs);

        intc.ext_int_config(
            4,
            ExtIntConfig {
                trigger: Trigger::BothEdges,
                filter: Some(FilterClock::Div32),
            },
        )
        .unwrap();
        assert_eq!(regs.eirqcr[4].read_field(Eirqcr::EIRQTRG), 0b10);
        assert_eq!(regs.eirqcr[4].read_field(Eirqcr::EISMPCLK), 0b10);
        assert!(regs.eirqcr[4].is_set(Eirqcr::EFEN));

        assert_eq!(
            intc.ext_int_config(16, ExtIntConfig::default()),
            Err(Error::InvalidParameter)
        );

        regs.eirqfr.write(1 << 4);
        assert!(intc.ext_int_status(4));
        assert!(!intc.ext_int_status(20));
        intc.ext_int_clear(4);
        assert_eq!(regs.eirqcfr.read(), 1 << 4);

        intc.ext_int_wakeup(2, true);
        assert_eq!(regs.wupen.read(), 0b100);
    }

    #[test]
    fn nmi_and_software_interrupts() {
        let regs: RegisterBlock = detached();
        let mut intc = controller(&regs);

        intc.nmi_enable(NmiSource::SWDT | NmiSource::XTAL_STOP);
        assert!(regs.nmienr.is_set(NmiSource::SWDT | NmiSource::XTAL_STOP));

        regs.nmifr.write_flags(NmiSource::SWDT);
        assert!(intc.nmi_status(NmiSource::SWDT | NmiSource::LVD));
        assert!(!intc.nmi_status(NmiSource::LVD));
        intc.nmi_clear(NmiSource::SWDT);
        assert_eq!(regs.nmicfr.read(), NmiSource::SWDT.bits());

        intc.software_trigger(31).unwrap();
        assert_eq!(regs.swier.read(), 1 << 31);
        intc.software_clear(31).unwrap();
        assert_eq!(regs.swier.read(), 0);
        assert_eq!(intc.software_trigger(32), Err(Error::InvalidParameter));
    }
}
