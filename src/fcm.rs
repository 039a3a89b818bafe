// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Frequency clock measurement (FCM)
//!
//! Counts edges of a target clock during a window of a reference clock and
//! compares the count against a lower and an upper limit. A count outside
//! the limits raises an error that can request an interrupt or a reset.
//!
//! ```ignore
//! FCM::enable(&mut cmu.fcg);
//! let window = Window::from_frequencies(HRC, TargetDiv::Div1, 32_768.hz(), ReferenceDiv::Div32, 5)?;
//! let mut fcm = Fcm::new(dp.FCM, Config::default().window(window))?;
//! let count = fcm.measure()?;
//! ```

use core::ops::Deref;

use crate::error::{Error, Result};
use crate::pac::fcm::{Mccr, RegisterBlock, Rccr, Rier, Sr, Str};
use crate::poll;
use crate::time::Hertz;

/// Default polling budget of [`Fcm::measure`]
pub const DEFAULT_TIMEOUT: u32 = 0x10_0000;

/// Clock sources of the target and the internal reference
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    Xtal = 0,
    Xtal32 = 1,
    Hrc = 2,
    Lrc = 3,
    SwdtLrc = 4,
    Pclk1 = 5,
    Mrc = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetDiv {
    Div1 = 0,
    Div4 = 1,
    Div8 = 2,
    Div32 = 3,
}

impl TargetDiv {
    fn factor(self) -> u32 {
        match self {
            TargetDiv::Div1 => 1,
            TargetDiv::Div4 => 4,
            TargetDiv::Div8 => 8,
            TargetDiv::Div32 => 32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReferenceDiv {
    Div32 = 0,
    Div128 = 1,
    Div1024 = 2,
    Div8192 = 3,
}

impl ReferenceDiv {
    fn factor(self) -> u32 {
        match self {
            ReferenceDiv::Div32 => 32,
            ReferenceDiv::Div128 => 128,
            ReferenceDiv::Div1024 => 1024,
            ReferenceDiv::Div8192 => 8192,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reference {
    /// An internal clock
    Internal(ClockSource),
    /// The FCMREF pin
    External,
}

/// Edge of the external reference that opens the window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising = 0,
    Falling = 1,
    Both = 2,
}

/// Noise filter on the external reference, as a division of the target
/// clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    Off = 0,
    Div1 = 1,
    Div4 = 2,
    Div16 = 3,
}

/// What a count outside the window triggers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorAction {
    /// Only the status flag
    None,
    Interrupt,
    Reset,
}

/// Accepted range of the count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    pub lower: u16,
    pub upper: u16,
}

impl Window {
    /// Window centred on the count expected from the nominal frequencies,
    /// widened by `tolerance_percent` on each side.
    pub fn from_frequencies(
        target: Hertz,
        target_div: TargetDiv,
        reference: Hertz,
        reference_div: ReferenceDiv,
        tolerance_percent: u8,
    ) -> Result<Window> {
        if reference.0 == 0 || tolerance_percent > 100 {
            return Err(Error::InvalidParameter);
        }
        let expected = u64::from(target.0) * u64::from(reference_div.factor())
            / (u64::from(target_div.factor()) * u64::from(reference.0));
        let tolerance = u64::from(tolerance_percent);
        let lower = expected * (100 - tolerance) / 100;
        let upper = expected * (100 + tolerance) / 100;

        Ok(Window {
            lower: cast::u16(lower).map_err(|_| Error::InvalidParameter)?,
            upper: cast::u16(upper).map_err(|_| Error::InvalidParameter)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub target: ClockSource,
    pub target_div: TargetDiv,
    pub reference: Reference,
    pub reference_div: ReferenceDiv,
    pub edge: Edge,
    pub filter: Filter,
    pub window: Window,
    pub error_action: ErrorAction,
    /// Polling budget of [`Fcm::measure`]
    pub timeout: u32,
}

impl Config {
    pub fn target(mut self, source: ClockSource, div: TargetDiv) -> Self {
        self.target = source;
        self.target_div = div;
        self
    }

    pub fn reference(mut self, reference: Reference, div: ReferenceDiv) -> Self {
        self.reference = reference;
        self.reference_div = div;
        self
    }

    pub fn edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    pub fn error_action(mut self, action: ErrorAction) -> Self {
        self.error_action = action;
        self
    }

    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: ClockSource::Hrc,
            target_div: TargetDiv::Div1,
            reference: Reference::Internal(ClockSource::Lrc),
            reference_div: ReferenceDiv::Div32,
            edge: Edge::Rising,
            filter: Filter::Off,
            window: Window {
                lower: 0,
                upper: 0xFFFF,
            },
            error_action: ErrorAction::None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Interrupt events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Count outside the window
    Error,
    /// Measurement finished
    End,
    /// Counter overflow
    Overflow,
}

impl Event {
    fn enable(self) -> Rier {
        match self {
            Event::Error => Rier::ERRIE,
            Event::End => Rier::MENDIE,
            Event::Overflow => Rier::OVFIE,
        }
    }
}

pub struct Fcm<FCM> {
    fcm: FCM,
    timeout: u32,
}

impl<FCM> Fcm<FCM>
where
    FCM: Deref<Target = RegisterBlock>,
{
    /// Stops any measurement and applies `config`. Returns
    /// [`Error::InvalidParameter`] if the window is inverted.
    pub fn new(fcm: FCM, config: Config) -> Result<Self> {
        if config.window.lower > config.window.upper {
            return Err(Error::InvalidParameter);
        }
        fcm.str.write(0);

        fcm.mccr.write_field(Mccr::MCKS, config.target as u32);
        fcm.mccr.write_field(Mccr::MDIVS, config.target_div as u32);

        fcm.rccr.write(0);
        match config.reference {
            Reference::Internal(source) => {
                fcm.rccr.set(Rccr::INEXS);
                fcm.rccr.write_field(Rccr::RCKS, source as u32);
            }
            Reference::External => {
                fcm.rccr.set(Rccr::EXREFE);
                fcm.rccr.write_field(Rccr::EDGES, config.edge as u32);
                fcm.rccr.write_field(Rccr::DNFS, config.filter as u32);
            }
        }
        fcm.rccr.write_field(Rccr::RDIVS, config.reference_div as u32);

        fcm.lvr.write(u32::from(config.window.lower));
        fcm.uvr.write(u32::from(config.window.upper));

        let mut rier = Rier::empty();
        match config.error_action {
            ErrorAction::None => {}
            ErrorAction::Interrupt => rier |= Rier::ERRE,
            ErrorAction::Reset => rier |= Rier::ERRE | Rier::ERRINTRS,
        }
        fcm.rier.write_flags(rier);
        fcm.clr.write_flags(Sr::all());

        Ok(Fcm {
            fcm,
            timeout: config.timeout,
        })
    }

    pub fn start(&mut self) {
        self.fcm.str.set(Str::START);
    }

    pub fn stop(&mut self) {
        self.fcm.str.clear(Str::START);
    }

    /// Count of the last finished measurement
    pub fn counter(&self) -> u16 {
        self.fcm.cntr.read() as u16
    }

    pub fn flags(&self) -> Sr {
        self.fcm.sr.flags()
    }

    pub fn clear_flags(&mut self, flags: Sr) {
        self.fcm.clr.write_flags(flags);
    }

    pub fn listen(&mut self, event: Event) {
        self.fcm.rier.set(event.enable());
    }

    pub fn unlisten(&mut self, event: Event) {
        self.fcm.rier.clear(event.enable());
    }

    /// Runs one measurement and returns the count.
    ///
    /// A count outside the window or a counter overflow returns
    /// [`Error::Error`]; a measurement that does not finish within the budget
    /// returns [`Error::Timeout`]. The unit is stopped in every case.
    pub fn measure(&mut self) -> Result<u16> {
        self.clear_flags(Sr::all());
        self.start();

        let sr = &self.fcm.sr;
        let done = poll::wait(self.timeout, || sr.flags::<Sr>().intersects(Sr::all()));
        let flags = self.flags();
        self.stop();
        done?;

        if flags.intersects(Sr::ERRF | Sr::OVF) {
            warn!("fcm: measurement out of window");
            self.clear_flags(flags);
            return Err(Error::Error);
        }
        self.clear_flags(flags);
        Ok(self.counter())
    }

    pub fn free(self) -> FCM {
        self.fcm.str.write(0);
        self.fcm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmu::HRC;
    use crate::pac::detached;

    #[test]
    fn window_from_frequencies() {
        // 32 MHz counted over 32 periods of 32.768 kHz is 31250 edges.
        let window =
            Window::from_frequencies(HRC, TargetDiv::Div1, Hertz(32_768), ReferenceDiv::Div32, 10)
                .unwrap();
        assert_eq!(window, Window { lower: 28_125, upper: 34_375 });

        assert_eq!(
            Window::from_frequencies(HRC, TargetDiv::Div1, Hertz(32_768), ReferenceDiv::Div128, 0),
            Err(Error::InvalidParameter)
        );
        assert_eq!(
            Window::from_frequencies(HRC, TargetDiv::Div1, Hertz(0), ReferenceDiv::Div32, 0),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn inverted_windows_are_rejected() {
        let regs: RegisterBlock = detached();
        let config = Config::default().window(Window { lower: 10, upper: 9 });
        assert!(matches!(Fcm::new(&regs, config), Err(Error::InvalidParameter)));
    }

    #[test]
    fn external_reference_is_programmed() {
        let regs: RegisterBlock = detached();
        Fcm::new(
            &regs,
            Config::default()
                .reference(Reference::External, ReferenceDiv::Div1024)
                .edge(Edge::Both)
                .error_action(ErrorAction::Reset),
        )
        .unwrap();

        assert!(regs.rccr.is_set(Rccr::EXREFE));
        assert!(!regs.rccr.is_set(Rccr::INEXS));
        assert_eq!(regs.rccr.read_field(Rccr::EDGES), 2);
        assert_eq!(regs.rccr.read_field(Rccr::RDIVS), 2);
        assert!(regs.rier.is_set(Rier::ERRE | Rier::ERRINTRS));
    }

    #[test]
    fn measure_returns_the_count() {
        let regs: RegisterBlock = detached();
        let mut fcm = Fcm::new(&regs, Config::default().timeout(8)).unwrap();

        assert_eq!(fcm.measure(), Err(Error::Timeout));
        assert!(!regs.str.is_set(Str::START));

        regs.sr.write_flags(Sr::MENDF);
        regs.cntr.write(31_250);
        assert_eq!(fcm.measure(), Ok(31_250));

        regs.sr.write_flags(Sr::MENDF | Sr::ERRF);
        assert_eq!(fcm.measure(), Err(Error::Error));
    }
}
