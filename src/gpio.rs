// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # General Purpose I/Os
//!
//! Pins are grouped in ports of eight. Each pin carries its own control and
//! function-select registers, guarded by a single write-protect register, so
//! every mode change goes through the opaque [`Pcr`] handle returned by
//! [`GpioExt::split`].
//!
//! ## Modes
//!
//! - **Alternate**: pin handed to a peripheral function. The const parameter
//!   is the function-select number; `MODE` picks push-pull or open-drain.
//! - **Analog**: digital input disabled.
//! - **Input**: floating or pulled up.
//! - **Output**: push-pull or open-drain.

use core::convert::Infallible;
use core::marker::PhantomData;

use crate::pac::gpio::{Pcr as PcrBits, Pfsr, Pwpr, PWPR_KEY};
use crate::pac::GPIO;
use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

/// Output drive capability
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drive {
    Low = 0b00,
    Medium = 0b01,
    High = 0b10,
}

pub trait PinExt {
    type Mode;

    /// Return pin number
    fn pin_id(&self) -> u8;

    /// Return port number
    fn port_id(&self) -> u8;
}

/// Allow setting the drive capability of an IO pin
///
/// Initially all pins are set to low drive
pub trait OutputDrive {
    fn set_drive(&mut self, pcr: &mut Pcr, drive: Drive);
}

/// Extension trait to split the GPIO peripheral in independent pins
pub trait GpioExt {
    /// The type to split the GPIO into
    type Parts;

    /// Splits the GPIO block into independent pins and the configuration handle
    fn split(self) -> Self::Parts;
}

/// Marker trait for active states.
pub trait Active {}

/// Input mode (type state)
#[derive(Default)]
pub struct Input<MODE = Floating> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Input<MODE> {}

/// Floating input (type state)
#[derive(Default)]
pub struct Floating;

/// Pulled up input (type state)
#[derive(Default)]
pub struct PullUp;

/// Output mode (type state)
#[derive(Default)]
pub struct Output<MODE = PushPull> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Output<MODE> {}

/// Push pull output (type state)
#[derive(Default)]
pub struct PushPull;

/// Open drain output (type state)
#[derive(Default)]
pub struct OpenDrain;

/// Analog mode (type state)
#[derive(Default)]
pub struct Analog;
impl Active for Analog {}

/// Peripheral function `F` (type state)
#[derive(Default)]
pub struct Alternate<const F: u8, MODE = PushPull> {
    _mode: PhantomData<MODE>,
}
impl<const F: u8, MODE> Active for Alternate<F, MODE> {}

/// Digital output pin state
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PinState {
    High,
    Low,
}

mod sealed {
    pub trait PinMode: Default {
        /// PCR bits among POUTE, NOD, PUU and DDIS
        const PCR: u16;
        /// Function-select number
        const FUNC: u8;
    }
}

use sealed::PinMode;

/// Function number of plain GPIO.
pub const FUNC_GPIO: u8 = 0;

/// Opaque pin configuration handle
pub struct Pcr(());

impl Pcr {
    /// Runs `f` with the pin configuration registers unlocked.
    #[inline(always)]
    fn unlocked(&mut self, f: impl FnOnce(&crate::pac::gpio::RegisterBlock)) {
        // NOTE(unsafe) `Pcr` is unique and owns the configuration registers
        let gpio = unsafe { &*GPIO::ptr() };
        gpio.pwpr.write((PWPR_KEY << 8) | Pwpr::WE.bits());
        f(gpio);
        gpio.pwpr.write(PWPR_KEY << 8);
    }
}

macro_rules! gpio {
    ($($PXi:ident: ($pxi:ident, $port:literal, $pin:literal),)+) => {
        /// GPIO parts
        pub struct Parts {
            /// Opaque pin configuration handle
            pub pcr: Pcr,
            $(
                /// Pin
                pub $pxi: $PXi,
            )+
        }

        $(
            pub type $PXi<MODE = Input<Floating>> = Pin<$port, $pin, MODE>;
        )+

        impl GpioExt for GPIO {
            type Parts = Parts;

            fn split(self) -> Parts {
                Parts {
                    pcr: Pcr(()),
                    $(
                        $pxi: $PXi::new(),
                    )+
                }
            }
        }
    }
}

/// Generic pin type
///
/// - `P` is the port number, from `0` to `7`.
/// - `N` is the pin number, from `0` to `7`.
/// - `MODE` is one of the pin modes (see [Modes](crate::gpio#modes) section).
pub struct Pin<const P: u8, const N: u8, MODE = Input<Floating>> {
    _mode: PhantomData<MODE>,
}

impl<const P: u8, const N: u8, MODE: Default> Pin<P, N, MODE> {
    fn new() -> Self {
        Self { _mode: PhantomData }
    }
}

impl<const P: u8, const N: u8, MODE> PinExt for Pin<P, N, MODE> {
    type Mode = MODE;

    #[inline(always)]
    fn pin_id(&self) -> u8 {
        N
    }

    #[inline(always)]
    fn port_id(&self) -> u8 {
        P
    }
}

// Internal helper functions

// NOTE: The functions in this impl block are "safe", but they
// are callable when the pin is in modes where they don't make
// sense.
impl<const P: u8, const N: u8, MODE> Pin<P, N, MODE> {
    #[inline(always)]
    fn port() -> &'static crate::pac::gpio::Port {
        // NOTE(unsafe) only the set/reset/toggle and data registers of this
        // pin's port are reached through here
        unsafe { &(*GPIO::ptr()).port[P as usize] }
    }

    #[inline(always)]
    fn _set_state(&mut self, state: PinState) {
        match state {
            PinState::High => self._set_high(),
            PinState::Low => self._set_low(),
        }
    }

    #[inline(always)]
    fn _set_high(&mut self) {
        // NOTE atomic write to a stateless register
        Self::port().posr.write(1 << N)
    }

    #[inline(always)]
    fn _set_low(&mut self) {
        // NOTE atomic write to a stateless register
        Self::port().porr.write(1 << N)
    }

    #[inline(always)]
    fn _toggle(&mut self) {
        Self::port().potr.write(1 << N)
    }

    #[inline(always)]
    fn _is_set_low(&self) -> bool {
        Self::port().podr.read() & (1 << N) == 0
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        Self::port().pidr.read() & (1 << N) == 0
    }

    fn mode<M: PinMode>(&mut self, pcr: &mut Pcr) {
        pcr.unlocked(|gpio| {
            let cfg = &gpio.pin[P as usize][N as usize];
            cfg.pcr.modify(|r| {
                let mask = (PcrBits::POUTE | PcrBits::NOD | PcrBits::PUU | PcrBits::DDIS).bits();
                (r & !mask) | M::PCR
            });
            cfg.pfsr.write_field(Pfsr::FSEL, M::FUNC as u16);
        });
    }
}

impl<const P: u8, const N: u8, MODE> Pin<P, N, Output<MODE>> {
    #[inline]
    pub fn set_high(&mut self) {
        self._set_high()
    }

    #[inline]
    pub fn set_low(&mut self) {
        self._set_low()
    }

    #[inline(always)]
    pub fn get_state(&self) -> PinState {
        if self._is_set_low() {
            PinState::Low
        } else {
            PinState::High
        }
    }

    #[inline(always)]
    pub fn set_state(&mut self, state: PinState) {
        self._set_state(state)
    }

    #[inline]
    pub fn is_set_high(&self) -> bool {
        !self._is_set_low()
    }

    #[inline]
    pub fn is_set_low(&self) -> bool {
        self._is_set_low()
    }

    #[inline]
    pub fn toggle(&mut self) {
        self._toggle()
    }
}

impl<const P: u8, const N: u8, MODE> OutputPin for Pin<P, N, Output<MODE>> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_high();
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_low();
        Ok(())
    }
}

impl<const P: u8, const N: u8, MODE> StatefulOutputPin for Pin<P, N, Output<MODE>> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_low())
    }
}

impl<const P: u8, const N: u8, MODE> ToggleableOutputPin for Pin<P, N, Output<MODE>> {
    type Error = Infallible;

    #[inline(always)]
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.toggle();
        Ok(())
    }
}

impl<const P: u8, const N: u8, MODE> Pin<P, N, Input<MODE>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<const P: u8, const N: u8, MODE> InputPin for Pin<P, N, Input<MODE>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

impl<const P: u8, const N: u8> Pin<P, N, Output<OpenDrain>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<const P: u8, const N: u8> InputPin for Pin<P, N, Output<OpenDrain>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

impl<const P: u8, const N: u8, MODE> Pin<P, N, MODE>
where
    MODE: Active,
{
    /// Hands the pin to peripheral function `F` as a push-pull pin.
    #[inline]
    pub fn into_alternate<const F: u8>(mut self, pcr: &mut Pcr) -> Pin<P, N, Alternate<F>> {
        self.mode::<Alternate<F, PushPull>>(pcr);
        Pin::new()
    }

    /// Hands the pin to peripheral function `F` as an open-drain pin.
    #[inline]
    pub fn into_alternate_open_drain<const F: u8>(
        mut self,
        pcr: &mut Pcr,
    ) -> Pin<P, N, Alternate<F, OpenDrain>> {
        self.mode::<Alternate<F, OpenDrain>>(pcr);
        Pin::new()
    }

    /// Configures the pin to operate as a floating input pin
    #[inline]
    pub fn into_floating_input(mut self, pcr: &mut Pcr) -> Pin<P, N, Input<Floating>> {
        self.mode::<Input<Floating>>(pcr);
        Pin::new()
    }

    /// Configures the pin to operate as a pulled up input pin
    #[inline]
    pub fn into_pull_up_input(mut self, pcr: &mut Pcr) -> Pin<P, N, Input<PullUp>> {
        self.mode::<Input<PullUp>>(pcr);
        Pin::new()
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_open_drain_output(self, pcr: &mut Pcr) -> Pin<P, N, Output<OpenDrain>> {
        self.into_open_drain_output_with_state(pcr, PinState::Low)
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_open_drain_output_with_state(
        mut self,
        pcr: &mut Pcr,
        initial_state: PinState,
    ) -> Pin<P, N, Output<OpenDrain>> {
        self._set_state(initial_state);
        self.mode::<Output<OpenDrain>>(pcr);
        Pin::new()
    }

    /// Configures the pin to operate as an push-pull output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_push_pull_output(self, pcr: &mut Pcr) -> Pin<P, N, Output<PushPull>> {
        self.into_push_pull_output_with_state(pcr, PinState::Low)
    }

    /// Configures the pin to operate as an push-pull output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_push_pull_output_with_state(
        mut self,
        pcr: &mut Pcr,
        initial_state: PinState,
    ) -> Pin<P, N, Output<PushPull>> {
        self._set_state(initial_state);
        self.mode::<Output<PushPull>>(pcr);
        Pin::new()
    }

    /// Configures the pin to operate as an analog input pin
    #[inline]
    pub fn into_analog(mut self, pcr: &mut Pcr) -> Pin<P, N, Analog> {
        self.mode::<Analog>(pcr);
        Pin::new()
    }
}

impl<const P: u8, const N: u8, MODE> Pin<P, N, MODE> {
    #[inline(always)]
    fn _set_drive(&mut self, pcr: &mut Pcr, drive: Drive) {
        pcr.unlocked(|gpio| {
            gpio.pin[P as usize][N as usize]
                .pcr
                .write_field(PcrBits::DRV, drive as u16)
        });
    }
}

impl<const P: u8, const N: u8, MODE> OutputDrive for Pin<P, N, Output<MODE>> {
    fn set_drive(&mut self, pcr: &mut Pcr, drive: Drive) {
        self._set_drive(pcr, drive)
    }
}

impl<const P: u8, const N: u8, const F: u8, MODE> OutputDrive for Pin<P, N, Alternate<F, MODE>> {
    fn set_drive(&mut self, pcr: &mut Pcr, drive: Drive) {
        self._set_drive(pcr, drive)
    }
}

impl PinMode for Input<Floating> {
    const PCR: u16 = 0;
    const FUNC: u8 = FUNC_GPIO;
}

impl PinMode for Input<PullUp> {
    const PCR: u16 = PcrBits::PUU.bits();
    const FUNC: u8 = FUNC_GPIO;
}

impl PinMode for Output<OpenDrain> {
    const PCR: u16 = PcrBits::POUTE.bits() | PcrBits::NOD.bits();
    const FUNC: u8 = FUNC_GPIO;
}

impl PinMode for Output<PushPull> {
    const PCR: u16 = PcrBits::POUTE.bits();
    const FUNC: u8 = FUNC_GPIO;
}

impl PinMode for Analog {
    const PCR: u16 = PcrBits::DDIS.bits();
    const FUNC: u8 = FUNC_GPIO;
}

impl<const F: u8> PinMode for Alternate<F, PushPull> {
    const PCR: u16 = 0;
    const FUNC: u8 = F;
}

impl<const F: u8> PinMode for Alternate<F, OpenDrain> {
    const PCR: u16 = PcrBits::NOD.bits();
    const FUNC: u8 = F;
}

gpio!(
    P00: (p00, 0, 0),
    P01: (p01, 0, 1),
    P02: (p02, 0, 2),
    P10: (p10, 1, 0),
    P11: (p11, 1, 1),
    P12: (p12, 1, 2),
    P13: (p13, 1, 3),
    P14: (p14, 1, 4),
    P15: (p15, 1, 5),
    P16: (p16, 1, 6),
    P17: (p17, 1, 7),
    P20: (p20, 2, 0),
    P21: (p21, 2, 1),
    P22: (p22, 2, 2),
    P23: (p23, 2, 3),
    P24: (p24, 2, 4),
    P25: (p25, 2, 5),
    P26: (p26, 2, 6),
    P27: (p27, 2, 7),
    P30: (p30, 3, 0),
    P31: (p31, 3, 1),
    P32: (p32, 3, 2),
    P33: (p33, 3, 3),
    P40: (p40, 4, 0),
    P41: (p41, 4, 1),
    P42: (p42, 4, 2),
    P43: (p43, 4, 3),
    P44: (p44, 4, 4),
    P45: (p45, 4, 5),
    P46: (p46, 4, 6),
    P47: (p47, 4, 7),
    P50: (p50, 5, 0),
    P51: (p51, 5, 1),
    P52: (p52, 5, 2),
    P60: (p60, 6, 0),
    P61: (p61, 6, 1),
    P62: (p62, 6, 2),
    P63: (p63, 6, 3),
    P70: (p70, 7, 0),
    P71: (p71, 7, 1),
    P72: (p72, 7, 2),
    P73: (p73, 7, 3),
    P74: (p74, 7, 4),
    P75: (p75, 7, 5),
    P76: (p76, 7, 6),
    P77: (p77, 7, 7),
);
