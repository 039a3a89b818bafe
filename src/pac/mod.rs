// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Peripheral access layer for the HC32M423
//!
//! Register blocks are `#[repr(C)]` structs of [`Reg`] cells laid over the
//! peripheral's base address. Each peripheral is a zero-sized singleton that
//! dereferences to its block; [`Peripherals::take`] hands them out once.

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;

mod reg;
pub use reg::{Reg, RegisterValue};

pub mod cmu;
pub mod crc;
pub mod fcm;
pub mod gpio;
pub mod i2c;
pub mod intc;
pub mod pwc;
pub mod rmu;
pub mod spi;
pub mod swdt;
pub mod tmr0;
pub mod tmrb;
pub mod usart;

macro_rules! peripheral {
    ($(#[$meta:meta])* $NAME:ident: $block:path = $addr:literal) => {
        $(#[$meta])*
        pub struct $NAME {
            _marker: PhantomData<*const ()>,
        }

        unsafe impl Send for $NAME {}

        impl $NAME {
            /// Pointer to the register block
            pub const PTR: *const $block = $addr as *const _;

            /// Return the pointer to the register block
            #[inline(always)]
            pub const fn ptr() -> *const $block {
                Self::PTR
            }

            /// Unchecked access to the peripheral.
            ///
            /// # Safety
            ///
            /// Ensure that the new instance of the peripheral cannot be used in a way that may
            /// race with any existing instance, for example by only accessing read-only or
            /// write-only registers, or by consuming the original peripheral and using critical
            /// sections to coordinate access between multiple new instances.
            #[inline]
            pub unsafe fn steal() -> Self {
                Self {
                    _marker: PhantomData,
                }
            }
        }

        impl Deref for $NAME {
            type Target = $block;

            #[inline(always)]
            fn deref(&self) -> &Self::Target {
                unsafe { &*Self::PTR }
            }
        }

        impl fmt::Debug for $NAME {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.debug_struct(stringify!($NAME)).finish()
            }
        }
    };
}

peripheral!(
    /// Cyclic redundancy check unit
    CRC: crc::RegisterBlock = 0x4000_8C00
);
peripheral!(
    /// Serial peripheral interface
    SPI: spi::RegisterBlock = 0x4001_C000
);
peripheral!(
    /// USART channel 1
    USART1: usart::RegisterBlock = 0x4001_D000
);
peripheral!(
    /// USART channel 2
    USART2: usart::RegisterBlock = 0x4001_D400
);
peripheral!(
    /// USART channel 3
    USART3: usart::RegisterBlock = 0x4001_D800
);
peripheral!(
    /// USART channel 4
    USART4: usart::RegisterBlock = 0x4001_DC00
);
peripheral!(
    /// Timer0, two 16-bit channels
    TMR0: tmr0::RegisterBlock = 0x4002_4000
);
peripheral!(
    /// TimerB, 16-bit counter with four compare/capture channels
    TMRB: tmrb::RegisterBlock = 0x4002_5000
);
peripheral!(
    /// Power controller, function clock gates
    PWC: pwc::RegisterBlock = 0x4004_8000
);
peripheral!(
    /// Frequency clock measurement
    FCM: fcm::RegisterBlock = 0x4004_8400
);
peripheral!(
    /// Special watchdog timer
    SWDT: swdt::RegisterBlock = 0x4004_9400
);
peripheral!(
    /// Clock controller
    CMU: cmu::RegisterBlock = 0x4004_C000
);
peripheral!(
    /// Reset management unit
    RMU: rmu::RegisterBlock = 0x4004_C0F8
);
peripheral!(
    /// Inter-integrated circuit
    I2C: i2c::RegisterBlock = 0x4004_E000
);
peripheral!(
    /// Interrupt controller
    INTC: intc::RegisterBlock = 0x4005_1000
);
peripheral!(
    /// General purpose I/O
    GPIO: gpio::RegisterBlock = 0x4005_3800
);

static mut DEVICE_PERIPHERALS: bool = false;

/// All the peripherals
#[allow(non_snake_case)]
pub struct Peripherals {
    pub CRC: CRC,
    pub SPI: SPI,
    pub USART1: USART1,
    pub USART2: USART2,
    pub USART3: USART3,
    pub USART4: USART4,
    pub TMR0: TMR0,
    pub TMRB: TMRB,
    pub PWC: PWC,
    pub FCM: FCM,
    pub SWDT: SWDT,
    pub CMU: CMU,
    pub RMU: RMU,
    pub I2C: I2C,
    pub INTC: INTC,
    pub GPIO: GPIO,
}

impl Peripherals {
    /// Returns all the peripherals *once*
    #[inline]
    pub fn take() -> Option<Self> {
        cortex_m::interrupt::free(|_| {
            if unsafe { DEVICE_PERIPHERALS } {
                None
            } else {
                Some(unsafe { Peripherals::steal() })
            }
        })
    }

    /// Unchecked version of `Peripherals::take`
    ///
    /// # Safety
    ///
    /// Each of the returned peripherals must be used at most once.
    #[inline]
    pub unsafe fn steal() -> Self {
        DEVICE_PERIPHERALS = true;
        Peripherals {
            CRC: CRC::steal(),
            SPI: SPI::steal(),
            USART1: USART1::steal(),
            USART2: USART2::steal(),
            USART3: USART3::steal(),
            USART4: USART4::steal(),
            TMR0: TMR0::steal(),
            TMRB: TMRB::steal(),
            PWC: PWC::steal(),
            FCM: FCM::steal(),
            SWDT: SWDT::steal(),
            CMU: CMU::steal(),
            RMU: RMU::steal(),
            I2C: I2C::steal(),
            INTC: INTC::steal(),
            GPIO: GPIO::steal(),
        }
    }
}

/// Selectable NVIC lines. Each line is routed to one event source through
/// the INTC selector registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Interrupt {
    IRQ000 = 0,
    IRQ001 = 1,
    IRQ002 = 2,
    IRQ003 = 3,
    IRQ004 = 4,
    IRQ005 = 5,
    IRQ006 = 6,
    IRQ007 = 7,
    IRQ008 = 8,
    IRQ009 = 9,
    IRQ010 = 10,
    IRQ011 = 11,
    IRQ012 = 12,
    IRQ013 = 13,
    IRQ014 = 14,
    IRQ015 = 15,
    IRQ016 = 16,
    IRQ017 = 17,
    IRQ018 = 18,
    IRQ019 = 19,
    IRQ020 = 20,
    IRQ021 = 21,
    IRQ022 = 22,
    IRQ023 = 23,
    IRQ024 = 24,
    IRQ025 = 25,
    IRQ026 = 26,
    IRQ027 = 27,
    IRQ028 = 28,
    IRQ029 = 29,
    IRQ030 = 30,
    IRQ031 = 31,
}

impl Interrupt {
    /// Number of selectable lines.
    pub const COUNT: usize = 32;

    /// Line number, as an index into the selector registers.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

unsafe impl cortex_m::interrupt::InterruptNumber for Interrupt {
    #[inline(always)]
    fn number(self) -> u16 {
        self as u16
    }
}

/// A register block backed by ordinary memory, for driving the drivers on
/// the host.
#[cfg(test)]
pub(crate) fn detached<T: Detached>() -> T {
    // SAFETY: `Detached` blocks consist only of volatile cells and byte
    // padding, for which the all-zero pattern is valid.
    unsafe { core::mem::zeroed() }
}

/// Implemented by register blocks that are plain `#[repr(C)]` aggregates of
/// integer cells.
#[cfg(test)]
pub(crate) unsafe trait Detached {}

#[cfg(test)]
macro_rules! detached {
    ($($block:path),+) => {
        $(unsafe impl Detached for $block {})+
    };
}

#[cfg(test)]
detached!(
    crc::RegisterBlock,
    spi::RegisterBlock,
    usart::RegisterBlock,
    tmr0::RegisterBlock,
    tmrb::RegisterBlock,
    pwc::RegisterBlock,
    fcm::RegisterBlock,
    swdt::RegisterBlock,
    cmu::RegisterBlock,
    rmu::RegisterBlock,
    i2c::RegisterBlock,
    intc::RegisterBlock,
    gpio::RegisterBlock
);
