// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HAL for the HC32M423 family of microcontrollers
//!
//! This is an implementation of the [`embedded-hal`] traits for the HC32M423 family of
//! microcontrollers, together with drivers for the SPI NOR flash and I2C EEPROM fitted on the
//! evaluation board.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//!
//! # Usage
//!
//! ## Commonly used setup
//! Almost all peripherals need their function clock gate opened in `PWC`, and the drivers that
//! derive a bit rate need the frozen bus frequencies. The following code shows how to set those up
//!
//! ```ignore
//! // Get access to the device specific peripherals
//! let dp = pac::Peripherals::take().unwrap();
//!
//! // Take ownership over the raw CMU and PWC devices and convert them into the corresponding HAL
//! // structs.
//! let mut cmu = dp.CMU.constrain(dp.PWC);
//!
//! // Freeze the configuration of all the clocks in the system and store the frozen frequencies in
//! // `clocks`
//! let clocks = cmu.cfgr.pclk1_div(ClockDiv::Div2).freeze();
//!
//! // Open the function clock of a peripheral before handing it to its driver
//! USART1::enable(&mut cmu.fcg);
//! let serial = Serial::new(dp.USART1, Config::default(), clocks)?;
//! ```
//!
//! ## Blocking operations
//!
//! Operations that wait on the hardware poll a status flag a bounded number of times, given in
//! each driver's configuration, and return [`Error::Timeout`] when the budget runs out.
//!
//! ## Optional features
//!
//! - `defmt`: `defmt::Format` for the public types and driver diagnostics through `defmt`.

#![cfg_attr(not(test), no_std)]
#![deny(rustdoc::broken_intra_doc_links)]

#[macro_use]
mod fmt;

pub mod pac;

pub mod cmu;
pub mod components;
pub mod crc;
pub mod delay;
pub mod error;
pub mod fcm;
pub mod gpio;
pub mod i2c;
pub mod interrupt;
pub mod poll;
pub mod prelude;
pub mod rmu;
pub mod serial;
pub mod spi;
pub mod time;
pub mod timer0;
pub mod timerb;
pub mod watchdog;

pub use error::{Error, Result};
