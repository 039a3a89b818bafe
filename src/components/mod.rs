// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drivers for devices on the evaluation board
//!
//! These are written against the `embedded-hal` bus traits, so they work
//! with the drivers of this crate as well as with any other implementation.

pub mod eeprom;
pub mod paged;
pub mod w25qxx;
