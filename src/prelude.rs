// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub use crate::cmu::CmuExt as _hc32m423_hal_cmu_CmuExt;
pub use crate::cmu::Enable as _hc32m423_hal_cmu_Enable;
pub use crate::gpio::GpioExt as _hc32m423_hal_gpio_GpioExt;
pub use crate::gpio::OutputDrive as _hc32m423_hal_gpio_OutputDrive;
pub use crate::time::U32Ext as _hc32m423_hal_time_U32Ext;
pub use embedded_hal::prelude::*;
