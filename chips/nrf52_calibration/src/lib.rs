// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! nRF52 channels for oscillator calibration.
//!
//! Implements the calibration channel registry on top of the nRF52 TIMER,
//! GPIOTE and PPI blocks. A board creates one [`registry::Nrf52Channels`],
//! hands it to the calibration capsule, and forwards the TIMER and GPIOTE
//! interrupts to it through its `InterruptService` implementation.

#![no_std]

pub mod gpio;
pub mod gpiote;
pub mod interrupts;
pub mod ppi;
pub mod registry;
pub mod timer;

pub use crate::registry::Nrf52Channels;
