// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Oscillator calibration against a reference clock and the system clock.
//!
//! An external oscillator is counted in hardware: every rising edge of its
//! signal is routed through an edge channel and an interconnect channel into
//! a timer running in counter mode. Two monitors capture that counter once
//! per nominal second, one on the edges of an external reference (e.g. a GPS
//! 1PPS output) and one on a compare match of a second timer ticking from the
//! system clock. The difference between successive captures is the
//! oscillator frequency as seen by that reference, which the measurement
//! aggregator turns into a deviation in parts per billion.
//!
//! ```text
//!   osc pin --edge--> PPI --> COUNT    pulse counter (TIMER, counter mode)
//!   ref pin --edge--> PPI --> CAPTURE[a]        |
//!   sys TIMER compare --> PPI --> CAPTURE[b]    |
//!                                               v
//!             edge / compare interrupt -> monitor -> aggregator -> client
//! ```

#![no_std]
#![forbid(unsafe_code)]

pub mod average;
pub mod calibrator;
pub mod component;
pub mod config;
pub mod console;
pub mod hil;
pub mod lease;
pub mod log;
pub mod measurement;
pub mod pulse_counter;
pub mod reference_monitor;
pub mod system_clock_monitor;

#[cfg(test)]
mod test;

pub use crate::calibrator::{Calibrator, ClockInput, Configuration, State};
pub use crate::component::CalibratorComponent;
pub use crate::console::CalibratorConsole;
pub use crate::measurement::{Observation, ObservationClient, Source};
