// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Compile-time calibration parameters.

/// Tunables shared by every calibration session.
pub struct Config {
    /// Number of samples held by each moving average.
    pub average_window: usize,

    /// Calibration targets are assumed to be multiples of this frequency.
    /// A measured frequency is snapped to the nearest multiple to find the
    /// frequency the oscillator was meant to run at.
    pub target_step_hz: u32,

    /// Ticks of the system clock timer in one nominal second. The timer runs
    /// from the 16 MHz high frequency clock with no prescaling.
    pub system_clock_ticks: u32,
}

pub const CONFIG: Config = Config {
    average_window: 5,
    target_step_hz: 10_000,
    system_clock_ticks: 16_000_000,
};

/// Window of the moving averages, usable as a const generic argument.
pub const AVERAGE_WINDOW: usize = CONFIG.average_window;
