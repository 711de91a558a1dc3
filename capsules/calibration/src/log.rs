// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Prints observations on the kernel debug console.

use core::fmt;

use kernel::debug;

use crate::measurement::{Observation, ObservationClient};

/// Formats an integer with `,` between groups of three digits.
#[derive(Copy, Clone)]
pub struct Grouped(pub i64);

impl fmt::Display for Grouped {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut digits = [0u8; 20];
        let mut len = 0;
        let mut value = self.0.unsigned_abs();
        loop {
            digits[len] = b'0' + (value % 10) as u8;
            len += 1;
            value /= 10;
            if value == 0 {
                break;
            }
        }

        if self.0 < 0 {
            f.write_str("-")?;
        }
        for i in (0..len).rev() {
            f.write_fmt(format_args!("{}", digits[i] as char))?;
            if i != 0 && i % 3 == 0 {
                f.write_str(",")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} clock: freq {} avg {} | target {} offset {} ppb {} avg {}",
            self.source.name(),
            Grouped(self.freq as i64),
            Grouped(self.avg_freq as i64),
            Grouped(self.target_guess as i64),
            Grouped(self.offset as i64),
            Grouped(self.ppb as i64),
            Grouped(self.avg_ppb as i64),
        )
    }
}

/// Observation client that writes every observation with `debug!`.
pub struct ObservationLogger {}

impl ObservationLogger {
    pub const fn new() -> ObservationLogger {
        ObservationLogger {}
    }
}

impl ObservationClient for ObservationLogger {
    fn observation(&self, observation: &Observation) {
        debug!("{}", observation);
    }
}
