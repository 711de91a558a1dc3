// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

pub const GPIOTE: u32 = 6;
pub const TIMER0: u32 = 8;
pub const TIMER1: u32 = 9;
pub const TIMER2: u32 = 10;
pub const TIMER3: u32 = 26;
pub const TIMER4: u32 = 27;
