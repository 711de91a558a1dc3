// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Fixed-window moving average.
//!
//! Keeps the last `N` samples in a circular buffer together with their
//! running sum. Once the window is full each new sample overwrites the
//! oldest one. The reported average is the mean of the samples currently
//! held, rounded half away from zero.

use core::cell::Cell;
use core::marker::PhantomData;

/// Integer types a [`MovingAverage`] can hold.
pub trait Sample: Copy {
    fn widen(self) -> i64;
    fn narrow(value: i64) -> Self;
}

impl Sample for u32 {
    fn widen(self) -> i64 {
        self as i64
    }

    fn narrow(value: i64) -> Self {
        value.clamp(0, u32::MAX as i64) as u32
    }
}

impl Sample for i32 {
    fn widen(self) -> i64 {
        self as i64
    }

    fn narrow(value: i64) -> Self {
        value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

/// `numerator / denominator`, rounded half away from zero.
///
/// `denominator` must not be zero.
pub fn div_round(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if 2 * remainder.abs() >= denominator.abs() {
        quotient + numerator.signum() * denominator.signum()
    } else {
        quotient
    }
}

pub struct MovingAverage<T: Sample, const N: usize> {
    samples: Cell<[i64; N]>,
    len: Cell<usize>,
    next: Cell<usize>,
    sum: Cell<i64>,
    average: Cell<i64>,
    _sample: PhantomData<T>,
}

impl<T: Sample, const N: usize> MovingAverage<T, N> {
    pub const fn new() -> MovingAverage<T, N> {
        MovingAverage {
            samples: Cell::new([0; N]),
            len: Cell::new(0),
            next: Cell::new(0),
            sum: Cell::new(0),
            average: Cell::new(0),
            _sample: PhantomData,
        }
    }

    /// Add `value` and return the new average.
    pub fn add_sample(&self, value: T) -> T {
        if N == 0 {
            return value;
        }

        let value = value.widen();
        let mut samples = self.samples.get();
        let mut sum = self.sum.get();
        let len = self.len.get();

        if len < N {
            samples[len] = value;
            self.len.set(len + 1);
        } else {
            // The window is full, `next` indexes the oldest sample.
            let next = self.next.get();
            sum -= samples[next];
            samples[next] = value;
            self.next.set((next + 1) % N);
        }
        sum += value;

        self.samples.set(samples);
        self.sum.set(sum);
        self.average.set(div_round(sum, self.len.get() as i64));
        T::narrow(self.average.get())
    }

    /// Average of the samples held, or zero before the first sample.
    pub fn average(&self) -> T {
        T::narrow(self.average.get())
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }

    pub fn reset(&self) {
        self.samples.set([0; N]);
        self.len.set(0);
        self.next.set(0);
        self.sum.set(0);
        self.average.set(0);
    }
}
