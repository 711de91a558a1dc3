// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Turning pulse counter captures into frequency observations.
//!
//! Each monitor captures the free running pulse counter once per nominal
//! second. The difference between two successive captures is the number of
//! oscillator pulses in one second, i.e. the oscillator frequency in Hz as
//! measured against that monitor's time base.
//!
//! From that frequency the aggregator guesses the frequency the oscillator
//! was meant to produce, by snapping to the nearest multiple of
//! `CONFIG.target_step_hz`, and reports the offset from that target in Hz
//! and in parts per billion. Both the frequency and the ppb figure are also
//! smoothed with a moving average.

use core::cell::Cell;

use kernel::utilities::cells::OptionalCell;

use crate::average::{div_round, MovingAverage};
use crate::config::{AVERAGE_WINDOW, CONFIG};

/// Time base a sample was measured against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Edges of the external reference signal.
    Reference,
    /// Compare matches of a timer running from the system clock.
    SystemClock,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Reference => "Reference",
            Source::SystemClock => "System",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub source: Source,
    /// Pulses counted in one interval, in Hz.
    pub freq: u32,
    pub avg_freq: u32,
    /// Nearest plausible target frequency.
    pub target_guess: u32,
    /// `freq - target_guess`
    pub offset: i32,
    pub ppb: i32,
    pub avg_ppb: i32,
}

pub trait ObservationClient {
    fn observation(&self, observation: &Observation);
}

/// Round `freq` half away from zero to a multiple of `CONFIG.target_step_hz`.
///
/// Never returns zero, so the result can always be divided by. Frequencies
/// below half a step snap to one step.
pub fn target_guess(freq: u32) -> u32 {
    let step = CONFIG.target_step_hz as u64;
    let guess = (freq as u64 + step / 2) / step * step;
    if guess == 0 {
        step as u32
    } else if guess > u32::MAX as u64 {
        (guess - step) as u32
    } else {
        guess as u32
    }
}

/// Deviation of `offset` relative to `target`, in parts per billion.
pub fn parts_per_billion(offset: i64, target: u32) -> i32 {
    if target == 0 {
        return 0;
    }
    div_round(offset * 1_000_000_000, target as i64) as i32
}

/// Per-source running statistics.
pub struct MeasurementAggregator {
    source: Source,
    freq_average: MovingAverage<u32, AVERAGE_WINDOW>,
    ppb_average: MovingAverage<i32, AVERAGE_WINDOW>,
}

impl MeasurementAggregator {
    pub const fn new(source: Source) -> MeasurementAggregator {
        MeasurementAggregator {
            source,
            freq_average: MovingAverage::new(),
            ppb_average: MovingAverage::new(),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Fold one interval's pulse count into the statistics.
    pub fn add_sample(&self, freq: u32) -> Observation {
        let avg_freq = self.freq_average.add_sample(freq);

        let target_guess = target_guess(freq);
        let offset = freq as i64 - target_guess as i64;
        let ppb = parts_per_billion(offset, target_guess);
        let avg_ppb = self.ppb_average.add_sample(ppb);

        Observation {
            source: self.source,
            freq,
            avg_freq,
            target_guess,
            offset: offset as i32,
            ppb,
            avg_ppb,
        }
    }

    pub fn reset(&self) {
        self.freq_average.reset();
        self.ppb_average.reset();
    }
}

/// Tracks successive captures of the pulse counter.
///
/// A capture of zero means the counter has not seen a pulse yet, and the
/// first capture after a reset only establishes the baseline, so neither
/// produces a sample.
pub struct CaptureTracker {
    previous: Cell<u32>,
}

impl CaptureTracker {
    pub const fn new() -> CaptureTracker {
        CaptureTracker {
            previous: Cell::new(0),
        }
    }

    /// Record `value` and return the pulses since the previous capture.
    pub fn capture(&self, value: u32) -> Option<u32> {
        let previous = self.previous.replace(value);
        let delta = value.wrapping_sub(previous);
        if previous != 0 && value != 0 && delta != 0 {
            Some(delta)
        } else {
            None
        }
    }

    pub fn reset(&self) {
        self.previous.set(0);
    }
}

/// One tagged stream of observations: baseline tracking, aggregation and
/// delivery to the client.
pub struct SampleStream<'a> {
    tracker: CaptureTracker,
    aggregator: MeasurementAggregator,
    last: OptionalCell<Observation>,
    client: OptionalCell<&'a dyn ObservationClient>,
}

impl<'a> SampleStream<'a> {
    pub const fn new(source: Source) -> SampleStream<'a> {
        SampleStream {
            tracker: CaptureTracker::new(),
            aggregator: MeasurementAggregator::new(source),
            last: OptionalCell::empty(),
            client: OptionalCell::empty(),
        }
    }

    pub fn set_client(&self, client: &'a dyn ObservationClient) {
        self.client.set(client);
    }

    pub fn last_observation(&self) -> Option<Observation> {
        self.last.get()
    }

    /// Start over: no baseline, empty averages.
    pub fn reset(&self) {
        self.tracker.reset();
        self.aggregator.reset();
        self.last.clear();
    }

    /// Forget the last capture but keep the averages. Used when the counter
    /// was cleared under a running stream.
    pub fn drop_baseline(&self) {
        self.tracker.reset();
    }

    /// Handle a fresh capture of the pulse counter.
    pub fn capture(&self, value: u32) {
        if let Some(freq) = self.tracker.capture(value) {
            let observation = self.aggregator.add_sample(freq);
            self.last.set(observation);
            self.client.map(|client| client.observation(&observation));
        }
    }
}
