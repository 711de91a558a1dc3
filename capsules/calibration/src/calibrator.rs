// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Calibration session.
//!
//! Ties the pulse counter and both monitors together and switches the two
//! clock sources on and off around them.
//!
//! `start` enables the reference clock and the clock under calibration, then
//! starts the pulse counter, the reference monitor and the system clock
//! monitor, in that order. If any of them cannot get its hardware channels
//! the ones already started are stopped again in reverse order, the clocks
//! are switched back off and the session stays idle.
//!
//! `stop` undoes `start` in exact reverse order. It is a hard disarm: an
//! interrupt that was already pending may still deliver one last
//! observation.
//!
//! Misuse is reported rather than asserted: `start` while running returns
//! `ALREADY`, `stop` while idle returns `OFF`, and neither changes anything.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let configuration = Configuration {
//!     reference: ClockInput { pin: PinSelect::new(0, 4), control: gps },
//!     calibrate: ClockInput { pin: PinSelect::new(0, 3), control: si5351 },
//! };
//! let calibrator = static_init!(
//!     Calibrator<'static, nrf52_calibration::Nrf52Channels<'static>>,
//!     Calibrator::new(channels, configuration)
//! );
//! calibrator.set_client(logger);
//! calibrator.start()?;
//! ```

use core::cell::Cell;

use kernel::ErrorCode;

use crate::hil::{ChannelRegistry, ClockControl, PinSelect};
use crate::measurement::ObservationClient;
use crate::pulse_counter::PulseCounter;
use crate::reference_monitor::ReferenceMonitor;
use crate::system_clock_monitor::SystemClockMonitor;

/// A clock signal: the pin it arrives on and the switch for its source.
#[derive(Copy, Clone)]
pub struct ClockInput<'a> {
    pub pin: PinSelect,
    pub control: &'a dyn ClockControl,
}

#[derive(Copy, Clone)]
pub struct Configuration<'a> {
    /// The time reference, one rising edge per second.
    pub reference: ClockInput<'a>,
    /// The oscillator being measured.
    pub calibrate: ClockInput<'a>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
}

pub struct Calibrator<'a, R: ChannelRegistry<'a>> {
    configuration: Cell<Configuration<'a>>,
    state: Cell<State>,
    counter: PulseCounter<'a, R>,
    reference: ReferenceMonitor<'a, R>,
    system_clock: SystemClockMonitor<'a, R>,
}

impl<'a, R: ChannelRegistry<'a>> Calibrator<'a, R> {
    pub fn new(registry: &'a R, configuration: Configuration<'a>) -> Calibrator<'a, R> {
        Calibrator {
            configuration: Cell::new(configuration),
            state: Cell::new(State::Idle),
            counter: PulseCounter::new(registry),
            reference: ReferenceMonitor::new(registry),
            system_clock: SystemClockMonitor::new(registry),
        }
    }

    /// Replace the configuration. Only allowed while idle.
    pub fn set_configuration(&self, configuration: Configuration<'a>) -> Result<(), ErrorCode> {
        if self.state.get() == State::Running {
            return Err(ErrorCode::BUSY);
        }
        self.configuration.set(configuration);
        Ok(())
    }

    pub fn configuration(&self) -> Configuration<'a> {
        self.configuration.get()
    }

    /// Deliver observations from both monitors to `client`.
    pub fn set_client(&self, client: &'a dyn ObservationClient) {
        self.reference.set_client(client);
        self.system_clock.set_client(client);
    }

    pub fn state(&self) -> State {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == State::Running
    }

    pub fn pulse_counter(&self) -> &PulseCounter<'a, R> {
        &self.counter
    }

    pub fn reference_monitor(&self) -> &ReferenceMonitor<'a, R> {
        &self.reference
    }

    pub fn system_clock_monitor(&self) -> &SystemClockMonitor<'a, R> {
        &self.system_clock
    }

    /// Clear the pulse counter. Captures taken after this cannot be compared
    /// with the ones before, so both monitors start from a new baseline.
    pub fn clear_counter(&self) -> Result<(), ErrorCode> {
        self.counter.timer_clear()?;
        self.reference.drop_baseline();
        self.system_clock.drop_baseline();
        Ok(())
    }

    pub fn start(&'a self) -> Result<(), ErrorCode> {
        if self.state.get() == State::Running {
            return Err(ErrorCode::ALREADY);
        }

        let configuration = self.configuration.get();
        configuration.reference.control.enable();
        configuration.calibrate.control.enable();

        match self.arm(&configuration) {
            Ok(()) => {
                self.state.set(State::Running);
                Ok(())
            }
            Err(e) => {
                configuration.calibrate.control.disable();
                configuration.reference.control.disable();
                Err(e)
            }
        }
    }

    fn arm(&'a self, configuration: &Configuration<'a>) -> Result<(), ErrorCode> {
        self.counter.start(configuration.calibrate.pin)?;

        if let Err(e) = self
            .reference
            .start(&self.counter, configuration.reference.pin)
        {
            self.counter.stop();
            return Err(e);
        }

        if let Err(e) = self.system_clock.start(&self.counter) {
            self.reference.stop();
            self.counter.stop();
            return Err(e);
        }

        Ok(())
    }

    pub fn stop(&self) -> Result<(), ErrorCode> {
        if self.state.get() == State::Idle {
            return Err(ErrorCode::OFF);
        }

        self.system_clock.stop();
        self.reference.stop();
        self.counter.stop();

        let configuration = self.configuration.get();
        configuration.calibrate.control.disable();
        configuration.reference.control.disable();

        self.state.set(State::Idle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Calibrator, ClockInput, Configuration, State};
    use crate::config::CONFIG;
    use crate::hil::{ChannelRegistry, PinSelect};
    use crate::measurement::{Observation, Source};
    use crate::test::mock::{Kind, LeaseEvent, MockClock, MockRegistry, RecordingClient};
    use kernel::ErrorCode;

    extern crate std;
    use std::vec::Vec;

    const PPS: PinSelect = PinSelect::new(0, 4);
    const OSC: PinSelect = PinSelect::new(0, 3);

    fn configuration<'a>(gps: &'a MockClock, oscillator: &'a MockClock) -> Configuration<'a> {
        Configuration {
            reference: ClockInput {
                pin: PPS,
                control: gps,
            },
            calibrate: ClockInput {
                pin: OSC,
                control: oscillator,
            },
        }
    }

    #[test]
    fn start_then_stop_returns_every_lease_in_reverse() {
        let registry = MockRegistry::new();
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));

        assert_eq!(calibrator.start(), Ok(()));
        assert_eq!(calibrator.state(), State::Running);
        assert!(gps.is_enabled());
        assert!(oscillator.is_enabled());
        assert_eq!(registry.outstanding_leases(), 7);

        assert_eq!(calibrator.stop(), Ok(()));
        assert_eq!(calibrator.state(), State::Idle);
        assert!(!gps.is_enabled());
        assert!(!oscillator.is_enabled());
        assert_eq!(registry.outstanding_leases(), 0);

        let log = registry.lease_log();
        let borrows: Vec<_> = log
            .iter()
            .filter_map(|event| match event {
                LeaseEvent::Borrow(kind, index) => Some((*kind, *index)),
                LeaseEvent::Release(..) => None,
            })
            .collect();
        let mut releases: Vec<_> = log
            .iter()
            .filter_map(|event| match event {
                LeaseEvent::Release(kind, index) => Some((*kind, *index)),
                LeaseEvent::Borrow(..) => None,
            })
            .collect();
        releases.reverse();
        assert_eq!(
            borrows,
            [
                (Kind::Timer, 0),
                (Kind::Edge, 0),
                (Kind::Link, 0),
                (Kind::Edge, 1),
                (Kind::Link, 1),
                (Kind::Timer, 1),
                (Kind::Link, 2),
            ]
        );
        assert_eq!(borrows, releases);
        // Every borrow happened before the first release.
        assert!(log[..7].iter().all(|e| matches!(e, LeaseEvent::Borrow(..))));
    }

    #[test]
    fn reference_and_system_streams_are_tagged() {
        let registry = MockRegistry::new();
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let client = RecordingClient::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));
        calibrator.set_client(&client);
        calibrator.start().unwrap();

        for _ in 0..3 {
            registry.pulses(OSC, 10_007);
            registry.pulse(PPS);
            registry.advance(CONFIG.system_clock_ticks);
        }

        let observations = client.observations();
        assert_eq!(observations.len(), 4);
        let expected = |source| Observation {
            source,
            freq: 10_007,
            avg_freq: 10_007,
            target_guess: 10_000,
            offset: 7,
            ppb: 700_000,
            avg_ppb: 700_000,
        };
        assert_eq!(observations[0], expected(Source::Reference));
        assert_eq!(observations[1], expected(Source::SystemClock));
        assert_eq!(observations[2], expected(Source::Reference));
        assert_eq!(observations[3], expected(Source::SystemClock));
        assert_eq!(
            calibrator.reference_monitor().last_observation(),
            Some(expected(Source::Reference))
        );
        assert_eq!(
            calibrator.system_clock_monitor().last_observation(),
            Some(expected(Source::SystemClock))
        );
    }

    #[test]
    fn misuse_is_reported_and_changes_nothing() {
        let registry = MockRegistry::new();
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));

        assert_eq!(calibrator.stop(), Err(ErrorCode::OFF));
        assert_eq!(gps.transitions(), 0);

        calibrator.start().unwrap();
        assert_eq!(calibrator.start(), Err(ErrorCode::ALREADY));
        assert_eq!(calibrator.state(), State::Running);
        assert_eq!(registry.outstanding_leases(), 7);
        assert_eq!(gps.transitions(), 1);

        assert_eq!(
            calibrator.set_configuration(configuration(&oscillator, &gps)),
            Err(ErrorCode::BUSY)
        );

        calibrator.stop().unwrap();
        assert_eq!(calibrator.stop(), Err(ErrorCode::OFF));
        assert_eq!(gps.transitions(), 2);
    }

    #[test]
    fn exhausted_registry_leaves_the_session_idle() {
        // One interconnect short of what a session needs.
        let registry = MockRegistry::with_limits(2, 2, 2);
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));

        assert_eq!(calibrator.start(), Err(ErrorCode::NOMEM));
        assert_eq!(calibrator.state(), State::Idle);
        assert_eq!(registry.outstanding_leases(), 0);
        assert!(!gps.is_enabled());
        assert!(!oscillator.is_enabled());
        assert_eq!(calibrator.stop(), Err(ErrorCode::OFF));
    }

    #[test]
    fn exhaustion_at_each_step_unwinds() {
        for (timers, edges, links) in [(0, 2, 3), (1, 2, 3), (2, 0, 3), (2, 1, 3), (2, 2, 1)] {
            let registry = MockRegistry::with_limits(timers, edges, links);
            let gps = MockClock::new();
            let oscillator = MockClock::new();
            let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));

            assert_eq!(calibrator.start(), Err(ErrorCode::NOMEM));
            assert_eq!(registry.outstanding_leases(), 0);
            assert!(!calibrator.pulse_counter().is_running());
            assert!(!calibrator.reference_monitor().is_running());
            assert!(!calibrator.system_clock_monitor().is_running());
        }
    }

    #[test]
    fn session_can_be_restarted() {
        let registry = MockRegistry::new();
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let client = RecordingClient::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));
        calibrator.set_client(&client);

        calibrator.start().unwrap();
        registry.pulses(OSC, 9_990);
        registry.pulse(PPS);
        registry.pulses(OSC, 9_990);
        registry.pulse(PPS);
        calibrator.stop().unwrap();
        assert_eq!(client.observations().len(), 1);

        calibrator.start().unwrap();
        // The counter starts again from zero and needs a fresh baseline.
        registry.pulses(OSC, 20_003);
        registry.pulse(PPS);
        assert_eq!(client.observations().len(), 1);
        registry.pulses(OSC, 20_003);
        registry.pulse(PPS);

        let observations = client.observations();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[1].freq, 20_003);
        assert_eq!(observations[1].avg_freq, 20_003);
        assert_eq!(observations[1].ppb, 150_000);
    }

    #[test]
    fn configuration_can_change_while_idle() {
        let registry = MockRegistry::new();
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));

        let mut swapped = configuration(&gps, &oscillator);
        swapped.calibrate.pin = PinSelect::new(1, 1);
        assert_eq!(calibrator.set_configuration(swapped), Ok(()));
        assert_eq!(calibrator.configuration().calibrate.pin, PinSelect::new(1, 1));

        calibrator.start().unwrap();
        registry.pulses(OSC, 50);
        assert_eq!(calibrator.pulse_counter().value(), Ok(0));
        registry.pulses(PinSelect::new(1, 1), 50);
        assert_eq!(calibrator.pulse_counter().value(), Ok(50));
    }

    #[test]
    fn clearing_the_counter_starts_a_new_baseline() {
        let registry = MockRegistry::new();
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let client = RecordingClient::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));
        calibrator.set_client(&client);
        calibrator.start().unwrap();

        let second = || {
            registry.pulses(OSC, 10_007);
            registry.pulse(PPS);
            registry.advance(CONFIG.system_clock_ticks);
        };
        for _ in 0..3 {
            second();
        }
        assert_eq!(client.observations().len(), 4);

        assert_eq!(calibrator.clear_counter(), Ok(()));
        assert_eq!(calibrator.pulse_counter().value(), Ok(0));
        second();
        assert_eq!(client.observations().len(), 4);

        second();
        let observations = client.observations();
        assert_eq!(observations.len(), 6);
        for observation in &observations[4..] {
            assert_eq!(observation.freq, 10_007);
            assert_eq!(observation.avg_freq, 10_007);
            assert_eq!(observation.avg_ppb, 700_000);
        }
    }

    #[test]
    fn clearing_needs_a_running_counter() {
        let registry = MockRegistry::new();
        let gps = MockClock::new();
        let oscillator = MockClock::new();
        let calibrator = Calibrator::new(&registry, configuration(&gps, &oscillator));

        assert_eq!(calibrator.clear_counter(), Err(ErrorCode::OFF));
    }
}
