// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Measures the pulse counter against the system clock.
//!
//! A second timer ticks from the high frequency clock and matches a compare
//! register every `CONFIG.system_clock_ticks` ticks, i.e. once per nominal
//! second. The match clears the timer through a shortcut, captures the pulse
//! counter through an interconnect channel, and raises the interrupt that
//! reads the capture. This gives a frequency estimate that does not depend
//! on the external reference being present.

use kernel::utilities::cells::OptionalCell;
use kernel::ErrorCode;

use crate::config::CONFIG;
use crate::hil::{
    CaptureSlot, CaptureTimer, ChannelRegistry, CompareAction, CompareClient, Interconnect,
    TimerMode,
};
use crate::measurement::{Observation, ObservationClient, SampleStream, Source};
use crate::pulse_counter::PulseCounter;

pub struct SystemClockMonitor<'a, R: ChannelRegistry<'a>> {
    registry: &'a R,
    counter: OptionalCell<&'a PulseCounter<'a, R>>,
    timer: OptionalCell<&'a R::Timer>,
    slot: OptionalCell<CaptureSlot>,
    link: OptionalCell<&'a R::Link>,
    stream: SampleStream<'a>,
}

impl<'a, R: ChannelRegistry<'a>> SystemClockMonitor<'a, R> {
    pub fn new(registry: &'a R) -> SystemClockMonitor<'a, R> {
        SystemClockMonitor {
            registry,
            counter: OptionalCell::empty(),
            timer: OptionalCell::empty(),
            slot: OptionalCell::empty(),
            link: OptionalCell::empty(),
            stream: SampleStream::new(Source::SystemClock),
        }
    }

    pub fn set_client(&self, client: &'a dyn ObservationClient) {
        self.stream.set_client(client);
    }

    pub fn last_observation(&self) -> Option<Observation> {
        self.stream.last_observation()
    }

    /// The next capture only establishes a new baseline.
    pub fn drop_baseline(&self) {
        self.stream.drop_baseline();
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Capture `counter` once every nominal second of the system clock.
    ///
    /// `counter` must already be running.
    pub fn start(&'a self, counter: &'a PulseCounter<'a, R>) -> Result<(), ErrorCode> {
        if self.timer.is_some() {
            return Err(ErrorCode::ALREADY);
        }
        let result = self.acquire(counter);
        if result.is_err() {
            self.stop();
        }
        result
    }

    fn acquire(&'a self, counter: &'a PulseCounter<'a, R>) -> Result<(), ErrorCode> {
        let capture = counter
            .capture_task(Source::SystemClock)
            .ok_or(ErrorCode::OFF)?;
        self.stream.reset();
        self.counter.set(counter);

        let timer = self.registry.borrow_timer().ok_or(ErrorCode::NOMEM)?;
        self.timer.set(timer);
        timer.init(TimerMode::Timer);
        let slot = timer.reserve_slot().ok_or(ErrorCode::NOMEM)?;
        self.slot.set(slot);
        timer.clear();
        timer.set_compare(slot, CONFIG.system_clock_ticks);
        timer.set_compare_short(slot, CompareAction::Clear);
        timer.set_compare_client(self);
        timer.enable_compare_interrupt(slot);
        timer.enable();

        let link = self.registry.borrow_interconnect().ok_or(ErrorCode::NOMEM)?;
        self.link.set(link);
        link.wire(timer.compare_event_address(slot), capture);
        link.enable();

        Ok(())
    }

    /// Disarm and release the channels, interconnect first.
    pub fn stop(&self) {
        if let (Some(timer), Some(slot)) = (self.timer.get(), self.slot.get()) {
            timer.disable_compare_interrupt(slot);
            timer.disable();
        }
        self.link
            .take()
            .map(|link| self.registry.release_interconnect(link));
        self.timer
            .take()
            .map(|timer| self.registry.release_timer(timer));
        self.slot.clear();
        self.counter.clear();
    }
}

impl<'a, R: ChannelRegistry<'a>> CompareClient for SystemClockMonitor<'a, R> {
    fn compare(&self, slot: CaptureSlot) {
        if self.slot.get() != Some(slot) {
            return;
        }
        let captured = self
            .counter
            .get()
            .and_then(|counter| counter.captured(Source::SystemClock));
        if let Some(value) = captured {
            self.stream.capture(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SystemClockMonitor;
    use crate::config::CONFIG;
    use crate::hil::{ChannelRegistry, PinSelect};
    use crate::measurement::Source;
    use crate::pulse_counter::PulseCounter;
    use crate::test::mock::{Kind, LeaseEvent, MockRegistry, RecordingClient};
    use kernel::ErrorCode;

    const OSC: PinSelect = PinSelect::new(1, 9);
    const SECOND: u32 = CONFIG.system_clock_ticks;

    #[test]
    fn reports_pulses_per_system_second() {
        let registry = MockRegistry::new();
        let client = RecordingClient::new();
        let counter = PulseCounter::new(&registry);
        let monitor = SystemClockMonitor::new(&registry);
        monitor.set_client(&client);
        counter.start(OSC).unwrap();
        monitor.start(&counter).unwrap();

        registry.pulses(OSC, 26_000);
        registry.advance(SECOND);
        assert!(client.observations().is_empty());

        registry.pulses(OSC, 25_999);
        registry.advance(SECOND / 2);
        assert!(client.observations().is_empty());
        registry.advance(SECOND / 2);

        let observations = client.observations();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].source, Source::SystemClock);
        assert_eq!(observations[0].freq, 25_999);
        assert_eq!(observations[0].target_guess, 30_000);
        assert_eq!(observations[0].offset, -4_001);
        assert_eq!(observations[0].ppb, -133_366_667);
    }

    #[test]
    fn compare_match_restarts_the_second() {
        let registry = MockRegistry::new();
        let counter = PulseCounter::new(&registry);
        let monitor = SystemClockMonitor::new(&registry);
        counter.start(OSC).unwrap();
        monitor.start(&counter).unwrap();

        registry.advance(SECOND + 5);
        assert_eq!(registry.timer_count(1), 5);
    }

    #[test]
    fn uses_its_own_timer_and_link() {
        let registry = MockRegistry::new();
        let counter = PulseCounter::new(&registry);
        let monitor = SystemClockMonitor::new(&registry);
        counter.start(OSC).unwrap();
        monitor.start(&counter).unwrap();
        monitor.stop();
        assert_eq!(registry.interrupt_disarms(Kind::Timer, 1), 1);

        assert_eq!(
            &registry.lease_log()[3..],
            [
                LeaseEvent::Borrow(Kind::Timer, 1),
                LeaseEvent::Borrow(Kind::Link, 1),
                LeaseEvent::Release(Kind::Link, 1),
                LeaseEvent::Release(Kind::Timer, 1),
            ]
        );
        assert_eq!(registry.outstanding_leases(), 3);
    }

    #[test]
    fn missing_timer_is_reported() {
        let registry = MockRegistry::with_limits(1, 1, 2);
        let counter = PulseCounter::new(&registry);
        let monitor = SystemClockMonitor::new(&registry);
        counter.start(OSC).unwrap();

        assert_eq!(monitor.start(&counter), Err(ErrorCode::NOMEM));
        assert!(!monitor.is_running());
        assert_eq!(registry.outstanding_leases(), 3);
    }
}
