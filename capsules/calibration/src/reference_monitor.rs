// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Measures the pulse counter against an external reference signal.
//!
//! Every rising edge of the reference (typically a GPS 1PPS output)
//! captures the pulse counter in hardware through an interconnect channel.
//! The same edge raises an interrupt, and the handler reads the capture and
//! hands it to the sample stream. The capture itself does not depend on how
//! quickly the interrupt is serviced, only on it being serviced before the
//! next edge.

use kernel::utilities::cells::OptionalCell;
use kernel::ErrorCode;

use crate::hil::{
    ChannelRegistry, Edge, EdgeChannel, EdgeClient, Interconnect, PinSelect, Pull,
};
use crate::measurement::{Observation, ObservationClient, SampleStream, Source};
use crate::pulse_counter::PulseCounter;

pub struct ReferenceMonitor<'a, R: ChannelRegistry<'a>> {
    registry: &'a R,
    counter: OptionalCell<&'a PulseCounter<'a, R>>,
    edge: OptionalCell<&'a R::Edge>,
    link: OptionalCell<&'a R::Link>,
    stream: SampleStream<'a>,
}

impl<'a, R: ChannelRegistry<'a>> ReferenceMonitor<'a, R> {
    pub fn new(registry: &'a R) -> ReferenceMonitor<'a, R> {
        ReferenceMonitor {
            registry,
            counter: OptionalCell::empty(),
            edge: OptionalCell::empty(),
            link: OptionalCell::empty(),
            stream: SampleStream::new(Source::Reference),
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
        self.edge.is_some()
    }

    /// Capture `counter` on every rising edge of `pin`.
    ///
    /// `counter` must already be running.
    pub fn start(&'a self, counter: &'a PulseCounter<'a, R>, pin: PinSelect) -> Result<(), ErrorCode> {
        if self.edge.is_some() {
            return Err(ErrorCode::ALREADY);
        }
        let result = self.acquire(counter, pin);
        if result.is_err() {
            self.stop();
        }
        result
    }

    fn acquire(&'a self, counter: &'a PulseCounter<'a, R>, pin: PinSelect) -> Result<(), ErrorCode> {
        let capture = counter
            .capture_task(Source::Reference)
            .ok_or(ErrorCode::OFF)?;
        self.stream.reset();
        self.counter.set(counter);

        let edge = self.registry.borrow_edge_channel().ok_or(ErrorCode::NOMEM)?;
        self.edge.set(edge);
        edge.init_input(pin, Pull::None, Edge::LowToHigh)?;
        edge.enable();

        let link = self.registry.borrow_interconnect().ok_or(ErrorCode::NOMEM)?;
        self.link.set(link);
        link.wire(edge.event_address(), capture);
        link.enable();

        edge.set_client(self);
        edge.enable_interrupt();
        Ok(())
    }

    /// Disarm and release the channels, interconnect first.
    pub fn stop(&self) {
        self.edge.map(|edge| edge.disable_interrupt());
        self.link
            .take()
            .map(|link| self.registry.release_interconnect(link));
        self.edge
            .take()
            .map(|edge| self.registry.release_edge_channel(edge));
        self.counter.clear();
    }
}

impl<'a, R: ChannelRegistry<'a>> EdgeClient for ReferenceMonitor<'a, R> {
    fn edge(&self) {
        let captured = self
            .counter
            .get()
            .and_then(|counter| counter.captured(Source::Reference));
        if let Some(value) = captured {
            self.stream.capture(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceMonitor;
    use crate::hil::{ChannelRegistry, PinSelect};
    use crate::measurement::Source;
    use crate::pulse_counter::PulseCounter;
    use crate::test::mock::{Kind, MockRegistry, RecordingClient};
    use kernel::ErrorCode;

    const OSC: PinSelect = PinSelect::new(0, 3);
    const PPS: PinSelect = PinSelect::new(0, 4);

    #[test]
    fn reports_pulses_between_reference_edges() {
        let registry = MockRegistry::new();
        let client = RecordingClient::new();
        let counter = PulseCounter::new(&registry);
        let monitor = ReferenceMonitor::new(&registry);
        monitor.set_client(&client);

        counter.start(OSC).unwrap();
        monitor.start(&counter, PPS).unwrap();

        // No pulses yet: the capture is zero.
        registry.pulse(PPS);
        // Baseline.
        registry.pulses(OSC, 10_007);
        registry.pulse(PPS);
        assert!(client.observations().is_empty());

        registry.pulses(OSC, 10_007);
        registry.pulse(PPS);
        registry.pulses(OSC, 10_009);
        registry.pulse(PPS);

        let observations = client.observations();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].source, Source::Reference);
        assert_eq!(observations[0].freq, 10_007);
        assert_eq!(observations[0].ppb, 700_000);
        assert_eq!(observations[1].freq, 10_009);
        assert_eq!(observations[1].avg_freq, 10_008);
        assert_eq!(monitor.last_observation(), Some(observations[1]));
    }

    #[test]
    fn needs_a_running_counter() {
        let registry = MockRegistry::new();
        let counter = PulseCounter::new(&registry);
        let monitor = ReferenceMonitor::new(&registry);

        assert_eq!(monitor.start(&counter, PPS), Err(ErrorCode::OFF));
        assert_eq!(registry.outstanding_leases(), 0);
    }

    #[test]
    fn stop_disarms_the_edge() {
        let registry = MockRegistry::new();
        let client = RecordingClient::new();
        let counter = PulseCounter::new(&registry);
        let monitor = ReferenceMonitor::new(&registry);
        monitor.set_client(&client);
        counter.start(OSC).unwrap();
        monitor.start(&counter, PPS).unwrap();

        registry.pulses(OSC, 100);
        registry.pulse(PPS);
        assert_eq!(registry.interrupt_disarms(Kind::Edge, 1), 0);
        monitor.stop();
        assert_eq!(registry.interrupt_disarms(Kind::Edge, 1), 1);
        assert_eq!(registry.outstanding_leases(), 3);

        registry.pulses(OSC, 100);
        registry.pulse(PPS);
        registry.pulses(OSC, 100);
        registry.pulse(PPS);
        assert!(client.observations().is_empty());
        assert!(!monitor.is_running());
    }

    #[test]
    fn restart_waits_for_a_new_baseline() {
        let registry = MockRegistry::new();
        let client = RecordingClient::new();
        let counter = PulseCounter::new(&registry);
        let monitor = ReferenceMonitor::new(&registry);
        monitor.set_client(&client);
        counter.start(OSC).unwrap();

        monitor.start(&counter, PPS).unwrap();
        registry.pulses(OSC, 500);
        registry.pulse(PPS);
        monitor.stop();

        monitor.start(&counter, PPS).unwrap();
        registry.pulses(OSC, 10_000);
        registry.pulse(PPS);
        assert!(client.observations().is_empty());
        registry.pulses(OSC, 10_000);
        registry.pulse(PPS);
        assert_eq!(client.observations().len(), 1);
        assert_eq!(client.observations()[0].freq, 10_000);
    }
}
