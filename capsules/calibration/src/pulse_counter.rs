// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Hardware pulse counter for the oscillator under calibration.
//!
//! A timer in counter mode is incremented by every rising edge of the
//! oscillator signal. The edge is detected by an edge channel and routed to
//! the timer's COUNT task by an interconnect channel, so counting never
//! involves the CPU.
//!
//! Two capture/compare registers of the counter are set aside, one for each
//! monitor, so each monitor can snapshot the count on its own trigger.
//!
//! Channels are acquired counter first, then the edge channel, then the
//! interconnect, and released in the opposite order.

use kernel::utilities::cells::OptionalCell;
use kernel::ErrorCode;

use crate::hil::{
    CaptureSlot, CaptureTimer, ChannelRegistry, Edge, EdgeChannel, Interconnect, PinSelect, Pull,
    TaskAddress, TimerMode, TimerTask,
};
use crate::measurement::Source;

pub struct PulseCounter<'a, R: ChannelRegistry<'a>> {
    registry: &'a R,
    timer: OptionalCell<&'a R::Timer>,
    edge: OptionalCell<&'a R::Edge>,
    link: OptionalCell<&'a R::Link>,
    reference_slot: OptionalCell<CaptureSlot>,
    system_slot: OptionalCell<CaptureSlot>,
}

impl<'a, R: ChannelRegistry<'a>> PulseCounter<'a, R> {
    pub fn new(registry: &'a R) -> PulseCounter<'a, R> {
        PulseCounter {
            registry,
            timer: OptionalCell::empty(),
            edge: OptionalCell::empty(),
            link: OptionalCell::empty(),
            reference_slot: OptionalCell::empty(),
            system_slot: OptionalCell::empty(),
        }
    }

    /// Start counting rising edges on `pin` from zero.
    ///
    /// On failure every channel acquired so far is released again.
    pub fn start(&self, pin: PinSelect) -> Result<(), ErrorCode> {
        if self.timer.is_some() {
            return Err(ErrorCode::ALREADY);
        }
        let result = self.acquire(pin);
        if result.is_err() {
            self.stop();
        }
        result
    }

    fn acquire(&self, pin: PinSelect) -> Result<(), ErrorCode> {
        let timer = self.registry.borrow_timer().ok_or(ErrorCode::NOMEM)?;
        self.timer.set(timer);
        timer.init(TimerMode::Counter);
        self.reference_slot
            .set(timer.reserve_slot().ok_or(ErrorCode::NOMEM)?);
        self.system_slot
            .set(timer.reserve_slot().ok_or(ErrorCode::NOMEM)?);
        timer.clear();
        timer.enable();

        let edge = self.registry.borrow_edge_channel().ok_or(ErrorCode::NOMEM)?;
        self.edge.set(edge);
        edge.init_input(pin, Pull::None, Edge::LowToHigh)?;
        edge.enable();

        let link = self.registry.borrow_interconnect().ok_or(ErrorCode::NOMEM)?;
        self.link.set(link);
        link.wire(edge.event_address(), timer.task_address(TimerTask::Count));
        link.enable();

        Ok(())
    }

    /// Release every channel held, interconnect first. Safe to call when
    /// nothing is held.
    pub fn stop(&self) {
        self.link
            .take()
            .map(|link| self.registry.release_interconnect(link));
        self.edge
            .take()
            .map(|edge| self.registry.release_edge_channel(edge));
        self.timer
            .take()
            .map(|timer| self.registry.release_timer(timer));
        self.reference_slot.clear();
        self.system_slot.clear();
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    fn slot(&self, source: Source) -> Option<CaptureSlot> {
        match source {
            Source::Reference => self.reference_slot.get(),
            Source::SystemClock => self.system_slot.get(),
        }
    }

    /// Task that snapshots the count into the register set aside for
    /// `source`.
    pub fn capture_task(&self, source: Source) -> Option<TaskAddress> {
        let slot = self.slot(source)?;
        self.timer
            .map(|timer| timer.task_address(TimerTask::Capture(slot)))
    }

    /// Count captured for `source` by its last trigger.
    pub fn captured(&self, source: Source) -> Option<u32> {
        let slot = self.slot(source)?;
        self.timer.map(|timer| timer.captured(slot))
    }

    /// Live count.
    pub fn value(&self) -> Result<u32, ErrorCode> {
        self.timer.map(|timer| timer.value()).ok_or(ErrorCode::OFF)
    }

    // Direct access to the individual channels, for diagnostics. Each fails
    // with `OFF` while the channel is not held.

    pub fn timer_enable(&self) -> Result<(), ErrorCode> {
        self.timer.map(|timer| timer.enable()).ok_or(ErrorCode::OFF)
    }

    pub fn timer_disable(&self) -> Result<(), ErrorCode> {
        self.timer.map(|timer| timer.disable()).ok_or(ErrorCode::OFF)
    }

    pub fn timer_count(&self) -> Result<(), ErrorCode> {
        self.timer.map(|timer| timer.count()).ok_or(ErrorCode::OFF)
    }

    pub fn timer_clear(&self) -> Result<(), ErrorCode> {
        self.timer.map(|timer| timer.clear()).ok_or(ErrorCode::OFF)
    }

    pub fn edge_enable(&self) -> Result<(), ErrorCode> {
        self.edge.map(|edge| edge.enable()).ok_or(ErrorCode::OFF)
    }

    pub fn edge_disable(&self) -> Result<(), ErrorCode> {
        self.edge.map(|edge| edge.disable()).ok_or(ErrorCode::OFF)
    }

    pub fn link_enable(&self) -> Result<(), ErrorCode> {
        self.link.map(|link| link.enable()).ok_or(ErrorCode::OFF)
    }

    pub fn link_disable(&self) -> Result<(), ErrorCode> {
        self.link.map(|link| link.disable()).ok_or(ErrorCode::OFF)
    }
}
