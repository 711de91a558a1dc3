// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Lease table for the nRF52 calibration channels.
//!
//! TIMER0 stays with the radio, so TIMER1-4 are offered, together with all
//! eight GPIOTE channels and the twenty programmable PPI channels. The board
//! must not hand any of these to another driver while the registry is in use.
//!
//! Each channel keeps the client it was given, so interrupt dispatch is a
//! walk over the channels of the interrupting peripheral.

use core::array;
use core::ptr;

use capsules_calibration::hil::ChannelRegistry;
use capsules_calibration::lease::LeaseSet;
use kernel::platform::chip::InterruptService;

use crate::gpiote::{self, GpioteChannel};
use crate::interrupts;
use crate::ppi::{self, PpiChannel};
use crate::timer::{Instance, Timer};

pub const TIMERS: usize = 4;

pub struct Nrf52Channels<'a> {
    timers: [Timer<'a>; TIMERS],
    edges: [GpioteChannel<'a>; gpiote::CHANNELS],
    links: [PpiChannel; ppi::CHANNELS],
    timer_leases: LeaseSet,
    edge_leases: LeaseSet,
    link_leases: LeaseSet,
}

impl<'a> Nrf52Channels<'a> {
    pub fn new() -> Nrf52Channels<'a> {
        Nrf52Channels {
            timers: [
                Timer::new(Instance::Timer1),
                Timer::new(Instance::Timer2),
                Timer::new(Instance::Timer3),
                Timer::new(Instance::Timer4),
            ],
            edges: array::from_fn(GpioteChannel::new),
            links: array::from_fn(PpiChannel::new),
            timer_leases: LeaseSet::new(TIMERS),
            edge_leases: LeaseSet::new(gpiote::CHANNELS),
            link_leases: LeaseSet::new(ppi::CHANNELS),
        }
    }
}

impl Default for Nrf52Channels<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ChannelRegistry<'a> for Nrf52Channels<'a> {
    type Timer = Timer<'a>;
    type Edge = GpioteChannel<'a>;
    type Link = PpiChannel;

    fn borrow_timer(&'a self) -> Option<&'a Timer<'a>> {
        self.timer_leases
            .acquire()
            .map(|index| &self.timers[index])
    }

    fn release_timer(&self, timer: &Timer<'a>) {
        if let Some(index) = self.timers.iter().position(|t| ptr::eq(t, timer)) {
            if self.timer_leases.release(index).is_ok() {
                timer.reset();
            }
        }
    }

    fn borrow_edge_channel(&'a self) -> Option<&'a GpioteChannel<'a>> {
        self.edge_leases.acquire().map(|index| &self.edges[index])
    }

    fn release_edge_channel(&self, channel: &GpioteChannel<'a>) {
        if let Some(index) = self.edges.iter().position(|c| ptr::eq(c, channel)) {
            if self.edge_leases.release(index).is_ok() {
                channel.reset();
            }
        }
    }

    fn borrow_interconnect(&'a self) -> Option<&'a PpiChannel> {
        self.link_leases.acquire().map(|index| &self.links[index])
    }

    fn release_interconnect(&self, link: &PpiChannel) {
        if let Some(index) = self.links.iter().position(|l| ptr::eq(l, link)) {
            if self.link_leases.release(index).is_ok() {
                link.reset();
            }
        }
    }

    fn outstanding_leases(&self) -> usize {
        self.timer_leases.outstanding()
            + self.edge_leases.outstanding()
            + self.link_leases.outstanding()
    }
}

impl InterruptService for Nrf52Channels<'_> {
    unsafe fn service_interrupt(&self, interrupt: u32) -> bool {
        if interrupt == interrupts::GPIOTE {
            for (index, channel) in self.edges.iter().enumerate() {
                if self.edge_leases.is_leased(index) {
                    channel.handle_interrupt();
                }
            }
            return true;
        }

        match self
            .timers
            .iter()
            .enumerate()
            .find(|(_, timer)| timer.instance().interrupt() == interrupt)
        {
            Some((index, timer)) => {
                if self.timer_leases.is_leased(index) {
                    timer.handle_interrupt();
                }
                true
            }
            None => false,
        }
    }
}
