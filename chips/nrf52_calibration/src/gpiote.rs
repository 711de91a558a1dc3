// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! GPIOTE channels as edge channels, nRF52
//!
//! A GPIOTE channel in event mode raises its IN event when the bound pin
//! sees the configured edge. The event both feeds the PPI and, when its
//! interrupt is enabled, the GPIOTE interrupt line shared by all eight
//! channels.

use capsules_calibration::hil::{Edge, EdgeChannel, EdgeClient, EventAddress, PinSelect, Pull};
use kernel::utilities::cells::OptionalCell;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, register_structs, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::gpio;

pub const CHANNELS: usize = 8;

const GPIOTE_BASE: usize = 0x4000_6000;
const EVENTS_IN: usize = 0x100;

register_structs! {
    GpioteRegisters {
        (0x000 => _reserved0),
        (0x100 => events_in: [ReadWrite<u32, Event::Register>; CHANNELS]),
        (0x120 => _reserved1),
        (0x304 => intenset: ReadWrite<u32>),
        (0x308 => intenclr: ReadWrite<u32>),
        (0x30C => _reserved2),
        (0x510 => config: [ReadWrite<u32, Config::Register>; CHANNELS]),
        (0x530 => @END),
    }
}

register_bitfields![u32,
    Event [
        READY OFFSET(0) NUMBITS(1)
    ],
    Config [
        MODE OFFSET(0) NUMBITS(2) [
            Disabled = 0,
            Event = 1,
            Task = 3
        ],
        PSEL OFFSET(8) NUMBITS(5) [],
        PORT OFFSET(13) NUMBITS(1) [],
        POLARITY OFFSET(16) NUMBITS(2) [
            None = 0,
            LoToHi = 1,
            HiToLo = 2,
            Toggle = 3
        ]
    ]
];

const GPIOTE_REGS: StaticRef<GpioteRegisters> =
    unsafe { StaticRef::new(GPIOTE_BASE as *const GpioteRegisters) };

pub struct GpioteChannel<'a> {
    registers: StaticRef<GpioteRegisters>,
    index: usize,
    client: OptionalCell<&'a dyn EdgeClient>,
}

impl<'a> GpioteChannel<'a> {
    /// `index` must be below `CHANNELS`.
    pub(crate) const fn new(index: usize) -> GpioteChannel<'a> {
        GpioteChannel {
            registers: GPIOTE_REGS,
            index,
            client: OptionalCell::empty(),
        }
    }

    fn interrupt_bit(&self) -> u32 {
        1 << self.index
    }

    pub fn handle_interrupt(&self) {
        let event = &self.registers.events_in[self.index];
        if event.is_set(Event::READY) {
            event.write(Event::READY::CLEAR);
            if self.registers.intenset.get() & self.interrupt_bit() != 0 {
                self.client.map(|client| client.edge());
            }
        }
    }

    pub(crate) fn reset(&self) {
        let regs = &*self.registers;
        regs.intenclr.set(self.interrupt_bit());
        regs.config[self.index].write(Config::MODE::Disabled);
        regs.events_in[self.index].write(Event::READY::CLEAR);
        self.client.clear();
    }
}

impl<'a> EdgeChannel<'a> for GpioteChannel<'a> {
    fn init_input(&self, pin: PinSelect, pull: Pull, edge: Edge) -> Result<(), ErrorCode> {
        gpio::configure_input(pin, pull)?;
        self.registers.config[self.index].write(
            Config::MODE::Disabled
                + Config::PSEL.val(pin.pin as u32)
                + Config::PORT.val(pin.port as u32)
                + match edge {
                    Edge::LowToHigh => Config::POLARITY::LoToHi,
                    Edge::HighToLow => Config::POLARITY::HiToLo,
                    Edge::Toggle => Config::POLARITY::Toggle,
                },
        );
        Ok(())
    }

    fn enable(&self) {
        self.registers.config[self.index].modify(Config::MODE::Event);
    }

    fn disable(&self) {
        self.registers.config[self.index].modify(Config::MODE::Disabled);
    }

    fn event_address(&self) -> EventAddress {
        EventAddress(GPIOTE_BASE + EVENTS_IN + 4 * self.index)
    }

    fn enable_interrupt(&self) {
        // A stale event would be reported as the first edge.
        self.registers.events_in[self.index].write(Event::READY::CLEAR);
        self.registers.intenset.set(self.interrupt_bit());
    }

    fn disable_interrupt(&self) {
        self.registers.intenclr.set(self.interrupt_bit());
    }

    fn set_client(&self, client: &'a dyn EdgeClient) {
        self.client.set(client);
    }
}
