// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Programmable peripheral interconnect, nRF52
//!
//! A PPI channel triggers a task in one peripheral when an event occurs in
//! another: the event end point (EEP) and task end point (TEP) hold the
//! absolute addresses of the event and task registers. Channels 0-19 are
//! programmable, 20-31 are wired to fixed radio and RTC functions and are
//! not offered here.

use capsules_calibration::hil::{EventAddress, Interconnect, TaskAddress};
use kernel::utilities::registers::interfaces::Writeable;
use kernel::utilities::registers::{register_structs, ReadWrite};
use kernel::utilities::StaticRef;

pub const CHANNELS: usize = 20;

register_structs! {
    PpiRegisters {
        (0x000 => _reserved0),
        (0x504 => chenset: ReadWrite<u32>),
        (0x508 => chenclr: ReadWrite<u32>),
        (0x50C => _reserved1),
        (0x510 => ch: [ChannelRegisters; CHANNELS]),
        (0x5B0 => _reserved2),
        (0x910 => fork_tep: [ReadWrite<u32>; CHANNELS]),
        (0x960 => @END),
    },
    ChannelRegisters {
        (0x000 => eep: ReadWrite<u32>),
        (0x004 => tep: ReadWrite<u32>),
        (0x008 => @END),
    }
}

const PPI_BASE: StaticRef<PpiRegisters> =
    unsafe { StaticRef::new(0x4001_F000 as *const PpiRegisters) };

pub struct PpiChannel {
    registers: StaticRef<PpiRegisters>,
    index: usize,
}

impl PpiChannel {
    /// `index` must be below `CHANNELS`.
    pub(crate) const fn new(index: usize) -> PpiChannel {
        PpiChannel {
            registers: PPI_BASE,
            index,
        }
    }

    fn mask(&self) -> u32 {
        1 << self.index
    }

    pub(crate) fn reset(&self) {
        let regs = &*self.registers;
        regs.chenclr.set(self.mask());
        regs.ch[self.index].eep.set(0);
        regs.ch[self.index].tep.set(0);
        regs.fork_tep[self.index].set(0);
    }
}

impl Interconnect for PpiChannel {
    fn wire(&self, event: EventAddress, task: TaskAddress) {
        let regs = &*self.registers;
        // Peripheral addresses fit in 32 bits on the nRF52.
        regs.ch[self.index].eep.set(event.0 as u32);
        regs.ch[self.index].tep.set(task.0 as u32);
        regs.fork_tep[self.index].set(0);
    }

    fn enable(&self) {
        self.registers.chenset.set(self.mask());
    }

    fn disable(&self) {
        self.registers.chenclr.set(self.mask());
    }
}
