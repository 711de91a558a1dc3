// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! TIMER as a capture timer, nRF52
//!
//! Each TIMER runs 32 bits wide with prescaler 0, so in timer mode it ticks
//! at 16 MHz. TIMER0-2 have four capture/compare registers, TIMER3-4 have
//! six. The last register of every instance is not handed out: it is the
//! scratch register `value()` captures into, since the counter itself cannot
//! be read directly.

use capsules_calibration::hil::{
    CaptureSlot, CaptureTimer, CompareAction, CompareClient, EventAddress, TaskAddress, TimerMode,
    TimerTask,
};
use capsules_calibration::lease::LeaseSet;
use kernel::utilities::cells::OptionalCell;
use kernel::utilities::registers::interfaces::{Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, register_structs, ReadWrite, WriteOnly};
use kernel::utilities::StaticRef;

use crate::interrupts;

const MAX_COMPARE: usize = 6;

const TASKS_START: usize = 0x000;
const TASKS_STOP: usize = 0x004;
const TASKS_COUNT: usize = 0x008;
const TASKS_CLEAR: usize = 0x00C;
const TASKS_CAPTURE: usize = 0x040;
const EVENTS_COMPARE: usize = 0x140;

const COMPARE_INTERRUPTS: u32 = 0x3F << 16;

register_structs! {
    TimerRegisters {
        (0x000 => tasks_start: WriteOnly<u32, Task::Register>),
        (0x004 => tasks_stop: WriteOnly<u32, Task::Register>),
        (0x008 => tasks_count: WriteOnly<u32, Task::Register>),
        (0x00C => tasks_clear: WriteOnly<u32, Task::Register>),
        (0x010 => _reserved0),
        (0x040 => tasks_capture: [WriteOnly<u32, Task::Register>; MAX_COMPARE]),
        (0x058 => _reserved1),
        (0x140 => events_compare: [ReadWrite<u32, Event::Register>; MAX_COMPARE]),
        (0x158 => _reserved2),
        /// COMPAREn_CLEAR at bit n, COMPAREn_STOP at bit n + 8
        (0x200 => shorts: ReadWrite<u32>),
        (0x204 => _reserved3),
        /// COMPAREn at bit n + 16
        (0x304 => intenset: ReadWrite<u32>),
        (0x308 => intenclr: ReadWrite<u32>),
        (0x30C => _reserved4),
        (0x504 => mode: ReadWrite<u32, Mode::Register>),
        (0x508 => bitmode: ReadWrite<u32, Bitmode::Register>),
        (0x50C => _reserved5),
        (0x510 => prescaler: ReadWrite<u32, Prescaler::Register>),
        (0x514 => _reserved6),
        (0x540 => cc: [ReadWrite<u32>; MAX_COMPARE]),
        (0x558 => @END),
    }
}

register_bitfields![u32,
    Task [
        ENABLE OFFSET(0) NUMBITS(1)
    ],
    Event [
        READY OFFSET(0) NUMBITS(1)
    ],
    Mode [
        MODE OFFSET(0) NUMBITS(2) [
            Timer = 0,
            Counter = 1,
            LowPowerCounter = 2
        ]
    ],
    Bitmode [
        BITMODE OFFSET(0) NUMBITS(2) [
            Bit16 = 0,
            Bit08 = 1,
            Bit24 = 2,
            Bit32 = 3
        ]
    ],
    Prescaler [
        PRESCALER OFFSET(0) NUMBITS(4) []
    ]
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instance {
    Timer0,
    Timer1,
    Timer2,
    Timer3,
    Timer4,
}

impl Instance {
    pub const fn base(self) -> usize {
        match self {
            Instance::Timer0 => 0x4000_8000,
            Instance::Timer1 => 0x4000_9000,
            Instance::Timer2 => 0x4000_A000,
            Instance::Timer3 => 0x4001_A000,
            Instance::Timer4 => 0x4001_B000,
        }
    }

    /// Number of capture/compare registers the instance has.
    pub const fn compare_registers(self) -> usize {
        match self {
            Instance::Timer0 | Instance::Timer1 | Instance::Timer2 => 4,
            Instance::Timer3 | Instance::Timer4 => 6,
        }
    }

    pub const fn interrupt(self) -> u32 {
        match self {
            Instance::Timer0 => interrupts::TIMER0,
            Instance::Timer1 => interrupts::TIMER1,
            Instance::Timer2 => interrupts::TIMER2,
            Instance::Timer3 => interrupts::TIMER3,
            Instance::Timer4 => interrupts::TIMER4,
        }
    }
}

fn task_offset(task: TimerTask) -> usize {
    match task {
        TimerTask::Start => TASKS_START,
        TimerTask::Stop => TASKS_STOP,
        TimerTask::Count => TASKS_COUNT,
        TimerTask::Clear => TASKS_CLEAR,
        TimerTask::Capture(slot) => TASKS_CAPTURE + 4 * slot.index(),
    }
}

fn compare_interrupt_bit(index: usize) -> u32 {
    1 << (16 + index)
}

/// New SHORTS value with the shortcuts of compare register `index` replaced
/// by `action`.
fn shorts_with(shorts: u32, index: usize, action: CompareAction) -> u32 {
    let clear = 1 << index;
    let stop = 1 << (index + 8);
    let shorts = shorts & !(clear | stop);
    match action {
        CompareAction::None => shorts,
        CompareAction::Clear => shorts | clear,
        CompareAction::Stop => shorts | stop,
    }
}

pub struct Timer<'a> {
    registers: StaticRef<TimerRegisters>,
    instance: Instance,
    slots: LeaseSet,
    client: OptionalCell<&'a dyn CompareClient>,
}

impl<'a> Timer<'a> {
    pub const fn new(instance: Instance) -> Timer<'a> {
        Timer {
            registers: unsafe { StaticRef::new(instance.base() as *const TimerRegisters) },
            instance,
            slots: LeaseSet::new(instance.compare_registers() - 1),
            client: OptionalCell::empty(),
        }
    }

    pub fn instance(&self) -> Instance {
        self.instance
    }

    fn scratch(&self) -> usize {
        self.instance.compare_registers() - 1
    }

    fn compare(&self, slot: CaptureSlot) -> Option<&ReadWrite<u32>> {
        if slot.index() < self.instance.compare_registers() {
            self.registers.cc.get(slot.index())
        } else {
            None
        }
    }

    pub fn handle_interrupt(&self) {
        let enabled = self.registers.intenset.get();
        for index in 0..self.slots.size() {
            let event = &self.registers.events_compare[index];
            if event.is_set(Event::READY) {
                event.write(Event::READY::CLEAR);
                if enabled & compare_interrupt_bit(index) != 0 {
                    self.client
                        .map(|client| client.compare(CaptureSlot(index as u8)));
                }
            }
        }
    }

    /// Stop the timer and return it to its reset state.
    pub(crate) fn reset(&self) {
        let regs = &*self.registers;
        regs.tasks_stop.write(Task::ENABLE::SET);
        regs.tasks_clear.write(Task::ENABLE::SET);
        regs.intenclr.set(COMPARE_INTERRUPTS);
        regs.shorts.set(0);
        for index in 0..self.instance.compare_registers() {
            regs.events_compare[index].write(Event::READY::CLEAR);
            regs.cc[index].set(0);
        }
        self.slots.release_all();
        self.client.clear();
    }
}

impl<'a> CaptureTimer<'a> for Timer<'a> {
    fn init(&self, mode: TimerMode) {
        let regs = &*self.registers;
        regs.tasks_stop.write(Task::ENABLE::SET);
        regs.mode.write(match mode {
            TimerMode::Timer => Mode::MODE::Timer,
            TimerMode::Counter => Mode::MODE::Counter,
        });
        regs.bitmode.write(Bitmode::BITMODE::Bit32);
        regs.prescaler.write(Prescaler::PRESCALER.val(0));
    }

    fn reserve_slot(&self) -> Option<CaptureSlot> {
        self.slots.acquire().map(|index| CaptureSlot(index as u8))
    }

    fn enable(&self) {
        self.registers.tasks_start.write(Task::ENABLE::SET);
    }

    fn disable(&self) {
        self.registers.tasks_stop.write(Task::ENABLE::SET);
    }

    fn clear(&self) {
        self.registers.tasks_clear.write(Task::ENABLE::SET);
    }

    fn count(&self) {
        self.registers.tasks_count.write(Task::ENABLE::SET);
    }

    fn value(&self) -> u32 {
        let scratch = self.scratch();
        self.registers.tasks_capture[scratch].write(Task::ENABLE::SET);
        self.registers.cc[scratch].get()
    }

    fn captured(&self, slot: CaptureSlot) -> u32 {
        self.compare(slot).map_or(0, |cc| cc.get())
    }

    fn set_compare(&self, slot: CaptureSlot, value: u32) {
        if let Some(cc) = self.compare(slot) {
            cc.set(value);
        }
    }

    fn set_compare_short(&self, slot: CaptureSlot, action: CompareAction) {
        if slot.index() < self.instance.compare_registers() {
            let shorts = self.registers.shorts.get();
            self.registers
                .shorts
                .set(shorts_with(shorts, slot.index(), action));
        }
    }

    fn task_address(&self, task: TimerTask) -> TaskAddress {
        TaskAddress(self.instance.base() + task_offset(task))
    }

    fn compare_event_address(&self, slot: CaptureSlot) -> EventAddress {
        EventAddress(self.instance.base() + EVENTS_COMPARE + 4 * slot.index())
    }

    fn enable_compare_interrupt(&self, slot: CaptureSlot) {
        self.registers
            .intenset
            .set(compare_interrupt_bit(slot.index()));
    }

    fn disable_compare_interrupt(&self, slot: CaptureSlot) {
        self.registers
            .intenclr
            .set(compare_interrupt_bit(slot.index()));
    }

    fn set_compare_client(&self, client: &'a dyn CompareClient) {
        self.client.set(client);
    }
}
