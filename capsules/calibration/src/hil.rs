// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Interfaces for the hardware channels a clock calibration is built from.
//!
//! A calibration session is wired together from three kinds of scarce,
//! shared peripherals:
//!
//! - [`CaptureTimer`]: a timer that either counts an external signal or
//!   ticks from the high frequency clock, with a handful of
//!   capture/compare registers.
//! - [`EdgeChannel`]: a channel that raises an event when a pin sees an
//!   edge (GPIOTE on the nRF5x).
//! - [`Interconnect`]: a channel that routes an event of one peripheral
//!   straight to a task of another, without the CPU (PPI on the nRF5x).
//!
//! All channels are leased from a [`ChannelRegistry`]. A lease has exactly
//! one owner; releasing a channel puts it back into its reset state
//! (disabled, interrupts off, client cleared, wiring cleared).
//!
//! Interrupts are delivered through clients: each channel keeps the client
//! that was registered on it and the chip's interrupt handler calls that
//! client when the channel's event fires.

use kernel::ErrorCode;

/// Absolute address of a peripheral event register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EventAddress(pub usize);

/// Absolute address of a peripheral task register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TaskAddress(pub usize);

/// Index of a capture/compare register of a [`CaptureTimer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CaptureSlot(pub u8);

impl CaptureSlot {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Pin selection in nRF "PSEL" terms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PinSelect {
    pub port: u8,
    pub pin: u8,
}

impl PinSelect {
    pub const fn new(port: u8, pin: u8) -> PinSelect {
        PinSelect { port, pin }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerMode {
    /// Increment on every tick of the (prescaled) base clock.
    Timer,
    /// Increment only when the COUNT task is triggered.
    Counter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerTask {
    Start,
    Stop,
    Count,
    Clear,
    Capture(CaptureSlot),
}

/// Hardware action taken when a compare register matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompareAction {
    None,
    Clear,
    Stop,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    LowToHigh,
    HighToLow,
    Toggle,
}

pub trait CompareClient {
    /// Compare register `slot` matched.
    fn compare(&self, slot: CaptureSlot);
}

pub trait EdgeClient {
    /// The monitored pin saw the configured edge.
    fn edge(&self);
}

pub trait CaptureTimer<'a> {
    /// Put the timer into `mode`, 32 bits wide with no prescaling. The timer
    /// is left stopped.
    fn init(&self, mode: TimerMode);

    /// Reserve a free capture/compare register, or `None` if all are taken.
    fn reserve_slot(&self) -> Option<CaptureSlot>;

    fn enable(&self);
    fn disable(&self);
    fn clear(&self);

    /// Trigger the COUNT task from software.
    fn count(&self);

    /// Current value of the timer.
    fn value(&self) -> u32;

    /// Last value captured into `slot`.
    fn captured(&self, slot: CaptureSlot) -> u32;

    fn set_compare(&self, slot: CaptureSlot, value: u32);
    fn set_compare_short(&self, slot: CaptureSlot, action: CompareAction);

    fn task_address(&self, task: TimerTask) -> TaskAddress;
    fn compare_event_address(&self, slot: CaptureSlot) -> EventAddress;

    fn enable_compare_interrupt(&self, slot: CaptureSlot);
    fn disable_compare_interrupt(&self, slot: CaptureSlot);
    fn set_compare_client(&self, client: &'a dyn CompareClient);
}

pub trait EdgeChannel<'a> {
    /// Bind the channel to `pin` as an input raising an event on `edge`.
    fn init_input(&self, pin: PinSelect, pull: Pull, edge: Edge) -> Result<(), ErrorCode>;

    fn enable(&self);
    fn disable(&self);

    fn event_address(&self) -> EventAddress;

    fn enable_interrupt(&self);
    fn disable_interrupt(&self);
    fn set_client(&self, client: &'a dyn EdgeClient);
}

pub trait Interconnect {
    /// Route `event` to `task`. Takes effect once the channel is enabled.
    fn wire(&self, event: EventAddress, task: TaskAddress);

    fn enable(&self);
    fn disable(&self);
}

/// Leases hardware channels.
///
/// `borrow_*` returns `None` when every channel of that kind is leased.
/// `release_*` must only be handed a channel obtained from the same registry.
pub trait ChannelRegistry<'a> {
    type Timer: CaptureTimer<'a>;
    type Edge: EdgeChannel<'a>;
    type Link: Interconnect;

    fn borrow_timer(&'a self) -> Option<&'a Self::Timer>;
    fn release_timer(&self, timer: &Self::Timer);

    fn borrow_edge_channel(&'a self) -> Option<&'a Self::Edge>;
    fn release_edge_channel(&self, channel: &Self::Edge);

    fn borrow_interconnect(&'a self) -> Option<&'a Self::Link>;
    fn release_interconnect(&self, link: &Self::Link);

    /// Number of channels of all kinds currently leased.
    fn outstanding_leases(&self) -> usize;
}

/// Switches a clock source on and off.
pub trait ClockControl {
    fn enable(&self);
    fn disable(&self);
}
