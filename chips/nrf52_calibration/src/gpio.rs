// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! GPIO pin configuration, nRF52
//!
//! Only what the calibration needs: input buffer and pull configuration for
//! pins handed to GPIOTE, and push-pull outputs that switch a clock source
//! on and off.

use capsules_calibration::hil::{ClockControl, PinSelect, Pull};
use kernel::utilities::registers::interfaces::Writeable;
use kernel::utilities::registers::{register_bitfields, register_structs, ReadWrite, WriteOnly};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

register_structs! {
    GpioRegisters {
        (0x000 => _reserved0),
        (0x508 => outset: WriteOnly<u32>),
        (0x50C => outclr: WriteOnly<u32>),
        (0x510 => _reserved1),
        (0x700 => pin_cnf: [ReadWrite<u32, PinConfig::Register>; 32]),
        (0x780 => @END),
    }
}

register_bitfields![u32,
    PinConfig [
        DIR OFFSET(0) NUMBITS(1) [
            Input = 0,
            Output = 1
        ],
        INPUT OFFSET(1) NUMBITS(1) [
            Connect = 0,
            Disconnect = 1
        ],
        PULL OFFSET(2) NUMBITS(2) [
            Disabled = 0,
            Pulldown = 1,
            Pullup = 3
        ]
    ]
];

const P0_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x5000_0000 as *const GpioRegisters) };
const P1_BASE: StaticRef<GpioRegisters> =
    unsafe { StaticRef::new(0x5000_0300 as *const GpioRegisters) };

/// `INVAL` unless `pin` names one of P0.00-P0.31 or P1.00-P1.31.
pub fn check(pin: PinSelect) -> Result<(), ErrorCode> {
    if pin.port > 1 || pin.pin > 31 {
        Err(ErrorCode::INVAL)
    } else {
        Ok(())
    }
}

fn port(pin: PinSelect) -> Result<StaticRef<GpioRegisters>, ErrorCode> {
    check(pin)?;
    Ok(if pin.port == 0 { P0_BASE } else { P1_BASE })
}

/// Connect the input buffer of `pin` with the given pull.
pub fn configure_input(pin: PinSelect, pull: Pull) -> Result<(), ErrorCode> {
    let regs = port(pin)?;
    regs.pin_cnf[pin.pin as usize].write(
        PinConfig::DIR::Input
            + PinConfig::INPUT::Connect
            + match pull {
                Pull::None => PinConfig::PULL::Disabled,
                Pull::Up => PinConfig::PULL::Pullup,
                Pull::Down => PinConfig::PULL::Pulldown,
            },
    );
    Ok(())
}

/// A clock source switched by driving a pin high.
pub struct ClockEnablePin {
    pin: PinSelect,
}

impl ClockEnablePin {
    pub fn new(pin: PinSelect) -> Result<ClockEnablePin, ErrorCode> {
        check(pin)?;
        Ok(ClockEnablePin { pin })
    }

    fn drive(&self, high: bool) {
        if let Ok(regs) = port(self.pin) {
            let mask = 1 << self.pin.pin;
            if high {
                regs.outset.set(mask);
            } else {
                regs.outclr.set(mask);
            }
            regs.pin_cnf[self.pin.pin as usize]
                .write(PinConfig::DIR::Output + PinConfig::INPUT::Disconnect);
        }
    }
}

impl ClockControl for ClockEnablePin {
    fn enable(&self) {
        self.drive(true);
    }

    fn disable(&self) {
        self.drive(false);
    }
}
