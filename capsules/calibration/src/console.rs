// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Text commands for driving a calibration by hand.
//!
//! Commands are a prefix chosen by the board followed by a dotted name, e.g.
//! with the prefix `cal`:
//!
//! ```text
//! cal.start        start calibrating
//! cal.stop         stop calibrating
//! cal.status       session state and live pulse count
//! cal.t.start      pulse counter timer: start
//! cal.t.stop       pulse counter timer: stop
//! cal.t.count      pulse counter timer: count one pulse from software
//! cal.t.clear      pulse counter timer: clear
//! cal.gc.enable    pulse counter edge channel: enable
//! cal.gc.disable   pulse counter edge channel: disable
//! cal.p.enable     pulse counter interconnect: enable
//! cal.p.disable    pulse counter interconnect: disable
//! help             list the commands
//! ```
//!
//! The channel commands only work while a session is running, since the
//! channels are only held then. None of the commands take arguments.

use core::fmt::Write;

use kernel::ErrorCode;

use crate::calibrator::{Calibrator, State};
use crate::hil::ChannelRegistry;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
    Help,
    TimerStart,
    TimerStop,
    TimerCount,
    TimerClear,
    EdgeEnable,
    EdgeDisable,
    LinkEnable,
    LinkDisable,
}

const COMMANDS: [(&str, Command); 11] = [
    ("start", Command::Start),
    ("stop", Command::Stop),
    ("status", Command::Status),
    ("t.start", Command::TimerStart),
    ("t.stop", Command::TimerStop),
    ("t.count", Command::TimerCount),
    ("t.clear", Command::TimerClear),
    ("gc.enable", Command::EdgeEnable),
    ("gc.disable", Command::EdgeDisable),
    ("p.enable", Command::LinkEnable),
    ("p.disable", Command::LinkDisable),
];

impl Command {
    /// Parse one line of input.
    pub fn parse(prefix: &str, line: &str) -> Result<Command, ErrorCode> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ErrorCode::INVAL)?;
        if words.next().is_some() {
            return Err(ErrorCode::INVAL);
        }
        if name == "help" {
            return Ok(Command::Help);
        }

        let name = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or(ErrorCode::INVAL)?;
        COMMANDS
            .iter()
            .find(|(command, _)| *command == name)
            .map(|(_, command)| *command)
            .ok_or(ErrorCode::INVAL)
    }
}

pub struct CalibratorConsole<'a, R: ChannelRegistry<'a>> {
    calibrator: &'a Calibrator<'a, R>,
    prefix: &'static str,
}

impl<'a, R: ChannelRegistry<'a>> CalibratorConsole<'a, R> {
    pub fn new(calibrator: &'a Calibrator<'a, R>, prefix: &'static str) -> Self {
        CalibratorConsole { calibrator, prefix }
    }

    /// Run the command on `line`, writing any response to `out`.
    pub fn execute(&self, line: &str, out: &mut dyn Write) -> Result<(), ErrorCode> {
        let command = match Command::parse(self.prefix, line) {
            Ok(command) => command,
            Err(e) => {
                let _ = writeln!(out, "Unknown command: {}", line.trim());
                return Err(e);
            }
        };

        let result = self.run(command, out);
        if let Err(e) = result {
            let _ = writeln!(out, "Failed: {:?}", e);
        }
        result
    }

    fn run(&self, command: Command, out: &mut dyn Write) -> Result<(), ErrorCode> {
        let counter = self.calibrator.pulse_counter();
        match command {
            Command::Start => {
                let _ = writeln!(out, "Starting");
                self.calibrator.start()
            }
            Command::Stop => {
                let _ = writeln!(out, "Stopping");
                self.calibrator.stop()
            }
            Command::Status => {
                match self.calibrator.state() {
                    State::Idle => {
                        let _ = writeln!(out, "idle");
                    }
                    State::Running => {
                        let _ = writeln!(out, "running, count {}", counter.value()?);
                    }
                }
                Ok(())
            }
            Command::Help => {
                for (name, _) in COMMANDS.iter() {
                    let _ = writeln!(out, "{}.{}", self.prefix, name);
                }
                Ok(())
            }
            Command::TimerStart => {
                let _ = writeln!(out, "Timer Start");
                counter.timer_enable()
            }
            Command::TimerStop => {
                let _ = writeln!(out, "Timer Stop");
                counter.timer_disable()
            }
            Command::TimerCount => {
                let _ = writeln!(out, "Timer Count");
                counter.timer_count()
            }
            Command::TimerClear => {
                let _ = writeln!(out, "Timer Clearing");
                self.calibrator.clear_counter()
            }
            Command::EdgeEnable => counter.edge_enable(),
            Command::EdgeDisable => counter.edge_disable(),
            Command::LinkEnable => counter.link_enable(),
            Command::LinkDisable => counter.link_disable(),
        }
    }
}
