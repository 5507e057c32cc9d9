//! The environment: owns the machine and its controller, feeds them input,
//! and hands frames to a display. `run` is the host loop.

use crate::config::Chip8Config;
use crate::controller::{gate, CycleController};
use crate::display::{DebugView, Display};
use crate::error::{Chip8Error, Fault};
use crate::input::{HostCommand, Input};
use crate::interpreter::{Chip8Interpreter, StepOutcome};
use std::time::{Duration, Instant};

/// how often the host loop wakes up to check the gates
const HOST_POLL: Duration = Duration::from_micros(500);

/// terminal redraws are expensive; cap them at 60fps
const REDRAW_PERIOD: Duration = Duration::from_micros(16_667);

/// +/- change the cycle rate by this much
const CYCLE_HZ_STEP: u32 = 50;

pub struct Environment<'a> {
    machine: Chip8Interpreter,
    controller: CycleController,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    message: Option<String>,
    last_draw: Option<Instant>,
}

impl<'a> Environment<'a> {
    pub fn new(
        machine: Chip8Interpreter,
        config: &Chip8Config,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        now: Instant,
    ) -> Self {
        Environment {
            machine,
            controller: CycleController::new(config, now),
            display,
            input,
            message: None,
            last_draw: None,
        }
    }

    pub fn machine(&self) -> &Chip8Interpreter {
        &self.machine
    }

    pub fn controller(&self) -> &CycleController {
        &self.controller
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// run until the user quits
    pub fn run(&mut self) -> Result<(), Chip8Error> {
        while self.iteration(Instant::now())? {
            spin_sleep::sleep(HOST_POLL);
        }
        Ok(())
    }

    /// One pass of the host loop. Returns false once the user asks to quit.
    pub fn iteration(&mut self, now: Instant) -> Result<bool, Chip8Error> {
        let frame = self.input.poll(now)?;
        self.machine.set_keys(frame.keys);
        if let Some(warning) = frame.warnings.into_iter().last() {
            self.message = Some(warning);
        }

        for command in frame.commands {
            match command {
                HostCommand::Quit => return Ok(false),
                HostCommand::TogglePause => {
                    self.controller.toggle_pause(&mut self.machine);
                }
                HostCommand::Step => {
                    let outcome = self.controller.manual_tick(&mut self.machine);
                    self.report(outcome.map(Some));
                }
                HostCommand::Reset => {
                    self.machine.reset()?;
                    self.message = Some("reset".to_owned());
                }
                HostCommand::Faster => {
                    let hz = self.controller.cycle_hz() + CYCLE_HZ_STEP;
                    self.controller.set_cycle_hz(hz);
                }
                HostCommand::Slower => {
                    let hz = self.controller.cycle_hz().saturating_sub(CYCLE_HZ_STEP);
                    self.controller.set_cycle_hz(hz);
                }
            }
        }

        let outcome = self
            .controller
            .update(&mut self.machine, now)
            .map(|tick| tick.cycle);
        self.report(outcome);

        let due = match self.last_draw.as_mut() {
            Some(last) => gate(last, REDRAW_PERIOD, now),
            None => true,
        };
        if self.last_draw.is_none() {
            self.last_draw = Some(now);
        }
        if due {
            self.display.draw(&DebugView {
                machine: &self.machine,
                cycle_hz: self.controller.cycle_hz(),
                message: self.message.as_deref(),
            })?;
        }
        Ok(true)
    }

    fn report(&mut self, outcome: Result<Option<StepOutcome>, Fault>) {
        match outcome {
            Err(fault) => self.message = Some(format!("halted: {}", fault)),
            Ok(Some(StepOutcome::Unknown(word))) => {
                self.message = Some(format!("skipped unknown opcode {:#06x}", word))
            }
            Ok(_) => {}
        }
    }
}
