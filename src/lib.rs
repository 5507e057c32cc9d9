//! A CHIP-8 interpreter with a terminal front end.
//!
//! ## Design
//!
//! * one owned machine (`Chip8Interpreter`) holds all state; nothing global,
//!   so several machines can run side by side and tests need no resets
//! * instructions are decoded once into a closed `Instruction` enum and
//!   executed with an exhaustive match; unknown words are skipped, not fatal
//! * faults (bad addresses, stack over/underflow) halt the machine and stay
//!   observable until it is reset
//! * `Fx0A` is a flag, not a blocking call: the host loop keeps polling input
//!   and redrawing while the machine waits for a fresh key press
//! * wall-clock pacing lives in `CycleController`: instructions at a
//!   configurable rate, timers at a fixed 60Hz, both stopped by pause
//! * display and input sit behind traits so the terminal can be swapped out
//!
//! Model
//!
//! Environment
//!  |-- display, input, config
//!  |-- controller(config)
//!  |-- interpreter(config)
//!  |    |-- memory(font table, program)
//!  |    |-- timers, keypad
//!  |    `-- instruction set
//!  `-- main loop
//!       |-- poll input -> keypad, host commands
//!       |-- controller.update(now) -> step? tick timers?
//!       |-- redraw at most 60 times a second
//!       `-- sleep(500us)
pub mod config;
pub mod controller;
pub mod display;
pub mod environment;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod timer;

pub use config::Chip8Config;
pub use controller::{CycleController, RunState, Tick};
pub use error::{Chip8Error, Fault};
pub use instruction::Instruction;
pub use interpreter::{Chip8Interpreter, StepOutcome};
