use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use chip8::config::{Chip8Config, DEFAULT_CYCLE_HZ};
use chip8::display::MonoTermDisplay;
use chip8::environment::Environment;
use chip8::input::TermInput;
use chip8::interpreter::Chip8Interpreter;
use clap::Parser;

/// CHIP-8 interpreter for the terminal
#[derive(Parser, Debug)]
#[command(name = "chip8")]
#[command(about = "Run a CHIP-8 ROM in the terminal", long_about = None)]
struct Args {
    /// Path to the ROM image
    #[arg(short, long)]
    rom: PathBuf,

    /// Instructions per second (1-1000)
    #[arg(long, default_value_t = DEFAULT_CYCLE_HZ)]
    hz: u32,

    /// Seed for the RND instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Start paused; step with '.'
    #[arg(short, long)]
    paused: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // initialise
    let mut config = Chip8Config::new(args.hz);
    config.seed = args.seed;
    config.start_paused = args.paused;

    // load a program; a bad ROM stops us before the terminal is touched
    let mut machine = Chip8Interpreter::from_config(&config);
    machine.load_rom_file(&args.rom)?;

    let (result, fault) = {
        let mut display = MonoTermDisplay::new()?;
        let mut input = TermInput::new()?;
        let mut env =
            Environment::new(machine, &config, &mut display, &mut input, Instant::now());
        let result = env.run();
        (result, env.machine().fault().cloned())
    };
    // terminal is restored by now, so errors print cleanly
    if let Some(fault) = fault {
        eprintln!("Warning: machine halted: {}", fault);
    }
    result?;
    Ok(())
}
