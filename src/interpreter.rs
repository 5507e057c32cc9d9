/// # interpreter
///
/// Owns the whole machine state:
///  * 4K of RAM with the font table at 0x050 and programs at 0x200
///  * V0-VF, where VF doubles as the carry/borrow/collision flag
///  * I, a 16bit pointer only ever used as a memory operand
///  * the program counter, starting at 0x200
///  * a 16-deep call stack; the pointer is one past the top
///  * a 64x32 monochrome frame, row-major
///  * delay and sound timers (see `timer`)
///  * the keypad, plus the paused and awaiting-key flags
///
/// Nothing in here knows about wall-clock time; `controller` decides when
/// `step` and `tick_timers` get called.
use crate::config::Chip8Config;
use crate::error::{Chip8Error, Fault};
use crate::instruction::Instruction;
use crate::keypad::Keypad;
use crate::memory::{Chip8MemoryMap, MemoryMap};
use crate::timer::Timers;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_PIXELS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

pub const STACK_DEPTH: usize = 16;

const FLAG: usize = 0xf;

/// What a single `step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(Instruction),
    /// word matched nothing in the instruction set; treated as a no-op
    Unknown(u16),
    /// nothing fetched, the machine is waiting on a key press
    AwaitingKey,
}

/// Most recent unrecognised instruction, kept for debug views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub addr: u16,
    pub word: u16,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown opcode {:#06x} at {:#05x}", self.word, self.addr)
    }
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    registers: [u8; 16],
    index: u16,
    program_counter: u16,
    stack: [u16; STACK_DEPTH],
    stack_pointer: usize,
    frame: [bool; DISPLAY_PIXELS],
    timers: Timers,
    keypad: Keypad,
    paused: bool,
    awaiting_key: Option<usize>,
    current_instruction: u16,
    fault: Option<Fault>,
    last_diagnostic: Option<Diagnostic>,
    unknown_opcodes: u64,
    cycles: u64,
    rng: StdRng,
    rom: Vec<u8>,
}

impl Chip8Interpreter {
    /// fresh machine with an entropy-seeded random source
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// fresh machine whose `RND` sequence is reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &Chip8Config) -> Self {
        let mut i = match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        i.paused = config.start_paused;
        i
    }

    fn with_rng(rng: StdRng) -> Self {
        let memory = Chip8MemoryMap::new();
        let program_counter = memory.program_addr;
        Chip8Interpreter {
            memory,
            registers: [0; 16],
            index: 0,
            program_counter,
            stack: [0; STACK_DEPTH],
            stack_pointer: 0,
            frame: [false; DISPLAY_PIXELS],
            timers: Timers::default(),
            keypad: Keypad::new(),
            paused: false,
            awaiting_key: None,
            current_instruction: 0,
            fault: None,
            last_diagnostic: None,
            unknown_opcodes: 0,
            cycles: 0,
            rng,
            rom: Vec::new(),
        }
    }

    /// load a chip8 program from any reader
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let mut image = Vec::new();
        reader
            .read_to_end(&mut image)
            .map_err(Chip8Error::RomUnreadable)?;
        self.load_image(&image)?;
        Ok(image.len())
    }

    /// load a chip8 program from disk
    pub fn load_rom_file(&mut self, path: impl AsRef<Path>) -> Result<usize, Chip8Error> {
        let mut f = File::open(path).map_err(Chip8Error::RomUnreadable)?;
        self.load_program(&mut f)
    }

    /// load a chip8 program already in memory; kept so `reset` can reload it
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load_image(image)?;
        self.rom = image.to_vec();
        Ok(())
    }

    /// power-cycle the machine and reload the last program
    pub fn reset(&mut self) -> Result<(), Chip8Error> {
        let rng = std::mem::replace(&mut self.rng, StdRng::seed_from_u64(0));
        let rom = std::mem::take(&mut self.rom);
        *self = Self::with_rng(rng);
        self.load_image(&rom)
    }

    /// one fetch-decode-execute cycle
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.awaiting_key.is_some() {
            return Ok(StepOutcome::AwaitingKey);
        }

        let pc = self.program_counter;
        let word = match self.memory.get_word(pc) {
            Ok(word) => word,
            Err(fault) => return Err(self.halt(fault)),
        };
        self.current_instruction = word;
        self.program_counter = pc.wrapping_add(2);
        self.cycles += 1;

        let instruction = Instruction::decode(word);
        if let Err(fault) = self.execute(instruction) {
            // leave pc on the offending instruction
            self.program_counter = pc;
            return Err(self.halt(fault));
        }

        match instruction {
            Instruction::Unknown(word) => {
                self.unknown_opcodes += 1;
                self.last_diagnostic = Some(Diagnostic { addr: pc, word });
                Ok(StepOutcome::Unknown(word))
            }
            _ => Ok(StepOutcome::Executed(instruction)),
        }
    }

    /// one 60Hz tick of the delay and sound timers
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// Compare the keypad against its previous sample. A fresh press while
    /// awaiting a key lands in the pending register and resumes execution.
    pub fn poll_keys(&mut self) -> Option<u8> {
        let mut resolved = None;
        if let Some(target) = self.awaiting_key {
            if let Some(key) = self.keypad.newly_pressed() {
                self.registers[target] = key;
                self.awaiting_key = None;
                resolved = Some(key);
            }
        }
        self.keypad.latch();
        resolved
    }

    fn halt(&mut self, fault: Fault) -> Fault {
        self.fault = Some(fault.clone());
        fault
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    /// Apply one decoded instruction. Every bounds check happens before any
    /// state is touched, so a fault leaves the machine as it was.
    fn execute(&mut self, instruction: Instruction) -> Result<(), Fault> {
        use Instruction::*;
        let v = &mut self.registers;
        match instruction {
            Clear => self.frame = [false; DISPLAY_PIXELS],
            Return => {
                if self.stack_pointer == 0 {
                    return Err(Fault::StackUnderflow {
                        pc: self.program_counter.wrapping_sub(2),
                    });
                }
                self.stack_pointer -= 1;
                self.program_counter = self.stack[self.stack_pointer];
            }
            Jump { addr } => self.program_counter = addr,
            Call { addr } => {
                if self.stack_pointer == STACK_DEPTH {
                    return Err(Fault::StackOverflow {
                        pc: self.program_counter.wrapping_sub(2),
                    });
                }
                self.stack[self.stack_pointer] = self.program_counter;
                self.stack_pointer += 1;
                self.program_counter = addr;
            }
            SkipEqByte { x, byte } => {
                let c = v[x] == byte;
                self.skip_if(c)
            }
            SkipNeByte { x, byte } => {
                let c = v[x] != byte;
                self.skip_if(c)
            }
            SkipEqReg { x, y } => {
                let c = v[x] == v[y];
                self.skip_if(c)
            }
            SkipNeReg { x, y } => {
                let c = v[x] != v[y];
                self.skip_if(c)
            }
            LoadByte { x, byte } => v[x] = byte,
            AddByte { x, byte } => v[x] = v[x].wrapping_add(byte),
            Move { x, y } => v[x] = v[y],
            Or { x, y } => v[x] |= v[y],
            And { x, y } => v[x] &= v[y],
            Xor { x, y } => v[x] ^= v[y],
            AddReg { x, y } => {
                let (sum, carry) = v[x].overflowing_add(v[y]);
                v[x] = sum;
                v[FLAG] = carry as u8;
            }
            Sub { x, y } => {
                let no_borrow = v[x] >= v[y];
                v[x] = v[x].wrapping_sub(v[y]);
                v[FLAG] = no_borrow as u8;
            }
            ShiftRight { x } => {
                let lsb = v[x] & 0x01;
                v[x] >>= 1;
                v[FLAG] = lsb;
            }
            SubN { x, y } => {
                let no_borrow = v[y] >= v[x];
                v[x] = v[y].wrapping_sub(v[x]);
                v[FLAG] = no_borrow as u8;
            }
            ShiftLeft { x } => {
                let msb = (v[x] & 0x80 != 0) as u8;
                v[x] <<= 1;
                v[FLAG] = msb;
            }
            LoadIndex { addr } => self.index = addr,
            JumpOffset { addr } => self.program_counter = v[0] as u16 + addr,
            Random { x, byte } => v[x] = self.rng.gen::<u8>() & byte,
            Draw { x, y, n } => self.draw(x, y, n)?,
            SkipKeyDown { x } => {
                let c = self.keypad.is_down(v[x]);
                self.skip_if(c)
            }
            SkipKeyUp { x } => {
                let c = !self.keypad.is_down(v[x]);
                self.skip_if(c)
            }
            LoadDelay { x } => v[x] = self.timers.delay as u8,
            WaitKey { x } => {
                // only presses that happen from here on count
                self.keypad.latch();
                self.awaiting_key = Some(x);
            }
            SetDelay { x } => self.timers.delay = v[x] as u16,
            SetSound { x } => self.timers.sound = v[x] as u16,
            AddIndex { x } => self.index = self.index.wrapping_add(v[x] as u16),
            LoadGlyph { x } => self.index = self.memory.glyph_addr(v[x]),
            StoreBcd { x } => {
                let value = v[x];
                let bytes = self.memory.get_rw_slice(self.index, 3)?;
                bytes.copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
            }
            StoreRegs { x } => {
                let bytes = self.memory.get_rw_slice(self.index, x + 1)?;
                bytes.copy_from_slice(&v[..=x]);
            }
            LoadRegs { x } => {
                let bytes = self.memory.get_ro_slice(self.index, x + 1)?;
                v[..=x].copy_from_slice(bytes);
            }
            Unknown(_) => {}
        }
        Ok(())
    }

    /// XOR an n-row sprite from memory[I..] onto the frame at (Vx, Vy),
    /// wrapping at the edges. VF ends up 1 if any pixel anywhere in the
    /// sprite was turned off.
    fn draw(&mut self, x: usize, y: usize, n: u8) -> Result<(), Fault> {
        let sprite = self.memory.get_ro_slice(self.index, n as usize)?;
        let origin_x = self.registers[x] as usize % DISPLAY_WIDTH;
        let origin_y = self.registers[y] as usize % DISPLAY_HEIGHT;

        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            let py = (origin_y + row) % DISPLAY_HEIGHT;
            for col in 0..8 {
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let px = (origin_x + col) % DISPLAY_WIDTH;
                let pixel = &mut self.frame[py * DISPLAY_WIDTH + px];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        self.registers[FLAG] = collision as u8;
        Ok(())
    }

    // external collaborators: input

    pub fn set_key(&mut self, key: u8, down: bool) {
        self.keypad.set_key(key, down);
    }

    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.keypad.set_all(keys);
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    // control flags

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// register waiting on a key press, if any
    pub fn awaiting_key(&self) -> Option<usize> {
        self.awaiting_key
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    // external collaborators: renderer and debug views

    pub fn display(&self) -> &[bool; DISPLAY_PIXELS] {
        &self.frame
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.frame[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + x % DISPLAY_WIDTH]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    /// occupied part of the call stack, bottom first
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.stack_pointer]
    }

    pub fn stack_pointer(&self) -> usize {
        self.stack_pointer
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    pub fn sound_active(&self) -> bool {
        self.timers.sound_active()
    }

    /// word most recently fetched
    pub fn current_instruction(&self) -> u16 {
        self.current_instruction
    }

    pub fn last_diagnostic(&self) -> Option<Diagnostic> {
        self.last_diagnostic
    }

    pub fn unknown_opcode_count(&self) -> u64 {
        self.unknown_opcodes
    }

    /// instructions fetched since power-on
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }
}

impl Default for Chip8Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
