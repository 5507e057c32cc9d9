use std::io;
use thiserror::Error;

/// A fault raised by a single instruction. The machine halts on the first
/// one and keeps reporting it until it is reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("memory access out of bounds: {len} byte(s) at {addr:#06x}")]
    AddressOutOfBounds { addr: usize, len: usize },

    #[error("stack overflow: call at {pc:#06x} exceeds 16 nested subroutines")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06x} with an empty call stack")]
    StackUnderflow { pc: u16 },
}

/// Errors surfaced to whoever is driving the interpreter.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("unable to read ROM: {0}")]
    RomUnreadable(#[source] io::Error),

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("machine halted: {0}")]
    Fault(#[from] Fault),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}
