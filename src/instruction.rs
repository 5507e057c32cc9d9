//! Instruction decoding.
//!
//! A fetched 16-bit word is classified exactly once into an [`Instruction`];
//! the interpreter then matches exhaustively over it. Words outside the base
//! instruction set decode to [`Instruction::Unknown`].

use std::fmt;

/// Operand fields of an instruction word (bits numbered 15..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word(pub u16);

impl Word {
    /// bits 15-12
    pub fn group(self) -> u8 {
        (self.0 >> 12) as u8
    }
    /// bits 11-0
    pub fn addr(self) -> u16 {
        self.0 & 0x0fff
    }
    /// bits 11-8
    pub fn x(self) -> usize {
        ((self.0 >> 8) & 0xf) as usize
    }
    /// bits 7-4
    pub fn y(self) -> usize {
        ((self.0 >> 4) & 0xf) as usize
    }
    /// bits 3-0
    pub fn n(self) -> u8 {
        (self.0 & 0xf) as u8
    }
    /// bits 7-0
    pub fn byte(self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump { addr: u16 },
    /// 2nnn
    Call { addr: u16 },
    /// 3xkk
    SkipEqByte { x: usize, byte: u8 },
    /// 4xkk
    SkipNeByte { x: usize, byte: u8 },
    /// 5xy0
    SkipEqReg { x: usize, y: usize },
    /// 6xkk
    LoadByte { x: usize, byte: u8 },
    /// 7xkk
    AddByte { x: usize, byte: u8 },
    /// 8xy0
    Move { x: usize, y: usize },
    /// 8xy1
    Or { x: usize, y: usize },
    /// 8xy2
    And { x: usize, y: usize },
    /// 8xy3
    Xor { x: usize, y: usize },
    /// 8xy4
    AddReg { x: usize, y: usize },
    /// 8xy5
    Sub { x: usize, y: usize },
    /// 8xy6
    ShiftRight { x: usize },
    /// 8xy7
    SubN { x: usize, y: usize },
    /// 8xyE
    ShiftLeft { x: usize },
    /// 9xy0
    SkipNeReg { x: usize, y: usize },
    /// Annn
    LoadIndex { addr: u16 },
    /// Bnnn
    JumpOffset { addr: u16 },
    /// Cxkk
    Random { x: usize, byte: u8 },
    /// Dxyn
    Draw { x: usize, y: usize, n: u8 },
    /// Ex9E
    SkipKeyDown { x: usize },
    /// ExA1
    SkipKeyUp { x: usize },
    /// Fx07
    LoadDelay { x: usize },
    /// Fx0A
    WaitKey { x: usize },
    /// Fx15
    SetDelay { x: usize },
    /// Fx18
    SetSound { x: usize },
    /// Fx1E
    AddIndex { x: usize },
    /// Fx29
    LoadGlyph { x: usize },
    /// Fx33
    StoreBcd { x: usize },
    /// Fx55
    StoreRegs { x: usize },
    /// Fx65
    LoadRegs { x: usize },
    /// anything outside the base instruction set
    Unknown(u16),
}

impl Instruction {
    pub fn decode(word: u16) -> Self {
        use Instruction::*;
        let w = Word(word);
        let (x, y) = (w.x(), w.y());
        match w.group() {
            // the system group is told apart by its low nibble alone
            0x0 => match w.n() {
                0x0 => Clear,
                0xe => Return,
                _ => Unknown(word),
            },
            0x1 => Jump { addr: w.addr() },
            0x2 => Call { addr: w.addr() },
            0x3 => SkipEqByte { x, byte: w.byte() },
            0x4 => SkipNeByte { x, byte: w.byte() },
            0x5 => SkipEqReg { x, y },
            0x6 => LoadByte { x, byte: w.byte() },
            0x7 => AddByte { x, byte: w.byte() },
            0x8 => match w.n() {
                0x0 => Move { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddReg { x, y },
                0x5 => Sub { x, y },
                0x6 => ShiftRight { x },
                0x7 => SubN { x, y },
                0xe => ShiftLeft { x },
                _ => Unknown(word),
            },
            0x9 => SkipNeReg { x, y },
            0xa => LoadIndex { addr: w.addr() },
            0xb => JumpOffset { addr: w.addr() },
            0xc => Random { x, byte: w.byte() },
            0xd => Draw { x, y, n: w.n() },
            0xe => match w.byte() {
                0x9e => SkipKeyDown { x },
                0xa1 => SkipKeyUp { x },
                _ => Unknown(word),
            },
            0xf => match w.byte() {
                0x07 => LoadDelay { x },
                0x0a => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1e => AddIndex { x },
                0x29 => LoadGlyph { x },
                0x33 => StoreBcd { x },
                0x55 => StoreRegs { x },
                0x65 => LoadRegs { x },
                _ => Unknown(word),
            },
            _ => Unknown(word),
        }
    }
}

/// Mnemonics in the style of Cowgod's reference, for debug views.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Clear => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { addr } => write!(f, "JP {:#05x}", addr),
            Call { addr } => write!(f, "CALL {:#05x}", addr),
            SkipEqByte { x, byte } => write!(f, "SE V{:X}, {:#04x}", x, byte),
            SkipNeByte { x, byte } => write!(f, "SNE V{:X}, {:#04x}", x, byte),
            SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadByte { x, byte } => write!(f, "LD V{:X}, {:#04x}", x, byte),
            AddByte { x, byte } => write!(f, "ADD V{:X}, {:#04x}", x, byte),
            Move { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x } => write!(f, "SHR V{:X}", x),
            SubN { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x } => write!(f, "SHL V{:X}", x),
            SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex { addr } => write!(f, "LD I, {:#05x}", addr),
            JumpOffset { addr } => write!(f, "JP V0, {:#05x}", addr),
            Random { x, byte } => write!(f, "RND V{:X}, {:#04x}", x, byte),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipKeyDown { x } => write!(f, "SKP V{:X}", x),
            SkipKeyUp { x } => write!(f, "SKNP V{:X}", x),
            LoadDelay { x } => write!(f, "LD V{:X}, DT", x),
            WaitKey { x } => write!(f, "LD V{:X}, K", x),
            SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            SetSound { x } => write!(f, "LD ST, V{:X}", x),
            AddIndex { x } => write!(f, "ADD I, V{:X}", x),
            LoadGlyph { x } => write!(f, "LD F, V{:X}", x),
            StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            StoreRegs { x } => write!(f, "LD [I], V{:X}", x),
            LoadRegs { x } => write!(f, "LD V{:X}, [I]", x),
            Unknown(word) => write!(f, "??? {:#06x}", word),
        }
    }
}
