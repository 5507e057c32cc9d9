use crate::error::{Chip8Error, Fault};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the machine's address space. All access is bounds-checked;
/// nothing ever wraps silently past the end of RAM.
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), Fault> {
        let bytes = self.get_rw_slice(addr, data.len())?;
        bytes.copy_from_slice(data);
        Ok(())
    }

    /// get a two-byte big-endian word (instruction fetch)
    fn get_word(&self, addr: u16) -> Result<u16, Fault> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    fn get_byte(&self, addr: u16) -> Result<u8, Fault> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault>;
}

/// Defines the CHIP-8 memory map (4K configuration):
///   0x0000-0x004f  unused
///   0x0050-0x009f  font table, 16 glyphs of 5 bytes
///   0x00a0-0x01ff  unused
///   0x0200-0x0fff  program and work area
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub program_addr: u16,
    pub font_addr: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Fault> {
        let range = self.checked_range(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Fault> {
        let range = self.checked_range(addr, len)?;
        Ok(&self.bytes[range])
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// largest program that fits between the program base and the top of RAM
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

impl Chip8MemoryMap {
    /// zeroed RAM with the font table baked in
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap {
            bytes,
            program_addr: CHIP8_PROGRAM_ADDR,
            font_addr: CHIP8_FONT_ADDR,
        }
    }

    /// copy an in-memory ROM image to 0x200
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), Chip8Error> {
        if image.len() > CHIP8_MAX_PROGRAM_BYTES {
            return Err(Chip8Error::RomTooLarge {
                size: image.len(),
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        self.write(image, self.program_addr)?;
        Ok(())
    }

    /// address of the 5-byte glyph for a hex digit (upper nibble ignored)
    pub fn glyph_addr(&self, digit: u8) -> u16 {
        self.font_addr + GLYPH_BYTES as u16 * (digit & 0x0f) as u16
    }

    /// the whole of RAM, for debug views
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    fn checked_range(&self, addr: u16, len: usize) -> Result<std::ops::Range<usize>, Fault> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(Fault::AddressOutOfBounds { addr: start, len }),
        }
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

pub const GLYPH_BYTES: usize = 5;

pub const CHIP8_FONT_ADDR: u16 = 0x050;
pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
