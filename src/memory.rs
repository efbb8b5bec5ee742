use crate::error::Chip8Error;

pub type TypeAddr = u16; // in reality u12

pub const MEM_SIZE: usize = 4096;
/// Font sprites live at 0x050..0x0A0; 0x000..0x050 is empty by convention.
pub const FONT_BASE: TypeAddr = 0x050;
/// Program code is loaded starting here.
pub const PROGRAM_BASE: TypeAddr = 0x200;
/// Bytes available above the program origin.
pub const MAX_PROGRAM_LEN: usize = MEM_SIZE - PROGRAM_BASE as usize;
/// Maximum number of nested subroutine calls.
pub const STACK_DEPTH: usize = 16;

type FontBytes = [u8; 5 * 16];

const FONT: FontBytes = [
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

/// 4k of machine memory with the font preloaded.
///
/// Every access is bounds-checked; an out-of-range address is a fatal
/// [`Chip8Error::OutOfBounds`] carrying the offending address.
pub struct Memory {
    bytes: [u8; MEM_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEM_SIZE];
        let base = FONT_BASE as usize;
        bytes[base..base + FONT.len()].copy_from_slice(&FONT);
        Self { bytes }
    }

    pub fn get(&self, addr: TypeAddr) -> Result<u8, Chip8Error> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Chip8Error::OutOfBounds { address: addr })
    }

    pub fn set(&mut self, addr: TypeAddr, val: u8) -> Result<(), Chip8Error> {
        match self.bytes.get_mut(addr as usize) {
            Some(slot) => {
                *slot = val;
                Ok(())
            }
            None => Err(Chip8Error::OutOfBounds { address: addr }),
        }
    }

    /// Big-endian instruction fetch at `pc`.
    pub fn fetch(&self, pc: TypeAddr) -> Result<u16, Chip8Error> {
        let hi = self.get(pc)?;
        let lo = self.get(pc + 1)?;
        Ok(u16::from(hi) << 8 | u16::from(lo))
    }

    /// Copy a program image in at the program origin.
    ///
    /// An oversized image is rejected before any byte is written.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        if program.len() > MAX_PROGRAM_LEN {
            return Err(Chip8Error::ProgramTooLarge { len: program.len() });
        }
        let base = PROGRAM_BASE as usize;
        self.bytes[base..base + program.len()].copy_from_slice(program);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded return-address stack.
///
/// The stack pointer tracks the next free slot; pushing a seventeenth frame
/// or popping from empty is a fatal fault.
pub struct Stack {
    frames: [TypeAddr; STACK_DEPTH],
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            frames: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: TypeAddr) -> Result<(), Chip8Error> {
        if self.sp == STACK_DEPTH {
            return Err(Chip8Error::StackOverflow);
        }
        self.frames[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<TypeAddr, Chip8Error> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.frames[self.sp])
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
