//! Pure decode tables for the 16-bit CHIP-8 instruction word.
//!
//! The high nibble selects the operation family; families 0x0, 0x8, 0xE and
//! 0xF use the low byte or low nibble as a secondary selector. Decoding is
//! total: every word maps to a known operation or to [`OpCode::Unknown`].

use crate::memory::TypeAddr;

/// `[_X__]` first register operand.
fn x(word: u16) -> u8 {
    ((word & 0x0F00) >> 8) as u8
}

/// `[__Y_]` second register operand.
fn y(word: u16) -> u8 {
    ((word & 0x00F0) >> 4) as u8
}

/// `[___N]` immediate nibble.
fn n(word: u16) -> u8 {
    (word & 0x000F) as u8
}

/// `[__NN]` immediate byte.
fn nn(word: u16) -> u8 {
    (word & 0x00FF) as u8
}

/// `[_NNN]` immediate 12-bit address.
fn nnn(word: u16) -> TypeAddr {
    word & 0x0FFF
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// 00E0: turn every pixel off.
    ClearScreen,
    /// 00EE: pop the return address into PC.
    Return,
    /// 1NNN: PC := NNN.
    Jump(TypeAddr),
    /// 2NNN: push PC, then PC := NNN.
    Call(TypeAddr),
    /// 3XNN: skip next instruction if Vx == NN.
    SkipEqImm(u8, u8),
    /// 4XNN: skip next instruction if Vx != NN.
    SkipNeImm(u8, u8),
    /// 5XY0: skip next instruction if Vx == Vy.
    SkipEqReg(u8, u8),
    /// 6XNN: Vx := NN.
    SetImm(u8, u8),
    /// 7XNN: Vx := Vx + NN, no flag.
    AddImm(u8, u8),
    /// 8XY0: Vx := Vy.
    Copy(u8, u8),
    /// 8XY1: Vx := Vx | Vy.
    Or(u8, u8),
    /// 8XY2: Vx := Vx & Vy.
    And(u8, u8),
    /// 8XY3: Vx := Vx ^ Vy.
    Xor(u8, u8),
    /// 8XY4: Vx := Vx + Vy, VF = carry.
    Add(u8, u8),
    /// 8XY5: Vx := Vx - Vy, VF = no borrow.
    Sub(u8, u8),
    /// 8XY6: VF = lsb of Vx, then Vx >>= 1.
    ShiftRight(u8, u8),
    /// 8XY7: Vx := Vy - Vx, VF = no borrow.
    SubRev(u8, u8),
    /// 8XYE: VF = msb of Vx, then Vx <<= 1.
    ShiftLeft(u8, u8),
    /// 9XY0: skip next instruction if Vx != Vy.
    SkipNeReg(u8, u8),
    /// ANNN: I := NNN.
    SetIndex(TypeAddr),
    /// BNNN: PC := V0 + NNN.
    JumpOffset(TypeAddr),
    /// CXNN: Vx := random byte & NN.
    Random(u8, u8),
    /// DXYN: XOR-draw an N-byte sprite from I at (Vx, Vy), VF = collision.
    Draw(u8, u8, u8),
    /// EX9E: skip next instruction if keypad[Vx] is pressed.
    SkipKeyPressed(u8),
    /// EXA1: skip next instruction if keypad[Vx] is not pressed.
    SkipKeyNotPressed(u8),
    /// FX07: Vx := delay timer.
    ReadDelay(u8),
    /// FX0A: suspend until a key is pressed, then Vx := its code.
    WaitKey(u8),
    /// FX15: delay timer := Vx.
    SetDelay(u8),
    /// FX18: sound timer := Vx.
    SetSound(u8),
    /// FX1E: I := I + Vx, 12-bit wraparound, VF untouched.
    AddIndex(u8),
    /// FX29: I := font address of the hex character in Vx.
    FontChar(u8),
    /// FX33: store the decimal digits of Vx at I, I+1, I+2.
    StoreBcd(u8),
    /// FX55: store V0..=Vx at I.., I unchanged.
    StoreRegs(u8),
    /// FX65: load V0..=Vx from I.., I unchanged.
    LoadRegs(u8),
    /// No matching operation; carried for reporting.
    Unknown(u16),
}

impl OpCode {
    pub fn decode(word: u16) -> Self {
        match word >> 12 {
            0x0 => match word {
                0x00E0 => Self::ClearScreen,
                0x00EE => Self::Return,
                _ => Self::Unknown(word),
            },
            0x1 => Self::Jump(nnn(word)),
            0x2 => Self::Call(nnn(word)),
            0x3 => Self::SkipEqImm(x(word), nn(word)),
            0x4 => Self::SkipNeImm(x(word), nn(word)),
            0x5 => match n(word) {
                0x0 => Self::SkipEqReg(x(word), y(word)),
                _ => Self::Unknown(word),
            },
            0x6 => Self::SetImm(x(word), nn(word)),
            0x7 => Self::AddImm(x(word), nn(word)),
            0x8 => {
                let (x, y) = (x(word), y(word));
                match n(word) {
                    0x0 => Self::Copy(x, y),
                    0x1 => Self::Or(x, y),
                    0x2 => Self::And(x, y),
                    0x3 => Self::Xor(x, y),
                    0x4 => Self::Add(x, y),
                    0x5 => Self::Sub(x, y),
                    0x6 => Self::ShiftRight(x, y),
                    0x7 => Self::SubRev(x, y),
                    0xE => Self::ShiftLeft(x, y),
                    _ => Self::Unknown(word),
                }
            }
            0x9 => match n(word) {
                0x0 => Self::SkipNeReg(x(word), y(word)),
                _ => Self::Unknown(word),
            },
            0xA => Self::SetIndex(nnn(word)),
            0xB => Self::JumpOffset(nnn(word)),
            0xC => Self::Random(x(word), nn(word)),
            0xD => Self::Draw(x(word), y(word), n(word)),
            0xE => match nn(word) {
                0x9E => Self::SkipKeyPressed(x(word)),
                0xA1 => Self::SkipKeyNotPressed(x(word)),
                _ => Self::Unknown(word),
            },
            0xF => match nn(word) {
                0x07 => Self::ReadDelay(x(word)),
                0x0A => Self::WaitKey(x(word)),
                0x15 => Self::SetDelay(x(word)),
                0x18 => Self::SetSound(x(word)),
                0x1E => Self::AddIndex(x(word)),
                0x29 => Self::FontChar(x(word)),
                0x33 => Self::StoreBcd(x(word)),
                0x55 => Self::StoreRegs(x(word)),
                0x65 => Self::LoadRegs(x(word)),
                _ => Self::Unknown(word),
            },
            _ => unreachable!("u16 >> 12 is a nibble"),
        }
    }
}
