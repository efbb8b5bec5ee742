/// The register file: sixteen general-purpose 8-bit registers V0..VF.
///
/// VF (index 0xF) doubles as the flag register. Flag-producing opcodes write
/// it through [`Registers::set_flag`], which lands in the same array as any
/// other register write, so flag semantics and general-register semantics
/// cannot diverge.
pub struct Registers {
    v: [u8; 16],
}

/// Index of the flag register.
pub const VF: u8 = 0xF;

impl Registers {
    pub fn new() -> Self {
        Self { v: [0; 16] }
    }

    pub fn get(&self, reg: u8) -> u8 {
        self.v[reg as usize]
    }

    pub fn set(&mut self, reg: u8, value: u8) {
        self.v[reg as usize] = value;
    }

    /// Write a carry/borrow/collision flag to VF.
    pub fn set_flag(&mut self, flag: bool) {
        self.v[VF as usize] = u8::from(flag);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
