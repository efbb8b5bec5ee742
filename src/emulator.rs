use log::{debug, error, trace, warn};
use rand::Rng;

use crate::decode::OpCode;
use crate::display::FrameBuffer;
use crate::error::Chip8Error;
use crate::keyboard::Keypad;
use crate::memory::{Memory, Stack, TypeAddr, FONT_BASE, PROGRAM_BASE};
use crate::registers::Registers;

/// Execution mode of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Running,
    /// FX0A is suspended on this instruction; the first key transition to
    /// pressed stores its code in register `dest` and resumes execution.
    AwaitingKey { dest: u8 },
    /// Terminal: entered on a fatal fault or an explicit halt request.
    Halted,
}

/// The CHIP-8 machine: memory, registers, call stack, timers, framebuffer
/// and keypad, plus the fetch-decode-execute interpreter driving them.
///
/// [`Emulator::step`] executes exactly one instruction. Timers are advanced
/// separately through [`Emulator::tick_timers`] so the scheduler can hold
/// them at 60 Hz regardless of instruction throughput.
pub struct Emulator {
    pub mem: Memory,
    pub regs: Registers,
    stack: Stack,
    fb: FrameBuffer,
    keypad: Keypad,
    pc: TypeAddr,
    index: TypeAddr,
    delay_timer: u8,
    sound_timer: u8,
    mode: Mode,
}

impl Emulator {
    pub fn new() -> Self {
        Self {
            mem: Memory::new(),
            regs: Registers::new(),
            stack: Stack::new(),
            fb: FrameBuffer::new(),
            keypad: Keypad::new(),
            pc: PROGRAM_BASE,
            index: 0,
            delay_timer: 0,
            sound_timer: 0,
            mode: Mode::Running,
        }
    }

    /// Copy a program image in at the program origin. Rejected before any
    /// write if it does not fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        self.mem.load_program(program)
    }

    /// Apply a key press or release event.
    ///
    /// Codes outside 0x0..=0xF are rejected without mutating state. A press
    /// transition wakes the machine if it is awaiting a key.
    pub fn set_key(&mut self, code: u8, pressed: bool) {
        if code > 0xF {
            debug!("ignoring key event for code {code:#04X}");
            return;
        }
        let was_pressed = self.keypad.is_pressed(code);
        self.keypad.set(code, pressed);
        if pressed && !was_pressed {
            if let Mode::AwaitingKey { dest } = self.mode {
                self.regs.set(dest, code);
                self.mode = Mode::Running;
            }
        }
    }

    /// Returns the pixel grid if it changed since the last call, clearing
    /// the dirty flag.
    pub fn take_frame(&mut self) -> Option<&[bool]> {
        self.fb.take_frame()
    }

    /// Request the terminal state; takes effect before the next fetch.
    pub fn halt(&mut self) {
        self.mode = Mode::Halted;
    }

    pub fn is_halted(&self) -> bool {
        self.mode == Mode::Halted
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pc(&self) -> TypeAddr {
        self.pc
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Whether the buzzer should currently be sounding.
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// Decrement both timers by at most one. Returns true on the tick where
    /// the sound timer's pre-decrement value is exactly 1, the one-shot
    /// buzzer signal.
    pub fn tick_timers(&mut self) -> bool {
        let beep = self.sound_timer == 1;
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
        beep
    }

    /// Execute exactly one instruction: bounds-checked big-endian fetch,
    /// advance PC by 2, decode, dispatch.
    ///
    /// A no-op while halted or awaiting a key. Fatal faults halt the
    /// machine and are passed back to the caller.
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        match self.mode {
            Mode::Running => {}
            Mode::AwaitingKey { .. } | Mode::Halted => return Ok(()),
        }
        if let Err(fault) = self.fetch_execute() {
            error!("machine fault at pc {:#05X}: {fault}", self.pc);
            self.mode = Mode::Halted;
            return Err(fault);
        }
        Ok(())
    }

    fn fetch_execute(&mut self) -> Result<(), Chip8Error> {
        let word = self.mem.fetch(self.pc)?;
        // advance past the fetched word before executing, so control-flow
        // opcodes set an absolute PC that is not further offset
        self.pc += 2;
        let op = OpCode::decode(word);
        trace!("{word:04X} {op:?} pc={:03X} i={:03X}", self.pc, self.index);
        self.execute(op)
    }

    fn execute(&mut self, op: OpCode) -> Result<(), Chip8Error> {
        match op {
            OpCode::ClearScreen => self.fb.clear(),
            OpCode::Return => self.pc = self.stack.pop()?,
            OpCode::Jump(addr) => self.pc = addr,
            OpCode::Call(addr) => {
                self.stack.push(self.pc)?;
                self.pc = addr;
            }
            OpCode::SkipEqImm(x, nn) => {
                if self.regs.get(x) == nn {
                    self.pc += 2;
                }
            }
            OpCode::SkipNeImm(x, nn) => {
                if self.regs.get(x) != nn {
                    self.pc += 2;
                }
            }
            OpCode::SkipEqReg(x, y) => {
                if self.regs.get(x) == self.regs.get(y) {
                    self.pc += 2;
                }
            }
            OpCode::SetImm(x, nn) => self.regs.set(x, nn),
            OpCode::AddImm(x, nn) => self.regs.set(x, self.regs.get(x).wrapping_add(nn)),
            OpCode::Copy(x, y) => self.regs.set(x, self.regs.get(y)),
            OpCode::Or(x, y) => self.regs.set(x, self.regs.get(x) | self.regs.get(y)),
            OpCode::And(x, y) => self.regs.set(x, self.regs.get(x) & self.regs.get(y)),
            OpCode::Xor(x, y) => self.regs.set(x, self.regs.get(x) ^ self.regs.get(y)),
            OpCode::Add(x, y) => {
                let (sum, carry) = self.regs.get(x).overflowing_add(self.regs.get(y));
                self.regs.set(x, sum);
                self.regs.set_flag(carry);
            }
            OpCode::Sub(x, y) => {
                let (diff, borrow) = self.regs.get(x).overflowing_sub(self.regs.get(y));
                self.regs.set(x, diff);
                self.regs.set_flag(!borrow);
            }
            OpCode::ShiftRight(x, _y) => {
                let vx = self.regs.get(x);
                self.regs.set(x, vx >> 1);
                self.regs.set_flag(vx & 0x1 == 0x1);
            }
            OpCode::SubRev(x, y) => {
                let (diff, borrow) = self.regs.get(y).overflowing_sub(self.regs.get(x));
                self.regs.set(x, diff);
                self.regs.set_flag(!borrow);
            }
            OpCode::ShiftLeft(x, _y) => {
                let vx = self.regs.get(x);
                self.regs.set(x, vx << 1);
                self.regs.set_flag(vx & 0x80 == 0x80);
            }
            OpCode::SkipNeReg(x, y) => {
                if self.regs.get(x) != self.regs.get(y) {
                    self.pc += 2;
                }
            }
            OpCode::SetIndex(addr) => self.index = addr,
            OpCode::JumpOffset(addr) => self.pc = addr + TypeAddr::from(self.regs.get(0)),
            OpCode::Random(x, nn) => {
                let byte: u8 = rand::thread_rng().gen();
                self.regs.set(x, byte & nn);
            }
            OpCode::Draw(x, y, n) => {
                let mut sprite = [0u8; 15];
                let rows = &mut sprite[..n as usize];
                for (offset, row) in rows.iter_mut().enumerate() {
                    *row = self.mem.get(self.index + offset as TypeAddr)?;
                }
                let collision = self.fb.draw(self.regs.get(x), self.regs.get(y), rows);
                self.regs.set_flag(collision);
            }
            OpCode::SkipKeyPressed(x) => {
                if self.keypad.is_pressed(self.regs.get(x)) {
                    self.pc += 2;
                }
            }
            OpCode::SkipKeyNotPressed(x) => {
                if !self.keypad.is_pressed(self.regs.get(x)) {
                    self.pc += 2;
                }
            }
            OpCode::ReadDelay(x) => self.regs.set(x, self.delay_timer),
            OpCode::WaitKey(x) => self.mode = Mode::AwaitingKey { dest: x },
            OpCode::SetDelay(x) => self.delay_timer = self.regs.get(x),
            OpCode::SetSound(x) => self.sound_timer = self.regs.get(x),
            OpCode::AddIndex(x) => {
                self.index = (self.index + TypeAddr::from(self.regs.get(x))) & 0x0FFF;
            }
            OpCode::FontChar(x) => {
                self.index = FONT_BASE + 5 * TypeAddr::from(self.regs.get(x));
            }
            OpCode::StoreBcd(x) => {
                let value = self.regs.get(x);
                self.mem.set(self.index, value / 100)?;
                self.mem.set(self.index + 1, value / 10 % 10)?;
                self.mem.set(self.index + 2, value % 10)?;
            }
            OpCode::StoreRegs(x) => {
                for reg in 0..=x {
                    self.mem
                        .set(self.index + TypeAddr::from(reg), self.regs.get(reg))?;
                }
            }
            OpCode::LoadRegs(x) => {
                for reg in 0..=x {
                    let value = self.mem.get(self.index + TypeAddr::from(reg))?;
                    self.regs.set(reg, value);
                }
            }
            OpCode::Unknown(word) => warn!("unknown opcode {word:#06X}, continuing"),
        }
        Ok(())
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::VF;

    /// Load `program` and step `steps` instructions, asserting none fault.
    fn run(program: &[u8], steps: usize) -> Emulator {
        let mut emu = Emulator::new();
        emu.load_program(program).unwrap();
        for _ in 0..steps {
            emu.step().unwrap();
        }
        emu
    }

    #[test]
    fn test_00e0_clears_screen_and_marks_dirty() {
        // draw the 0 font sprite, then clear
        let mut emu = run(&[0xF0, 0x29, 0xD0, 0x05, 0x00, 0xE0], 2);
        emu.take_frame();
        emu.step().unwrap();
        let frame = emu.take_frame().expect("clear marks the frame dirty");
        assert!(frame.iter().all(|&pixel| !pixel));
    }

    #[test]
    fn test_call_and_return_round_trip() {
        // 0x200: call 0x206; 0x206: return
        let mut emu = run(&[0x22, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0xEE], 1);
        assert_eq!(emu.pc(), 0x206);
        emu.step().unwrap();
        // back at the instruction immediately after the call
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn test_return_on_empty_stack_is_fatal() {
        let mut emu = Emulator::new();
        emu.load_program(&[0x00, 0xEE]).unwrap();
        assert_eq!(emu.step().unwrap_err(), Chip8Error::StackUnderflow);
        assert!(emu.is_halted());
    }

    #[test]
    fn test_nested_calls_beyond_sixteen_overflow() {
        // 0x200: call 0x200, forever
        let mut emu = Emulator::new();
        emu.load_program(&[0x22, 0x00]).unwrap();
        for _ in 0..16 {
            emu.step().unwrap();
        }
        assert_eq!(emu.step().unwrap_err(), Chip8Error::StackOverflow);
        assert!(emu.is_halted());
    }

    #[test]
    fn test_jump_sets_absolute_pc() {
        let emu = run(&[0x1A, 0xBC], 1);
        assert_eq!(emu.pc(), 0xABC);
    }

    #[test]
    fn test_skip_family() {
        // V1 = 0x11, then 3XNN taken
        let emu = run(&[0x61, 0x11, 0x31, 0x11], 2);
        assert_eq!(emu.pc(), 0x206);
        // 3XNN not taken
        let emu = run(&[0x61, 0x11, 0x31, 0x22], 2);
        assert_eq!(emu.pc(), 0x204);
        // 4XNN taken
        let emu = run(&[0x61, 0x11, 0x41, 0x22], 2);
        assert_eq!(emu.pc(), 0x206);
        // 5XY0 taken on equal registers
        let emu = run(&[0x61, 0x11, 0x62, 0x11, 0x51, 0x20], 3);
        assert_eq!(emu.pc(), 0x208);
        // 9XY0 taken on unequal registers
        let emu = run(&[0x61, 0x11, 0x91, 0x20], 2);
        assert_eq!(emu.pc(), 0x206);
    }

    #[test]
    fn test_7xnn_wraps_without_flag() {
        let emu = run(&[0x61, 0xFF, 0x6F, 0x55, 0x71, 0x02], 3);
        assert_eq!(emu.regs.get(0x1), 0x01);
        assert_eq!(emu.regs.get(VF), 0x55);
    }

    #[test]
    fn test_8xy4_add_with_carry() {
        let emu = run(&[0x61, 0xFF, 0x62, 0x01, 0x81, 0x24], 3);
        assert_eq!(emu.regs.get(0x1), 0x00);
        assert_eq!(emu.regs.get(VF), 0x1);

        let emu = run(&[0x61, 0x01, 0x62, 0x01, 0x81, 0x24], 3);
        assert_eq!(emu.regs.get(0x1), 0x02);
        assert_eq!(emu.regs.get(VF), 0x0);
    }

    #[test]
    fn test_8xy5_sub_with_borrow_flag() {
        let emu = run(&[0x61, 0x05, 0x62, 0x03, 0x81, 0x25], 3);
        assert_eq!(emu.regs.get(0x1), 0x02);
        assert_eq!(emu.regs.get(VF), 0x1);

        let emu = run(&[0x61, 0x03, 0x62, 0x05, 0x81, 0x25], 3);
        assert_eq!(emu.regs.get(0x1), 0xFE);
        assert_eq!(emu.regs.get(VF), 0x0);
    }

    #[test]
    fn test_8xy7_reverse_sub() {
        let emu = run(&[0x61, 0x03, 0x62, 0x05, 0x81, 0x27], 3);
        assert_eq!(emu.regs.get(0x1), 0x02);
        assert_eq!(emu.regs.get(VF), 0x1);

        let emu = run(&[0x61, 0x05, 0x62, 0x03, 0x81, 0x27], 3);
        assert_eq!(emu.regs.get(0x1), 0xFE);
        assert_eq!(emu.regs.get(VF), 0x0);
    }

    #[test]
    fn test_8xy6_shift_right_captures_lsb() {
        let emu = run(&[0x61, 0x03, 0x81, 0x06], 2);
        assert_eq!(emu.regs.get(0x1), 0x01);
        assert_eq!(emu.regs.get(VF), 0x1);
    }

    #[test]
    fn test_8xye_shift_left_captures_msb() {
        let emu = run(&[0x61, 0x81, 0x81, 0x0E], 2);
        assert_eq!(emu.regs.get(0x1), 0x02);
        assert_eq!(emu.regs.get(VF), 0x1);
    }

    #[test]
    fn test_flag_lands_in_general_register_f() {
        // VF participates as a general register until a flag overwrites it
        let emu = run(&[0x6F, 0x42, 0x61, 0x01, 0x62, 0x01, 0x81, 0x24], 4);
        assert_eq!(emu.regs.get(VF), 0x0);
    }

    #[test]
    fn test_bitwise_family() {
        let emu = run(&[0x61, 0x06, 0x62, 0x03, 0x81, 0x21], 3);
        assert_eq!(emu.regs.get(0x1), 0x07);
        let emu = run(&[0x61, 0x06, 0x62, 0x03, 0x81, 0x22], 3);
        assert_eq!(emu.regs.get(0x1), 0x02);
        let emu = run(&[0x61, 0x06, 0x62, 0x03, 0x81, 0x23], 3);
        assert_eq!(emu.regs.get(0x1), 0x05);
    }

    #[test]
    fn test_annn_and_bnnn() {
        let emu = run(&[0xA2, 0x34], 1);
        assert_eq!(emu.index, 0x234);

        let emu = run(&[0x60, 0x02, 0xB2, 0x34], 2);
        assert_eq!(emu.pc(), 0x236);
    }

    #[test]
    fn test_cxnn_masks_random_byte() {
        let emu = run(&[0xC1, 0x0F], 1);
        assert_eq!(emu.regs.get(0x1) & 0xF0, 0x00);
    }

    #[test]
    fn test_dxyn_draws_and_detects_collision() {
        // I = font 0, draw at (0,0) twice: everything XORs back off
        let emu = run(&[0xF0, 0x29, 0xD0, 0x05], 2);
        assert_eq!(emu.regs.get(VF), 0x0);
        assert!(emu.fb.pixel(0, 0));
        let emu = run(&[0xF0, 0x29, 0xD0, 0x05, 0xD0, 0x05], 3);
        assert_eq!(emu.regs.get(VF), 0x1);
        assert!(!emu.fb.pixel(0, 0));
    }

    #[test]
    fn test_ex9e_exa1_key_skips() {
        let mut emu = Emulator::new();
        emu.load_program(&[0x61, 0x0E, 0xE1, 0x9E, 0x00, 0x00, 0xE1, 0xA1])
            .unwrap();
        emu.set_key(0xE, true);
        emu.step().unwrap();
        emu.step().unwrap();
        // EX9E skipped over 0x204
        assert_eq!(emu.pc(), 0x206);
        emu.step().unwrap();
        // EXA1 not taken while the key is down
        assert_eq!(emu.pc(), 0x208);
    }

    #[test]
    fn test_fx0a_suspends_until_key_press() {
        let mut emu = Emulator::new();
        emu.load_program(&[0xF1, 0x0A]).unwrap();
        emu.step().unwrap();
        assert_eq!(emu.mode(), Mode::AwaitingKey { dest: 0x1 });
        let suspended_pc = emu.pc();
        emu.step().unwrap();
        assert_eq!(emu.pc(), suspended_pc);
        // a release does not wake it
        emu.set_key(0xB, false);
        assert_eq!(emu.mode(), Mode::AwaitingKey { dest: 0x1 });
        emu.set_key(0xB, true);
        assert_eq!(emu.mode(), Mode::Running);
        assert_eq!(emu.regs.get(0x1), 0xB);
    }

    #[test]
    fn test_out_of_range_key_code_is_rejected() {
        let mut emu = Emulator::new();
        emu.set_key(0x10, true);
        assert!((0x0..=0xF).all(|code| !emu.keypad.is_pressed(code)));
    }

    #[test]
    fn test_timer_opcodes() {
        let emu = run(&[0x61, 0x2A, 0xF1, 0x15, 0xF1, 0x18, 0xF2, 0x07], 4);
        assert_eq!(emu.delay_timer(), 0x2A);
        assert_eq!(emu.sound_timer(), 0x2A);
        assert_eq!(emu.regs.get(0x2), 0x2A);
    }

    #[test]
    fn test_timers_stop_at_zero() {
        let mut emu = run(&[0x61, 0x03, 0xF1, 0x15], 2);
        for _ in 0..3 {
            emu.tick_timers();
        }
        assert_eq!(emu.delay_timer(), 0);
        emu.tick_timers();
        assert_eq!(emu.delay_timer(), 0);
    }

    #[test]
    fn test_buzzer_fires_once_when_sound_timer_expires() {
        let mut emu = run(&[0x61, 0x02, 0xF1, 0x18], 2);
        assert!(!emu.tick_timers());
        assert!(emu.sound_active());
        assert!(emu.tick_timers());
        assert!(!emu.sound_active());
        assert!(!emu.tick_timers());
    }

    #[test]
    fn test_fx1e_wraps_at_twelve_bits() {
        let emu = run(&[0xAF, 0xFF, 0x61, 0x02, 0xF1, 0x1E], 3);
        assert_eq!(emu.index, 0x001);
    }

    #[test]
    fn test_fx29_points_at_font_sprite() {
        let emu = run(&[0x61, 0x02, 0xF1, 0x29], 2);
        assert_eq!(emu.index, FONT_BASE + 10);
    }

    #[test]
    fn test_fx33_stores_decimal_digits() {
        // V1 = 157, I = 0x300
        let emu = run(&[0x61, 0x9D, 0xA3, 0x00, 0xF1, 0x33], 3);
        assert_eq!(emu.mem.get(0x300).unwrap(), 1);
        assert_eq!(emu.mem.get(0x301).unwrap(), 5);
        assert_eq!(emu.mem.get(0x302).unwrap(), 7);
    }

    #[test]
    fn test_fx55_fx65_round_trip() {
        // V0..V2 = 1, 2, 3; dump at 0x300; clear V1; load back
        let program = [
            0x60, 0x01, 0x61, 0x02, 0x62, 0x03, 0xA3, 0x00, 0xF2, 0x55, 0x61, 0x00, 0xF2, 0x65,
        ];
        let mut emu = Emulator::new();
        emu.load_program(&program).unwrap();
        for _ in 0..5 {
            emu.step().unwrap();
        }
        assert_eq!(emu.mem.get(0x300).unwrap(), 1);
        assert_eq!(emu.mem.get(0x301).unwrap(), 2);
        assert_eq!(emu.mem.get(0x302).unwrap(), 3);
        assert_eq!(emu.index, 0x300);
        emu.step().unwrap();
        emu.step().unwrap();
        assert_eq!(emu.regs.get(0x1), 2);
        assert_eq!(emu.index, 0x300);
    }

    #[test]
    fn test_unknown_opcode_is_not_fatal() {
        let mut emu = Emulator::new();
        emu.load_program(&[0x0F, 0xFF, 0x61, 0x07]).unwrap();
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x202);
        assert!(!emu.is_halted());
        emu.step().unwrap();
        assert_eq!(emu.regs.get(0x1), 0x07);
    }

    #[test]
    fn test_pc_running_off_memory_is_fatal() {
        let mut emu = Emulator::new();
        // jump to the last byte so the fetch pair straddles the end
        emu.load_program(&[0x1F, 0xFF]).unwrap();
        emu.step().unwrap();
        assert_eq!(
            emu.step().unwrap_err(),
            Chip8Error::OutOfBounds { address: 0x1000 }
        );
        assert!(emu.is_halted());
    }

    #[test]
    fn test_halt_stops_stepping() {
        let mut emu = Emulator::new();
        emu.load_program(&[0x61, 0x07]).unwrap();
        emu.halt();
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x200);
        assert_eq!(emu.regs.get(0x1), 0x00);
    }
}
