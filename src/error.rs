use thiserror::Error;

/// Faults raised by the virtual machine.
///
/// `OutOfBounds` and the stack faults are fatal: the emulator halts and no
/// further instruction is fetched. `ProgramTooLarge` is raised at load time,
/// before any memory write, leaving the machine in its pre-load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("memory access out of bounds at {address:#05X}")]
    OutOfBounds { address: u16 },

    #[error("call stack overflow (more than 16 nested calls)")]
    StackOverflow,

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("program is {len} bytes, at most 3584 fit above the program origin")]
    ProgramTooLarge { len: usize },
}
