//! CHIP-8 virtual machine.
//!
//! The core is the interpreter ([`Emulator`]): a 4k memory with the font
//! preloaded, sixteen 8-bit registers, a bounded call stack, two 60 Hz
//! countdown timers, a 64x32 monochrome framebuffer and a 16-key keypad,
//! driven one instruction at a time by [`Emulator::step`] and paced by
//! [`Scheduler`]. The `chipvm` binary wires it to a `minifb` window and a
//! `cpal` buzzer.

pub use emulator::{Emulator, Mode};
pub use error::Chip8Error;
pub use scheduler::{Scheduler, TickOutcome, DEFAULT_IPS, TIMER_HZ};

pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod scheduler;
pub mod sound;
