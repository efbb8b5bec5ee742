use std::time::{Duration, Instant};

use crate::emulator::Emulator;
use crate::error::Chip8Error;

/// Rate at which the delay and sound timers decrement.
pub const TIMER_HZ: u32 = 60;
/// Nominal interpreter speed in instructions per second.
pub const DEFAULT_IPS: u32 = 700;

/// What happened during one timer tick worth of execution.
#[derive(Debug)]
pub struct TickOutcome {
    /// One-shot buzzer signal: the sound timer expired on this tick.
    pub beep: bool,
}

/// Paces the interpreter: a fixed budget of instruction steps per 60 Hz
/// timer tick, decoupled from both instruction throughput and the host
/// frame rate.
pub struct Scheduler {
    tick: Duration,
    steps_per_tick: u32,
    deadline: Instant,
}

impl Scheduler {
    pub fn new(ips: u32) -> Self {
        let tick = Duration::from_secs(1) / TIMER_HZ;
        Self {
            tick,
            steps_per_tick: (ips / TIMER_HZ).max(1),
            deadline: Instant::now() + tick,
        }
    }

    /// Run one tick's instruction budget, then advance the timers once.
    ///
    /// A fatal machine fault stops the batch early and is passed through;
    /// the emulator has already halted itself at that point. While the
    /// machine is awaiting a key the steps are no-ops but the timers keep
    /// their cadence.
    pub fn run_tick(&mut self, emu: &mut Emulator) -> Result<TickOutcome, Chip8Error> {
        for _ in 0..self.steps_per_tick {
            if emu.is_halted() {
                break;
            }
            emu.step()?;
        }
        let beep = emu.tick_timers();
        Ok(TickOutcome { beep })
    }

    /// Sleep out the remainder of the current tick interval.
    ///
    /// If the batch overran its budget this returns immediately so the next
    /// batch issues right away; when more than a full tick behind, the
    /// deadline resyncs to now instead of bursting to catch up unbounded.
    pub fn pace(&mut self) {
        let now = Instant::now();
        if now < self.deadline {
            std::thread::sleep(self.deadline - now);
            self.deadline += self.tick;
        } else if now - self.deadline > self.tick {
            self.deadline = now + self.tick;
        } else {
            self.deadline += self.tick;
        }
    }
}
