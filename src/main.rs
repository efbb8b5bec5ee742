use anyhow::{anyhow, Context, Result};
use log::{error, info};
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

use chipvm::display::{HEIGHT, WIDTH};
use chipvm::keyboard::KEYMAP;
use chipvm::sound::Buzzer;
use chipvm::{Emulator, Scheduler, DEFAULT_IPS};

const PIXEL_ON: u32 = 0x007FFF;
const PIXEL_OFF: u32 = 0x000000;

fn main() -> Result<()> {
    env_logger::init();

    let rom = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: chipvm <rom>"))?;
    let program = std::fs::read(&rom).with_context(|| format!("reading rom {rom}"))?;

    let mut emu = Emulator::new();
    emu.load_program(&program)?;
    info!("loaded {} byte program from {rom}", program.len());

    let mut window = Window::new(
        "chipvm - ESC to exit",
        WIDTH,
        HEIGHT,
        WindowOptions {
            scale: Scale::X16,
            ..WindowOptions::default()
        },
    )
    .context("opening display window")?;
    // Limit to max ~60 fps update rate
    window.limit_update_rate(Some(std::time::Duration::from_micros(16_600)));

    let mut buzzer = Buzzer::new().context("initializing audio output")?;
    let mut pixels = vec![PIXEL_OFF; WIDTH * HEIGHT];
    let mut scheduler = Scheduler::new(DEFAULT_IPS);

    while window.is_open()
        && !window.is_key_pressed(Key::Escape, KeyRepeat::Yes)
        && !emu.is_halted()
    {
        for (key, code) in KEYMAP {
            emu.set_key(code, window.is_key_down(key));
        }

        match scheduler.run_tick(&mut emu) {
            Ok(outcome) => {
                if outcome.beep {
                    info!("beep");
                }
            }
            Err(fault) => {
                error!("halted: {fault}");
                break;
            }
        }
        buzzer.set_active(emu.sound_active())?;

        if let Some(frame) = emu.take_frame() {
            for (slot, on) in pixels.iter_mut().zip(frame) {
                *slot = if *on { PIXEL_ON } else { PIXEL_OFF };
            }
            window
                .update_with_buffer(&pixels, WIDTH, HEIGHT)
                .context("presenting frame")?;
        } else {
            window.update();
        }

        scheduler.pace();
    }

    Ok(())
}
