pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// The monochrome 64x32 framebuffer.
///
/// Only the clear-screen and draw-sprite operations mutate pixels. The dirty
/// flag tells the rendering adapter a redraw is due; it is cleared when the
/// frame is consumed through [`FrameBuffer::take_frame`].
pub struct FrameBuffer {
    pixels: [bool; WIDTH * HEIGHT],
    dirty: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: [false; WIDTH * HEIGHT],
            dirty: true,
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [false; WIDTH * HEIGHT];
        self.dirty = true;
    }

    /// XOR-composite an 8-pixel-wide sprite with its top-left corner at
    /// (x, y). The origin wraps around the screen edges; rows and columns
    /// running past the edge are clipped. Returns true if any lit pixel was
    /// turned off (collision).
    pub fn draw(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let origin_x = x as usize % WIDTH;
        let origin_y = y as usize % HEIGHT;
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            let py = origin_y + row;
            if py >= HEIGHT {
                break;
            }
            for col in 0..8 {
                let px = origin_x + col;
                if px >= WIDTH {
                    break;
                }
                if byte & (0x80 >> col) == 0 {
                    continue;
                }
                let pixel = &mut self.pixels[py * WIDTH + px];
                collision |= *pixel;
                *pixel ^= true;
            }
        }
        self.dirty = true;
        collision
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[y * WIDTH + x]
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the pixel grid if it changed since the last call, clearing
    /// the dirty flag.
    pub fn take_frame(&mut self) -> Option<&[bool]> {
        if self.dirty {
            self.dirty = false;
            Some(&self.pixels)
        } else {
            None
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
