use minifb::Key;

pub const NUM_KEYS: usize = 16;

/// Host key to keypad code, the usual 4x4 block:
///
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  <-  |Q|W|E|R|
/// |7|8|9|E|  <-  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
pub const KEYMAP: [(Key, u8); NUM_KEYS] = [
    (Key::Key1, 0x1),
    (Key::Key2, 0x2),
    (Key::Key3, 0x3),
    (Key::Key4, 0xC),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xD),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xE),
    (Key::Z, 0xA),
    (Key::X, 0x0),
    (Key::C, 0xB),
    (Key::V, 0xF),
];

/// The 16-key hexadecimal keypad, indexed by CHIP-8 key code.
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            keys: [false; NUM_KEYS],
        }
    }

    pub fn is_pressed(&self, code: u8) -> bool {
        self.keys.get(code as usize).copied().unwrap_or(false)
    }

    pub fn set(&mut self, code: u8, pressed: bool) {
        if let Some(key) = self.keys.get_mut(code as usize) {
            *key = pressed;
        }
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}
