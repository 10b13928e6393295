use crate::Chip8Error;
use fixedbitset::FixedBitSet;
use std::convert::TryFrom;

pub const NUM_KEYS: usize = 16;

/// Key's variants are the 16 keys from the CHIP-8's hexadecimal keyboard,
/// numbered by the hex digit printed on them.
/// The recommended key mapping is:
///
/// Keypad                   Keyboard
/// +-+-+-+-+                +-+-+-+-+
/// |1|2|3|C|                |1|2|3|4|
/// +-+-+-+-+                +-+-+-+-+
/// |4|5|6|D|                |Q|W|E|R|
/// +-+-+-+-+       =>       +-+-+-+-+
/// |7|8|9|E|                |A|S|D|F|
/// +-+-+-+-+                +-+-+-+-+
/// |A|0|B|F|                |Z|X|C|V|
/// +-+-+-+-+                +-+-+-+-+
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Key {
    Key0 = 0x0,
    Key1 = 0x1,
    Key2 = 0x2,
    Key3 = 0x3,
    Key4 = 0x4,
    Key5 = 0x5,
    Key6 = 0x6,
    Key7 = 0x7,
    Key8 = 0x8,
    Key9 = 0x9,
    A = 0xA,
    B = 0xB,
    C = 0xC,
    D = 0xD,
    E = 0xE,
    F = 0xF,
}

impl Key {
    /// All keys in ascending order
    pub const ALL: [Key; NUM_KEYS] = [
        Key::Key0,
        Key::Key1,
        Key::Key2,
        Key::Key3,
        Key::Key4,
        Key::Key5,
        Key::Key6,
        Key::Key7,
        Key::Key8,
        Key::Key9,
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::E,
        Key::F,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Map a key on a QWERTY keyboard to the keypad, see the layout on `Key`.
    /// Case insensitive
    pub fn from_qwerty(c: char) -> Option<Key> {
        match c.to_ascii_lowercase() {
            '1' => Some(Key::Key1),
            '2' => Some(Key::Key2),
            '3' => Some(Key::Key3),
            '4' => Some(Key::C),
            'q' => Some(Key::Key4),
            'w' => Some(Key::Key5),
            'e' => Some(Key::Key6),
            'r' => Some(Key::D),
            'a' => Some(Key::Key7),
            's' => Some(Key::Key8),
            'd' => Some(Key::Key9),
            'f' => Some(Key::E),
            'z' => Some(Key::A),
            'x' => Some(Key::Key0),
            'c' => Some(Key::B),
            'v' => Some(Key::F),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Key {
    type Error = Chip8Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Key::ALL
            .get(value as usize)
            .copied()
            .ok_or(Chip8Error::InvalidKey(value))
    }
}

/// Anything that can report which keypad keys are held down right now
pub trait AsKeyboard {
    fn key_down(&self, key: Key) -> bool;

    /// Every key currently held down, lowest first
    fn keys_down(&self) -> Vec<Key> {
        Key::ALL.iter().copied().filter(|k| self.key_down(*k)).collect()
    }
}

/// A snapshot of the 16 key states. Each bit stores the 1 (down) or 0 (up)
/// state of the key with that index
#[derive(Debug, Clone, PartialEq)]
pub struct KeyState {
    key_input: FixedBitSet,
}

impl Default for KeyState {
    fn default() -> Self {
        KeyState::new()
    }
}

impl KeyState {
    pub fn new() -> Self {
        KeyState {
            key_input: FixedBitSet::with_capacity(NUM_KEYS),
        }
    }

    /// A snapshot with exactly `keys` held down
    pub fn with_keys(keys: &[Key]) -> Self {
        let mut state = KeyState::new();
        state.update_with_keys(keys);
        state
    }

    pub fn press(&mut self, key: Key) {
        self.key_input.insert(key as usize);
    }

    pub fn release(&mut self, key: Key) {
        self.key_input.set(key as usize, false);
    }

    /// Given the keys held down on the host keyboard, bring every one of
    /// the 16 states in line with it
    pub fn update_with_keys(&mut self, keys: &[Key]) {
        self.key_input.clear();
        for key in keys {
            self.press(*key);
        }
    }
}

impl AsKeyboard for KeyState {
    fn key_down(&self, key: Key) -> bool {
        self.key_input[key as usize]
    }
}
