use chip8vm::{AsDisplay, AsKeyboard, Config, Emulator, Graphics, Key, TimerMode, HEIGHT, WIDTH};
use device_query::{DeviceQuery, DeviceState, Keycode};
use minifb::{Scale, ScaleMode, Window, WindowOptions};
use std::error::Error;
use std::time::{Duration, Instant};

const INSTRUCTIONS_PER_SECOND: u32 = 500;
const FRAMES_PER_SECOND: u32 = 60;

struct Keyboard(pub DeviceState);

fn keycode_to_char(key: &Keycode) -> Option<char> {
    let c = match key {
        Keycode::Key1 => '1',
        Keycode::Key2 => '2',
        Keycode::Key3 => '3',
        Keycode::Key4 => '4',
        Keycode::Q => 'q',
        Keycode::W => 'w',
        Keycode::E => 'e',
        Keycode::R => 'r',
        Keycode::A => 'a',
        Keycode::S => 's',
        Keycode::D => 'd',
        Keycode::F => 'f',
        Keycode::Z => 'z',
        Keycode::X => 'x',
        Keycode::C => 'c',
        Keycode::V => 'v',
        _ => return None,
    };
    Some(c)
}

impl AsKeyboard for Keyboard {
    fn key_down(&self, key: Key) -> bool {
        self.keys_down().contains(&key)
    }

    fn keys_down(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self
            .0
            .get_keys()
            .iter()
            .filter_map(keycode_to_char)
            .filter_map(Key::from_qwerty)
            .collect();
        keys.sort();
        keys
    }
}

struct Screen {
    window: Window,
    pixels: Vec<u32>,
}

impl AsDisplay for Screen {
    fn closed(&self) -> bool {
        !self.window.is_open()
    }

    fn update(&mut self, graphics: &Graphics) {
        for (x, y) in graphics.dirty_cells() {
            self.pixels[y * WIDTH + x] = if graphics.get(x, y) { 0xFFFFFF } else { 0 };
        }
        if let Err(err) = self.window.update_with_buffer(&self.pixels, WIDTH, HEIGHT) {
            eprintln!("unable to draw: {}", err);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let rom = std::env::args().nth(1).unwrap_or_else(|| "games/PONG".to_string());

    let window = Window::new(
        "Chip 8 Emulator (In Rust!)",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale: Scale::X8,
            scale_mode: ScaleMode::UpperLeft,
            ..WindowOptions::default()
        },
    )?;
    let mut screen = Screen {
        window,
        pixels: vec![0; WIDTH * HEIGHT],
    };

    let config = Config {
        timers: TimerMode::Clocked { hz: 60 },
        ..Config::default()
    };
    let mut emulator = Emulator::with_config(config, None);
    emulator.load_game_file(&rom)?;

    let keyboard = Keyboard(DeviceState::new());

    let tick = Duration::from_secs(1) / INSTRUCTIONS_PER_SECOND;
    let frame = Duration::from_secs(1) / FRAMES_PER_SECOND;
    let mut last_frame = Instant::now();

    while !screen.closed() {
        let started = Instant::now();

        // keep the window open after a fault so the last screen can be inspected
        if let Err(err) = emulator.cycle(&keyboard) {
            eprintln!("halted: {}", err);
        }

        if last_frame.elapsed() >= frame {
            if emulator.graphics().has_dirty() {
                emulator.present(&mut screen);
            } else {
                screen.window.update();
            }
            last_frame = Instant::now();
        }

        if let Some(rest) = tick.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    Ok(())
}
