//! An implementation of the CHIP 8 interpreter engine. The engine executes one
//! instruction per call to `Emulator::cycle` and leaves the clock, the window
//! and the physical keyboard to the host driving it.

// # Interpreter
// * 4096 (0x1000) bytes of memory
// * the 16 built in font glyphs live in the first 80 (0x50) bytes
// * programs are loaded at 0x200
// * 16 8-bit registers: V0 - VF
// * VF if used is the carry flag in addition operations, "no borrow" flag in subtraction, in draw
// operation the VF flag is set to denote pixel collision
// * the address register I is 16 bits wide
// the stack is only used to store return addresses when subroutines are called

// # Timers
// * delay timer is used for events, it can be set and read
// * sound timer beeps when its value is nonzero
// both count down once per instruction, or at a fixed rate (see `TimerMode`)

// # Input
// there is a 16 symbol hex keyboard with values 0 - F. There are 3 opcode that deal with handling input
//  - one skips an instruction if a specific key is pressed
//  - one skips an instruction if a specific key is NOT pressed
//  - waits for a key press and stores it in a register once it detects it

// # Graphics
// 64x32 pixels

#[macro_use]
extern crate slog;

mod config;
mod error;
mod graphics;
mod keyboard;
mod op;
mod timer;


pub use crate::config::{Config, TimerMode};
pub use crate::error::Chip8Error;
pub use crate::graphics::{AsDisplay, Graphics, FONT_SET, HEIGHT, NUM_BYTES_IN_FONT_CHAR, WIDTH};
pub use crate::keyboard::{AsKeyboard, Key, KeyState, NUM_KEYS};
pub use crate::op::{Command, InstructionDef, Op, Operand, INSTRUCTIONS};
pub use crate::timer::TimerClock;

use rand::{rngs::StdRng, Rng, SeedableRng};
use slog::{Discard, Logger};
use std::convert::TryFrom;
use std::fs;
use std::path::Path;

pub const MEMORY_SIZE: usize = 4096;
pub const STARTING_MEMORY_BYTE: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - STARTING_MEMORY_BYTE;
pub const NUM_REGISTERS: usize = 16;
/// CHIP 8 can hold up to 16 return addresses
pub const STACK_DEPTH: usize = 16;

const FLAG: usize = 0xF;
/// DRW takes its row count from a single nibble
const MAX_SPRITE_HEIGHT: usize = 0xF;

/// What a call to `Emulator::cycle` did
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Step {
    Executed(Op),
    /// blocked on FX0A until a key goes down
    WaitingForKey,
    /// paused or faulted, nothing was done
    Halted,
}

/// How the program counter moves once an op has been executed
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) enum Flow {
    Next,
    /// skip the next instruction
    Skip,
    /// the op has set the program counter itself
    Jump,
    /// waiting on FX0A, stay on this instruction
    Block,
}

fn skip_if(cond: bool) -> Flow {
    if cond {
        Flow::Skip
    } else {
        Flow::Next
    }
}

fn lowest_key_down<K: AsKeyboard + ?Sized>(keyboard: &K) -> Option<Key> {
    keyboard.keys_down().into_iter().min()
}

pub struct Emulator {
    memory: [u8; MEMORY_SIZE], // 4k of RAM

    stack: [u16; STACK_DEPTH], // return addresses
    sp: usize,                 // number of addresses on the stack

    addr: u16, // address register I
    pc: u16,   // program counter

    // 16 8-bit registers. VF is used as a flag by several of the opcodes (see @Op)
    v: [u8; NUM_REGISTERS],

    graphics: Graphics, // 64x32 pixel monochrome screen

    delay_timer: u8, // timer that can be set and read
    sound_timer: u8, // timer that beeps whenever it is nonzero
    timer_clock: Option<TimerClock>,

    waiting_for_key: Option<Op>, // the FX0A op we're blocked on, if any
    halted: bool,

    rng: StdRng,
    config: Config,
    logger: Logger,
}

impl Emulator {
    /// Create an emulator with the default `Config`. Logging is discarded
    /// unless a logger is passed in
    pub fn new(logger: Option<Logger>) -> Self {
        Emulator::with_config(Config::default(), logger)
    }

    pub fn with_config(config: Config, logger: Option<Logger>) -> Self {
        let logger = logger.unwrap_or_else(|| Logger::root(Discard, o!()));

        let mut memory = [0; MEMORY_SIZE];
        memory[..FONT_SET.len()].copy_from_slice(&FONT_SET);

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let timer_clock = match config.timers {
            TimerMode::PerTick => None,
            TimerMode::Clocked { hz } => Some(TimerClock::new(hz)),
        };

        Emulator {
            memory,
            stack: [0; STACK_DEPTH],
            sp: 0,
            addr: 0,
            pc: STARTING_MEMORY_BYTE as u16,
            v: [0; NUM_REGISTERS],
            graphics: Graphics::new(),
            delay_timer: 0,
            sound_timer: 0,
            timer_clock,
            waiting_for_key: None,
            halted: false,
            rng,
            config,
            logger,
        }
    }

    /// Create an emulator and load the ROM at `path` into it
    pub fn with_game_file<P: AsRef<Path>>(path: P) -> Result<Self, Chip8Error> {
        let mut emulator = Emulator::new(None);
        emulator.load_game_file(path)?;
        Ok(emulator)
    }

    pub fn load_game_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Chip8Error> {
        let rom = fs::read(path.as_ref())?;
        self.load_rom(&rom)
    }

    /// Copy a raw ROM image into memory starting at 0x200
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }

        let end = STARTING_MEMORY_BYTE + rom.len();
        self.memory[STARTING_MEMORY_BYTE..end].copy_from_slice(rom);
        info!(self.logger, "loaded ROM"; "bytes" => rom.len());
        Ok(())
    }

    /// Step forward one tick in the interpreter. Read the instruction at the
    /// program counter, decode it, execute it, then count the timers down
    /// and move the program counter along.
    ///
    /// An error halts the machine. The timers and program counter are left
    /// as they were before the failing instruction
    pub fn cycle<K: AsKeyboard + ?Sized>(&mut self, keyboard: &K) -> Result<Step, Chip8Error> {
        if self.halted {
            return Ok(Step::Halted);
        }

        if let Some(op) = self.waiting_for_key {
            return Ok(self.resume_key_wait(op, keyboard));
        }

        let pc = self.pc;
        let opcode = self.fetch();
        let result = Op::decode(opcode).and_then(|op| self.execute(op, keyboard).map(|flow| (op, flow)));

        let (op, flow) = match result {
            Ok(executed) => executed,
            Err(err) => {
                self.halted = true;
                error!(self.logger, "halting";
                    "error" => %err,
                    "pc" => format!("{:#05X}", pc),
                    "opcode" => format!("{:#06X}", opcode));
                return Err(err);
            }
        };

        debug!(self.logger, "executed";
            "pc" => format!("{:#05X}", pc),
            "opcode" => format!("{:#06X}", opcode),
            "op" => %op);

        if flow == Flow::Block {
            debug!(self.logger, "waiting for key"; "register" => op.x());
            self.waiting_for_key = Some(op);
            return Ok(Step::WaitingForKey);
        }

        self.decrement_timers();
        self.advance(flow);
        Ok(Step::Executed(op))
    }

    /// Finish a pending FX0A once the host reports a key down
    fn resume_key_wait<K: AsKeyboard + ?Sized>(&mut self, op: Op, keyboard: &K) -> Step {
        let key = match lowest_key_down(keyboard) {
            Some(key) => key,
            None => return Step::WaitingForKey,
        };

        self.v[op.x()] = key.value();
        self.waiting_for_key = None;
        if let Some(clock) = self.timer_clock.as_mut() {
            clock.resync();
        }
        debug!(self.logger, "key pressed"; "key" => key.value(), "register" => op.x());

        self.decrement_timers();
        self.advance(Flow::Next);
        Step::Executed(op)
    }

    /// Run a single decoded op against the machine state. Skips and jumps are
    /// reported through the returned `Flow`, the caller moves the program
    /// counter
    pub(crate) fn execute<K: AsKeyboard + ?Sized>(
        &mut self,
        op: Op,
        keyboard: &K,
    ) -> Result<Flow, Chip8Error> {
        let x = op.x();
        let y = op.y();

        let flow = match op.command {
            Command::Cls => {
                self.graphics.clear();
                Flow::Next
            }
            Command::Ret => {
                // the saved address is the CALL itself, Next steps past it
                self.pc = self.pop()?;
                Flow::Next
            }
            Command::JmpAddr => {
                self.pc = op.addr();
                Flow::Jump
            }
            Command::CallAddr => {
                self.push(self.pc)?;
                self.pc = op.addr();
                Flow::Jump
            }
            Command::SeImm => skip_if(self.v[x] == op.byte()),
            Command::SneImm => skip_if(self.v[x] != op.byte()),
            Command::SeReg => skip_if(self.v[x] == self.v[y]),
            Command::LdImm => {
                self.v[x] = op.byte();
                Flow::Next
            }
            Command::AddImm => {
                self.v[x] = self.v[x].wrapping_add(op.byte());
                Flow::Next
            }
            Command::LdReg => {
                self.v[x] = self.v[y];
                Flow::Next
            }
            Command::Or => {
                self.v[x] |= self.v[y];
                Flow::Next
            }
            Command::And => {
                self.v[x] &= self.v[y];
                Flow::Next
            }
            Command::Xor => {
                self.v[x] ^= self.v[y];
                Flow::Next
            }
            Command::AddReg => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[FLAG] = carry as u8;
                Flow::Next
            }
            Command::Sub => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[x] = vx.wrapping_sub(vy);
                self.v[FLAG] = self.no_borrow(vx, vy) as u8;
                Flow::Next
            }
            Command::Shr => {
                let src = self.shift_source(x, y);
                self.v[x] = src >> 1;
                self.v[FLAG] = src & 0x1;
                Flow::Next
            }
            Command::Subn => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[x] = vy.wrapping_sub(vx);
                self.v[FLAG] = self.no_borrow(vy, vx) as u8;
                Flow::Next
            }
            Command::Shl => {
                let src = self.shift_source(x, y);
                self.v[x] = src << 1;
                self.v[FLAG] = (src & 0x80) >> 7;
                Flow::Next
            }
            Command::SneReg => skip_if(self.v[x] != self.v[y]),
            Command::LdIAddr => {
                self.addr = op.addr();
                Flow::Next
            }
            Command::JpV0Addr => {
                self.pc = op.addr().wrapping_add(self.v[0] as u16);
                Flow::Jump
            }
            Command::Rnd => {
                self.v[x] = self.rng.gen::<u8>() & op.byte();
                Flow::Next
            }
            Command::Drw => {
                self.draw(x, y, op.operand(2) as usize);
                Flow::Next
            }
            Command::Skp => {
                let key = Key::try_from(self.v[x])?;
                skip_if(keyboard.key_down(key))
            }
            Command::Sknp => {
                let key = Key::try_from(self.v[x])?;
                skip_if(!keyboard.key_down(key))
            }
            Command::LdVxDt => {
                self.v[x] = self.delay_timer;
                Flow::Next
            }
            Command::LdVxK => match lowest_key_down(keyboard) {
                Some(key) => {
                    self.v[x] = key.value();
                    Flow::Next
                }
                None => Flow::Block,
            },
            Command::LdDtVx => {
                self.delay_timer = self.v[x];
                Flow::Next
            }
            Command::LdStVx => {
                self.sound_timer = self.v[x];
                Flow::Next
            }
            Command::AddIVx => {
                self.addr = self.addr.wrapping_add(self.v[x] as u16);
                Flow::Next
            }
            Command::LdFVx => {
                let digit = self.v[x];
                if digit > 0xF {
                    return Err(Chip8Error::FontOutOfRange(digit));
                }
                self.addr = digit as u16 * NUM_BYTES_IN_FONT_CHAR as u16;
                Flow::Next
            }
            Command::LdBVx => {
                let value = self.v[x];
                let base = self.addr as usize;
                self.write(base, value / 100);
                self.write(base + 1, (value / 10) % 10);
                self.write(base + 2, value % 10);
                Flow::Next
            }
            Command::LdIVx => {
                let count = self.transfer_count(x);
                let base = self.addr as usize;
                for i in 0..count {
                    self.write(base + i, self.v[i]);
                }
                self.finish_transfer(count);
                Flow::Next
            }
            Command::LdVxI => {
                let count = self.transfer_count(x);
                let base = self.addr as usize;
                for i in 0..count {
                    self.v[i] = self.read(base + i);
                }
                self.finish_transfer(count);
                Flow::Next
            }
        };

        Ok(flow)
    }

    /// XOR the sprite at I onto the screen and report collisions in VF
    fn draw(&mut self, x: usize, y: usize, height: usize) {
        let base = self.addr as usize;
        let mut rows = [0u8; MAX_SPRITE_HEIGHT];
        for (i, row) in rows.iter_mut().enumerate().take(height) {
            *row = self.read(base + i);
        }

        let collision = self.graphics.draw_sprite(self.v[x], self.v[y], &rows[..height]);
        self.v[FLAG] = collision as u8;
    }

    fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.sp >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow);
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<u16, Chip8Error> {
        self.sp = self.sp.checked_sub(1).ok_or(Chip8Error::StackUnderflow)?;
        Ok(self.stack[self.sp])
    }

    fn no_borrow(&self, minuend: u8, subtrahend: u8) -> bool {
        if self.config.borrow_flag_on_equal {
            minuend >= subtrahend
        } else {
            minuend > subtrahend
        }
    }

    fn shift_source(&self, x: usize, y: usize) -> u8 {
        if self.config.shift_uses_vy {
            self.v[y]
        } else {
            self.v[x]
        }
    }

    /// Number of registers FX55/FX65 move
    fn transfer_count(&self, x: usize) -> usize {
        if self.config.load_store_inclusive {
            x + 1
        } else {
            x
        }
    }

    fn finish_transfer(&mut self, count: usize) {
        if self.config.load_store_increments_i {
            self.addr = self.addr.wrapping_add(count as u16);
        }
    }

    /// Addresses wrap around the 4k of memory
    fn read(&self, addr: usize) -> u8 {
        self.memory[addr % MEMORY_SIZE]
    }

    fn write(&mut self, addr: usize, value: u8) {
        self.memory[addr % MEMORY_SIZE] = value;
    }

    /// Opcodes are stored big-endian
    fn fetch(&self) -> u16 {
        let pc = self.pc as usize;
        (self.read(pc) as u16) << 8 | self.read(pc + 1) as u16
    }

    fn advance(&mut self, flow: Flow) {
        match flow {
            Flow::Next => self.pc = self.pc.wrapping_add(2),
            Flow::Skip => self.pc = self.pc.wrapping_add(4),
            Flow::Jump | Flow::Block => {}
        }
    }

    fn decrement_timers(&mut self) {
        let periods = match self.timer_clock.as_mut() {
            None => 1,
            Some(clock) => clock.elapsed_periods().min(u8::MAX as u32) as u8,
        };

        self.delay_timer = self.delay_timer.saturating_sub(periods);
        self.sound_timer = self.sound_timer.saturating_sub(periods);
    }

    /// Stop executing instructions. Every later `cycle` is a no-op
    pub fn pause(&mut self) {
        if !self.halted {
            info!(self.logger, "paused"; "pc" => format!("{:#05X}", self.pc));
        }
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_waiting_for_key(&self) -> bool {
        self.waiting_for_key.is_some()
    }

    /// Hand the screen and the cells touched since the last call to the
    /// display, then start a fresh dirty mask
    pub fn present<D: AsDisplay + ?Sized>(&mut self, display: &mut D) {
        display.update(&self.graphics);
        self.graphics.clear_dirty();
    }

    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    /// The screen as one u32 per pixel, white on black
    pub fn get_pixels(&self) -> Vec<u32> {
        self.graphics.to_pixels(0xFFFFFF, 0)
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// The I register
    pub fn index(&self) -> u16 {
        self.addr
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// Whether the host should be beeping
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
