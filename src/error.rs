use std::io;
use thiserror::Error;

/// Everything that can go wrong while loading or running a CHIP-8 program.
///
/// The first five variants are execution faults: the tick that raises one of
/// them halts the machine.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),

    #[error("call stack overflow: more than 16 nested subroutine calls")]
    StackOverflow,

    #[error("call stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("invalid key {0:#04X}, keys range from 0x0 to 0xF")]
    InvalidKey(u8),

    #[error("no font glyph for {0:#04X}, glyphs range from 0x0 to 0xF")]
    FontOutOfRange(u8),

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("unable to read file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl Chip8Error {
    /// `FontOutOfRange` is the Fx29 flavour of a bad key value
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Chip8Error::InvalidKey(_) | Chip8Error::FontOutOfRange(_))
    }

    /// True for the faults that halt a running machine
    pub fn is_execution_fault(&self) -> bool {
        matches!(
            self,
            Chip8Error::UnknownOpcode(_)
                | Chip8Error::StackOverflow
                | Chip8Error::StackUnderflow
                | Chip8Error::InvalidKey(_)
                | Chip8Error::FontOutOfRange(_)
        )
    }
}
