use crate::Chip8Error;
use std::convert::TryFrom;
use std::fmt;

/// The CHIP 8 commands this interpreter understands. 0NNN (call RCA 1802
/// machine code) is not one of them
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Command {
    // 00E0 	Display 	disp_clear() 	Clears the screen.
    Cls,
    // 00EE 	Flow 	return; 	Returns from a subroutine.
    Ret,
    // 1NNN 	Flow 	goto NNN;
    JmpAddr,
    // 2NNN 	Flow 	*(0xNNN)()
    CallAddr,
    // 3XNN 	Cond 	if(Vx==NN)
    SeImm,
    // 4XNN 	Cond 	if(Vx!=NN)
    SneImm,
    // 5XY0 	Cond 	if(Vx==Vy)
    SeReg,
    // 6XNN 	Const 	Vx = NN
    LdImm,
    // 7XNN 	Const 	Vx += NN (carry flag untouched)
    AddImm,
    // 8XY0..8XYE 	Assign, BitOp and Math
    LdReg,
    Or,
    And,
    Xor,
    AddReg,
    Sub,
    Shr,
    Subn,
    Shl,
    // 9XY0 	Cond 	if(Vx!=Vy)
    SneReg,
    // ANNN 	MEM 	I = NNN
    LdIAddr,
    // BNNN 	Flow 	PC=V0+NNN
    JpV0Addr,
    // CXNN 	Rand 	Vx=rand()&NN
    Rnd,
    // DXYN 	Disp 	draw(Vx,Vy,N)
    Drw,
    // EX9E / EXA1 	KeyOp
    Skp,
    Sknp,
    // FX07..FX65 	Timer, KeyOp, MEM, BCD
    LdVxDt,
    LdVxK,
    LdDtVx,
    LdStVx,
    AddIVx,
    LdFVx,
    LdBVx,
    LdIVx,
    LdVxI,
}

/// Recipe for pulling one operand out of an opcode: `(opcode & mask) >> shift`
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Operand {
    pub mask: u16,
    pub shift: u8,
}

impl Operand {
    const fn new(mask: u16, shift: u8) -> Self {
        Operand { mask, shift }
    }

    pub fn extract(self, opcode: u16) -> u16 {
        (opcode & self.mask) >> self.shift
    }
}

const ADDR: Operand = Operand::new(0x0FFF, 0);
const X: Operand = Operand::new(0x0F00, 8);
const Y: Operand = Operand::new(0x00F0, 4);
const BYTE: Operand = Operand::new(0x00FF, 0);
const NIBBLE: Operand = Operand::new(0x000F, 0);

/// One row of the instruction table. An opcode belongs to the row when
/// `opcode & mask == pattern`
#[derive(Debug)]
pub struct InstructionDef {
    pub command: Command,
    pub mask: u16,
    pub pattern: u16,
    pub operands: &'static [Operand],
}

const fn row(
    command: Command,
    mask: u16,
    pattern: u16,
    operands: &'static [Operand],
) -> InstructionDef {
    InstructionDef {
        command,
        mask,
        pattern,
        operands,
    }
}

/// Every opcode the interpreter can decode, scanned top to bottom. Rows
/// sharing a top nibble with a wider row must come first
pub static INSTRUCTIONS: [InstructionDef; 34] = [
    // 0XXX
    row(Command::Ret, 0xFFFF, 0x00EE, &[]),
    row(Command::Cls, 0xFFFF, 0x00E0, &[]),
    // 1XXX - 7XXX
    row(Command::JmpAddr, 0xF000, 0x1000, &[ADDR]),
    row(Command::CallAddr, 0xF000, 0x2000, &[ADDR]),
    row(Command::SeImm, 0xF000, 0x3000, &[X, BYTE]),
    row(Command::SneImm, 0xF000, 0x4000, &[X, BYTE]),
    row(Command::SeReg, 0xF00F, 0x5000, &[X, Y]),
    row(Command::LdImm, 0xF000, 0x6000, &[X, BYTE]),
    row(Command::AddImm, 0xF000, 0x7000, &[X, BYTE]),
    // 8XXX
    row(Command::LdReg, 0xF00F, 0x8000, &[X, Y]),
    row(Command::Or, 0xF00F, 0x8001, &[X, Y]),
    row(Command::And, 0xF00F, 0x8002, &[X, Y]),
    row(Command::Xor, 0xF00F, 0x8003, &[X, Y]),
    row(Command::AddReg, 0xF00F, 0x8004, &[X, Y]),
    row(Command::Sub, 0xF00F, 0x8005, &[X, Y]),
    row(Command::Shr, 0xF00F, 0x8006, &[X, Y]),
    row(Command::Subn, 0xF00F, 0x8007, &[X, Y]),
    row(Command::Shl, 0xF00F, 0x800E, &[X, Y]),
    // 9XXX - DXXX
    row(Command::SneReg, 0xF00F, 0x9000, &[X, Y]),
    row(Command::LdIAddr, 0xF000, 0xA000, &[ADDR]),
    row(Command::JpV0Addr, 0xF000, 0xB000, &[ADDR]),
    row(Command::Rnd, 0xF000, 0xC000, &[X, BYTE]),
    row(Command::Drw, 0xF000, 0xD000, &[X, Y, NIBBLE]),
    // EXXX
    row(Command::Skp, 0xF0FF, 0xE09E, &[X]),
    row(Command::Sknp, 0xF0FF, 0xE0A1, &[X]),
    // FXXX
    row(Command::LdVxDt, 0xF0FF, 0xF007, &[X]),
    row(Command::LdVxK, 0xF0FF, 0xF00A, &[X]),
    row(Command::LdDtVx, 0xF0FF, 0xF015, &[X]),
    row(Command::LdStVx, 0xF0FF, 0xF018, &[X]),
    row(Command::AddIVx, 0xF0FF, 0xF01E, &[X]),
    row(Command::LdFVx, 0xF0FF, 0xF029, &[X]),
    row(Command::LdBVx, 0xF0FF, 0xF033, &[X]),
    row(Command::LdIVx, 0xF0FF, 0xF055, &[X]),
    row(Command::LdVxI, 0xF0FF, 0xF065, &[X]),
];

/// A decoded instruction: the command plus up to three operands, in the
/// order the table row lists them. Unused slots are 0
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Op {
    pub command: Command,
    pub opcode: u16,
    operands: [u16; 3],
}

impl Op {
    /// Linear scan of `INSTRUCTIONS`, first matching row wins
    pub fn decode(opcode: u16) -> Result<Op, Chip8Error> {
        let def = INSTRUCTIONS
            .iter()
            .find(|def| opcode & def.mask == def.pattern)
            .ok_or(Chip8Error::UnknownOpcode(opcode))?;

        let mut operands = [0; 3];
        for (slot, operand) in operands.iter_mut().zip(def.operands) {
            *slot = operand.extract(opcode);
        }

        Ok(Op {
            command: def.command,
            opcode,
            operands,
        })
    }

    pub(crate) fn operand(&self, idx: usize) -> u16 {
        self.operands[idx]
    }

    /// First operand as a register index
    pub(crate) fn x(&self) -> usize {
        self.operands[0] as usize
    }

    /// Second operand as a register index
    pub(crate) fn y(&self) -> usize {
        self.operands[1] as usize
    }

    /// Second operand as an immediate byte
    pub(crate) fn byte(&self) -> u8 {
        self.operands[1] as u8
    }

    pub(crate) fn addr(&self) -> u16 {
        self.operands[0]
    }

    /// Returns true if executing this op can change the screen
    pub fn is_display_op(&self) -> bool {
        matches!(self.command, Command::Cls | Command::Drw)
    }
}

impl TryFrom<u16> for Op {
    type Error = Chip8Error;

    fn try_from(opcode: u16) -> Result<Self, Self::Error> {
        Op::decode(opcode)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.operands;
        match self.command {
            Command::Cls => write!(f, "CLS"),
            Command::Ret => write!(f, "RET"),
            Command::JmpAddr => write!(f, "JP {:#05X}", a),
            Command::CallAddr => write!(f, "CALL {:#05X}", a),
            Command::SeImm => write!(f, "SE V{:X}, {:#04X}", a, b),
            Command::SneImm => write!(f, "SNE V{:X}, {:#04X}", a, b),
            Command::SeReg => write!(f, "SE V{:X}, V{:X}", a, b),
            Command::LdImm => write!(f, "LD V{:X}, {:#04X}", a, b),
            Command::AddImm => write!(f, "ADD V{:X}, {:#04X}", a, b),
            Command::LdReg => write!(f, "LD V{:X}, V{:X}", a, b),
            Command::Or => write!(f, "OR V{:X}, V{:X}", a, b),
            Command::And => write!(f, "AND V{:X}, V{:X}", a, b),
            Command::Xor => write!(f, "XOR V{:X}, V{:X}", a, b),
            Command::AddReg => write!(f, "ADD V{:X}, V{:X}", a, b),
            Command::Sub => write!(f, "SUB V{:X}, V{:X}", a, b),
            Command::Shr => write!(f, "SHR V{:X}, V{:X}", a, b),
            Command::Subn => write!(f, "SUBN V{:X}, V{:X}", a, b),
            Command::Shl => write!(f, "SHL V{:X}, V{:X}", a, b),
            Command::SneReg => write!(f, "SNE V{:X}, V{:X}", a, b),
            Command::LdIAddr => write!(f, "LD I, {:#05X}", a),
            Command::JpV0Addr => write!(f, "JP V0, {:#05X}", a),
            Command::Rnd => write!(f, "RND V{:X}, {:#04X}", a, b),
            Command::Drw => write!(f, "DRW V{:X}, V{:X}, {}", a, b, c),
            Command::Skp => write!(f, "SKP V{:X}", a),
            Command::Sknp => write!(f, "SKNP V{:X}", a),
            Command::LdVxDt => write!(f, "LD V{:X}, DT", a),
            Command::LdVxK => write!(f, "LD V{:X}, K", a),
            Command::LdDtVx => write!(f, "LD DT, V{:X}", a),
            Command::LdStVx => write!(f, "LD ST, V{:X}", a),
            Command::AddIVx => write!(f, "ADD I, V{:X}", a),
            Command::LdFVx => write!(f, "LD F, V{:X}", a),
            Command::LdBVx => write!(f, "LD B, V{:X}", a),
            Command::LdIVx => write!(f, "LD [I], V{:X}", a),
            Command::LdVxI => write!(f, "LD V{:X}, [I]", a),
        }
    }
}
