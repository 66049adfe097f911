//! Instruction set.
//!
//! # Encoding
//!
//! Each instruction is one opcode byte, followed by its operand byte when it
//! has one:
//!
//! ```text
//! ┌────────────┬──────────────────┐
//! │   Opcode   │ Operand (if any) │
//! │  (8 bits)  │     (8 bits)     │
//! └────────────┴──────────────────┘
//! ```
//!
//! Stack effect notation: `[..., operand1, operand2] -> [..., result]`

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::bytecode::BytecodeError;

/// Opcode byte values.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop = 0x00,
    Return = 0x01,
    Trap = 0x02,
    Breakpoint = 0x03,

    ImmByte = 0x10,
    Dup = 0x11,
    Rot2 = 0x12,
    Rot3 = 0x13,

    AddLong = 0x20,
    MulLong = 0x21,

    PrintLong = 0x30,
    PrintChar = 0x31,
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Ok(match byte {
            0x00 => Opcode::Nop,
            0x01 => Opcode::Return,
            0x02 => Opcode::Trap,
            0x03 => Opcode::Breakpoint,
            0x10 => Opcode::ImmByte,
            0x11 => Opcode::Dup,
            0x12 => Opcode::Rot2,
            0x13 => Opcode::Rot3,
            0x20 => Opcode::AddLong,
            0x21 => Opcode::MulLong,
            0x30 => Opcode::PrintLong,
            0x31 => Opcode::PrintChar,
            other => return Err(other),
        })
    }
}

/// A single bytecode instruction with its inline operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// Do nothing
    Nop,

    /// End the function without a value
    Return,

    /// Abort execution
    Trap,

    /// Stop in an attached debugger, then continue
    Breakpoint,

    /// Push a sign-extended immediate
    /// Stack: [...] -> [..., value]
    ImmByte(i8),

    /// Stack: [..., a] -> [..., a, a]
    Dup,

    /// Stack: [..., a, b] -> [..., b, a]
    Rot2,

    /// Stack: [..., a, b, c] -> [..., b, c, a]
    Rot3,

    /// Wrapping 64-bit addition
    /// Stack: [..., a, b] -> [..., a + b]
    AddLong,

    /// Wrapping 64-bit multiplication
    /// Stack: [..., a, b] -> [..., a * b]
    MulLong,

    /// Print the top value as a signed integer
    /// Stack: [..., a] -> [...]
    PrintLong,

    /// Print the top value as a character
    /// Stack: [..., a] -> [...]
    PrintChar,
}

/// Number of operand-stack slots an instruction consumes and produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEffect {
    pub pops: usize,
    pub pushes: usize,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::Return => Opcode::Return,
            Instruction::Trap => Opcode::Trap,
            Instruction::Breakpoint => Opcode::Breakpoint,
            Instruction::ImmByte(_) => Opcode::ImmByte,
            Instruction::Dup => Opcode::Dup,
            Instruction::Rot2 => Opcode::Rot2,
            Instruction::Rot3 => Opcode::Rot3,
            Instruction::AddLong => Opcode::AddLong,
            Instruction::MulLong => Opcode::MulLong,
            Instruction::PrintLong => Opcode::PrintLong,
            Instruction::PrintChar => Opcode::PrintChar,
        }
    }

    pub fn stack_effect(&self) -> StackEffect {
        let (pops, pushes) = match self {
            Instruction::Nop
            | Instruction::Return
            | Instruction::Trap
            | Instruction::Breakpoint => (0, 0),
            Instruction::ImmByte(_) => (0, 1),
            Instruction::Dup => (1, 2),
            Instruction::Rot2 => (2, 2),
            Instruction::Rot3 => (3, 3),
            Instruction::AddLong | Instruction::MulLong => (2, 1),
            Instruction::PrintLong | Instruction::PrintChar => (1, 0),
        };
        StackEffect { pops, pushes }
    }

    /// Whether the instruction ends its function's only block.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Return | Instruction::Trap)
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode() as u8);
        if let Instruction::ImmByte(value) = self {
            out.push(*value as u8);
        }
    }

    /// Decode one instruction at `offset`, returning it and its encoded length.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize), BytecodeError> {
        let byte = *bytes.get(offset).ok_or(BytecodeError::UnexpectedEnd {
            offset,
            len: bytes.len(),
        })?;
        let opcode =
            Opcode::try_from(byte).map_err(|byte| BytecodeError::UnknownOpcode { byte, offset })?;
        let instruction = match opcode {
            Opcode::Nop => Instruction::Nop,
            Opcode::Return => Instruction::Return,
            Opcode::Trap => Instruction::Trap,
            Opcode::Breakpoint => Instruction::Breakpoint,
            Opcode::ImmByte => {
                let operand = bytes
                    .get(offset + 1)
                    .ok_or(BytecodeError::MissingOperand { opcode, offset })?;
                return Ok((Instruction::ImmByte(*operand as i8), 2));
            }
            Opcode::Dup => Instruction::Dup,
            Opcode::Rot2 => Instruction::Rot2,
            Opcode::Rot3 => Instruction::Rot3,
            Opcode::AddLong => Instruction::AddLong,
            Opcode::MulLong => Instruction::MulLong,
            Opcode::PrintLong => Instruction::PrintLong,
            Opcode::PrintChar => Instruction::PrintChar,
        };
        Ok((instruction, 1))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::ImmByte(value) => write!(f, "ImmByte {}", value),
            other => write!(f, "{:?}", other.opcode()),
        }
    }
}
