use thiserror::Error;

use crate::bytecode::Opcode;

/// Errors raised while reading or writing bytecode.
#[derive(Debug, Error)]
pub enum BytecodeError {
    #[error("unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("{opcode:?} at offset {offset} is missing its operand")]
    MissingOperand { opcode: Opcode, offset: usize },

    #[error("no instruction at offset {offset}: input is {len} byte(s) long")]
    UnexpectedEnd { offset: usize, len: usize },

    #[error("malformed bytecode container: {0}")]
    Container(#[source] postcard::Error),

    #[error("could not encode bytecode container: {0}")]
    Encode(#[source] postcard::Error),
}
