//! Stack-based bytecode consumed by the native compiler.
//!
//! A [`BytecodeExecutable`] is an ordered list of chunks, one per function.
//! Chunks can be built in memory, decoded from the compact byte encoding, or
//! loaded from a postcard container.

mod error;
mod instruction;
mod program;

pub use error::BytecodeError;
pub use instruction::{Instruction, Opcode, StackEffect};
pub use program::{Address, BytecodeChunk, BytecodeExecutable};
