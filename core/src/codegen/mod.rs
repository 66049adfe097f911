//! Native code generation from bytecode.
//!
//! Each chunk of a [`BytecodeExecutable`](crate::bytecode::BytecodeExecutable)
//! becomes one exported function `fn<index>` taking and returning nothing.
//! The bytecode's operand stack exists only at compile time: it is tracked by
//! an [`OperandStack`] of SSA values, so the emitted code never touches memory
//! for it.

mod error;
mod native;
mod options;
mod stack;
mod target;

pub use error::{CodegenError, ErrorClass};
pub use native::{EmittedFunction, NativeCompiler, RuntimeFunction, compile, function_name};
pub use options::{CompileOptions, Target};
pub use stack::OperandStack;

#[cfg(test)]
mod native_test;
