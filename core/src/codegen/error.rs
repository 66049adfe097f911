//! Native compilation errors.
//!
//! # Error Classes
//!
//! - **Input errors**: the bytecode or the requested output is at fault
//!   (stack underflow, missing terminator, unknown target, unwritable path).
//!
//! - **Internal errors**: the compiler or the backend broke an invariant
//!   (verification failure, functions defined before being declared). These
//!   indicate a bug in whatever produced or lowered the bytecode.

use std::{io, path::PathBuf};

use cranelift_module::ModuleError;
use thiserror::Error;

use crate::bytecode::{BytecodeError, Instruction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Internal,
}

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("unsupported target '{triple}': {reason}")]
    UnsupportedTarget { triple: String, reason: String },

    #[error("could not write object file '{}': {source}", .path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "operand stack underflow in {function} at offset {offset}: \
         {instruction} needs {needed} value(s) but {available} are available"
    )]
    StackUnderflow {
        function: String,
        offset: usize,
        instruction: Instruction,
        needed: usize,
        available: usize,
    },

    #[error("{function} does not end with Return or Trap")]
    MissingTerminator { function: String },

    #[error(transparent)]
    Bytecode(#[from] BytecodeError),

    #[error("internal error: {declared} function(s) declared for {chunks} chunk(s)")]
    NotDeclared { declared: usize, chunks: usize },

    #[error("internal error: {function} failed verification:\n{errors}")]
    Verification { function: String, errors: String },

    #[error("internal error: could not configure object emission: {message}")]
    Emission { message: String },

    #[error("internal error: {0}")]
    Module(#[from] ModuleError),
}

impl CodegenError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CodegenError::UnsupportedTarget { .. }
            | CodegenError::OutputFile { .. }
            | CodegenError::StackUnderflow { .. }
            | CodegenError::MissingTerminator { .. }
            | CodegenError::Bytecode(_) => ErrorClass::Input,
            CodegenError::NotDeclared { .. }
            | CodegenError::Verification { .. }
            | CodegenError::Emission { .. }
            | CodegenError::Module(_) => ErrorClass::Internal,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.class() == ErrorClass::Internal
    }
}
