//! Ferrule - a front end for a small function/type language and a native
//! code generator for a compact stack bytecode.
//!
//! # Overview
//!
//! The two halves are independent:
//!
//! - [`parse_program`] lowers source text into a typed AST.
//! - [`compile`] turns a [`BytecodeExecutable`] into a relocatable object file
//!   exporting one `fn<index>` symbol per chunk.
//!
//! # Quick Start
//!
//! ```no_run
//! use ferrule::{BytecodeChunk, BytecodeExecutable, CompileOptions, Instruction};
//!
//! let program = ferrule::parse_program("function f: mul x, 2, 3").unwrap();
//! assert_eq!(program.statements.len(), 1);
//!
//! let executable: BytecodeExecutable = vec![BytecodeChunk::new(vec![
//!     Instruction::ImmByte(2),
//!     Instruction::ImmByte(3),
//!     Instruction::AddLong,
//!     Instruction::Return,
//! ])]
//! .into_iter()
//! .collect();
//! ferrule::compile(&executable, "out.o", &CompileOptions::default()).unwrap();
//! ```

mod error_renderer;

use thiserror::Error;

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};

pub use ferrule_core::ast::{self, ProgramNode};
pub use ferrule_core::bytecode::{
    self, Address, BytecodeChunk, BytecodeExecutable, BytecodeError, Instruction, Opcode,
};
pub use ferrule_core::codegen::{
    self, CodegenError, CompileOptions, EmittedFunction, ErrorClass, NativeCompiler, Target,
};
pub use ferrule_core::diagnostics::{Diagnostic, RelatedInfo, Severity, Span};
pub use ferrule_core::parser::ParseError;

/// Public error type for parsing and compilation.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text could not be parsed or lowered.
    #[error("{}", diagnostic.message)]
    Parse {
        diagnostic: Diagnostic,
        source_code: String,
    },

    /// Bytecode could not be loaded.
    #[error(transparent)]
    Bytecode(#[from] BytecodeError),

    /// Native compilation failed.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl Error {
    fn from_parse(err: ParseError, source: &str) -> Self {
        Error::Parse {
            diagnostic: err.to_diagnostic(),
            source_code: source.to_string(),
        }
    }
}

/// Parse and lower `source`, keeping the text for error rendering.
pub fn parse_program(source: &str) -> Result<ProgramNode, Error> {
    ferrule_core::parse(source).map_err(|err| Error::from_parse(err, source))
}

/// Compile `executable` into an object file at `output`.
pub fn compile(
    executable: &BytecodeExecutable,
    output: impl AsRef<std::path::Path>,
    options: &CompileOptions,
) -> Result<(), Error> {
    Ok(ferrule_core::compile(executable, output, options)?)
}
