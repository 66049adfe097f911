//! Ferrule core: syntax-tree lowering and native code generation.
//!
//! Two independent pipelines live here:
//!
//! - [`parser`] turns source text into a pest parse tree and lowers it into the
//!   typed [`ast`].
//! - [`codegen`] turns a [`bytecode::BytecodeExecutable`] into a native object
//!   file through Cranelift.

pub mod ast;
pub mod bytecode;
pub mod codegen;
pub mod diagnostics;
pub mod parser;

pub use codegen::{CodegenError, CompileOptions, ErrorClass, NativeCompiler, Target, compile};
pub use parser::{ParseError, parse};
