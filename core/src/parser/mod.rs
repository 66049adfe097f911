//! Source text to AST.
//!
//! Parsing is delegated to a pest grammar; the resulting parse tree is walked
//! by [`AstBuilder`], which has one `visit_*` method per grammar production.

mod error;
mod lower;
#[allow(clippy::module_inception)]
pub mod parser;

pub use error::{LowerError, LowerErrorKind, ParseError};
pub use lower::{AstBuilder, Lowered};
pub use parser::{ProgramParser, Rule, parse, parse_tree};
