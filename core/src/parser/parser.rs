use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::ast::ProgramNode;
use crate::diagnostics::Span;
use crate::parser::error::{ParseError, convert_pest_error};
use crate::parser::lower::AstBuilder;

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct ProgramParser;

/// Parse source text into its concrete syntax tree (the `program` pair).
pub fn parse_tree(source: &str) -> Result<Pair<'_, Rule>, ParseError> {
    let mut pairs = ProgramParser::parse(Rule::program, source).map_err(convert_pest_error)?;
    pairs.next().ok_or_else(|| ParseError::Syntax {
        message: "missing program".to_string(),
        span: Span::new(0, source.len()),
    })
}

/// Parse and lower source text into a [`ProgramNode`].
pub fn parse(source: &str) -> Result<ProgramNode, ParseError> {
    let tree = parse_tree(source)?;
    Ok(AstBuilder::new().visit_program(tree)?)
}
