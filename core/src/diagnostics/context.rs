use crate::diagnostics::{RelatedInfo, Span};

/// Where in the tree a lowering error happened.
///
/// Entries are pushed outermost-first while the error bubbles up, and each one
/// becomes a [`RelatedInfo`] label when the error is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// Inside a function definition
    InFunction { name: String, span: Span },
    /// Inside a type definition
    InTypeDefinition { name: String, span: Span },
    /// Inside one instruction of a function body
    InInstruction { index: usize, span: Span },
}

impl Context {
    pub fn to_related_info(&self) -> RelatedInfo {
        match self {
            Context::InFunction { name, span } => RelatedInfo {
                span: span.clone(),
                message: format!("in function '{}'", name),
            },
            Context::InTypeDefinition { name, span } => RelatedInfo {
                span: span.clone(),
                message: format!("in type '{}'", name),
            },
            Context::InInstruction { index, span } => RelatedInfo {
                span: span.clone(),
                message: format!("in instruction #{}", index),
            },
        }
    }
}
