use thiserror::Error;

use crate::diagnostics::{Context, Diagnostic, Severity, Span};
use crate::parser::Rule;

/// Error produced while lowering a parse tree into the AST.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct LowerError {
    pub kind: LowerErrorKind,
    pub span: Span,
    /// Enclosing constructs, innermost first.
    pub context: Vec<Context>,
}

/// Specific kinds of lowering errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LowerErrorKind {
    /// A visitor was handed a node for a different production.
    #[error("expected {expected:?} node, found {found:?}")]
    UnexpectedNode { expected: Rule, found: Rule },

    /// A required child node is absent.
    #[error("{parent:?} node has no {child:?} child")]
    MissingChild { parent: Rule, child: Rule },

    /// The rule is a token or marker, not a production with an AST form.
    #[error("{rule:?} does not lower to an AST node")]
    NotAProduction { rule: Rule },

    #[error("unknown binary operator '{text}'")]
    UnknownOperator { text: String },

    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String },

    /// The instruction parses but has no AST lowering yet.
    #[error("{form} instructions are not supported yet")]
    UnsupportedInstruction { form: &'static str },
}

impl LowerError {
    pub fn new(kind: LowerErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            context: Vec::new(),
        }
    }

    /// Record an enclosing construct as the error bubbles outwards.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context.push(context);
        self
    }

    fn code(&self) -> &'static str {
        match self.kind {
            LowerErrorKind::UnexpectedNode { .. } => "L001",
            LowerErrorKind::MissingChild { .. } => "L002",
            LowerErrorKind::NotAProduction { .. } => "L003",
            LowerErrorKind::UnknownOperator { .. } => "L004",
            LowerErrorKind::InvalidNumber { .. } => "L005",
            LowerErrorKind::UnsupportedInstruction { .. } => "L006",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let help = match &self.kind {
            LowerErrorKind::UnknownOperator { .. } => {
                vec!["supported binary operators are 'add' and 'mul'".to_string()]
            }
            LowerErrorKind::InvalidNumber { .. } => {
                vec!["integers must fit in 64 bits".to_string()]
            }
            _ => vec![],
        };

        Diagnostic {
            severity: Severity::Error,
            message: self.kind.to_string(),
            span: self.span.clone(),
            related: self
                .context
                .iter()
                .map(|ctx| ctx.to_related_info())
                .collect(),
            help,
            code: Some(self.code().to_string()),
        }
    }
}

/// Error returned by [`crate::parser::parse`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The source does not match the grammar.
    #[error("syntax error: {message}")]
    Syntax { message: String, span: Span },

    /// The parse tree could not be lowered.
    #[error(transparent)]
    Lower(#[from] LowerError),
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
            ParseError::Lower(err) => &err.span,
        }
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::Syntax { message, span } => Diagnostic {
                severity: Severity::Error,
                message: message.clone(),
                span: span.clone(),
                related: Vec::new(),
                help: Vec::new(),
                code: Some("P001".to_string()),
            },
            ParseError::Lower(err) => err.to_diagnostic(),
        }
    }
}

/// Convert a pest error into a ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>) -> ParseError {
    use pest::error::{ErrorVariant, InputLocation};

    let span = match err.location {
        InputLocation::Pos(pos) => Span(pos..pos),
        InputLocation::Span((start, end)) => Span(start..end),
    };

    let message = match &err.variant {
        ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let expected: Vec<String> = positives.iter().map(|rule| describe(*rule)).collect();
            format!("expected {}", expected.join(" or "))
        }
        variant => variant.message().into_owned(),
    };

    ParseError::Syntax { message, span }
}

fn describe(rule: Rule) -> String {
    match rule {
        Rule::ident => "identifier".to_string(),
        Rule::any_number => "number".to_string(),
        Rule::statement | Rule::function_definition | Rule::type_definition => {
            "'function' or 'type'".to_string()
        }
        Rule::EOI => "end of input".to_string(),
        other => format!("{:?}", other),
    }
}
