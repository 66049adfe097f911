//! Source locations and diagnostics shared by the front end.
//!
//! Lowering errors are converted to a [`Diagnostic`] at the API boundary so that
//! renderers (the root crate uses ariadne) never need to know about internal
//! error types.

mod context;

use core::{fmt, ops::Range};

pub use context::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }
    pub fn str_of<'a>(&self, source: &'a str) -> &'a str {
        &source[self.0.start..self.0.end]
    }
}

impl From<pest::Span<'_>> for Span {
    fn from(s: pest::Span<'_>) -> Self {
        Self(s.start()..s.end())
    }
}

/// A diagnostic message with a source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Help text suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Error code (e.g., "L001") for documentation lookup.
    pub code: Option<String>,
}

/// Every diagnostic raised today is a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Related information for a diagnostic (e.g., "in function 'f'").
#[derive(Debug, Clone)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}
