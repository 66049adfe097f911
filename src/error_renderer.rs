//! Error rendering using ariadne
//!
//! Parse errors are shown against the source with the offending span labelled
//! and every enclosing construct as a secondary label. Other errors have no
//! source location and print as a single line.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

const SOURCE_ID: &str = "<input>";

/// Render an error to stderr
///
/// # Example
/// ```no_run
/// use ferrule::{parse_program, render_error};
///
/// if let Err(e) = parse_program("function f: sub x, 1, 2") {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String
pub fn render_error_to_string(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Parse {
            diagnostic,
            source_code,
        } => render_diagnostic(source_code, diagnostic, writer, use_color),
        Error::Bytecode(err) => writeln!(writer, "Error: invalid bytecode: {}", err),
        Error::Codegen(err) => writeln!(writer, "Error: {}", err),
    }
}

fn render_diagnostic(
    source: &str,
    diag: &Diagnostic,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
    };

    let mut report = Report::build(kind, (SOURCE_ID, diag.span.0.clone()))
        .with_message(&diag.message)
        .with_config(ariadne::Config::default().with_color(use_color));

    if let Some(code) = &diag.code {
        report = report.with_code(code);
    }

    let color = colors.next();
    report = report.with_label(
        Label::new((SOURCE_ID, diag.span.0.clone()))
            .with_message(&diag.message)
            .with_color(color),
    );

    for related in &diag.related {
        let color = colors.next();
        report = report.with_label(
            Label::new((SOURCE_ID, related.span.0.clone()))
                .with_message(&related.message)
                .with_color(color),
        );
    }

    for help_msg in &diag.help {
        report = report.with_help(help_msg);
    }

    report
        .finish()
        .write((SOURCE_ID, Source::from(source)), &mut *writer)
}
