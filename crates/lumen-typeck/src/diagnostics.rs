//! Diagnostic rendering.
//!
//! [`render_diagnostic`] draws a labelled ariadne report over the module
//! source; [`json_line`] produces the machine-readable form the driver
//! prints under `--json`.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use lumen_common::DiagnosticConfig;
use serde::Serialize;

use crate::error::Diagnostic;
use crate::program::ProgramDiagnostic;

/// Rendering switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticOptions {
    pub color: bool,
}

impl DiagnosticOptions {
    /// Plain output for deterministic snapshots.
    pub fn colorless() -> Self {
        DiagnosticOptions { color: false }
    }

    pub fn from_config(config: &DiagnosticConfig) -> Self {
        DiagnosticOptions { color: config.color }
    }
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions { color: true }
    }
}

/// Clamp `span` into `source` and widen empty spans to one character.
fn clamp(span: Range<usize>, source_len: usize) -> Range<usize> {
    let start = span.start.min(source_len);
    let end = span.end.min(source_len).max(start);
    if start == end {
        start..end.saturating_add(1).min(source_len)
    } else {
        start..end
    }
}

/// Render `diagnostic` against the source text of its module.
pub fn render_diagnostic(diagnostic: &Diagnostic, source: &str, filename: &str, options: &DiagnosticOptions) -> String {
    let config = Config::default().with_color(options.color);
    let span = clamp(
        diagnostic.span.start as usize..diagnostic.span.end as usize,
        source.len(),
    );
    let report = Report::build(ReportKind::Error, (filename, span.clone()))
        .with_code(diagnostic.code())
        .with_message(diagnostic.text())
        .with_config(config)
        .with_label(
            Label::new((filename, span))
                .with_message(diagnostic.kind.to_string())
                .with_color(Color::Red),
        )
        .finish();

    let mut buf = Vec::new();
    if report.write((filename, Source::from(source)), &mut buf).is_err() {
        return diagnostic.message.clone();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// One-line form: `path:line:column: message`, or just the message when
/// no position is known.
pub fn render_plain(diagnostic: &ProgramDiagnostic) -> String {
    match &diagnostic.source {
        Some(hint) if hint.line > 0 => format!(
            "{}:{}:{}: {}",
            hint.path, hint.line, hint.column, diagnostic.diagnostic.message
        ),
        Some(hint) => format!("{}: {}", hint.path, diagnostic.diagnostic.message),
        None => diagnostic.diagnostic.message.clone(),
    }
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    code: &'static str,
    message: &'a str,
    package: &'a str,
    path: Option<&'a str>,
    line: Option<u32>,
    column: Option<u32>,
}

/// The diagnostic as one JSON object.
pub fn json_line(diagnostic: &ProgramDiagnostic) -> serde_json::Result<String> {
    let hint = diagnostic.source.as_ref();
    serde_json::to_string(&JsonDiagnostic {
        code: diagnostic.diagnostic.code(),
        message: &diagnostic.diagnostic.message,
        package: &diagnostic.package,
        path: hint.map(|hint| hint.path.as_str()),
        line: hint.map(|hint| hint.line),
        column: hint.map(|hint| hint.column),
    })
}

#[cfg(test)]
mod tests {
    use lumen_common::Span;

    use super::*;
    use crate::error::DiagnosticKind;
    use crate::program::SourceHint;

    fn program_diagnostic(source: Option<SourceHint>) -> ProgramDiagnostic {
        ProgramDiagnostic {
            package: "app".into(),
            files: vec!["app/main.lm".into()],
            source,
            diagnostic: Diagnostic::new(
                DiagnosticKind::ControlFlow,
                "break statement must appear inside a loop",
                None,
                Span::with_position(0, 5, 1, 1),
            ),
        }
    }

    #[test]
    fn clamps_spans_into_source() {
        assert_eq!(clamp(3..3, 10), 3..4);
        assert_eq!(clamp(8..20, 10), 8..10);
        assert_eq!(clamp(12..14, 10), 10..10);
    }

    #[test]
    fn rendered_report_carries_code_and_message() {
        let diagnostic = program_diagnostic(None).diagnostic;
        let output = render_diagnostic(&diagnostic, "break 5\n", "main.lm", &DiagnosticOptions::colorless());
        assert!(output.contains("E0008"));
        assert!(output.contains("break statement must appear inside a loop"));
    }

    #[test]
    fn plain_lines_prefer_source_hints() {
        let hinted = program_diagnostic(Some(SourceHint {
            path: "app/main.lm".into(),
            line: 3,
            column: 5,
        }));
        insta::assert_snapshot!(
            render_plain(&hinted),
            @"app/main.lm:3:5: typechecker: break statement must appear inside a loop"
        );
        insta::assert_snapshot!(
            render_plain(&program_diagnostic(None)),
            @"typechecker: break statement must appear inside a loop"
        );
    }

    #[test]
    fn json_line_fields() {
        let line = json_line(&program_diagnostic(None)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["code"], "E0008");
        assert_eq!(value["package"], "app");
        assert!(value["line"].is_null());
    }
}
