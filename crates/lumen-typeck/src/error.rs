//! Diagnostics and fatal check errors.
//!
//! Every semantic problem becomes a [`Diagnostic`] and checking carries on.
//! Only structurally invalid input aborts a check, as a [`CheckError`].

use std::fmt;

use lumen_ast::{
    Block, Expr, FieldInit, FunctionDef, FunctionParam, FunctionSig, GenericParam, Ident, Import, MatchClause,
    NodeId, Pattern, Stmt, StructField, StructPatternField, TypeExpr, WhereClause,
};
use lumen_common::Span;
use serde::Serialize;

use crate::specs::Site;

/// Prefix carried by every diagnostic message.
pub const TAG: &str = "typechecker: ";

/// Broad category of a diagnostic, used for stable error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Mismatch,
    Arity,
    UnknownName,
    Member,
    Obligation,
    Ambiguity,
    Literal,
    ControlFlow,
    Declaration,
    Pattern,
    Import,
    Unsupported,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::Mismatch => "E0001",
            DiagnosticKind::Arity => "E0002",
            DiagnosticKind::UnknownName => "E0003",
            DiagnosticKind::Member => "E0004",
            DiagnosticKind::Obligation => "E0005",
            DiagnosticKind::Ambiguity => "E0006",
            DiagnosticKind::Literal => "E0007",
            DiagnosticKind::ControlFlow => "E0008",
            DiagnosticKind::Declaration => "E0009",
            DiagnosticKind::Pattern => "E0010",
            DiagnosticKind::Import => "E0011",
            DiagnosticKind::Unsupported => "E0012",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Mismatch => "type mismatch",
            DiagnosticKind::Arity => "arity mismatch",
            DiagnosticKind::UnknownName => "unknown name",
            DiagnosticKind::Member => "member error",
            DiagnosticKind::Obligation => "unsatisfied constraint",
            DiagnosticKind::Ambiguity => "ambiguity",
            DiagnosticKind::Literal => "literal out of range",
            DiagnosticKind::ControlFlow => "invalid control flow",
            DiagnosticKind::Declaration => "invalid declaration",
            DiagnosticKind::Pattern => "invalid pattern",
            DiagnosticKind::Import => "import error",
            DiagnosticKind::Unsupported => "unsupported",
        })
    }
}

/// A recoverable type-checking problem.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Always starts with [`TAG`].
    pub message: String,
    pub node: Option<NodeId>,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, node: Option<NodeId>, span: Span) -> Self {
        let message = message.into();
        let message = if message.starts_with(TAG) {
            message
        } else {
            format!("{TAG}{message}")
        };
        Diagnostic {
            kind,
            message,
            node,
            span,
        }
    }

    /// A diagnostic located at `at`.
    pub fn at(kind: DiagnosticKind, message: impl Into<String>, at: &dyn Located) -> Self {
        Diagnostic::new(kind, message, Some(at.node_id()), at.span())
    }

    pub fn at_site(kind: DiagnosticKind, message: impl Into<String>, site: Site) -> Self {
        Diagnostic::new(kind, message, site.node, site.span)
    }

    /// The message without the component tag.
    pub fn text(&self) -> &str {
        self.message.strip_prefix(TAG).unwrap_or(&self.message)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ── Node locations ─────────────────────────────────────────────────────

/// A syntax node a diagnostic can point at.
pub trait Located {
    fn node_id(&self) -> NodeId;
    fn span(&self) -> Span;
}

macro_rules! located {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Located for $ty {
                fn node_id(&self) -> NodeId {
                    self.id
                }

                fn span(&self) -> Span {
                    self.span
                }
            }
        )*
    };
}

located!(
    Expr,
    Stmt,
    Pattern,
    TypeExpr,
    Ident,
    FunctionDef,
    FunctionSig,
    FunctionParam,
    Block,
    MatchClause,
    FieldInit,
    Import,
    GenericParam,
    WhereClause,
    StructField,
    StructPatternField,
);

// ── Fatal errors ───────────────────────────────────────────────────────

/// A failure that aborts checking instead of producing diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckError {
    /// The module to check was missing.
    NilModule,
    /// Packages import each other in a cycle.
    PackageCycle { cycle: Vec<String> },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::NilModule => write!(f, "{TAG}module is nil"),
            CheckError::PackageCycle { cycle } => {
                write!(f, "{TAG}import cycle detected: {}", cycle.join(" -> "))
            }
        }
    }
}

impl std::error::Error for CheckError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_tagged_once() {
        let plain = Diagnostic::new(DiagnosticKind::Mismatch, "oops", None, Span::default());
        let tagged = Diagnostic::new(DiagnosticKind::Mismatch, "typechecker: oops", None, Span::default());
        assert_eq!(plain.message, "typechecker: oops");
        assert_eq!(tagged.message, plain.message);
        assert_eq!(plain.text(), "oops");
    }

    #[test]
    fn fatal_error_display() {
        assert_eq!(CheckError::NilModule.to_string(), "typechecker: module is nil");
        let cycle = CheckError::PackageCycle {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(cycle.to_string(), "typechecker: import cycle detected: a -> b -> a");
    }

    #[test]
    fn codes_are_distinct() {
        let kinds = [
            DiagnosticKind::Mismatch,
            DiagnosticKind::Arity,
            DiagnosticKind::UnknownName,
            DiagnosticKind::Member,
            DiagnosticKind::Obligation,
            DiagnosticKind::Ambiguity,
            DiagnosticKind::Literal,
            DiagnosticKind::ControlFlow,
            DiagnosticKind::Declaration,
            DiagnosticKind::Pattern,
            DiagnosticKind::Import,
            DiagnosticKind::Unsupported,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }
}
