//! Diagnostics produced while tokenizing, resolving layout and parsing.

pub mod error;

use std::fmt;

use crate::cst::NodeId;
use crate::span::Span;

pub use error::{MissingChild, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// Which pipeline stage reported a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Unrecognised character or malformed literal.
    Lexical,
    /// Indentation that the offside rule cannot reconcile.
    Layout,
    /// Token not valid in the current grammar state.
    Syntax,
    /// Operator chain that cannot be resolved with the given fixities.
    Fixity,
    /// Parse stopped early at the caller's request.
    Cancelled,
}

/// A recoverable problem in the input. Never aborts tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    /// Nearest enclosing node at the point of recovery.
    pub node: Option<NodeId>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            span,
            node: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message, span)
        }
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{} at {}: {}", severity, self.span, self.message)
    }
}
