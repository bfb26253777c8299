use crate::cst::SyntaxKind;
use crate::span::Span;
use thiserror::Error;

/// Internal parser failures.
///
/// These never describe problems with the input text: malformed source is
/// reported through [`Diagnostic`](super::Diagnostic)s on a complete tree.
/// A `ParseError` means the parser or the tree builder broke one of its own
/// invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unbalanced parse events: {message}")]
    UnbalancedEvents { message: String },

    #[error("Parser stopped at {span} with input left over")]
    UnconsumedInput { span: Span },

    #[error("Source coverage broken: tree text differs from input at byte {offset}")]
    CoverageMismatch { offset: usize },

    #[error("Parser made no progress at {span} while parsing {production}")]
    Stalled { span: Span, production: &'static str },
}

impl ParseError {
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnbalancedEvents { .. } => "UnbalancedEvents",
            ParseError::UnconsumedInput { .. } => "UnconsumedInput",
            ParseError::CoverageMismatch { .. } => "CoverageMismatch",
            ParseError::Stalled { .. } => "Stalled",
        }
    }

    pub fn get_span(&self) -> Option<Span> {
        match self {
            ParseError::UnconsumedInput { span } | ParseError::Stalled { span, .. } => Some(*span),
            ParseError::CoverageMismatch { offset } => Some(Span::empty(*offset)),
            ParseError::UnbalancedEvents { .. } => None,
        }
    }
}

/// A required child of a typed node view was absent.
///
/// The parser always emits required children for well-formed input, so on a
/// tree without diagnostics this indicates a grammar defect. On trees with
/// syntax errors it is the expected result of querying a half-built node.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{kind:?} node at {span} has no `{role}` child")]
pub struct MissingChild {
    pub kind: SyntaxKind,
    pub role: &'static str,
    pub span: Span,
}
