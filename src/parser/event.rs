use crate::cst::SyntaxKind;
use crate::diagnostics::Diagnostic;
use crate::lexer::Token;

/// Flat output of the grammar, turned into a tree by the builder.
///
/// `Start` and `Finish` bracket a node. `forward_parent` is the distance to
/// a `Start` further down the list that must be opened first; it is how
/// [`CompletedMarker::precede`](super::grammar::CompletedMarker::precede)
/// wraps an already finished node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Start {
        kind: SyntaxKind,
        forward_parent: Option<u32>,
    },
    Token {
        token: Token,
    },
    Finish,
    Error {
        diagnostic: Diagnostic,
    },
}

impl Event {
    pub(crate) fn tombstone() -> Event {
        Event::Start {
            kind: SyntaxKind::Tombstone,
            forward_parent: None,
        }
    }

    /// An error diagnostic. Warnings do not count.
    pub(crate) fn is_error(&self) -> bool {
        matches!(self, Event::Error { diagnostic } if diagnostic.is_error())
    }
}
