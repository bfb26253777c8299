//! Turns the grammar's event log into a [`SyntaxTree`].
//!
//! The grammar only ever sees significant tokens. The builder walks the full
//! token list of the source alongside the events and puts every trivia and
//! lexical-error token back into the tree: before a node's first token they
//! go to the enclosing node, everywhere else to the node being built.

use std::mem;

use crate::arena::Arena;
use crate::cst::{Element, NodeData, NodeId, SyntaxKind, SyntaxTree, TokenData};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ParseError};
use crate::lexer::{Token, TokenKind};
use crate::parser::event::Event;
use crate::span::Span;

struct TreeBuilder<'s> {
    source: &'s str,
    raw: &'s [Token],
    raw_pos: usize,
    /// End of the last token placed in the tree
    offset: usize,
    nodes: Arena<NodeData>,
    tokens: Arena<TokenData>,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

pub(crate) fn build(
    source: &str,
    raw: &[Token],
    mut events: Vec<Event>,
) -> Result<(SyntaxTree, Vec<Diagnostic>), ParseError> {
    let next_offset = next_token_offsets(&events, source.len());
    let mut builder = TreeBuilder {
        source,
        raw,
        raw_pos: 0,
        offset: 0,
        nodes: Arena::with_capacity(events.len() / 4),
        tokens: Arena::with_capacity(raw.len()),
        stack: Vec::new(),
        root: None,
        diagnostics: Vec::new(),
    };

    for i in 0..events.len() {
        match mem::replace(&mut events[i], Event::tombstone()) {
            Event::Start {
                kind,
                forward_parent,
            } => {
                let mut kinds = vec![kind];
                let mut index = i;
                let mut forward = forward_parent;
                while let Some(distance) = forward {
                    index += distance as usize;
                    let parent = events
                        .get_mut(index)
                        .map(|event| mem::replace(event, Event::tombstone()));
                    forward = match parent {
                        Some(Event::Start {
                            kind,
                            forward_parent,
                        }) => {
                            kinds.push(kind);
                            forward_parent
                        }
                        _ => {
                            return Err(ParseError::UnbalancedEvents {
                                message: format!("forward parent of event {} is not a node start", i),
                            })
                        }
                    };
                }
                for kind in kinds.into_iter().rev() {
                    if kind != SyntaxKind::Tombstone {
                        builder.start_node(kind, next_offset[i])?;
                    }
                }
            }
            Event::Finish => builder.finish_node()?,
            Event::Token { token } => builder.token(token)?,
            Event::Error { diagnostic } => {
                let diagnostic = match builder.stack.last() {
                    Some(&node) => diagnostic.with_node(node),
                    None => diagnostic,
                };
                builder.diagnostics.push(diagnostic);
            }
        }
    }

    builder.finish()
}

/// For each event, the offset of the first token at or after it.
fn next_token_offsets(events: &[Event], end: usize) -> Vec<usize> {
    let mut offsets = vec![end; events.len()];
    let mut next = end;
    for (i, event) in events.iter().enumerate().rev() {
        if let Event::Token { token } = event {
            next = token.span.start;
        }
        offsets[i] = next;
    }
    offsets
}

impl<'s> TreeBuilder<'s> {
    fn start_node(&mut self, kind: SyntaxKind, first_token: usize) -> Result<(), ParseError> {
        if self.stack.is_empty() {
            if self.root.is_some() {
                return Err(ParseError::UnbalancedEvents {
                    message: format!("second root node {:?}", kind),
                });
            }
        } else {
            self.flush_trivia(first_token);
        }
        let parent = self.stack.last().copied();
        let id = self.nodes.alloc(NodeData {
            kind,
            span: Span::empty(self.offset),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(Element::Node(id));
        }
        self.stack.push(id);
        Ok(())
    }

    fn finish_node(&mut self) -> Result<(), ParseError> {
        let id = self.stack.pop().ok_or_else(|| ParseError::UnbalancedEvents {
            message: "finish without a matching start".to_string(),
        })?;
        if self.stack.is_empty() {
            // Trailing trivia belongs to the root
            self.stack.push(id);
            self.flush_trivia(self.source.len());
            self.stack.pop();
            if let Some(token) = self.raw.get(self.raw_pos) {
                return Err(ParseError::UnconsumedInput { span: token.span });
            }
            self.root = Some(id);
        }
        let span = self.span_of_children(id);
        self.nodes[id].span = span;
        Ok(())
    }

    fn span_of_children(&self, id: NodeId) -> Span {
        let children = &self.nodes[id].children;
        let span_of = |element: &Element| match *element {
            Element::Node(node) => self.nodes[node].span,
            Element::Token(token) => self.tokens[token].token.span,
        };
        match (children.first(), children.last()) {
            (Some(first), Some(last)) => Span::new(span_of(first).start, span_of(last).end),
            _ => Span::empty(self.offset),
        }
    }

    fn token(&mut self, token: Token) -> Result<(), ParseError> {
        if token.kind.is_virtual() {
            self.flush_trivia(token.span.start);
            self.push_token(token);
            return Ok(());
        }
        self.flush_trivia(token.span.start);
        match self.raw.get(self.raw_pos) {
            Some(raw) if raw.kind == token.kind && raw.span == token.span => {}
            _ => {
                return Err(ParseError::UnbalancedEvents {
                    message: format!("token {:?} at {} is out of order", token.kind, token.span),
                })
            }
        }
        self.raw_pos += 1;
        if let Some(error) = token.error {
            let diagnostic = Diagnostic::error(DiagnosticKind::Lexical, error.to_string(), token.span);
            self.diagnostics.push(self.attach(diagnostic));
        }
        self.push_token(token);
        Ok(())
    }

    /// Place the trivia and error tokens that start before `offset`.
    fn flush_trivia(&mut self, offset: usize) {
        while let Some(&raw) = self.raw.get(self.raw_pos) {
            if !raw.is_layout_transparent() || raw.span.start >= offset {
                break;
            }
            self.raw_pos += 1;
            if raw.kind == TokenKind::Error {
                self.error_token(raw);
            } else {
                self.push_token(raw);
            }
        }
    }

    /// Unlexable input becomes an `Error` node of its own.
    fn error_token(&mut self, token: Token) {
        let parent = self.stack.last().copied();
        let id = self.nodes.alloc(NodeData {
            kind: SyntaxKind::Error,
            span: token.span,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(Element::Node(id));
        }
        self.stack.push(id);
        self.push_token(token);
        self.stack.pop();

        let message = token.error.unwrap_or_default().to_string();
        self.diagnostics
            .push(Diagnostic::error(DiagnosticKind::Lexical, message, token.span).with_node(id));
    }

    fn push_token(&mut self, token: Token) {
        let Some(&parent) = self.stack.last() else {
            return;
        };
        let id = self.tokens.alloc(TokenData { token, parent });
        self.nodes[parent].children.push(Element::Token(id));
        self.offset = token.span.end;
    }

    fn attach(&self, diagnostic: Diagnostic) -> Diagnostic {
        match self.stack.last() {
            Some(&node) => diagnostic.with_node(node),
            None => diagnostic,
        }
    }

    fn finish(mut self) -> Result<(SyntaxTree, Vec<Diagnostic>), ParseError> {
        if !self.stack.is_empty() {
            return Err(ParseError::UnbalancedEvents {
                message: format!("{} nodes left open", self.stack.len()),
            });
        }
        let root = self.root.ok_or_else(|| ParseError::UnbalancedEvents {
            message: "no root node".to_string(),
        })?;
        self.check_coverage()?;
        self.diagnostics.sort_by_key(|d| d.span.start);
        let tree = SyntaxTree::from_parts(self.source.to_string(), self.nodes, self.tokens, root);
        Ok((tree, self.diagnostics))
    }

    /// Tokens must tile the source: real tokens back to back, virtual ones
    /// empty and in between.
    fn check_coverage(&self) -> Result<(), ParseError> {
        let mut offset = 0;
        for (_, data) in self.tokens.iter() {
            let span = data.token.span;
            if data.token.kind.is_virtual() {
                if span != Span::empty(offset) {
                    return Err(ParseError::CoverageMismatch { offset });
                }
            } else {
                if span.start != offset {
                    return Err(ParseError::CoverageMismatch { offset });
                }
                offset = span.end;
            }
        }
        if offset != self.source.len() {
            return Err(ParseError::CoverageMismatch { offset });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::span::SourcePos;

    fn token(kind: TokenKind, start: usize, end: usize) -> Token {
        Token::new(kind, Span::new(start, end), SourcePos::START)
    }

    #[test]
    fn test_leading_trivia_goes_to_parent() {
        let source = "  x";
        let raw = lex(source);
        let events = vec![
            Event::Start {
                kind: SyntaxKind::Fragment,
                forward_parent: None,
            },
            Event::Start {
                kind: SyntaxKind::QVar,
                forward_parent: None,
            },
            Event::Token { token: raw[1] },
            Event::Finish,
            Event::Finish,
        ];
        let (tree, diagnostics) = build(source, &raw, events).unwrap();
        assert!(diagnostics.is_empty());
        let root = tree.root();
        assert_eq!(root.span(), Span::new(0, 3));
        let var = root.child_nodes().next().unwrap();
        assert_eq!(var.span(), Span::new(2, 3));
        assert_eq!(root.child_tokens().next().unwrap().kind(), TokenKind::Whitespace);
    }

    #[test]
    fn test_forward_parent_wraps_finished_node() {
        let source = "x";
        let raw = lex(source);
        let events = vec![
            Event::Start {
                kind: SyntaxKind::Fragment,
                forward_parent: None,
            },
            Event::Start {
                kind: SyntaxKind::QVar,
                forward_parent: Some(3),
            },
            Event::Token { token: raw[0] },
            Event::Finish,
            Event::Start {
                kind: SyntaxKind::ExpStmt,
                forward_parent: None,
            },
            Event::Finish,
            Event::Finish,
        ];
        let (tree, _) = build(source, &raw, events).unwrap();
        let stmt = tree.root().child_nodes().next().unwrap();
        assert_eq!(stmt.kind(), SyntaxKind::ExpStmt);
        assert_eq!(stmt.child_nodes().next().unwrap().kind(), SyntaxKind::QVar);
    }

    #[test]
    fn test_unbalanced_events_are_rejected() {
        let source = "x";
        let raw = lex(source);
        let events = vec![
            Event::Start {
                kind: SyntaxKind::Fragment,
                forward_parent: None,
            },
            Event::Token { token: raw[0] },
        ];
        assert!(matches!(
            build(source, &raw, events),
            Err(ParseError::UnbalancedEvents { .. })
        ));
    }

    #[test]
    fn test_out_of_order_token_is_rejected() {
        let source = "x y";
        let raw = lex(source);
        let events = vec![
            Event::Start {
                kind: SyntaxKind::Fragment,
                forward_parent: None,
            },
            Event::Token {
                token: token(TokenKind::VarId, 2, 3),
            },
            Event::Token {
                token: token(TokenKind::VarId, 0, 1),
            },
            Event::Finish,
        ];
        assert!(build(source, &raw, events).is_err());
    }
}
