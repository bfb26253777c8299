//! Recursive-descent grammar over the layout-resolved token stream.
//!
//! Each production is a function taking the [`Parser`]; it emits
//! [`Event`]s and never builds tree nodes itself. Productions that need to
//! see past the current token use bounded lookahead over the layout stream
//! and never backtrack.

mod block;
mod decl;
mod expr;
mod module;
mod names;
mod pattern;
mod types;

use drop_bomb::DropBomb;

use crate::cst::SyntaxKind;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::lexer::{Layout, Token, TokenKind};
use crate::parser::event::Event;
use crate::parser::lexer_adapter::LayoutAdapter;
use crate::parser::token_set::TokenSet;
use crate::parser::{CancellationToken, EntryPoint};
use crate::span::Span;

pub(crate) use block::block;

/// Peeks at the current token allowed without consuming it before the
/// parser is considered stuck.
const FUEL: u32 = 1024;

type Rule = fn(&mut Parser);

pub(crate) struct Parser<'t> {
    source: &'t str,
    input: LayoutAdapter<'t>,
    events: Vec<Event>,
    fuel: u32,
    stalled: Option<(Span, &'static str)>,
    production: &'static str,
    depth: u32,
    max_nesting: u32,
    cancellation: Option<CancellationToken>,
    cancelled: bool,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(
        source: &'t str,
        layout: Layout<'t>,
        max_nesting: u32,
        cancellation: Option<CancellationToken>,
    ) -> Parser<'t> {
        Parser {
            source,
            input: LayoutAdapter::new(layout),
            events: Vec::new(),
            fuel: FUEL,
            stalled: None,
            production: "module",
            depth: 0,
            max_nesting,
            cancellation,
            cancelled: false,
        }
    }

    pub(crate) fn finish(self) -> (Vec<Event>, Option<(Span, &'static str)>) {
        (self.events, self.stalled)
    }

    /// Token `n` positions ahead, without spending fuel.
    fn lookahead(&mut self, n: usize) -> Token {
        self.input.token(n)
    }

    pub(crate) fn nth_token(&mut self, n: usize) -> Token {
        if self.stalled.is_some() {
            return self.eof_token();
        }
        if n == 0 {
            if self.fuel == 0 {
                let span = self.lookahead(0).span;
                log::debug!("parser stalled at {} in {}", span, self.production);
                self.stalled = Some((span, self.production));
                return self.eof_token();
            }
            self.fuel -= 1;
        }
        self.lookahead(n)
    }

    fn eof_token(&self) -> Token {
        Token::new(
            TokenKind::Eof,
            Span::empty(self.source.len()),
            crate::span::SourcePos::START,
        )
    }

    pub(crate) fn nth(&mut self, n: usize) -> TokenKind {
        self.nth_token(n).kind
    }

    pub(crate) fn current(&mut self) -> Token {
        self.nth_token(0)
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.nth(0) == kind
    }

    pub(crate) fn at_in(&mut self, set: TokenSet) -> bool {
        set.contains(self.nth(0))
    }

    pub(crate) fn at_eof(&mut self) -> bool {
        self.at(TokenKind::Eof)
    }

    pub(crate) fn nth_text(&mut self, n: usize) -> &'t str {
        let source = self.source;
        self.nth_token(n).text(source)
    }

    /// A contextual keyword such as `qualified` or `family`.
    pub(crate) fn at_word(&mut self, word: &str) -> bool {
        self.nth_at_word(0, word)
    }

    pub(crate) fn nth_at_word(&mut self, n: usize, word: &str) -> bool {
        self.nth(n) == TokenKind::VarId && self.nth_text(n) == word
    }

    /// Token `n` starts right where token `n - 1` ends.
    pub(crate) fn nth_is_adjacent(&mut self, n: usize) -> bool {
        if n == 0 {
            return false;
        }
        let previous = self.nth_token(n - 1);
        let token = self.nth_token(n);
        !previous.kind.is_virtual() && previous.span.end == token.span.start
    }

    /// The current token is a prefix occurrence: glued to the next token
    /// and separated from the one before. `!x`, `~x`, `@Int`.
    pub(crate) fn at_prefix_occurrence(&mut self) -> bool {
        let current = self.nth_token(0);
        let next = self.nth_token(1);
        let glued_right = current.span.end == next.span.start && !next.kind.is_virtual();
        let glued_left = self
            .events
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::Token { token } if !token.kind.is_virtual() => Some(token.span.end),
                _ => None,
            })
            .is_some_and(|end| end == current.span.start);
        glued_right && !glued_left
    }

    pub(crate) fn bump(&mut self) {
        if self.at_eof() {
            return;
        }
        self.fuel = FUEL;
        let resolved = self.input.advance();
        log::trace!("bump {:?} at {}", resolved.token.kind, resolved.token.span);
        self.events.push(Event::Token {
            token: resolved.token,
        });
        if let Some(diagnostic) = resolved.diagnostic {
            self.events.push(Event::Error { diagnostic });
        }
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if !self.at(kind) {
            return false;
        }
        self.bump();
        true
    }

    pub(crate) fn eat_in(&mut self, set: TokenSet) -> bool {
        if !self.at_in(set) {
            return false;
        }
        self.bump();
        true
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        let found = self.nth(0);
        self.error(format!("expected {}, found {}", kind, found));
        false
    }

    pub(crate) fn start(&mut self) -> NodeMarker {
        let index = self.events.len();
        self.events.push(Event::tombstone());
        NodeMarker::new(index)
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let span = self.lookahead(0).span;
        self.events.push(Event::Error {
            diagnostic: Diagnostic::error(DiagnosticKind::Syntax, message, span),
        });
    }

    /// Report an error and wrap the current token in an `Error` node.
    pub(crate) fn error_recover(&mut self, message: impl Into<String>) {
        let m = self.start();
        self.error(message);
        self.bump();
        m.end(self, SyntaxKind::Error);
    }

    /// "expected {what}, found {current}"
    pub(crate) fn error_expected(&mut self, what: &str) {
        let found = self.nth(0);
        self.error(format!("expected {}, found {}", what, found));
    }

    /// The parse-error(t) rule: end the innermost implicit block before the
    /// current token.
    pub(crate) fn close_implicit(&mut self) -> bool {
        self.input.close_implicit()
    }

    pub(crate) fn in_implicit_block(&self) -> bool {
        self.input.in_implicit_block()
    }

    pub(crate) fn set_production(&mut self, production: &'static str) {
        self.production = production;
    }

    /// Polled between top-level items.
    pub(crate) fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled);
        }
        self.cancelled
    }

    /// Wrap everything left in one `Error` node.
    pub(crate) fn abandon_rest(&mut self, kind: DiagnosticKind, message: &str) {
        let m = self.start();
        let span = self.lookahead(0).span;
        self.events.push(Event::Error {
            diagnostic: Diagnostic::error(kind, message, span),
        });
        while !self.at_eof() {
            self.bump();
        }
        m.end(self, SyntaxKind::Error);
    }

    /// Run a recursive production, or skip the construct when nesting is
    /// already at the limit.
    pub(crate) fn nested(
        &mut self,
        rule: impl FnOnce(&mut Parser<'t>) -> Option<CompletedMarker>,
    ) -> Option<CompletedMarker> {
        if self.depth >= self.max_nesting {
            self.skip_nested();
            return None;
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn skip_nested(&mut self) {
        let m = self.start();
        self.error(format!("nesting deeper than {} levels", self.max_nesting));
        let mut depth = 0usize;
        loop {
            let kind = self.nth(0);
            if kind == TokenKind::Eof {
                break;
            }
            if OPENERS.contains(kind) {
                depth += 1;
            } else if CLOSERS.contains(kind) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            } else if depth == 0 && SEPARATORS.contains(kind) {
                break;
            }
            self.bump();
        }
        m.end(self, SyntaxKind::Error);
    }

    /// Scan ahead over a bracket-balanced region for `target`, stopping at
    /// any token of `stops` outside brackets.
    pub(crate) fn scan_for(&mut self, target: TokenKind, stops: TokenSet) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        loop {
            let kind = self.lookahead(n).kind;
            if kind == TokenKind::Eof {
                return false;
            }
            if depth == 0 {
                if kind == target {
                    return true;
                }
                if stops.contains(kind) {
                    return false;
                }
            }
            if OPENERS.contains(kind) {
                depth += 1;
            } else if CLOSERS.contains(kind) {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            n += 1;
        }
    }
}

pub(crate) const OPENERS: TokenSet = TokenSet::new(&[
    TokenKind::LParen,
    TokenKind::LBracket,
    TokenKind::LBrace,
    TokenKind::VLBrace,
]);

pub(crate) const CLOSERS: TokenSet = TokenSet::new(&[
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::RBrace,
    TokenKind::VRBrace,
]);

pub(crate) const SEPARATORS: TokenSet = TokenSet::new(&[TokenKind::Semicolon, TokenKind::VSemi]);

pub(crate) struct NodeMarker {
    index: usize,
    bomb: DropBomb,
}

impl NodeMarker {
    fn new(index: usize) -> NodeMarker {
        NodeMarker {
            index,
            bomb: DropBomb::new("node marker must be ended or cancelled"),
        }
    }

    pub(crate) fn end(mut self, p: &mut Parser, kind: SyntaxKind) -> CompletedMarker {
        self.bomb.defuse();
        if let Some(Event::Start { kind: slot, .. }) = p.events.get_mut(self.index) {
            *slot = kind;
        }
        p.events.push(Event::Finish);
        CompletedMarker { index: self.index }
    }

    pub(crate) fn cancel(mut self, p: &mut Parser) {
        self.bomb.defuse();
        if self.index + 1 == p.events.len() {
            p.events.pop();
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CompletedMarker {
    index: usize,
}

impl CompletedMarker {
    /// Start a node that will contain this one as its first child.
    pub(crate) fn precede(self, p: &mut Parser) -> NodeMarker {
        let m = p.start();
        if let Some(Event::Start { forward_parent, .. }) = p.events.get_mut(self.index) {
            *forward_parent = Some((m.index - self.index) as u32);
        }
        m
    }
}

/// Run the grammar for `entry` and return the raw event log.
pub(crate) fn run(p: &mut Parser, entry: EntryPoint) {
    match entry {
        EntryPoint::Module => module::module(p),
        EntryPoint::Declaration => fragment(p, "declaration", decl::decl),
        EntryPoint::Expression => fragment(p, "expression", |p| {
            expr::exp(p);
        }),
        EntryPoint::Type => fragment(p, "type", |p| {
            types::ctype(p);
        }),
        EntryPoint::Pattern => fragment(p, "pattern", |p| {
            pattern::pattern(p);
        }),
        EntryPoint::Import => fragment(p, "import", module::import_decl),
    }
}

fn fragment(p: &mut Parser, production: &'static str, rule: Rule) {
    p.set_production(production);
    let m = p.start();
    rule(p);
    while p.eat(TokenKind::VSemi) {}
    if !p.at_eof() {
        let found = p.nth(0);
        p.abandon_rest(
            DiagnosticKind::Syntax,
            &format!("unexpected {} after {}", found, production),
        );
    }
    m.end(p, SyntaxKind::Fragment);
}
