//! Indentation-structured parser for Cabal package descriptions.
//!
//! Cabal nests by indentation alone: a section or conditional owns every
//! following line indented further than its own first word, and a field's
//! value runs on over lines indented further than its name. The parser
//! works on the significant tokens, line by line, and emits the same events
//! as the Haskell grammar so that the shared builder produces the tree.

use crate::cst::SyntaxKind;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::lexer::{Token, TokenKind};
use crate::parser::Event;

pub(crate) struct CabalParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    events: Vec<Event>,
}

impl<'t> CabalParser<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
        }
    }

    /// Parse the whole file into a `CabalFile` node.
    pub(crate) fn parse(mut self) -> Vec<Event> {
        self.start(SyntaxKind::CabalFile);
        while self.current().is_some() {
            self.item();
        }
        self.finish();
        self.events
    }

    fn current(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn start(&mut self, kind: SyntaxKind) {
        self.events.push(Event::Start {
            kind,
            forward_parent: None,
        });
    }

    fn finish(&mut self) {
        self.events.push(Event::Finish);
    }

    fn bump(&mut self) {
        if let Some(token) = self.current() {
            self.events.push(Event::Token { token });
            self.pos += 1;
        }
    }

    fn error(&mut self, message: String, token: Token) {
        self.events.push(Event::Error {
            diagnostic: Diagnostic::error(DiagnosticKind::Syntax, message, token.span),
        });
    }

    /// Whether the current token is on `line`.
    fn on_line(&self, line: u32) -> bool {
        self.current().is_some_and(|t| t.line == line)
    }

    /// Whether the current token starts a line indented beyond `indent`.
    fn indented_beyond(&self, indent: u32) -> bool {
        self.current().is_some_and(|t| t.column > indent)
    }

    fn rest_of_line(&mut self, line: u32) {
        while self.on_line(line) {
            self.bump();
        }
    }

    fn item(&mut self) {
        let Some(token) = self.current() else {
            return;
        };
        match token.kind {
            TokenKind::CabalFieldName => self.field(token),
            TokenKind::CabalSectionKw => self.section(token),
            TokenKind::CabalIfKw => self.conditional(token),
            _ => self.unexpected_line(token),
        }
    }

    /// `name: value` with continuation lines.
    fn field(&mut self, name: Token) {
        self.start(SyntaxKind::CabalField);
        self.bump();
        if self.current().map(|t| t.kind) == Some(TokenKind::Colon) && self.on_line(name.line) {
            self.bump();
        }
        if self.on_line(name.line) || self.indented_beyond(name.column) {
            self.start(SyntaxKind::CabalFieldValue);
            self.rest_of_line(name.line);
            while self.indented_beyond(name.column) {
                let line = self.tokens[self.pos].line;
                self.rest_of_line(line);
            }
            self.finish();
        }
        self.finish();
    }

    /// `executable name` followed by an indented block.
    fn section(&mut self, keyword: Token) {
        self.start(SyntaxKind::CabalSection);
        self.bump();
        if self.on_line(keyword.line) {
            self.start(SyntaxKind::CabalSectionArgs);
            self.rest_of_line(keyword.line);
            self.finish();
        }
        self.block(keyword.column);
        self.finish();
    }

    /// `if cond` block, optionally followed by an `else` block at the same
    /// indentation.
    fn conditional(&mut self, keyword: Token) {
        self.start(SyntaxKind::CabalConditional);
        self.bump();
        self.start(SyntaxKind::CabalCondition);
        if !self.on_line(keyword.line) {
            self.error("expected a condition after `if`".to_string(), keyword);
        }
        self.rest_of_line(keyword.line);
        self.finish();
        self.block(keyword.column);

        if let Some(token) = self.current() {
            if token.kind == TokenKind::CabalElseKw && token.column == keyword.column {
                self.start(SyntaxKind::CabalElse);
                self.bump();
                if self.on_line(token.line) {
                    if let Some(extra) = self.current() {
                        self.start(SyntaxKind::Error);
                        self.error("unexpected text after `else`".to_string(), extra);
                        self.rest_of_line(token.line);
                        self.finish();
                    }
                }
                self.block(token.column);
                self.finish();
            }
        }
        self.finish();
    }

    fn block(&mut self, indent: u32) {
        self.start(SyntaxKind::CabalBlock);
        while self.indented_beyond(indent) {
            self.item();
        }
        self.finish();
    }

    /// A line that is none of the above, with everything indented under it.
    fn unexpected_line(&mut self, token: Token) {
        log::trace!("unexpected cabal line at {}", token.span);
        self.start(SyntaxKind::Error);
        let message = if token.kind == TokenKind::CabalElseKw {
            "`else` without a matching `if`".to_string()
        } else {
            format!("expected a field, section or conditional, found {}", token.kind)
        };
        self.error(message, token);
        self.rest_of_line(token.line);
        while self.indented_beyond(token.column) {
            let line = self.tokens[self.pos].line;
            self.rest_of_line(line);
        }
        self.finish();
    }
}
