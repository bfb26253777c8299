use super::{Parser, Rule, CLOSERS, OPENERS, SEPARATORS};
use crate::cst::SyntaxKind;
use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;
use crate::parser::token_set::TokenSet;

/// Tokens that cannot continue an item of an implicit block. Meeting one
/// where an item should end closes the block (parse-error(t)).
const BLOCK_CLOSERS: TokenSet = TokenSet::new(&[
    TokenKind::InKw,
    TokenKind::ThenKw,
    TokenKind::ElseKw,
    TokenKind::OfKw,
    TokenKind::WhereKw,
    TokenKind::RParen,
    TokenKind::RBracket,
    TokenKind::RBrace,
    TokenKind::Comma,
    TokenKind::Equals,
    TokenKind::RightArrow,
    TokenKind::Pipe,
]);

/// A `{ item ; item ; ... }` block with explicit or virtual braces.
///
/// `closable` blocks may be ended early by the parse-error(t) rule; the
/// module body may not, so a stray token there stays a local error.
pub(crate) fn block(p: &mut Parser, kind: SyntaxKind, item: Rule, what: &'static str, closable: bool) {
    let m = p.start();
    let explicit = if p.at(TokenKind::LBrace) {
        true
    } else if p.at(TokenKind::VLBrace) {
        false
    } else {
        p.error_expected(what);
        m.end(p, kind);
        return;
    };
    p.bump();
    let close = if explicit { TokenKind::RBrace } else { TokenKind::VRBrace };
    let is_module = kind == SyntaxKind::ModuleBody;

    loop {
        while p.at_in(SEPARATORS) {
            p.bump();
        }
        if is_module && p.is_cancelled() {
            log::debug!("parse cancelled");
            p.abandon_rest(DiagnosticKind::Cancelled, "parse cancelled");
            break;
        }
        if p.eat(close) {
            break;
        }
        if p.at_eof() {
            p.error(format!("expected {}, found end of file", close));
            break;
        }
        if !explicit && closable && p.at_in(BLOCK_CLOSERS) && p.close_implicit() {
            continue;
        }

        p.set_production(what);
        let before = p.events.len();
        item(p);
        let reported = p.events[before..].iter().any(|e| e.is_error());

        if p.at_in(SEPARATORS) || p.at(close) || p.at_eof() {
            continue;
        }
        if !explicit && closable && p.at_in(BLOCK_CLOSERS) && p.in_implicit_block() && p.close_implicit() {
            continue;
        }
        recover(p, close, what, reported);
    }
    m.end(p, kind);
}

/// Skip to the next separator or the block's closing brace, outside any
/// brackets opened while skipping.
fn recover(p: &mut Parser, close: TokenKind, what: &str, reported: bool) {
    let m = p.start();
    if !reported {
        let found = p.nth(0);
        p.error(format!("unexpected {} in {}", found, what));
    }
    let mut depth = 0usize;
    loop {
        let kind = p.nth(0);
        if kind == TokenKind::Eof {
            break;
        }
        if depth == 0 && (SEPARATORS.contains(kind) || kind == close) {
            break;
        }
        if OPENERS.contains(kind) {
            depth += 1;
        } else if CLOSERS.contains(kind) {
            depth = depth.saturating_sub(1);
        }
        p.bump();
    }
    log::trace!("recovered {} at {:?}", what, p.nth(0));
    m.end(p, SyntaxKind::Error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{lex, Layout, Token};
    use crate::parser::event::Event;
    use crate::parser::CancellationToken;

    fn decl_then_cancel(p: &mut Parser) {
        super::super::decl::decl(p);
        if let Some(token) = &p.cancellation {
            token.cancel();
        }
    }

    #[test]
    fn test_cancel_between_items() {
        let source = "f = 1\ng = 2\nh = 3\n";
        let significant: Vec<Token> = lex(source)
            .into_iter()
            .filter(|t| !t.is_layout_transparent())
            .collect();
        let layout = Layout::for_module(source, &significant);
        let mut p = Parser::new(source, layout, 100, Some(CancellationToken::new()));
        block(&mut p, SyntaxKind::ModuleBody, decl_then_cancel, "declaration", false);
        let (events, stalled) = p.finish();
        assert!(stalled.is_none());

        let decls = events
            .iter()
            .filter(|e| matches!(e, Event::Start { kind: SyntaxKind::FunOrPatDecl, .. }))
            .count();
        assert_eq!(decls, 1);
        let cancelled: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Error { diagnostic } => Some(diagnostic),
                _ => None,
            })
            .collect();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].kind, DiagnosticKind::Cancelled);
        assert_eq!(cancelled[0].span.text(source), "g");

        let texts: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::Token { token } if !token.kind.is_virtual() => Some(token.text(source)),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["f", "=", "1", "g", "=", "2", "h", "=", "3"]);
    }
}
