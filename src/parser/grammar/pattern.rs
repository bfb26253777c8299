use super::names::{self, CON_IDS, CON_SYMS, LITERALS, VAR_IDS};
use super::{types, CompletedMarker, Parser};
use crate::cst::SyntaxKind;
use crate::lexer::TokenKind;
use crate::parser::token_set::TokenSet;

pub(super) const APAT_START: TokenSet = TokenSet::new(&[
    TokenKind::VarId,
    TokenKind::QVarId,
    TokenKind::ConId,
    TokenKind::QConId,
    TokenKind::Underscore,
    TokenKind::Integer,
    TokenKind::Float,
    TokenKind::Char,
    TokenKind::String,
    TokenKind::Tilde,
    TokenKind::LParen,
    TokenKind::LBracket,
]);

/// `x : xs`, `a :| as`
pub(crate) fn pattern(p: &mut Parser) -> Option<CompletedMarker> {
    p.nested(|p| {
        let first = lpat(p)?;
        if !names::at_qconop(p) {
            return Some(first);
        }
        let m = first.precede(p);
        while names::at_qconop(p) {
            names::qop(p);
            if lpat(p).is_none() {
                break;
            }
        }
        Some(m.end(p, SyntaxKind::InfixPat))
    })
}

pub(super) fn at_pattern(p: &mut Parser) -> bool {
    at_apat(p) || p.at(TokenKind::Minus)
}

pub(super) fn at_apat(p: &mut Parser) -> bool {
    p.at_in(APAT_START) || (p.at(TokenKind::Bang) && p.at_prefix_occurrence())
}

fn lpat(p: &mut Parser) -> Option<CompletedMarker> {
    if p.at(TokenKind::Minus) && matches!(p.nth(1), TokenKind::Integer | TokenKind::Float) {
        let m = p.start();
        p.bump();
        names::literal(p);
        return Some(m.end(p, SyntaxKind::LitPat));
    }
    let at_con = p.at_in(CON_IDS) || names::nth_at_paren_op(p, 0, CON_SYMS);
    if at_con && p.nth(1) != TokenKind::LBrace {
        let m = p.start();
        names::qcon(p);
        while at_apat(p) {
            apat(p);
        }
        return Some(m.end(p, SyntaxKind::ConPat));
    }
    apat(p)
}

pub(super) fn apat(p: &mut Parser) -> Option<CompletedMarker> {
    let m = p.start();
    let kind = match p.nth(0) {
        TokenKind::VarId | TokenKind::QVarId => {
            names::qvar(p);
            if p.eat(TokenKind::At) {
                apat(p);
                SyntaxKind::AsPat
            } else {
                SyntaxKind::VarPat
            }
        }
        _ if names::nth_at_paren_op(p, 0, names::VAR_SYMS) => {
            names::qvar(p);
            SyntaxKind::VarPat
        }
        _ if names::at_qcon(p) => {
            names::qcon(p);
            if p.at(TokenKind::LBrace) {
                record_fields(p);
                SyntaxKind::RecordPat
            } else {
                SyntaxKind::ConPat
            }
        }
        TokenKind::Underscore => {
            p.bump();
            SyntaxKind::WildPat
        }
        kind if LITERALS.contains(kind) => {
            names::literal(p);
            SyntaxKind::LitPat
        }
        TokenKind::Tilde => {
            p.bump();
            apat(p);
            SyntaxKind::LazyPat
        }
        TokenKind::Bang => {
            p.bump();
            apat(p);
            SyntaxKind::BangPat
        }
        TokenKind::LParen => paren_pattern(p),
        TokenKind::LBracket => {
            p.bump();
            pattern(p);
            while p.eat(TokenKind::Comma) {
                pattern(p);
            }
            p.expect(TokenKind::RBracket);
            SyntaxKind::ListPat
        }
        _ => {
            m.cancel(p);
            p.error_expected("pattern");
            return None;
        }
    };
    Some(m.end(p, kind))
}

/// `(p)`, `(p :: t)` or `(a, b)`, with the `(` still ahead.
fn paren_pattern(p: &mut Parser) -> SyntaxKind {
    p.bump();
    if let Some(inner) = pattern(p) {
        if p.at(TokenKind::DoubleColon) {
            let typed = inner.precede(p);
            p.bump();
            types::ctype(p);
            typed.end(p, SyntaxKind::TypedPat);
        }
    }
    let kind = if p.at(TokenKind::Comma) {
        while p.eat(TokenKind::Comma) {
            pattern(p);
        }
        SyntaxKind::TuplePat
    } else {
        SyntaxKind::ParenPat
    };
    p.expect(TokenKind::RParen);
    kind
}

/// `{ field = pat, pun, .. }`
fn record_fields(p: &mut Parser) {
    p.bump();
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        if !p.eat(TokenKind::DotDot) {
            if !p.at_in(VAR_IDS) && !names::nth_at_paren_op(p, 0, names::VAR_SYMS) {
                p.error_expected("field pattern");
                break;
            }
            let field = p.start();
            names::qvar(p);
            if p.eat(TokenKind::Equals) {
                pattern(p);
            }
            field.end(p, SyntaxKind::FieldPat);
        }
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::RBrace);
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse_with, EntryPoint, ParseOptions};

    fn pattern_tree(source: &str) -> String {
        let options = ParseOptions {
            entry_point: EntryPoint::Pattern,
            ..ParseOptions::default()
        };
        let parse = parse_with(source, &options).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        parse.tree().debug_tree(false)
    }

    #[test]
    fn test_cons_pattern_is_infix() {
        let tree = pattern_tree("x : xs");
        assert!(tree.contains("InfixPat@0..6"));
        assert!(tree.contains("QConOp@2..3"));
    }

    #[test]
    fn test_as_pattern_and_bang() {
        let tree = pattern_tree("all@(Just !x)");
        assert!(tree.contains("AsPat@0..13"));
        assert!(tree.contains("ConPat@5..12"));
        assert!(tree.contains("BangPat@10..12"));
    }

    #[test]
    fn test_typed_pattern_in_parens() {
        let tree = pattern_tree("(n :: Int)");
        assert!(tree.contains("ParenPat@0..10"));
        assert!(tree.contains("TypedPat@1..9"));
    }

    #[test]
    fn test_record_pattern_with_wildcard() {
        let tree = pattern_tree("Config{verbose = v, ..}");
        assert!(tree.contains("RecordPat@0..23"));
        assert!(tree.contains("FieldPat@7..18"));
    }

    #[test]
    fn test_negative_literal() {
        let tree = pattern_tree("-1");
        assert!(tree.contains("LitPat@0..2"));
    }
}
