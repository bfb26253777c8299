use super::names::{self, CON_IDS, CON_SYMS, LITERALS};
use super::{CompletedMarker, Parser};
use crate::cst::SyntaxKind;
use crate::lexer::TokenKind;
use crate::parser::token_set::TokenSet;

/// Where the search for a context's `=>` gives up.
const CONTEXT_STOPS: TokenSet = TokenSet::new(&[
    TokenKind::RightArrow,
    TokenKind::LeftArrow,
    TokenKind::Equals,
    TokenKind::Pipe,
    TokenKind::DoubleColon,
    TokenKind::Comma,
    TokenKind::WhereKw,
    TokenKind::DerivingKw,
    TokenKind::InKw,
    TokenKind::ThenKw,
    TokenKind::ElseKw,
    TokenKind::OfKw,
    TokenKind::Semicolon,
    TokenKind::VSemi,
]);

const ATYPE_ARG_START: TokenSet = TokenSet::new(&[
    TokenKind::ConId,
    TokenKind::QConId,
    TokenKind::VarId,
    TokenKind::Underscore,
    TokenKind::Integer,
    TokenKind::String,
    TokenKind::Char,
    TokenKind::Quote,
    TokenKind::LParen,
    TokenKind::LBracket,
]);

pub(super) fn at_context(p: &mut Parser) -> bool {
    p.scan_for(TokenKind::FatArrow, CONTEXT_STOPS)
}

/// `forall a b. (Eq a, Show b) => a -> b`
///
/// Always produces a `CType` node; the quantifier and context are optional.
pub(crate) fn ctype(p: &mut Parser) -> Option<CompletedMarker> {
    p.nested(|p| {
        let m = p.start();
        if p.at(TokenKind::ForallKw) {
            forall(p);
        }
        if at_context(p) {
            let c = p.start();
            infix_type(p);
            c.end(p, SyntaxKind::Context);
            p.expect(TokenKind::FatArrow);
            if p.at(TokenKind::ForallKw) || at_context(p) {
                ctype(p);
            } else {
                type_(p);
            }
        } else {
            type_(p);
        }
        Some(m.end(p, SyntaxKind::CType))
    })
}

fn forall(p: &mut Parser) {
    p.bump();
    while p.at(TokenKind::VarId) || p.at(TokenKind::LParen) || p.at(TokenKind::LBrace) {
        tv_bndr(p);
    }
    p.expect(TokenKind::Dot);
}

/// `a`, `(a :: k)` or the inferred `{a :: k}`.
pub(super) fn tv_bndr(p: &mut Parser) {
    let m = p.start();
    let close = match p.nth(0) {
        TokenKind::LParen => Some(TokenKind::RParen),
        TokenKind::LBrace => Some(TokenKind::RBrace),
        _ => None,
    };
    match close {
        Some(close) => {
            p.bump();
            p.expect(TokenKind::VarId);
            if p.eat(TokenKind::DoubleColon) {
                ctype(p);
            }
            p.expect(close);
        }
        None => {
            p.expect(TokenKind::VarId);
        }
    }
    m.end(p, SyntaxKind::TvBndr);
}

/// `a -> b -> c`, nested to the right.
pub(super) fn type_(p: &mut Parser) -> Option<CompletedMarker> {
    let mut pending = Vec::new();
    let mut result = None;
    let mut lhs = infix_type(p);
    while let Some(operand) = lhs {
        if !p.at(TokenKind::RightArrow) {
            result = Some(operand);
            break;
        }
        let m = operand.precede(p);
        p.bump();
        pending.push(m);
        if p.at(TokenKind::ForallKw) || at_context(p) {
            ctype(p);
            break;
        }
        lhs = infix_type(p);
    }
    while let Some(m) = pending.pop() {
        result = Some(m.end(p, SyntaxKind::FunType));
    }
    result
}

/// `a :+: b`, `a ~ b`, ``a `Either` b``. Operators stay flat.
pub(super) fn infix_type(p: &mut Parser) -> Option<CompletedMarker> {
    let first = btype(p)?;
    if !names::at_type_op(p) {
        return Some(first);
    }
    let m = first.precede(p);
    while names::at_type_op(p) {
        names::type_op(p);
        if btype(p).is_none() {
            break;
        }
    }
    Some(m.end(p, SyntaxKind::InfixType))
}

/// `Maybe a`, `Either e a`.
pub(super) fn btype(p: &mut Parser) -> Option<CompletedMarker> {
    let head = atype(p)?;
    if !p.at_in(ATYPE_ARG_START) {
        return Some(head);
    }
    let m = head.precede(p);
    while p.at_in(ATYPE_ARG_START) {
        atype(p);
    }
    Some(m.end(p, SyntaxKind::AppType))
}

pub(super) fn at_atype(p: &mut Parser) -> bool {
    p.at_in(ATYPE_ARG_START)
        || p.at(TokenKind::Bang)
        || p.at(TokenKind::Tilde)
        || at_star(p)
}

fn at_star(p: &mut Parser) -> bool {
    p.at(TokenKind::VarSym) && matches!(p.nth_text(0), "*" | "★")
}

pub(super) fn atype(p: &mut Parser) -> Option<CompletedMarker> {
    let m = p.start();
    let kind = match p.nth(0) {
        TokenKind::ConId | TokenKind::QConId => {
            p.bump();
            SyntaxKind::TyCon
        }
        TokenKind::VarSym if at_star(p) => {
            p.bump();
            SyntaxKind::TyCon
        }
        TokenKind::VarId => {
            p.bump();
            SyntaxKind::TyVar
        }
        TokenKind::Underscore => {
            p.bump();
            SyntaxKind::WildcardType
        }
        kind if LITERALS.contains(kind) && kind != TokenKind::Float => {
            p.bump();
            SyntaxKind::TypeLit
        }
        TokenKind::Bang => {
            p.bump();
            atype(p);
            SyntaxKind::BangType
        }
        TokenKind::Tilde => {
            p.bump();
            atype(p);
            SyntaxKind::LazyType
        }
        TokenKind::Quote => {
            p.bump();
            if p.at_in(CON_SYMS) {
                names::leaf(p, SyntaxKind::QConSym);
            } else if p.at_in(CON_IDS) {
                names::leaf(p, SyntaxKind::TyCon);
            } else {
                atype(p);
            }
            SyntaxKind::PromotedType
        }
        TokenKind::LParen | TokenKind::LBracket if names::at_special_con(p) => {
            names::special_con(p);
            SyntaxKind::TyCon
        }
        TokenKind::LParen if p.nth(2) == TokenKind::RParen && at_paren_type_op(p) => {
            p.bump();
            let sym = if CON_SYMS.contains(p.nth(0)) {
                SyntaxKind::QConSym
            } else {
                SyntaxKind::QVarSym
            };
            names::leaf(p, sym);
            p.bump();
            SyntaxKind::TyCon
        }
        TokenKind::LParen => paren_type(p),
        TokenKind::LBracket => {
            p.bump();
            ctype(p);
            while p.eat(TokenKind::Comma) {
                ctype(p);
            }
            p.expect(TokenKind::RBracket);
            SyntaxKind::ListType
        }
        _ => {
            m.cancel(p);
            p.error_expected("type");
            return None;
        }
    };
    Some(m.end(p, kind))
}

fn at_paren_type_op(p: &mut Parser) -> bool {
    matches!(
        p.nth(1),
        TokenKind::ConSym
            | TokenKind::QConSym
            | TokenKind::Colon
            | TokenKind::VarSym
            | TokenKind::QVarSym
            | TokenKind::Tilde
    )
}

/// `(t)`, `(a, b)` or `(t :: k)`, with the `(` still ahead.
fn paren_type(p: &mut Parser) -> SyntaxKind {
    p.bump();
    ctype(p);
    let kind = if p.eat(TokenKind::DoubleColon) {
        ctype(p);
        SyntaxKind::KindSig
    } else if p.at(TokenKind::Comma) {
        while p.eat(TokenKind::Comma) {
            ctype(p);
        }
        SyntaxKind::TupleType
    } else {
        SyntaxKind::ParenType
    };
    p.expect(TokenKind::RParen);
    kind
}
