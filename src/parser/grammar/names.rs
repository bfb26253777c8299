use super::{CompletedMarker, Parser};
use crate::cst::SyntaxKind;
use crate::lexer::TokenKind;
use crate::parser::token_set::TokenSet;

pub(super) const VAR_SYMS: TokenSet = TokenSet::new(&[
    TokenKind::VarSym,
    TokenKind::QVarSym,
    TokenKind::Minus,
    TokenKind::Bang,
    TokenKind::Dot,
]);

pub(super) const CON_SYMS: TokenSet =
    TokenSet::new(&[TokenKind::ConSym, TokenKind::QConSym, TokenKind::Colon]);

pub(super) const VAR_IDS: TokenSet = TokenSet::new(&[TokenKind::VarId, TokenKind::QVarId]);

pub(super) const CON_IDS: TokenSet = TokenSet::new(&[TokenKind::ConId, TokenKind::QConId]);

pub(super) const LITERALS: TokenSet = TokenSet::new(&[
    TokenKind::Integer,
    TokenKind::Float,
    TokenKind::Char,
    TokenKind::String,
]);

/// A single-token node inside a wrapper: `QVarId[x]`, `QConSym[:|]`.
pub(super) fn leaf(p: &mut Parser, kind: SyntaxKind) -> CompletedMarker {
    let m = p.start();
    p.bump();
    m.end(p, kind)
}

/// `(` sym `)` starting `n` tokens ahead.
pub(super) fn nth_at_paren_op(p: &mut Parser, n: usize, syms: TokenSet) -> bool {
    p.nth(n) == TokenKind::LParen && syms.contains(p.nth(n + 1)) && p.nth(n + 2) == TokenKind::RParen
}

/// Variable name: `x`, `M.x`, `(+)`, `(M.!)`.
pub(super) fn at_qvar(p: &mut Parser) -> bool {
    p.at_in(VAR_IDS) || nth_at_paren_op(p, 0, VAR_SYMS)
}

pub(super) fn at_qcon(p: &mut Parser) -> bool {
    p.at_in(CON_IDS) || nth_at_paren_op(p, 0, CON_SYMS) || at_special_con(p)
}

pub(super) fn qvar(p: &mut Parser) -> Option<CompletedMarker> {
    if p.at_in(VAR_IDS) {
        let m = p.start();
        leaf(p, SyntaxKind::QVarId);
        return Some(m.end(p, SyntaxKind::QVar));
    }
    if nth_at_paren_op(p, 0, VAR_SYMS) {
        let m = p.start();
        p.bump();
        leaf(p, SyntaxKind::QVarSym);
        p.bump();
        return Some(m.end(p, SyntaxKind::QVar));
    }
    p.error_expected("variable name");
    None
}

pub(super) fn qcon(p: &mut Parser) -> Option<CompletedMarker> {
    if p.at_in(CON_IDS) {
        let m = p.start();
        leaf(p, SyntaxKind::QConId);
        return Some(m.end(p, SyntaxKind::QCon));
    }
    if nth_at_paren_op(p, 0, CON_SYMS) {
        let m = p.start();
        p.bump();
        leaf(p, SyntaxKind::QConSym);
        p.bump();
        return Some(m.end(p, SyntaxKind::QCon));
    }
    if at_special_con(p) {
        let m = p.start();
        special_con(p);
        return Some(m.end(p, SyntaxKind::QCon));
    }
    p.error_expected("constructor name");
    None
}

/// `()`, `[]`, `(,)`, `(,,)`, `(->)`.
pub(super) fn at_special_con(p: &mut Parser) -> bool {
    match p.nth(0) {
        TokenKind::LBracket => p.nth(1) == TokenKind::RBracket,
        TokenKind::LParen => match p.nth(1) {
            TokenKind::RParen => true,
            TokenKind::RightArrow => p.nth(2) == TokenKind::RParen,
            TokenKind::Comma => {
                let mut n = 1;
                while p.nth(n) == TokenKind::Comma {
                    n += 1;
                }
                p.nth(n) == TokenKind::RParen
            }
            _ => false,
        },
        _ => false,
    }
}

pub(super) fn special_con(p: &mut Parser) -> CompletedMarker {
    let m = p.start();
    if p.eat(TokenKind::LBracket) {
        p.expect(TokenKind::RBracket);
    } else {
        p.bump();
        while p.eat(TokenKind::Comma) {}
        p.eat(TokenKind::RightArrow);
        p.expect(TokenKind::RParen);
    }
    m.end(p, SyntaxKind::SpecialCon)
}

/// Operators usable infix in expressions.
pub(super) fn at_qop(p: &mut Parser) -> bool {
    p.at_in(VAR_SYMS.union(CON_SYMS)) || at_backtick_op(p)
}

pub(super) fn at_qconop(p: &mut Parser) -> bool {
    p.at_in(CON_SYMS) || (at_backtick_op(p) && CON_IDS.contains(p.nth(1)))
}

fn at_backtick_op(p: &mut Parser) -> bool {
    p.at(TokenKind::Backtick)
        && VAR_IDS.union(CON_IDS).contains(p.nth(1))
        && p.nth(2) == TokenKind::Backtick
}

/// Number of tokens the operator at the current position spans.
pub(super) fn qop_len(p: &mut Parser) -> usize {
    if p.at(TokenKind::Backtick) {
        3
    } else {
        1
    }
}

/// `+`, `M.!`, `:|`, `` `elem` ``, `` `Cons` ``.
pub(super) fn qop(p: &mut Parser) -> Option<CompletedMarker> {
    if p.at(TokenKind::Backtick) {
        if !at_backtick_op(p) {
            p.error_expected("operator");
            return None;
        }
        let m = p.start();
        p.bump();
        let kind = if p.at_in(CON_IDS) {
            leaf(p, SyntaxKind::QConId);
            SyntaxKind::QConOp
        } else {
            leaf(p, SyntaxKind::QVarId);
            SyntaxKind::QVarOp
        };
        p.expect(TokenKind::Backtick);
        return Some(m.end(p, kind));
    }
    if p.at_in(VAR_SYMS) {
        let m = p.start();
        leaf(p, SyntaxKind::QVarSym);
        return Some(m.end(p, SyntaxKind::QVarOp));
    }
    if p.at_in(CON_SYMS) {
        let m = p.start();
        leaf(p, SyntaxKind::QConSym);
        return Some(m.end(p, SyntaxKind::QConOp));
    }
    p.error_expected("operator");
    None
}

/// Type operators also include `~`.
pub(super) fn at_type_op(p: &mut Parser) -> bool {
    matches!(
        p.nth(0),
        TokenKind::VarSym | TokenKind::QVarSym | TokenKind::Tilde
    ) || p.at_in(CON_SYMS)
        || at_backtick_op(p)
}

pub(super) fn type_op(p: &mut Parser) -> Option<CompletedMarker> {
    if p.at(TokenKind::Tilde) {
        let m = p.start();
        leaf(p, SyntaxKind::QVarSym);
        return Some(m.end(p, SyntaxKind::QVarOp));
    }
    qop(p)
}

pub(super) fn module_name(p: &mut Parser) {
    if p.at_in(CON_IDS) {
        leaf(p, SyntaxKind::ModuleName);
    } else {
        p.error_expected("module name");
    }
}

pub(super) fn literal(p: &mut Parser) -> CompletedMarker {
    leaf(p, SyntaxKind::Literal)
}

pub(super) fn pragma(p: &mut Parser) -> CompletedMarker {
    leaf(p, SyntaxKind::Pragma)
}

/// `TyVar[a]`
pub(super) fn ty_var(p: &mut Parser) -> CompletedMarker {
    leaf(p, SyntaxKind::TyVar)
}
