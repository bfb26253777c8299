use super::names::{self, LITERALS};
use super::{block, decl, pattern, types, CompletedMarker, Parser, CLOSERS, SEPARATORS};
use crate::cst::SyntaxKind;
use crate::lexer::TokenKind;
use crate::parser::token_set::TokenSet;

const AEXP_START: TokenSet = TokenSet::new(&[
    TokenKind::VarId,
    TokenKind::QVarId,
    TokenKind::ConId,
    TokenKind::QConId,
    TokenKind::Integer,
    TokenKind::Float,
    TokenKind::Char,
    TokenKind::String,
    TokenKind::Underscore,
    TokenKind::LParen,
    TokenKind::LBracket,
]);

/// Tokens an expression can end before. An unexpected one is reported but
/// left for the enclosing construct.
const EXP_FOLLOW: TokenSet = CLOSERS.union(SEPARATORS).union(TokenSet::new(&[
    TokenKind::VLBrace,
    TokenKind::Eof,
    TokenKind::Comma,
    TokenKind::InKw,
    TokenKind::ThenKw,
    TokenKind::ElseKw,
    TokenKind::OfKw,
    TokenKind::WhereKw,
    TokenKind::DerivingKw,
    TokenKind::Equals,
    TokenKind::RightArrow,
    TokenKind::LeftArrow,
    TokenKind::Pipe,
    TokenKind::DoubleColon,
    TokenKind::FatArrow,
    TokenKind::DotDot,
]));

/// A stray operator ends the operand before it. The enclosing block skips
/// the rest of the item as one error.
const OPERATORS: TokenSet = names::VAR_SYMS
    .union(names::CON_SYMS)
    .union(TokenSet::new(&[TokenKind::Backtick]));

/// Where the search for a statement's `<-` gives up.
const BIND_STOPS: TokenSet = SEPARATORS.union(TokenSet::new(&[
    TokenKind::Comma,
    TokenKind::Equals,
    TokenKind::RightArrow,
    TokenKind::Pipe,
]));

/// An expression with an optional type annotation.
pub(crate) fn exp(p: &mut Parser) -> Option<CompletedMarker> {
    p.nested(|p| {
        let e = infix_exp(p)?;
        if !p.at(TokenKind::DoubleColon) {
            return Some(e);
        }
        let m = e.precede(p);
        p.bump();
        types::ctype(p);
        Some(m.end(p, SyntaxKind::TypedExp))
    })
}

/// Operands and operators in source order. Grouping is left to
/// [`crate::fixity`], which knows the declared precedences.
fn infix_exp(p: &mut Parser) -> Option<CompletedMarker> {
    let m = p.start();
    let mut has_operator = false;
    let mut last;
    loop {
        if p.eat(TokenKind::Minus) {
            has_operator = true;
        }
        last = lexp(p);
        if last.is_none() || !names::at_qop(p) {
            break;
        }
        // `(x +)` is a left section, not an operator application
        let len = names::qop_len(p);
        if p.nth(len) == TokenKind::RParen {
            break;
        }
        names::qop(p);
        has_operator = true;
    }
    if has_operator {
        Some(m.end(p, SyntaxKind::InfixExp))
    } else {
        m.cancel(p);
        last
    }
}

fn lexp(p: &mut Parser) -> Option<CompletedMarker> {
    match p.nth(0) {
        TokenKind::Backslash if p.nth(1) == TokenKind::CaseKw => {
            let m = p.start();
            p.bump();
            p.bump();
            alt_block(p);
            Some(m.end(p, SyntaxKind::LambdaCaseExp))
        }
        TokenKind::Backslash => {
            let m = p.start();
            p.bump();
            if !pattern::at_apat(p) {
                p.error_expected("pattern");
            }
            while pattern::at_apat(p) {
                pattern::apat(p);
            }
            p.expect(TokenKind::RightArrow);
            exp(p);
            Some(m.end(p, SyntaxKind::LambdaExp))
        }
        TokenKind::LetKw => {
            let m = p.start();
            p.bump();
            decl::decl_block(p);
            p.expect(TokenKind::InKw);
            exp(p);
            Some(m.end(p, SyntaxKind::LetExp))
        }
        TokenKind::IfKw => {
            let m = p.start();
            p.bump();
            exp(p);
            p.eat_in(SEPARATORS);
            p.expect(TokenKind::ThenKw);
            exp(p);
            p.eat_in(SEPARATORS);
            p.expect(TokenKind::ElseKw);
            exp(p);
            Some(m.end(p, SyntaxKind::IfExp))
        }
        TokenKind::CaseKw => {
            let m = p.start();
            p.bump();
            exp(p);
            p.expect(TokenKind::OfKw);
            alt_block(p);
            Some(m.end(p, SyntaxKind::CaseExp))
        }
        TokenKind::DoKw => {
            let m = p.start();
            p.bump();
            block(p, SyntaxKind::StmtBlock, stmt_item, "statement", true);
            Some(m.end(p, SyntaxKind::DoExp))
        }
        _ => fexp(p),
    }
}

/// Function application, flat: `f x y @T z`.
fn fexp(p: &mut Parser) -> Option<CompletedMarker> {
    let head = aexp(p)?;
    if !at_argument(p) {
        return Some(head);
    }
    let m = head.precede(p);
    loop {
        if p.at_in(AEXP_START) {
            aexp(p);
        } else if p.at(TokenKind::At) && p.at_prefix_occurrence() {
            let app = p.start();
            p.bump();
            types::atype(p);
            app.end(p, SyntaxKind::TypeApp);
        } else if p.at(TokenKind::DoKw) || p.at(TokenKind::Backslash) {
            lexp(p);
            break;
        } else {
            break;
        }
    }
    Some(m.end(p, SyntaxKind::AppExp))
}

fn at_argument(p: &mut Parser) -> bool {
    p.at_in(AEXP_START)
        || p.at(TokenKind::DoKw)
        || p.at(TokenKind::Backslash)
        || (p.at(TokenKind::At) && p.at_prefix_occurrence())
}

fn aexp(p: &mut Parser) -> Option<CompletedMarker> {
    let mut e = atom(p)?;
    while p.at(TokenKind::LBrace) {
        let m = e.precede(p);
        field_binds(p);
        e = m.end(p, SyntaxKind::RecordExp);
    }
    Some(e)
}

fn atom(p: &mut Parser) -> Option<CompletedMarker> {
    match p.nth(0) {
        TokenKind::VarId | TokenKind::QVarId => names::qvar(p),
        TokenKind::ConId | TokenKind::QConId => names::qcon(p),
        kind if LITERALS.contains(kind) => Some(names::literal(p)),
        TokenKind::Underscore => {
            let m = p.start();
            p.bump();
            Some(m.end(p, SyntaxKind::HoleExp))
        }
        TokenKind::Pragma => {
            let m = p.start();
            names::pragma(p);
            exp(p);
            Some(m.end(p, SyntaxKind::PragmaExp))
        }
        TokenKind::LParen | TokenKind::LBracket if names::at_special_con(p) => names::qcon(p),
        TokenKind::LParen if names::nth_at_paren_op(p, 0, names::VAR_SYMS) => names::qvar(p),
        TokenKind::LParen if names::nth_at_paren_op(p, 0, names::CON_SYMS) => names::qcon(p),
        TokenKind::LParen => Some(paren_exp(p)),
        TokenKind::LBracket => Some(list_exp(p)),
        kind if EXP_FOLLOW.contains(kind) || OPERATORS.contains(kind) => {
            p.error_expected("expression");
            None
        }
        kind => {
            p.error_recover(format!("expected expression, found {}", kind));
            None
        }
    }
}

/// Parenthesised expression, tuple or operator section.
fn paren_exp(p: &mut Parser) -> CompletedMarker {
    let m = p.start();
    p.bump();
    if names::at_qop(p) && !p.at(TokenKind::Minus) {
        names::qop(p);
        exp(p);
        p.expect(TokenKind::RParen);
        return m.end(p, SyntaxKind::RightSection);
    }
    exp(p);
    let kind = if names::at_qop(p) {
        names::qop(p);
        SyntaxKind::LeftSection
    } else if p.at(TokenKind::Comma) {
        while p.eat(TokenKind::Comma) {
            exp(p);
        }
        SyntaxKind::TupleExp
    } else {
        SyntaxKind::ParenExp
    };
    p.expect(TokenKind::RParen);
    m.end(p, kind)
}

/// List literal, arithmetic sequence or comprehension.
fn list_exp(p: &mut Parser) -> CompletedMarker {
    let m = p.start();
    p.bump();
    exp(p);
    let kind = match p.nth(0) {
        TokenKind::DotDot => {
            p.bump();
            if !p.at(TokenKind::RBracket) {
                exp(p);
            }
            SyntaxKind::ArithSeq
        }
        TokenKind::Pipe => {
            while p.eat(TokenKind::Pipe) {
                stmt(p);
                while p.eat(TokenKind::Comma) {
                    stmt(p);
                }
            }
            SyntaxKind::ListComp
        }
        TokenKind::Comma => {
            p.bump();
            exp(p);
            if p.eat(TokenKind::DotDot) {
                if !p.at(TokenKind::RBracket) {
                    exp(p);
                }
                SyntaxKind::ArithSeq
            } else {
                while p.eat(TokenKind::Comma) {
                    exp(p);
                }
                SyntaxKind::ListExp
            }
        }
        _ => SyntaxKind::ListExp,
    };
    p.expect(TokenKind::RBracket);
    m.end(p, kind)
}

/// `{ field = e, pun, .. }` after a constructor or record value.
fn field_binds(p: &mut Parser) {
    p.bump();
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        if !p.eat(TokenKind::DotDot) {
            if !names::at_qvar(p) {
                p.error_expected("field name");
                break;
            }
            let field = p.start();
            names::qvar(p);
            if p.eat(TokenKind::Equals) {
                exp(p);
            }
            field.end(p, SyntaxKind::FieldBind);
        }
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::RBrace);
}

fn alt_block(p: &mut Parser) {
    block(p, SyntaxKind::AltBlock, alt, "case alternative", true);
}

/// `Just x | x > 0 -> e`
fn alt(p: &mut Parser) {
    let m = p.start();
    pattern::pattern(p);
    decl::rhs(p, TokenKind::RightArrow);
    m.end(p, SyntaxKind::Alt);
}

fn stmt_item(p: &mut Parser) {
    stmt(p);
}

/// A `do` statement, guard or comprehension qualifier.
pub(super) fn stmt(p: &mut Parser) {
    if p.at(TokenKind::LetKw) {
        let m = p.start();
        p.bump();
        decl::decl_block(p);
        if !p.at(TokenKind::InKw) {
            m.end(p, SyntaxKind::LetStmt);
            return;
        }
        // `let ... in e` is an expression statement
        p.bump();
        exp(p);
        let let_exp = m.end(p, SyntaxKind::LetExp);
        let_exp.precede(p).end(p, SyntaxKind::ExpStmt);
        return;
    }
    let m = p.start();
    if p.scan_for(TokenKind::LeftArrow, BIND_STOPS) {
        pattern::pattern(p);
        p.expect(TokenKind::LeftArrow);
        exp(p);
        m.end(p, SyntaxKind::BindStmt);
    } else {
        exp(p);
        m.end(p, SyntaxKind::ExpStmt);
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse_with, EntryPoint, ParseOptions};

    fn exp_tree(source: &str) -> String {
        let options = ParseOptions {
            entry_point: EntryPoint::Expression,
            ..ParseOptions::default()
        };
        let parse = parse_with(source, &options).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        parse.tree().debug_tree(false)
    }

    #[test]
    fn test_application_is_flat() {
        let tree = exp_tree("f x y");
        assert!(tree.contains("AppExp@0..5"));
        assert_eq!(tree.matches("AppExp").count(), 1);
    }

    #[test]
    fn test_operators_stay_flat() {
        let tree = exp_tree("1 + 2 * 3");
        assert!(tree.contains("InfixExp@0..9"));
        assert_eq!(tree.matches("InfixExp").count(), 1);
        assert_eq!(tree.matches("QVarOp").count(), 2);
    }

    #[test]
    fn test_sections() {
        assert!(exp_tree("(+ 1)").contains("RightSection@0..5"));
        assert!(exp_tree("(x -)").contains("LeftSection@0..5"));
        assert!(exp_tree("(`div` 2)").contains("RightSection@0..9"));
    }

    #[test]
    fn test_negation_is_not_a_section() {
        let tree = exp_tree("(- 1)");
        assert!(tree.contains("ParenExp@0..5"));
        assert!(tree.contains("InfixExp@1..4"));
    }

    #[test]
    fn test_type_application() {
        let tree = exp_tree("show @Int 1");
        assert!(tree.contains("TypeApp@5..9"));
    }

    #[test]
    fn test_list_forms() {
        assert!(exp_tree("[1 .. 10]").contains("ArithSeq@0..9"));
        assert!(exp_tree("[1, 3 .. 9]").contains("ArithSeq@0..11"));
        assert!(exp_tree("[x | x <- xs, even x]").contains("BindStmt@5..12"));
        assert!(exp_tree("[]").contains("SpecialCon@0..2"));
    }

    #[test]
    fn test_record_update() {
        let tree = exp_tree("cfg { verbose = True, .. }");
        assert!(tree.contains("RecordExp@0..26"));
        assert!(tree.contains("FieldBind@6..20"));
    }

    #[test]
    fn test_let_statement_followed_by_in_is_an_expression() {
        let tree = exp_tree("do\n  let x = 1 in print x\n  pure ()");
        assert!(tree.contains("ExpStmt"));
        assert!(tree.contains("LetExp"));
        assert!(!tree.contains("LetStmt"));
    }

    #[test]
    fn test_block_argument() {
        let tree = exp_tree("forM_ xs \\x -> print x");
        assert!(tree.contains("AppExp@0..22"));
        assert!(tree.contains("LambdaExp@9..22"));
    }
}
