use super::names::{self, CON_IDS, CON_SYMS, VAR_SYMS};
use super::{block, expr, module, pattern, types, Parser};
use crate::cst::SyntaxKind;
use crate::lexer::TokenKind;

/// One item of a declaration block or the module body.
pub(crate) fn decl(p: &mut Parser) {
    match p.nth(0) {
        TokenKind::DataKw => data_decl(p, SyntaxKind::DataDecl),
        TokenKind::NewtypeKw => data_decl(p, SyntaxKind::NewtypeDecl),
        TokenKind::TypeKw => type_decl(p),
        TokenKind::ClassKw => class_decl(p),
        TokenKind::InstanceKw => instance_decl(p),
        TokenKind::DerivingKw => deriving_decl(p),
        TokenKind::DefaultKw if p.nth(1) == TokenKind::LParen => default_decl(p),
        TokenKind::DefaultKw => type_sig(p),
        TokenKind::ForeignKw => foreign_decl(p),
        TokenKind::InfixKw | TokenKind::InfixlKw | TokenKind::InfixrKw => fixity_decl(p),
        TokenKind::Pragma => {
            names::pragma(p);
        }
        TokenKind::ImportKw => {
            p.error("import declarations must precede all other declarations");
            module::import_decl(p);
        }
        _ if at_type_sig(p) => type_sig(p),
        _ => fun_or_pat_decl(p),
    }
}

pub(super) fn decl_block(p: &mut Parser) {
    block(p, SyntaxKind::DeclBlock, decl, "declaration", true);
}

/// `f, (<+>) ::`
fn at_type_sig(p: &mut Parser) -> bool {
    let mut n = 0;
    loop {
        if p.nth(n) == TokenKind::VarId {
            n += 1;
        } else if names::nth_at_paren_op(p, n, VAR_SYMS) {
            n += 3;
        } else {
            return false;
        }
        match p.nth(n) {
            TokenKind::Comma => n += 1,
            TokenKind::DoubleColon => return true,
            _ => return false,
        }
    }
}

/// `f, g :: ctype`, or a class method's `default f :: ctype`.
fn type_sig(p: &mut Parser) {
    let m = p.start();
    p.eat(TokenKind::DefaultKw);
    names::qvar(p);
    while p.eat(TokenKind::Comma) {
        names::qvar(p);
    }
    p.expect(TokenKind::DoubleColon);
    types::ctype(p);
    m.end(p, SyntaxKind::TypeSig);
}

/// `f x y`, `(<+>) a b`: a variable followed by arguments or the rhs.
fn at_prefix_lhs(p: &mut Parser) -> bool {
    let n = if p.at(TokenKind::VarId) {
        1
    } else if names::nth_at_paren_op(p, 0, VAR_SYMS) {
        3
    } else {
        return false;
    };
    match p.nth(n) {
        TokenKind::Equals | TokenKind::Pipe => true,
        TokenKind::Bang => p.nth_is_adjacent(n + 1) && !p.nth_is_adjacent(n),
        kind => pattern::APAT_START.contains(kind),
    }
}

fn fun_or_pat_decl(p: &mut Parser) {
    let prefix = at_prefix_lhs(p);
    if !prefix && !pattern::at_pattern(p) {
        p.error_expected("declaration");
        return;
    }
    let m = p.start();
    if prefix {
        let lhs = p.start();
        names::qvar(p);
        while pattern::at_apat(p) {
            pattern::apat(p);
        }
        lhs.end(p, SyntaxKind::FunLhs);
    } else if let Some(first) = pattern::pattern(p) {
        if names::at_qop(p) && !names::at_qconop(p) {
            let lhs = first.precede(p);
            names::qop(p);
            pattern::pattern(p);
            lhs.end(p, SyntaxKind::FunLhs);
        }
    }
    rhs(p, TokenKind::Equals);
    m.end(p, SyntaxKind::FunOrPatDecl);
}

/// `= e` or guarded alternatives, then an optional `where`. Case
/// alternatives use `->` as the separator.
pub(super) fn rhs(p: &mut Parser, separator: TokenKind) {
    let m = p.start();
    if p.at(TokenKind::Pipe) {
        while p.at(TokenKind::Pipe) {
            guarded_rhs(p, separator);
        }
    } else if p.expect(separator) {
        expr::exp(p);
    }
    if p.at(TokenKind::WhereKw) {
        let w = p.start();
        p.bump();
        decl_block(p);
        w.end(p, SyntaxKind::WhereClause);
    }
    m.end(p, SyntaxKind::Rhs);
}

fn guarded_rhs(p: &mut Parser, separator: TokenKind) {
    let m = p.start();
    p.bump();
    expr::stmt(p);
    while p.eat(TokenKind::Comma) {
        expr::stmt(p);
    }
    if p.expect(separator) {
        expr::exp(p);
    }
    m.end(p, SyntaxKind::GuardedRhs);
}

/// `data`/`newtype`, including families, instances and GADT syntax.
fn data_decl(p: &mut Parser, kind: SyntaxKind) {
    let m = p.start();
    p.bump();
    if p.at_word("family") {
        p.bump();
    }
    p.eat(TokenKind::InstanceKw);
    types::ctype(p);
    if p.eat(TokenKind::DoubleColon) {
        types::ctype(p);
    }
    if p.eat(TokenKind::Equals) {
        constr(p);
        while p.eat(TokenKind::Pipe) {
            constr(p);
        }
    } else if p.eat(TokenKind::WhereKw) {
        block(p, SyntaxKind::DeclBlock, gadt_constr, "constructor", true);
    }
    while p.at(TokenKind::DerivingKw) {
        deriving(p);
    }
    m.end(p, kind);
}

fn constr(p: &mut Parser) {
    let m = p.start();
    if p.at(TokenKind::ForallKw) {
        p.bump();
        while p.at(TokenKind::VarId) || p.at(TokenKind::LParen) || p.at(TokenKind::LBrace) {
            types::tv_bndr(p);
        }
        p.expect(TokenKind::Dot);
    }
    if types::at_context(p) {
        let c = p.start();
        types::infix_type(p);
        c.end(p, SyntaxKind::Context);
        p.expect(TokenKind::FatArrow);
    }

    if at_infix_constr(p) {
        constr_operand(p);
        if names::at_qconop(p) {
            names::qop(p);
        } else {
            p.error_expected("constructor operator");
        }
        constr_operand(p);
    } else {
        names::qcon(p);
        if p.at(TokenKind::LBrace) {
            record_fields(p);
        } else {
            while p.at(TokenKind::Pragma) || types::at_atype(p) {
                if p.at(TokenKind::Pragma) {
                    names::pragma(p);
                } else {
                    types::atype(p);
                }
            }
        }
    }
    m.end(p, SyntaxKind::Constr);
}

/// `a :| [a]`, ``Int `Pair` Int``, `!Int :*: !Int`
fn at_infix_constr(p: &mut Parser) -> bool {
    if p.at_in(CON_IDS) {
        return matches!(
            p.nth(1),
            TokenKind::ConSym | TokenKind::QConSym | TokenKind::Backtick
        );
    }
    if names::nth_at_paren_op(p, 0, CON_SYMS) || names::at_special_con(p) {
        return false;
    }
    types::at_atype(p)
}

fn constr_operand(p: &mut Parser) {
    if p.at(TokenKind::Pragma) {
        names::pragma(p);
    }
    if p.at(TokenKind::Bang) || p.at(TokenKind::Tilde) {
        types::atype(p);
    } else {
        types::btype(p);
    }
}

fn record_fields(p: &mut Parser) {
    let m = p.start();
    p.bump();
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        let field = p.start();
        names::qvar(p);
        while p.eat(TokenKind::Comma) {
            names::qvar(p);
        }
        p.expect(TokenKind::DoubleColon);
        if p.at(TokenKind::Pragma) {
            names::pragma(p);
        }
        types::ctype(p);
        field.end(p, SyntaxKind::FieldDecl);
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::RBrace);
    m.end(p, SyntaxKind::RecordFields);
}

fn gadt_constr(p: &mut Parser) {
    if p.at(TokenKind::Pragma) {
        names::pragma(p);
        return;
    }
    let m = p.start();
    names::qcon(p);
    while p.eat(TokenKind::Comma) {
        names::qcon(p);
    }
    p.expect(TokenKind::DoubleColon);
    types::ctype(p);
    m.end(p, SyntaxKind::GadtConstr);
}

fn deriving_strategy(p: &mut Parser) {
    if p.at_word("stock") || p.at_word("anyclass") || p.at(TokenKind::NewtypeKw) {
        p.bump();
    }
}

/// `deriving stock (Eq, Show)`, `deriving newtype Num`,
/// `deriving (Semigroup) via (Sum Int)`
fn deriving(p: &mut Parser) {
    let m = p.start();
    p.bump();
    deriving_strategy(p);
    if p.eat(TokenKind::LParen) {
        if !p.at(TokenKind::RParen) {
            types::type_(p);
            while p.eat(TokenKind::Comma) {
                types::type_(p);
            }
        }
        p.expect(TokenKind::RParen);
    } else {
        types::atype(p);
    }
    if p.at_word("via") {
        p.bump();
        types::ctype(p);
    }
    m.end(p, SyntaxKind::Deriving);
}

/// Synonyms, open and closed families, and family instances.
fn type_decl(p: &mut Parser) {
    let m = p.start();
    p.bump();
    let family = p.at_word("family");
    if family {
        p.bump();
    }
    p.eat(TokenKind::InstanceKw);
    types::ctype(p);
    if p.eat(TokenKind::DoubleColon) {
        types::ctype(p);
    }
    if p.eat(TokenKind::Equals) {
        types::ctype(p);
    } else if family && p.eat(TokenKind::WhereKw) {
        block(p, SyntaxKind::DeclBlock, type_eqn, "type family equation", true);
    }
    m.end(p, SyntaxKind::TypeDecl);
}

fn type_eqn(p: &mut Parser) {
    let m = p.start();
    types::ctype(p);
    p.expect(TokenKind::Equals);
    types::ctype(p);
    m.end(p, SyntaxKind::TypeEqn);
}

fn class_decl(p: &mut Parser) {
    let m = p.start();
    p.bump();
    types::ctype(p);
    if p.at(TokenKind::Pipe) {
        let deps = p.start();
        p.bump();
        loop {
            fun_dep(p);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
        deps.end(p, SyntaxKind::FunDeps);
    }
    if p.eat(TokenKind::WhereKw) {
        decl_block(p);
    }
    m.end(p, SyntaxKind::ClassDecl);
}

/// `a b -> c`
fn fun_dep(p: &mut Parser) {
    let m = p.start();
    while p.at(TokenKind::VarId) {
        names::ty_var(p);
    }
    p.expect(TokenKind::RightArrow);
    while p.at(TokenKind::VarId) {
        names::ty_var(p);
    }
    m.end(p, SyntaxKind::FunDep);
}

fn instance_decl(p: &mut Parser) {
    let m = p.start();
    p.bump();
    if p.at(TokenKind::Pragma) {
        names::pragma(p);
    }
    types::ctype(p);
    if p.eat(TokenKind::WhereKw) {
        decl_block(p);
    }
    m.end(p, SyntaxKind::InstanceDecl);
}

/// `deriving stock instance Show T`
fn deriving_decl(p: &mut Parser) {
    let m = p.start();
    p.bump();
    deriving_strategy(p);
    p.expect(TokenKind::InstanceKw);
    types::ctype(p);
    m.end(p, SyntaxKind::DerivingDecl);
}

/// `default (Integer, Double)`
fn default_decl(p: &mut Parser) {
    let m = p.start();
    p.bump();
    p.bump();
    if !p.at(TokenKind::RParen) {
        types::type_(p);
        while p.eat(TokenKind::Comma) {
            types::type_(p);
        }
    }
    p.expect(TokenKind::RParen);
    m.end(p, SyntaxKind::DefaultDecl);
}

/// `foreign import ccall unsafe "math.h sin" c_sin :: Double -> Double`
fn foreign_decl(p: &mut Parser) {
    let m = p.start();
    p.bump();
    if p.at(TokenKind::ImportKw) || p.at_word("export") {
        p.bump();
    } else {
        p.error_expected("`import` or `export`");
    }
    p.expect(TokenKind::VarId);
    let safety = p.at_word("safe") || p.at_word("unsafe") || p.at_word("interruptible");
    if safety && p.nth(1) != TokenKind::DoubleColon {
        p.bump();
    }
    p.eat(TokenKind::String);
    names::qvar(p);
    p.expect(TokenKind::DoubleColon);
    types::ctype(p);
    m.end(p, SyntaxKind::ForeignDecl);
}

/// `infixr 5 +++, `cons``
fn fixity_decl(p: &mut Parser) {
    let m = p.start();
    p.bump();
    p.eat(TokenKind::Integer);
    loop {
        if names::at_qop(p) {
            names::qop(p);
        } else {
            p.error_expected("operator");
            break;
        }
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    m.end(p, SyntaxKind::FixityDecl);
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse_with, EntryPoint, ParseOptions};

    fn decl_tree(source: &str) -> String {
        let options = ParseOptions {
            entry_point: EntryPoint::Declaration,
            ..ParseOptions::default()
        };
        let parse = parse_with(source, &options).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        parse.tree().debug_tree(false)
    }

    #[test]
    fn test_type_signature_with_several_names() {
        let tree = decl_tree("f, (<+>) :: a -> a");
        assert!(tree.contains("TypeSig@0..18"));
        assert_eq!(tree.matches("QVar@").count(), 2);
        assert!(tree.contains("FunType@12..18"));
    }

    #[test]
    fn test_infix_function_definition() {
        let tree = decl_tree("x <+> y = x");
        assert!(tree.contains("FunLhs@0..7"));
        assert!(tree.contains("QVarOp@2..5"));
    }

    #[test]
    fn test_operator_bang_is_not_a_bang_pattern() {
        let tree = decl_tree("arr ! i = arr");
        assert!(tree.contains("QVarOp@4..5"));
        assert!(!tree.contains("BangPat"));
        let tree = decl_tree("f !x = x");
        assert!(tree.contains("BangPat@2..4"));
    }

    #[test]
    fn test_data_with_records_and_deriving() {
        let tree = decl_tree("data P = P { px, py :: !Int } | Q Int deriving (Eq, Show)");
        assert!(tree.contains("RecordFields@11..29"));
        assert!(tree.contains("FieldDecl@13..27"));
        assert!(tree.contains("BangType@23..27"));
        assert_eq!(tree.matches("Constr@").count(), 2);
        assert!(tree.contains("Deriving@38..57"));
    }

    #[test]
    fn test_infix_constructor() {
        let tree = decl_tree("data NonEmpty a = a :| [a]");
        assert!(tree.contains("QConOp@20..22"));
        assert!(tree.contains("ListType@23..26"));
    }

    #[test]
    fn test_class_with_fundeps() {
        let tree = decl_tree("class Monad m => MonadState s m | m -> s where\n  get :: m s");
        assert!(tree.contains("FunDeps@32..40"));
        assert!(tree.contains("Context@6..13"));
        assert!(tree.contains("TypeSig@49..59"));
    }

    #[test]
    fn test_guards_and_where() {
        let tree = decl_tree("abs' n\n  | n < 0 = negate n\n  | otherwise = n\n  where z = 0");
        assert_eq!(tree.matches("GuardedRhs@").count(), 2);
        assert!(tree.contains("WhereClause@"));
    }

    #[test]
    fn test_closed_type_family() {
        let tree = decl_tree("type family F a where\n  F Int = Bool\n  F a = ()");
        assert_eq!(tree.matches("TypeEqn@").count(), 2);
    }

    #[test]
    fn test_foreign_import() {
        let tree = decl_tree("foreign import ccall unsafe \"sin\" c_sin :: Double -> Double");
        assert!(tree.contains("ForeignDecl@0..59"));
    }
}
