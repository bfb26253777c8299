use super::names::{self, CON_IDS, CON_SYMS};
use super::{block, decl, Parser};
use crate::cst::SyntaxKind;
use crate::diagnostics::DiagnosticKind;
use crate::lexer::TokenKind;

/// `{-# LANGUAGE .. #-} module M (exports) where { body }`
pub(super) fn module(p: &mut Parser) {
    let m = p.start();
    while p.at(TokenKind::Pragma) {
        names::pragma(p);
    }
    if p.at(TokenKind::ModuleKw) {
        module_header(p);
    }
    block(p, SyntaxKind::ModuleBody, body_item, "declaration", false);
    if !p.at_eof() {
        let found = p.nth(0);
        p.abandon_rest(
            DiagnosticKind::Syntax,
            &format!("unexpected {} after the module body", found),
        );
    }
    m.end(p, SyntaxKind::Module);
}

fn module_header(p: &mut Parser) {
    let m = p.start();
    p.bump();
    names::module_name(p);
    if p.at(TokenKind::Pragma) {
        names::pragma(p);
    }
    if p.at(TokenKind::LParen) {
        item_list(p, SyntaxKind::ExportList, SyntaxKind::Export, "export");
    }
    p.expect(TokenKind::WhereKw);
    m.end(p, SyntaxKind::ModuleHeader);
}

fn body_item(p: &mut Parser) {
    if p.at(TokenKind::ImportKw) {
        import_decl(p);
    } else {
        decl::decl(p);
    }
}

/// `import {-# SOURCE #-} qualified "pkg" M as N hiding (x, T(..))`
pub(crate) fn import_decl(p: &mut Parser) {
    let m = p.start();
    p.expect(TokenKind::ImportKw);
    if p.at(TokenKind::Pragma) {
        names::pragma(p);
    }
    if p.at_word("safe") {
        p.bump();
    }
    if p.at_word("qualified") {
        p.bump();
    }
    p.eat(TokenKind::String);
    names::module_name(p);
    if p.at_word("qualified") {
        p.bump();
    }
    if p.at_word("as") {
        p.bump();
        names::module_name(p);
    }
    if p.at_word("hiding") {
        p.bump();
    }
    if p.at(TokenKind::LParen) {
        item_list(p, SyntaxKind::ImportList, SyntaxKind::ImportItem, "import item");
    }
    m.end(p, SyntaxKind::ImportDecl);
}

/// Export list or import list: `( item, item, )`.
fn item_list(p: &mut Parser, kind: SyntaxKind, item_kind: SyntaxKind, what: &str) {
    let m = p.start();
    p.bump();
    while !p.at(TokenKind::RParen) && !p.at_eof() {
        if p.eat(TokenKind::Comma) {
            continue;
        }
        if !item(p, item_kind) {
            let found = p.nth(0);
            p.error_recover(format!("expected {}, found {}", what, found));
        }
    }
    p.expect(TokenKind::RParen);
    m.end(p, kind);
}

fn at_con_name(p: &mut Parser) -> bool {
    p.at_in(CON_IDS) || names::nth_at_paren_op(p, 0, CON_SYMS)
}

/// `x`, `(<+>)`, `T`, `T(..)`, `C(m, n)`, `type (+)`, `pattern P`,
/// `module M`.
fn item(p: &mut Parser, kind: SyntaxKind) -> bool {
    let namespace = p.at(TokenKind::TypeKw)
        || (p.at_word("pattern") && (CON_IDS.contains(p.nth(1)) || p.nth(1) == TokenKind::LParen));
    let module = kind == SyntaxKind::Export && p.at(TokenKind::ModuleKw);
    if !namespace && !module && !names::at_qvar(p) && !at_con_name(p) {
        return false;
    }
    let m = p.start();
    if module {
        p.bump();
        names::module_name(p);
        m.end(p, kind);
        return true;
    }
    if namespace {
        p.bump();
    }
    if names::at_qvar(p) {
        names::qvar(p);
    } else {
        names::qcon(p);
        if p.at(TokenKind::LParen) {
            member_list(p);
        }
    }
    m.end(p, kind);
    true
}

/// `(..)` or `(field, Con)` after a type or class.
fn member_list(p: &mut Parser) {
    let m = p.start();
    p.bump();
    while !p.at(TokenKind::RParen) && !p.at_eof() {
        if p.eat(TokenKind::DotDot) {
        } else if names::at_qvar(p) {
            names::qvar(p);
        } else if at_con_name(p) {
            names::qcon(p);
        } else {
            p.error_expected("member name");
            break;
        }
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.expect(TokenKind::RParen);
    m.end(p, SyntaxKind::MemberList);
}

#[cfg(test)]
mod tests {
    use crate::cst::nodes::{AstNode, ImportDecl};
    use crate::parser::{parse_with, EntryPoint, ParseOptions};

    #[test]
    fn test_import_with_everything() {
        let options = ParseOptions {
            entry_point: EntryPoint::Import,
            ..ParseOptions::default()
        };
        let source = "import qualified Data.Map.Strict as M hiding (Map, lookup, (!))";
        let parse = parse_with(source, &options).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        let tree = parse.tree();
        let import = tree
            .root()
            .descendants()
            .find_map(ImportDecl::cast)
            .unwrap();
        assert!(import.is_qualified());
        assert!(import.is_hiding());
        assert_eq!(import.module_name().unwrap().text(), "Data.Map.Strict");
        assert_eq!(import.alias().unwrap().text(), "M");
        assert_eq!(import.import_list().unwrap().items().count(), 3);
    }

    #[test]
    fn test_export_list_forms() {
        let source = "module M (module X, T(..), C(m), f, (<+>), type (++), pattern P) where\n";
        let parse = crate::parse(source).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        let tree = parse.tree().debug_tree(false);
        assert_eq!(tree.matches("Export@").count(), 7);
        assert_eq!(tree.matches("MemberList@").count(), 2);
    }
}
