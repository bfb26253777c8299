//! Snapshot tests using insta.
//!
//! These capture tree dumps, highlight tags and resolved operator chains,
//! so changes to output format are caught and reviewed explicitly.

use hask_syntax::highlight::highlight;
use hask_syntax::{parse, parse_with, EntryPoint, Parse, ParseOptions};

// ===== Helpers =====

fn parse_expr(source: &str) -> Parse {
    let options = ParseOptions {
        entry_point: EntryPoint::Expression,
        ..ParseOptions::default()
    };
    parse_with(source, &options).expect("internal parser error")
}

fn format_tree(parse: &Parse) -> String {
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    parse.tree().debug_tree(false).trim_end().to_string()
}

fn format_chains(parse: &Parse) -> String {
    let resolution = parse.resolve_fixities();
    let mut lines: Vec<String> = resolution
        .chains
        .iter()
        .map(|(_, tree)| tree.to_string())
        .collect();
    lines.extend(resolution.diagnostics.iter().map(|d| d.to_string()));
    lines.join("\n")
}

fn format_highlights(source: &str) -> String {
    let parse = parse(source).expect("internal parser error");
    highlight(parse.tree())
        .iter()
        .map(|h| format!("{:?} {:?}", h.tag, h.span.text(source)))
        .collect::<Vec<_>>()
        .join("\n")
}

// ===== Trees =====

#[test]
fn snap_tree_application() {
    insta::assert_snapshot!(format_tree(&parse_expr("f x")), @r#"
    Fragment@0..3
      AppExp@0..3
        QVar@0..1
          QVarId@0..1
            VarId@0..1 "f"
        QVar@2..3
          QVarId@2..3
            VarId@2..3 "x"
    "#);
}

#[test]
fn snap_tree_flat_operator_chain() {
    insta::assert_snapshot!(format_tree(&parse_expr("1 + 2")), @r#"
    Fragment@0..5
      InfixExp@0..5
        Literal@0..1
          Integer@0..1 "1"
        QVarOp@2..3
          QVarSym@2..3
            VarSym@2..3 "+"
        Literal@4..5
          Integer@4..5 "2"
    "#);
}

#[test]
fn snap_tree_module_with_virtual_braces() {
    let parse = parse("module M where\nx = 1\n").unwrap();
    insta::assert_snapshot!(format_tree(&parse), @r#"
    Module@0..21
      ModuleHeader@0..14
        ModuleKw@0..6 "module"
        ModuleName@7..8
          ConId@7..8 "M"
        WhereKw@9..14 "where"
      ModuleBody@15..20
        VLBrace@15..15
        FunOrPatDecl@15..20
          FunLhs@15..16
            QVar@15..16
              QVarId@15..16
                VarId@15..16 "x"
          Rhs@17..20
            Equals@17..18 "="
            Literal@19..20
              Integer@19..20 "1"
        VRBrace@20..20
    "#);
}

// ===== Highlighting =====

#[test]
fn snap_highlight_signature_and_binding() {
    insta::assert_snapshot!(format_highlights("f :: Int\nf = 1\n"), @r#"
    Function "f"
    ReservedOperator "::"
    Type "Int"
    Function "f"
    ReservedOperator "="
    Number "1"
    "#);
}

// ===== Fixity resolution =====

#[test]
fn snap_fixity_mixed_precedence() {
    insta::assert_snapshot!(format_chains(&parse_expr("1 + 2 * 3 - 4")), @"((1 + (2 * 3)) - 4)");
}

#[test]
fn snap_fixity_right_associative() {
    insta::assert_snapshot!(format_chains(&parse_expr("xs ++ ys ++ zs")), @"(xs ++ (ys ++ zs))");
}

#[test]
fn snap_fixity_same_precedence_left() {
    insta::assert_snapshot!(format_chains(&parse_expr("f <$> g <*> x")), @"((f <$> g) <*> x)");
}

#[test]
fn snap_fixity_negation() {
    insta::assert_snapshot!(format_chains(&parse_expr("- x ^ 2")), @"(-(x ^ 2))");
}

#[test]
fn snap_fixity_backtick_operator() {
    insta::assert_snapshot!(format_chains(&parse_expr("x `div` y + 1")), @"((x `div` y) + 1)");
}

#[test]
fn snap_fixity_local_declaration() {
    let parse = parse("infixr 5 +++\nx = a +++ b +++ c\n").unwrap();
    insta::assert_snapshot!(format_chains(&parse), @"(a +++ (b +++ c))");
}

#[test]
fn snap_fixity_non_associative_conflict() {
    insta::assert_snapshot!(
        format_chains(&parse_expr("a == b == c")),
        @"error at 7..9: cannot mix `==` [infix 4] and `==` [infix 4] in the same infix expression"
    );
}
