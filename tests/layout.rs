//! Layout-sensitive parsing, end to end.
//!
//! These go through the public API only: source text in, tree and
//! diagnostics out.

use hask_syntax::cst::nodes::{
    AstNode, BlockBraces, DoExp, InfixElement, InfixExp, LetExp, QVarOp, StmtBlock,
};
use hask_syntax::{parse, parse_with, EntryPoint, Parse, ParseOptions, SyntaxKind, SyntaxNode};

// ===== Helpers =====

fn parse_expr(source: &str) -> Parse {
    let options = ParseOptions {
        entry_point: EntryPoint::Expression,
        ..ParseOptions::default()
    };
    let parse = parse_with(source, &options).expect("internal parser error");
    assert_eq!(parse.tree().leaf_text(), source);
    parse
}

fn parse_module(source: &str) -> Parse {
    let parse = parse(source).expect("internal parser error");
    assert_eq!(parse.tree().leaf_text(), source);
    parse
}

/// Node kinds and significant token texts in preorder, without spans and
/// without braces, so explicit and implicit layout compare equal.
fn shape(node: SyntaxNode<'_>) -> Vec<String> {
    let mut out = Vec::new();
    for n in node.descendants() {
        out.push(format!("{:?}", n.kind()));
        for token in n.child_tokens() {
            if token.is_trivia() || token.is_virtual() {
                continue;
            }
            if matches!(token.text(), "{" | "}" | ";") {
                continue;
            }
            out.push(token.text().to_string());
        }
    }
    out
}

fn body_items(parse: &Parse) -> Vec<SyntaxNode<'_>> {
    parse
        .tree()
        .root()
        .child_of_kind(SyntaxKind::ModuleBody)
        .expect("module body")
        .child_nodes()
        .collect()
}

// ===== Explicit versus implicit layout =====

#[test]
fn explicit_and_implicit_do_blocks_agree() {
    let explicit = parse_expr("do { putStrLn \"a\" }");
    let implicit = parse_expr("do\n  putStrLn \"a\"");
    assert!(!explicit.has_errors(), "{:?}", explicit.diagnostics());
    assert!(!implicit.has_errors(), "{:?}", implicit.diagnostics());
    assert_eq!(shape(explicit.tree().root()), shape(implicit.tree().root()));

    let braces = |parse: &Parse| {
        let tree = parse.tree();
        let block = tree.root().descendants().find_map(StmtBlock::cast).unwrap();
        block.braces()
    };
    assert_eq!(braces(&explicit), BlockBraces::Explicit);
    assert_eq!(braces(&implicit), BlockBraces::Virtual);
}

#[test]
fn explicit_and_implicit_modules_agree() {
    let explicit = parse_module("module M where { f = 1; g x = case x of { A -> 1; B -> 2 } }");
    let implicit = parse_module("module M where\nf = 1\ng x = case x of\n  A -> 1\n  B -> 2\n");
    assert!(!explicit.has_errors(), "{:?}", explicit.diagnostics());
    assert!(!implicit.has_errors(), "{:?}", implicit.diagnostics());
    assert_eq!(shape(explicit.tree().root()), shape(implicit.tree().root()));
}

#[test]
fn explicit_let_braces_are_reported() {
    let parse = parse_expr("let { x = 1; y = 2 } in x + y");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let let_exp = tree.root().descendants().find_map(LetExp::cast).unwrap();
    assert_eq!(let_exp.braces(), Some(BlockBraces::Explicit));
    assert_eq!(let_exp.decls().unwrap().decls().count(), 2);
}

// ===== Offside rule =====

#[test]
fn dedent_closes_let_inside_do() {
    let parse = parse_expr("do\n  let x = 1\n      y = 2\n  pure x");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let do_exp = tree.root().descendants().find_map(DoExp::cast).unwrap();
    let stmts: Vec<_> = do_exp.stmts().unwrap().stmts().collect();
    assert_eq!(stmts.len(), 2);
    assert_eq!(stmts[0].kind(), SyntaxKind::LetStmt);
    assert_eq!(stmts[1].kind(), SyntaxKind::ExpStmt);

    let bindings = stmts[0]
        .syntax()
        .child_of_kind(SyntaxKind::DeclBlock)
        .unwrap()
        .child_nodes()
        .filter(|n| n.kind() == SyntaxKind::FunOrPatDecl)
        .count();
    assert_eq!(bindings, 2);
}

#[test]
fn dedent_to_top_level_starts_a_sibling() {
    let parse = parse_module("f = let x = 1\n        y = 2\n    in x + y\ng = 3\n");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let items = body_items(&parse);
    assert_eq!(items.len(), 2);
    assert!(items[0].text().starts_with("f = let"));
    assert!(items[1].text().starts_with("g = 3"));
}

#[test]
fn where_clause_after_guards() {
    let source = "\
sign n
  | n < 0 = neg
  | otherwise = pos
  where
    neg = -1
    pos = 1
main = print (sign 3)
";
    let parse = parse_module(source);
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let items = body_items(&parse);
    assert_eq!(items.len(), 2);
    let where_block = items[0]
        .descendants()
        .find(|n| n.kind() == SyntaxKind::WhereClause)
        .and_then(|w| w.child_of_kind(SyntaxKind::DeclBlock))
        .unwrap();
    assert_eq!(where_block.child_nodes().count(), 2);
}

#[test]
fn if_then_else_aligned_in_do() {
    let parse = parse_expr("do\n  if c\n  then a\n  else b\n  done");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let block = tree.root().descendants().find_map(StmtBlock::cast).unwrap();
    assert_eq!(block.stmts().count(), 2);
    assert!(tree
        .root()
        .descendants()
        .any(|n| n.kind() == SyntaxKind::IfExp));
}

// ===== parse-error(t) =====

#[test]
fn in_closes_an_implicit_let_block() {
    let parse = parse_expr("let y = 1 in y");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let let_exp = tree.root().descendants().find_map(LetExp::cast).unwrap();
    assert_eq!(let_exp.braces(), Some(BlockBraces::Virtual));
    assert_eq!(let_exp.body().unwrap().text(), "y");
}

#[test]
fn closing_paren_closes_an_implicit_case_block() {
    let parse = parse_expr("(case x of Just y -> y)");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let root = parse.tree().root();
    let paren = root.child_nodes().next().unwrap();
    assert_eq!(paren.kind(), SyntaxKind::ParenExp);
    assert_eq!(
        paren.child_nodes().next().map(|n| n.kind()),
        Some(SyntaxKind::CaseExp)
    );
}

#[test]
fn else_closes_a_do_block_inside_explicit_braces() {
    let parse = parse_expr("do { a; if c then do b else d }");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let outer = tree.root().descendants().find_map(DoExp::cast).unwrap();
    assert_eq!(outer.stmts().unwrap().stmts().count(), 2);
}

#[test]
fn in_closes_a_let_block_before_its_first_binding() {
    let parse = parse_module("f = let in 1\n");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let let_exp = tree.root().descendants().find_map(LetExp::cast).unwrap();
    assert_eq!(let_exp.braces(), Some(BlockBraces::Virtual));
    assert_eq!(let_exp.body().unwrap().text(), "1");
}

#[test]
fn blocks_closed_before_their_first_item_keep_the_text() {
    let parse = parse_expr("( do )");
    assert!(parse.tree().root().descendants().any(|n| n.kind() == SyntaxKind::DoExp));
    assert!(parse_expr("do in").has_errors());
    assert!(parse_expr("case x of in").has_errors());
    assert!(parse_module("x x = where\n  in ").has_errors());
}

#[test]
fn let_statements_nest_without_reparsing() {
    let mut source = String::from("a0");
    for depth in 1..=25 {
        source = format!("do {{ let {{ a{depth} = {source} }} in a{depth} }}");
    }
    let parse = parse_module(&format!("f = {source}\n"));
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let lets = parse
        .tree()
        .root()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::LetExp)
        .count();
    assert_eq!(lets, 25);
}

// ===== Error recovery =====

#[test]
fn single_fault_stays_local() {
    let valid = "module M where\nf = 1\ng = 2\nh = 3\n";
    let faulty = "module M where\nf = 1\ng = 2 ) 3\nh = 3\n";
    let good = parse_module(valid);
    let bad = parse_module(faulty);
    assert!(!good.has_errors());
    assert_eq!(bad.diagnostics().len(), 1);

    let errors: Vec<_> = bad
        .tree()
        .root()
        .descendants()
        .filter(|n| n.is_error())
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text(), ") 3");

    let good_items = body_items(&good);
    let bad_items: Vec<_> = body_items(&bad)
        .into_iter()
        .filter(|n| !n.is_error())
        .collect();
    assert_eq!(good_items.len(), bad_items.len());
    for (before, after) in good_items.iter().zip(&bad_items) {
        assert_eq!(shape(*before), shape(*after));
    }
}

#[test]
fn unlexable_character_becomes_an_error_node() {
    let parse = parse_module("f = 1\ng = 2 \u{1}\nh = 3\n");
    assert_eq!(body_items(&parse).iter().filter(|n| !n.is_error()).count(), 3);
    assert!(parse.has_errors());
    assert!(parse
        .tree()
        .root()
        .descendants()
        .any(|n| n.is_error() && n.text() == "\u{1}"));
}

#[test]
fn stray_operator_is_one_error() {
    let parse = parse_module("module M where\nf = 1\ng = 2 + + 3\nh = 3\n");
    assert_eq!(parse.diagnostics().len(), 1);
    let errors: Vec<_> = parse
        .tree()
        .root()
        .descendants()
        .filter(|n| n.is_error())
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].text(), "+ 3");
    assert_eq!(body_items(&parse).iter().filter(|n| !n.is_error()).count(), 3);
}

#[test]
fn lambda_without_patterns_is_reported() {
    let source = "module M where\nf = 1\ng = \\ -> 1\nh = 3\n";
    let parse = parse_module(source);
    assert_eq!(parse.diagnostics().len(), 1);
    assert_eq!(parse.diagnostics()[0].span.text(source), "->");
    assert_eq!(body_items(&parse).len(), 3);
}

// ===== Operators =====

#[test]
fn qualified_symbolic_operator() {
    let parse = parse_expr("m Data.Map.! k");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let chain = tree.root().descendants().find_map(InfixExp::cast).unwrap();
    let op = chain.operators().next().unwrap();
    assert_eq!(op.qualifier(), Some("Data.Map"));
    assert_eq!(op.name(), Some("!"));
    assert!(!op.is_backtick());

    let var_op = op.to::<QVarOp>().unwrap();
    let sym = var_op.sym().unwrap();
    assert_eq!(sym.qualifier(), Some("Data.Map"));
    assert_eq!(sym.symbol(), "!");
}

#[test]
fn backtick_operator() {
    let parse = parse_expr("x `elem` xs");
    assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
    let tree = parse.tree();
    let chain = tree.root().descendants().find_map(InfixExp::cast).unwrap();
    let elements: Vec<_> = chain.elements().collect();
    assert_eq!(elements.len(), 3);
    let InfixElement::Operator(op) = elements[1] else {
        panic!("expected an operator, got {:?}", elements[1]);
    };
    let var_op = op.to::<QVarOp>().unwrap();
    assert!(var_op.is_backtick());
    assert_eq!(var_op.id().unwrap().name(), "elem");
    assert_eq!(op.qualifier(), None);
}

#[test]
fn operators_stay_flat_until_resolved() {
    let parse = parse_expr("a + b * c - d");
    let tree = parse.tree();
    let chains = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == SyntaxKind::InfixExp)
        .count();
    assert_eq!(chains, 1);

    let resolution = parse.resolve_fixities();
    assert!(resolution.diagnostics.is_empty());
    assert_eq!(resolution.chains.len(), 1);
    assert_eq!(resolution.chains[0].1.to_string(), "((a + (b * c)) - d)");
}
