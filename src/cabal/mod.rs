//! Cabal package descriptions.
//!
//! Produces the same [`Parse`] as the Haskell parser, rooted at a
//! `CabalFile` node, so highlighting and navigation work unchanged.

pub mod lexer;
mod parser;

use crate::diagnostics::ParseError;
use crate::lexer::Token;
use crate::parser::{build, Parse};

use self::parser::CabalParser;

/// Parse a `.cabal` file.
pub fn parse(source: &str) -> Result<Parse, ParseError> {
    let raw = lexer::lex(source);
    let significant: Vec<Token> = raw
        .iter()
        .copied()
        .filter(|token| !token.is_layout_transparent())
        .collect();
    let events = CabalParser::new(&significant).parse();
    let (tree, diagnostics) = build(source, &raw, events)?;
    log::debug!(
        "parsed cabal file: {} nodes, {} diagnostics",
        tree.node_count(),
        diagnostics.len()
    );
    Ok(Parse::new(tree, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::nodes::{AstNode, CabalConditional, CabalFile, CabalSection};
    use crate::cst::{missing_children, SyntaxKind};
    use crate::diagnostics::DiagnosticKind;

    const PACKAGE: &str = "\
cabal-version: 3.0
name:          hask-syntax
version:       0.1.0
-- the library
library
  exposed-modules:
    HaskSyntax
    HaskSyntax.Lexer
  build-depends: base >=4.14 && <5,
                 text
  if flag(dev)
    ghc-options: -O0
  else
    ghc-options: -O2

executable hask-syntax
  main-is: Main.hs
";

    #[test]
    fn test_package_structure() {
        let parse = parse(PACKAGE).unwrap();
        assert!(!parse.has_errors(), "{:?}", parse.diagnostics());
        let tree = parse.tree();
        assert_eq!(tree.leaf_text(), PACKAGE);
        assert!(missing_children(tree.root()).is_empty());

        let file = CabalFile::cast(tree.root()).unwrap();
        let names: Vec<_> = file.fields().filter_map(|f| f.name_text()).collect();
        assert_eq!(names, vec!["cabal-version", "name", "version"]);

        let sections: Vec<CabalSection> = file.sections().collect();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name(), None);
        assert_eq!(sections[1].name(), Some("hask-syntax"));

        let library = sections[0].block().unwrap();
        let fields: Vec<_> = library.fields().collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value_text(), "HaskSyntax HaskSyntax.Lexer");
        assert_eq!(fields[1].value_text(), "base >= 4.14 && < 5 , text");
    }

    #[test]
    fn test_conditional_with_else() {
        let parse = parse(PACKAGE).unwrap();
        let conditional = parse
            .tree()
            .root()
            .descendants()
            .find_map(CabalConditional::cast)
            .unwrap();
        assert_eq!(conditional.condition().unwrap().syntax().text(), "flag(dev)");
        let else_branch = conditional.else_branch().unwrap();
        let field = else_branch.block().unwrap().fields().next().unwrap();
        assert_eq!(field.value_text(), "-O2");
    }

    #[test]
    fn test_unexpected_line_is_local() {
        let source = "name: x\nwhat is this\n  still this\nversion: 1\n";
        let parse = parse(source).unwrap();
        assert_eq!(parse.tree().leaf_text(), source);
        assert_eq!(parse.diagnostics().len(), 1);
        assert_eq!(parse.diagnostics()[0].kind, DiagnosticKind::Syntax);
        let root = parse.tree().root();
        let kinds: Vec<_> = root.child_nodes().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![SyntaxKind::CabalField, SyntaxKind::Error, SyntaxKind::CabalField]
        );
    }

    #[test]
    fn test_empty_file() {
        let parse = parse("").unwrap();
        assert!(!parse.has_errors());
        assert_eq!(parse.tree().root().kind(), SyntaxKind::CabalFile);
    }
}
