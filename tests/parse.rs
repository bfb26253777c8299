//! Fixture-based integration tests.
//!
//! Parses every Haskell and Cabal file under tests/fixtures/ and checks the
//! guarantees that must hold for any input: the tree reproduces the source
//! byte for byte, and well-formed files produce no diagnostics.

use std::path::{Path, PathBuf};

use hask_syntax::cst::missing_children;
use hask_syntax::cst::nodes::{AstNode, Module, TypeSig};
use hask_syntax::{cabal, parse, SyntaxKind};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn collect_files(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_files(&path, extension, files);
            } else if path.extension().is_some_and(|e| e == extension) {
                files.push(path);
            }
        }
    }
    files.sort();
}

/// Fixtures named `Broken*` contain deliberate syntax errors.
fn is_broken(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("Broken"))
}

#[test]
fn parse_fixture_haskell_modules() {
    let mut files = Vec::new();
    collect_files(&fixtures_dir(), "hs", &mut files);
    assert!(!files.is_empty(), "Expected Haskell fixture files");

    let mut failed = Vec::new();
    for path in &files {
        let source = std::fs::read_to_string(path).unwrap();
        let parse = parse(&source).unwrap_or_else(|e| {
            panic!("Internal error parsing {}: {}", path.display(), e);
        });
        assert_eq!(
            parse.tree().leaf_text(),
            source,
            "{} does not round-trip",
            path.display()
        );
        if is_broken(path) {
            assert!(parse.has_errors(), "{} should report errors", path.display());
            continue;
        }

        let mut problems: Vec<String> = parse.diagnostics().iter().map(|d| d.to_string()).collect();
        problems.extend(
            missing_children(parse.tree().root())
                .iter()
                .map(|m| m.to_string()),
        );
        problems.extend(
            parse
                .resolve_fixities()
                .diagnostics
                .iter()
                .map(|d| d.to_string()),
        );
        if !problems.is_empty() {
            failed.push(format!("{}:\n  {}", path.display(), problems.join("\n  ")));
        }
    }

    if !failed.is_empty() {
        panic!("{} fixture(s) failed:\n{}", failed.len(), failed.join("\n"));
    }
}

#[test]
fn parse_fixture_cabal_files() {
    let mut files = Vec::new();
    collect_files(&fixtures_dir(), "cabal", &mut files);
    assert!(!files.is_empty(), "Expected Cabal fixture files");

    for path in &files {
        let source = std::fs::read_to_string(path).unwrap();
        let parse = cabal::parse(&source).unwrap_or_else(|e| {
            panic!("Internal error parsing {}: {}", path.display(), e);
        });
        assert_eq!(parse.tree().leaf_text(), source);
        assert!(
            parse.diagnostics().is_empty(),
            "{}: {:?}",
            path.display(),
            parse.diagnostics()
        );
        assert!(missing_children(parse.tree().root()).is_empty());
    }
}

#[test]
fn broken_fixture_keeps_surrounding_declarations() {
    let source = std::fs::read_to_string(fixtures_dir().join("Broken.hs")).unwrap();
    let parse = parse(&source).unwrap();
    let module = Module::cast(parse.tree().root()).unwrap();
    assert_eq!(module.name().unwrap().text(), "Broken");

    let signatures: Vec<_> = module
        .syntax()
        .descendants()
        .filter_map(TypeSig::cast)
        .flat_map(|sig| sig.names().filter_map(|n| n.name()).collect::<Vec<_>>())
        .collect();
    assert_eq!(signatures, vec!["good", "alsoGood"]);

    let body = module.body().unwrap();
    let declarations = body
        .syntax()
        .child_nodes()
        .filter(|n| n.kind() == SyntaxKind::FunOrPatDecl)
        .count();
    assert_eq!(declarations, 5);

    for diagnostic in parse.diagnostics() {
        assert!(diagnostic.span.end <= source.len());
    }
}

#[test]
fn fixture_module_structure() {
    let source = std::fs::read_to_string(fixtures_dir().join("Queue.hs")).unwrap();
    let parse = parse(&source).unwrap();
    let module = Module::cast(parse.tree().root()).unwrap();

    assert_eq!(module.pragmas().count(), 1);
    let name = module.name().unwrap();
    assert_eq!(name.segments().collect::<Vec<_>>(), vec!["Data", "Queue"]);
    let exports = module.header().unwrap().exports().unwrap();
    assert_eq!(exports.exports().count(), 5);

    let body = module.body().unwrap();
    let imports: Vec<_> = body.imports().collect();
    assert_eq!(imports.len(), 2);
    assert!(imports[0].is_qualified());
    assert_eq!(imports[0].alias().unwrap().text(), "L");
    assert!(!imports[1].is_qualified());
    assert_eq!(imports[1].import_list().unwrap().items().count(), 1);
}
