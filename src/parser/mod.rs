//! Haskell parser: layout-resolved tokens in, lossless tree out.
//!
//! The grammar pulls tokens through the layout resolver and records what it
//! sees as a flat list of events. The builder then replays those events
//! against the full token list, trivia included, to produce the tree.

mod builder;
mod event;
mod grammar;
mod lexer_adapter;
mod token_set;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cst::SyntaxTree;
use crate::diagnostics::{Diagnostic, ParseError};
use crate::lexer::{lex, Layout, Token};

pub(crate) use builder::build;
pub(crate) use event::Event;

/// A finished parse: the tree and every problem found on the way.
#[derive(Debug, Clone)]
pub struct Parse {
    tree: SyntaxTree,
    diagnostics: Vec<Diagnostic>,
}

impl Parse {
    pub(crate) fn new(tree: SyntaxTree, diagnostics: Vec<Diagnostic>) -> Self {
        Self { tree, diagnostics }
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Diagnostics in source order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn into_parts(self) -> (SyntaxTree, Vec<Diagnostic>) {
        (self.tree, self.diagnostics)
    }
}

/// Which production the parse starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntryPoint {
    /// A whole source file, with or without a module header.
    #[default]
    Module,
    Declaration,
    Expression,
    Type,
    Pattern,
    Import,
}

/// Shared flag for stopping a parse from another thread.
///
/// The parser polls it between top-level items. Once set, the rest of the
/// input goes into a single `Error` node.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Options for [`parse_with`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub entry_point: EntryPoint,
    pub cancellation: Option<CancellationToken>,
    /// Deepest nesting of expressions, types and patterns before the parser
    /// skips the construct with a diagnostic.
    pub max_nesting: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            entry_point: EntryPoint::Module,
            cancellation: None,
            max_nesting: 100,
        }
    }
}

/// Parse a Haskell module.
pub fn parse(source: &str) -> Result<Parse, ParseError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse `source` starting from `options.entry_point`.
///
/// Problems with the input are returned as diagnostics on a complete tree.
/// `Err` means the parser itself failed.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Parse, ParseError> {
    let raw = lex(source);
    let significant: Vec<Token> = raw
        .iter()
        .copied()
        .filter(|token| !token.is_layout_transparent())
        .collect();

    let layout = match options.entry_point {
        EntryPoint::Module => Layout::for_module(source, &significant),
        _ => Layout::new(source, &significant),
    };
    let mut parser = grammar::Parser::new(
        source,
        layout,
        options.max_nesting,
        options.cancellation.clone(),
    );
    grammar::run(&mut parser, options.entry_point);
    let (events, stalled) = parser.finish();
    if let Some((span, production)) = stalled {
        return Err(ParseError::Stalled { span, production });
    }

    let (tree, diagnostics) = build(source, &raw, events)?;
    log::debug!(
        "parsed {:?}: {} nodes, {} tokens, {} diagnostics",
        options.entry_point,
        tree.node_count(),
        tree.token_count(),
        diagnostics.len()
    );
    Ok(Parse::new(tree, diagnostics))
}
