//! Layout-aware lossless parser for Haskell
//!
//! Turns Haskell source into a concrete syntax tree that keeps every byte of
//! the input, plus diagnostics for whatever could not be parsed. The
//! pipeline has four stages:
//! 1. Logos-based tokenizer that keeps trivia
//! 2. Layout resolver applying the offside rule on demand
//! 3. Recursive-descent grammar emitting events
//! 4. Tree builder that puts trivia back and checks source coverage
//!
//! Operator precedence ([`fixity`]), highlighting ([`highlight`]) and
//! Cabal package descriptions ([`cabal`]) build on the same tree.

pub mod arena;
pub mod cabal;
pub mod cst;
pub mod diagnostics;
pub mod fixity;
pub mod highlight;
pub mod lexer;
pub mod parser;
pub mod span;

// Re-export main types
pub use cst::{SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree};
pub use diagnostics::{Diagnostic, DiagnosticKind, ParseError};
pub use lexer::{lex, Token, TokenKind};
pub use parser::{parse, parse_with, CancellationToken, EntryPoint, Parse, ParseOptions};
