//! Concrete syntax tree.
//!
//! Unlike an AST, the CST keeps every byte of the input: trivia, layout
//! tokens, parentheses and malformed regions all have a place in the tree.
//! This is what lets highlighting, navigation and diagnostics work on
//! broken code, and what makes `tree.leaf_text() == source` hold.

mod kind;
pub mod nodes;
mod tree;
pub mod visit;

pub use kind::SyntaxKind;
pub use nodes::{missing_children, slots, AstNode, Slot};
pub use tree::{
    Element, NodeData, NodeId, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree, TokenData,
    TokenId,
};
pub use visit::{walk, Visitor};
