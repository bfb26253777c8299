use std::fmt;

use crate::arena::{Arena, Idx};
use crate::cst::SyntaxKind;
use crate::lexer::{LexErrorKind, Token, TokenKind};
use crate::span::Span;

pub type NodeId = Idx<NodeData>;
pub type TokenId = Idx<TokenData>;

/// A child slot of a node: either a nested node or a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: SyntaxKind,
    pub span: Span,
    /// Non-owning back link; `None` only for the root.
    pub parent: Option<NodeId>,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenData {
    pub token: Token,
    pub parent: NodeId,
}

/// Immutable, lossless syntax tree.
///
/// Nodes and tokens live in two arenas and refer to each other by index.
/// Tokens are allocated in source order, so concatenating their text gives
/// back the source exactly. The tree owns a copy of the source and can be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    text: String,
    nodes: Arena<NodeData>,
    tokens: Arena<TokenData>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn from_parts(
        text: String,
        nodes: Arena<NodeData>,
        tokens: Arena<TokenData>,
        root: NodeId,
    ) -> Self {
        Self {
            text,
            nodes,
            tokens,
            root,
        }
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: self.root,
        }
    }

    /// The source text the tree was built from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn node(&self, id: NodeId) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id }
    }

    pub fn token(&self, id: TokenId) -> SyntaxToken<'_> {
        SyntaxToken { tree: self, id }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Every token in source order, trivia and virtual layout tokens included.
    pub fn tokens(&self) -> impl Iterator<Item = SyntaxToken<'_>> + '_ {
        self.tokens.iter().map(move |(id, _)| SyntaxToken { tree: self, id })
    }

    /// Concatenated text of all tokens. Equal to [`SyntaxTree::text`] for
    /// every tree the parser produces.
    pub fn leaf_text(&self) -> String {
        self.tokens().map(|t| t.text()).collect()
    }

    /// Deepest node whose span contains `offset`. The end of the source
    /// belongs to the root.
    pub fn node_at_offset(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        if offset > self.text.len() {
            return None;
        }
        let mut current = self.root();
        'descend: loop {
            for child in current.child_nodes() {
                if child.span().contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// The non-empty token covering `offset`.
    pub fn token_at_offset(&self, offset: usize) -> Option<SyntaxToken<'_>> {
        let tokens = self.tokens.as_slice();
        let start = tokens.partition_point(|t| t.token.span.end <= offset);
        tokens[start..]
            .iter()
            .position(|t| !t.token.span.is_empty())
            .map(|i| Idx::from_raw((start + i) as u32))
            .map(|id| self.token(id))
            .filter(|t| t.span().contains(offset))
    }

    /// Indented dump of the tree, one node or token per line.
    pub fn debug_tree(&self, include_trivia: bool) -> String {
        let mut out = String::new();
        self.dump(self.root, 0, include_trivia, &mut out);
        out
    }

    fn dump(&self, id: NodeId, depth: usize, include_trivia: bool, out: &mut String) {
        let node = &self.nodes[id];
        out.push_str(&format!("{}{:?}@{}\n", "  ".repeat(depth), node.kind, node.span));
        for child in &node.children {
            match *child {
                Element::Node(child) => self.dump(child, depth + 1, include_trivia, out),
                Element::Token(token) => {
                    let token = self.token(token);
                    if token.is_trivia() && !include_trivia {
                        continue;
                    }
                    out.push_str(&format!("{}{}\n", "  ".repeat(depth + 1), token));
                }
            }
        }
    }
}

/// Borrowed handle to a node.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn span(&self) -> Span {
        self.data().span
    }

    pub fn text(&self) -> &'t str {
        self.span().text(&self.tree.text)
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        let tree = self.tree;
        self.data().parent.map(|id| SyntaxNode { tree, id })
    }

    pub fn children(&self) -> impl Iterator<Item = SyntaxElement<'t>> + 't {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |element| SyntaxElement::new(tree, *element))
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter_map(SyntaxElement::into_node)
    }

    pub fn child_tokens(&self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        self.children().filter_map(SyntaxElement::into_token)
    }

    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<SyntaxNode<'t>> {
        self.child_nodes().find(|n| n.kind() == kind)
    }

    pub fn child_token(&self, kind: TokenKind) -> Option<SyntaxToken<'t>> {
        self.child_tokens().find(|t| t.kind() == kind)
    }

    /// This node, then its parent, up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(Some(*self), |node| node.parent())
    }

    /// Nearest node of `kind` among this node and its ancestors.
    pub fn ancestor_of_kind(&self, kind: SyntaxKind) -> Option<SyntaxNode<'t>> {
        self.ancestors().find(|n| n.kind() == kind)
    }

    /// This node and every node below it, in preorder.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        Preorder::new(self.tree, self.id).filter_map(SyntaxElement::into_node)
    }

    /// Every token below this node, in source order.
    pub fn descendant_tokens(&self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        Preorder::new(self.tree, self.id).filter_map(SyntaxElement::into_token)
    }

    /// Tokens the grammar consumed: no trivia, no virtual layout tokens.
    pub fn significant_tokens(&self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        self.descendant_tokens()
            .filter(|t| !t.is_trivia() && !t.is_virtual())
    }

    pub fn first_token(&self) -> Option<SyntaxToken<'t>> {
        self.descendant_tokens().next()
    }

    pub fn is_error(&self) -> bool {
        self.kind() == SyntaxKind::Error
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.kind(), self.span())
    }
}

impl fmt::Display for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Borrowed handle to a token.
#[derive(Clone, Copy)]
pub struct SyntaxToken<'t> {
    tree: &'t SyntaxTree,
    id: TokenId,
}

impl<'t> SyntaxToken<'t> {
    fn data(&self) -> &'t TokenData {
        &self.tree.tokens[self.id]
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn token(&self) -> Token {
        self.data().token
    }

    pub fn kind(&self) -> TokenKind {
        self.data().token.kind
    }

    pub fn span(&self) -> Span {
        self.data().token.span
    }

    pub fn text(&self) -> &'t str {
        self.span().text(&self.tree.text)
    }

    pub fn parent(&self) -> SyntaxNode<'t> {
        SyntaxNode {
            tree: self.tree,
            id: self.data().parent,
        }
    }

    pub fn is_trivia(&self) -> bool {
        self.kind().is_trivia()
    }

    /// Zero-width token inserted by the layout resolver.
    pub fn is_virtual(&self) -> bool {
        self.kind().is_virtual()
    }

    pub fn error(&self) -> Option<LexErrorKind> {
        self.data().token.error
    }
}

impl PartialEq for SyntaxToken<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxToken<'_> {}

impl fmt::Debug for SyntaxToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.kind(), self.span())
    }
}

impl fmt::Display for SyntaxToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_virtual() {
            write!(f, "{:?}@{}", self.kind(), self.span())
        } else {
            write!(f, "{:?}@{} {:?}", self.kind(), self.span(), self.text())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxElement<'t> {
    Node(SyntaxNode<'t>),
    Token(SyntaxToken<'t>),
}

impl<'t> SyntaxElement<'t> {
    fn new(tree: &'t SyntaxTree, element: Element) -> Self {
        match element {
            Element::Node(id) => SyntaxElement::Node(SyntaxNode { tree, id }),
            Element::Token(id) => SyntaxElement::Token(SyntaxToken { tree, id }),
        }
    }

    pub fn into_node(self) -> Option<SyntaxNode<'t>> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<SyntaxToken<'t>> {
        match self {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(_) => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            SyntaxElement::Node(node) => node.span(),
            SyntaxElement::Token(token) => token.span(),
        }
    }
}

struct Preorder<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<Element>,
}

impl<'t> Preorder<'t> {
    fn new(tree: &'t SyntaxTree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![Element::Node(start)],
        }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = SyntaxElement<'t>;

    fn next(&mut self) -> Option<SyntaxElement<'t>> {
        let element = self.stack.pop()?;
        if let Element::Node(id) = element {
            self.stack
                .extend(self.tree.nodes[id].children.iter().rev().copied());
        }
        Some(SyntaxElement::new(self.tree, element))
    }
}
