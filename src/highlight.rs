//! Syntax highlighting over the concrete syntax tree.
//!
//! Every non-whitespace token gets exactly one tag. Most tags follow from the
//! token kind alone; the tree decides the rest (a `ConId` is a type inside a
//! type and a constructor elsewhere, the name of a definition is a function).

use crate::cst::nodes::{AstNode, FunLhs, ModuleName, TyCon, TyVar, TypeSig};
use crate::cst::visit::{dispatch, walk_children, Visitor};
use crate::cst::{walk, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree};
use crate::lexer::TokenKind;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightTag {
    Keyword,
    Pragma,
    Comment,
    DocComment,
    String,
    Char,
    Number,
    /// User-defined and qualified operators
    Operator,
    /// `::`, `->`, `=`, `|` and the other reserved symbols
    ReservedOperator,
    Punctuation,
    Variable,
    /// The name being defined by a binding or type signature
    Function,
    Constructor,
    Type,
    TypeVariable,
    Module,
    CabalField,
    CabalSection,
    CabalValue,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub span: Span,
    pub tag: HighlightTag,
}

/// Highlights for every visible token of `tree`, in source order.
pub fn highlight(tree: &SyntaxTree) -> Vec<Highlight> {
    let mut highlighter = Highlighter::default();
    walk(tree, &mut highlighter);
    log::debug!("{} highlights", highlighter.highlights.len());
    highlighter.highlights
}

/// What the enclosing nodes say about the tokens below them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Type,
    Definition,
    Module,
    Error,
}

#[derive(Default)]
struct Highlighter {
    roles: Vec<Role>,
    highlights: Vec<Highlight>,
}

impl Highlighter {
    fn with_role(&mut self, role: Role, node: SyntaxNode<'_>) {
        self.roles.push(role);
        walk_children(self, node);
        self.roles.pop();
    }

    fn role(&self) -> Option<Role> {
        // An error anywhere above wins over everything else
        if self.roles.contains(&Role::Error) {
            return Some(Role::Error);
        }
        self.roles.last().copied()
    }

    fn classify(&self, token: SyntaxToken<'_>) -> Option<HighlightTag> {
        let kind = token.kind();
        if kind == TokenKind::Whitespace || kind.is_virtual() {
            return None;
        }
        if kind.is_comment() {
            return Some(if kind == TokenKind::DocComment {
                HighlightTag::DocComment
            } else {
                HighlightTag::Comment
            });
        }
        let role = self.role();
        if role == Some(Role::Error) || kind == TokenKind::Error || token.error().is_some() {
            return Some(HighlightTag::Error);
        }
        let tag = match kind {
            TokenKind::Pragma => HighlightTag::Pragma,
            _ if kind.is_keyword() => HighlightTag::Keyword,
            TokenKind::VarId | TokenKind::QVarId => variable_tag(token, role),
            TokenKind::ConId | TokenKind::QConId => match role {
                Some(Role::Module) => HighlightTag::Module,
                Some(Role::Type) => HighlightTag::Type,
                _ => HighlightTag::Constructor,
            },
            TokenKind::VarSym
            | TokenKind::QVarSym
            | TokenKind::ConSym
            | TokenKind::QConSym
            | TokenKind::Minus
            | TokenKind::Bang
            | TokenKind::Dot => match role {
                Some(Role::Definition) => HighlightTag::Function,
                _ => HighlightTag::Operator,
            },
            TokenKind::Integer | TokenKind::Float => HighlightTag::Number,
            TokenKind::Char => HighlightTag::Char,
            TokenKind::String => HighlightTag::String,
            _ if kind.is_reserved_operator() => HighlightTag::ReservedOperator,
            TokenKind::CabalFieldName => HighlightTag::CabalField,
            TokenKind::CabalSectionKw => HighlightTag::CabalSection,
            TokenKind::CabalIfKw | TokenKind::CabalElseKw => HighlightTag::Keyword,
            TokenKind::CabalText => HighlightTag::CabalValue,
            TokenKind::CabalVersion => HighlightTag::Number,
            TokenKind::CabalOperator => HighlightTag::Operator,
            _ => HighlightTag::Punctuation,
        };
        Some(tag)
    }
}

/// Variable names live in `QVarId` and `TyVar` nodes; anywhere else a
/// `VarId` is a contextual keyword such as `qualified` or `family`.
fn variable_tag(token: SyntaxToken<'_>, role: Option<Role>) -> HighlightTag {
    match token.parent().kind() {
        SyntaxKind::QVarId => match role {
            Some(Role::Definition) => HighlightTag::Function,
            Some(Role::Type) => HighlightTag::TypeVariable,
            _ => HighlightTag::Variable,
        },
        SyntaxKind::TyVar | SyntaxKind::TvBndr => HighlightTag::TypeVariable,
        _ => HighlightTag::Keyword,
    }
}

impl<'t> Visitor<'t> for Highlighter {
    fn visit_node(&mut self, node: SyntaxNode<'t>) {
        if node.is_error() {
            self.with_role(Role::Error, node);
        } else {
            walk_children(self, node);
        }
    }

    fn visit_token(&mut self, token: SyntaxToken<'t>) {
        if let Some(tag) = self.classify(token) {
            self.highlights.push(Highlight {
                span: token.span(),
                tag,
            });
        }
    }

    fn visit_module_name(&mut self, node: ModuleName<'t>) {
        self.with_role(Role::Module, node.syntax());
    }

    fn visit_ty_con(&mut self, node: TyCon<'t>) {
        self.with_role(Role::Type, node.syntax());
    }

    fn visit_ty_var(&mut self, node: TyVar<'t>) {
        self.with_role(Role::Type, node.syntax());
    }

    fn visit_type_sig(&mut self, node: TypeSig<'t>) {
        let names: Vec<_> = node.names().map(|n| n.syntax()).collect();
        for child in node.syntax().children() {
            match child.into_node() {
                Some(child) if names.contains(&child) => self.with_role(Role::Definition, child),
                Some(child) => dispatch(self, child),
                None => {
                    if let Some(token) = child.into_token() {
                        self.visit_token(token);
                    }
                }
            }
        }
    }

    fn visit_fun_lhs(&mut self, node: FunLhs<'t>) {
        let defined = node
            .var()
            .map(|v| v.syntax())
            .or_else(|| node.operator().map(|o| o.syntax()));
        for child in node.syntax().children() {
            match child.into_node() {
                Some(child) if Some(child) == defined => self.with_role(Role::Definition, child),
                Some(child) => dispatch(self, child),
                None => {
                    if let Some(token) = child.into_token() {
                        self.visit_token(token);
                    }
                }
            }
        }
    }
}
