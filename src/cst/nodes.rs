//! Typed views over [`SyntaxNode`].
//!
//! Every grammar production gets a thin `Copy` wrapper whose accessors follow
//! the production's shape: a required child returns
//! `Result<_, MissingChild>`, an optional child returns `Option`, and a list
//! child returns an iterator in source order. The shapes are also available
//! as data through [`slots`], which lets tooling check a tree against the
//! grammar without going through the views.

use crate::cst::{SyntaxKind, SyntaxNode, SyntaxToken};
use crate::diagnostics::MissingChild;
use crate::lexer::literal::{self, LiteralError, LiteralValue};
use crate::lexer::TokenKind;
use crate::span::Span;

/// A typed view of one or more node kinds.
pub trait AstNode<'t>: Copy {
    fn can_cast(kind: SyntaxKind) -> bool;

    fn cast(node: SyntaxNode<'t>) -> Option<Self>;

    fn syntax(&self) -> SyntaxNode<'t>;

    fn span(&self) -> Span {
        self.syntax().span()
    }

    fn text(&self) -> &'t str {
        self.syntax().text()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Required,
    Optional,
    Many,
}

#[derive(Clone, Copy)]
pub enum SlotTarget {
    Node(fn(SyntaxKind) -> bool),
    Token(TokenKind),
}

impl std::fmt::Debug for SlotTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotTarget::Node(_) => f.write_str("Node(..)"),
            SlotTarget::Token(kind) => write!(f, "Token({:?})", kind),
        }
    }
}

/// One child role of a production.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub role: &'static str,
    pub arity: Arity,
    pub target: SlotTarget,
}

impl Slot {
    /// Whether `node` has a child filling this slot.
    pub fn is_filled(&self, node: SyntaxNode<'_>) -> bool {
        match self.target {
            SlotTarget::Node(accepts) => node.child_nodes().any(|n| accepts(n.kind())),
            SlotTarget::Token(kind) => node.child_token(kind).is_some(),
        }
    }
}

/// Every required slot of `node` and its descendants that is empty.
/// Nodes inside `Error` nodes are skipped.
pub fn missing_children(node: SyntaxNode<'_>) -> Vec<MissingChild> {
    node.descendants()
        .filter(|n| !n.ancestors().any(|a| a.is_error()))
        .flat_map(|n| {
            slots(n.kind())
                .iter()
                .filter(move |slot| slot.arity == Arity::Required && !slot.is_filled(n))
                .map(move |slot| MissingChild {
                    kind: n.kind(),
                    role: slot.role,
                    span: n.span(),
                })
        })
        .collect()
}

mod support {
    use super::*;

    pub(super) fn child<'t, N: AstNode<'t>>(node: SyntaxNode<'t>) -> Option<N> {
        node.child_nodes().find_map(N::cast)
    }

    pub(super) fn children<'t, N: AstNode<'t> + 't>(
        node: SyntaxNode<'t>,
    ) -> impl Iterator<Item = N> + 't {
        node.child_nodes().filter_map(N::cast)
    }

    /// First child castable to `N` that follows a `kind` token.
    pub(super) fn child_after<'t, N: AstNode<'t>>(node: SyntaxNode<'t>, kind: TokenKind) -> Option<N> {
        node.children()
            .skip_while(|e| e.into_token().map_or(true, |t| t.kind() != kind))
            .filter_map(|e| e.into_node())
            .find_map(N::cast)
    }

    /// First child castable to `N` that precedes every token in `stops`.
    pub(super) fn child_before<'t, N: AstNode<'t>>(
        node: SyntaxNode<'t>,
        stops: &[TokenKind],
    ) -> Option<N> {
        node.children()
            .take_while(|e| e.into_token().map_or(true, |t| !stops.contains(&t.kind())))
            .filter_map(|e| e.into_node())
            .find_map(N::cast)
    }

    pub(super) fn token<'t>(node: SyntaxNode<'t>, kind: TokenKind) -> Option<SyntaxToken<'t>> {
        node.child_token(kind)
    }

    /// First significant token among the direct children.
    pub(super) fn first_significant<'t>(node: SyntaxNode<'t>) -> Option<SyntaxToken<'t>> {
        node.child_tokens().find(|t| !t.is_trivia() && !t.is_virtual())
    }

    /// Contextual keywords are plain `VarId` tokens.
    pub(super) fn has_word(node: SyntaxNode<'_>, word: &str) -> bool {
        node.child_tokens()
            .any(|t| t.kind() == TokenKind::VarId && t.text() == word)
    }

    pub(super) fn required<T>(
        value: Option<T>,
        node: SyntaxNode<'_>,
        role: &'static str,
    ) -> Result<T, MissingChild> {
        value.ok_or(MissingChild {
            kind: node.kind(),
            role,
            span: node.span(),
        })
    }
}

macro_rules! ast_nodes {
    (@slot $role:ident one $t:ident) => {
        Slot { role: stringify!($role), arity: Arity::Required, target: SlotTarget::Node(<$t<'static> as AstNode<'static>>::can_cast) }
    };
    (@slot $role:ident opt $t:ident) => {
        Slot { role: stringify!($role), arity: Arity::Optional, target: SlotTarget::Node(<$t<'static> as AstNode<'static>>::can_cast) }
    };
    (@slot $role:ident many $t:ident) => {
        Slot { role: stringify!($role), arity: Arity::Many, target: SlotTarget::Node(<$t<'static> as AstNode<'static>>::can_cast) }
    };
    (@slot $role:ident custom_one $t:ident) => { ast_nodes!(@slot $role one $t) };
    (@slot $role:ident custom_opt $t:ident) => { ast_nodes!(@slot $role opt $t) };
    (@slot $role:ident custom_many $t:ident) => { ast_nodes!(@slot $role many $t) };
    (@slot $role:ident token $t:ident) => {
        Slot { role: stringify!($role), arity: Arity::Required, target: SlotTarget::Token(TokenKind::$t) }
    };
    (@slot $role:ident opt_token $t:ident) => {
        Slot { role: stringify!($role), arity: Arity::Optional, target: SlotTarget::Token(TokenKind::$t) }
    };

    (@accessor $lt:lifetime $role:ident one $t:ident) => {
        pub fn $role(&self) -> Result<$t<$lt>, MissingChild> {
            support::required(support::child(self.0), self.0, stringify!($role))
        }
    };
    (@accessor $lt:lifetime $role:ident opt $t:ident) => {
        pub fn $role(&self) -> Option<$t<$lt>> {
            support::child(self.0)
        }
    };
    (@accessor $lt:lifetime $role:ident many $t:ident) => {
        pub fn $role(&self) -> impl Iterator<Item = $t<$lt>> + $lt {
            support::children(self.0)
        }
    };
    (@accessor $lt:lifetime $role:ident token $t:ident) => {
        pub fn $role(&self) -> Result<SyntaxToken<$lt>, MissingChild> {
            support::required(support::token(self.0, TokenKind::$t), self.0, stringify!($role))
        }
    };
    (@accessor $lt:lifetime $role:ident opt_token $t:ident) => {
        pub fn $role(&self) -> Option<SyntaxToken<$lt>> {
            support::token(self.0, TokenKind::$t)
        }
    };
    (@accessor $lt:lifetime $role:ident custom_one $t:ident) => {};
    (@accessor $lt:lifetime $role:ident custom_opt $t:ident) => {};
    (@accessor $lt:lifetime $role:ident custom_many $t:ident) => {};

    ($(
        $(#[$meta:meta])*
        $name:ident { $($role:ident : $arity:ident $target:ident),* $(,)? }
    )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name<'t>(SyntaxNode<'t>);

            impl<'t> AstNode<'t> for $name<'t> {
                fn can_cast(kind: SyntaxKind) -> bool {
                    kind == SyntaxKind::$name
                }

                fn cast(node: SyntaxNode<'t>) -> Option<Self> {
                    Self::can_cast(node.kind()).then_some(Self(node))
                }

                fn syntax(&self) -> SyntaxNode<'t> {
                    self.0
                }
            }

            impl<'t> $name<'t> {
                pub const SLOTS: &'static [Slot] = &[$(ast_nodes!(@slot $role $arity $target)),*];

                $(ast_nodes!(@accessor 't $role $arity $target);)*
            }
        )*

        /// Child roles of the production `kind`; empty for kinds without a
        /// typed view.
        pub fn slots(kind: SyntaxKind) -> &'static [Slot] {
            match kind {
                $(SyntaxKind::$name => $name::SLOTS,)*
                _ => &[],
            }
        }
    };
}

macro_rules! ast_categories {
    ($($(#[$meta:meta])* $name:ident => $predicate:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name<'t>(SyntaxNode<'t>);

            impl<'t> AstNode<'t> for $name<'t> {
                fn can_cast(kind: SyntaxKind) -> bool {
                    kind.$predicate()
                }

                fn cast(node: SyntaxNode<'t>) -> Option<Self> {
                    Self::can_cast(node.kind()).then_some(Self(node))
                }

                fn syntax(&self) -> SyntaxNode<'t> {
                    self.0
                }
            }

            impl<'t> $name<'t> {
                pub fn kind(&self) -> SyntaxKind {
                    self.0.kind()
                }

                /// Downcast to a specific production.
                pub fn to<N: AstNode<'t>>(&self) -> Option<N> {
                    N::cast(self.0)
                }
            }
        )*
    };
}

ast_categories! {
    /// Any expression production.
    Exp => is_expression,
    /// Any type production.
    Type => is_type,
    /// Any pattern production.
    Pat => is_pattern,
    /// Any item of a declaration block or module body.
    Decl => is_declaration,
    /// A `do` statement, guard qualifier or comprehension qualifier.
    Stmt => is_statement,
    /// A qualified variable or constructor operator.
    Op => is_operator,
}

ast_nodes! {
    Module {
        pragmas: many Pragma,
        header: opt ModuleHeader,
        body: one ModuleBody,
    }
    ModuleHeader {
        module_token: token ModuleKw,
        name: one ModuleName,
        exports: opt ExportList,
        where_token: token WhereKw,
    }
    ModuleName {}
    ExportList {
        exports: many Export,
    }
    Export {
        module_token: opt_token ModuleKw,
        module_name: opt ModuleName,
        var: opt QVar,
        con: opt QCon,
        members: opt MemberList,
    }
    MemberList {
        dotdot: opt_token DotDot,
        vars: many QVar,
        cons: many QCon,
    }
    ModuleBody {
        imports: many ImportDecl,
        decls: many Decl,
    }
    ImportDecl {
        import_token: token ImportKw,
        pragma: opt Pragma,
        module_name: custom_one ModuleName,
        alias: custom_opt ModuleName,
        import_list: opt ImportList,
    }
    ImportList {
        items: many ImportItem,
    }
    ImportItem {
        var: opt QVar,
        con: opt QCon,
        members: opt MemberList,
    }

    TypeSig {
        names: many QVar,
        double_colon: token DoubleColon,
        ty: one CType,
    }
    FixityDecl {
        precedence: opt_token Integer,
        operators: many Op,
    }
    FunOrPatDecl {
        lhs: opt FunLhs,
        pattern: opt Pat,
        rhs: one Rhs,
    }
    FunLhs {
        var: opt QVar,
        operator: opt QVarOp,
        args: many Pat,
    }
    /// `= e`, `-> e`, or a list of guarded right-hand sides, with an
    /// optional `where`.
    Rhs {
        equals: opt_token Equals,
        arrow: opt_token RightArrow,
        body: opt Exp,
        guards: many GuardedRhs,
        where_clause: opt WhereClause,
    }
    GuardedRhs {
        pipe: token Pipe,
        guards: many Stmt,
        body: one Exp,
    }
    WhereClause {
        where_token: token WhereKw,
        decls: one DeclBlock,
    }
    DeclBlock {
        lbrace: opt_token LBrace,
        rbrace: opt_token RBrace,
        decls: many Decl,
        pragmas: many Pragma,
    }
    DataDecl {
        data_token: token DataKw,
        head: custom_one CType,
        kind_sig: custom_opt CType,
        constrs: many Constr,
        gadt_body: opt DeclBlock,
        derivings: many Deriving,
    }
    NewtypeDecl {
        newtype_token: token NewtypeKw,
        head: custom_one CType,
        kind_sig: custom_opt CType,
        constrs: many Constr,
        gadt_body: opt DeclBlock,
        derivings: many Deriving,
    }
    Constr {
        forall_token: opt_token ForallKw,
        tv_bndrs: many TvBndr,
        context: opt Context,
        con: opt QCon,
        operator: opt QConOp,
        fields: opt RecordFields,
        args: many Type,
    }
    RecordFields {
        fields: many FieldDecl,
    }
    FieldDecl {
        names: many QVar,
        double_colon: token DoubleColon,
        ty: one CType,
    }
    GadtConstr {
        cons: many QCon,
        double_colon: token DoubleColon,
        ty: one CType,
    }
    Deriving {
        deriving_token: token DerivingKw,
        classes: custom_many Type,
        via_type: opt CType,
    }
    TypeDecl {
        type_token: token TypeKw,
        head: custom_one CType,
        kind_sig: custom_opt CType,
        rhs: custom_opt CType,
    }
    TypeEqn {
        equals: token Equals,
    }
    ClassDecl {
        class_token: token ClassKw,
        head: one CType,
        fundeps: opt FunDeps,
        where_token: opt_token WhereKw,
        body: opt DeclBlock,
    }
    FunDeps {
        pipe: token Pipe,
        deps: many FunDep,
    }
    FunDep {
        arrow: token RightArrow,
        vars: custom_many TyVar,
    }
    InstanceDecl {
        instance_token: token InstanceKw,
        pragma: opt Pragma,
        head: one CType,
        where_token: opt_token WhereKw,
        body: opt DeclBlock,
    }
    DerivingDecl {
        deriving_token: token DerivingKw,
        instance_token: token InstanceKw,
        head: one CType,
    }
    DefaultDecl {
        default_token: token DefaultKw,
        types: many Type,
    }
    ForeignDecl {
        foreign_token: token ForeignKw,
        entity: opt_token String,
        name: one QVar,
        double_colon: token DoubleColon,
        ty: one CType,
    }
    Pragma {
        token: token Pragma,
    }

    /// Always the outermost node of a type in a signature position:
    /// `forall a b.`, then an optional `context =>`, then the type.
    CType {
        forall_token: opt_token ForallKw,
        tv_bndrs: many TvBndr,
        context: opt Context,
        fat_arrow: opt_token FatArrow,
        ty: one Type,
    }
    Context {}
    TvBndr {
        var: token VarId,
        kind_sig: opt CType,
    }
    FunType {
        arrow: token RightArrow,
        param: custom_one Type,
        result: custom_one Type,
    }
    AppType {
        head: custom_one Type,
        args: custom_many Type,
    }
    InfixType {
        operands: many Type,
        operators: many Op,
    }
    TyCon {}
    TyVar {
        var: token VarId,
    }
    TupleType {
        elements: many Type,
    }
    ListType {
        element: opt Type,
    }
    ParenType {
        inner: one Type,
    }
    KindSig {
        ty: custom_one Type,
        kind_sig: custom_one Type,
    }
    BangType {
        bang: token Bang,
        ty: one Type,
    }
    LazyType {
        tilde: token Tilde,
        ty: one Type,
    }
    PromotedType {
        quote: token Quote,
    }
    TypeLit {}
    WildcardType {
        underscore: token Underscore,
    }

    /// A flat operator chain. Precedence is resolved afterwards by
    /// [`crate::fixity`].
    InfixExp {}
    LambdaExp {
        backslash: token Backslash,
        params: many Pat,
        arrow: token RightArrow,
        body: one Exp,
    }
    LambdaCaseExp {
        backslash: token Backslash,
        case_token: token CaseKw,
        alts: one AltBlock,
    }
    LetExp {
        let_token: token LetKw,
        decls: one DeclBlock,
        in_token: token InKw,
        body: one Exp,
    }
    IfExp {
        if_token: token IfKw,
        condition: custom_one Exp,
        then_token: token ThenKw,
        then_branch: custom_one Exp,
        else_token: token ElseKw,
        else_branch: custom_one Exp,
    }
    CaseExp {
        case_token: token CaseKw,
        scrutinee: one Exp,
        of_token: token OfKw,
        alts: one AltBlock,
    }
    DoExp {
        do_token: token DoKw,
        stmts: one StmtBlock,
    }
    AppExp {
        function: custom_one Exp,
        args: custom_many Exp,
        type_args: many TypeApp,
    }
    TypeApp {
        at: token At,
        ty: one Type,
    }
    TypedExp {
        exp: one Exp,
        double_colon: token DoubleColon,
        ty: one CType,
    }
    LeftSection {
        operand: one Exp,
        operator: one Op,
    }
    RightSection {
        operator: one Op,
        operand: one Exp,
    }
    ParenExp {
        inner: one Exp,
    }
    TupleExp {
        elements: many Exp,
    }
    ListExp {
        elements: many Exp,
    }
    ArithSeq {
        from: custom_one Exp,
        then: custom_opt Exp,
        dotdot: token DotDot,
        to: custom_opt Exp,
    }
    ListComp {
        body: one Exp,
        pipe: token Pipe,
        quals: many Stmt,
    }
    RecordExp {
        record: one Exp,
        fields: many FieldBind,
    }
    FieldBind {
        field: one QVar,
        value: custom_opt Exp,
    }
    HoleExp {
        underscore: token Underscore,
    }
    PragmaExp {
        pragma: one Pragma,
        exp: one Exp,
    }
    Literal {}

    AltBlock {
        lbrace: opt_token LBrace,
        rbrace: opt_token RBrace,
        alts: many Alt,
    }
    Alt {
        pattern: one Pat,
        rhs: one Rhs,
    }
    StmtBlock {
        lbrace: opt_token LBrace,
        rbrace: opt_token RBrace,
        stmts: many Stmt,
    }
    BindStmt {
        pattern: one Pat,
        arrow: token LeftArrow,
        exp: one Exp,
    }
    LetStmt {
        let_token: token LetKw,
        decls: one DeclBlock,
    }
    ExpStmt {
        exp: one Exp,
    }

    VarPat {
        var: one QVar,
    }
    AsPat {
        var: one QVar,
        at: token At,
        pattern: one Pat,
    }
    LazyPat {
        tilde: token Tilde,
        pattern: one Pat,
    }
    BangPat {
        bang: token Bang,
        pattern: one Pat,
    }
    ConPat {
        con: one QCon,
        args: many Pat,
    }
    InfixPat {
        operands: many Pat,
        operators: many QConOp,
    }
    LitPat {
        minus: opt_token Minus,
        literal: one Literal,
    }
    TuplePat {
        elements: many Pat,
    }
    ListPat {
        elements: many Pat,
    }
    RecordPat {
        con: one QCon,
        fields: many FieldPat,
    }
    FieldPat {
        field: one QVar,
        pattern: opt Pat,
    }
    WildPat {
        underscore: token Underscore,
    }
    ParenPat {
        inner: one Pat,
    }
    TypedPat {
        pattern: one Pat,
        double_colon: token DoubleColon,
        ty: one CType,
    }

    /// A variable: `x`, `M.x`, or a parenthesised operator `(+)`.
    QVar {
        id: opt QVarId,
        sym: opt QVarSym,
    }
    /// A constructor: `Just`, `M.Just`, `(:|)`, or a special constructor.
    QCon {
        id: opt QConId,
        sym: opt QConSym,
        special: opt SpecialCon,
    }
    /// A variable operator: `+`, `M.!`, or `` `elem` ``.
    QVarOp {
        sym: opt QVarSym,
        id: opt QVarId,
    }
    /// A constructor operator: `:|`, `M.:|`, or `` `Cons` ``.
    QConOp {
        sym: opt QConSym,
        id: opt QConId,
    }
    QVarId {}
    QConId {}
    QVarSym {}
    QConSym {}
    SpecialCon {}

    CabalFile {
        fields: many CabalField,
        sections: many CabalSection,
        conditionals: many CabalConditional,
    }
    CabalField {
        name: token CabalFieldName,
        colon: token Colon,
        value: opt CabalFieldValue,
    }
    CabalFieldValue {}
    CabalSection {
        keyword: token CabalSectionKw,
        args: opt CabalSectionArgs,
        block: one CabalBlock,
    }
    CabalSectionArgs {}
    CabalConditional {
        if_token: token CabalIfKw,
        condition: one CabalCondition,
        block: one CabalBlock,
        else_branch: opt CabalElse,
    }
    CabalCondition {}
    CabalElse {
        else_token: token CabalElseKw,
        block: one CabalBlock,
    }
    CabalBlock {
        fields: many CabalField,
        sections: many CabalSection,
        conditionals: many CabalConditional,
    }
}

/// Splits `Data.Map.lookup` into `Some("Data.Map")` and `"lookup"`. The
/// module path is the longest prefix of `Conid.` segments that leaves a
/// non-empty name, so `M..` is the operator `.` qualified by `M`.
pub fn split_qualified(text: &str) -> (Option<&str>, &str) {
    let mut qualifier_end = 0;
    let mut offset = 0;
    loop {
        let rest = &text[offset..];
        if !rest.starts_with(|c: char| c.is_uppercase()) {
            break;
        }
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\''))
            .unwrap_or(rest.len());
        if rest[len..].starts_with('.') && len + 1 < rest.len() {
            qualifier_end = offset + len;
            offset += len + 1;
        } else {
            break;
        }
    }
    if qualifier_end == 0 {
        (None, text)
    } else {
        (Some(&text[..qualifier_end]), &text[offset..])
    }
}

macro_rules! name_views {
    ($($name:ident),*) => {
        $(
            impl<'t> $name<'t> {
                pub fn token(&self) -> Result<SyntaxToken<'t>, MissingChild> {
                    support::required(support::first_significant(self.0), self.0, "token")
                }

                /// Module path of a qualified name, without the trailing dot.
                pub fn qualifier(&self) -> Option<&'t str> {
                    split_qualified(self.0.text().trim()).0
                }

                /// The name with any module path removed.
                pub fn name(&self) -> &'t str {
                    split_qualified(self.0.text().trim()).1
                }

                pub fn is_qualified(&self) -> bool {
                    self.qualifier().is_some()
                }
            }
        )*
    };
}

name_views!(QVarId, QConId, QVarSym, QConSym);

impl<'t> QVarSym<'t> {
    /// The operator symbol, e.g. `!` for `Data.Map.!`.
    pub fn symbol(&self) -> &'t str {
        self.name()
    }
}

impl<'t> QConSym<'t> {
    pub fn symbol(&self) -> &'t str {
        self.name()
    }
}

impl<'t> ModuleName<'t> {
    pub fn token(&self) -> Result<SyntaxToken<'t>, MissingChild> {
        support::required(support::first_significant(self.0), self.0, "token")
    }

    /// `Data.Map` yields `Data` and `Map`.
    pub fn segments(&self) -> impl Iterator<Item = &'t str> {
        self.0.text().trim().split('.')
    }
}

impl<'t> QVar<'t> {
    /// Unqualified name, with any parentheses removed.
    pub fn name(&self) -> Option<&'t str> {
        match (self.id(), self.sym()) {
            (Some(id), _) => Some(id.name()),
            (None, Some(sym)) => Some(sym.name()),
            (None, None) => None,
        }
    }

    pub fn qualifier(&self) -> Option<&'t str> {
        self.id()
            .and_then(|id| id.qualifier())
            .or_else(|| self.sym().and_then(|sym| sym.qualifier()))
    }

    pub fn is_operator(&self) -> bool {
        self.sym().is_some()
    }
}

impl<'t> QCon<'t> {
    pub fn name(&self) -> Option<&'t str> {
        match (self.id(), self.sym(), self.special()) {
            (Some(id), _, _) => Some(id.name()),
            (None, Some(sym), _) => Some(sym.name()),
            (None, None, Some(special)) => Some(special.syntax().text()),
            (None, None, None) => None,
        }
    }
}

impl<'t> QVarOp<'t> {
    /// `` `elem` `` rather than a symbol.
    pub fn is_backtick(&self) -> bool {
        self.0.child_token(TokenKind::Backtick).is_some()
    }
}

impl<'t> QConOp<'t> {
    pub fn is_backtick(&self) -> bool {
        self.0.child_token(TokenKind::Backtick).is_some()
    }
}

impl<'t> Op<'t> {
    /// Module path of the operator, if qualified.
    pub fn qualifier(&self) -> Option<&'t str> {
        let (sym, id) = self.parts();
        sym.map(|(_, q)| q).or(id.map(|(_, q)| q)).flatten()
    }

    /// Unqualified operator name: `!` for `Data.Map.!`, `elem` for
    /// `` `elem` ``.
    pub fn name(&self) -> Option<&'t str> {
        let (sym, id) = self.parts();
        sym.map(|(n, _)| n).or(id.map(|(n, _)| n))
    }

    pub fn is_backtick(&self) -> bool {
        self.0.child_token(TokenKind::Backtick).is_some()
    }

    pub fn is_constructor(&self) -> bool {
        self.0.kind() == SyntaxKind::QConOp
    }

    #[allow(clippy::type_complexity)]
    fn parts(&self) -> (Option<(&'t str, Option<&'t str>)>, Option<(&'t str, Option<&'t str>)>) {
        if let Some(op) = QVarOp::cast(self.0) {
            (
                op.sym().map(|s| (s.name(), s.qualifier())),
                op.id().map(|i| (i.name(), i.qualifier())),
            )
        } else if let Some(op) = QConOp::cast(self.0) {
            (
                op.sym().map(|s| (s.name(), s.qualifier())),
                op.id().map(|i| (i.name(), i.qualifier())),
            )
        } else {
            (None, None)
        }
    }
}

impl<'t> SpecialCon<'t> {
    /// `()`, `[]`, `(,,)` or `(->)` with any inner trivia removed.
    pub fn normalized(&self) -> String {
        self.0
            .significant_tokens()
            .map(|t| t.text())
            .collect()
    }
}

impl<'t> ImportDecl<'t> {
    pub fn module_name(&self) -> Result<ModuleName<'t>, MissingChild> {
        support::required(support::child(self.0), self.0, "module_name")
    }

    /// The `N` of `as N`.
    pub fn alias(&self) -> Option<ModuleName<'t>> {
        self.0
            .children()
            .skip_while(|e| {
                e.into_token()
                    .map_or(true, |t| !(t.kind() == TokenKind::VarId && t.text() == "as"))
            })
            .filter_map(|e| e.into_node())
            .find_map(ModuleName::cast)
    }

    pub fn is_qualified(&self) -> bool {
        support::has_word(self.0, "qualified")
    }

    pub fn is_hiding(&self) -> bool {
        support::has_word(self.0, "hiding")
    }

    /// Package name of a package-qualified import, quotes included.
    pub fn package(&self) -> Option<SyntaxToken<'t>> {
        support::token(self.0, TokenKind::String)
    }
}

impl<'t> Module<'t> {
    pub fn name(&self) -> Option<ModuleName<'t>> {
        self.header().and_then(|h| h.name().ok())
    }
}

impl<'t> ModuleBody<'t> {
    /// Pragmas standing as top-level items, e.g. `{-# INLINE f #-}`.
    pub fn pragmas(&self) -> impl Iterator<Item = Pragma<'t>> + 't {
        support::children(self.0)
    }
}

/// Written-out braces versus braces inserted by the layout resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockBraces {
    Explicit,
    Virtual,
}

fn block_braces(node: SyntaxNode<'_>) -> BlockBraces {
    if node.child_token(TokenKind::LBrace).is_some() {
        BlockBraces::Explicit
    } else {
        BlockBraces::Virtual
    }
}

impl<'t> DeclBlock<'t> {
    pub fn braces(&self) -> BlockBraces {
        block_braces(self.0)
    }
}

impl<'t> AltBlock<'t> {
    pub fn braces(&self) -> BlockBraces {
        block_braces(self.0)
    }
}

impl<'t> StmtBlock<'t> {
    pub fn braces(&self) -> BlockBraces {
        block_braces(self.0)
    }
}

impl<'t> LetExp<'t> {
    /// Pragmas among the bindings, e.g. `{-# INLINE go #-}`.
    pub fn pragmas(&self) -> impl Iterator<Item = Pragma<'t>> + 't {
        let block = self.decls().ok();
        block.into_iter().flat_map(|b| b.pragmas())
    }

    pub fn braces(&self) -> Option<BlockBraces> {
        self.decls().ok().map(|b| b.braces())
    }
}

impl<'t> Pragma<'t> {
    /// First word inside the pragma, e.g. `LANGUAGE`.
    pub fn name(&self) -> &'t str {
        self.body().split_whitespace().next().unwrap_or("")
    }

    /// Text between `{-#` and `#-}`.
    pub fn body(&self) -> &'t str {
        let text = self.0.text().trim();
        let text = text.strip_prefix("{-#").unwrap_or(text);
        let text = text.strip_suffix("#-}").unwrap_or(text);
        text.trim()
    }
}

const SIGNATURE_STOPS: &[TokenKind] = &[
    TokenKind::DoubleColon,
    TokenKind::Equals,
    TokenKind::WhereKw,
    TokenKind::DerivingKw,
];

impl<'t> DataDecl<'t> {
    pub fn head(&self) -> Result<CType<'t>, MissingChild> {
        support::required(support::child_before(self.0, SIGNATURE_STOPS), self.0, "head")
    }

    pub fn kind_sig(&self) -> Option<CType<'t>> {
        support::child_after(self.0, TokenKind::DoubleColon)
    }

    pub fn is_gadt(&self) -> bool {
        self.gadt_body().is_some()
    }
}

impl<'t> NewtypeDecl<'t> {
    pub fn head(&self) -> Result<CType<'t>, MissingChild> {
        support::required(support::child_before(self.0, SIGNATURE_STOPS), self.0, "head")
    }

    pub fn kind_sig(&self) -> Option<CType<'t>> {
        support::child_after(self.0, TokenKind::DoubleColon)
    }
}

impl<'t> TypeDecl<'t> {
    pub fn head(&self) -> Result<CType<'t>, MissingChild> {
        support::required(support::child_before(self.0, SIGNATURE_STOPS), self.0, "head")
    }

    pub fn kind_sig(&self) -> Option<CType<'t>> {
        support::child_after(self.0, TokenKind::DoubleColon)
    }

    pub fn rhs(&self) -> Option<CType<'t>> {
        support::child_after(self.0, TokenKind::Equals)
    }

    pub fn is_family(&self) -> bool {
        support::has_word(self.0, "family")
    }

    pub fn is_instance(&self) -> bool {
        self.0.child_token(TokenKind::InstanceKw).is_some()
    }
}

impl<'t> TypeEqn<'t> {
    pub fn lhs(&self) -> Result<CType<'t>, MissingChild> {
        support::required(support::child_before(self.0, &[TokenKind::Equals]), self.0, "lhs")
    }

    pub fn rhs(&self) -> Result<CType<'t>, MissingChild> {
        support::required(support::child_after(self.0, TokenKind::Equals), self.0, "rhs")
    }
}

impl<'t> Deriving<'t> {
    /// Derived classes, excluding a `via` type.
    pub fn classes(&self) -> impl Iterator<Item = Type<'t>> + 't {
        support::children::<Type>(self.0).filter(|t| t.kind() != SyntaxKind::CType)
    }

    /// `stock`, `newtype`, `anyclass` or `via`.
    pub fn strategy(&self) -> Option<SyntaxToken<'t>> {
        self.0.child_tokens().find(|t| {
            t.kind() == TokenKind::NewtypeKw
                || (t.kind() == TokenKind::VarId
                    && matches!(t.text(), "stock" | "anyclass" | "via"))
        })
    }
}

impl<'t> DerivingDecl<'t> {
    pub fn strategy(&self) -> Option<SyntaxToken<'t>> {
        self.0.child_tokens().find(|t| {
            t.kind() == TokenKind::NewtypeKw
                || (t.kind() == TokenKind::VarId && matches!(t.text(), "stock" | "anyclass"))
        })
    }
}

impl<'t> FunDep<'t> {
    /// Variables left of `->`.
    pub fn from(&self) -> impl Iterator<Item = TyVar<'t>> + 't {
        self.0
            .children()
            .take_while(|e| e.into_token().map_or(true, |t| t.kind() != TokenKind::RightArrow))
            .filter_map(|e| e.into_node())
            .filter_map(TyVar::cast)
    }

    /// Variables right of `->`.
    pub fn to(&self) -> impl Iterator<Item = TyVar<'t>> + 't {
        self.0
            .children()
            .skip_while(|e| e.into_token().map_or(true, |t| t.kind() != TokenKind::RightArrow))
            .filter_map(|e| e.into_node())
            .filter_map(TyVar::cast)
    }
}

impl<'t> FixityDecl<'t> {
    pub fn keyword(&self) -> Option<SyntaxToken<'t>> {
        self.0.child_tokens().find(|t| {
            matches!(
                t.kind(),
                TokenKind::InfixKw | TokenKind::InfixlKw | TokenKind::InfixrKw
            )
        })
    }

    pub fn precedence_value(&self) -> Option<u8> {
        self.precedence().and_then(|t| t.text().parse().ok())
    }
}

impl<'t> ForeignDecl<'t> {
    pub fn is_import(&self) -> bool {
        self.0.child_token(TokenKind::ImportKw).is_some()
    }

    /// Calling convention, e.g. `ccall`.
    pub fn calling_convention(&self) -> Option<SyntaxToken<'t>> {
        self.0
            .child_tokens()
            .find(|t| t.kind() == TokenKind::VarId && !matches!(t.text(), "export" | "safe" | "unsafe" | "interruptible"))
    }
}

impl<'t> CType<'t> {
    pub fn has_forall(&self) -> bool {
        self.forall_token().is_some()
    }
}

impl<'t> Context<'t> {
    /// Individual constraints: the elements of a tuple context, or the
    /// single constraint otherwise.
    pub fn constraints(&self) -> Vec<Type<'t>> {
        let Some(inner) = support::child::<Type>(self.0) else {
            return Vec::new();
        };
        match TupleType::cast(inner.syntax()) {
            Some(tuple) => tuple.elements().collect(),
            None => vec![inner],
        }
    }
}

impl<'t> FunType<'t> {
    pub fn param(&self) -> Result<Type<'t>, MissingChild> {
        support::required(support::child(self.0), self.0, "param")
    }

    pub fn result(&self) -> Result<Type<'t>, MissingChild> {
        support::required(support::child_after(self.0, TokenKind::RightArrow), self.0, "result")
    }
}

impl<'t> AppType<'t> {
    pub fn head(&self) -> Result<Type<'t>, MissingChild> {
        support::required(support::child(self.0), self.0, "head")
    }

    pub fn args(&self) -> impl Iterator<Item = Type<'t>> + 't {
        support::children(self.0).skip(1)
    }
}

impl<'t> KindSig<'t> {
    pub fn ty(&self) -> Result<Type<'t>, MissingChild> {
        support::required(support::child(self.0), self.0, "ty")
    }

    pub fn kind_sig(&self) -> Result<Type<'t>, MissingChild> {
        support::required(support::child_after(self.0, TokenKind::DoubleColon), self.0, "kind_sig")
    }
}

impl<'t> TyCon<'t> {
    /// Constructor name without parentheses or module path.
    pub fn name(&self) -> Option<&'t str> {
        if let Some(sym) = support::child::<QConSym>(self.0) {
            return Some(sym.name());
        }
        if let Some(special) = support::child::<SpecialCon>(self.0) {
            return Some(special.syntax().text());
        }
        self.0
            .child_tokens()
            .find(|t| matches!(t.kind(), TokenKind::ConId | TokenKind::QConId))
            .map(|t| split_qualified(t.text()).1)
    }
}

impl<'t> TypeLit<'t> {
    pub fn token(&self) -> Result<SyntaxToken<'t>, MissingChild> {
        support::required(support::first_significant(self.0), self.0, "token")
    }
}

impl<'t> IfExp<'t> {
    pub fn condition(&self) -> Result<Exp<'t>, MissingChild> {
        support::required(support::child_after(self.0, TokenKind::IfKw), self.0, "condition")
    }

    pub fn then_branch(&self) -> Result<Exp<'t>, MissingChild> {
        support::required(support::child_after(self.0, TokenKind::ThenKw), self.0, "then_branch")
    }

    pub fn else_branch(&self) -> Result<Exp<'t>, MissingChild> {
        support::required(support::child_after(self.0, TokenKind::ElseKw), self.0, "else_branch")
    }
}

impl<'t> AppExp<'t> {
    pub fn function(&self) -> Result<Exp<'t>, MissingChild> {
        support::required(support::child(self.0), self.0, "function")
    }

    /// Value arguments, in order.
    pub fn args(&self) -> impl Iterator<Item = Exp<'t>> + 't {
        support::children(self.0).skip(1)
    }
}

impl<'t> ArithSeq<'t> {
    pub fn from(&self) -> Result<Exp<'t>, MissingChild> {
        support::required(support::child(self.0), self.0, "from")
    }

    /// The second element of `[a, b ..]`.
    pub fn then(&self) -> Option<Exp<'t>> {
        support::child_after(self.0, TokenKind::Comma)
            .filter(|e: &Exp<'t>| self.dotdot().map_or(true, |d| e.span().end <= d.span().start))
    }

    pub fn to(&self) -> Option<Exp<'t>> {
        support::child_after(self.0, TokenKind::DotDot)
    }
}

impl<'t> FieldBind<'t> {
    pub fn value(&self) -> Option<Exp<'t>> {
        support::child_after(self.0, TokenKind::Equals)
    }

    /// `C { x }` binds `x` to the variable of the same name.
    pub fn is_pun(&self) -> bool {
        self.0.child_token(TokenKind::Equals).is_none()
    }
}

/// An element of a flat operator chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixElement<'t> {
    Operand(Exp<'t>),
    Operator(Op<'t>),
    /// Prefix `-`
    Negate(SyntaxToken<'t>),
}

impl<'t> InfixExp<'t> {
    pub fn elements(&self) -> impl Iterator<Item = InfixElement<'t>> + 't {
        self.0.children().filter_map(|element| {
            if let Some(node) = element.into_node() {
                if let Some(op) = Op::cast(node) {
                    return Some(InfixElement::Operator(op));
                }
                return Exp::cast(node).map(InfixElement::Operand);
            }
            element
                .into_token()
                .filter(|t| t.kind() == TokenKind::Minus)
                .map(InfixElement::Negate)
        })
    }

    pub fn operands(&self) -> impl Iterator<Item = Exp<'t>> + 't {
        support::children(self.0)
    }

    pub fn operators(&self) -> impl Iterator<Item = Op<'t>> + 't {
        support::children(self.0)
    }
}

impl<'t> Literal<'t> {
    pub fn token(&self) -> Result<SyntaxToken<'t>, MissingChild> {
        support::required(support::first_significant(self.0), self.0, "token")
    }

    /// Decoded value of the literal.
    pub fn value(&self) -> Result<LiteralValue, LiteralError> {
        let token = self.token().map_err(|_| LiteralError::MalformedNumber)?;
        let text = token.text();
        match token.kind() {
            TokenKind::Integer => literal::decode_integer(text).map(LiteralValue::Integer),
            TokenKind::Float => literal::decode_float(text).map(LiteralValue::Float),
            TokenKind::Char => literal::decode_char(text).map(LiteralValue::Char),
            TokenKind::String => literal::decode_string(text).map(LiteralValue::String),
            _ => Err(LiteralError::MalformedNumber),
        }
    }
}

impl<'t> CabalField<'t> {
    pub fn name_text(&self) -> Option<&'t str> {
        self.name().ok().map(|t| t.text())
    }

    /// Value text with continuation lines joined and surrounding space
    /// trimmed.
    pub fn value_text(&self) -> String {
        self.value()
            .map(|v| {
                v.syntax()
                    .significant_tokens()
                    .map(|t| t.text())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }
}

impl<'t> CabalSection<'t> {
    /// Section name, e.g. `foo` in `executable foo`.
    pub fn name(&self) -> Option<&'t str> {
        self.args().map(|a| a.syntax().text().trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("Data.Map.!"), (Some("Data.Map"), "!"));
        assert_eq!(split_qualified("Data.Map.Map"), (Some("Data.Map"), "Map"));
        assert_eq!(split_qualified("M.lookup"), (Some("M"), "lookup"));
        assert_eq!(split_qualified("M.."), (Some("M"), "."));
        assert_eq!(split_qualified("Prelude.:|"), (Some("Prelude"), ":|"));
        assert_eq!(split_qualified("Maybe"), (None, "Maybe"));
        assert_eq!(split_qualified("<$>"), (None, "<$>"));
    }

    #[test]
    fn test_slot_tables() {
        let roles: Vec<_> = slots(SyntaxKind::IfExp).iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec!["if_token", "condition", "then_token", "then_branch", "else_token", "else_branch"]
        );
        assert!(slots(SyntaxKind::Error).is_empty());
        let ctype = CType::SLOTS;
        assert_eq!(ctype.last().map(|s| s.arity), Some(Arity::Required));
    }
}
