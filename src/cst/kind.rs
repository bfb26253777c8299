/// Node kinds of the concrete syntax tree, one per grammar production.
///
/// Tokens keep their own [`TokenKind`](crate::lexer::TokenKind); a node kind
/// never names a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyntaxKind {
    // Roots
    Module,
    /// Root of a parse started at a non-module entry point
    Fragment,

    // Module structure
    ModuleHeader,
    ModuleName,
    ExportList,
    Export,
    /// `(..)` or `(A, b)` after an exported or imported type
    MemberList,
    ModuleBody,
    ImportDecl,
    ImportList,
    ImportItem,

    // Declarations
    TypeSig,
    FixityDecl,
    FunOrPatDecl,
    FunLhs,
    Rhs,
    GuardedRhs,
    WhereClause,
    DeclBlock,
    DataDecl,
    NewtypeDecl,
    Constr,
    RecordFields,
    FieldDecl,
    GadtConstr,
    Deriving,
    TypeDecl,
    /// Equation of a closed type family
    TypeEqn,
    ClassDecl,
    FunDeps,
    FunDep,
    InstanceDecl,
    DerivingDecl,
    DefaultDecl,
    ForeignDecl,
    Pragma,

    // Types
    CType,
    Context,
    TvBndr,
    FunType,
    AppType,
    InfixType,
    TyCon,
    TyVar,
    TupleType,
    ListType,
    ParenType,
    KindSig,
    BangType,
    LazyType,
    PromotedType,
    TypeLit,
    WildcardType,

    // Expressions
    InfixExp,
    LambdaExp,
    LambdaCaseExp,
    LetExp,
    IfExp,
    CaseExp,
    DoExp,
    AppExp,
    TypeApp,
    TypedExp,
    LeftSection,
    RightSection,
    ParenExp,
    TupleExp,
    ListExp,
    ArithSeq,
    ListComp,
    RecordExp,
    FieldBind,
    HoleExp,
    PragmaExp,
    Literal,

    // Case alternatives and statements
    AltBlock,
    Alt,
    StmtBlock,
    BindStmt,
    LetStmt,
    ExpStmt,

    // Patterns
    VarPat,
    AsPat,
    LazyPat,
    BangPat,
    ConPat,
    InfixPat,
    LitPat,
    TuplePat,
    ListPat,
    RecordPat,
    FieldPat,
    WildPat,
    ParenPat,
    TypedPat,

    // Names
    QVar,
    QCon,
    QVarOp,
    QConOp,
    QVarId,
    QConId,
    QVarSym,
    QConSym,
    /// `()`, `[]`, `(,)`, `(->)`
    SpecialCon,

    // Cabal package descriptions
    CabalFile,
    CabalField,
    CabalFieldValue,
    CabalSection,
    CabalSectionArgs,
    CabalConditional,
    CabalCondition,
    CabalElse,
    CabalBlock,

    /// Input the grammar could not place
    Error,
    /// Placeholder for an abandoned node marker; never appears in a tree
    Tombstone,
}

impl SyntaxKind {
    pub fn is_expression(self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            InfixExp
                | LambdaExp
                | LambdaCaseExp
                | LetExp
                | IfExp
                | CaseExp
                | DoExp
                | AppExp
                | TypedExp
                | LeftSection
                | RightSection
                | ParenExp
                | TupleExp
                | ListExp
                | ArithSeq
                | ListComp
                | RecordExp
                | HoleExp
                | PragmaExp
                | Literal
                | QVar
                | QCon
        )
    }

    pub fn is_type(self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            CType
                | FunType
                | AppType
                | InfixType
                | TyCon
                | TyVar
                | TupleType
                | ListType
                | ParenType
                | KindSig
                | BangType
                | LazyType
                | PromotedType
                | TypeLit
                | WildcardType
        )
    }

    pub fn is_pattern(self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            VarPat
                | AsPat
                | LazyPat
                | BangPat
                | ConPat
                | InfixPat
                | LitPat
                | TuplePat
                | ListPat
                | RecordPat
                | WildPat
                | ParenPat
                | TypedPat
        )
    }

    /// Items of declaration blocks and the module body.
    pub fn is_declaration(self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            TypeSig
                | FixityDecl
                | FunOrPatDecl
                | DataDecl
                | NewtypeDecl
                | TypeDecl
                | TypeEqn
                | ClassDecl
                | InstanceDecl
                | DerivingDecl
                | DefaultDecl
                | ForeignDecl
                | Pragma
                | GadtConstr
        )
    }

    pub fn is_operator(self) -> bool {
        matches!(self, SyntaxKind::QVarOp | SyntaxKind::QConOp)
    }

    pub fn is_statement(self) -> bool {
        matches!(self, SyntaxKind::BindStmt | SyntaxKind::LetStmt | SyntaxKind::ExpStmt)
    }

    /// Nodes whose children are a layout block's items.
    pub fn is_block(self) -> bool {
        use SyntaxKind::*;
        matches!(self, ModuleBody | DeclBlock | AltBlock | StmtBlock | CabalBlock)
    }

    pub fn is_cabal(self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            CabalFile
                | CabalField
                | CabalFieldValue
                | CabalSection
                | CabalSectionArgs
                | CabalConditional
                | CabalCondition
                | CabalElse
                | CabalBlock
        )
    }
}
