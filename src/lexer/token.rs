use std::fmt;

use thiserror::Error;

use crate::span::{SourcePos, Span};

/// Terminal symbols of the Haskell and Cabal grammars.
///
/// Tokens carry no payload: the text is always recovered from the source via
/// the token span, which keeps tokens `Copy` and the tree lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    // Trivia
    Whitespace,
    LineComment,
    BlockComment,
    DocComment,

    // Annotations
    Pragma,

    // Keywords
    CaseKw,
    ClassKw,
    DataKw,
    DefaultKw,
    DerivingKw,
    DoKw,
    ElseKw,
    ForallKw,
    ForeignKw,
    IfKw,
    ImportKw,
    InKw,
    InfixKw,
    InfixlKw,
    InfixrKw,
    InstanceKw,
    LetKw,
    ModuleKw,
    NewtypeKw,
    OfKw,
    ThenKw,
    TypeKw,
    WhereKw,
    Underscore,

    // Identifiers
    VarId,        // foo, x'
    ConId,        // Maybe
    QVarId,       // Data.Map.lookup
    QConId,       // Data.Map.Map
    VarSym,       // +, <$>, >>=
    ConSym,       // :|, :+:
    QVarSym,      // Data.Map.!
    QConSym,      // Data.List.NonEmpty.:|

    // Literals
    Integer,
    Float,
    Char,
    String,

    // Reserved operators
    DotDot,       // ..
    Colon,        // :
    DoubleColon,  // :: ∷
    Equals,       // =
    Backslash,    // \
    Pipe,         // |
    LeftArrow,    // <- ←
    RightArrow,   // -> →
    At,           // @
    Tilde,        // ~
    FatArrow,     // => ⇒

    // Variable symbols the grammar gives extra meaning to
    Minus,        // -
    Bang,         // !
    Dot,          // .

    // Special
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Backtick,
    Quote,        // ' (promotion tick)

    // Layout tokens (inserted by the layout resolver, zero width)
    VLBrace,
    VSemi,
    VRBrace,

    // Cabal package descriptions
    CabalFieldName,
    CabalSectionKw,
    CabalIfKw,
    CabalElseKw,
    CabalText,
    CabalVersion,
    CabalOperator,

    Error,
    Eof,
}

impl TokenKind {
    /// Whitespace and comments: preserved in the tree, invisible to layout
    /// and grammar.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::DocComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment
        )
    }

    /// Returns true if this token is a layout keyword
    pub fn is_layout_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::WhereKw | TokenKind::LetKw | TokenKind::DoKw | TokenKind::OfKw
        )
    }

    pub fn is_virtual(self) -> bool {
        matches!(
            self,
            TokenKind::VLBrace | TokenKind::VSemi | TokenKind::VRBrace | TokenKind::Eof
        )
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::CaseKw
                | TokenKind::ClassKw
                | TokenKind::DataKw
                | TokenKind::DefaultKw
                | TokenKind::DerivingKw
                | TokenKind::DoKw
                | TokenKind::ElseKw
                | TokenKind::ForallKw
                | TokenKind::ForeignKw
                | TokenKind::IfKw
                | TokenKind::ImportKw
                | TokenKind::InKw
                | TokenKind::InfixKw
                | TokenKind::InfixlKw
                | TokenKind::InfixrKw
                | TokenKind::InstanceKw
                | TokenKind::LetKw
                | TokenKind::ModuleKw
                | TokenKind::NewtypeKw
                | TokenKind::OfKw
                | TokenKind::ThenKw
                | TokenKind::TypeKw
                | TokenKind::WhereKw
                | TokenKind::Underscore
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Integer | TokenKind::Float | TokenKind::Char | TokenKind::String
        )
    }

    /// Unqualified variable symbols, including the ones lexed separately.
    pub fn is_varsym(self) -> bool {
        matches!(
            self,
            TokenKind::VarSym | TokenKind::Minus | TokenKind::Bang | TokenKind::Dot
        )
    }

    pub fn is_reserved_operator(self) -> bool {
        matches!(
            self,
            TokenKind::DotDot
                | TokenKind::Colon
                | TokenKind::DoubleColon
                | TokenKind::Equals
                | TokenKind::Backslash
                | TokenKind::Pipe
                | TokenKind::LeftArrow
                | TokenKind::RightArrow
                | TokenKind::At
                | TokenKind::Tilde
                | TokenKind::FatArrow
        )
    }

    pub fn is_open_brace(self) -> bool {
        matches!(self, TokenKind::LBrace | TokenKind::VLBrace)
    }

    pub fn is_close_brace(self) -> bool {
        matches!(self, TokenKind::RBrace | TokenKind::VRBrace)
    }

    pub fn is_separator(self) -> bool {
        matches!(self, TokenKind::Semicolon | TokenKind::VSemi)
    }

    /// Human-readable description for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => "comment",
            TokenKind::Pragma => "pragma",
            TokenKind::CaseKw => "`case`",
            TokenKind::ClassKw => "`class`",
            TokenKind::DataKw => "`data`",
            TokenKind::DefaultKw => "`default`",
            TokenKind::DerivingKw => "`deriving`",
            TokenKind::DoKw => "`do`",
            TokenKind::ElseKw => "`else`",
            TokenKind::ForallKw => "`forall`",
            TokenKind::ForeignKw => "`foreign`",
            TokenKind::IfKw => "`if`",
            TokenKind::ImportKw => "`import`",
            TokenKind::InKw => "`in`",
            TokenKind::InfixKw => "`infix`",
            TokenKind::InfixlKw => "`infixl`",
            TokenKind::InfixrKw => "`infixr`",
            TokenKind::InstanceKw => "`instance`",
            TokenKind::LetKw => "`let`",
            TokenKind::ModuleKw => "`module`",
            TokenKind::NewtypeKw => "`newtype`",
            TokenKind::OfKw => "`of`",
            TokenKind::ThenKw => "`then`",
            TokenKind::TypeKw => "`type`",
            TokenKind::WhereKw => "`where`",
            TokenKind::Underscore => "`_`",
            TokenKind::VarId => "variable name",
            TokenKind::ConId => "constructor name",
            TokenKind::QVarId => "qualified variable name",
            TokenKind::QConId => "qualified constructor name",
            TokenKind::VarSym => "operator",
            TokenKind::ConSym => "constructor operator",
            TokenKind::QVarSym => "qualified operator",
            TokenKind::QConSym => "qualified constructor operator",
            TokenKind::Integer => "integer literal",
            TokenKind::Float => "floating-point literal",
            TokenKind::Char => "character literal",
            TokenKind::String => "string literal",
            TokenKind::DotDot => "`..`",
            TokenKind::Colon => "`:`",
            TokenKind::DoubleColon => "`::`",
            TokenKind::Equals => "`=`",
            TokenKind::Backslash => "`\\`",
            TokenKind::Pipe => "`|`",
            TokenKind::LeftArrow => "`<-`",
            TokenKind::RightArrow => "`->`",
            TokenKind::At => "`@`",
            TokenKind::Tilde => "`~`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::Minus => "`-`",
            TokenKind::Bang => "`!`",
            TokenKind::Dot => "`.`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Backtick => "`` ` ``",
            TokenKind::Quote => "`'`",
            TokenKind::VLBrace => "start of layout block",
            TokenKind::VSemi => "new line in layout block",
            TokenKind::VRBrace => "end of layout block",
            TokenKind::CabalFieldName => "field name",
            TokenKind::CabalSectionKw => "section keyword",
            TokenKind::CabalIfKw => "`if`",
            TokenKind::CabalElseKw => "`else`",
            TokenKind::CabalText => "field text",
            TokenKind::CabalVersion => "version number",
            TokenKind::CabalOperator => "operator",
            TokenKind::Error => "unrecognised input",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Lexical problems. The tokenizer never stops on these: the offending text
/// still becomes a token (of kind [`TokenKind::Error`] or the literal kind it
/// was meant to be) carrying the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Error)]
pub enum LexErrorKind {
    #[default]
    #[error("unrecognised character")]
    UnrecognizedCharacter,
    #[error("unterminated block comment")]
    UnterminatedBlockComment,
    #[error("unterminated pragma")]
    UnterminatedPragma,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence in string literal")]
    InvalidStringEscape,
    #[error("invalid character literal")]
    InvalidCharLiteral,
}

impl LexErrorKind {
    /// The token kind the malformed text is classified as.
    pub fn recovered_kind(self) -> TokenKind {
        match self {
            LexErrorKind::UnterminatedString | LexErrorKind::InvalidStringEscape => TokenKind::String,
            LexErrorKind::InvalidCharLiteral => TokenKind::Char,
            LexErrorKind::UnrecognizedCharacter
            | LexErrorKind::UnterminatedBlockComment
            | LexErrorKind::UnterminatedPragma => TokenKind::Error,
        }
    }
}

/// A lexical token with its source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-indexed line of the first character
    pub line: u32,
    /// 1-indexed layout column of the first character
    pub column: u32,
    pub error: Option<LexErrorKind>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, pos: SourcePos) -> Self {
        Self {
            kind,
            span,
            line: pos.line,
            column: pos.column,
            error: None,
        }
    }

    /// A zero-width token synthesized at `anchor`'s position.
    pub fn synthetic(kind: TokenKind, anchor: &Token) -> Self {
        Self {
            kind,
            span: Span::empty(anchor.span.start),
            line: anchor.line,
            column: anchor.column,
            error: None,
        }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.text(source)
    }

    pub fn pos(&self) -> SourcePos {
        SourcePos {
            line: self.line,
            column: self.column,
        }
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Tokens the layout resolver and grammar never see.
    pub fn is_layout_transparent(&self) -> bool {
        self.kind.is_trivia() || self.kind == TokenKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(TokenKind::LineComment.is_trivia());
        assert!(!TokenKind::Pragma.is_trivia());
        assert!(TokenKind::OfKw.is_layout_keyword());
        assert!(!TokenKind::CaseKw.is_layout_keyword());
        assert!(TokenKind::Minus.is_varsym());
        assert!(TokenKind::Tilde.is_reserved_operator());
        assert!(TokenKind::VSemi.is_virtual());
    }

    #[test]
    fn test_recovered_kind() {
        assert_eq!(LexErrorKind::InvalidStringEscape.recovered_kind(), TokenKind::String);
        assert_eq!(LexErrorKind::UnterminatedPragma.recovered_kind(), TokenKind::Error);
    }

    #[test]
    fn test_synthetic_token_is_zero_width() {
        let anchor = Token::new(TokenKind::VarId, Span::new(4, 7), SourcePos { line: 2, column: 3 });
        let semi = Token::synthetic(TokenKind::VSemi, &anchor);
        assert_eq!(semi.span, Span::empty(4));
        assert_eq!(semi.column, 3);
    }
}
