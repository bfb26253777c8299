use logos::Logos;

use crate::lexer::literal;
use crate::lexer::token::{LexErrorKind, Token, TokenKind};
use crate::span::{LineIndex, SourcePos, Span};

/// Raw tokens from the Logos lexer (before layout processing).
///
/// Unlike a compiler front end, nothing is skipped: whitespace and comments
/// come out as tokens so the tree can reproduce the source byte for byte.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
pub enum RawToken {
    #[regex(r"[ \t\r\n\f\x0B]+")]
    Whitespace,

    // `--` starts a comment only when the dashes are not part of a longer
    // operator such as `-->` or `--|`.
    #[regex(r"--+([^!#$%&*+./<=>?@\\^|~:\-\p{Sm}\p{So}\n][^\n]*)?", priority = 3)]
    LineComment,

    // Haddock: -- | doc, -- ^ doc, -- $ named chunk, -- * section
    #[regex(r"--[ \t]+[|^$*][^\n]*", priority = 4)]
    #[token("{-|", lex_block_comment)]
    DocComment,

    // Block comments (handled by callback for nesting)
    #[token("{-", lex_block_comment)]
    BlockComment,

    #[token("{-#", lex_pragma)]
    Pragma,

    // Keywords
    #[token("case")]
    Case,
    #[token("class")]
    Class,
    #[token("data")]
    Data,
    #[token("default")]
    Default,
    #[token("deriving")]
    Deriving,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("forall")]
    #[token("∀")]
    Forall,
    #[token("foreign")]
    Foreign,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("in")]
    In,
    #[token("infix")]
    Infix,
    #[token("infixl")]
    Infixl,
    #[token("infixr")]
    Infixr,
    #[token("instance")]
    Instance,
    #[token("let")]
    Let,
    #[token("module")]
    Module,
    #[token("newtype")]
    Newtype,
    #[token("of")]
    Of,
    #[token("then")]
    Then,
    #[token("type")]
    Type,
    #[token("where")]
    Where,
    #[token("_", priority = 3)]
    Underscore,

    // Identifiers - lowercase starting (excluding lone underscore)
    #[regex(r"[a-z\p{Ll}\p{Lo}][a-zA-Z0-9_'\p{L}]*")]
    #[regex(r"_[a-zA-Z0-9_'\p{L}]+")]
    VarId,

    // Identifiers - uppercase starting (types, constructors, modules)
    #[regex(r"[A-Z\p{Lu}][a-zA-Z0-9_'\p{L}]*")]
    ConId,

    // Qualified names: one token, the module prefix is split off by the tree
    #[regex(r"([A-Z\p{Lu}][a-zA-Z0-9_'\p{L}]*\.)+[a-z_\p{Ll}\p{Lo}][a-zA-Z0-9_'\p{L}]*")]
    QVarId,
    #[regex(r"([A-Z\p{Lu}][a-zA-Z0-9_'\p{L}]*\.)+[A-Z\p{Lu}][a-zA-Z0-9_'\p{L}]*")]
    QConId,
    #[regex(
        r"([A-Z\p{Lu}][a-zA-Z0-9_'\p{L}]*\.)+[!#$%&*+./<=>?@\\^|~\-\p{Sm}\p{So}][!#$%&*+./<=>?@\\^|~:\-\p{Sm}\p{So}]*"
    )]
    QVarSym,
    #[regex(r"([A-Z\p{Lu}][a-zA-Z0-9_'\p{L}]*\.)+:[!#$%&*+./<=>?@\\^|~:\-\p{Sm}\p{So}]*")]
    QConSym,

    // Operators - sequences of operator characters (lower priority than specific tokens)
    #[regex(
        r"[!#$%&*+./<=>?@\\^|~\-\p{Sm}\p{So}][!#$%&*+./<=>?@\\^|~:\-\p{Sm}\p{So}]*",
        priority = 1
    )]
    VarSym,
    #[regex(r":[!#$%&*+./<=>?@\\^|~:\-\p{Sm}\p{So}]*", priority = 1)]
    ConSym,

    // Numeric literals (support _ separators). Negative literals are not
    // handled here: `-42` lexes as Minus + Integer.
    #[regex(r"[0-9][0-9_]*")]
    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*")]
    #[regex(r"0[oO][0-7][0-7_]*")]
    #[regex(r"0[bB][01][01_]*")]
    Integer,

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9][0-9_]*)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9][0-9_]*")]
    Float,

    // Character literals; escapes are validated by the callback
    #[regex(r"'([^'\\\n]|\\[^\n][^'\n]*)'", lex_char)]
    Char,

    #[token("\"", lex_string)]
    String,

    // Reserved operators
    #[token("..")]
    DotDot,
    #[token(":", priority = 2)]
    Colon,
    #[token("::")]
    #[token("∷")]
    DoubleColon,
    #[token("=", priority = 2)]
    Equals,
    #[token("\\", priority = 2)]
    Backslash,
    #[token("|", priority = 2)]
    Pipe,
    #[token("<-")]
    #[token("←")]
    LeftArrow,
    #[token("->")]
    #[token("→")]
    RightArrow,
    #[token("@", priority = 2)]
    At,
    #[token("~", priority = 2)]
    Tilde,
    #[token("=>")]
    #[token("⇒")]
    FatArrow,
    #[token("-", priority = 2)]
    Minus,
    #[token("!", priority = 2)]
    Bang,
    #[token(".", priority = 2)]
    Dot,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("`")]
    Backtick,
    #[token("'")]
    Quote,
}

/// Lex nested block comments: {- outer {- inner -} outer -}
fn lex_block_comment(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let remainder = lex.remainder();
    let bytes = remainder.as_bytes();
    let mut depth = 1;
    let mut pos = 0;

    while pos < bytes.len() {
        match (bytes[pos], bytes.get(pos + 1)) {
            (b'{', Some(b'-')) => {
                depth += 1;
                pos += 2;
            }
            (b'-', Some(b'}')) => {
                depth -= 1;
                pos += 2;
                if depth == 0 {
                    lex.bump(pos);
                    return Ok(());
                }
            }
            _ => pos += 1,
        }
    }

    // Unclosed: the comment swallows the rest of the input
    lex.bump(remainder.len());
    Err(LexErrorKind::UnterminatedBlockComment)
}

fn lex_pragma(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let remainder = lex.remainder();
    match remainder.find("#-}") {
        Some(end) => {
            lex.bump(end + 3);
            Ok(())
        }
        None => {
            lex.bump(remainder.len());
            Err(LexErrorKind::UnterminatedPragma)
        }
    }
}

fn lex_char(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    literal::decode_char(lex.slice())
        .map(|_| ())
        .map_err(|_| LexErrorKind::InvalidCharLiteral)
}

/// Scan a string literal after its opening quote. Stops at the closing quote,
/// or before the end of the line when the string is unterminated.
fn lex_string(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let rest = lex.remainder();
    let mut error = None;
    let mut i = 0;

    loop {
        let Some(c) = rest[i..].chars().next() else {
            lex.bump(i);
            return Err(LexErrorKind::UnterminatedString);
        };
        match c {
            '"' => {
                lex.bump(i + 1);
                return error.map_or(Ok(()), Err);
            }
            '\n' => {
                lex.bump(i);
                return Err(LexErrorKind::UnterminatedString);
            }
            '\\' => {
                let after = &rest[i + 1..];
                if let Some(gap) = literal::scan_gap(after) {
                    i += 1 + gap;
                } else if let Some(len) = literal::scan_escape(after) {
                    i += 1 + len;
                } else {
                    error = Some(LexErrorKind::InvalidStringEscape);
                    i += 1;
                }
            }
            _ => i += c.len_utf8(),
        }
    }
}

impl RawToken {
    pub fn kind(self) -> TokenKind {
        match self {
            RawToken::Whitespace => TokenKind::Whitespace,
            RawToken::LineComment => TokenKind::LineComment,
            RawToken::DocComment => TokenKind::DocComment,
            RawToken::BlockComment => TokenKind::BlockComment,
            RawToken::Pragma => TokenKind::Pragma,
            RawToken::Case => TokenKind::CaseKw,
            RawToken::Class => TokenKind::ClassKw,
            RawToken::Data => TokenKind::DataKw,
            RawToken::Default => TokenKind::DefaultKw,
            RawToken::Deriving => TokenKind::DerivingKw,
            RawToken::Do => TokenKind::DoKw,
            RawToken::Else => TokenKind::ElseKw,
            RawToken::Forall => TokenKind::ForallKw,
            RawToken::Foreign => TokenKind::ForeignKw,
            RawToken::If => TokenKind::IfKw,
            RawToken::Import => TokenKind::ImportKw,
            RawToken::In => TokenKind::InKw,
            RawToken::Infix => TokenKind::InfixKw,
            RawToken::Infixl => TokenKind::InfixlKw,
            RawToken::Infixr => TokenKind::InfixrKw,
            RawToken::Instance => TokenKind::InstanceKw,
            RawToken::Let => TokenKind::LetKw,
            RawToken::Module => TokenKind::ModuleKw,
            RawToken::Newtype => TokenKind::NewtypeKw,
            RawToken::Of => TokenKind::OfKw,
            RawToken::Then => TokenKind::ThenKw,
            RawToken::Type => TokenKind::TypeKw,
            RawToken::Where => TokenKind::WhereKw,
            RawToken::Underscore => TokenKind::Underscore,
            RawToken::VarId => TokenKind::VarId,
            RawToken::ConId => TokenKind::ConId,
            RawToken::QVarId => TokenKind::QVarId,
            RawToken::QConId => TokenKind::QConId,
            RawToken::QVarSym => TokenKind::QVarSym,
            RawToken::QConSym => TokenKind::QConSym,
            RawToken::VarSym => TokenKind::VarSym,
            RawToken::ConSym => TokenKind::ConSym,
            RawToken::Integer => TokenKind::Integer,
            RawToken::Float => TokenKind::Float,
            RawToken::Char => TokenKind::Char,
            RawToken::String => TokenKind::String,
            RawToken::DotDot => TokenKind::DotDot,
            RawToken::Colon => TokenKind::Colon,
            RawToken::DoubleColon => TokenKind::DoubleColon,
            RawToken::Equals => TokenKind::Equals,
            RawToken::Backslash => TokenKind::Backslash,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::LeftArrow => TokenKind::LeftArrow,
            RawToken::RightArrow => TokenKind::RightArrow,
            RawToken::At => TokenKind::At,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::FatArrow => TokenKind::FatArrow,
            RawToken::Minus => TokenKind::Minus,
            RawToken::Bang => TokenKind::Bang,
            RawToken::Dot => TokenKind::Dot,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Backtick => TokenKind::Backtick,
            RawToken::Quote => TokenKind::Quote,
        }
    }
}

/// Lazy tokenizer over Haskell source.
///
/// Every byte of the input ends up in exactly one token. The tokenizer keeps
/// no state besides its position, so it can be restarted at any token
/// boundary with [`Tokenizer::starting_at`].
pub struct Tokenizer<'s> {
    source: &'s str,
    inner: logos::Lexer<'s, RawToken>,
    base: usize,
    pos: SourcePos,
}

impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            inner: RawToken::lexer(source),
            base: 0,
            pos: SourcePos::START,
        }
    }

    /// Resume tokenizing at byte `offset`, moved back to the start of the
    /// character it falls in. Restarting anywhere but a token boundary lexes
    /// the tail as if it were a file of its own.
    pub fn starting_at(source: &'s str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let pos = LineIndex::new(source).pos(source, offset);
        Self {
            source,
            inner: RawToken::lexer(&source[offset..]),
            base: offset,
            pos,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }
}

impl<'s> Iterator for Tokenizer<'s> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let result = self.inner.next()?;

        // An unrecognised multi-byte character must be covered entirely
        let local = self.inner.span();
        let sub = self.inner.source();
        let mut end = local.end;
        while end < sub.len() && !sub.is_char_boundary(end) {
            end += 1;
        }
        if end > local.end {
            self.inner.bump(end - local.end);
        }

        let span = Span::new(local.start, end).shift(self.base);
        let (kind, error) = match result {
            Ok(raw) => (raw.kind(), None),
            Err(error) => (error.recovered_kind(), Some(error)),
        };
        let token = Token {
            kind,
            span,
            line: self.pos.line,
            column: self.pos.column,
            error,
        };
        self.pos.advance_str(span.text(self.source));
        Some(token)
    }
}

/// Tokenize the whole source, trivia included.
pub fn lex(source: &str) -> Vec<Token> {
    Tokenizer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords() {
        let source = "module import where let in do case of";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::ModuleKw,
                TokenKind::ImportKw,
                TokenKind::WhereKw,
                TokenKind::LetKw,
                TokenKind::InKw,
                TokenKind::DoKw,
                TokenKind::CaseKw,
                TokenKind::OfKw,
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        let source = "foo Bar myVar MyType _underscore var' _";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::VarId,
                TokenKind::ConId,
                TokenKind::VarId,
                TokenKind::ConId,
                TokenKind::VarId,
                TokenKind::VarId,
                TokenKind::Underscore,
            ]
        );
    }

    #[test]
    fn test_qualified_names() {
        let source = "Data.Map.lookup Data.Map.Map Data.Map.! NE.:| M.x";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::QVarId,
                TokenKind::QConId,
                TokenKind::QVarSym,
                TokenKind::QConSym,
                TokenKind::QVarId,
            ]
        );
    }

    #[test]
    fn test_composition_is_not_qualification() {
        assert_eq!(
            kinds("Just . f"),
            vec![TokenKind::ConId, TokenKind::Dot, TokenKind::VarId]
        );
    }

    #[test]
    fn test_operators() {
        let source = "+ - * == :: -> => <- .. : :| ~ @ ! . \\ |";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::VarSym,
                TokenKind::Minus,
                TokenKind::VarSym,
                TokenKind::VarSym,
                TokenKind::DoubleColon,
                TokenKind::RightArrow,
                TokenKind::FatArrow,
                TokenKind::LeftArrow,
                TokenKind::DotDot,
                TokenKind::Colon,
                TokenKind::ConSym,
                TokenKind::Tilde,
                TokenKind::At,
                TokenKind::Bang,
                TokenKind::Dot,
                TokenKind::Backslash,
                TokenKind::Pipe,
            ]
        );
    }

    #[test]
    fn test_unicode_syntax() {
        assert_eq!(
            kinds("∀ a. a ∷ a → a"),
            vec![
                TokenKind::ForallKw,
                TokenKind::VarId,
                TokenKind::Dot,
                TokenKind::VarId,
                TokenKind::DoubleColon,
                TokenKind::VarId,
                TokenKind::RightArrow,
                TokenKind::VarId,
            ]
        );
    }

    #[test]
    fn test_dashes() {
        assert_eq!(kinds("x --> y"), vec![TokenKind::VarId, TokenKind::VarSym, TokenKind::VarId]);
        assert_eq!(kinds("x -- y"), vec![TokenKind::VarId, TokenKind::LineComment]);
        assert_eq!(kinds("---- banner"), vec![TokenKind::LineComment]);
        assert_eq!(kinds("-- | docs"), vec![TokenKind::DocComment]);
    }

    #[test]
    fn test_literals() {
        let source = r#"42 3.14 1e10 0xFF 0o17 0b1010 1_000 "hello" 'c' '\n'"#;
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::String,
                TokenKind::Char,
                TokenKind::Char,
            ]
        );
    }

    #[test]
    fn test_enum_range_is_not_float() {
        assert_eq!(
            kinds("[1..10]"),
            vec![
                TokenKind::LBracket,
                TokenKind::Integer,
                TokenKind::DotDot,
                TokenKind::Integer,
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_comments_and_pragmas() {
        let source = "{-# LANGUAGE GADTs #-}\n{- outer {- inner -} still outer -} foo";
        assert_eq!(
            kinds(source),
            vec![TokenKind::Pragma, TokenKind::BlockComment, TokenKind::VarId]
        );
    }

    #[test]
    fn test_unterminated_comment_covers_rest() {
        let source = "x {- never closed\nfoo";
        let tokens = lex(source);
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Error);
        assert_eq!(last.error, Some(LexErrorKind::UnterminatedBlockComment));
        assert_eq!(last.span.end, source.len());
    }

    #[test]
    fn test_invalid_escape_keeps_string_kind() {
        let tokens = lex(r#"x = "bad \q escape""#);
        let string = tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string.error, Some(LexErrorKind::InvalidStringEscape));
        assert_eq!(string.span.end, 19);
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let source = "x = \"open\ny = 1";
        let tokens = lex(source);
        let string = tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string.error, Some(LexErrorKind::UnterminatedString));
        assert_eq!(string.span.text(source), "\"open");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Integer));
    }

    #[test]
    fn test_unrecognized_character() {
        let source = "a § b";
        let tokens = lex(source);
        let error = tokens.iter().find(|t| t.kind == TokenKind::Error).unwrap();
        assert_eq!(error.span.text(source), "§");
        assert_eq!(error.error, Some(LexErrorKind::UnrecognizedCharacter));
        assert_eq!(tokens.last().unwrap().kind, TokenKind::VarId);
    }

    #[test]
    fn test_promotion_tick() {
        assert_eq!(kinds("'Just"), vec![TokenKind::Quote, TokenKind::ConId]);
    }

    #[test]
    fn test_line_and_column() {
        let tokens: Vec<_> = lex("f x =\n\tx").into_iter().filter(|t| !t.is_trivia()).collect();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 9));
    }

    #[test]
    fn test_tokens_cover_source() {
        let source = "module Test.Example where\n\nimport Data.Maybe (Maybe(..))\n\n-- | Doc\nmain = do\n  let x = 42\n  print $ x + 1\n";
        let tokens = lex(source);
        let rebuilt: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(rebuilt, source);
        for pair in tokens.windows(2) {
            assert_eq!(pair[0].span.end, pair[1].span.start);
        }
    }

    #[test]
    fn test_restart_from_offset() {
        let source = "foo = bar\nbaz = 1";
        let full = lex(source);
        let cut = full[4].span.start;
        let tail: Vec<_> = Tokenizer::starting_at(source, cut).collect();
        assert_eq!(tail, full[4..].to_vec());
    }

    #[test]
    fn test_restart_inside_a_character() {
        let source = "é x";
        let tail: Vec<_> = Tokenizer::starting_at(source, 1).collect();
        assert_eq!(tail[0].span.start, 0);
        assert_eq!(tail, Tokenizer::new(source).collect::<Vec<_>>());
    }
}
