//! Line-oriented tokenizer for `.cabal` package descriptions.
//!
//! A Cabal file is classified one line at a time: the first word decides
//! whether a line opens a section, a conditional, a field, or continues the
//! previous field's value. Only the text after that first word is split
//! further, by [`ValueToken`].

use logos::Logos;

use crate::lexer::{LexErrorKind, Token, TokenKind};
use crate::span::{SourcePos, Span};

/// Words that open a section when they start a line. Compared ignoring case.
pub const SECTION_KEYWORDS: &[&str] = &[
    "library",
    "executable",
    "test-suite",
    "benchmark",
    "foreign-library",
    "flag",
    "source-repository",
    "common",
    "custom-setup",
];

/// Tokens inside field values, section arguments and conditions.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
enum ValueToken {
    #[regex(r"[ \t\f\x0B]+")]
    Space,

    #[regex(r"[0-9]+(\.[0-9]+)*(\.\*)?", priority = 5)]
    Version,

    #[regex(r"\^>=|==|>=|<=|>|<|&&|\|\||!")]
    Operator,

    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[regex(r"[^ \t\f\x0B\r\n,:(){}!<>=&|^]+")]
    #[regex(r"[=&|^]", priority = 1)]
    Text,
}

impl ValueToken {
    fn kind(self) -> TokenKind {
        match self {
            ValueToken::Space => TokenKind::Whitespace,
            ValueToken::Version => TokenKind::CabalVersion,
            ValueToken::Operator => TokenKind::CabalOperator,
            ValueToken::Comma => TokenKind::Comma,
            ValueToken::Colon => TokenKind::Colon,
            ValueToken::LParen => TokenKind::LParen,
            ValueToken::RParen => TokenKind::RParen,
            ValueToken::LBrace => TokenKind::LBrace,
            ValueToken::RBrace => TokenKind::RBrace,
            ValueToken::Text => TokenKind::CabalText,
        }
    }
}

/// How a line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Comment,
    Section,
    If,
    Else,
    /// `name:` at the given width of the name.
    Field { name_len: usize },
    /// Indented below a field: more of that field's value.
    Continuation,
    Other,
}

struct CabalLexer<'s> {
    source: &'s str,
    offset: usize,
    pos: SourcePos,
    tokens: Vec<Token>,
    /// Indentation of the field whose value may continue on the next line.
    field_indent: Option<u32>,
}

/// Tokenize a whole package description. Every byte of `source` ends up in
/// exactly one token.
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = CabalLexer {
        source,
        offset: 0,
        pos: SourcePos::START,
        tokens: Vec::new(),
        field_indent: None,
    };
    for line in source.split_inclusive('\n') {
        lexer.line(line);
    }
    log::debug!("lexed {} cabal tokens from {} bytes", lexer.tokens.len(), source.len());
    lexer.tokens
}

impl<'s> CabalLexer<'s> {
    fn push(&mut self, kind: TokenKind, len: usize, error: Option<LexErrorKind>) {
        if len == 0 {
            return;
        }
        let span = Span::new(self.offset, self.offset + len);
        let mut token = Token::new(kind, span, self.pos);
        token.error = error;
        self.tokens.push(token);
        self.pos.advance_str(span.text(self.source));
        self.offset = span.end;
    }

    fn line(&mut self, line: &'s str) {
        let body = line.trim_end_matches(['\n', '\r']);
        let newline = line.len() - body.len();
        let content = body.trim_start_matches([' ', '\t']);
        let indent_len = body.len() - content.len();

        self.push(TokenKind::Whitespace, indent_len, None);
        match self.classify(content, self.pos.column) {
            LineKind::Blank => {}
            LineKind::Comment => self.push(TokenKind::LineComment, content.len(), None),
            LineKind::Section => self.keyword_line(TokenKind::CabalSectionKw, content),
            LineKind::If => self.keyword_line(TokenKind::CabalIfKw, content),
            LineKind::Else => self.keyword_line(TokenKind::CabalElseKw, content),
            LineKind::Field { name_len } => {
                self.push(TokenKind::CabalFieldName, name_len, None);
                let rest = &content[name_len..];
                let spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
                self.push(TokenKind::Whitespace, spaces, None);
                self.push(TokenKind::Colon, 1, None);
                self.values(&rest[spaces + 1..]);
            }
            LineKind::Continuation | LineKind::Other => self.values(content),
        }
        self.push(TokenKind::Whitespace, newline, None);
    }

    fn classify(&mut self, content: &str, column: u32) -> LineKind {
        if content.is_empty() {
            return LineKind::Blank;
        }
        if content.starts_with("--") {
            return LineKind::Comment;
        }
        if let Some(indent) = self.field_indent {
            if column > indent {
                return LineKind::Continuation;
            }
        }
        let word = &content[..first_word_len(content)];
        if word.eq_ignore_ascii_case("if") {
            self.field_indent = None;
            return LineKind::If;
        }
        if word.eq_ignore_ascii_case("else") {
            self.field_indent = None;
            return LineKind::Else;
        }
        if let Some(name_len) = field_name_len(content) {
            self.field_indent = Some(column);
            return LineKind::Field { name_len };
        }
        self.field_indent = None;
        if SECTION_KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k)) {
            LineKind::Section
        } else {
            LineKind::Other
        }
    }

    fn keyword_line(&mut self, kind: TokenKind, content: &str) {
        let word_len = first_word_len(content);
        self.push(kind, word_len, None);
        self.values(&content[word_len..]);
    }

    fn values(&mut self, text: &str) {
        let mut lexer = ValueToken::lexer(text);
        while let Some(result) = lexer.next() {
            let len = lexer.span().len();
            match result {
                Ok(token) => self.push(token.kind(), len, None),
                Err(error) => self.push(TokenKind::Error, len, Some(error)),
            }
        }
    }
}

fn first_word_len(content: &str) -> usize {
    content
        .find(|c: char| c.is_whitespace() || c == ':' || c == '{')
        .unwrap_or(content.len())
}

/// Length of `name` in a `name:` line, if the line is one.
fn field_name_len(content: &str) -> Option<usize> {
    let name_len = content
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .unwrap_or(content.len());
    if name_len == 0 || !content.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let after = content[name_len..].trim_start_matches([' ', '\t']);
    after.starts_with(':').then_some(name_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Whitespace)
            .collect()
    }

    #[test]
    fn test_field_line() {
        assert_eq!(
            kinds("name: hask-syntax\nversion: 0.1.0\n"),
            vec![
                TokenKind::CabalFieldName,
                TokenKind::Colon,
                TokenKind::CabalText,
                TokenKind::CabalFieldName,
                TokenKind::Colon,
                TokenKind::CabalVersion,
            ]
        );
    }

    #[test]
    fn test_section_and_conditional() {
        let source = "library\n  if flag(dev) && !os(windows)\n    ghc-options: -O0\n  else\n    ghc-options: -O2\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::CabalSectionKw,
                TokenKind::CabalIfKw,
                TokenKind::CabalText,
                TokenKind::LParen,
                TokenKind::CabalText,
                TokenKind::RParen,
                TokenKind::CabalOperator,
                TokenKind::CabalOperator,
                TokenKind::CabalText,
                TokenKind::LParen,
                TokenKind::CabalText,
                TokenKind::RParen,
                TokenKind::CabalFieldName,
                TokenKind::Colon,
                TokenKind::CabalText,
                TokenKind::CabalElseKw,
                TokenKind::CabalFieldName,
                TokenKind::Colon,
                TokenKind::CabalText,
            ]
        );
    }

    #[test]
    fn test_continuation_lines_are_values() {
        let source = "build-depends: base >=4.14\n             , text:core ^>=2.0\nother: x\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::CabalFieldName,
                TokenKind::Colon,
                TokenKind::CabalText,
                TokenKind::CabalOperator,
                TokenKind::CabalVersion,
                TokenKind::Comma,
                TokenKind::CabalText,
                TokenKind::Colon,
                TokenKind::CabalText,
                TokenKind::CabalOperator,
                TokenKind::CabalVersion,
                TokenKind::CabalFieldName,
                TokenKind::Colon,
                TokenKind::CabalText,
            ]
        );
    }

    #[test]
    fn test_comments_and_positions() {
        let source = "-- a comment\n\tname : x\r\n";
        let tokens = lex(source);
        assert_eq!(tokens[0].kind, TokenKind::LineComment);
        let name = tokens
            .iter()
            .find(|t| t.kind == TokenKind::CabalFieldName)
            .unwrap();
        assert_eq!(name.line, 2);
        assert_eq!(name.column, 9);
        let text: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(text, source);
    }

    #[test]
    fn test_prose_in_descriptions_lexes_cleanly() {
        let source = "description: a = b & c | d ^ e
";
        let tokens = lex(source);
        assert!(tokens.iter().all(|t| t.error.is_none()));
        assert!(!tokens.iter().any(|t| t.kind == TokenKind::Error));
        let text: String = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(text, source);
    }
}
