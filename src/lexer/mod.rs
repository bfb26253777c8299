pub mod layout;
pub mod literal;
pub mod logos_lexer;
pub mod token;

pub use layout::{resolve, Context, Layout, Resolved};
pub use logos_lexer::{RawToken, Tokenizer};
pub use token::{LexErrorKind, Token, TokenKind};

/// Main lexer entry point: every token of the source, trivia included.
///
/// Layout is not applied here; the parser drives the [`Layout`] resolver
/// itself so that it can close implicit blocks on a parse error.
pub fn lex(source: &str) -> Vec<Token> {
    let tokens = logos_lexer::lex(source);
    log::debug!("lexed {} tokens from {} bytes", tokens.len(), source.len());
    tokens
}
