use std::collections::VecDeque;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::lexer::token::{Token, TokenKind};
use crate::span::{LineIndex, SourcePos, Span};

/// Stack entry: either an implicit layout block or an explicit `{`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Implicit block with its reference column (1-indexed)
    Implicit(u32),
    Explicit,
}

/// A token produced by the resolver, with the layout diagnostic (if any)
/// raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub token: Token,
    pub diagnostic: Option<Diagnostic>,
}

impl Resolved {
    fn plain(token: Token) -> Self {
        Self {
            token,
            diagnostic: None,
        }
    }
}

/// Offside-rule resolver.
///
/// Turns the significant tokens of a file into an explicit-brace stream one
/// token at a time:
/// - After a layout keyword (`where`/`let`/`do`/`of`, or `case` in `\case`)
///   not followed by `{`, the next token fixes the block's reference column
///   and a virtual `{` is produced. A block that would not be indented past
///   its enclosing block is empty (`{` `}`).
/// - The first token of a line at the reference column gets a virtual `;`.
/// - The first token of a line left of the reference column closes the block
///   with a virtual `}` (repeatedly, for nested blocks).
/// - End of input closes every implicit block.
///
/// The state is small and `Clone`: the parser looks ahead by cloning it, and
/// backtracks by restoring an earlier clone. The parse-error(t) rule is the
/// parser calling [`Layout::close_implicit`] when the current token cannot
/// continue the innermost implicit block.
#[derive(Debug, Clone)]
pub struct Layout<'t> {
    source: &'t str,
    /// Significant tokens only: no trivia, no lexical error tokens
    tokens: &'t [Token],
    eof: Token,
    pos: usize,
    stack: Vec<Context>,
    /// Virtual tokens to hand out before `tokens[pos]`
    pending: VecDeque<Token>,
    /// The previous token was a layout keyword
    expect_block: bool,
    /// No module header seen yet; the body may need an implicit block
    module_start: bool,
    /// The line-start check for `tokens[pos]` has been done
    line_checked: bool,
    /// Blocks were closed by a dedent on the current line
    dedented: bool,
    last_line: u32,
    last_end: usize,
    last_end_pos: SourcePos,
    /// Last virtual `{` anchored at the start of the following token
    last_open: Option<Token>,
    prev: Option<TokenKind>,
}

impl<'t> Layout<'t> {
    /// Resolver for a fragment (expression, type, ...): starts with no open
    /// blocks.
    pub fn new(source: &'t str, tokens: &'t [Token]) -> Self {
        let end = LineIndex::new(source).pos(source, source.len());
        Self {
            source,
            tokens,
            eof: Token::new(TokenKind::Eof, Span::empty(source.len()), end),
            pos: 0,
            stack: Vec::new(),
            pending: VecDeque::new(),
            expect_block: false,
            module_start: false,
            line_checked: false,
            dedented: false,
            last_line: 0,
            last_end: 0,
            last_end_pos: SourcePos::START,
            last_open: None,
            prev: None,
        }
    }

    /// Resolver for a whole module: a body without a `module` header is an
    /// implicit block. Leading pragmas are skipped for that decision.
    pub fn for_module(source: &'t str, tokens: &'t [Token]) -> Self {
        Self {
            module_start: true,
            ..Self::new(source, tokens)
        }
    }

    pub fn stack(&self) -> &[Context] {
        &self.stack
    }

    pub fn in_implicit_block(&self) -> bool {
        matches!(self.stack.last(), Some(Context::Implicit(_)))
    }

    /// Index of the next significant token to be produced.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The parse-error(t) rule: close the innermost implicit block so that
    /// the next token produced is a virtual `}`. Returns false when the
    /// innermost block is explicit or there is none.
    pub fn close_implicit(&mut self) -> bool {
        if !self.in_implicit_block() {
            return false;
        }
        self.stack.pop();
        let close = self.virtual_after(TokenKind::VRBrace);
        self.pending.push_front(close);
        log::trace!("parse-error(t): closed implicit block at {}", self.last_end);
        true
    }

    fn peek_raw(&self) -> Token {
        self.tokens.get(self.pos).copied().unwrap_or(self.eof)
    }

    /// Virtual token right after the previous real token, or at the last
    /// virtual `{` when that one sits further on (a block closed before
    /// its first item).
    fn virtual_after(&self, kind: TokenKind) -> Token {
        match self.last_open {
            Some(open) if open.span.start > self.last_end => Token::synthetic(kind, &open),
            _ => Token::new(kind, Span::empty(self.last_end), self.last_end_pos),
        }
    }

    fn enclosing_indent(&self) -> u32 {
        match self.stack.last() {
            Some(Context::Implicit(column)) => *column,
            Some(Context::Explicit) | None => 0,
        }
    }

    /// Produce the next token of the explicit-brace stream. After the end of
    /// input this keeps returning `Eof`; an explicit block still open at that
    /// point is left for the parser to report.
    pub fn next(&mut self) -> Resolved {
        if let Some(token) = self.pending.pop_front() {
            return Resolved::plain(token);
        }
        let token = self.peek_raw();

        if self.module_start {
            match token.kind {
                TokenKind::Pragma => {
                    let diagnostic = self.advance(token);
                    return Resolved { token, diagnostic };
                }
                TokenKind::ModuleKw | TokenKind::LBrace => self.module_start = false,
                _ => {
                    self.module_start = false;
                    self.expect_block = true;
                }
            }
        }

        if self.expect_block {
            self.expect_block = false;
            if token.kind != TokenKind::LBrace {
                let column = if token.kind == TokenKind::Eof { 0 } else { token.column };
                if column > self.enclosing_indent() {
                    self.stack.push(Context::Implicit(column));
                    self.line_checked = true;
                    let open = Token::synthetic(TokenKind::VLBrace, &token);
                    self.last_open = Some(open);
                    return Resolved::plain(open);
                }
                log::trace!("empty layout block before {}", token.span);
                let open = self.virtual_after(TokenKind::VLBrace);
                self.pending.push_back(self.virtual_after(TokenKind::VRBrace));
                return Resolved::plain(open);
            }
        }

        if token.kind == TokenKind::Eof {
            if self.in_implicit_block() {
                self.stack.pop();
                return Resolved::plain(self.virtual_after(TokenKind::VRBrace));
            }
            return Resolved::plain(token);
        }

        let mut diagnostic = None;
        if !self.line_checked && token.line > self.last_line {
            match self.stack.last().copied() {
                Some(Context::Implicit(column)) if token.column == column => {
                    self.line_checked = true;
                    self.dedented = false;
                    return Resolved::plain(self.virtual_after(TokenKind::VSemi));
                }
                Some(Context::Implicit(column)) if token.column < column => {
                    self.stack.pop();
                    self.dedented = true;
                    return Resolved::plain(self.virtual_after(TokenKind::VRBrace));
                }
                top => {
                    self.line_checked = true;
                    if self.dedented {
                        diagnostic = misaligned(top, &token);
                    }
                    self.dedented = false;
                }
            }
        }

        let closing = self.advance(token);
        Resolved {
            token,
            diagnostic: diagnostic.or(closing),
        }
    }

    fn advance(&mut self, token: Token) -> Option<Diagnostic> {
        let text = token.text(self.source);
        let mut end = token.pos();
        end.advance_str(text);
        self.pos += 1;
        self.line_checked = false;
        self.last_line = end.line;
        self.last_end = token.span.end;
        self.last_end_pos = end;

        let mut diagnostic = None;
        match token.kind {
            TokenKind::LBrace => self.stack.push(Context::Explicit),
            TokenKind::RBrace => diagnostic = self.close_explicit(&token),
            TokenKind::CaseKw if self.prev == Some(TokenKind::Backslash) => self.expect_block = true,
            kind if kind.is_layout_keyword() => self.expect_block = true,
            _ => {}
        }
        self.prev = Some(token.kind);
        diagnostic
    }

    /// An explicit `}` closes every implicit block above its `{`.
    fn close_explicit(&mut self, token: &Token) -> Option<Diagnostic> {
        let Some(explicit) = self.stack.iter().rposition(|c| *c == Context::Explicit) else {
            return Some(Diagnostic::error(
                DiagnosticKind::Layout,
                "`}` without a matching `{`",
                token.span,
            ));
        };
        let implicit = self.stack.len() - explicit - 1;
        self.stack.truncate(explicit);
        if implicit == 0 {
            return None;
        }
        Some(Diagnostic::error(
            DiagnosticKind::Layout,
            format!("`}}` closes {} unterminated layout block(s)", implicit),
            token.span,
        ))
    }
}

/// After a dedent, a line that lands strictly between two block columns and
/// starts an atom silently becomes an argument of the closed block.
fn misaligned(top: Option<Context>, token: &Token) -> Option<Diagnostic> {
    let starts_atom = matches!(
        token.kind,
        TokenKind::VarId
            | TokenKind::ConId
            | TokenKind::QVarId
            | TokenKind::QConId
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Underscore
    ) || token.kind.is_literal();
    match top {
        Some(Context::Implicit(column)) if starts_atom && token.column > column => Some(Diagnostic::warning(
            DiagnosticKind::Layout,
            format!(
                "line at column {} does not align with any enclosing layout block (nearest is column {})",
                token.column, column
            ),
            token.span,
        )),
        None => Some(Diagnostic::error(
            DiagnosticKind::Layout,
            "indentation is less than that of the outermost layout block",
            token.span,
        )),
        _ => None,
    }
}

/// Run the resolver over a whole module without a parser attached (so the
/// parse-error(t) rule never fires). Used for token dumps and tests.
pub fn resolve(source: &str, tokens: &[Token]) -> (Vec<Token>, Vec<Diagnostic>) {
    let significant: Vec<Token> = tokens
        .iter()
        .filter(|t| !t.is_layout_transparent())
        .copied()
        .collect();
    let mut layout = Layout::for_module(source, &significant);
    let mut resolved = Vec::new();
    let mut diagnostics = Vec::new();
    loop {
        let Resolved { token, diagnostic } = layout.next();
        diagnostics.extend(diagnostic);
        if token.kind == TokenKind::Eof {
            break;
        }
        resolved.push(token);
    }
    (resolved, diagnostics)
}
