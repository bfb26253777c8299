use crate::lexer::{Layout, Resolved, Token};

/// Adapter between the layout resolver and the grammar.
///
/// The resolver is pulled one token at a time. Tokens the grammar has only
/// looked at are kept in a buffer together with the resolver state right
/// after producing them, so consuming a token is a pop and closing an
/// implicit block (which must happen at the committed position) just drops
/// the buffer.
#[derive(Debug, Clone)]
pub(crate) struct LayoutAdapter<'t> {
    layout: Layout<'t>,
    lookahead: Vec<(Resolved, Layout<'t>)>,
}

impl<'t> LayoutAdapter<'t> {
    pub(crate) fn new(layout: Layout<'t>) -> Self {
        Self {
            layout,
            lookahead: Vec::new(),
        }
    }

    /// The `n`th token from the committed position.
    pub(crate) fn peek(&mut self, n: usize) -> &Resolved {
        while self.lookahead.len() <= n {
            let mut state = match self.lookahead.last() {
                Some((_, state)) => state.clone(),
                None => self.layout.clone(),
            };
            let resolved = state.next();
            self.lookahead.push((resolved, state));
        }
        &self.lookahead[n].0
    }

    pub(crate) fn token(&mut self, n: usize) -> Token {
        self.peek(n).token
    }

    /// Commit the current token and return it.
    pub(crate) fn advance(&mut self) -> Resolved {
        self.peek(0);
        let (resolved, state) = self.lookahead.remove(0);
        self.layout = state;
        resolved
    }

    /// The parse-error(t) rule at the committed position.
    pub(crate) fn close_implicit(&mut self) -> bool {
        let closed = self.layout.close_implicit();
        if closed {
            self.lookahead.clear();
        }
        closed
    }

    pub(crate) fn in_implicit_block(&self) -> bool {
        self.layout.in_implicit_block()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{lex, TokenKind};

    #[test]
    fn test_lookahead_does_not_commit() {
        let source = "f = do\n  a\n  b";
        let tokens: Vec<Token> = lex(source)
            .into_iter()
            .filter(|t| !t.is_layout_transparent())
            .collect();
        let mut input = LayoutAdapter::new(Layout::for_module(source, &tokens));
        assert_eq!(input.token(0).kind, TokenKind::VLBrace);
        assert_eq!(input.token(4).kind, TokenKind::VLBrace);
        assert_eq!(input.advance().token.kind, TokenKind::VLBrace);
        assert_eq!(input.token(0).kind, TokenKind::VarId);
    }

    #[test]
    fn test_close_implicit_drops_lookahead() {
        let source = "x = let y = 1 in y";
        let tokens: Vec<Token> = lex(source)
            .into_iter()
            .filter(|t| !t.is_layout_transparent())
            .collect();
        let mut input = LayoutAdapter::new(Layout::for_module(source, &tokens));
        for _ in 0..8 {
            input.advance();
        }
        assert_eq!(input.token(0).kind, TokenKind::InKw);
        assert!(input.close_implicit());
        assert_eq!(input.advance().token.kind, TokenKind::VRBrace);
        assert_eq!(input.token(0).kind, TokenKind::InKw);
    }
}
