use crate::lexer::TokenKind;

/// A set of token kinds, usable in `const` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenSet(u128);

impl TokenSet {
    pub(crate) const EMPTY: TokenSet = TokenSet(0);

    pub(crate) const fn new(kinds: &[TokenKind]) -> TokenSet {
        let mut bits = 0u128;
        let mut i = 0;
        while i < kinds.len() {
            bits |= mask(kinds[i]);
            i += 1;
        }
        TokenSet(bits)
    }

    pub(crate) const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }

    pub(crate) const fn contains(&self, kind: TokenKind) -> bool {
        self.0 & mask(kind) != 0
    }
}

const fn mask(kind: TokenKind) -> u128 {
    1u128 << (kind as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_fits() {
        assert!((TokenKind::Eof as u32) < 128);
    }

    #[test]
    fn test_token_set() {
        const OPEN: TokenSet = TokenSet::new(&[TokenKind::LParen, TokenKind::LBracket]);
        let set = OPEN.union(TokenSet::new(&[TokenKind::Eof]));
        assert!(set.contains(TokenKind::LParen));
        assert!(set.contains(TokenKind::Eof));
        assert!(!set.contains(TokenKind::RParen));
        assert!(!TokenSet::EMPTY.contains(TokenKind::Whitespace));
    }
}
