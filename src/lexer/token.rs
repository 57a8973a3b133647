use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word,       // Unquoted run of word characters
    QuotedWord, // "..." with the quotes stripped from the lexeme
    And,        // &&
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,       // Token text (quotes removed for QuotedWord)
    pub span: (usize, usize), // Byte offsets [start, end) in the input line
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Word | TokenKind::QuotedWord => write!(f, "{:?}", self.lexeme),
        }
    }
}
