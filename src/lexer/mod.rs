mod lexer;
mod token;

pub use lexer::{LexError, Lexer};
pub use token::{Token, TokenKind};

/// Start tokenizing `input`; tokens are produced as the iterator is pulled.
pub fn tokenize(input: &str) -> Lexer<'_> {
    Lexer::new(input)
}
