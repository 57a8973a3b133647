use std::fmt;
use std::iter::FusedIterator;

use log::trace;

use super::token::{Token, TokenKind};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LexError {
    BadCharacter(char, usize),
    UnterminatedQuote(usize),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::BadCharacter(c, pos) => {
                write!(f, "bad character {:?} at position {}", c, pos)
            }
            LexError::UnterminatedQuote(pos) => {
                write!(f, "unterminated quoted string starting at position {}", pos)
            }
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Word,
    Quoted,
    Separator,
    Done,
}

/// Pull-based tokenizer over a single input line.
///
/// Each call to `next` runs the state machine only until the next token is
/// ready, so the consumer drives the pace. After `Eof` or the first error the
/// lexer yields `None` forever.
pub struct Lexer<'a> {
    input: &'a str,
    start: usize, // Start of the pending token
    pos: usize,   // Current read offset
    width: usize, // Byte width of the last char read, 0 once rewound
    state: State,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            start: 0,
            pos: 0,
            width: 0,
            state: State::Text,
        }
    }

    /// Drain the lexer, stopping at the first error.
    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        self.by_ref().collect()
    }

    fn next_char(&mut self) -> Option<char> {
        match self.input[self.pos..].chars().next() {
            Some(c) => {
                self.width = c.len_utf8();
                self.pos += self.width;
                Some(c)
            }
            None => {
                self.width = 0;
                None
            }
        }
    }

    fn backup(&mut self) {
        self.pos -= self.width;
        self.width = 0;
    }

    fn peek(&mut self) -> Option<char> {
        let c = self.next_char();
        self.backup();
        c
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn emit(&mut self, kind: TokenKind) -> Token {
        let raw = &self.input[self.start..self.pos];
        let lexeme = match kind {
            TokenKind::QuotedWord => raw[1..raw.len() - 1].to_string(),
            _ => raw.to_string(),
        };
        let token = Token {
            kind,
            lexeme,
            span: (self.start, self.pos),
        };
        trace!("lexed {:?} at {:?}", token.kind, token.span);
        self.start = self.pos;
        token
    }

    fn fail(&mut self, err: LexError) -> Result<Token, LexError> {
        self.state = State::Done;
        Err(err)
    }

    fn at_terminator(&mut self) -> bool {
        match self.peek() {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some('&') => self.input[self.pos..].starts_with("&&"),
            Some(_) => false,
        }
    }

    fn lex_word(&mut self) -> Result<Token, LexError> {
        loop {
            match self.next_char() {
                Some(c) if is_word_char(c) => {}
                other => {
                    self.backup();
                    if !self.at_terminator() {
                        // `other` is Some here: end of input is always a terminator
                        let c = other.unwrap_or_default();
                        return self.fail(LexError::BadCharacter(c, self.pos));
                    }
                    self.state = State::Text;
                    return Ok(self.emit(TokenKind::Word));
                }
            }
        }
    }

    fn lex_quoted(&mut self) -> Result<Token, LexError> {
        loop {
            match self.next_char() {
                None => return self.fail(LexError::UnterminatedQuote(self.start)),
                Some('"') => {
                    self.state = State::Text;
                    return Ok(self.emit(TokenKind::QuotedWord));
                }
                Some(_) => {}
            }
        }
    }

    fn lex_separator(&mut self) -> Result<Token, LexError> {
        match self.next_char() {
            Some('&') => {
                self.state = State::Text;
                Ok(self.emit(TokenKind::And))
            }
            _ => self.fail(LexError::BadCharacter('&', self.start)),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Done => return None,
                State::Text => match self.next_char() {
                    None => {
                        self.state = State::Done;
                        return Some(Ok(self.emit(TokenKind::Eof)));
                    }
                    Some(c) if c.is_whitespace() => self.ignore(),
                    Some('"') => self.state = State::Quoted,
                    Some('&') => self.state = State::Separator,
                    Some(_) => {
                        self.backup();
                        self.state = State::Word;
                    }
                },
                State::Word => return Some(self.lex_word()),
                State::Quoted => return Some(self.lex_quoted()),
                State::Separator => return Some(self.lex_separator()),
            }
        }
    }
}

impl FusedIterator for Lexer<'_> {}

/// Characters allowed in an unquoted word: alphanumerics plus the punctuation
/// that shows up in paths and options.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '/' | '.' | '-' | '_' | '~' | '=' | ':' | ',' | '+' | '%' | '@'
        )
}
