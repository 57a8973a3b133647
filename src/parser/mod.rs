use std::fmt;

use crate::ast::CommandLine;
use crate::lexer::{LexError, Token, TokenKind};

pub trait Parser {
    fn parse(&mut self) -> Result<Vec<CommandLine>, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Lex(LexError),
    EmptyCommand { pos: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::EmptyCommand { pos } => {
                write!(f, "missing command around '&&' at position {}", pos)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError::Lex(e)
    }
}

/// Groups a token stream into `&&`-separated command lines.
///
/// Tokens are pulled one at a time, so a lexing error stops the parse before
/// anything past it is scanned.
pub struct DefaultParser<I> {
    tokens: I,
}

impl<I> DefaultParser<I>
where
    I: Iterator<Item = Result<Token, LexError>>,
{
    pub fn new(tokens: I) -> Self {
        Self { tokens }
    }
}

impl<I> Parser for DefaultParser<I>
where
    I: Iterator<Item = Result<Token, LexError>>,
{
    fn parse(&mut self) -> Result<Vec<CommandLine>, ParseError> {
        let mut commands = Vec::new();
        let mut words = Vec::new();
        let mut last_and = None;

        for token in self.tokens.by_ref() {
            let token = token?;
            match token.kind {
                TokenKind::Word | TokenKind::QuotedWord => words.push(token.lexeme),
                TokenKind::And => match CommandLine::from_words(std::mem::take(&mut words)) {
                    Some(cmd) => {
                        commands.push(cmd);
                        last_and = Some(token.span.0);
                    }
                    None => return Err(ParseError::EmptyCommand { pos: token.span.0 }),
                },
                TokenKind::Eof => break,
            }
        }

        match CommandLine::from_words(words) {
            Some(cmd) => commands.push(cmd),
            None => {
                if let Some(pos) = last_and {
                    return Err(ParseError::EmptyCommand { pos });
                }
            }
        }
        Ok(commands)
    }
}

/// Tokenize and parse one input line.
pub fn parse_line(line: &str) -> Result<Vec<CommandLine>, ParseError> {
    DefaultParser::new(crate::lexer::tokenize(line)).parse()
}
