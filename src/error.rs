use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::executor::ExecError;
use crate::parser::ParseError;

/// Everything that can go wrong at the shell's top level.
#[derive(Debug)]
pub enum ShellError {
    Parse(ParseError),
    Exec(ExecError),
    Config(ConfigError),
    Logger(String),
    Io(io::Error),
}

impl ShellError {
    /// Status the loop records for a line that failed with this error.
    pub fn status_code(&self) -> i32 {
        match self {
            ShellError::Parse(_) => 2,
            ShellError::Exec(e) => e.status_code(),
            _ => 1,
        }
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Parse(e) => write!(f, "{}", e),
            ShellError::Exec(e) => write!(f, "{}", e),
            ShellError::Config(e) => write!(f, "config: {}", e),
            ShellError::Logger(msg) => write!(f, "logger: {}", msg),
            ShellError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Parse(e) => Some(e),
            ShellError::Exec(e) => Some(e),
            ShellError::Config(e) => Some(e),
            ShellError::Io(e) => Some(e),
            ShellError::Logger(_) => None,
        }
    }
}

impl From<ParseError> for ShellError {
    fn from(e: ParseError) -> Self {
        ShellError::Parse(e)
    }
}

impl From<ExecError> for ShellError {
    fn from(e: ExecError) -> Self {
        ShellError::Exec(e)
    }
}

impl From<ConfigError> for ShellError {
    fn from(e: ConfigError) -> Self {
        ShellError::Config(e)
    }
}

impl From<io::Error> for ShellError {
    fn from(e: io::Error) -> Self {
        ShellError::Io(e)
    }
}
