use std::io::{self, Write};
use std::{error, fmt};

use crate::ast::CommandLine;

pub type ExecStatus = Result<ExecOutcome, ExecError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The command finished with this status; the shell keeps going.
    Code(i32),
    /// The shell itself should stop with this status.
    Exit(i32),
}

#[derive(Debug)]
pub enum ExecError {
    CommandNotFound(String),
    Resolution { name: String, source: io::Error },
    Launch { name: String, source: io::Error },
    InvalidArgument(String),
    Io(io::Error),
    Custom(String),
}

impl ExecError {
    /// Status reported to the shell loop for a command that failed this way.
    pub fn status_code(&self) -> i32 {
        match self {
            ExecError::CommandNotFound(_) => 127,
            ExecError::Resolution { .. } | ExecError::Launch { .. } => 126,
            ExecError::InvalidArgument(_) => 2,
            ExecError::Io(_) | ExecError::Custom(_) => 1,
        }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::CommandNotFound(cmd) => write!(f, "{:?}: command not found", cmd),
            ExecError::Resolution { name, source } => {
                write!(f, "while looking up {:?}: {}", name, source)
            }
            ExecError::Launch { name, source } => write!(f, "when starting {:?}: {}", name, source),
            ExecError::InvalidArgument(msg) => write!(f, "{}", msg),
            ExecError::Io(e) => write!(f, "IO error: {}", e),
            ExecError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl error::Error for ExecError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ExecError::Resolution { source, .. } | ExecError::Launch { source, .. } => Some(source),
            ExecError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExecError {
    fn from(e: io::Error) -> Self {
        ExecError::Io(e)
    }
}

/// Runs one command line against the given output sinks.
pub trait Executor {
    fn exec(
        &mut self,
        cmd: &CommandLine,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> ExecStatus;
}
