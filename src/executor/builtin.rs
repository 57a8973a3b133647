pub mod commands;
pub mod manager;

pub use commands::{CdCommand, ExitCommand};
pub use manager::{BuiltinCommand, BuiltinManager};
