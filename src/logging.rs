use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};

use crate::error::ShellError;

/// Install the global logger: a file when `log_file` is given, stderr
/// otherwise.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<(), ShellError> {
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Debug)
        .set_target_level(LevelFilter::Off)
        .build();

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            WriteLogger::init(level, config, file)
        }
        None => TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto),
    };
    result.map_err(|e| ShellError::Logger(e.to_string()))
}
