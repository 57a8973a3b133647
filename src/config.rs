use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::{error, fmt, io};

use log::LevelFilter;

pub const DEFAULT_PROMPT: &str = "(picosh)> ";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub search_path: Option<String>,
    pub log_level: LevelFilter,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: DEFAULT_PROMPT.to_string(),
            search_path: None,
            log_level: LevelFilter::Warn,
            log_file: None,
        }
    }

    /// `~/.picoshrc`, if `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| Path::new(&home).join(".picoshrc"))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path).map_err(ConfigError::Io)?;
        let mut src = String::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(ConfigError::Io)?;
            src.push_str(&line);
            src.push('\n');
        }
        Self::load_from_str(&src)
    }

    /// Parse `key=value` lines. Blank lines and `#` comments are skipped.
    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse(format!(
                    "Line {}: No '=' found: {}",
                    lineno + 1,
                    line
                )));
            };
            // The prompt keeps its spacing; everything else is trimmed
            let key = key.trim();
            let trimmed = value.trim();

            match key {
                "prompt" => config.prompt = value.to_string(),
                "path" => config.search_path = Some(trimmed.to_string()),
                "log_level" => match trimmed.parse::<LevelFilter>() {
                    Ok(level) => config.log_level = level,
                    Err(_) => {
                        return Err(ConfigError::Parse(format!(
                            "Line {}: Invalid log level: {}",
                            lineno + 1,
                            trimmed
                        )));
                    }
                },
                "log_file" => {
                    config.log_file = if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                }
                _ => {
                    return Err(ConfigError::Parse(format!(
                        "Line {}: Unknown key: {}",
                        lineno + 1,
                        key
                    )));
                }
            }
        }

        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(_) => None,
        }
    }
}
