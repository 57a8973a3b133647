use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use argh::FromArgs;
use log::{LevelFilter, debug};

use picosh::config::{Config, ConfigLoader};
use picosh::error::ShellError;
use picosh::executor::relay::InterruptGuard;
use picosh::logging;
use picosh::repl::Shell;

/// A small interactive command shell.
#[derive(FromArgs)]
struct Args {
    /// run this command line and exit instead of reading standard input
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// read settings from this file instead of ~/.picoshrc
    #[argh(option)]
    config: Option<PathBuf>,

    /// log debug output
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() {
    let args: Args = argh::from_env();
    match run(args) {
        Ok(status) => process::exit(status),
        Err(e) => {
            eprintln!("picosh: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32, ShellError> {
    let mut config = load_config(args.config.as_deref())?;
    if args.verbose {
        config.log_level = LevelFilter::Debug;
    }
    logging::init(config.log_level, config.log_file.as_deref().map(Path::new))?;
    debug!("loaded config {:?}", config);

    let shell = Shell::new(&config);
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let status = match args.command {
        Some(command) => {
            let mut input = command.as_bytes();
            shell.non_interactive().run(&mut input, &mut stdout, &mut stderr)?
        }
        None => {
            // Ctrl-C while reading a line is discarded rather than ending the shell
            let _interrupts = InterruptGuard::install()?;
            let mut shell = shell;
            let mut input = io::stdin().lock();
            shell.run(&mut input, &mut stdout, &mut stderr)?
        }
    };
    stdout.flush()?;
    Ok(status)
}

/// An explicit path must load; the default one is used only when present.
fn load_config(path: Option<&Path>) -> Result<Config, ShellError> {
    match path {
        Some(path) => Ok(ConfigLoader::load_from_file(path)?),
        None => match ConfigLoader::default_path() {
            Some(path) if path.is_file() => Ok(ConfigLoader::load_from_file(path)?),
            _ => Ok(ConfigLoader::default_config()),
        },
    }
}
