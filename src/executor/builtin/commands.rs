use std::io::Write;

use log::debug;

use crate::executor::builtin::manager::BuiltinCommand;
use crate::executor::{ExecError, ExecOutcome, ExecStatus};

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn run(
        &self,
        args: &[String],
        _stdout: &mut (dyn Write + Send),
        _stderr: &mut (dyn Write + Send),
    ) -> ExecStatus {
        let target = cd_target(args, std::env::var("HOME").ok())?;
        std::env::set_current_dir(&target)
            .map_err(|e| ExecError::Custom(format!("cd: {}: {}", target, e)))?;
        debug!("changed directory to {}", target);
        Ok(ExecOutcome::Code(0))
    }
}

/// Directory `cd` should switch to: its only argument, or `home` without one.
fn cd_target(args: &[String], home: Option<String>) -> Result<String, ExecError> {
    match args {
        [] => home.ok_or_else(|| invalid("cd: HOME not set")),
        [dir] => Ok(dir.clone()),
        _ => Err(invalid("cd: too many arguments")),
    }
}

fn invalid(msg: &str) -> ExecError {
    ExecError::InvalidArgument(msg.to_string())
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn run(
        &self,
        args: &[String],
        _stdout: &mut (dyn Write + Send),
        _stderr: &mut (dyn Write + Send),
    ) -> ExecStatus {
        let code = match args {
            [] => 0,
            [code] => code.parse::<i32>().map_err(|_| {
                ExecError::InvalidArgument(format!("exit: {}: numeric argument required", code))
            })?,
            _ => return Err(invalid("exit: too many arguments")),
        };
        Ok(ExecOutcome::Exit(code))
    }
}
