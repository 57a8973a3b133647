use std::collections::HashMap;
use std::io::Write;

use crate::executor::builtin::commands::{CdCommand, ExitCommand};
use crate::executor::{ExecError, ExecStatus};

pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(
        &self,
        args: &[String],
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> ExecStatus;
}

/// Name → built-in table. Lookups are exact matches.
pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    /// Table with the default built-ins: `cd` and `exit`.
    pub fn new() -> Self {
        let mut mgr = BuiltinManager::empty();
        mgr.register(Box::new(CdCommand {}));
        mgr.register(Box::new(ExitCommand {}));
        mgr
    }

    pub fn empty() -> Self {
        BuiltinManager {
            commands: HashMap::new(),
        }
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn BuiltinCommand> {
        self.commands.get(name).map(|cmd| cmd.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn execute(
        &self,
        name: &str,
        args: &[String],
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> ExecStatus {
        match self.get(name) {
            Some(cmd) => cmd.run(args, stdout, stderr),
            None => Err(ExecError::CommandNotFound(name.to_string())),
        }
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}
