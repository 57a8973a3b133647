use std::io::Write;

use crate::ast::CommandLine;
use crate::executor::builtin::BuiltinManager;
use crate::executor::path_resolver::PathResolver;
use crate::executor::resolver::{CommandResolver, ResolvedCommand};
use crate::executor::runner::ProcessRunner;
use crate::executor::{ExecOutcome, ExecStatus, Executor};

/// Resolves each command afresh and runs it as a built-in or child process.
pub struct DefaultExecutor {
    resolver: CommandResolver,
    runner: ProcessRunner,
}

impl DefaultExecutor {
    pub fn new(builtins: BuiltinManager, paths: PathResolver) -> Self {
        DefaultExecutor {
            resolver: CommandResolver::new(builtins, paths),
            runner: ProcessRunner,
        }
    }

    pub fn resolver_mut(&mut self) -> &mut CommandResolver {
        &mut self.resolver
    }
}

impl Default for DefaultExecutor {
    fn default() -> Self {
        Self::new(BuiltinManager::new(), PathResolver::new())
    }
}

impl Executor for DefaultExecutor {
    fn exec(
        &mut self,
        cmd: &CommandLine,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> ExecStatus {
        match self.resolver.resolve(&cmd.name)? {
            ResolvedCommand::Builtin(builtin) => builtin.run(&cmd.args, stdout, stderr),
            ResolvedCommand::External(path) => self
                .runner
                .run(&path, &cmd.args, stdout, stderr)
                .map(ExecOutcome::Code),
        }
    }
}
