use std::fmt;
use std::io;
use std::path::PathBuf;

use log::debug;

use crate::executor::ExecError;
use crate::executor::builtin::{BuiltinCommand, BuiltinManager};
use crate::executor::path_resolver::PathResolver;

pub enum ResolvedCommand<'a> {
    Builtin(&'a dyn BuiltinCommand),
    External(PathBuf),
}

impl fmt::Debug for ResolvedCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedCommand::Builtin(cmd) => write!(f, "Builtin({})", cmd.name()),
            ResolvedCommand::External(path) => write!(f, "External({})", path.display()),
        }
    }
}

/// Maps a command name to a built-in or an executable.
///
/// Built-ins are checked first and shadow executables of the same name.
/// Nothing is cached between lookups.
pub struct CommandResolver {
    builtins: BuiltinManager,
    paths: PathResolver,
}

impl CommandResolver {
    pub fn new(builtins: BuiltinManager, paths: PathResolver) -> Self {
        CommandResolver { builtins, paths }
    }

    pub fn builtins_mut(&mut self) -> &mut BuiltinManager {
        &mut self.builtins
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedCommand<'_>, ExecError> {
        if let Some(cmd) = self.builtins.get(name) {
            debug!("{} resolved to builtin", name);
            return Ok(ResolvedCommand::Builtin(cmd));
        }

        match self.paths.resolve(name) {
            Ok(path) => {
                debug!("{} resolved to {}", name, path.display());
                Ok(ResolvedCommand::External(path))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ExecError::CommandNotFound(name.to_string()))
            }
            Err(source) => Err(ExecError::Resolution {
                name: name.to_string(),
                source,
            }),
        }
    }
}

impl Default for CommandResolver {
    fn default() -> Self {
        Self::new(BuiltinManager::new(), PathResolver::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn temp_dir(name: &str) -> PathBuf {
        let dir_name = format!("picosh_resolve_{}_{}", std::process::id(), name);
        let dir = std::env::temp_dir().join(dir_name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn touch(path: &Path, mode: u32) {
        File::create(path).expect("create file");
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("chmod");
    }

    #[test]
    fn builtin_shadows_executable() {
        let dir = temp_dir("shadow");
        touch(&dir.join("cd"), 0o755);

        let resolver = CommandResolver::new(
            BuiltinManager::new(),
            PathResolver::with_search_path(dir.as_os_str()),
        );
        let resolved = resolver.resolve("cd").unwrap();
        match resolved {
            ResolvedCommand::Builtin(cmd) => assert_eq!(cmd.name(), "cd"),
            other => panic!("expected builtin, got {:?}", other),
        }

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn builtin_never_touches_search_path() {
        // A lookup of "exit" here would fail with a permission error
        let dir = temp_dir("no_lookup");
        touch(&dir.join("exit"), 0o600);

        let resolver = CommandResolver::new(
            BuiltinManager::new(),
            PathResolver::with_search_path(dir.as_os_str()),
        );
        let resolved = resolver.resolve("exit");
        assert!(matches!(resolved, Ok(ResolvedCommand::Builtin(_))));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn external_found() {
        let resolver = CommandResolver::new(
            BuiltinManager::new(),
            PathResolver::with_search_path("/bin:/usr/bin"),
        );
        match resolver.resolve("sh").unwrap() {
            ResolvedCommand::External(path) => assert!(path.ends_with("sh")),
            other => panic!("expected external, got {:?}", other),
        }
    }

    #[test]
    fn absent_name_is_command_not_found() {
        let resolver = CommandResolver::new(
            BuiltinManager::new(),
            PathResolver::with_search_path("/bin:/usr/bin"),
        );
        let err = resolver.resolve("no-such-picosh-command").unwrap_err();
        match err {
            ExecError::CommandNotFound(name) => assert_eq!(name, "no-such-picosh-command"),
            other => panic!("expected command not found, got {:?}", other),
        }
    }

    #[test]
    fn permission_problem_is_resolution_error() {
        let dir = temp_dir("denied");
        touch(&dir.join("tool"), 0o644);

        let resolver = CommandResolver::new(
            BuiltinManager::empty(),
            PathResolver::with_search_path(dir.as_os_str()),
        );
        let err = resolver.resolve("tool").unwrap_err();
        match err {
            ExecError::Resolution { name, .. } => assert_eq!(name, "tool"),
            other => panic!("expected resolution error, got {:?}", other),
        }

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn empty_builtin_table_falls_through() {
        let resolver = CommandResolver::new(
            BuiltinManager::empty(),
            PathResolver::with_search_path("/nonexistent"),
        );
        let resolved = resolver.resolve("cd");
        assert!(matches!(resolved, Err(ExecError::CommandNotFound(_))));
    }
}
