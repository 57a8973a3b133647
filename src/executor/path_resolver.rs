use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::trace;

/// Locates executables on the search path.
///
/// The path is read at every lookup so changes to `PATH` between commands are
/// seen. A fixed search path can be supplied instead.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    search_path: Option<OsString>,
}

impl PathResolver {
    pub fn new() -> Self {
        PathResolver { search_path: None }
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        PathResolver {
            search_path: Some(search_path.into()),
        }
    }

    /// Resolve `command` to an executable file.
    ///
    /// Fails with `ErrorKind::NotFound` when nothing matches. Any other error
    /// means a candidate exists but could not be used (e.g. no execute bit).
    pub fn resolve(&self, command: &str) -> io::Result<PathBuf> {
        if command.is_empty() {
            return Err(not_found(command));
        }

        if command.contains('/') {
            let path = Path::new(command);
            check_executable(path)?;
            return Ok(path.to_path_buf());
        }

        let paths = match &self.search_path {
            Some(p) => p.clone(),
            None => env::var_os("PATH").unwrap_or_default(),
        };

        let mut unusable = None;
        for dir in env::split_paths(&paths) {
            // An empty entry means the current directory
            let dir = if dir.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                dir
            };
            let candidate = dir.join(command);
            match check_executable(&candidate) {
                Ok(()) => {
                    trace!("found {} at {}", command, candidate.display());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) if e.raw_os_error() == Some(libc::ENOTDIR) => {}
                Err(e) => {
                    trace!("skipping {}: {}", candidate.display(), e);
                    unusable.get_or_insert(e);
                }
            }
        }

        Err(unusable.unwrap_or_else(|| not_found(command)))
    }
}

fn not_found(command: &str) -> io::Error {
    let msg = format!("{:?} not found in search path", command);
    io::Error::new(io::ErrorKind::NotFound, msg)
}

fn check_executable(path: &Path) -> io::Result<()> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a regular file", path.display()),
        ));
    }
    if meta.permissions().mode() & 0o111 == 0 {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{} is not executable", path.display()),
        ));
    }
    Ok(())
}
