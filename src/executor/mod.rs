pub mod builtin;
mod default_executor;
mod executor;
pub mod path_resolver;
pub mod relay;
pub mod resolver;
pub mod runner;


pub use builtin::{BuiltinCommand, BuiltinManager};
pub use default_executor::DefaultExecutor;
pub use executor::{ExecError, ExecOutcome, ExecStatus, Executor};
pub use path_resolver::PathResolver;
pub use resolver::{CommandResolver, ResolvedCommand};
pub use runner::ProcessRunner;
