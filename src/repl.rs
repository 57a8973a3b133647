use std::io::{self, BufRead, Write};

use log::debug;

use crate::config::Config;
use crate::error::ShellError;
use crate::executor::{BuiltinManager, DefaultExecutor, ExecOutcome, Executor, PathResolver};
use crate::parser::parse_line;
use crate::prompt::ShellPrompt;

/// Reads lines, runs each one and keeps going until input ends or `exit`.
pub struct Shell<E: Executor = DefaultExecutor> {
    executor: E,
    prompt: ShellPrompt,
    interactive: bool,
}

impl Shell<DefaultExecutor> {
    pub fn new(config: &Config) -> Self {
        Shell::with_builtins(config, BuiltinManager::new())
    }

    pub fn with_builtins(config: &Config, builtins: BuiltinManager) -> Self {
        let paths = match &config.search_path {
            Some(path) => PathResolver::with_search_path(path),
            None => PathResolver::new(),
        };
        let executor = DefaultExecutor::new(builtins, paths);
        Shell::with_executor(executor, &config.prompt, true)
    }
}

impl<E: Executor> Shell<E> {
    pub fn with_executor(executor: E, prompt: &str, interactive: bool) -> Self {
        Shell {
            executor,
            prompt: ShellPrompt::new(prompt),
            interactive,
        }
    }

    /// No prompt, and no newline when input runs out.
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Run until end of input or `exit`. Returns the status of the last line
    /// that ran, or the code given to `exit`.
    pub fn run(
        &mut self,
        input: &mut dyn BufRead,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> io::Result<i32> {
        let mut status = 0;
        loop {
            if self.interactive {
                self.prompt.show_prompt(stdout)?;
            }
            let Some(line) = self.prompt.read_line(input)? else {
                if self.interactive {
                    writeln!(stdout)?;
                    stdout.flush()?;
                }
                debug!("end of input, status {}", status);
                return Ok(status);
            };

            match self.run_line(&line, stdout, stderr)? {
                Some(ExecOutcome::Exit(code)) => {
                    debug!("exit requested with {}", code);
                    return Ok(code);
                }
                Some(ExecOutcome::Code(code)) => status = code,
                None => {}
            }
        }
    }

    /// Run one line. `None` when the line holds no command.
    ///
    /// Commands joined by `&&` run left to right and stop at the first one
    /// that fails. Errors are written to `stderr` as one line each and only
    /// an error on the sinks themselves is returned.
    pub fn run_line(
        &mut self,
        line: &str,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> io::Result<Option<ExecOutcome>> {
        let commands = match parse_line(line) {
            Ok(commands) => commands,
            Err(e) => {
                let err = ShellError::from(e);
                writeln!(stderr, "{}", err)?;
                return Ok(Some(ExecOutcome::Code(err.status_code())));
            }
        };

        let mut outcome = None;
        for cmd in &commands {
            debug!("running {:?}", cmd);
            match self.executor.exec(cmd, stdout, stderr) {
                Ok(ExecOutcome::Exit(code)) => return Ok(Some(ExecOutcome::Exit(code))),
                Ok(ExecOutcome::Code(code)) => {
                    outcome = Some(ExecOutcome::Code(code));
                    if code != 0 {
                        break;
                    }
                }
                Err(e) => {
                    let err = ShellError::from(e);
                    writeln!(stderr, "{}", err)?;
                    outcome = Some(ExecOutcome::Code(err.status_code()));
                    break;
                }
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::MockExecutor;

    fn shell(interactive: bool) -> Shell<MockExecutor> {
        Shell::with_executor(MockExecutor::new(), "P ", interactive)
    }

    fn run(shell: &mut Shell<MockExecutor>, input: &str) -> (i32, String, String) {
        let mut input = input.as_bytes();
        let mut out: Vec<u8> = Vec::new();
        let mut err: Vec<u8> = Vec::new();
        let status = shell.run(&mut input, &mut out, &mut err).unwrap();
        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();
        (status, out, err)
    }

    #[test]
    fn test_interactive_prompts_each_line() {
        let mut sh = shell(true);
        let (status, out, err) = run(&mut sh, "a\n\nb x\n");
        assert_eq!(status, 0);
        assert_eq!(out, "P a\nP P b x\nP \n");
        assert!(err.is_empty());
        assert_eq!(sh.executor().names(), vec!["a", "b"]);
    }

    #[test]
    fn test_non_interactive_has_no_prompt() {
        let mut sh = shell(true).non_interactive();
        assert!(!sh.is_interactive());
        let (status, out, err) = run(&mut sh, "a \"b c\"\n");
        assert_eq!(status, 0);
        assert_eq!(out, "a b c\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_blank_lines_run_nothing() {
        let mut sh = shell(false);
        let (status, out, _) = run(&mut sh, "   \n\t\n");
        assert_eq!(status, 0);
        assert!(out.is_empty());
        assert!(sh.executor().calls.is_empty());
    }

    #[test]
    fn test_errors_do_not_stop_the_loop() {
        let mut sh = shell(false);
        sh.executor.missing.push("nope".to_string());
        let (status, out, err) = run(&mut sh, "nope\nok\n");
        assert_eq!(status, 0);
        assert_eq!(out, "ok\n");
        assert_eq!(err, "\"nope\": command not found\n");
    }

    #[test]
    fn test_lex_error_skips_only_that_line() {
        let mut sh = shell(false);
        let (status, out, err) = run(&mut sh, "echo \"open\nafter\n");
        assert_eq!(status, 0);
        assert_eq!(out, "after\n");
        assert_eq!(err, "unterminated quoted string starting at position 5\n");
        assert_eq!(sh.executor().names(), vec!["after"]);
    }

    #[test]
    fn test_status_of_last_line() {
        let mut sh = shell(false);
        sh.executor.statuses.insert("fail".to_string(), 3);
        let (status, _, err) = run(&mut sh, "ok\nfail\n");
        assert_eq!(status, 3);
        assert!(err.is_empty());

        let (status, _, _) = run(&mut sh, "bad ; line\n");
        assert_eq!(status, 2);
    }

    #[test]
    fn test_and_chain_stops_on_failure() {
        let mut sh = shell(false);
        sh.executor.statuses.insert("fail".to_string(), 1);
        let (status, out, _) = run(&mut sh, "a && fail && b\nc && d\n");
        assert_eq!(status, 0);
        assert_eq!(out, "a\nfail\nc\nd\n");
        assert_eq!(sh.executor().names(), vec!["a", "fail", "c", "d"]);
    }

    #[test]
    fn test_and_chain_stops_on_error() {
        let mut sh = shell(false);
        sh.executor.missing.push("nope".to_string());
        let (status, out, err) = run(&mut sh, "nope && a\n");
        assert_eq!(status, 127);
        assert!(out.is_empty());
        assert_eq!(err.lines().count(), 1);
        assert_eq!(sh.executor().names(), vec!["nope"]);
    }

    #[test]
    fn test_exit_ends_the_loop() {
        let mut sh = shell(true);
        let (status, out, _) = run(&mut sh, "a\nexit\nb\n");
        assert_eq!(status, 0);
        assert_eq!(out, "P a\nP ");
        assert_eq!(sh.executor().names(), vec!["a", "exit"]);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut sh = shell(false);
        let (_, out, _) = run(&mut sh, "a\r\nb");
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn test_run_line_empty() {
        let mut sh = shell(false);
        let outcome = sh.run_line("", &mut Vec::<u8>::new(), &mut Vec::<u8>::new()).unwrap();
        assert_eq!(outcome, None);
    }
}
