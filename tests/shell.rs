use std::fs;
use std::io::{Read, Write};
use std::os::unix::fs::{PermissionsExt, symlink};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use picosh::config::Config;
use picosh::executor::{BuiltinCommand, BuiltinManager, ExecOutcome, ExecStatus};
use picosh::repl::Shell;

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("picosh_it_{}_{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        TempDir(path)
    }

    fn file(&self, name: &str, contents: &str, mode: u32) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, contents).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn run_with_path(search_path: &str, input: &str) -> (i32, String, String) {
    let config = Config {
        search_path: Some(search_path.to_string()),
        ..Config::default()
    };
    let mut shell = Shell::new(&config).non_interactive();
    let mut input = input.as_bytes();
    let mut out: Vec<u8> = Vec::new();
    let mut err: Vec<u8> = Vec::new();
    let status = shell.run(&mut input, &mut out, &mut err).unwrap();
    let out = String::from_utf8(out).unwrap();
    let err = String::from_utf8(err).unwrap();
    (status, out, err)
}

fn run(input: &str) -> (i32, String, String) {
    run_with_path("/bin:/usr/bin", input)
}

#[test]
fn runs_external_commands_with_both_streams() {
    let (status, out, err) = run("sh -c \"echo out; echo err >&2\"\n");
    assert_eq!(status, 0);
    assert_eq!(out, "out\n");
    assert_eq!(err, "err\n");
}

#[test]
fn quoted_arguments_stay_whole() {
    let (status, out, _) = run("sh -c \"echo $#: $1\" sh \"a  b\" c\n");
    assert_eq!(status, 0);
    assert_eq!(out, "2: a b\n");
}

#[test]
fn nonzero_exit_is_silent() {
    let (status, out, err) = run("sh -c \"exit 3\"\n");
    assert_eq!(status, 3);
    assert!(out.is_empty());
    assert!(err.is_empty());
}

#[test]
fn unknown_command_is_reported_and_loop_continues() {
    let (status, out, err) = run("no-such-picosh-cmd arg\nsh -c \"echo still here\"\n");
    assert_eq!(status, 0);
    assert_eq!(out, "still here\n");
    assert_eq!(err, "\"no-such-picosh-cmd\": command not found\n");
}

#[test]
fn lex_errors_are_one_line() {
    let (status, out, err) = run("sh -c \"echo x\" ; sh\n");
    assert_eq!(status, 2);
    assert!(out.is_empty());
    assert_eq!(err, "bad character ';' at position 15\n");
}

#[test]
fn builtins_shadow_path_entries() {
    let dir = TempDir::new("shadow");
    symlink("/bin/echo", dir.0.join("exit")).unwrap();

    let (status, out, err) = run_with_path(dir.0.to_str().unwrap(), "exit 7\n");
    assert_eq!(status, 7);
    assert!(out.is_empty());
    assert!(err.is_empty());
}

#[test]
fn non_executable_file_is_a_resolution_error() {
    let dir = TempDir::new("noexec");
    dir.file("picosh-noexec", "#!/bin/sh\necho hi\n", 0o644);

    let (status, out, err) = run_with_path(dir.0.to_str().unwrap(), "picosh-noexec\n");
    assert_eq!(status, 126);
    assert!(out.is_empty());
    let prefix = "while looking up \"picosh-noexec\": ";
    assert!(err.starts_with(prefix), "{}", err);
    assert!(err.contains("not executable"), "{}", err);
    assert_eq!(err.lines().count(), 1);
}

#[test]
fn broken_interpreter_is_a_launch_error() {
    let dir = TempDir::new("launch");
    dir.file("picosh-broken", "#!/nonexistent/picosh-interp\n", 0o755);

    let (status, out, err) = run_with_path(dir.0.to_str().unwrap(), "picosh-broken\n");
    assert_eq!(status, 126);
    assert!(out.is_empty());
    assert!(err.starts_with("when starting "), "{}", err);
    assert_eq!(err.lines().count(), 1);
}

#[test]
fn and_chain_stops_at_first_failure() {
    let line = "sh -c \"echo one\" && sh -c \"exit 1\" && sh -c \"echo three\"\n";
    let (status, out, err) = run(line);
    assert_eq!(status, 1);
    assert_eq!(out, "one\n");
    assert!(err.is_empty());
}

#[test]
fn exit_stops_reading() {
    let (status, out, _) = run("exit 4\nsh -c \"echo unreachable\"\n");
    assert_eq!(status, 4);
    assert!(out.is_empty());
}

struct Greet;

impl BuiltinCommand for Greet {
    fn name(&self) -> &'static str {
        "greet"
    }

    fn run(
        &self,
        args: &[String],
        stdout: &mut (dyn Write + Send),
        _stderr: &mut (dyn Write + Send),
    ) -> ExecStatus {
        writeln!(stdout, "hello, {}", args.join(" "))?;
        Ok(ExecOutcome::Code(0))
    }
}

#[test]
fn injected_builtin_table_replaces_defaults() {
    let mut builtins = BuiltinManager::empty();
    builtins.register(Box::new(Greet));
    let config = Config {
        search_path: Some("/nonexistent".to_string()),
        ..Config::default()
    };
    let mut shell = Shell::with_builtins(&config, builtins).non_interactive();

    let mut input: &[u8] = b"greet \"big world\"\nexit\n";
    let mut out: Vec<u8> = Vec::new();
    let mut err: Vec<u8> = Vec::new();
    let status = shell.run(&mut input, &mut out, &mut err).unwrap();

    assert_eq!(status, 127);
    assert_eq!(String::from_utf8(out).unwrap(), "hello, big world\n");
    let err = String::from_utf8(err).unwrap();
    assert_eq!(err, "\"exit\": command not found\n");
}

fn spawn_picosh(args: &[&str], home: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_picosh"))
        .args(args)
        .env("HOME", home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("start picosh")
}

/// Read until `needle` shows up, returning everything read so far.
fn read_until(src: &mut impl Read, needle: &str) -> String {
    let mut seen = Vec::new();
    let mut buf = [0u8; 256];
    while !String::from_utf8_lossy(&seen).contains(needle) {
        let n = src.read(&mut buf).unwrap();
        let so_far = String::from_utf8_lossy(&seen).into_owned();
        assert!(n > 0, "output ended before {:?}: {:?}", needle, so_far);
        seen.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(seen).unwrap()
}

fn interrupt(child: &Child) {
    let pid = Pid::from_raw(child.id() as i32);
    kill(pid, Signal::SIGINT).expect("send SIGINT");
}

#[test]
fn interrupt_while_output_is_still_open_keeps_the_shell() {
    let home = TempDir::new("bin_drain");
    let line = "/bin/sh -c \"sleep 2 & echo hi\" && /bin/echo after";
    let mut child = spawn_picosh(&["-c", line], &home.0);
    drop(child.stdin.take());
    let mut stdout = child.stdout.take().unwrap();

    read_until(&mut stdout, "hi\n");
    // sh is gone by now; its background sleep still holds the output pipe
    thread::sleep(Duration::from_millis(300));
    interrupt(&child);

    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(0));
    assert_eq!(rest, "after\n");
}

#[test]
fn interrupt_at_the_prompt_keeps_the_shell() {
    let home = TempDir::new("bin_prompt");
    let mut child = spawn_picosh(&[], &home.0);
    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    read_until(&mut stdout, "(picosh)> ");
    interrupt(&child);
    thread::sleep(Duration::from_millis(200));

    let _ = stdin.write_all(b"/bin/echo alive\n");
    drop(stdin);
    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(0));
    assert_eq!(rest, "alive\n(picosh)> \n");
}

#[test]
fn interrupt_reaches_the_running_command_in_a_session() {
    let home = TempDir::new("bin_forward");
    let mut child = spawn_picosh(&[], &home.0);
    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = child.stdout.take().unwrap();

    let started = Instant::now();
    stdin
        .write_all(b"/bin/sh -c \"echo ready; exec sleep 10\"\n")
        .unwrap();
    read_until(&mut stdout, "ready\n");
    interrupt(&child);

    let _ = stdin.write_all(b"/bin/echo next\n");
    drop(stdin);
    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    let status = child.wait().unwrap();

    assert!(started.elapsed() < Duration::from_secs(8));
    assert_eq!(status.code(), Some(0));
    assert_eq!(rest, "(picosh)> next\n(picosh)> \n");
}
