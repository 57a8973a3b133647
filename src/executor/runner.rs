use std::io::{self, Read, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use log::{debug, warn};
use nix::unistd::Pid;

use crate::executor::ExecError;
use crate::executor::relay::SignalRelay;

/// Runs external programs to completion while relaying SIGINT to them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Run `program` with `args`, copying its stdout and stderr into the given
    /// sinks. Returns the exit status; a non-zero status is not an error.
    pub fn run(
        &self,
        program: &Path,
        args: &[String],
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> Result<i32, ExecError> {
        let name = program.display().to_string();

        // Armed before spawn so an interrupt right after launch is not lost
        let relay = SignalRelay::arm().map_err(relay_unavailable)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|source| ExecError::Launch {
                name: name.clone(),
                source,
            })?;
        let pid = Pid::from_raw(child.id() as i32);
        debug!("started {} as pid {}", name, pid);

        let child_out = child.stdout.take();
        let child_err = child.stderr.take();

        thread::scope(|s| {
            let out = s.spawn(move || copy_stream(child_out, stdout));
            let err = s.spawn(move || copy_stream(child_err, stderr));

            let mut running = relay.start(pid);

            // The child stays unreaped until forwarding has stopped, so its
            // process group id cannot be reused while forwards are pending.
            if let Err(e) = wait_for_exit(pid) {
                warn!("waiting for {} failed: {}", pid, e);
            }
            let report = running.stop();
            debug!("relay for {} finished: {:?}", pid, report);
            let status = child.wait()?;

            // Descendants may hold the pipes open after the child exits; SIGINT
            // stays caught until both streams are drained.
            let copied_out = out.join().map_err(|_| io::Error::other("stdout copy panicked"));
            let copied_err = err.join().map_err(|_| io::Error::other("stderr copy panicked"));
            drop(running);
            copied_out??;
            copied_err??;

            let code = exit_code(status);
            debug!("{} exited with {}", name, code);
            Ok(code)
        })
    }
}

/// SIGINT could not be caught, so the program is never started.
fn relay_unavailable(source: io::Error) -> ExecError {
    warn!("cannot catch SIGINT: {}", source);
    ExecError::Io(source)
}

/// Block until `pid` has terminated, leaving it waitable.
fn wait_for_exit(pid: Pid) -> io::Result<()> {
    loop {
        // SAFETY: siginfo_t is plain data; waitid only writes into it.
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::waitid(
                libc::P_PID,
                pid.as_raw() as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Copy a child stream into a sink. If the sink fails the stream is still
/// drained so the child never blocks on a full pipe.
fn copy_stream<R: Read>(src: Option<R>, dst: &mut (dyn Write + Send)) -> io::Result<u64> {
    let Some(mut src) = src else {
        return Ok(0);
    };
    match io::copy(&mut src, dst).and_then(|n| dst.flush().map(|_| n)) {
        Ok(n) => Ok(n),
        Err(e) => {
            let _ = io::copy(&mut src, &mut io::sink());
            Err(e)
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => match status.signal() {
            Some(signal) => 128 + signal,
            None => 1,
        },
    }
}
