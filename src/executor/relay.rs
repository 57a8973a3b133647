use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, trace, warn};
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl};
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, killpg, sigaction};
use nix::unistd::{Pid, pipe};

// SIGINT disposition is process-wide, so only one relay may be armed at a time.
static RELAY_LOCK: Mutex<()> = Mutex::new(());

// Created once and never closed so the handler can never write to a stale fd.
static SIGNAL_PIPE: OnceLock<SignalPipe> = OnceLock::new();
static SIGNAL_WRITE_FD: AtomicI32 = AtomicI32::new(-1);

const RELAYING: u8 = 0;
const STOPPED: u8 = 1;

struct SignalPipe {
    reader: File,
    writer: File,
}

extern "C" fn on_interrupt(_signo: libc::c_int) {
    let fd = SIGNAL_WRITE_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte = 1u8;
        // SAFETY: write(2) is async-signal-safe; the fd lives for the whole process.
        unsafe {
            libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
        }
    }
}

pub(crate) fn lock_signal_disposition() -> MutexGuard<'static, ()> {
    RELAY_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn cloexec_pipe(nonblocking: bool) -> io::Result<(File, File)> {
    let (reader, writer) = pipe()?;
    for fd in [reader.as_raw_fd(), writer.as_raw_fd()] {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
        if nonblocking {
            fcntl(fd, FcntlArg::F_SETFL(OFlag::O_NONBLOCK))?;
        }
    }
    Ok((File::from(reader), File::from(writer)))
}

fn signal_pipe() -> io::Result<&'static SignalPipe> {
    if let Some(pipe) = SIGNAL_PIPE.get() {
        return Ok(pipe);
    }
    let (reader, writer) = cloexec_pipe(true)?;
    let pipe = SIGNAL_PIPE.get_or_init(|| SignalPipe { reader, writer });
    SIGNAL_WRITE_FD.store(pipe.writer.as_raw_fd(), Ordering::SeqCst);
    Ok(pipe)
}

/// Point SIGINT at the signal pipe, returning the disposition it replaced.
/// The caller holds the disposition lock.
fn catch_interrupts() -> io::Result<SigAction> {
    signal_pipe()?;
    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only performs an async-signal-safe write.
    let previous = unsafe { sigaction(Signal::SIGINT, &action) }?;
    Ok(previous)
}

fn restore_disposition(previous: &SigAction) {
    // SAFETY: reinstalls a disposition that was active earlier.
    if let Err(e) = unsafe { sigaction(Signal::SIGINT, previous) } {
        warn!("failed to restore SIGINT disposition: {}", e);
    }
}

/// Read everything currently in the signal pipe, returning how many
/// interrupts it held.
fn drain(mut signals: &File) -> usize {
    let mut count = 0;
    let mut buf = [0u8; 32];
    loop {
        match signals.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => count += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!("reading signal pipe failed: {}", e);
                break;
            }
        }
    }
    count
}

/// Keeps SIGINT from ending the shell while no child is running.
///
/// Interrupts caught while the guard is alive queue up in the signal pipe and
/// are discarded by the next `SignalRelay::arm`. Relays armed meanwhile hand
/// the disposition back to this guard's handler when they finish.
pub struct InterruptGuard {
    previous: SigAction,
}

impl InterruptGuard {
    pub fn install() -> io::Result<Self> {
        let _lock = lock_signal_disposition();
        let previous = catch_interrupts()?;
        debug!("idle SIGINT is discarded");
        Ok(InterruptGuard { previous })
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        let _lock = lock_signal_disposition();
        restore_disposition(&self.previous);
    }
}

/// Relay progress as seen by callers. Only reported, never consulted: the
/// relay thread's lifetime bounds forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Relaying,
    Stopped,
}

impl From<u8> for RelayState {
    fn from(v: u8) -> Self {
        if v == RELAYING {
            RelayState::Relaying
        } else {
            RelayState::Stopped
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub forwarded: usize,
    pub state: RelayState,
}

/// SIGINT capture without a target yet.
///
/// From `arm` on, every SIGINT the shell receives is queued instead of acting
/// on the shell. `start` begins forwarding the queue to a child's process
/// group. Dropping the relay restores the previous SIGINT disposition.
pub struct SignalRelay {
    previous: SigAction,
    _guard: MutexGuard<'static, ()>,
}

impl SignalRelay {
    pub fn arm() -> io::Result<Self> {
        let guard = lock_signal_disposition();
        let stale = drain(&signal_pipe()?.reader);
        if stale > 0 {
            trace!("discarded {} queued interrupt(s)", stale);
        }

        let previous = catch_interrupts()?;
        trace!("SIGINT relay armed");

        Ok(SignalRelay {
            previous,
            _guard: guard,
        })
    }

    /// Start forwarding to the process group `target` on a relay thread.
    ///
    /// If the thread cannot be started, interrupts are still caught but stay
    /// queued until the next `arm`.
    pub fn start(self, target: Pid) -> RunningRelay {
        let state = Arc::new(AtomicU8::new(RELAYING));
        let worker = match spawn_worker(target, Arc::clone(&state)) {
            Ok(worker) => {
                debug!("relaying SIGINT to process group {}", target);
                Some(worker)
            }
            Err(e) => {
                warn!("SIGINT will not reach process group {}: {}", target, e);
                state.store(STOPPED, Ordering::SeqCst);
                None
            }
        };

        RunningRelay {
            worker,
            state,
            _armed: self,
        }
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        restore_disposition(&self.previous);
        trace!("SIGINT relay disarmed");
    }
}

fn spawn_worker(target: Pid, state: Arc<AtomicU8>) -> io::Result<WorkerHandle> {
    let signals = &signal_pipe()?.reader;
    let (stop_reader, stop_writer) = cloexec_pipe(false)?;
    let worker = RelayWorker {
        signals,
        stop: stop_reader,
        target,
        state,
    };
    let thread = thread::Builder::new()
        .name("sigint-relay".to_string())
        .spawn(move || worker.run())?;
    Ok(WorkerHandle {
        stop: stop_writer,
        thread,
    })
}

struct WorkerHandle {
    stop: File,
    thread: JoinHandle<usize>,
}

/// A relay attached to a child.
///
/// `stop` ends forwarding. SIGINT stays caught until the relay is dropped, and
/// anything received in between is left for the next `arm` to discard.
pub struct RunningRelay {
    worker: Option<WorkerHandle>,
    state: Arc<AtomicU8>,
    _armed: SignalRelay,
}

impl RunningRelay {
    pub fn state(&self) -> RelayState {
        RelayState::from(self.state.load(Ordering::SeqCst))
    }

    /// Ask the relay thread to finish and wait for it.
    ///
    /// Interrupts received before this call are forwarded before it returns;
    /// none received afterwards are.
    pub fn stop(&mut self) -> RelayReport {
        let forwarded = self.shutdown();
        RelayReport {
            forwarded,
            state: self.state(),
        }
    }

    fn shutdown(&mut self) -> usize {
        let Some(mut worker) = self.worker.take() else {
            return 0;
        };
        if let Err(e) = worker.stop.write_all(&[1]) {
            warn!("failed to signal relay shutdown: {}", e);
        }
        match worker.thread.join() {
            Ok(forwarded) => forwarded,
            Err(_) => {
                warn!("signal relay thread panicked");
                0
            }
        }
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct RelayWorker {
    signals: &'static File,
    stop: File,
    target: Pid,
    state: Arc<AtomicU8>,
}

impl RelayWorker {
    fn run(self) -> usize {
        let mut forwarded = 0;
        loop {
            let (signalled, stopping) = match self.wait() {
                Ok(ready) => ready,
                Err(e) => {
                    warn!("signal relay wait failed: {}", e);
                    (false, true)
                }
            };
            if signalled || stopping {
                forwarded += self.forward_pending();
            }
            if stopping {
                break;
            }
        }

        self.state.store(STOPPED, Ordering::SeqCst);
        debug!(
            "SIGINT relay for {} stopped after {} forward(s)",
            self.target, forwarded
        );
        forwarded
    }

    /// Block until an interrupt is queued or a stop is requested.
    fn wait(&self) -> nix::Result<(bool, bool)> {
        loop {
            let mut fds = [
                PollFd::new(self.signals.as_fd(), PollFlags::POLLIN),
                PollFd::new(self.stop.as_fd(), PollFlags::POLLIN),
            ];
            match poll(&mut fds, PollTimeout::NONE) {
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e),
                Ok(_) => {}
            }
            let ready = |fd: &PollFd| {
                fd.revents()
                    .is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP))
            };
            return Ok((ready(&fds[0]), ready(&fds[1])));
        }
    }

    fn forward_pending(&self) -> usize {
        let pending = drain(self.signals);
        for _ in 0..pending {
            match killpg(self.target, Signal::SIGINT) {
                Ok(()) => debug!("forwarded SIGINT to process group {}", self.target),
                Err(Errno::ESRCH) => debug!("process group {} already gone", self.target),
                Err(e) => warn!("failed to forward SIGINT to {}: {}", self.target, e),
            }
        }
        pending
    }
}
