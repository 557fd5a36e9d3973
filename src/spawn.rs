//! Launching window-announcing programs and reaping them.
//!
//! A spawned program's stdout is a pipe whose read end becomes a listener.
//! Children are reaped from the event loop: SIGCHLD only writes a byte into
//! a self-pipe, and the loop calls [`ChildReaper::drain`] when it wakes.

use std::io::{self, Read};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::net::UnixStream;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use signal_hook::SigId;
use signal_hook::consts::SIGCHLD;

use crate::listener::{Listener, ListenerSource};

/// Start `argv` in its own session with stdout piped back to us.
///
/// The returned listener yields the window ids the program prints. Exec
/// failures surface here as errors; nothing is left running in that case.
pub fn spawn(argv: &[String]) -> io::Result<Listener> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
    let (read_end, write_end) = pipe()?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(write_end));
    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        command.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
    let child = command.spawn()?;
    // closes our copy of the write end so EOF arrives when the child exits
    drop(command);

    tracing::info!(pid = child.id(), program = %program, "spawned");
    Ok(Listener::new(ListenerSource::Child(child.id()), read_end))
}

fn pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: fds has room for the two descriptors pipe2 writes.
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe2 succeeded, so both descriptors are fresh and ours.
    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}

/// Collect every child that has already exited, without blocking.
pub fn reap_children() -> usize {
    let mut reaped = 0;
    loop {
        let mut status: libc::c_int = 0;
        // SAFETY: status is a valid out-pointer for the duration of the call.
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
        if pid <= 0 {
            break;
        }
        tracing::debug!(pid, status, "reaped child");
        reaped += 1;
    }
    reaped
}

/// SIGCHLD self-pipe. Its read end goes into the loop's poll set.
#[derive(Debug)]
pub struct ChildReaper {
    wake: UnixStream,
    sig: SigId,
}

impl ChildReaper {
    pub fn install() -> io::Result<Self> {
        let (wake, notify) = UnixStream::pair()?;
        wake.set_nonblocking(true)?;
        notify.set_nonblocking(true)?;
        let sig = signal_hook::low_level::pipe::register(SIGCHLD, notify)?;
        Ok(Self { wake, sig })
    }

    /// Empty the self-pipe and reap. Returns how many children were reaped.
    pub fn drain(&mut self) -> usize {
        let mut buf = [0u8; 64];
        loop {
            match (&self.wake).read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        reap_children()
    }
}

impl AsRawFd for ChildReaper {
    fn as_raw_fd(&self) -> RawFd {
        self.wake.as_raw_fd()
    }
}

impl Drop for ChildReaper {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.sig);
    }
}
