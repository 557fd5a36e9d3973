use std::io;
use std::os::fd::{AsRawFd, RawFd};

use crate::drivers::DisplayDriver;
use crate::error::{FrameError, FrameResult};
use crate::frame::Frame;
use crate::spawn::ChildReaper;

pub enum ControlFlow {
    Continue,
    Quit,
}

/// The frame's only suspension point.
///
/// Each turn blocks in `poll(2)` on the display connection, the SIGCHLD
/// self-pipe and every listener. On wake it:
/// 1. reaps finished children if the self-pipe fired,
/// 2. reads the ready listeners and embeds the windows they announce,
/// 3. dispatches every pending window-system event.
///
/// Both sources are exhausted before the next wait, so neither starves the
/// other. The loop ends once the frame stops running.
pub struct EventLoop {
    reaper: ChildReaper,
}

impl EventLoop {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            reaper: ChildReaper::install()?,
        })
    }

    pub fn run<D: DisplayDriver>(&mut self, frame: &mut Frame<D>) -> FrameResult<()> {
        // children that exited before the handler existed
        self.reaper.drain();
        loop {
            if let ControlFlow::Quit = dispatch_pending(frame)? {
                break;
            }
            frame.driver_mut().flush()?;

            let display = frame.driver().connection_fd();
            let reaper = self.reaper.as_raw_fd();
            let mut fds = vec![display, reaper];
            fds.extend(frame.listener_fds());
            let ready = wait_readable(&fds, -1)?;

            if ready.contains(&reaper) {
                self.reaper.drain();
            }
            let listeners: Vec<RawFd> = ready
                .into_iter()
                .filter(|fd| *fd != display && *fd != reaper)
                .collect();
            if !listeners.is_empty() {
                frame.drain_listeners(&listeners)?;
            }
        }
        Ok(())
    }
}

/// Handle every event the driver already has, stopping early once the frame
/// is no longer running.
pub fn dispatch_pending<D: DisplayDriver>(frame: &mut Frame<D>) -> FrameResult<ControlFlow> {
    if !frame.running() {
        return Ok(ControlFlow::Quit);
    }
    while let Some(event) = frame.driver_mut().poll_event()? {
        tracing::trace!(?event, "dispatch");
        frame.handle_event(event)?;
        if !frame.running() {
            return Ok(ControlFlow::Quit);
        }
    }
    Ok(ControlFlow::Continue)
}

/// Wait until at least one of `fds` is readable (or hung up) and return
/// those. `timeout_ms` follows `poll(2)`: `-1` blocks indefinitely.
///
/// Interrupted waits are retried; any other failure is fatal.
pub fn wait_readable(fds: &[RawFd], timeout_ms: i32) -> FrameResult<Vec<RawFd>> {
    let mut pollfds: Vec<libc::pollfd> = fds
        .iter()
        .map(|&fd| libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();
    loop {
        // SAFETY: pollfds is a live, exclusively borrowed array of nfds entries.
        let rc = unsafe {
            libc::poll(
                pollfds.as_mut_ptr(),
                pollfds.len() as libc::nfds_t,
                timeout_ms,
            )
        };
        if rc >= 0 {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            continue;
        }
        return Err(FrameError::Poll(err));
    }
    let ready = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;
    Ok(pollfds
        .iter()
        .filter(|p| p.revents & ready != 0)
        .map(|p| p.fd)
        .collect())
}
