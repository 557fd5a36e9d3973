use std::io::{self, Write};

use crate::Xid;
use crate::drivers::DisplayDriver;
use crate::drivers::x11::X11Driver;
use crate::error::FrameResult;
use crate::event_loop::EventLoop;
use crate::frame::Frame;
use crate::keybindings::KeyBindings;
use crate::listener::Listener;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Fork after announcing the window id; the parent exits 0.
    pub detach: bool,
}

/// Set up the frame on `$DISPLAY`, announce its id on stdout, run the event
/// loop to completion and release everything.
pub fn run(options: RunOptions) -> FrameResult<()> {
    let theme = Theme::default();
    let bindings = KeyBindings::default();
    for (keys, action) in bindings.help_entries() {
        tracing::debug!(%keys, %action, "binding");
    }

    let driver = X11Driver::connect(&theme)?;
    let mut frame = Frame::new(driver, theme, bindings);
    match Listener::stdin() {
        Ok(stdin) => frame.add_listener(stdin),
        Err(err) => tracing::warn!(error = %err, "not listening on stdin"),
    }
    frame.start()?;

    let id = frame.driver().frame_window();
    announce(&mut io::stdout().lock(), id)?;
    if options.detach {
        detach()?;
    }

    let mut event_loop = EventLoop::new()?;
    let result = event_loop.run(&mut frame);
    let released = frame.teardown();
    if let (Err(_), Err(err)) = (&result, &released) {
        tracing::warn!(error = %err, "release after failure");
    }
    result.and(released)
}

/// Print the frame's window id as one decimal line, so whatever reads our
/// stdout can embed into it.
pub fn announce<W: Write>(out: &mut W, id: Xid) -> io::Result<()> {
    writeln!(out, "{id}")?;
    out.flush()
}

fn detach() -> io::Result<()> {
    // SAFETY: no other threads exist yet, so the child inherits a consistent process.
    match unsafe { libc::fork() } {
        -1 => Err(io::Error::last_os_error()),
        0 => {
            tracing::debug!(pid = std::process::id(), "detached");
            // SAFETY: nothing in the child holds an owned handle to fd 1.
            unsafe {
                libc::close(libc::STDOUT_FILENO);
            }
            Ok(())
        }
        // the child owns the display connection from here on
        _ => std::process::exit(0),
    }
}
