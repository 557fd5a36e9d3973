//! Byte streams that announce windows to embed.
//!
//! Each line on a listener is a decimal window id terminated by `\n` or NUL.
//! Zero and non-numeric lines are dropped. Lines may straddle reads; the
//! unterminated tail is kept until the next read (or end of file) completes
//! it.

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};

use crate::Xid;
use crate::constants::{LISTENER_MAX_LINE, LISTENER_READ_CHUNK};

#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
    overflowed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed freshly read bytes, returning every window id completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Xid> {
        let mut ids = Vec::new();
        for &byte in bytes {
            if byte == b'\n' || byte == 0 {
                if !self.overflowed
                    && let Some(id) = parse_window_id(&self.partial)
                {
                    ids.push(id);
                }
                self.partial.clear();
                self.overflowed = false;
            } else if !self.overflowed {
                if self.partial.len() >= LISTENER_MAX_LINE {
                    self.partial.clear();
                    self.overflowed = true;
                } else {
                    self.partial.push(byte);
                }
            }
        }
        ids
    }

    /// Treat whatever is buffered as a final, unterminated line.
    pub fn finish(&mut self) -> Option<Xid> {
        let id = if self.overflowed {
            None
        } else {
            parse_window_id(&self.partial)
        };
        self.partial.clear();
        self.overflowed = false;
        id
    }

    pub fn pending(&self) -> &[u8] {
        &self.partial
    }
}

/// Parse one protocol line. Surrounding whitespace (including `\r`) is
/// tolerated; zero is not a window.
pub fn parse_window_id(line: &[u8]) -> Option<Xid> {
    let text = std::str::from_utf8(line).ok()?.trim();
    match text.parse::<Xid>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerSource {
    Stdin,
    Child(u32),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Ids completed by this read; the listener stays open.
    Lines(Vec<Xid>),
    /// End of file or a read error; the listener must be dropped after the
    /// final ids are registered.
    Closed(Vec<Xid>),
}

#[derive(Debug)]
pub struct Listener {
    source: ListenerSource,
    stream: File,
    buffer: LineBuffer,
}

impl Listener {
    pub fn new(source: ListenerSource, fd: OwnedFd) -> Self {
        Self {
            source,
            stream: File::from(fd),
            buffer: LineBuffer::new(),
        }
    }

    /// Listener over this process's standard input.
    pub fn stdin() -> io::Result<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Ok(Self::new(ListenerSource::Stdin, fd))
    }

    pub fn source(&self) -> ListenerSource {
        self.source
    }

    /// Perform one read. Call only when the descriptor polled readable.
    pub fn read_available(&mut self) -> ReadOutcome {
        let mut chunk = [0u8; LISTENER_READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return ReadOutcome::Closed(self.buffer.finish().into_iter().collect()),
                Ok(n) => return ReadOutcome::Lines(self.buffer.push(&chunk[..n])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    return ReadOutcome::Lines(Vec::new());
                }
                Err(err) => {
                    tracing::warn!(source = ?self.source, error = %err, "listener read failed");
                    return ReadOutcome::Closed(Vec::new());
                }
            }
        }
    }
}

impl AsFd for Listener {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }
}

impl AsRawFd for Listener {
    fn as_raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }
}

/// Live listeners, most recently added first.
#[derive(Debug, Default)]
pub struct ListenerSet {
    listeners: Vec<Listener>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, listener: Listener) {
        self.listeners.insert(0, listener);
    }

    /// Drop the listener reading from `fd`.
    pub fn remove(&mut self, fd: RawFd) -> Option<Listener> {
        let idx = self.listeners.iter().position(|l| l.as_raw_fd() == fd)?;
        Some(self.listeners.remove(idx))
    }

    pub fn get_mut(&mut self, fd: RawFd) -> Option<&mut Listener> {
        self.listeners.iter_mut().find(|l| l.as_raw_fd() == fd)
    }

    pub fn raw_fds(&self) -> Vec<RawFd> {
        self.listeners.iter().map(|l| l.as_raw_fd()).collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Read from every listener whose descriptor is in `ready`, unlinking the
    /// ones that closed. Ids come back in read order.
    pub fn drain_ready(&mut self, ready: &[RawFd]) -> Vec<Xid> {
        let mut ids = Vec::new();
        for &fd in ready {
            let Some(listener) = self.get_mut(fd) else {
                continue;
            };
            match listener.read_available() {
                ReadOutcome::Lines(found) => ids.extend(found),
                ReadOutcome::Closed(found) => {
                    ids.extend(found);
                    if let Some(closed) = self.remove(fd) {
                        tracing::debug!(source = ?closed.source(), "listener closed");
                    }
                }
            }
        }
        ids
    }
}
