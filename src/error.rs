use std::fmt;
use std::io;

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::ErrorKind;
use x11rb::protocol::xproto;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("cannot open display: {0}")]
    Connect(#[from] ConnectError),
    #[error("display connection failed: {0}")]
    Connection(#[from] ConnectionError),
    #[error("request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),
    #[error("cannot allocate color '{0}'")]
    Color(String),
    #[error("cannot load font: '{0}'")]
    Font(String),
    #[error("X protocol error: {0}")]
    Protocol(String),
    #[error("poll failed: {0}")]
    Poll(io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Requests whose errors race against a client's own destruction.
///
/// `None` matches any request. The pairs mirror what a reparenting frame
/// routinely triggers on windows that vanished between an event and our
/// reaction to it.
const IGNORABLE: &[(Option<u8>, ErrorKind)] = &[
    (None, ErrorKind::Window),
    (Some(xproto::SET_INPUT_FOCUS_REQUEST), ErrorKind::Match),
    (Some(xproto::POLY_TEXT8_REQUEST), ErrorKind::Drawable),
    (Some(xproto::IMAGE_TEXT8_REQUEST), ErrorKind::Drawable),
    (Some(xproto::POLY_FILL_RECTANGLE_REQUEST), ErrorKind::Drawable),
    (Some(xproto::COPY_AREA_REQUEST), ErrorKind::Drawable),
    (Some(xproto::CONFIGURE_WINDOW_REQUEST), ErrorKind::Match),
    (Some(xproto::GRAB_KEY_REQUEST), ErrorKind::Access),
    (Some(xproto::GRAB_BUTTON_REQUEST), ErrorKind::Access),
];

pub fn is_ignorable(major_opcode: u8, kind: ErrorKind) -> bool {
    IGNORABLE
        .iter()
        .any(|(request, error)| *error == kind && request.is_none_or(|op| op == major_opcode))
}

/// Print `message` on stderr and exit with a failure status.
pub fn die(message: impl fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
