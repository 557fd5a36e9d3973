pub mod keysym;
pub mod x11;

use std::os::fd::RawFd;

use crate::Xid;
use crate::error::FrameResult;
use crate::keybindings::KeyBindings;
use crate::layout::Rect;
use crate::theme::ColorScheme;

use keysym::Keysym;

/// XEMBED messages a frame sends to the windows it hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XEmbedMessage {
    EmbeddedNotify,
    WindowActivate,
    WindowDeactivate,
    RequestFocus,
    FocusIn,
    FocusOut,
}

impl XEmbedMessage {
    pub fn opcode(self) -> u32 {
        match self {
            Self::EmbeddedNotify => 0,
            Self::WindowActivate => 1,
            Self::WindowDeactivate => 2,
            Self::RequestFocus => 3,
            Self::FocusIn => 4,
            Self::FocusOut => 5,
        }
    }

    pub fn from_opcode(opcode: u32) -> Option<Self> {
        Some(match opcode {
            0 => Self::EmbeddedNotify,
            1 => Self::WindowActivate,
            2 => Self::WindowDeactivate,
            3 => Self::RequestFocus,
            4 => Self::FocusIn,
            5 => Self::FocusOut,
            _ => return None,
        })
    }
}

/// `detail` value of a `FocusIn` message: keep the client's current focus.
pub const XEMBED_FOCUS_CURRENT: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `WM_NAME` or `_NET_WM_NAME`.
    Title,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessageKind {
    /// The window manager asks the frame to close.
    DeleteWindow,
    XEmbed(XEmbedMessage),
    Other,
}

/// Window-system events the frame reacts to, already decoded by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    Configure {
        window: Xid,
        width: u16,
        height: u16,
    },
    Create {
        window: Xid,
        parent: Xid,
    },
    Destroy {
        window: Xid,
    },
    MapRequest {
        window: Xid,
        parent: Xid,
    },
    Unmap {
        window: Xid,
    },
    Expose {
        window: Xid,
        count: u16,
    },
    PropertyChange {
        window: Xid,
        property: PropertyKind,
    },
    ClientMessage {
        window: Xid,
        kind: ClientMessageKind,
    },
    ButtonPress {
        window: Xid,
        button: u8,
        x: i16,
        y: i16,
    },
    /// `mods` has lock modifiers stripped.
    KeyPress {
        keysym: Keysym,
        mods: u16,
    },
    FocusIn {
        window: Xid,
    },
    KeyboardMappingChanged,
}

/// The two drawing operations the tab bar needs.
pub trait TextPainter {
    fn text_width(&self, text: &str) -> u32;

    /// Fill `rect` with the scheme's background and draw `text` inside it in
    /// the scheme's foreground, cut to fit.
    fn draw_text(&mut self, rect: Rect, scheme: ColorScheme, text: &str) -> FrameResult<()>;

    /// Copy the drawn bar onto the frame window.
    fn present(&mut self, rect: Rect) -> FrameResult<()>;
}

/// Requests the frame issues against the display connection.
pub trait DisplayDriver: TextPainter {
    fn frame_window(&self) -> Xid;
    fn bar_height(&self) -> u16;
    fn connection_fd(&self) -> RawFd;

    /// Next already-received event, without blocking.
    fn poll_event(&mut self) -> FrameResult<Option<WindowEvent>>;
    fn flush(&mut self) -> FrameResult<()>;

    fn reparent_into_frame(&mut self, window: Xid, at: Rect) -> FrameResult<()>;
    fn watch_client(&mut self, window: Xid) -> FrameResult<()>;
    fn map(&mut self, window: Xid) -> FrameResult<()>;
    fn move_resize(&mut self, window: Xid, rect: Rect) -> FrameResult<()>;
    fn raise(&mut self, window: Xid) -> FrameResult<()>;
    fn focus_input(&mut self, window: Xid) -> FrameResult<()>;
    fn grab_keys(&mut self, window: Xid, bindings: &KeyBindings) -> FrameResult<()>;

    fn send_xembed(
        &mut self,
        window: Xid,
        message: XEmbedMessage,
        detail: u32,
        data1: u32,
        data2: u32,
    ) -> FrameResult<()>;
    fn supports_delete(&mut self, window: Xid) -> FrameResult<bool>;
    fn send_delete(&mut self, window: Xid) -> FrameResult<()>;
    fn kill(&mut self, window: Xid) -> FrameResult<()>;

    fn fetch_title(&mut self, window: Xid) -> FrameResult<Option<String>>;
    fn set_frame_title(&mut self, title: &str) -> FrameResult<()>;

    /// Resize the off-screen drawing surface to the frame size.
    fn resize_canvas(&mut self, width: u16, height: u16) -> FrameResult<()>;
    fn refresh_keyboard(&mut self) -> FrameResult<()>;

    /// Hand every client back to the root window and free frame resources.
    fn release(&mut self, clients: &[Xid]) -> FrameResult<()>;
}
