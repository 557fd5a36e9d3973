#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

use tabframe::Xid;
use tabframe::drivers::{DisplayDriver, TextPainter, WindowEvent, XEmbedMessage};
use tabframe::error::FrameResult;
use tabframe::frame::Frame;
use tabframe::keybindings::KeyBindings;
use tabframe::layout::Rect;
use tabframe::theme::{ColorScheme, Theme};

pub const FRAME: Xid = 0xf000;
pub const BAR_HEIGHT: u16 = 16;
pub const CHAR_WIDTH: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Reparent(Xid, Rect),
    Watch(Xid),
    Map(Xid),
    MoveResize(Xid, Rect),
    Raise(Xid),
    FocusInput(Xid),
    GrabKeys(Xid),
    XEmbed(Xid, XEmbedMessage, u32, u32, u32),
    Delete(Xid),
    Kill(Xid),
    SetTitle(String),
    ResizeCanvas(u16, u16),
    RefreshKeyboard,
    Release(Vec<Xid>),
    Draw(Rect, ColorScheme, String),
    Present(Rect),
}

/// In-memory display that records every request and replays scripted events.
pub struct MockDriver {
    pub calls: Vec<Call>,
    pub events: VecDeque<WindowEvent>,
    pub titles: HashMap<Xid, String>,
    pub delete_capable: HashSet<Xid>,
    /// Once this many windows were embedded and the script ran dry, report
    /// the frame as unmapped so a running loop ends.
    pub quit_after_embeds: Option<usize>,
    quit_sent: bool,
    connection: (UnixStream, UnixStream),
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            events: VecDeque::new(),
            titles: HashMap::new(),
            delete_capable: HashSet::new(),
            quit_after_embeds: None,
            quit_sent: false,
            connection: UnixStream::pair().expect("socket pair"),
        }
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn embeds(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Reparent(..)))
            .count()
    }

    /// XEMBED messages sent to `window`, in order.
    pub fn xembed_to(&self, window: Xid) -> Vec<XEmbedMessage> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::XEmbed(w, msg, ..) if *w == window => Some(*msg),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn last_title(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::SetTitle(t) => Some(t.as_str()),
            _ => None,
        })
    }

    /// Labels drawn since the last `take_calls`, in paint order.
    pub fn drawn_labels(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(_, _, label) if !label.is_empty() => Some(label.clone()),
                _ => None,
            })
            .collect()
    }
}

impl TextPainter for MockDriver {
    fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * CHAR_WIDTH
    }

    fn draw_text(&mut self, rect: Rect, scheme: ColorScheme, text: &str) -> FrameResult<()> {
        self.calls.push(Call::Draw(rect, scheme, text.to_string()));
        Ok(())
    }

    fn present(&mut self, rect: Rect) -> FrameResult<()> {
        self.calls.push(Call::Present(rect));
        Ok(())
    }
}

impl DisplayDriver for MockDriver {
    fn frame_window(&self) -> Xid {
        FRAME
    }

    fn bar_height(&self) -> u16 {
        BAR_HEIGHT
    }

    fn connection_fd(&self) -> RawFd {
        self.connection.0.as_raw_fd()
    }

    fn poll_event(&mut self) -> FrameResult<Option<WindowEvent>> {
        if let Some(event) = self.events.pop_front() {
            return Ok(Some(event));
        }
        if let Some(limit) = self.quit_after_embeds
            && !self.quit_sent
            && self.embeds() >= limit
        {
            self.quit_sent = true;
            return Ok(Some(WindowEvent::Unmap { window: FRAME }));
        }
        Ok(None)
    }

    fn flush(&mut self) -> FrameResult<()> {
        Ok(())
    }

    fn reparent_into_frame(&mut self, window: Xid, at: Rect) -> FrameResult<()> {
        self.calls.push(Call::Reparent(window, at));
        Ok(())
    }

    fn watch_client(&mut self, window: Xid) -> FrameResult<()> {
        self.calls.push(Call::Watch(window));
        Ok(())
    }

    fn map(&mut self, window: Xid) -> FrameResult<()> {
        self.calls.push(Call::Map(window));
        Ok(())
    }

    fn move_resize(&mut self, window: Xid, rect: Rect) -> FrameResult<()> {
        self.calls.push(Call::MoveResize(window, rect));
        Ok(())
    }

    fn raise(&mut self, window: Xid) -> FrameResult<()> {
        self.calls.push(Call::Raise(window));
        Ok(())
    }

    fn focus_input(&mut self, window: Xid) -> FrameResult<()> {
        self.calls.push(Call::FocusInput(window));
        Ok(())
    }

    fn grab_keys(&mut self, window: Xid, _bindings: &KeyBindings) -> FrameResult<()> {
        self.calls.push(Call::GrabKeys(window));
        Ok(())
    }

    fn send_xembed(
        &mut self,
        window: Xid,
        message: XEmbedMessage,
        detail: u32,
        data1: u32,
        data2: u32,
    ) -> FrameResult<()> {
        self.calls
            .push(Call::XEmbed(window, message, detail, data1, data2));
        Ok(())
    }

    fn supports_delete(&mut self, window: Xid) -> FrameResult<bool> {
        Ok(self.delete_capable.contains(&window))
    }

    fn send_delete(&mut self, window: Xid) -> FrameResult<()> {
        self.calls.push(Call::Delete(window));
        Ok(())
    }

    fn kill(&mut self, window: Xid) -> FrameResult<()> {
        self.calls.push(Call::Kill(window));
        Ok(())
    }

    fn fetch_title(&mut self, window: Xid) -> FrameResult<Option<String>> {
        Ok(self.titles.get(&window).cloned())
    }

    fn set_frame_title(&mut self, title: &str) -> FrameResult<()> {
        self.calls.push(Call::SetTitle(title.to_string()));
        Ok(())
    }

    fn resize_canvas(&mut self, width: u16, height: u16) -> FrameResult<()> {
        self.calls.push(Call::ResizeCanvas(width, height));
        Ok(())
    }

    fn refresh_keyboard(&mut self) -> FrameResult<()> {
        self.calls.push(Call::RefreshKeyboard);
        Ok(())
    }

    fn release(&mut self, clients: &[Xid]) -> FrameResult<()> {
        self.calls.push(Call::Release(clients.to_vec()));
        Ok(())
    }
}

/// A started frame over a fresh mock with the shipped theme and bindings.
pub fn started_frame() -> Frame<MockDriver> {
    started_frame_with(MockDriver::new())
}

pub fn started_frame_with(driver: MockDriver) -> Frame<MockDriver> {
    let mut frame = Frame::new(driver, Theme::default(), KeyBindings::default());
    frame.start().expect("start");
    frame
}

/// Content area of the default 800x600 frame.
pub fn content() -> Rect {
    Rect::new(0, BAR_HEIGHT as i16, 800, 600 - BAR_HEIGHT)
}
