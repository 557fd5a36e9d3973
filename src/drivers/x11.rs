//! X11 backend over `x11rb`'s pure-Rust connection.
//!
//! Requests are sent unchecked. Their errors come back through the event
//! stream, where the ignorable ones (races with a client's own destruction)
//! are dropped and the rest abort the frame.

use std::os::fd::{AsRawFd, RawFd};

use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    AtomEnum, ChangeGCAux, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureWindowAux,
    ConnectionExt as _, CreateGCAux, CreateWindowAux, EventMask, Font, Gcontext, Grab, GrabMode,
    InputFocus, Mapping, ModMask, Pixmap, PropMode, QueryFontReply, Rectangle, StackMode, Window,
    WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME};

use super::keysym::{KeyMap, XK_NUM_LOCK, clean_mask, lock_variants, modifier_bit_for};
use super::{
    ClientMessageKind, DisplayDriver, PropertyKind, TextPainter, WindowEvent, XEmbedMessage,
};
use crate::Xid;
use crate::constants::{INITIAL_HEIGHT, INITIAL_WIDTH};
use crate::error::{FrameError, FrameResult, is_ignorable};
use crate::keybindings::KeyBindings;
use crate::layout::Rect;
use crate::theme::{ColorScheme, Theme, parse_hex_color};

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        _XEMBED,
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

/// `PointerRoot` as a focus target.
const POINTER_ROOT: Window = 1;

/// Longest property value fetched for a title, in 32-bit units.
const TITLE_FETCH_LEN: u32 = 256;

const ELLIPSIS: &[u8] = b"..";

/// Per-character advance widths of a core font.
#[derive(Debug, Clone)]
struct FontMetrics {
    id: Font,
    ascent: i16,
    descent: i16,
    min_char: u16,
    widths: Vec<i16>,
    fallback_width: i16,
}

impl FontMetrics {
    fn from_reply(id: Font, reply: &QueryFontReply) -> Self {
        let fallback_width = if reply.char_infos.is_empty() {
            reply.max_bounds.character_width
        } else {
            reply
                .default_char
                .checked_sub(reply.min_char_or_byte2)
                .and_then(|idx| reply.char_infos.get(usize::from(idx)))
                .map(|info| info.character_width)
                .unwrap_or(reply.max_bounds.character_width)
        };
        Self {
            id,
            ascent: reply.font_ascent,
            descent: reply.font_descent,
            min_char: reply.min_char_or_byte2,
            widths: reply
                .char_infos
                .iter()
                .map(|info| info.character_width)
                .collect(),
            fallback_width,
        }
    }

    fn height(&self) -> i16 {
        self.ascent + self.descent
    }

    fn char_width(&self, byte: u8) -> u32 {
        let width = u16::from(byte)
            .checked_sub(self.min_char)
            .and_then(|idx| self.widths.get(usize::from(idx)))
            .copied()
            .unwrap_or(self.fallback_width);
        width.max(0) as u32
    }

    fn width(&self, bytes: &[u8]) -> u32 {
        bytes.iter().map(|b| self.char_width(*b)).sum()
    }

    /// Longest rendering of `bytes` within `avail` pixels, marking a cut with
    /// an ellipsis.
    fn fit(&self, bytes: &[u8], avail: u32) -> Vec<u8> {
        if self.width(bytes) <= avail {
            return bytes.to_vec();
        }
        let budget = avail.saturating_sub(self.width(ELLIPSIS));
        if self.width(ELLIPSIS) > avail {
            return Vec::new();
        }
        let mut used = 0;
        let mut out = Vec::with_capacity(bytes.len());
        for &b in bytes {
            let w = self.char_width(b);
            if used + w > budget {
                break;
            }
            used += w;
            out.push(b);
        }
        out.extend_from_slice(ELLIPSIS);
        out
    }
}

/// Core fonts index glyphs by Latin-1 byte; anything outside becomes `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    normal: (u32, u32),
    selected: (u32, u32),
}

impl Palette {
    fn get(&self, scheme: ColorScheme) -> (u32, u32) {
        match scheme {
            ColorScheme::Normal => self.normal,
            ColorScheme::Selected => self.selected,
        }
    }
}

pub struct X11Driver {
    conn: RustConnection,
    root: Window,
    frame: Window,
    depth: u8,
    atoms: Atoms,
    gc: Gcontext,
    canvas: Pixmap,
    font: FontMetrics,
    palette: Palette,
    keymap: KeyMap,
    numlock: u16,
}

impl X11Driver {
    /// Connect to `$DISPLAY` and create the (mapped, raised) frame window.
    pub fn connect(theme: &Theme) -> FrameResult<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = conn.setup().roots[screen_num].clone();
        let root = screen.root;
        tracing::info!(
            screen = screen_num,
            root,
            width = screen.width_in_pixels,
            height = screen.height_in_pixels,
            "connected to X server"
        );

        let atoms = Atoms::new(&conn)?.reply()?;
        let font = load_font(&conn, &theme.font, &theme.fallback_font)?;
        let cmap = screen.default_colormap;
        let scheme_pixels = |scheme| -> FrameResult<(u32, u32)> {
            let (bg, fg) = theme.colors(scheme);
            Ok((alloc_color(&conn, cmap, bg)?, alloc_color(&conn, cmap, fg)?))
        };
        let palette = Palette {
            normal: scheme_pixels(ColorScheme::Normal)?,
            selected: scheme_pixels(ColorScheme::Selected)?,
        };

        let frame = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            frame,
            root,
            0,
            0,
            INITIAL_WIDTH,
            INITIAL_HEIGHT,
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new()
                .background_pixel(palette.normal.0)
                .border_pixel(palette.normal.1)
                .event_mask(
                    EventMask::STRUCTURE_NOTIFY
                        | EventMask::SUBSTRUCTURE_NOTIFY
                        | EventMask::SUBSTRUCTURE_REDIRECT
                        | EventMask::BUTTON_PRESS
                        | EventMask::KEY_PRESS
                        | EventMask::EXPOSURE
                        | EventMask::FOCUS_CHANGE
                        | EventMask::PROPERTY_CHANGE,
                ),
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            frame,
            atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[atoms.WM_DELETE_WINDOW],
        )?;

        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            root,
            &CreateGCAux::new().font(font.id).graphics_exposures(0),
        )?;
        let canvas = conn.generate_id()?;
        conn.create_pixmap(
            screen.root_depth,
            canvas,
            root,
            INITIAL_WIDTH,
            INITIAL_HEIGHT,
        )?;

        conn.map_window(frame)?;
        conn.configure_window(frame, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;

        let mut driver = Self {
            conn,
            root,
            frame,
            depth: screen.root_depth,
            atoms,
            gc,
            canvas,
            font,
            palette,
            keymap: KeyMap::default(),
            numlock: 0,
        };
        driver.refresh_keyboard()?;
        driver.conn.flush()?;
        Ok(driver)
    }

    fn client_message(&mut self, window: Window, type_: u32, data: [u32; 5]) -> FrameResult<()> {
        let event = ClientMessageEvent::new(32, window, type_, data);
        self.conn
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    /// Read a text property, treating a vanished window as "no value".
    fn text_property(&self, window: Window, property: u32, type_: u32) -> FrameResult<Option<String>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, TITLE_FETCH_LEN)?
            .reply();
        match reply {
            Ok(reply) if reply.format == 8 && !reply.value.is_empty() => {
                Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
            }
            Ok(_) => Ok(None),
            Err(ReplyError::X11Error(err)) => {
                tracing::debug!(window, error = ?err.error_kind, "title lookup failed");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn translate(&self, event: Event) -> FrameResult<Option<WindowEvent>> {
        let translated = match event {
            Event::Error(err) => {
                if is_ignorable(err.major_opcode, err.error_kind) {
                    tracing::debug!(
                        request = err.request_name.unwrap_or("unknown"),
                        error = ?err.error_kind,
                        resource = err.bad_value,
                        "ignoring protocol error"
                    );
                    return Ok(None);
                }
                return Err(FrameError::Protocol(format!(
                    "request {} (opcode {}) failed with {:?} on resource 0x{:x}",
                    err.request_name.unwrap_or("unknown"),
                    err.major_opcode,
                    err.error_kind,
                    err.bad_value
                )));
            }
            Event::ConfigureNotify(e) => WindowEvent::Configure {
                window: e.window,
                width: e.width,
                height: e.height,
            },
            Event::CreateNotify(e) => WindowEvent::Create {
                window: e.window,
                parent: e.parent,
            },
            Event::DestroyNotify(e) => WindowEvent::Destroy { window: e.window },
            Event::MapRequest(e) => WindowEvent::MapRequest {
                window: e.window,
                parent: e.parent,
            },
            Event::UnmapNotify(e) => WindowEvent::Unmap { window: e.window },
            Event::Expose(e) => WindowEvent::Expose {
                window: e.window,
                count: e.count,
            },
            Event::PropertyNotify(e) => {
                let property = if e.atom == self.atoms._NET_WM_NAME
                    || e.atom == u32::from(AtomEnum::WM_NAME)
                {
                    PropertyKind::Title
                } else {
                    PropertyKind::Other
                };
                WindowEvent::PropertyChange {
                    window: e.window,
                    property,
                }
            }
            Event::ClientMessage(e) => {
                let data = e.data.as_data32();
                let kind = if e.format != 32 {
                    ClientMessageKind::Other
                } else if e.type_ == self.atoms.WM_PROTOCOLS
                    && data[0] == self.atoms.WM_DELETE_WINDOW
                {
                    ClientMessageKind::DeleteWindow
                } else if e.type_ == self.atoms._XEMBED {
                    XEmbedMessage::from_opcode(data[1])
                        .map(ClientMessageKind::XEmbed)
                        .unwrap_or(ClientMessageKind::Other)
                } else {
                    ClientMessageKind::Other
                };
                WindowEvent::ClientMessage {
                    window: e.window,
                    kind,
                }
            }
            Event::ButtonPress(e) => WindowEvent::ButtonPress {
                window: e.event,
                button: e.detail,
                x: e.event_x,
                y: e.event_y,
            },
            Event::KeyPress(e) => WindowEvent::KeyPress {
                keysym: self.keymap.keysym(e.detail),
                mods: clean_mask(u16::from(e.state), self.numlock),
            },
            Event::FocusIn(e) => WindowEvent::FocusIn { window: e.event },
            Event::MappingNotify(e) if e.request != Mapping::POINTER => {
                WindowEvent::KeyboardMappingChanged
            }
            _ => return Ok(None),
        };
        Ok(Some(translated))
    }
}

impl TextPainter for X11Driver {
    fn text_width(&self, text: &str) -> u32 {
        self.font.width(&latin1(text))
    }

    fn draw_text(&mut self, rect: Rect, scheme: ColorScheme, text: &str) -> FrameResult<()> {
        if rect.is_empty() {
            return Ok(());
        }
        let (bg, fg) = self.palette.get(scheme);
        self.conn
            .change_gc(self.gc, &ChangeGCAux::new().foreground(bg))?;
        self.conn.poly_fill_rectangle(
            self.canvas,
            self.gc,
            &[Rectangle {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            }],
        )?;
        if text.is_empty() {
            return Ok(());
        }

        let bytes = latin1(text);
        let width = u32::from(rect.width);
        let natural = self.font.width(&bytes);
        let pad = (self.font.height().max(0) as u32 / 2).min(width.saturating_sub(natural) / 2);
        let fitted = self.font.fit(&bytes, width.saturating_sub(pad * 2));
        if fitted.is_empty() {
            return Ok(());
        }
        let x = rect.x.saturating_add(pad as i16);
        let y = rect.y + (rect.height as i16 - self.font.height()) / 2 + self.font.ascent;
        self.conn
            .change_gc(self.gc, &ChangeGCAux::new().foreground(fg).background(bg))?;
        self.conn.image_text8(self.canvas, self.gc, x, y, &fitted)?;
        Ok(())
    }

    fn present(&mut self, rect: Rect) -> FrameResult<()> {
        self.conn.copy_area(
            self.canvas,
            self.frame,
            self.gc,
            rect.x,
            rect.y,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
        )?;
        Ok(())
    }
}

impl DisplayDriver for X11Driver {
    fn frame_window(&self) -> Xid {
        self.frame
    }

    fn bar_height(&self) -> u16 {
        (self.font.height().max(0) as u16).saturating_add(2)
    }

    fn connection_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    fn poll_event(&mut self) -> FrameResult<Option<WindowEvent>> {
        while let Some(event) = self.conn.poll_for_event()? {
            if let Some(event) = self.translate(event)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn flush(&mut self) -> FrameResult<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn reparent_into_frame(&mut self, window: Xid, at: Rect) -> FrameResult<()> {
        self.conn.reparent_window(window, self.frame, at.x, at.y)?;
        self.move_resize(window, at)
    }

    fn watch_client(&mut self, window: Xid) -> FrameResult<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        Ok(())
    }

    fn map(&mut self, window: Xid) -> FrameResult<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn move_resize(&mut self, window: Xid, rect: Rect) -> FrameResult<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(i32::from(rect.x))
                .y(i32::from(rect.y))
                .width(u32::from(rect.width))
                .height(u32::from(rect.height))
                .border_width(0),
        )?;
        Ok(())
    }

    fn raise(&mut self, window: Xid) -> FrameResult<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn focus_input(&mut self, window: Xid) -> FrameResult<()> {
        self.conn
            .set_input_focus(InputFocus::PARENT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn grab_keys(&mut self, window: Xid, bindings: &KeyBindings) -> FrameResult<()> {
        self.conn.ungrab_key(Grab::ANY, window, ModMask::ANY)?;
        for combo in bindings.combos() {
            let keycodes = self.keymap.keycodes_for(combo.keysym);
            if keycodes.is_empty() {
                tracing::warn!(key = %combo, "no keycode for binding");
                continue;
            }
            for keycode in keycodes {
                for locks in lock_variants(self.numlock) {
                    self.conn.grab_key(
                        true,
                        window,
                        ModMask::from(combo.mods | locks),
                        keycode,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?;
                }
            }
        }
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
        let type_ = self.atoms._XEMBED;
        self.client_message(
            window,
            type_,
            [CURRENT_TIME, message.opcode(), detail, data1, data2],
        )
    }

    fn supports_delete(&mut self, window: Xid) -> FrameResult<bool> {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                self.atoms.WM_PROTOCOLS,
                AtomEnum::ATOM,
                0,
                32,
            )?
            .reply();
        match reply {
            Ok(reply) => Ok(reply
                .value32()
                .is_some_and(|mut atoms| atoms.any(|a| a == self.atoms.WM_DELETE_WINDOW))),
            Err(ReplyError::X11Error(err)) => {
                tracing::debug!(window, error = ?err.error_kind, "protocol lookup failed");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn send_delete(&mut self, window: Xid) -> FrameResult<()> {
        let type_ = self.atoms.WM_PROTOCOLS;
        let delete = self.atoms.WM_DELETE_WINDOW;
        self.client_message(window, type_, [delete, CURRENT_TIME, 0, 0, 0])
    }

    fn kill(&mut self, window: Xid) -> FrameResult<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn fetch_title(&mut self, window: Xid) -> FrameResult<Option<String>> {
        let net_name = self.text_property(
            window,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
        )?;
        if net_name.is_some() {
            return Ok(net_name);
        }
        self.text_property(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())
    }

    fn set_frame_title(&mut self, title: &str) -> FrameResult<()> {
        self.conn.change_property8(
            PropMode::REPLACE,
            self.frame,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            &latin1(title),
        )?;
        self.conn.change_property8(
            PropMode::REPLACE,
            self.frame,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            title.as_bytes(),
        )?;
        Ok(())
    }

    fn resize_canvas(&mut self, width: u16, height: u16) -> FrameResult<()> {
        let canvas = self.conn.generate_id()?;
        self.conn
            .create_pixmap(self.depth, canvas, self.root, width.max(1), height.max(1))?;
        self.conn.free_pixmap(self.canvas)?;
        self.canvas = canvas;
        Ok(())
    }

    fn refresh_keyboard(&mut self) -> FrameResult<()> {
        let setup = self.conn.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;
        let mapping = self
            .conn
            .get_keyboard_mapping(min_keycode, count)?
            .reply()?;
        self.keymap = KeyMap::new(
            min_keycode,
            usize::from(mapping.keysyms_per_keycode),
            mapping.keysyms,
        );

        let modmap = self.conn.get_modifier_mapping()?.reply()?;
        let per_modifier = usize::from(modmap.keycodes_per_modifier());
        self.numlock = self
            .keymap
            .keycodes_for(XK_NUM_LOCK)
            .into_iter()
            .map(|kc| modifier_bit_for(&modmap.keycodes, per_modifier, kc))
            .find(|bit| *bit != 0)
            .unwrap_or(0);
        tracing::debug!(numlock = self.numlock, "keyboard mapping loaded");
        Ok(())
    }

    fn release(&mut self, clients: &[Xid]) -> FrameResult<()> {
        for &window in clients {
            self.conn.reparent_window(window, self.root, 0, 0)?;
        }
        self.conn.close_font(self.font.id)?;
        self.conn.free_pixmap(self.canvas)?;
        self.conn.free_gc(self.gc)?;
        self.conn.destroy_window(self.frame)?;
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, POINTER_ROOT, CURRENT_TIME)?;
        // round trip so everything above reaches the server before exit
        self.conn.get_input_focus()?.reply()?;
        Ok(())
    }
}

fn load_font(conn: &RustConnection, name: &str, fallback: &str) -> FrameResult<FontMetrics> {
    for candidate in [name, fallback] {
        let id = conn.generate_id()?;
        if let Err(err) = conn.open_font(id, candidate.as_bytes())?.check() {
            tracing::warn!(font = candidate, error = %err, "cannot open font");
            continue;
        }
        let info = conn.query_font(id)?.reply()?;
        tracing::debug!(font = candidate, "font loaded");
        return Ok(FontMetrics::from_reply(id, &info));
    }
    Err(FrameError::Font(name.to_string()))
}

fn alloc_color(conn: &RustConnection, cmap: u32, spec: &str) -> FrameResult<u32> {
    let color_error = |_| FrameError::Color(spec.to_string());
    match parse_hex_color(spec)? {
        Some((r, g, b)) => Ok(conn
            .alloc_color(cmap, r, g, b)?
            .reply()
            .map_err(color_error)?
            .pixel),
        None => Ok(conn
            .alloc_named_color(cmap, spec.as_bytes())?
            .reply()
            .map_err(color_error)?
            .pixel),
    }
}
