use std::os::fd::RawFd;

use crate::Xid;
use crate::constants::DEFAULT_TITLE;
use crate::drivers::{ClientMessageKind, DisplayDriver, PropertyKind, WindowEvent, XEmbedMessage};
use crate::embed::{self, CloseOutcome};
use crate::error::FrameResult;
use crate::keybindings::{Action, KeyBindings};
use crate::layout::{
    BarMetrics, Rect, TabBarLayout, TabSlot, content_area, layout_tabs, rect_contains,
};
use crate::listener::{Listener, ListenerSet};
use crate::registry::{Client, ClientRegistry, Title};
use crate::spawn;
use crate::state::FrameState;
use crate::theme::{ColorScheme, Theme};

/// Middle mouse button; closes the tab under the pointer.
const CLOSE_BUTTON: u8 = 2;

/// Everything one running frame owns: the display driver, the hosted
/// clients with their selection, the listeners and the tab bar.
///
/// Every operation runs to completion on the loop's thread. Nothing outside
/// the event loop's call stack mutates this value.
pub struct Frame<D: DisplayDriver> {
    driver: D,
    registry: ClientRegistry,
    state: FrameState,
    bindings: KeyBindings,
    theme: Theme,
    bar: TabBarLayout,
    listeners: ListenerSet,
}

impl<D: DisplayDriver> Frame<D> {
    pub fn new(driver: D, theme: Theme, bindings: KeyBindings) -> Self {
        let state = FrameState::new(driver.bar_height());
        Self {
            driver,
            registry: ClientRegistry::new(),
            state,
            bindings,
            theme,
            bar: TabBarLayout::default(),
            listeners: ListenerSet::new(),
        }
    }

    /// Grab the bindings on the frame itself and show the empty state.
    pub fn start(&mut self) -> FrameResult<()> {
        let frame = self.driver.frame_window();
        self.driver.grab_keys(frame, &self.bindings)?;
        self.focus(None)?;
        self.driver.flush()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn bar(&self) -> &TabBarLayout {
        &self.bar
    }

    pub fn running(&self) -> bool {
        self.state.running()
    }

    pub fn add_listener(&mut self, listener: Listener) {
        tracing::debug!(source = ?listener.source(), "listening");
        self.listeners.push(listener);
    }

    pub fn listener_fds(&self) -> Vec<RawFd> {
        self.listeners.raw_fds()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Read every ready listener and embed the windows they announced.
    pub fn drain_listeners(&mut self, ready: &[RawFd]) -> FrameResult<()> {
        let ids = self.listeners.drain_ready(ready);
        self.register_ids(&ids)
    }

    pub fn register_ids(&mut self, ids: &[Xid]) -> FrameResult<()> {
        for &id in ids {
            self.add(id)?;
        }
        Ok(())
    }

    fn content_area(&self) -> Rect {
        let g = self.state.geometry();
        content_area(g.width, g.height, g.bar_height)
    }

    /// Embed `window` as the first tab. Known windows (and the frame itself)
    /// are ignored; the return value says whether anything was added.
    pub fn add(&mut self, window: Xid) -> FrameResult<bool> {
        if window == self.driver.frame_window() || !self.registry.insert(window) {
            tracing::debug!(window, "already managed");
            return Ok(false);
        }
        let content = self.content_area();
        embed::embed(&mut self.driver, window, content, &self.bindings)?;
        if let Some(title) = self.driver.fetch_title(window)?
            && let Some(client) = self.registry.find_mut(window)
        {
            client.title = Title::new(title);
        }
        tracing::info!(window, clients = self.registry.len(), "added tab");

        let may_focus = self.state.take_focus_permission();
        match self.registry.selected() {
            Some(current) if !may_focus => {
                // keep the new window underneath the current one
                self.driver.raise(current)?;
                self.draw_bar()?;
            }
            _ => self.focus(Some(window))?,
        }
        Ok(true)
    }

    /// Forget `window`. If it was selected, the previous selection (or the
    /// first tab) takes over.
    pub fn remove(&mut self, window: Xid) -> FrameResult<bool> {
        let was_selected = self.registry.selected() == Some(window);
        if self.registry.remove(window).is_none() {
            return Ok(false);
        }
        tracing::info!(window, clients = self.registry.len(), "removed tab");
        if was_selected {
            self.focus(self.registry.selected())?;
        } else {
            self.draw_bar()?;
        }
        Ok(true)
    }

    pub fn find(&self, window: Xid) -> Option<&Client> {
        self.registry.find(window)
    }

    /// Show `target` in the content area and hand it focus.
    ///
    /// `None` (or an unknown window) means "whatever is selected, else the
    /// first tab". With no tabs at all the frame shows its default title.
    pub fn focus(&mut self, target: Option<Xid>) -> FrameResult<()> {
        let target = target
            .filter(|w| self.registry.contains(*w))
            .or(self.registry.selected())
            .or(self.registry.head());
        let Some(window) = target else {
            let frame = self.driver.frame_window();
            self.driver.set_frame_title(DEFAULT_TITLE)?;
            self.driver.raise(frame)?;
            return self.draw_bar();
        };

        let content = self.content_area();
        self.driver.move_resize(window, content)?;
        self.driver.raise(window)?;
        embed::activate(&mut self.driver, window)?;
        self.driver.focus_input(window)?;
        if self.registry.select(window) {
            tracing::debug!(
                window,
                previous = ?self.registry.last_selected(),
                "selection changed"
            );
        }
        let label = self
            .registry
            .find(window)
            .map(|c| c.label())
            .unwrap_or_default();
        self.driver.set_frame_title(&label)?;
        self.draw_bar()
    }

    /// `+1`/`-1` cycle through the tabs, `0` goes back to the previous one.
    pub fn rotate(&mut self, direction: i32) -> FrameResult<()> {
        match self.registry.rotate_target(direction) {
            Some(window) => self.focus(Some(window)),
            None => Ok(()),
        }
    }

    /// Select the `n`-th tab, counting from 1. Out of range does nothing.
    pub fn move_to_index(&mut self, n: usize) -> FrameResult<()> {
        match self.registry.nth(n) {
            Some(window) => self.focus(Some(window)),
            None => Ok(()),
        }
    }

    pub fn close(&mut self, window: Xid) -> FrameResult<Option<CloseOutcome>> {
        let Some(client) = self.registry.find_mut(window) else {
            return Ok(None);
        };
        embed::request_close(&mut self.driver, client).map(Some)
    }

    pub fn close_selected(&mut self) -> FrameResult<Option<CloseOutcome>> {
        match self.registry.selected() {
            Some(window) => self.close(window),
            None => Ok(None),
        }
    }

    /// Launch `argv` and listen for the window ids it prints. A failed spawn
    /// is reported and otherwise ignored.
    pub fn spawn(&mut self, argv: &[String], focus: bool) {
        match spawn::spawn(argv) {
            Ok(listener) => {
                if !focus {
                    self.state.set_keep_focus_next();
                }
                self.add_listener(listener);
            }
            Err(err) => tracing::error!(command = ?argv, error = %err, "cannot spawn"),
        }
    }

    pub fn perform(&mut self, action: &Action) -> FrameResult<()> {
        tracing::debug!(%action, "key action");
        match action {
            Action::SelectIndex(n) => self.move_to_index(*n),
            Action::Rotate(direction) => self.rotate(*direction),
            Action::Spawn { argv, focus } => {
                self.spawn(argv, *focus);
                Ok(())
            }
            Action::CloseSelected => self.close_selected().map(|_| ()),
        }
    }

    fn stop(&mut self, reason: &str) {
        if self.state.running() {
            tracing::info!(reason, "frame closing");
        }
        self.state.stop();
    }

    pub fn handle_event(&mut self, event: WindowEvent) -> FrameResult<()> {
        let frame = self.driver.frame_window();
        match event {
            WindowEvent::Configure {
                window,
                width,
                height,
            } => {
                if window == frame && self.state.resize(width, height) {
                    tracing::debug!(width, height, "frame resized");
                    self.driver.resize_canvas(width, height)?;
                    if let Some(selected) = self.registry.selected() {
                        let content = self.content_area();
                        self.driver.move_resize(selected, content)?;
                    }
                    self.draw_bar()?;
                }
            }
            WindowEvent::Create { window, parent } => {
                if parent == frame && window != frame {
                    self.add(window)?;
                }
            }
            WindowEvent::Destroy { window } => {
                self.remove(window)?;
            }
            WindowEvent::MapRequest { window, .. } => {
                if self.registry.contains(window) {
                    self.driver.map(window)?;
                } else {
                    self.add(window)?;
                }
            }
            WindowEvent::Unmap { window } => {
                if window == frame {
                    self.stop("frame unmapped");
                } else {
                    self.remove(window)?;
                }
            }
            WindowEvent::Expose { window, count } => {
                if window == frame && count == 0 {
                    self.draw_bar()?;
                }
            }
            WindowEvent::PropertyChange {
                window,
                property: PropertyKind::Title,
            } => self.refresh_title(window)?,
            WindowEvent::PropertyChange { .. } => {}
            WindowEvent::ClientMessage { window, kind } => match kind {
                ClientMessageKind::DeleteWindow if window == frame => self.stop("close requested"),
                ClientMessageKind::XEmbed(XEmbedMessage::RequestFocus) => {
                    if self.registry.contains(window) {
                        self.focus(Some(window))?;
                    }
                }
                _ => {}
            },
            WindowEvent::ButtonPress { window, button, x, y } => {
                let g = self.state.geometry();
                if window == frame
                    && rect_contains(Rect::new(0, 0, g.width, g.bar_height), x, y)
                {
                    self.click_tab(button, x as u32)?;
                }
            }
            WindowEvent::KeyPress { keysym, mods } => {
                if let Some(action) = self.bindings.action_for(keysym, mods).cloned() {
                    self.perform(&action)?;
                }
            }
            WindowEvent::FocusIn { window } => {
                if window == frame
                    && let Some(selected) = self.registry.selected()
                {
                    self.driver.focus_input(selected)?;
                }
            }
            WindowEvent::KeyboardMappingChanged => {
                self.driver.refresh_keyboard()?;
                self.driver.grab_keys(frame, &self.bindings)?;
                for window in self.registry.handles() {
                    self.driver.grab_keys(window, &self.bindings)?;
                }
            }
        }
        Ok(())
    }

    fn click_tab(&mut self, button: u8, x: u32) -> FrameResult<()> {
        let Some(window) = self
            .bar
            .hit(x)
            .and_then(|idx| self.registry.iter().nth(idx))
            .map(|c| c.handle)
        else {
            return Ok(());
        };
        if button == CLOSE_BUTTON {
            self.close(window).map(|_| ())
        } else {
            self.focus(Some(window))
        }
    }

    fn refresh_title(&mut self, window: Xid) -> FrameResult<()> {
        if !self.registry.contains(window) {
            return Ok(());
        }
        let title = self.driver.fetch_title(window)?.unwrap_or_default();
        let label = match self.registry.find_mut(window) {
            Some(client) => {
                client.title = Title::new(title);
                client.label()
            }
            None => return Ok(()),
        };
        if self.registry.selected() == Some(window) {
            self.driver.set_frame_title(&label)?;
        }
        self.draw_bar()
    }

    fn marker_width(&self, glyph: &str) -> u32 {
        self.driver.text_width(glyph) + u32::from(self.state.geometry().bar_height)
    }

    /// Recompute the tab bar, record each client's slot and paint it.
    pub fn draw_bar(&mut self) -> FrameResult<()> {
        let geometry = self.state.geometry();
        let metrics = BarMetrics {
            frame_width: u32::from(geometry.width),
            tab_width: self.theme.tab_width,
            more_before: self.marker_width(&self.theme.more_before),
            more_after: self.marker_width(&self.theme.more_after),
        };
        let selected = self.registry.selected();
        let selected_idx = selected.and_then(|w| self.registry.position(w));
        self.bar = layout_tabs(self.registry.len(), selected_idx, &metrics);

        let mut tabs = Vec::new();
        for (client, slot) in self.registry.iter_mut().zip(&self.bar.slots) {
            client.tab_slot = *slot;
            if let Some(slot) = slot {
                let scheme = if Some(client.handle) == selected {
                    ColorScheme::Selected
                } else {
                    ColorScheme::Normal
                };
                tabs.push((*slot, scheme, client.label()));
            }
        }

        let height = geometry.bar_height;
        let bar = Rect::new(0, 0, geometry.width, height);
        self.driver.draw_text(bar, ColorScheme::Normal, "")?;
        if let Some(marker) = self.bar.more_before {
            self.driver.draw_text(
                slot_rect(marker, height),
                ColorScheme::Normal,
                &self.theme.more_before,
            )?;
        }
        for (slot, scheme, label) in tabs {
            self.driver.draw_text(slot_rect(slot, height), scheme, &label)?;
        }
        if let Some(marker) = self.bar.more_after {
            self.driver.draw_text(
                slot_rect(marker, height),
                ColorScheme::Normal,
                &self.theme.more_after,
            )?;
        }
        self.driver.present(bar)
    }

    /// Give every client back to the root window and free the frame.
    pub fn teardown(&mut self) -> FrameResult<()> {
        self.state.stop();
        let clients = self.registry.handles();
        tracing::info!(clients = clients.len(), "releasing clients");
        self.driver.release(&clients)
    }
}

fn slot_rect(slot: TabSlot, height: u16) -> Rect {
    Rect::new(
        slot.x.min(i16::MAX as u32) as i16,
        0,
        slot.width.min(u32::from(u16::MAX)) as u16,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_rect_clamps_to_protocol_ranges() {
        let r = slot_rect(TabSlot::new(10, 200), 17);
        assert_eq!(r, Rect::new(10, 0, 200, 17));
        let far = slot_rect(TabSlot::new(u32::MAX, u32::MAX), 17);
        assert_eq!(far.x, i16::MAX);
        assert_eq!(far.width, u16::MAX);
    }
}
