//! Ordered collection of embedded windows and the tab selection.
//!
//! The registry is plain data: it never talks to the display. `Frame` pairs
//! every mutation here with the matching window-system requests.

use std::fmt;

use crate::Xid;
use crate::constants::MAX_TITLE_LEN;
use crate::layout::TabSlot;

/// Tab label, cut once to `MAX_TITLE_LEN` bytes on a character boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn new(value: impl Into<String>) -> Self {
        let mut value = value.into();
        if value.len() > MAX_TITLE_LEN {
            let mut end = MAX_TITLE_LEN;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            value.truncate(end);
        }
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub handle: Xid,
    pub title: Title,
    /// Last laid-out extent in the bar; `None` while scrolled out of view.
    pub tab_slot: Option<TabSlot>,
    pub close_pending: bool,
}

impl Client {
    fn new(handle: Xid) -> Self {
        Self {
            handle,
            title: Title::default(),
            tab_slot: None,
            close_pending: false,
        }
    }

    /// Text drawn on the tab; untitled clients show their window id.
    pub fn label(&self) -> String {
        if self.title.is_empty() {
            self.handle.to_string()
        } else {
            self.title.to_string()
        }
    }
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<Client>,
    selected: Option<Xid>,
    last_selected: Option<Xid>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a client for `handle`. Returns `false` if it is already known.
    pub fn insert(&mut self, handle: Xid) -> bool {
        if self.contains(handle) {
            return false;
        }
        self.clients.insert(0, Client::new(handle));
        true
    }

    /// Unlink `handle`, repairing the selection so it only ever names
    /// remaining clients.
    pub fn remove(&mut self, handle: Xid) -> Option<Client> {
        let idx = self.position(handle)?;
        let client = self.clients.remove(idx);
        let head = self.clients.first().map(|c| c.handle);
        if self.selected == Some(handle) {
            self.selected = self
                .last_selected
                .filter(|h| *h != handle && self.contains(*h))
                .or(head);
        }
        if self.last_selected == Some(handle) || self.last_selected == self.selected {
            self.last_selected = self
                .clients
                .iter()
                .map(|c| c.handle)
                .find(|h| Some(*h) != self.selected)
                .or(head);
        }
        Some(client)
    }

    pub fn find(&self, handle: Xid) -> Option<&Client> {
        self.clients.iter().find(|c| c.handle == handle)
    }

    pub fn find_mut(&mut self, handle: Xid) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.handle == handle)
    }

    pub fn contains(&self, handle: Xid) -> bool {
        self.position(handle).is_some()
    }

    pub fn position(&self, handle: Xid) -> Option<usize> {
        self.clients.iter().position(|c| c.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.clients.iter_mut()
    }

    pub fn handles(&self) -> Vec<Xid> {
        self.clients.iter().map(|c| c.handle).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn head(&self) -> Option<Xid> {
        self.clients.first().map(|c| c.handle)
    }

    pub fn selected(&self) -> Option<Xid> {
        self.selected
    }

    pub fn last_selected(&self) -> Option<Xid> {
        self.last_selected
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.selected.and_then(|h| self.find(h))
    }

    /// Mark `handle` selected. Returns `true` if the selection changed.
    pub fn select(&mut self, handle: Xid) -> bool {
        if !self.contains(handle) || self.selected == Some(handle) {
            return false;
        }
        if self.selected.is_some() {
            self.last_selected = self.selected;
        }
        self.selected = Some(handle);
        true
    }

    /// Client a rotation lands on.
    ///
    /// `+1`/`-1` step through list order and wrap; `0` toggles back to the
    /// previous selection. With no usable previous selection the current one
    /// is returned so the caller simply refocuses it.
    pub fn rotate_target(&self, direction: i32) -> Option<Xid> {
        if direction == 0 {
            return self.last_selected.or(self.selected);
        }
        let len = self.clients.len();
        if len == 0 {
            return None;
        }
        let current = self.selected.and_then(|h| self.position(h)).unwrap_or(0);
        let step = direction.signum() as isize;
        let next = (current as isize + step).rem_euclid(len as isize) as usize;
        Some(self.clients[next].handle)
    }

    /// Client at 1-based position `n` in list order.
    pub fn nth(&self, n: usize) -> Option<Xid> {
        n.checked_sub(1)
            .and_then(|idx| self.clients.get(idx))
            .map(|c| c.handle)
    }
}
