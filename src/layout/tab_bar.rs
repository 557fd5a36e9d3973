//! Tab bar geometry.
//!
//! Tabs have a fixed width. When they do not all fit, a run of consecutive
//! tabs around the selection is shown, with `<`/`>` markers flagging the
//! hidden ones on either side. The last visible tab stretches to the marker
//! (or the bar's edge) so the bar is always filled.

/// Horizontal extent `[x, x + width)` inside the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSlot {
    pub x: u32,
    pub width: u32,
}

impl TabSlot {
    pub fn new(x: u32, width: u32) -> Self {
        Self { x, width }
    }

    pub fn end(&self) -> u32 {
        self.x.saturating_add(self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarMetrics {
    pub frame_width: u32,
    pub tab_width: u32,
    /// Measured width of the "more before" marker.
    pub more_before: u32,
    /// Measured width of the "more after" marker.
    pub more_after: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabBarLayout {
    /// One entry per client in list order; `None` when scrolled out.
    pub slots: Vec<Option<TabSlot>>,
    pub more_before: Option<TabSlot>,
    pub more_after: Option<TabSlot>,
}

impl TabBarLayout {
    /// Index of the tab under `x`, if any.
    ///
    /// Clicks on the leading marker hit nothing; otherwise the first tab whose
    /// right edge lies past `x` wins.
    pub fn hit(&self, x: u32) -> Option<usize> {
        if let Some(marker) = self.more_before
            && x < marker.end()
        {
            return None;
        }
        self.slots
            .iter()
            .position(|slot| slot.is_some_and(|s| s.end() > x))
    }

    pub fn visible(&self) -> impl Iterator<Item = (usize, TabSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.map(|s| (idx, s)))
    }
}

pub fn layout_tabs(count: usize, selected: Option<usize>, metrics: &BarMetrics) -> TabBarLayout {
    let tab_width = metrics.tab_width.max(1);
    let frame_width = metrics.frame_width;
    if count == 0 {
        return TabBarLayout::default();
    }

    let total = (count as u64) * u64::from(tab_width);
    if total <= u64::from(frame_width) {
        let slots = (0..count)
            .map(|idx| Some(TabSlot::new(idx as u32 * tab_width, tab_width)))
            .collect();
        return TabBarLayout {
            slots,
            more_before: None,
            more_after: None,
        };
    }

    let selected = selected.unwrap_or(0).min(count - 1);
    let (first, visible) = scroll_window(count, selected, metrics);
    let mut lead = first > 0;
    let mut trail = first + visible < count;
    let markers = if lead { metrics.more_before } else { 0 }
        + if trail { metrics.more_after } else { 0 };
    if markers >= frame_width {
        // a lone tab gets the whole bar rather than being squeezed out
        lead = false;
        trail = false;
    }

    let mut slots = vec![None; count];
    let mut x = if lead { metrics.more_before } else { 0 };
    let limit = if trail {
        frame_width.saturating_sub(metrics.more_after)
    } else {
        frame_width
    };
    for (offset, slot) in slots[first..first + visible].iter_mut().enumerate() {
        let width = if offset + 1 == visible {
            limit.saturating_sub(x)
        } else {
            tab_width
        };
        *slot = Some(TabSlot::new(x, width));
        x = x.saturating_add(width);
    }

    TabBarLayout {
        slots,
        more_before: lead.then(|| TabSlot::new(0, metrics.more_before)),
        more_after: trail.then(|| TabSlot::new(limit, metrics.more_after)),
    }
}

/// First visible index and visible count for an overflowing bar.
///
/// Shrinks the window one tab at a time until tabs plus whichever markers the
/// window needs fit, keeping `selected` as central as the ends allow.
fn scroll_window(count: usize, selected: usize, metrics: &BarMetrics) -> (usize, usize) {
    let tab_width = u64::from(metrics.tab_width.max(1));
    let mut visible = count;
    loop {
        let first = selected.saturating_sub(visible / 2).min(count - visible);
        let lead = first > 0;
        let trail = first + visible < count;
        let used = visible as u64 * tab_width
            + if lead { u64::from(metrics.more_before) } else { 0 }
            + if trail { u64::from(metrics.more_after) } else { 0 };
        if used <= u64::from(metrics.frame_width) || visible == 1 {
            return (first, visible);
        }
        visible -= 1;
    }
}
