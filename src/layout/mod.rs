pub mod tab_bar;

pub use tab_bar::*;

/// Pixel rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

pub fn rect_contains(rect: Rect, x: i16, y: i16) -> bool {
    if rect.is_empty() {
        return false;
    }
    let max_x = i32::from(rect.x) + i32::from(rect.width);
    let max_y = i32::from(rect.y) + i32::from(rect.height);
    x >= rect.x && i32::from(x) < max_x && y >= rect.y && i32::from(y) < max_y
}

/// Area left for the selected client below the tab bar.
pub fn content_area(frame_width: u16, frame_height: u16, bar_height: u16) -> Rect {
    Rect {
        x: 0,
        y: bar_height.min(i16::MAX as u16) as i16,
        width: frame_width.max(1),
        height: frame_height.saturating_sub(bar_height).max(1),
    }
}
